//! tui-lifecycle: component lifecycle and view reconciliation for Rust TUI apps
//!
//! Components read shared state from a store and render it. This crate keeps
//! each component's last output cached, rebuilds it only when the configured
//! [`UpdatePolicy`] says the state really changed, and releases every store
//! subscription exactly once when the component goes away.
//!
//! # Example
//! ```ignore
//! use std::rc::Rc;
//! use tui_lifecycle::prelude::*;
//!
//! #[derive(Action, Clone, Debug)]
//! enum CounterAction {
//!     #[action(category = "count")]
//!     Increment,
//!     Quit,
//! }
//!
//! let scheduler = FrameScheduler::new();
//! let host = Component::new("counter", view_builder(render_counter))
//!     .mount(&store, Rc::new(scheduler.clone()));
//!
//! loop {
//!     if scheduler.take_dirty().contains(&host.id()) {
//!         terminal.draw(|frame| frame.render_widget(host.build(), frame.area()))?;
//!     }
//! }
//! ```

// Re-export everything from core
pub use tui_lifecycle_core::*;

// Re-export derive macros
pub use tui_lifecycle_macros::Action;

/// Prelude for convenient imports
pub mod prelude {
    // Traits
    pub use tui_lifecycle_core::{Action, ActionCategory, RebuildScheduler, Reporter, StoreApi};

    // Store
    pub use tui_lifecycle_core::{LoggingMiddleware, Middleware, NoopMiddleware, Reducer, Store};

    // Components and hosts
    pub use tui_lifecycle_core::{
        view_builder, Adapter, AutoDispose, Component, Context, Host, HostBuilder, HostPhase,
        Lifecycle, LogicContext, UpdatePolicy, ViewBuilder,
    };

    // Scheduling
    pub use tui_lifecycle_core::{
        ChannelScheduler, FrameScheduler, HostId, RebuildRequest, SchedulingError,
        TracingReporter,
    };

    // Debug
    pub use tui_lifecycle_core::debug::{ActionLoggerConfig, ActionLoggerMiddleware, DebugConfig};

    // Derive macros
    pub use tui_lifecycle_macros::Action;
}
