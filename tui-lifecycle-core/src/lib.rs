//! Core types for tui-lifecycle
//!
//! This crate decides *when* a component's view must be rebuilt and keeps
//! store subscriptions tied to the component's lifetime. It sits between a
//! Redux-style store and a render loop:
//!
//! ```text
//! store change -> notify -> ViewUpdater checks UpdatePolicy
//!              -> cache dropped, rebuild requested via RebuildScheduler
//! render pass  -> Host::build -> builder runs once, Lifecycle::Build sent, output cached
//! ```
//!
//! # Core Concepts
//!
//! - **Store**: state behind an `Rc`, reducer, change broadcast
//! - **UpdatePolicy**: decides whether a new snapshot makes the view stale
//! - **Context**: typed state accessor, dispatch and lifecycle delivery,
//!   optionally merged with an adapter's context
//! - **ViewUpdater**: memoized output plus the state it was built from
//! - **Host**: owns one context and one updater and forwards lifecycle calls
//!
//! # Basic Example
//!
//! ```
//! use std::rc::Rc;
//! use tui_lifecycle_core::prelude::*;
//!
//! #[derive(Clone, Default)]
//! struct AppState {
//!     count: i32,
//! }
//!
//! #[derive(Clone, Debug)]
//! enum AppAction {
//!     Increment,
//! }
//!
//! impl Action for AppAction {
//!     fn name(&self) -> &'static str {
//!         "Increment"
//!     }
//! }
//!
//! fn reducer(state: &mut AppState, action: AppAction) -> bool {
//!     match action {
//!         AppAction::Increment => {
//!             state.count += 1;
//!             true
//!         }
//!     }
//! }
//!
//! let store = Store::new(AppState::default(), reducer);
//! let scheduler = FrameScheduler::new();
//! let counter = Component::new(
//!     "counter",
//!     view_builder(|state: &AppState, _: &dyn Fn(AppAction), _: &Context<AppState, AppAction>| {
//!         format!("count: {}", state.count)
//!     }),
//! )
//! .debug(DebugConfig::disabled());
//!
//! let host = counter.mount(&store, Rc::new(scheduler.clone()));
//! assert_eq!(host.build(), "count: 0");
//!
//! store.dispatch(AppAction::Increment);
//! assert_eq!(scheduler.take_dirty(), vec![host.id()]);
//! assert_eq!(host.build(), "count: 1");
//! ```

pub mod action;
pub mod component;
pub mod context;
pub mod debug;
pub mod dispose;
pub mod error;
pub mod host;
pub mod lifecycle;
pub mod policy;
pub mod report;
pub mod scheduler;
pub mod store;
pub mod testing;
pub mod view;

// Core trait exports
pub use action::{Action, ActionCategory};

// Store exports
pub use store::{Listener, LoggingMiddleware, Middleware, NoopMiddleware, Reducer, Store, StoreApi};

// Component and host exports
pub use component::{Adapter, Component};
pub use context::{Context, LifecycleHandler, LogicContext};
pub use dispose::AutoDispose;
pub use host::{Host, HostBuilder, HostPhase};
pub use lifecycle::Lifecycle;
pub use policy::UpdatePolicy;
pub use view::{view_builder, ViewBuilder, ViewEnhance, ViewUpdater};

// Scheduling and reporting exports
pub use error::SchedulingError;
pub use report::{ErrorReport, Reporter, SharedReporter, TracingReporter};
pub use scheduler::{
    ChannelScheduler, FrameScheduler, HostId, RebuildRequest, RebuildScheduler, SharedScheduler,
};

// Debug exports
pub use debug::{ActionLoggerConfig, ActionLoggerMiddleware, DebugConfig};

// Testing exports
pub use testing::{
    buffer_to_string, render_to_string, CountingStore, LifecycleLog, RecordingReporter,
    RecordingScheduler,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::action::{Action, ActionCategory};
    pub use crate::component::{Adapter, Component};
    pub use crate::context::{Context, LogicContext};
    pub use crate::debug::{ActionLoggerConfig, ActionLoggerMiddleware, DebugConfig};
    pub use crate::dispose::AutoDispose;
    pub use crate::host::{Host, HostBuilder, HostPhase};
    pub use crate::lifecycle::Lifecycle;
    pub use crate::policy::UpdatePolicy;
    pub use crate::report::{Reporter, TracingReporter};
    pub use crate::scheduler::{ChannelScheduler, FrameScheduler, RebuildScheduler};
    pub use crate::store::{LoggingMiddleware, Middleware, Store, StoreApi};
    pub use crate::view::{view_builder, ViewBuilder};
}
