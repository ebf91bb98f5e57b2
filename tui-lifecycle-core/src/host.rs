//! Lifecycle host: owns a context and a view updater for one component
//!
//! The host is the shim between a render loop and a component. The loop
//! calls the lifecycle methods ([`build`](Host::build),
//! [`did_update_widget`](Host::did_update_widget), [`dispose`](Host::dispose),
//! ...); the host forwards each one to its [`Context`] as a [`Lifecycle`]
//! event and, where relevant, to its [`ViewUpdater`].
//!
//! Mounting binds the updater's notify handler to the store exactly once.
//! The binding is owned by the context, so disposing the context releases
//! it, exactly once, after the `Dispose` event has been delivered.
//!
//! ```
//! use std::rc::Rc;
//! use tui_lifecycle_core::prelude::*;
//! use tui_lifecycle_core::testing::CountingStore;
//!
//! let store = CountingStore::<i32, ()>::new(1);
//! let scheduler = FrameScheduler::new();
//! let host = Host::builder(
//!     view_builder(|count: &i32, _dispatch: &dyn Fn(()), _ctx: &Context<i32, ()>| {
//!         format!("count={count}")
//!     }),
//!     Rc::new(scheduler.clone()),
//! )
//! .mount(Context::Single(LogicContext::connect("counter", &store)));
//!
//! assert_eq!(host.build(), "count=1");
//! store.emit(2);
//! assert!(scheduler.is_dirty());
//! assert_eq!(host.build(), "count=2");
//!
//! host.dispose();
//! assert_eq!(store.unsubscribe_count(), 1);
//! ```

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::context::Context;
use crate::debug::DebugConfig;
use crate::dispose::AutoDispose;
use crate::error::SchedulingError;
use crate::lifecycle::Lifecycle;
use crate::policy::UpdatePolicy;
use crate::report::{ErrorReport, SharedReporter, TracingReporter};
use crate::scheduler::{HostId, SharedScheduler};
use crate::store::Listener;
use crate::view::{ViewBuilder, ViewEnhance, ViewUpdater};

/// Where a host is in its lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostPhase {
    /// Attached to the live tree; rebuild requests go to the scheduler
    Active,
    /// Detached, possibly temporarily; rebuild requests are dropped
    Inactive,
    /// `dispose` is running
    Disposing,
    /// Torn down; notifications and lifecycle calls are ignored
    Disposed,
}

impl HostPhase {
    /// Whether teardown has started
    pub fn is_torn_down(self) -> bool {
        matches!(self, HostPhase::Disposing | HostPhase::Disposed)
    }
}

struct HostInner<S, A, O> {
    id: HostId,
    ctx: Context<S, A>,
    updater: ViewUpdater<S, A, O>,
    scheduler: SharedScheduler,
    reporter: SharedReporter,
    debug: DebugConfig,
    phase: Cell<HostPhase>,
    subscription: RefCell<Option<AutoDispose>>,
}

impl<S, A, O> HostInner<S, A, O> {
    fn name(&self) -> &str {
        self.ctx.name()
    }

    fn lifecycle(&self, event: Lifecycle) {
        if self.debug.traces(event.name()) {
            tracing::trace!(component = %self.name(), host = %self.id, lifecycle = %event, "lifecycle");
        }
        self.ctx.on_lifecycle(event);
    }

    fn request_rebuild(&self) -> Result<(), SchedulingError> {
        match self.phase.get() {
            HostPhase::Active => self.scheduler.mark_needs_build(self.id),
            phase => {
                tracing::trace!(component = %self.name(), ?phase, "rebuild request suppressed");
                Ok(())
            }
        }
    }
}

impl<S, A, O: Clone> HostInner<S, A, O> {
    fn on_notify(&self) {
        if self.phase.get().is_torn_down() {
            tracing::trace!(component = %self.name(), "notification after teardown ignored");
            return;
        }
        self.updater
            .on_external_notify(&self.ctx, || self.request_rebuild());
    }
}

/// Configures and mounts a [`Host`]
pub struct HostBuilder<S, A, O> {
    view: ViewBuilder<S, A, O>,
    scheduler: SharedScheduler,
    policy: UpdatePolicy<S>,
    reporter: SharedReporter,
    debug: DebugConfig,
    enhance: Option<ViewEnhance<S, A, O>>,
}

impl<S: 'static, A: 'static, O: Clone + 'static> HostBuilder<S, A, O> {
    /// Start from a view builder and the scheduler that will receive rebuild requests
    pub fn new(view: ViewBuilder<S, A, O>, scheduler: SharedScheduler) -> Self {
        Self {
            view,
            scheduler,
            policy: UpdatePolicy::default(),
            reporter: Rc::new(TracingReporter),
            debug: DebugConfig::default(),
            enhance: None,
        }
    }

    /// Replace the default identity update policy
    pub fn policy(mut self, policy: UpdatePolicy<S>) -> Self {
        self.policy = policy;
        self
    }

    /// Where caught scheduling failures and debug build reports go
    pub fn reporter(mut self, reporter: SharedReporter) -> Self {
        self.reporter = reporter;
        self
    }

    /// Debug switches
    pub fn debug(mut self, debug: DebugConfig) -> Self {
        self.debug = debug;
        self
    }

    /// Wrap the view builder once at mount time
    pub fn view_enhance(mut self, enhance: ViewEnhance<S, A, O>) -> Self {
        self.enhance = Some(enhance);
        self
    }

    /// Create the host around `ctx`, bind it to the store and send `Init`
    pub fn mount(self, ctx: Context<S, A>) -> Host<S, A, O> {
        let view = match &self.enhance {
            Some(enhance) => enhance(self.view),
            None => self.view,
        };
        let updater = ViewUpdater::new(ctx.name(), view, self.policy, ctx.state())
            .with_reporter(Rc::clone(&self.reporter))
            .with_debug(self.debug.enabled);

        let inner = Rc::new(HostInner {
            id: HostId::next(),
            ctx,
            updater,
            scheduler: self.scheduler,
            reporter: self.reporter,
            debug: self.debug,
            phase: Cell::new(HostPhase::Active),
            subscription: RefCell::new(None),
        });

        let weak: Weak<HostInner<S, A, O>> = Rc::downgrade(&inner);
        let listener: Listener = Rc::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.on_notify();
            }
        });
        let subscription = inner.ctx.add_observable(listener);
        *inner.subscription.borrow_mut() = Some(subscription);

        tracing::debug!(component = %inner.name(), host = %inner.id, "host mounted");
        inner.lifecycle(Lifecycle::Init);

        Host { inner }
    }
}

/// Stateful shim that owns one context and one view updater
///
/// Dropping a host disposes it if that has not happened yet.
pub struct Host<S, A, O> {
    inner: Rc<HostInner<S, A, O>>,
}

impl<S: 'static, A: 'static, O: Clone + 'static> Host<S, A, O> {
    /// Start configuring a host
    pub fn builder(view: ViewBuilder<S, A, O>, scheduler: SharedScheduler) -> HostBuilder<S, A, O> {
        HostBuilder::new(view, scheduler)
    }

    /// Current output, built on demand
    ///
    /// After teardown the cached output is returned as is. A host disposed
    /// before its first build renders once without caching or sending
    /// `Build` to the released context.
    pub fn build(&self) -> O {
        if self.inner.phase.get().is_torn_down() {
            if let Some(output) = self.inner.updater.cached() {
                return output;
            }
            tracing::trace!(component = %self.name(), "detached build after teardown");
            return self.inner.updater.build_detached(&self.inner.ctx);
        }
        self.inner.updater.build_view(&self.inner.ctx)
    }

    /// The host received new construction parameters
    pub fn did_update_widget(&self) {
        if self.ignore_after_teardown(Lifecycle::DidUpdateWidget) {
            return;
        }
        self.inner.updater.on_widget_tree_update(&self.inner.ctx);
        self.inner.lifecycle(Lifecycle::DidUpdateWidget);
    }

    /// Developer-triggered full refresh
    pub fn reassemble(&self) {
        if self.ignore_after_teardown(Lifecycle::Reassemble) {
            return;
        }
        self.inner.updater.on_force_invalidate();
        self.inner.lifecycle(Lifecycle::Reassemble);
    }

    /// Cached output, if any, without building
    pub fn cached(&self) -> Option<O> {
        self.inner.updater.cached()
    }
}

impl<S, A, O> Host<S, A, O> {
    /// Process-unique id used in rebuild requests
    pub fn id(&self) -> HostId {
        self.inner.id
    }

    /// Name of the main context
    pub fn name(&self) -> &str {
        self.inner.name()
    }

    /// Current phase
    pub fn phase(&self) -> HostPhase {
        self.inner.phase.get()
    }

    /// The owned context
    pub fn context(&self) -> &Context<S, A> {
        &self.inner.ctx
    }

    /// Whether a built output is cached
    pub fn is_built(&self) -> bool {
        self.inner.updater.is_built()
    }

    /// Something the component depends on changed
    pub fn did_change_dependencies(&self) {
        if self.ignore_after_teardown(Lifecycle::DidChangeDependencies) {
            return;
        }
        self.inner.lifecycle(Lifecycle::DidChangeDependencies);
    }

    /// The host left the live tree; rebuild requests are dropped until
    /// [`activate`](Self::activate)
    pub fn deactivate(&self) {
        if self.ignore_after_teardown(Lifecycle::Deactivate) {
            return;
        }
        self.inner.phase.set(HostPhase::Inactive);
        self.inner.lifecycle(Lifecycle::Deactivate);
    }

    /// The host was re-inserted into the live tree
    ///
    /// No lifecycle event is sent. If a notification invalidated the cache
    /// while the host was inactive, the rebuild request that was suppressed
    /// then is made now; a failure goes to the reporter.
    pub fn activate(&self) {
        if self.inner.phase.get() != HostPhase::Inactive {
            return;
        }
        self.inner.phase.set(HostPhase::Active);
        if self.inner.updater.is_built() {
            return;
        }
        if let Err(error) = self.inner.request_rebuild() {
            self.inner
                .reporter
                .report_error(ErrorReport::capture(self.name(), error));
        }
    }

    /// Send `Dispose`, then release everything the context owns
    ///
    /// Only the first call does anything.
    pub fn dispose(&self) {
        if self.inner.phase.get().is_torn_down() {
            return;
        }
        self.inner.phase.set(HostPhase::Disposing);
        self.inner.lifecycle(Lifecycle::Dispose);

        self.inner.ctx.dispose();
        let subscription = self.inner.subscription.borrow_mut().take();
        if let Some(subscription) = subscription {
            subscription.dispose();
        }

        self.inner.phase.set(HostPhase::Disposed);
        tracing::debug!(component = %self.name(), host = %self.inner.id, "host disposed");
    }

    fn ignore_after_teardown(&self, event: Lifecycle) -> bool {
        let torn_down = self.inner.phase.get().is_torn_down();
        if torn_down {
            tracing::trace!(component = %self.name(), lifecycle = %event, "lifecycle after teardown ignored");
        }
        torn_down
    }
}

impl<S, A, O> Drop for Host<S, A, O> {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl<S, A, O> fmt::Debug for Host<S, A, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Host")
            .field("id", &self.inner.id)
            .field("name", &self.name())
            .field("phase", &self.phase())
            .field("updater", &self.inner.updater)
            .finish()
    }
}
