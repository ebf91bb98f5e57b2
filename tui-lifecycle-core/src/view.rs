//! Memoized view building
//!
//! [`ViewUpdater`] is a two-state machine: **empty** (nothing cached) or
//! **built** (an output cached together with the state it was built from).
//!
//! - [`build_view`](ViewUpdater::build_view) fills an empty cache and is a
//!   pure cache hit otherwise.
//! - [`on_external_notify`](ViewUpdater::on_external_notify) runs on store
//!   broadcasts; a stale cache is dropped and a rebuild requested.
//! - [`on_widget_tree_update`](ViewUpdater::on_widget_tree_update) drops a
//!   stale cache without requesting a rebuild.
//! - [`on_force_invalidate`](ViewUpdater::on_force_invalidate) drops the
//!   cache unconditionally.
//!
//! No `RefCell` borrow is held while user code runs (the builder, the
//! update policy, lifecycle handlers, the rebuild request), so any of them
//! may dispatch actions that loop back into the updater.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::context::Context;
use crate::error::SchedulingError;
use crate::lifecycle::Lifecycle;
use crate::policy::UpdatePolicy;
use crate::report::{ErrorReport, SharedReporter, TracingReporter};

/// Builds an output from state, a dispatch sink and the owning context
pub type ViewBuilder<S, A, O> = Rc<dyn Fn(&S, &dyn Fn(A), &Context<S, A>) -> O>;

/// Wraps a builder once, before the first build
pub type ViewEnhance<S, A, O> = Rc<dyn Fn(ViewBuilder<S, A, O>) -> ViewBuilder<S, A, O>>;

/// Wrap a closure as a [`ViewBuilder`]
pub fn view_builder<S, A, O>(
    view: impl Fn(&S, &dyn Fn(A), &Context<S, A>) -> O + 'static,
) -> ViewBuilder<S, A, O> {
    Rc::new(view)
}

struct ViewCache<S, O> {
    output: Option<O>,
    latest: Rc<S>,
}

/// Cache of the last built output and the state it reflects
pub struct ViewUpdater<S, A, O> {
    name: Rc<str>,
    view: ViewBuilder<S, A, O>,
    policy: UpdatePolicy<S>,
    reporter: SharedReporter,
    debug: bool,
    cache: RefCell<ViewCache<S, O>>,
    // Bumped on every invalidation so a build that raced one is not cached
    generation: Cell<u64>,
}

impl<S, A, O: Clone> ViewUpdater<S, A, O> {
    /// Create an empty updater whose last seen state is `initial`
    pub fn new(
        name: impl Into<Rc<str>>,
        view: ViewBuilder<S, A, O>,
        policy: UpdatePolicy<S>,
        initial: Rc<S>,
    ) -> Self {
        Self {
            name: name.into(),
            view,
            policy,
            reporter: Rc::new(TracingReporter),
            debug: false,
            cache: RefCell::new(ViewCache {
                output: None,
                latest: initial,
            }),
            generation: Cell::new(0),
        }
    }

    /// Send caught scheduling failures and debug reports to `reporter`
    pub fn with_reporter(mut self, reporter: SharedReporter) -> Self {
        self.reporter = reporter;
        self
    }

    /// Report every fresh build to the reporter
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Return the cached output, building it first if the cache is empty
    ///
    /// A fresh build reads the current state from `ctx`, runs the builder,
    /// sends [`Lifecycle::Build`] to the context and, in debug mode, reports
    /// the update. Cache hits have no side effects. Builder panics are not
    /// caught.
    pub fn build_view(&self, ctx: &Context<S, A>) -> O {
        if let Some(output) = self.cached() {
            return output;
        }

        let generation = self.generation.get();
        let state = ctx.state();
        let dispatch = |action: A| ctx.dispatch(action);
        let output = (self.view)(&*state, &dispatch, ctx);

        ctx.on_lifecycle(Lifecycle::Build);
        if self.debug {
            self.reporter.report_update(&self.name);
        }

        if self.generation.get() == generation {
            let mut cache = self.cache.borrow_mut();
            cache.output = Some(output.clone());
            cache.latest = state;
        } else {
            tracing::trace!(component = %self.name, "state moved during build, not caching");
        }
        output
    }

    /// Run the builder without touching the cache or sending `Build`
    pub(crate) fn build_detached(&self, ctx: &Context<S, A>) -> O {
        let state = ctx.state();
        let dispatch = |action: A| ctx.dispatch(action);
        (self.view)(&*state, &dispatch, ctx)
    }

    /// React to a store broadcast
    ///
    /// When the update policy says the cached view is stale, the cache is
    /// dropped, the new state remembered and `request_rebuild` called. A
    /// failed request is reported, never returned. Returns whether the
    /// cache was invalidated.
    pub fn on_external_notify(
        &self,
        ctx: &Context<S, A>,
        request_rebuild: impl FnOnce() -> Result<(), SchedulingError>,
    ) -> bool {
        let current = ctx.state();
        if !self.is_stale(&current) {
            return false;
        }
        self.invalidate(Some(current));

        if let Err(error) = request_rebuild() {
            self.reporter
                .report_error(ErrorReport::capture(self.name.to_string(), error));
        }
        true
    }

    /// React to new construction parameters
    ///
    /// Same staleness check as [`on_external_notify`](Self::on_external_notify)
    /// but no rebuild is requested; the caller is about to render anyway.
    pub fn on_widget_tree_update(&self, ctx: &Context<S, A>) -> bool {
        let current = ctx.state();
        if !self.is_stale(&current) {
            return false;
        }
        self.invalidate(Some(current));
        true
    }

    /// Drop the cache regardless of the update policy
    pub fn on_force_invalidate(&self) {
        self.invalidate(None);
    }

    /// Clone of the cached output, if built
    pub fn cached(&self) -> Option<O> {
        self.cache.borrow().output.clone()
    }
}

impl<S, A, O> ViewUpdater<S, A, O> {
    /// Whether an output is cached
    pub fn is_built(&self) -> bool {
        self.cache.borrow().output.is_some()
    }

    /// The state the cache reflects (or will be compared against)
    pub fn latest_state(&self) -> Rc<S> {
        Rc::clone(&self.cache.borrow().latest)
    }

    /// Name of the component this updater renders
    pub fn name(&self) -> &str {
        &self.name
    }

    fn is_stale(&self, current: &Rc<S>) -> bool {
        let latest = self.latest_state();
        self.policy.should_update(&latest, current)
    }

    fn invalidate(&self, latest: Option<Rc<S>>) {
        self.generation.set(self.generation.get().wrapping_add(1));
        let mut cache = self.cache.borrow_mut();
        cache.output = None;
        if let Some(latest) = latest {
            cache.latest = latest;
        }
    }
}

impl<S, A, O> fmt::Debug for ViewUpdater<S, A, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewUpdater")
            .field("name", &self.name)
            .field("policy", &self.policy)
            .field("built", &self.is_built())
            .field("debug", &self.debug)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::LogicContext;
    use crate::testing::{CountingStore, LifecycleLog, RecordingReporter};
    use std::panic::{self, AssertUnwindSafe};

    type Out = Rc<String>;

    struct Fixture {
        store: CountingStore<i32, i32>,
        ctx: Context<i32, i32>,
        builds: Rc<Cell<usize>>,
        log: LifecycleLog,
    }

    fn fixture(initial: i32) -> Fixture {
        let store = CountingStore::new(initial);
        let log = LifecycleLog::new();
        let ctx = Context::Single(LogicContext::connect("counter", &store).with_lifecycle(log.handler()));
        Fixture {
            store,
            ctx,
            builds: Rc::new(Cell::new(0)),
            log,
        }
    }

    fn updater(fx: &Fixture, policy: UpdatePolicy<i32>) -> ViewUpdater<i32, i32, Out> {
        let builds = Rc::clone(&fx.builds);
        let view = view_builder(move |state: &i32, _dispatch: &dyn Fn(i32), _ctx: &Context<i32, i32>| {
            builds.set(builds.get() + 1);
            Rc::new(format!("count={state}"))
        });
        ViewUpdater::new("counter", view, policy, fx.ctx.state())
    }

    #[test]
    fn test_build_is_memoized() {
        let fx = fixture(1);
        let updater = updater(&fx, UpdatePolicy::Identity);

        let first = updater.build_view(&fx.ctx);
        let second = updater.build_view(&fx.ctx);

        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(fx.builds.get(), 1);
        assert_eq!(fx.log.count(Lifecycle::Build), 1);
        assert_eq!(*first, "count=1");
    }

    #[test]
    fn test_notify_same_instance_requests_nothing() {
        let fx = fixture(1);
        let updater = updater(&fx, UpdatePolicy::Identity);
        updater.build_view(&fx.ctx);

        let mut requests = 0;
        fx.store.notify();
        let invalidated = updater.on_external_notify(&fx.ctx, || {
            requests += 1;
            Ok(())
        });

        assert!(!invalidated);
        assert_eq!(requests, 0);
        assert!(updater.is_built());
    }

    #[test]
    fn test_notify_new_instance_requests_once() {
        let fx = fixture(1);
        let updater = updater(&fx, UpdatePolicy::Identity);
        updater.build_view(&fx.ctx);

        // Equal value, different allocation
        fx.store.set_state(1);
        let mut requests = 0;
        updater.on_external_notify(&fx.ctx, || {
            requests += 1;
            Ok(())
        });
        updater.on_external_notify(&fx.ctx, || {
            requests += 1;
            Ok(())
        });

        assert_eq!(requests, 1);
        assert!(!updater.is_built());
        assert!(Rc::ptr_eq(&updater.latest_state(), &fx.store.state()));
    }

    #[test]
    fn test_never_policy_keeps_first_view() {
        let fx = fixture(0);
        let updater = updater(&fx, UpdatePolicy::Never);
        let first = updater.build_view(&fx.ctx);

        let mut requests = 0;
        for next in [1, 2] {
            fx.store.set_state(next);
            updater.on_external_notify(&fx.ctx, || {
                requests += 1;
                Ok(())
            });
            assert!(Rc::ptr_eq(&updater.build_view(&fx.ctx), &first));
        }

        assert_eq!(requests, 0);
        assert_eq!(*first, "count=0");
        assert_eq!(fx.builds.get(), 1);
    }

    #[test]
    fn test_force_invalidate_ignores_policy() {
        let fx = fixture(0);
        let updater = updater(&fx, UpdatePolicy::Never);
        updater.build_view(&fx.ctx);
        fx.store.set_state(5);

        updater.on_force_invalidate();
        let rebuilt = updater.build_view(&fx.ctx);

        assert_eq!(fx.builds.get(), 2);
        assert_eq!(*rebuilt, "count=5");
        assert_eq!(*updater.latest_state(), 5);
    }

    #[test]
    fn test_widget_update_invalidates_without_request() {
        let fx = fixture(0);
        let updater = updater(&fx, UpdatePolicy::Identity);
        updater.build_view(&fx.ctx);

        assert!(!updater.on_widget_tree_update(&fx.ctx));
        assert!(updater.is_built());

        fx.store.set_state(3);
        assert!(updater.on_widget_tree_update(&fx.ctx));
        assert!(!updater.is_built());
        assert_eq!(*updater.build_view(&fx.ctx), "count=3");
    }

    #[test]
    fn test_failed_request_is_reported() {
        let fx = fixture(0);
        let reporter = RecordingReporter::new();
        let updater = updater(&fx, UpdatePolicy::Identity).with_reporter(reporter.shared());
        updater.build_view(&fx.ctx);

        fx.store.set_state(1);
        let invalidated = updater.on_external_notify(&fx.ctx, || Err(SchedulingError::Closed));

        assert!(invalidated);
        assert_eq!(reporter.errors(), vec![SchedulingError::Closed]);
        assert!(!updater.is_built());
    }

    #[test]
    fn test_debug_reports_fresh_builds_only() {
        let fx = fixture(0);
        let reporter = RecordingReporter::new();
        let updater = updater(&fx, UpdatePolicy::Identity)
            .with_reporter(reporter.shared())
            .with_debug(true);

        updater.build_view(&fx.ctx);
        updater.build_view(&fx.ctx);
        assert_eq!(reporter.updates(), vec!["counter".to_string()]);

        let quiet = RecordingReporter::new();
        let fx = fixture(0);
        let silent = self::updater(&fx, UpdatePolicy::Identity).with_reporter(quiet.shared());
        silent.build_view(&fx.ctx);
        assert!(quiet.updates().is_empty());
    }

    #[test]
    fn test_state_change_during_build_is_not_cached() {
        let fx = fixture(0);
        let store = fx.store.clone();
        let slot: Rc<RefCell<Option<Rc<ViewUpdater<i32, i32, Out>>>>> = Rc::new(RefCell::new(None));
        let inner_slot = Rc::clone(&slot);
        let builds = Rc::clone(&fx.builds);
        let view = view_builder(move |state: &i32, _dispatch: &dyn Fn(i32), ctx: &Context<i32, i32>| {
            builds.set(builds.get() + 1);
            if *state == 0 {
                store.set_state(1);
                if let Some(updater) = inner_slot.borrow().as_ref() {
                    updater.on_external_notify(ctx, || Ok(()));
                }
            }
            Rc::new(format!("count={state}"))
        });
        let updater = Rc::new(ViewUpdater::new("racy", view, UpdatePolicy::Identity, fx.ctx.state()));
        *slot.borrow_mut() = Some(Rc::clone(&updater));

        let stale = updater.build_view(&fx.ctx);
        assert_eq!(*stale, "count=0");
        assert!(!updater.is_built());

        let fresh = updater.build_view(&fx.ctx);
        assert_eq!(*fresh, "count=1");
        assert!(updater.is_built());
        assert_eq!(fx.builds.get(), 2);
    }

    #[test]
    fn test_builder_panic_propagates_and_cache_stays_empty() {
        let fx = fixture(2);
        let failing = Rc::new(Cell::new(true));
        let fail = Rc::clone(&failing);
        let view = view_builder(move |state: &i32, _dispatch: &dyn Fn(i32), _ctx: &Context<i32, i32>| {
            if fail.get() {
                panic!("builder failed");
            }
            Rc::new(format!("count={state}"))
        });
        let updater = ViewUpdater::new("fragile", view, UpdatePolicy::Identity, fx.ctx.state());

        let result = panic::catch_unwind(AssertUnwindSafe(|| updater.build_view(&fx.ctx)));
        assert!(result.is_err());
        assert!(!updater.is_built());
        assert_eq!(fx.log.count(Lifecycle::Build), 0);

        failing.set(false);
        assert_eq!(*updater.build_view(&fx.ctx), "count=2");
        assert!(updater.is_built());
        assert_eq!(fx.log.count(Lifecycle::Build), 1);
    }

    #[test]
    fn test_policy_panic_propagates_and_cache_is_untouched() {
        let fx = fixture(0);
        let failing = Rc::new(Cell::new(true));
        let fail = Rc::clone(&failing);
        let policy = UpdatePolicy::custom(move |old: &i32, new: &i32| {
            if fail.get() {
                panic!("policy failed");
            }
            old != new
        });
        let updater = updater(&fx, policy);
        let first = updater.build_view(&fx.ctx);
        let before = updater.latest_state();
        fx.store.set_state(1);

        let mut requests = 0;
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            updater.on_external_notify(&fx.ctx, || {
                requests += 1;
                Ok(())
            })
        }));
        assert!(result.is_err());
        assert_eq!(requests, 0);
        assert!(updater.is_built());
        assert!(Rc::ptr_eq(&updater.latest_state(), &before));
        assert!(Rc::ptr_eq(&updater.build_view(&fx.ctx), &first));

        failing.set(false);
        assert!(updater.on_external_notify(&fx.ctx, || {
            requests += 1;
            Ok(())
        }));
        assert_eq!(requests, 1);
        assert_eq!(*updater.build_view(&fx.ctx), "count=1");
    }
}
