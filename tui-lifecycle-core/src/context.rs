//! Logic contexts and their composition
//!
//! A [`LogicContext`] bundles what a component's logic can do: read its
//! state through a typed accessor, dispatch actions, register observers,
//! and receive [`Lifecycle`] events. A [`Context`] is either a single
//! logic context or a main context merged with a sidecar (adapter)
//! context.
//!
//! Reads and dispatch always go through the main context. Observer
//! registration, lifecycle events and disposal fan out to both halves.

use std::fmt;
use std::rc::Rc;

use crate::dispose::AutoDispose;
use crate::lifecycle::Lifecycle;
use crate::store::{Listener, StoreApi};

/// Typed state accessor
pub type StateFn<S> = Rc<dyn Fn() -> Rc<S>>;
/// Action sink
pub type DispatchFn<A> = Rc<dyn Fn(A)>;
/// Observer registration capability
pub type SubscribeFn = Rc<dyn Fn(Listener) -> AutoDispose>;
/// Effect handler for lifecycle events
pub type LifecycleHandler<S, A> = Rc<dyn Fn(Lifecycle, &LogicContext<S, A>)>;

/// The capabilities handed to one unit of logic
///
/// Cloning is cheap and yields a handle to the same context; disposal is
/// shared between clones.
pub struct LogicContext<S, A> {
    name: Rc<str>,
    state: StateFn<S>,
    dispatch: DispatchFn<A>,
    subscribe: SubscribeFn,
    on_lifecycle: Option<LifecycleHandler<S, A>>,
    resources: AutoDispose,
}

impl<S: 'static, A: 'static> LogicContext<S, A> {
    /// Build a context from explicit capabilities
    ///
    /// `state` is the typed accessor for this logic's slice of state; it is
    /// called on every read and must not cache.
    pub fn new(
        name: impl Into<Rc<str>>,
        state: impl Fn() -> Rc<S> + 'static,
        dispatch: impl Fn(A) + 'static,
        subscribe: impl Fn(Listener) -> AutoDispose + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            state: Rc::new(state),
            dispatch: Rc::new(dispatch),
            subscribe: Rc::new(subscribe),
            on_lifecycle: None,
            resources: AutoDispose::new(),
        }
    }

    /// Build a context that reads, dispatches and subscribes through `store`
    pub fn connect<St>(name: impl Into<Rc<str>>, store: &St) -> Self
    where
        St: StoreApi<S, A> + Clone + 'static,
    {
        let for_state = store.clone();
        let for_dispatch = store.clone();
        let for_subscribe = store.clone();
        Self::new(
            name,
            move || for_state.state(),
            move |action| for_dispatch.dispatch(action),
            move |listener| for_subscribe.subscribe(listener),
        )
    }

    /// Attach a lifecycle effect handler
    pub fn with_lifecycle(
        mut self,
        handler: impl Fn(Lifecycle, &LogicContext<S, A>) + 'static,
    ) -> Self {
        self.on_lifecycle = Some(Rc::new(handler));
        self
    }
}

impl<S, A> LogicContext<S, A> {
    /// Name used in logs and reports
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current state through the typed accessor
    pub fn state(&self) -> Rc<S> {
        (self.state)()
    }

    /// Dispatch an action
    pub fn dispatch(&self, action: A) {
        (self.dispatch)(action)
    }

    /// Register an observer
    ///
    /// The registration is owned by this context and released on
    /// [`dispose`](Self::dispose); the returned handle releases it earlier.
    pub fn add_observable(&self, listener: Listener) -> AutoDispose {
        let handle = (self.subscribe)(listener);
        self.resources.adopt(handle.clone());
        handle
    }

    /// Deliver a lifecycle event to the effect handler, if any
    pub fn on_lifecycle(&self, event: Lifecycle) {
        if let Some(handler) = &self.on_lifecycle {
            handler(event, self);
        }
    }

    /// Tie a release action to this context's lifetime
    pub fn register_on_disposed(&self, release: impl FnOnce() + 'static) {
        self.resources.on_disposed(release);
    }

    /// Release everything the context owns; idempotent
    pub fn dispose(&self) {
        self.resources.dispose();
    }

    /// Whether [`dispose`](Self::dispose) has run
    pub fn is_disposed(&self) -> bool {
        self.resources.is_disposed()
    }
}

impl<S, A> Clone for LogicContext<S, A> {
    fn clone(&self) -> Self {
        Self {
            name: Rc::clone(&self.name),
            state: Rc::clone(&self.state),
            dispatch: Rc::clone(&self.dispatch),
            subscribe: Rc::clone(&self.subscribe),
            on_lifecycle: self.on_lifecycle.clone(),
            resources: self.resources.clone(),
        }
    }
}

impl<S, A> fmt::Debug for LogicContext<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogicContext")
            .field("name", &self.name)
            .field("has_lifecycle", &self.on_lifecycle.is_some())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// The context owned by a host
pub enum Context<S, A> {
    /// A single logic unit
    Single(LogicContext<S, A>),
    /// A main logic unit with an embedded sidecar (adapter)
    Composite {
        main: LogicContext<S, A>,
        sidecar: LogicContext<S, A>,
    },
}

impl<S, A> Context<S, A> {
    /// Combine a main context with an optional sidecar
    ///
    /// Without a sidecar this is just `Context::Single(main)`.
    pub fn merge(main: LogicContext<S, A>, sidecar: Option<LogicContext<S, A>>) -> Self {
        match sidecar {
            None => Context::Single(main),
            Some(sidecar) => Context::Composite { main, sidecar },
        }
    }

    /// The main logic context
    pub fn main(&self) -> &LogicContext<S, A> {
        match self {
            Context::Single(main) | Context::Composite { main, .. } => main,
        }
    }

    /// The sidecar, if this is a composite
    pub fn sidecar(&self) -> Option<&LogicContext<S, A>> {
        match self {
            Context::Single(_) => None,
            Context::Composite { sidecar, .. } => Some(sidecar),
        }
    }

    /// Name of the main context
    pub fn name(&self) -> &str {
        self.main().name()
    }

    /// Current state, always read through the main context
    pub fn state(&self) -> Rc<S> {
        self.main().state()
    }

    /// Dispatch through the main context
    pub fn dispatch(&self, action: A) {
        self.main().dispatch(action)
    }

    /// Dispatch through main and, for a composite, through the sidecar too
    pub fn broadcast(&self, action: A)
    where
        A: Clone,
    {
        if let Some(sidecar) = self.sidecar() {
            sidecar.dispatch(action.clone());
        }
        self.main().dispatch(action);
    }

    /// Register an observer with every half of the context
    ///
    /// For a composite the returned handle releases both registrations.
    pub fn add_observable(&self, listener: Listener) -> AutoDispose {
        match self {
            Context::Single(main) => main.add_observable(listener),
            Context::Composite { main, sidecar } => {
                let from_main = main.add_observable(Rc::clone(&listener));
                let from_sidecar = sidecar.add_observable(listener);
                AutoDispose::merge(from_main, from_sidecar)
            }
        }
    }

    /// Deliver a lifecycle event to main, then to the sidecar
    pub fn on_lifecycle(&self, event: Lifecycle) {
        self.main().on_lifecycle(event);
        if let Some(sidecar) = self.sidecar() {
            sidecar.on_lifecycle(event);
        }
    }

    /// Release everything owned by main, then by the sidecar
    pub fn dispose(&self) {
        self.main().dispose();
        if let Some(sidecar) = self.sidecar() {
            sidecar.dispose();
        }
    }

    /// Whether every half has been disposed
    pub fn is_disposed(&self) -> bool {
        self.main().is_disposed() && self.sidecar().map_or(true, LogicContext::is_disposed)
    }
}

impl<S, A> fmt::Debug for Context<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Context::Single(main) => f.debug_tuple("Single").field(main).finish(),
            Context::Composite { main, sidecar } => f
                .debug_struct("Composite")
                .field("main", main)
                .field("sidecar", sidecar)
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{CountingStore, LifecycleLog};
    use std::cell::Cell;

    type Ctx = LogicContext<i32, &'static str>;

    fn hits_listener(hits: &Rc<Cell<usize>>) -> Listener {
        let hits = Rc::clone(hits);
        Rc::new(move || hits.set(hits.get() + 1))
    }

    #[test]
    fn test_merge_without_sidecar_is_single() {
        let store = CountingStore::new(1);
        let ctx = Context::merge(Ctx::connect("main", &store), None);
        assert!(matches!(ctx, Context::Single(_)));
        assert!(ctx.sidecar().is_none());
    }

    #[test]
    fn test_merged_reads_match_main() {
        let main_store = CountingStore::new(1);
        let side_store = CountingStore::new(100);
        let main = Ctx::connect("main", &main_store);
        let ctx = Context::merge(main.clone(), Some(Ctx::connect("side", &side_store)));

        assert!(Rc::ptr_eq(&ctx.state(), &main.state()));
        main_store.set_state(2);
        assert!(Rc::ptr_eq(&ctx.state(), &main.state()));
        assert_eq!(*ctx.state(), 2);
    }

    #[test]
    fn test_dispatch_goes_to_main_broadcast_to_both() {
        let main_store = CountingStore::new(0);
        let side_store = CountingStore::new(0);
        let ctx = Context::merge(
            Ctx::connect("main", &main_store),
            Some(Ctx::connect("side", &side_store)),
        );

        ctx.dispatch("only-main");
        ctx.broadcast("everyone");

        assert_eq!(main_store.dispatched(), vec!["only-main", "everyone"]);
        assert_eq!(side_store.dispatched(), vec!["everyone"]);
    }

    #[test]
    fn test_observer_registered_with_both() {
        let main_store = CountingStore::new(0);
        let side_store = CountingStore::new(0);
        let ctx = Context::merge(
            Ctx::connect("main", &main_store),
            Some(Ctx::connect("side", &side_store)),
        );
        let hits = Rc::new(Cell::new(0));

        let handle = ctx.add_observable(hits_listener(&hits));
        main_store.emit(1);
        side_store.emit(1);
        assert_eq!(hits.get(), 2);

        handle.dispose();
        handle.dispose();
        assert_eq!(main_store.unsubscribe_count(), 1);
        assert_eq!(side_store.unsubscribe_count(), 1);

        main_store.emit(2);
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn test_dispose_releases_both_registrations() {
        let main_store = CountingStore::new(0);
        let side_store = CountingStore::new(0);
        let ctx = Context::merge(
            Ctx::connect("main", &main_store),
            Some(Ctx::connect("side", &side_store)),
        );
        let _handle = ctx.add_observable(Rc::new(|| {}));

        ctx.dispose();
        ctx.dispose();

        assert!(ctx.is_disposed());
        assert_eq!(main_store.unsubscribe_count(), 1);
        assert_eq!(side_store.unsubscribe_count(), 1);
        assert_eq!(main_store.listener_count(), 0);
        assert_eq!(side_store.listener_count(), 0);
    }

    #[test]
    fn test_lifecycle_main_then_sidecar() {
        let store = CountingStore::new(0);
        let log = LifecycleLog::new();
        let main = Ctx::connect("main", &store).with_lifecycle(log.handler());
        let side = Ctx::connect("side", &store).with_lifecycle(log.handler());
        let ctx = Context::merge(main, Some(side));

        ctx.on_lifecycle(Lifecycle::Init);

        assert_eq!(
            log.entries(),
            vec![
                ("main".to_string(), Lifecycle::Init),
                ("side".to_string(), Lifecycle::Init)
            ]
        );
    }

    #[test]
    fn test_registered_resources_released_once() {
        let store = CountingStore::new(0);
        let ctx = Ctx::connect("main", &store);
        let released = Rc::new(Cell::new(0));
        let r = Rc::clone(&released);
        ctx.register_on_disposed(move || r.set(r.get() + 1));

        let clone = ctx.clone();
        ctx.dispose();
        clone.dispose();

        assert_eq!(released.get(), 1);
        assert!(clone.is_disposed());
    }

    #[test]
    fn test_typed_accessor_slices_state() {
        let store = CountingStore::<_, ()>::new((7, "title"));
        let reader = store.clone();
        let ctx: LogicContext<i32, ()> = LogicContext::new(
            "slice",
            move || Rc::new(reader.state().0),
            |_| {},
            |_| AutoDispose::new(),
        );
        assert_eq!(*ctx.state(), 7);
    }

    #[test]
    fn test_released_observers_do_not_accumulate() {
        let store = CountingStore::new(0);
        let ctx = Ctx::connect("main", &store);

        for _ in 0..1000 {
            let handle = ctx.add_observable(Rc::new(|| {}));
            handle.dispose();
        }

        assert_eq!(store.listener_count(), 0);
        assert_eq!(store.unsubscribe_count(), 1000);
        assert_eq!(ctx.resources.child_count(), 1);

        ctx.dispose();
        assert_eq!(store.unsubscribe_count(), 1000);
    }
}
