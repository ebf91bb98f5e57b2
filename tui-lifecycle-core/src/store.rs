//! Centralized state store with reducer pattern and change broadcast

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::dispose::AutoDispose;
use crate::Action;

/// A reducer function that handles actions and mutates state
///
/// Returns `true` if the state changed and a re-render is needed.
pub type Reducer<S, A> = fn(&mut S, A) -> bool;

/// Callback invoked after every state change
pub type Listener = Rc<dyn Fn()>;

/// What a context needs from a store
///
/// [`Store`] is the stock implementation; anything else that can hand out
/// snapshots, accept actions and broadcast changes can stand in for it
/// (see [`CountingStore`](crate::testing::CountingStore)).
pub trait StoreApi<S, A> {
    /// Current state snapshot
    fn state(&self) -> Rc<S>;

    /// Dispatch an action
    fn dispatch(&self, action: A);

    /// Register a change listener
    ///
    /// Disposing the returned handle unsubscribes; disposing it again does
    /// nothing.
    fn subscribe(&self, listener: Listener) -> AutoDispose;
}

struct StoreInner<S, A: Action> {
    state: RefCell<Rc<S>>,
    reducer: Reducer<S, A>,
    middleware: RefCell<Box<dyn Middleware<A>>>,
    listeners: RefCell<Vec<(u64, Listener)>>,
    next_listener: Cell<u64>,
}

/// Centralized state store with Redux-like reducer pattern
///
/// The state lives behind an `Rc`. `dispatch` runs the reducer on a copy
/// and publishes the copy only if the reducer reports a change, so the
/// `Rc` identity of the state changes exactly when its content does.
/// Listeners are notified in subscription order after every published
/// change.
///
/// `Store` is a cheap handle; clones share the same state.
///
/// # Example
/// ```
/// use tui_lifecycle_core::{Action, Store};
///
/// #[derive(Clone, Default)]
/// struct AppState {
///     counter: i32,
/// }
///
/// #[derive(Clone, Debug)]
/// enum MyAction {
///     Increment,
/// }
///
/// impl Action for MyAction {
///     fn name(&self) -> &'static str {
///         "Increment"
///     }
/// }
///
/// fn reducer(state: &mut AppState, action: MyAction) -> bool {
///     match action {
///         MyAction::Increment => {
///             state.counter += 1;
///             true
///         }
///     }
/// }
///
/// let store = Store::new(AppState::default(), reducer);
/// store.dispatch(MyAction::Increment);
/// assert_eq!(store.state().counter, 1);
/// ```
pub struct Store<S, A: Action> {
    inner: Rc<StoreInner<S, A>>,
}

impl<S, A: Action> Clone for Store<S, A> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<S: Clone + 'static, A: Action> Store<S, A> {
    /// Create a new store with initial state and reducer
    pub fn new(state: S, reducer: Reducer<S, A>) -> Self {
        Self::with_middleware(state, reducer, NoopMiddleware)
    }

    /// Create a new store whose dispatches run through `middleware`
    pub fn with_middleware(
        state: S,
        reducer: Reducer<S, A>,
        middleware: impl Middleware<A> + 'static,
    ) -> Self {
        Self {
            inner: Rc::new(StoreInner {
                state: RefCell::new(Rc::new(state)),
                reducer,
                middleware: RefCell::new(Box::new(middleware)),
                listeners: RefCell::new(Vec::new()),
                next_listener: Cell::new(0),
            }),
        }
    }

    /// Dispatch an action to the store
    ///
    /// The reducer will be called with a copy of the current state.
    /// Returns `true` if the state changed and listeners were notified.
    pub fn dispatch(&self, action: A) -> bool {
        self.inner.middleware.borrow_mut().before(&action);

        let mut next = S::clone(&self.inner.state.borrow());
        let changed = (self.inner.reducer)(&mut next, action.clone());
        if changed {
            *self.inner.state.borrow_mut() = Rc::new(next);
        }

        self.inner.middleware.borrow_mut().after(&action, changed);

        if changed {
            self.notify();
        }
        changed
    }
}

impl<S: 'static, A: Action> Store<S, A> {
    /// Get the current state snapshot
    pub fn state(&self) -> Rc<S> {
        Rc::clone(&self.inner.state.borrow())
    }

    /// Number of live listeners
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }

    /// Register a change listener, see [`StoreApi::subscribe`]
    pub fn subscribe(&self, listener: Listener) -> AutoDispose {
        let id = self.inner.next_listener.get();
        self.inner.next_listener.set(id + 1);
        self.inner.listeners.borrow_mut().push((id, listener));

        let weak: Weak<StoreInner<S, A>> = Rc::downgrade(&self.inner);
        AutoDispose::from_fn(move || {
            if let Some(inner) = weak.upgrade() {
                inner.listeners.borrow_mut().retain(|(key, _)| *key != id);
            }
        })
    }

    fn notify(&self) {
        // Snapshot so listeners may (un)subscribe while we iterate
        let snapshot: Vec<(u64, Listener)> = self.inner.listeners.borrow().clone();
        for (id, listener) in snapshot {
            let live = self
                .inner
                .listeners
                .borrow()
                .iter()
                .any(|(key, _)| *key == id);
            if live {
                listener();
            }
        }
    }
}

impl<S: Clone + 'static, A: Action> StoreApi<S, A> for Store<S, A> {
    fn state(&self) -> Rc<S> {
        Store::state(self)
    }

    fn dispatch(&self, action: A) {
        Store::dispatch(self, action);
    }

    fn subscribe(&self, listener: Listener) -> AutoDispose {
        Store::subscribe(self, listener)
    }
}

impl<S: 'static, A: Action> fmt::Debug for Store<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("listeners", &self.listener_count())
            .finish_non_exhaustive()
    }
}

/// Middleware trait for intercepting actions
///
/// Implement this trait to add logging, persistence, or other
/// cross-cutting concerns to your store.
pub trait Middleware<A: Action> {
    /// Called before the action is dispatched to the reducer
    fn before(&mut self, action: &A);

    /// Called after the action is processed by the reducer
    fn after(&mut self, action: &A, state_changed: bool);
}

/// A no-op middleware that does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMiddleware;

impl<A: Action> Middleware<A> for NoopMiddleware {
    fn before(&mut self, _action: &A) {}
    fn after(&mut self, _action: &A, _state_changed: bool) {}
}

/// Middleware that logs every action through `tracing`
#[derive(Debug, Clone, Default)]
pub struct LoggingMiddleware {
    /// Whether to log before dispatch
    pub log_before: bool,
    /// Whether to log after dispatch
    pub log_after: bool,
}

impl LoggingMiddleware {
    /// Create a new logging middleware with default settings (log after only)
    pub fn new() -> Self {
        Self {
            log_before: false,
            log_after: true,
        }
    }
}

impl<A: Action> Middleware<A> for LoggingMiddleware {
    fn before(&mut self, action: &A) {
        if self.log_before {
            tracing::debug!(action = %action.name(), "Dispatching action");
        }
    }

    fn after(&mut self, action: &A, state_changed: bool) {
        if self.log_after {
            tracing::debug!(
                action = %action.name(),
                state_changed = state_changed,
                "Action processed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Default)]
    struct TestState {
        counter: i32,
    }

    #[derive(Clone, Debug)]
    enum TestAction {
        Increment,
        NoOp,
    }

    impl Action for TestAction {
        fn name(&self) -> &'static str {
            match self {
                TestAction::Increment => "Increment",
                TestAction::NoOp => "NoOp",
            }
        }
    }

    fn test_reducer(state: &mut TestState, action: TestAction) -> bool {
        match action {
            TestAction::Increment => {
                state.counter += 1;
                true
            }
            TestAction::NoOp => false,
        }
    }

    fn counting_listener(hits: &Rc<Cell<usize>>) -> Listener {
        let hits = Rc::clone(hits);
        Rc::new(move || hits.set(hits.get() + 1))
    }

    #[test]
    fn test_store_dispatch() {
        let store = Store::new(TestState::default(), test_reducer);

        assert!(store.dispatch(TestAction::Increment));
        assert!(store.dispatch(TestAction::Increment));
        assert_eq!(store.state().counter, 2);
    }

    #[test]
    fn test_noop_keeps_identity() {
        let store = Store::new(TestState::default(), test_reducer);
        let before = store.state();

        assert!(!store.dispatch(TestAction::NoOp));
        assert!(Rc::ptr_eq(&before, &store.state()));

        store.dispatch(TestAction::Increment);
        assert!(!Rc::ptr_eq(&before, &store.state()));
        assert_eq!(before.counter, 0);
    }

    #[test]
    fn test_listeners_only_on_change() {
        let store = Store::new(TestState::default(), test_reducer);
        let hits = Rc::new(Cell::new(0));
        let _sub = store.subscribe(counting_listener(&hits));

        store.dispatch(TestAction::NoOp);
        assert_eq!(hits.get(), 0);

        store.dispatch(TestAction::Increment);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_unsubscribe_is_idempotent() {
        let store = Store::new(TestState::default(), test_reducer);
        let hits = Rc::new(Cell::new(0));
        let first = store.subscribe(counting_listener(&hits));
        let _second = store.subscribe(counting_listener(&hits));
        assert_eq!(store.listener_count(), 2);

        first.dispose();
        first.dispose();
        assert_eq!(store.listener_count(), 1);

        store.dispatch(TestAction::Increment);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_listener_removed_mid_broadcast_is_skipped() {
        let store = Store::new(TestState::default(), test_reducer);
        let hits = Rc::new(Cell::new(0));

        let victim: Rc<RefCell<Option<AutoDispose>>> = Rc::new(RefCell::new(None));
        let v = Rc::clone(&victim);
        let _killer = store.subscribe(Rc::new(move || {
            if let Some(handle) = v.borrow().as_ref() {
                handle.dispose();
            }
        }));
        *victim.borrow_mut() = Some(store.subscribe(counting_listener(&hits)));

        store.dispatch(TestAction::Increment);
        assert_eq!(hits.get(), 0);
        assert_eq!(store.listener_count(), 1);
    }

    #[test]
    fn test_dispatch_from_listener() {
        let store = Store::new(TestState::default(), test_reducer);
        let inner = store.clone();
        let _sub = store.subscribe(Rc::new(move || {
            if inner.state().counter < 3 {
                inner.dispatch(TestAction::Increment);
            }
        }));

        store.dispatch(TestAction::Increment);
        assert_eq!(store.state().counter, 3);
    }

    #[test]
    fn test_unsubscribe_after_store_dropped() {
        let store = Store::new(TestState::default(), test_reducer);
        let sub = store.subscribe(Rc::new(|| {}));
        drop(store);
        sub.dispose();
        assert!(sub.is_disposed());
    }

    #[derive(Default)]
    struct CountingMiddleware {
        before_count: Rc<Cell<usize>>,
        changed_count: Rc<Cell<usize>>,
    }

    impl<A: Action> Middleware<A> for CountingMiddleware {
        fn before(&mut self, _action: &A) {
            self.before_count.set(self.before_count.get() + 1);
        }

        fn after(&mut self, _action: &A, state_changed: bool) {
            if state_changed {
                self.changed_count.set(self.changed_count.get() + 1);
            }
        }
    }

    #[test]
    fn test_store_with_middleware() {
        let middleware = CountingMiddleware::default();
        let before = Rc::clone(&middleware.before_count);
        let changed = Rc::clone(&middleware.changed_count);
        let store = Store::with_middleware(TestState::default(), test_reducer, middleware);

        store.dispatch(TestAction::Increment);
        store.dispatch(TestAction::NoOp);

        assert_eq!(before.get(), 2);
        assert_eq!(changed.get(), 1);
    }

    #[test]
    fn test_logging_middleware_passes_actions_through() {
        let store = Store::with_middleware(TestState::default(), test_reducer, LoggingMiddleware::new());

        assert!(store.dispatch(TestAction::Increment));
        assert!(!store.dispatch(TestAction::NoOp));
        assert_eq!(store.state().counter, 1);
    }
}
