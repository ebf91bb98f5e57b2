//! Test utilities for components and hosts
//!
//! - [`CountingStore`]: a store double that counts (un)subscriptions and
//!   lets tests publish states and broadcasts by hand
//! - [`RecordingReporter`] / [`RecordingScheduler`]: capture what a host
//!   reports and which rebuilds it requests
//! - [`LifecycleLog`]: a lifecycle handler that records every event
//! - [`render_to_string`] / [`buffer_to_string`]: ratatui snapshot helpers
//! - [`assert_lifecycle!`](crate::assert_lifecycle) and
//!   [`count_lifecycle!`](crate::count_lifecycle)
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use tui_lifecycle_core::testing::CountingStore;
//! use tui_lifecycle_core::StoreApi;
//!
//! let store = CountingStore::<i32, ()>::new(1);
//! let sub = store.subscribe(Rc::new(|| {}));
//! sub.dispose();
//! sub.dispose();
//! assert_eq!(store.subscribe_count(), 1);
//! assert_eq!(store.unsubscribe_count(), 1);
//! ```

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::widgets::Widget;

use crate::context::LogicContext;
use crate::dispose::AutoDispose;
use crate::error::SchedulingError;
use crate::lifecycle::Lifecycle;
use crate::report::{ErrorReport, Reporter, SharedReporter};
use crate::scheduler::{HostId, RebuildScheduler, SharedScheduler};
use crate::store::{Listener, StoreApi};

struct CountingInner<S, A> {
    state: RefCell<Rc<S>>,
    listeners: RefCell<Vec<(u64, Listener)>>,
    next_listener: Cell<u64>,
    subscribes: Cell<usize>,
    unsubscribes: Cell<usize>,
    dispatched: RefCell<Vec<A>>,
}

/// Hand-driven store double
///
/// Dispatched actions are recorded, not reduced. Tests change state with
/// [`set_state`](Self::set_state) and broadcast with
/// [`notify`](Self::notify), or both at once with [`emit`](Self::emit).
pub struct CountingStore<S, A> {
    inner: Rc<CountingInner<S, A>>,
}

impl<S, A> Clone for CountingStore<S, A> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<S: 'static, A: 'static> CountingStore<S, A> {
    /// Create a store holding `state`
    pub fn new(state: S) -> Self {
        Self {
            inner: Rc::new(CountingInner {
                state: RefCell::new(Rc::new(state)),
                listeners: RefCell::new(Vec::new()),
                next_listener: Cell::new(0),
                subscribes: Cell::new(0),
                unsubscribes: Cell::new(0),
                dispatched: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Current snapshot
    pub fn state(&self) -> Rc<S> {
        Rc::clone(&self.inner.state.borrow())
    }

    /// Publish a new snapshot without notifying; returns it
    pub fn set_state(&self, state: S) -> Rc<S> {
        let state = Rc::new(state);
        self.set_shared(Rc::clone(&state));
        state
    }

    /// Publish an existing snapshot without notifying
    pub fn set_shared(&self, state: Rc<S>) {
        *self.inner.state.borrow_mut() = state;
    }

    /// Broadcast to every live listener
    pub fn notify(&self) {
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

    /// Publish a new snapshot and broadcast it
    pub fn emit(&self, state: S) -> Rc<S> {
        let state = self.set_state(state);
        self.notify();
        state
    }

    /// How many times `subscribe` was called
    pub fn subscribe_count(&self) -> usize {
        self.inner.subscribes.get()
    }

    /// How many subscriptions were released
    pub fn unsubscribe_count(&self) -> usize {
        self.inner.unsubscribes.get()
    }

    /// Live listeners
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }

    /// Actions dispatched so far
    pub fn dispatched(&self) -> Vec<A>
    where
        A: Clone,
    {
        self.inner.dispatched.borrow().clone()
    }
}

impl<S: 'static, A: 'static> StoreApi<S, A> for CountingStore<S, A> {
    fn state(&self) -> Rc<S> {
        CountingStore::state(self)
    }

    fn dispatch(&self, action: A) {
        self.inner.dispatched.borrow_mut().push(action);
    }

    fn subscribe(&self, listener: Listener) -> AutoDispose {
        let id = self.inner.next_listener.get();
        self.inner.next_listener.set(id + 1);
        self.inner.subscribes.set(self.inner.subscribes.get() + 1);
        self.inner.listeners.borrow_mut().push((id, listener));

        let inner = Rc::downgrade(&self.inner);
        AutoDispose::from_fn(move || {
            if let Some(inner) = inner.upgrade() {
                inner.unsubscribes.set(inner.unsubscribes.get() + 1);
                inner.listeners.borrow_mut().retain(|(key, _)| *key != id);
            }
        })
    }
}

#[derive(Default)]
struct ReporterInner {
    errors: RefCell<Vec<SchedulingError>>,
    updates: RefCell<Vec<String>>,
}

/// Reporter that keeps everything it is told
#[derive(Clone, Default)]
pub struct RecordingReporter {
    inner: Rc<ReporterInner>,
}

impl RecordingReporter {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// A handle to pass to hosts and updaters
    pub fn shared(&self) -> SharedReporter {
        Rc::new(self.clone())
    }

    /// Scheduling failures reported so far
    pub fn errors(&self) -> Vec<SchedulingError> {
        self.inner.errors.borrow().clone()
    }

    /// Components reported as rebuilt so far
    pub fn updates(&self) -> Vec<String> {
        self.inner.updates.borrow().clone()
    }
}

impl Reporter for RecordingReporter {
    fn report_error(&self, report: ErrorReport) {
        self.inner.errors.borrow_mut().push(report.error);
    }

    fn report_update(&self, component: &str) {
        self.inner.updates.borrow_mut().push(component.to_string());
    }
}

#[derive(Default)]
struct SchedulerInner {
    requests: RefCell<Vec<HostId>>,
    failure: RefCell<Option<SchedulingError>>,
}

/// Scheduler that records requests and can be told to fail
#[derive(Clone, Default)]
pub struct RecordingScheduler {
    inner: Rc<SchedulerInner>,
}

impl RecordingScheduler {
    /// Create a scheduler that accepts everything
    pub fn new() -> Self {
        Self::default()
    }

    /// A handle to pass to hosts
    pub fn shared(&self) -> SharedScheduler {
        Rc::new(self.clone())
    }

    /// Fail every following request with `error` (`None` to accept again)
    pub fn fail_with(&self, error: Option<SchedulingError>) {
        *self.inner.failure.borrow_mut() = error;
    }

    /// Accepted requests so far
    pub fn requests(&self) -> Vec<HostId> {
        self.inner.requests.borrow().clone()
    }

    /// Number of accepted requests
    pub fn request_count(&self) -> usize {
        self.inner.requests.borrow().len()
    }
}

impl RebuildScheduler for RecordingScheduler {
    fn mark_needs_build(&self, host: HostId) -> Result<(), SchedulingError> {
        if let Some(error) = self.inner.failure.borrow().clone() {
            return Err(error);
        }
        self.inner.requests.borrow_mut().push(host);
        Ok(())
    }
}

/// Records `(context name, event)` pairs from any number of contexts
#[derive(Clone, Default)]
pub struct LifecycleLog {
    entries: Rc<RefCell<Vec<(String, Lifecycle)>>>,
}

impl LifecycleLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// A lifecycle handler that appends to this log
    pub fn handler<S: 'static, A: 'static>(
        &self,
    ) -> impl Fn(Lifecycle, &LogicContext<S, A>) + 'static {
        let entries = Rc::clone(&self.entries);
        move |event: Lifecycle, ctx: &LogicContext<S, A>| {
            entries.borrow_mut().push((ctx.name().to_string(), event))
        }
    }

    /// Everything recorded, in order
    pub fn entries(&self) -> Vec<(String, Lifecycle)> {
        self.entries.borrow().clone()
    }

    /// Events only, in order
    pub fn events(&self) -> Vec<Lifecycle> {
        self.entries.borrow().iter().map(|(_, e)| *e).collect()
    }

    /// How many times `event` was recorded
    pub fn count(&self, event: Lifecycle) -> usize {
        self.entries.borrow().iter().filter(|(_, e)| *e == event).count()
    }

    /// Forget everything recorded so far
    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }
}

/// Render a buffer as text, one line per row, trailing spaces trimmed
pub fn buffer_to_string(buffer: &Buffer) -> String {
    let area = buffer.area;
    let mut lines = Vec::with_capacity(area.height as usize);
    for y in area.top()..area.bottom() {
        let mut line = String::new();
        for x in area.left()..area.right() {
            line.push_str(buffer[(x, y)].symbol());
        }
        lines.push(line.trim_end().to_string());
    }
    lines.join("\n")
}

/// Render a widget into a fresh `width` x `height` buffer and stringify it
pub fn render_to_string(widget: impl Widget, width: u16, height: u16) -> String {
    let area = Rect::new(0, 0, width, height);
    let mut buffer = Buffer::empty(area);
    widget.render(area, &mut buffer);
    buffer_to_string(&buffer)
}

/// Assert that a [`LifecycleLog`] recorded an event matching a pattern
///
/// ```ignore
/// assert_lifecycle!(log, Lifecycle::Init);
/// ```
#[macro_export]
macro_rules! assert_lifecycle {
    ($log:expr, $pattern:pat) => {{
        let events = $log.events();
        assert!(
            events.iter().any(|e| matches!(e, $pattern)),
            "Expected lifecycle event matching `{}`, got: {:?}",
            stringify!($pattern),
            events
        );
    }};
}

/// Count events in a [`LifecycleLog`] matching a pattern
///
/// ```ignore
/// assert_eq!(count_lifecycle!(log, Lifecycle::Build), 1);
/// ```
#[macro_export]
macro_rules! count_lifecycle {
    ($log:expr, $pattern:pat) => {
        $log.events().iter().filter(|e| matches!(e, $pattern)).count()
    };
}
