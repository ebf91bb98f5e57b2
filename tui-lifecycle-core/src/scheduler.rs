//! Rebuild scheduling
//!
//! A host never rebuilds synchronously from a store broadcast. It asks a
//! [`RebuildScheduler`] to mark it dirty, and the render loop rebuilds
//! dirty hosts on its next pass.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc;

use crate::error::SchedulingError;

/// Identifies a host in rebuild requests
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HostId(u64);

impl HostId {
    /// Allocate a fresh, process-unique id
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for HostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "host#{}", self.0)
    }
}

/// Accepts "please rebuild me on the next pass" requests
pub trait RebuildScheduler {
    /// Mark `host` as needing a build
    ///
    /// Return an error when the request cannot be honoured; the host
    /// reports it and keeps its current output.
    fn mark_needs_build(&self, host: HostId) -> Result<(), SchedulingError>;
}

/// Shared scheduler handle held by hosts
pub type SharedScheduler = Rc<dyn RebuildScheduler>;

#[derive(Default)]
struct FrameInner {
    dirty: RefCell<Vec<HostId>>,
    closed: Cell<bool>,
}

/// Dirty-set scheduler for synchronous render loops
///
/// Requests are deduplicated; [`take_dirty`](Self::take_dirty) drains them
/// in request order. After [`close`](Self::close) every request fails with
/// [`SchedulingError::Closed`].
#[derive(Clone, Default)]
pub struct FrameScheduler {
    inner: Rc<FrameInner>,
}

impl FrameScheduler {
    /// Create an open scheduler with nothing dirty
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any host is waiting for a rebuild
    pub fn is_dirty(&self) -> bool {
        !self.inner.dirty.borrow().is_empty()
    }

    /// Drain the hosts waiting for a rebuild
    pub fn take_dirty(&self) -> Vec<HostId> {
        std::mem::take(&mut *self.inner.dirty.borrow_mut())
    }

    /// Refuse all further requests
    pub fn close(&self) {
        self.inner.closed.set(true);
        self.inner.dirty.borrow_mut().clear();
    }
}

impl RebuildScheduler for FrameScheduler {
    fn mark_needs_build(&self, host: HostId) -> Result<(), SchedulingError> {
        if self.inner.closed.get() {
            return Err(SchedulingError::Closed);
        }
        let mut dirty = self.inner.dirty.borrow_mut();
        if !dirty.contains(&host) {
            dirty.push(host);
        }
        Ok(())
    }
}

impl fmt::Debug for FrameScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameScheduler")
            .field("dirty", &self.inner.dirty.borrow().len())
            .field("closed", &self.inner.closed.get())
            .finish()
    }
}

/// A rebuild request sent over a [`ChannelScheduler`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RebuildRequest {
    /// Host that wants a rebuild
    pub host: HostId,
}

/// Scheduler that forwards requests to an async render loop
///
/// Dropping the receiver closes the scheduler.
#[derive(Debug, Clone)]
pub struct ChannelScheduler {
    tx: mpsc::UnboundedSender<RebuildRequest>,
}

impl ChannelScheduler {
    /// Create a scheduler and the receiving end for the render loop
    pub fn new() -> (Self, mpsc::UnboundedReceiver<RebuildRequest>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl RebuildScheduler for ChannelScheduler {
    fn mark_needs_build(&self, host: HostId) -> Result<(), SchedulingError> {
        self.tx
            .send(RebuildRequest { host })
            .map_err(|_| SchedulingError::Closed)
    }
}
