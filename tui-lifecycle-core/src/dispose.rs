//! Single-use release handles
//!
//! [`AutoDispose`] wraps release actions (store unsubscription, cleanup
//! registered by a context) behind a handle that may be disposed any number
//! of times while running each release action at most once.
//!
//! Handles form a tree: disposing a parent disposes every child first and
//! then runs the parent's own callbacks in registration order.
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use tui_lifecycle_core::AutoDispose;
//!
//! let released = Rc::new(Cell::new(0));
//! let r = Rc::clone(&released);
//! let handle = AutoDispose::from_fn(move || r.set(r.get() + 1));
//!
//! handle.dispose();
//! handle.dispose();
//! assert_eq!(released.get(), 1);
//! ```

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

type Release = Box<dyn FnOnce()>;

#[derive(Default)]
struct DisposeInner {
    disposed: Cell<bool>,
    callbacks: RefCell<Vec<Release>>,
    children: RefCell<Vec<AutoDispose>>,
}

/// Idempotent release handle
///
/// Cloning yields another handle to the same resource; disposing through
/// any clone disposes all of them.
#[derive(Clone, Default)]
pub struct AutoDispose {
    inner: Rc<DisposeInner>,
}

impl AutoDispose {
    /// Create an empty handle with nothing to release yet
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a handle that runs `release` on first disposal
    pub fn from_fn(release: impl FnOnce() + 'static) -> Self {
        let handle = Self::new();
        handle.on_disposed(release);
        handle
    }

    /// Combine two handles into one whose disposal releases both
    pub fn merge(first: AutoDispose, second: AutoDispose) -> Self {
        let handle = Self::new();
        handle.adopt(first);
        handle.adopt(second);
        handle
    }

    /// Register an extra release action
    ///
    /// If the handle is already disposed the action runs immediately, so a
    /// late registration never leaks.
    pub fn on_disposed(&self, release: impl FnOnce() + 'static) {
        if self.is_disposed() {
            release();
            return;
        }
        self.inner.callbacks.borrow_mut().push(Box::new(release));
    }

    /// Create a child handle released together with this one
    pub fn register_child(&self) -> AutoDispose {
        let child = AutoDispose::new();
        self.adopt(child.clone());
        child
    }

    /// Attach an existing handle as a child
    ///
    /// Children already disposed on their own are dropped from the tree
    /// here, so a long-lived parent does not accumulate dead handles.
    pub fn adopt(&self, child: AutoDispose) {
        if self.is_disposed() {
            child.dispose();
            return;
        }
        let mut children = self.inner.children.borrow_mut();
        children.retain(|c| !c.is_disposed());
        children.push(child);
    }

    /// Number of children still tracked by this handle
    pub(crate) fn child_count(&self) -> usize {
        self.inner.children.borrow().len()
    }

    /// Whether [`dispose`](Self::dispose) has already run
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }

    /// Release children, then this handle's own callbacks
    ///
    /// Safe to call repeatedly and re-entrantly; only the first call
    /// releases anything.
    pub fn dispose(&self) {
        if self.inner.disposed.replace(true) {
            return;
        }
        let children = std::mem::take(&mut *self.inner.children.borrow_mut());
        for child in children {
            child.dispose();
        }
        let callbacks = std::mem::take(&mut *self.inner.callbacks.borrow_mut());
        for release in callbacks {
            release();
        }
    }
}

impl fmt::Debug for AutoDispose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AutoDispose")
            .field("disposed", &self.is_disposed())
            .field("callbacks", &self.inner.callbacks.borrow().len())
            .field("children", &self.inner.children.borrow().len())
            .finish()
    }
}
