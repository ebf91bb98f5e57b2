//! Lifecycle events delivered to a component's context
//!
//! The host never calls component code directly for lifecycle changes;
//! it hands a [`Lifecycle`] value to the context, which routes it to the
//! main logic and, for composite contexts, to the sidecar as well.

use std::fmt;

/// A lifecycle transition of a hosted component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifecycle {
    /// The host has been created and its store subscription bound
    Init,
    /// A fresh view was built (not sent for cache hits)
    Build,
    /// Something the component depends on, outside its own state, changed
    DidChangeDependencies,
    /// The host was removed from the live tree, possibly temporarily
    Deactivate,
    /// The host received new construction parameters
    DidUpdateWidget,
    /// The host is being torn down
    Dispose,
    /// Developer-triggered full refresh (hot reload)
    Reassemble,
}

impl Lifecycle {
    /// Every lifecycle kind, in the order a host normally emits them
    pub const ALL: [Lifecycle; 7] = [
        Lifecycle::Init,
        Lifecycle::Build,
        Lifecycle::DidChangeDependencies,
        Lifecycle::DidUpdateWidget,
        Lifecycle::Reassemble,
        Lifecycle::Deactivate,
        Lifecycle::Dispose,
    ];

    /// Stable name used in logs and action filters
    pub fn name(self) -> &'static str {
        match self {
            Lifecycle::Init => "Init",
            Lifecycle::Build => "Build",
            Lifecycle::DidChangeDependencies => "DidChangeDependencies",
            Lifecycle::Deactivate => "Deactivate",
            Lifecycle::DidUpdateWidget => "DidUpdateWidget",
            Lifecycle::Dispose => "Dispose",
            Lifecycle::Reassemble => "Reassemble",
        }
    }
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
