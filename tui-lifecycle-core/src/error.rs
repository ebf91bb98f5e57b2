//! Error types

use thiserror::Error;

/// A host could not accept a rebuild request
///
/// This is the only recoverable failure in the update path: the host
/// reports it through its [`Reporter`](crate::report::Reporter) and keeps
/// showing the last built view. Builder and update policy panics are not
/// represented here; they propagate to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulingError {
    /// The render loop stopped listening for rebuild requests
    #[error("rebuild channel closed")]
    Closed,

    /// A custom scheduler refused the request
    #[error("rebuild rejected: {0}")]
    Rejected(String),
}
