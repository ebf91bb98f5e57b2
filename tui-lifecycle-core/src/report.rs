//! Fire-and-forget reporting side channel
//!
//! Hosts report two things here: rebuild requests that could not be
//! scheduled, and (in debug mode) every fresh view build. Nothing a
//! reporter does can flow back into the update path.

use std::backtrace::Backtrace;
use std::fmt;
use std::rc::Rc;

use crate::error::SchedulingError;

/// A caught scheduling failure together with where it was caught
pub struct ErrorReport {
    /// Component whose rebuild could not be scheduled
    pub component: String,
    /// The failure
    pub error: SchedulingError,
    /// Captured at the point the failure was caught
    pub backtrace: Backtrace,
}

impl ErrorReport {
    /// Capture a report for `error` at the current call site
    pub fn capture(component: impl Into<String>, error: SchedulingError) -> Self {
        Self {
            component: component.into(),
            error,
            backtrace: Backtrace::capture(),
        }
    }
}

impl fmt::Debug for ErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorReport")
            .field("component", &self.component)
            .field("error", &self.error)
            .field("backtrace", &self.backtrace.status())
            .finish()
    }
}

/// Sink for reports
pub trait Reporter {
    /// A rebuild request failed and was swallowed
    fn report_error(&self, report: ErrorReport);

    /// A view was freshly built (debug mode only)
    fn report_update(&self, component: &str) {
        let _ = component;
    }
}

/// Shared reporter handle held by hosts
pub type SharedReporter = Rc<dyn Reporter>;

/// Reporter that forwards to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report_error(&self, report: ErrorReport) {
        tracing::warn!(
            component = %report.component,
            error = %report.error,
            backtrace = %report.backtrace,
            "rebuild request dropped"
        );
    }

    fn report_update(&self, component: &str) {
        tracing::trace!(component = %component, "view rebuilt");
    }
}
