//! Action trait for type-safe state mutations

use std::fmt::Debug;

/// Marker trait for actions that can be dispatched to a store
///
/// Actions represent intents to change state. They should be:
/// - Clone: Actions may be logged, replayed, or sent to multiple handlers
/// - Debug: For debugging and logging
/// - 'static: Contexts keep dispatch closures that outlive any borrow
///
/// Everything in this crate runs on the single UI thread, so `Send` is not
/// required.
///
/// Use `#[derive(Action)]` from `tui-lifecycle-macros` to auto-implement this trait.
pub trait Action: Clone + Debug + 'static {
    /// Get the action name for logging and filtering
    fn name(&self) -> &'static str;
}

/// Optional grouping of actions for app-side routing and test assertions
///
/// `#[derive(Action)]` implements this when at least one variant carries
/// `#[action(category = "...")]`.
pub trait ActionCategory: Action {
    /// Category of this action, if it has one
    fn category(&self) -> Option<&'static str>;
}
