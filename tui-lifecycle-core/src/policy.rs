//! Update policies deciding whether a new state snapshot warrants a rebuild
//!
//! States are shared as `Rc<S>`. The default [`UpdatePolicy::Identity`]
//! treats two snapshots as equal only when they are the same allocation,
//! which is exactly what [`Store`](crate::store::Store) produces: a reducer
//! that reports "no change" keeps the old `Rc`, a reducer that changes
//! anything publishes a new one.

use std::fmt;
use std::rc::Rc;

/// Predicate comparing the last built state with the current one
pub type ShouldUpdate<S> = Rc<dyn Fn(&S, &S) -> bool>;

/// Decides whether a view must be rebuilt for a new state snapshot
///
/// Policies must be side-effect free. A custom predicate that panics is a
/// programming error and the panic is not caught.
pub enum UpdatePolicy<S> {
    /// Update unless old and new are the same `Rc` allocation
    Identity,
    /// Always update
    Always,
    /// Never update; the first built view is kept until a reassemble
    Never,
    /// Caller supplied predicate, `true` means rebuild
    Custom(ShouldUpdate<S>),
}

impl<S> UpdatePolicy<S> {
    /// Wrap a custom predicate
    pub fn custom(f: impl Fn(&S, &S) -> bool + 'static) -> Self {
        UpdatePolicy::Custom(Rc::new(f))
    }

    /// Returns `true` when a view built from `old` is stale for `new`
    pub fn should_update(&self, old: &Rc<S>, new: &Rc<S>) -> bool {
        match self {
            UpdatePolicy::Identity => !Rc::ptr_eq(old, new),
            UpdatePolicy::Always => true,
            UpdatePolicy::Never => false,
            UpdatePolicy::Custom(f) => f(old, new),
        }
    }
}

impl<S: PartialEq + 'static> UpdatePolicy<S> {
    /// Update when the two snapshots differ by value
    pub fn by_value() -> Self {
        Self::custom(|old: &S, new: &S| old != new)
    }
}

impl<S> Default for UpdatePolicy<S> {
    fn default() -> Self {
        UpdatePolicy::Identity
    }
}

impl<S> Clone for UpdatePolicy<S> {
    fn clone(&self) -> Self {
        match self {
            UpdatePolicy::Identity => UpdatePolicy::Identity,
            UpdatePolicy::Always => UpdatePolicy::Always,
            UpdatePolicy::Never => UpdatePolicy::Never,
            UpdatePolicy::Custom(f) => UpdatePolicy::Custom(Rc::clone(f)),
        }
    }
}

impl<S> fmt::Debug for UpdatePolicy<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdatePolicy::Identity => f.write_str("Identity"),
            UpdatePolicy::Always => f.write_str("Always"),
            UpdatePolicy::Never => f.write_str("Never"),
            UpdatePolicy::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Counter(i32);

    #[test]
    fn test_identity_same_instance() {
        let a = Rc::new(Counter(1));
        let policy = UpdatePolicy::default();
        assert!(!policy.should_update(&a, &Rc::clone(&a)));
    }

    #[test]
    fn test_identity_equal_values_distinct_instances() {
        let policy = UpdatePolicy::Identity;
        assert!(policy.should_update(&Rc::new(Counter(1)), &Rc::new(Counter(1))));
    }

    #[test]
    fn test_presets() {
        let a = Rc::new(Counter(1));
        let b = Rc::new(Counter(2));
        assert!(UpdatePolicy::Always.should_update(&a, &a));
        assert!(!UpdatePolicy::Never.should_update(&a, &b));
    }

    #[test]
    fn test_by_value() {
        let policy = UpdatePolicy::by_value();
        assert!(!policy.should_update(&Rc::new(Counter(1)), &Rc::new(Counter(1))));
        assert!(policy.should_update(&Rc::new(Counter(1)), &Rc::new(Counter(3))));
    }

    #[test]
    fn test_custom_field_projection() {
        let policy = UpdatePolicy::custom(|old: &(i32, i32), new: &(i32, i32)| old.0 != new.0);
        assert!(!policy.should_update(&Rc::new((1, 1)), &Rc::new((1, 9))));
        assert!(policy.should_update(&Rc::new((1, 1)), &Rc::new((2, 1))));
    }
}
