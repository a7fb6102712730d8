use alloc::vec::Vec;

use log::trace;

/// Capacity policy for the explicit stack used to tear down a tree.
///
/// Teardown visits every node without recursion by pushing pending subtrees onto a growable
/// stack. A larger initial capacity or growth factor trades memory for fewer reallocations on
/// very large or very skewed trees.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TeardownConfig {
    initial_capacity: usize,
    growth_factor: f64,
}

impl TeardownConfig {
    pub const DEFAULT_INITIAL_CAPACITY: usize = 25;
    pub const DEFAULT_GROWTH_FACTOR: f64 = 1.8;

    pub const fn new() -> Self {
        TeardownConfig {
            initial_capacity: Self::DEFAULT_INITIAL_CAPACITY,
            growth_factor: Self::DEFAULT_GROWTH_FACTOR,
        }
    }

    /// Sets the number of entries the stack reserves up front.
    #[must_use]
    pub const fn with_initial_capacity(self, initial_capacity: usize) -> Self {
        TeardownConfig {
            initial_capacity,
            ..self
        }
    }

    /// Sets the factor the stack's capacity is multiplied by when it is full.
    ///
    /// # Panics
    ///
    /// Panics if `growth_factor` is not finite or is less than `1.0`.
    #[must_use]
    pub fn with_growth_factor(self, growth_factor: f64) -> Self {
        assert!(
            growth_factor.is_finite() && growth_factor >= 1.0,
            "teardown growth factor must be finite and at least 1.0, got {growth_factor}"
        );

        TeardownConfig {
            growth_factor,
            ..self
        }
    }

    pub const fn initial_capacity(&self) -> usize {
        self.initial_capacity
    }

    pub const fn growth_factor(&self) -> f64 {
        self.growth_factor
    }

    // Returns the capacity to grow to once `capacity` entries are in use. Always grows by at
    // least one entry.
    fn grown_capacity(&self, capacity: usize) -> usize {
        let scaled = capacity as f64 * self.growth_factor;

        let mut grown = scaled as usize;
        if (grown as f64) < scaled {
            grown += 1;
        }

        grown.max(capacity + 1)
    }
}

impl Default for TeardownConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// A LIFO stack whose growth follows a [`TeardownConfig`].
pub(crate) struct GrowableStack<T> {
    items: Vec<T>,
    config: TeardownConfig,
}

impl<T> GrowableStack<T> {
    pub(crate) fn new(config: TeardownConfig) -> Self {
        GrowableStack {
            items: Vec::with_capacity(config.initial_capacity),
            config,
        }
    }

    pub(crate) fn push_back(&mut self, item: T) {
        let capacity = self.items.capacity();

        if self.items.len() == capacity {
            let grown = self.config.grown_capacity(capacity);
            trace!("teardown stack full at {capacity} entries, growing to {grown}");

            self.items.reserve_exact(grown - self.items.len());
        }

        self.items.push(item);
    }

    pub(crate) fn pop_back(&mut self) -> Option<T> {
        self.items.pop()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn capacity(&self) -> usize {
        self.items.capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy() {
        let config = TeardownConfig::default();
        assert_eq!(config.initial_capacity(), 25);
        assert_eq!(config.growth_factor(), 1.8);
    }

    #[test]
    fn grown_capacity_rounds_up() {
        let config = TeardownConfig::new().with_growth_factor(1.8);
        assert_eq!(config.grown_capacity(25), 45);
        assert_eq!(config.grown_capacity(10), 18);
        assert_eq!(config.grown_capacity(3), 6);
        assert_eq!(config.grown_capacity(0), 1);
    }

    #[test]
    fn unit_growth_factor_still_grows() {
        let config = TeardownConfig::new().with_growth_factor(1.0);
        assert_eq!(config.grown_capacity(0), 1);
        assert_eq!(config.grown_capacity(7), 8);
    }

    #[test]
    #[should_panic(expected = "growth factor")]
    fn shrinking_growth_factor_panics() {
        let _ = TeardownConfig::new().with_growth_factor(0.5);
    }

    #[test]
    #[should_panic(expected = "growth factor")]
    fn nan_growth_factor_panics() {
        let _ = TeardownConfig::new().with_growth_factor(f64::NAN);
    }

    #[test]
    fn stack_is_lifo_and_grows() {
        let config = TeardownConfig::new()
            .with_initial_capacity(2)
            .with_growth_factor(2.0);
        let mut stack = GrowableStack::new(config);
        assert!(stack.is_empty());
        assert!(stack.capacity() >= 2);

        for i in 0..10 {
            stack.push_back(i);
        }
        assert!(stack.capacity() >= 10);

        for i in (0..10).rev() {
            assert_eq!(stack.pop_back(), Some(i));
        }
        assert_eq!(stack.pop_back(), None);
        assert!(stack.is_empty());
    }
}
