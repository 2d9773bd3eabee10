//! Bounded vitality meter for a single category.

/// A clamped value in `0..=max`.
///
/// Out-of-range input is never an error; every mutation clamps.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Meter {
    value: i64,
    max: i64,
}

impl Meter {
    /// Create a full meter. `max` is forced to at least 1.
    pub fn new(max: i64) -> Self {
        let max = max.max(1);
        Self { value: max, max }
    }

    pub fn set_value(&mut self, value: i64) {
        self.value = value.clamp(0, self.max);
    }

    /// Add `delta` (negative drains) and clamp.
    pub fn increment(&mut self, delta: i64) {
        self.set_value(self.value.saturating_add(delta));
    }

    pub fn reset(&mut self) {
        self.value = self.max;
    }

    pub fn value(&self) -> i64 {
        self.value
    }

    pub fn max(&self) -> i64 {
        self.max
    }

    pub fn is_empty(&self) -> bool {
        self.value == 0
    }
}
