//! Resolution-independent scroll position tracking.
//!
//! Offsets are only meaningful for the document they were read from, so the
//! position crosses a re-render as a percentage of the content height.

/// Smallest content height used as a divisor.
const MIN_HEIGHT: f64 = 1.0;

/// Converts absolute scroll offsets to percentages and back.
///
/// [`capture`](Self::capture) must run while the previous document is still
/// displayed, [`restore`](Self::restore) once the new one has loaded.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PositionTracker {
    percentage: f64,
}

impl PositionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last captured position, always within `[0, 100]`.
    pub fn percentage(&self) -> f64 {
        self.percentage
    }

    /// Record `offset` as a percentage of `height` and return it.
    pub fn capture(&mut self, offset: f64, height: f64) -> f64 {
        self.percentage = percentage_of(offset, height);
        self.percentage
    }

    /// Offset in a document of `height` matching the captured percentage.
    pub fn restore(&self, height: f64) -> f64 {
        offset_at(self.percentage, height)
    }
}

/// `offset * 100 / max(1, height)`, clamped to `[0, 100]`.
pub fn percentage_of(offset: f64, height: f64) -> f64 {
    let offset = if offset.is_finite() { offset.max(0.0) } else { 0.0 };
    let height = clamp_height(height);
    (offset * 100.0 / height).clamp(0.0, 100.0)
}

/// `percentage * height / 100`.
pub fn offset_at(percentage: f64, height: f64) -> f64 {
    let height = if height.is_finite() { height.max(0.0) } else { 0.0 };
    percentage.clamp(0.0, 100.0) * height / 100.0
}

/// Clamp a reported content height so it is safe to divide by.
pub fn clamp_height(height: f64) -> f64 {
    if height.is_finite() {
        height.max(MIN_HEIGHT)
    } else {
        MIN_HEIGHT
    }
}
