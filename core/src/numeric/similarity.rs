//! Approximate equality with a near-zero cutoff.

use serde::{Deserialize, Serialize};

/// Tolerance policy for approximate comparisons.
///
/// Magnitudes below `absolute` are treated as zero: if either side is below
/// it, the other must be too. Otherwise the relative difference (against the
/// left-hand side) must be below `relative`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerance {
    pub absolute: f64,
    pub relative: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            absolute: 1e-5,
            relative: 0.01,
        }
    }
}

impl Tolerance {
    pub fn new(absolute: f64, relative: f64) -> Self {
        Self { absolute, relative }
    }

    pub fn with_absolute(self, absolute: f64) -> Self {
        Self { absolute, ..self }
    }

    pub fn with_relative(self, relative: f64) -> Self {
        Self { relative, ..self }
    }

    /// Compare two scalars under this policy
    pub fn scalars_similar(&self, a: f64, b: f64) -> bool {
        if a.abs() < self.absolute || b.abs() < self.absolute {
            return a.abs() < self.absolute && b.abs() < self.absolute;
        }
        (b - a).abs() / a.abs() < self.relative
    }
}

/// Values that can be compared approximately.
pub trait Similar<Rhs: ?Sized = Self> {
    fn similar_within(&self, other: &Rhs, tolerance: &Tolerance) -> bool;

    /// Compare with the default [`Tolerance`]
    fn similar(&self, other: &Rhs) -> bool {
        self.similar_within(other, &Tolerance::default())
    }
}

impl Similar for f64 {
    fn similar_within(&self, other: &f64, tolerance: &Tolerance) -> bool {
        tolerance.scalars_similar(*self, *other)
    }
}
