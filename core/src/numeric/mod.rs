//! Numeric primitives shared by both formula variants.

pub mod complex;
pub mod similarity;

pub use complex::Complex;
pub use similarity::{Similar, Tolerance};
