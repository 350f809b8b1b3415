//! Measurements: values with an uncertainty and a physical dimension.

pub mod types;
pub mod arithmetic;
pub mod list;
pub mod constants;


pub use types::{measurement, with_unit, DisplayMeasurement, Measurement};
pub use arithmetic::{result_dimension, DimensionError};
pub use list::{apply_unit, apply_units, list_compute, mean};
pub use constants::{lorentz_factor, planck_constant, speed_of_light};
