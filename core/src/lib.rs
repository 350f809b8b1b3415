//! Uncertainty- and unit-propagating expression engine.
//!
//! Measurements carry a value, an absolute uncertainty and a physical
//! dimension. Formulas over them are immutable trees that can be evaluated
//! against many variable bindings, differentiated symbolically, rendered
//! and parsed back. A complex-number variant shares the tree and parser.

pub mod units;
pub mod numeric;
pub mod measurement;
pub mod formula;
pub mod matrix;

pub use formula::{evaluate, parse_formula, Bindings, ComplexFormula, EvalError, Formula, ParseError};
pub use measurement::{measurement, with_unit, DisplayMeasurement, Measurement};
pub use numeric::{Complex, Similar, Tolerance};
pub use units::{Dimension, DisplayUnits, SpecificUnits, Unit, UnitType};

pub fn version() -> &'static str {
    "0.1.0"
}
