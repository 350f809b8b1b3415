//! Measurement arithmetic without uncertainty propagation.
//!
//! These are the cheap paths the symbolic engine builds on: the value rule
//! comes from [`Operation::apply_real`] and the dimension is computed (and
//! checked) here. The uncertainty of the result is meaningless and left 0.

use super::types::Measurement;
use crate::formula::Operation;
use crate::units::Dimension;
use thiserror::Error;

/// An operation was applied to operands with unusable dimensions
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{operation}: {detail}")]
pub struct DimensionError {
    pub operation: Operation,
    pub detail: String,
}

impl DimensionError {
    fn new(operation: Operation, detail: String) -> Self {
        Self { operation, detail }
    }
}

/// Dimension of `op(m, n)`, or why the operands are incompatible
pub fn result_dimension(
    op: Operation,
    m: &Measurement,
    n: &Measurement,
) -> Result<Dimension, DimensionError> {
    match op {
        Operation::Identity | Operation::Negate => Ok(m.dimension.clone()),
        Operation::Add | Operation::Subtract => {
            if m.dimension == n.dimension {
                Ok(m.dimension.clone())
            } else {
                Err(DimensionError::new(
                    op,
                    format!("cannot combine {} with {}", m.dimension, n.dimension),
                ))
            }
        }
        Operation::Multiply => Ok(m.dimension.multiply(&n.dimension)),
        Operation::Divide => Ok(m.dimension.divide(&n.dimension)),
        Operation::Reciprocal => Ok(m.dimension.inverse()),
        Operation::Power => {
            if !n.is_dimensionless() {
                return Err(DimensionError::new(
                    op,
                    format!("exponent must be dimensionless, got {}", n.dimension),
                ));
            }
            raise(op, m, n.value)
        }
        Operation::Sqrt => raise(op, m, 0.5),
        Operation::Ln | Operation::Exp | Operation::Sin | Operation::Cos | Operation::Tan => {
            if m.is_dimensionless() {
                Ok(Dimension::new())
            } else {
                Err(DimensionError::new(
                    op,
                    format!("argument must be dimensionless, got {}", m.dimension),
                ))
            }
        }
    }
}

fn raise(op: Operation, m: &Measurement, power: f64) -> Result<Dimension, DimensionError> {
    m.dimension.powf(power).ok_or_else(|| {
        DimensionError::new(
            op,
            format!("{} raised to {} has a fractional dimension", m.dimension, power),
        )
    })
}

impl Measurement {
    /// Apply `op` ignoring error: value and dimension only.
    ///
    /// `rhs` is the second operand of binary operations and ignored by
    /// unary ones.
    pub fn apply(&self, op: Operation, rhs: Option<&Measurement>) -> Result<Measurement, DimensionError> {
        let placeholder = Measurement::default();
        let n = rhs.unwrap_or(&placeholder);
        let dimension = result_dimension(op, self, n)?;
        Ok(Measurement::new(op.apply_real(self.value, n.value), 0.0, dimension))
    }

    /// Apply `op` ignoring both error and units
    pub fn apply_ignoring_units(&self, op: Operation, rhs: Option<&Measurement>) -> Measurement {
        let n = rhs.map_or(0.0, |n| n.value);
        Measurement::exact(op.apply_real(self.value, n))
    }
}
