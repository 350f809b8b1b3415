//! Evaluation of formulas, with uncertainty propagation for measurements.

use super::parser::{parse_complex_formula, parse_formula, ParseError};
use super::types::{Bindings, ComplexFormula, Formula, Operand, Operation};
use crate::measurement::Measurement;
use crate::numeric::Complex;
use thiserror::Error;

/// Evaluation error
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// Operands with incompatible dimensions
    #[error("Dimension mismatch in {operation} of `{expression}`: {detail}")]
    DimensionMismatch {
        operation: Operation,
        expression: String,
        detail: String,
    },
    /// Binary operation built without its second operand
    #[error("Missing second operand for {operation}")]
    MissingOperand { operation: Operation },
    /// Unary operation built with a second operand
    #[error("Unexpected second operand for {operation}")]
    UnexpectedOperand { operation: Operation },
    /// Parse error while evaluating an expression string
    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl Formula {
    /// Value, dimension and propagated uncertainty.
    ///
    /// The uncertainty is first-order: the root-sum-square over every
    /// distinct quantity in the tree of (∂formula/∂quantity · its
    /// uncertainty). Repeated occurrences of one quantity are correlated
    /// and differentiated together.
    pub fn evaluate(&self, bindings: &Bindings<Measurement>) -> Result<Measurement, EvalError> {
        let result = self.evaluate_ignoring_error(bindings)?;

        let quantities = self.leaves();
        let mut sum_squares = 0.0;
        for quantity in &quantities {
            let measured = quantity.resolve(bindings);
            if measured.is_exact() {
                continue;
            }
            let slope = self
                .partial(quantity)?
                .evaluate_ignoring_error_and_units(bindings)?
                .value;
            tracing::trace!(quantity = %quantity, slope, "partial derivative");
            sum_squares += slope * slope * measured.uncertainty * measured.uncertainty;
        }

        let uncertainty = sum_squares.sqrt();
        tracing::debug!(
            formula = %self,
            value = result.value,
            uncertainty,
            quantities = quantities.len(),
            "propagated uncertainty"
        );
        Ok(Measurement::new(result.value, uncertainty, result.dimension))
    }

    /// Value and dimension; the uncertainty of the result is not computed.
    pub fn evaluate_ignoring_error(&self, bindings: &Bindings<Measurement>) -> Result<Measurement, EvalError> {
        let (m, n) = self.operands()?;
        let m = operand_ignoring_error(m, bindings)?;
        if self.op() == Operation::Identity {
            return Ok(m);
        }
        let n = n.map(|n| operand_ignoring_error(n, bindings)).transpose()?;
        m.apply(self.op(), n.as_ref())
            .map_err(|e| EvalError::DimensionMismatch {
                operation: e.operation,
                expression: self.to_string(),
                detail: e.detail,
            })
    }

    /// Dimensionless value only; used to evaluate derivative trees.
    pub fn evaluate_ignoring_error_and_units(
        &self,
        bindings: &Bindings<Measurement>,
    ) -> Result<Measurement, EvalError> {
        let (m, n) = self.operands()?;
        let m = operand_ignoring_error_and_units(m, bindings)?;
        let n = n
            .map(|n| operand_ignoring_error_and_units(n, bindings))
            .transpose()?;
        Ok(m.apply_ignoring_units(self.op(), n.as_ref()))
    }
}

fn operand_ignoring_error(
    operand: &Operand<Measurement>,
    bindings: &Bindings<Measurement>,
) -> Result<Measurement, EvalError> {
    match operand {
        Operand::Leaf(leaf) => Ok(leaf.resolve(bindings)),
        Operand::Node(expr) => expr.evaluate_ignoring_error(bindings),
    }
}

fn operand_ignoring_error_and_units(
    operand: &Operand<Measurement>,
    bindings: &Bindings<Measurement>,
) -> Result<Measurement, EvalError> {
    match operand {
        Operand::Leaf(leaf) => Ok(Measurement::exact(leaf.resolve(bindings).value)),
        Operand::Node(expr) => expr.evaluate_ignoring_error_and_units(bindings),
    }
}

impl ComplexFormula {
    pub fn evaluate(&self, bindings: &Bindings<Complex>) -> Result<Complex, EvalError> {
        let (m, n) = self.operands()?;
        let m = complex_operand(m, bindings)?;
        let n = match n {
            Some(n) => complex_operand(n, bindings)?,
            None => Complex::ZERO,
        };
        Ok(self.op().apply_complex(m, n))
    }
}

fn complex_operand(operand: &Operand<Complex>, bindings: &Bindings<Complex>) -> Result<Complex, EvalError> {
    match operand {
        Operand::Leaf(leaf) => Ok(leaf.resolve(bindings)),
        Operand::Node(expr) => expr.evaluate(bindings),
    }
}

/// Parse and evaluate a measurement expression string
pub fn evaluate(expression: &str, bindings: &Bindings<Measurement>) -> Result<Measurement, EvalError> {
    let formula = parse_formula(expression, bindings)?;
    formula.evaluate(bindings)
}

/// Parse and evaluate a complex expression string
pub fn evaluate_complex(expression: &str, bindings: &Bindings<Complex>) -> Result<Complex, EvalError> {
    let formula = parse_complex_formula(expression, bindings)?;
    formula.evaluate(bindings)
}
