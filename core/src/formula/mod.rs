//! Expression trees over measurements and complex numbers.
//!
//! Provides:
//! - Immutable trees built from combinators or parsed from strings
//! - Evaluation with first-order uncertainty propagation (measurements)
//! - Symbolic partial derivatives
//! - Canonical fully parenthesized rendering

pub mod types;
pub mod parser;
pub mod evaluator;
mod derivative;

#[cfg(test)]
mod tests;

pub use types::{
    Bindings, ComplexFormula, Expr, Formula, Leaf, Operand, Operation, Scalar, Variable,
    UNARY_FUNCTIONS,
};
pub use parser::{parse_complex_formula, parse_expression, parse_formula, ParseError, ParseErrorKind};
pub use evaluator::{evaluate, evaluate_complex, EvalError};
