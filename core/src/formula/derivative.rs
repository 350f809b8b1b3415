//! Symbolic partial derivatives.
//!
//! Differentiation is purely structural: it builds a new tree and never
//! evaluates anything, so it works for both formula variants.

use super::evaluator::EvalError;
use super::types::{Expr, Leaf, Operand, Operation, Scalar};

impl<V: Scalar> Expr<V> {
    /// Tree for ∂self/∂wrt.
    ///
    /// A leaf differentiates to 1 when it is the same quantity as `wrt` and
    /// to the zero leaf otherwise.
    pub fn partial(&self, wrt: &Leaf<V>) -> Result<Expr<V>, EvalError> {
        let (m, n) = self.operands()?;
        let dm = m.partial(wrt)?;

        let Some(n) = n else {
            return Ok(match self.op() {
                Operation::Identity => dm,
                Operation::Negate => Expr::negate(dm),
                // -∂m / m²
                Operation::Reciprocal => {
                    Expr::divide(Expr::negate(dm), Expr::multiply(m.clone(), m.clone()))
                }
                Operation::Ln => Expr::divide(dm, m.clone()),
                Operation::Exp => Expr::multiply(dm, Expr::exp(m.clone())),
                // ∂m / (2·sqrt(m))
                Operation::Sqrt => Expr::divide(
                    dm,
                    Expr::multiply(Operand::constant(2.0), Expr::sqrt(m.clone())),
                ),
                Operation::Sin => Expr::multiply(dm, Expr::cos(m.clone())),
                Operation::Cos => Expr::multiply(dm, Expr::negate(Expr::sin(m.clone()))),
                // ∂m / cos(m) / cos(m)
                Operation::Tan => Expr::divide(
                    Expr::divide(dm, Expr::cos(m.clone())),
                    Expr::cos(m.clone()),
                ),
                op => return Err(EvalError::MissingOperand { operation: op }),
            });
        };

        let dn = n.partial(wrt)?;
        Ok(match self.op() {
            Operation::Add => Expr::add(dm, dn),
            Operation::Subtract => Expr::subtract(dm, dn),
            // n·∂m + m·∂n
            Operation::Multiply => Expr::add(
                Expr::multiply(dm, n.clone()),
                Expr::multiply(dn, m.clone()),
            ),
            // (n·∂m − m·∂n) / n²
            Operation::Divide => Expr::divide(
                Expr::subtract(
                    Expr::multiply(n.clone(), dm),
                    Expr::multiply(m.clone(), dn),
                ),
                Expr::multiply(n.clone(), n.clone()),
            ),
            // m^n·∂n·ln(m) + m^(n−1)·n·∂m, without the term that cannot
            // depend on `wrt` so a negative base never reaches ln
            Operation::Power => {
                let through_exponent = Expr::multiply(
                    Expr::multiply(Expr::power(m.clone(), n.clone()), dn),
                    Expr::ln(m.clone()),
                );
                let through_base = Expr::multiply(
                    Expr::multiply(
                        Expr::power(m.clone(), Expr::subtract(n.clone(), Operand::constant(1.0))),
                        n.clone(),
                    ),
                    dm,
                );
                match (m.contains(wrt), n.contains(wrt)) {
                    (_, false) => through_base,
                    (false, true) => through_exponent,
                    (true, true) => Expr::add(through_exponent, through_base),
                }
            }
            op => return Err(EvalError::UnexpectedOperand { operation: op }),
        })
    }

    /// Both operands, checking the node's arity
    pub(crate) fn operands(&self) -> Result<(&Operand<V>, Option<&Operand<V>>), EvalError> {
        match (self.op().is_binary(), self.rhs()) {
            (true, None) => Err(EvalError::MissingOperand { operation: self.op() }),
            (false, Some(_)) => Err(EvalError::UnexpectedOperand { operation: self.op() }),
            (_, rhs) => Ok((self.lhs(), rhs)),
        }
    }
}

impl<V: Scalar> Operand<V> {
    pub fn partial(&self, wrt: &Leaf<V>) -> Result<Expr<V>, EvalError> {
        match self {
            Operand::Leaf(leaf) if leaf == wrt => Ok(Expr::identity(Operand::constant(1.0))),
            Operand::Leaf(_) => Ok(Expr::identity(Operand::constant(0.0))),
            Operand::Node(expr) => expr.partial(wrt),
        }
    }
}

#[cfg(test)]
mod derivative_tests {
    use crate::formula::{Bindings, Formula, Leaf, Variable};
    use crate::measurement::Measurement;

    fn x() -> Leaf<Measurement> {
        Leaf::Variable(Variable::new("x"))
    }

    fn slope_at(formula: &Formula, x_value: f64) -> f64 {
        let mut bindings = Bindings::new();
        bindings.insert("x".to_string(), Measurement::exact(x_value));
        formula
            .partial(&x())
            .unwrap()
            .evaluate_ignoring_error_and_units(&bindings)
            .unwrap()
            .value
    }

    #[test]
    fn test_unrelated_leaf_is_zero() {
        let f = Formula::multiply(Variable::new("y"), 3.0);
        assert_eq!(slope_at(&f, 2.0), 0.0);
    }

    #[test]
    fn test_product_rule() {
        // d/dx (x * x) = 2x
        let f = Formula::multiply(Variable::new("x"), Variable::new("x"));
        assert!((slope_at(&f, 3.0) - 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_quotient_rule() {
        // d/dx (1 / x) = -1/x²
        let f = Formula::divide(1.0, Variable::new("x"));
        assert!((slope_at(&f, 2.0) + 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_power_rule_both_sides() {
        // d/dx x^x = x^x (ln x + 1)
        let f = Formula::power(Variable::new("x"), Variable::new("x"));
        let expected = 2f64.powf(2.0) * (2f64.ln() + 1.0);
        assert!((slope_at(&f, 2.0) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_power_of_negative_base() {
        // d/dx (x - 5)^2 = 2(x - 5)
        let f = Formula::power(Formula::subtract(Variable::new("x"), 5.0), 2.0);
        assert!((slope_at(&f, 2.0) + 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_power_with_constant_base() {
        // d/dx 2^x = 2^x ln 2
        let f = Formula::power(2.0, Variable::new("x"));
        assert!((slope_at(&f, 3.0) - 8.0 * 2f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_chain_through_functions() {
        let at = 0.4f64;
        let cases = [
            (Formula::sin(Variable::new("x")), at.cos()),
            (Formula::cos(Variable::new("x")), -at.sin()),
            (Formula::tan(Variable::new("x")), 1.0 / (at.cos() * at.cos())),
            (Formula::exp(Variable::new("x")), at.exp()),
            (Formula::ln(Variable::new("x")), 1.0 / at),
            (Formula::sqrt(Variable::new("x")), 0.5 / at.sqrt()),
            (Formula::reciprocal(Variable::new("x")), -1.0 / (at * at)),
            (Formula::negate(Variable::new("x")), -1.0),
        ];
        for (formula, expected) in cases {
            let slope = slope_at(&formula, at);
            assert!((slope - expected).abs() < 1e-9, "{} gave {}", formula, slope);
        }
    }
}
