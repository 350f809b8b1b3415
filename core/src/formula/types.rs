//! Expression tree types shared by the measurement and complex variants.

use crate::measurement::Measurement;
use crate::numeric::Complex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// The closed set of tree operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    Identity,
    Add,
    Subtract,
    Multiply,
    Divide,
    Negate,
    Power,
    Reciprocal,
    Ln,
    Exp,
    Sqrt,
    Sin,
    Cos,
    Tan,
}

/// Function names the parser recognises before a parenthesis
pub const UNARY_FUNCTIONS: [(&str, Operation); 6] = [
    ("sqrt", Operation::Sqrt),
    ("exp", Operation::Exp),
    ("ln", Operation::Ln),
    ("sin", Operation::Sin),
    ("cos", Operation::Cos),
    ("tan", Operation::Tan),
];

impl Operation {
    /// Binary operations require a second operand; all others forbid it
    pub fn is_binary(&self) -> bool {
        matches!(
            self,
            Self::Add | Self::Subtract | Self::Multiply | Self::Divide | Self::Power
        )
    }

    pub fn function_name(&self) -> Option<&'static str> {
        UNARY_FUNCTIONS
            .iter()
            .find(|(_, op)| op == self)
            .map(|(name, _)| *name)
    }

    pub fn from_function_name(name: &str) -> Option<Operation> {
        UNARY_FUNCTIONS
            .iter()
            .find(|(candidate, _)| *candidate == name)
            .map(|(_, op)| *op)
    }

    /// Numeric rule over reals. `n` is ignored by unary operations.
    pub fn apply_real(&self, m: f64, n: f64) -> f64 {
        match self {
            Self::Identity => m,
            Self::Add => m + n,
            Self::Subtract => m - n,
            Self::Multiply => m * n,
            Self::Divide => m / n,
            Self::Negate => -m,
            Self::Power => m.powf(n),
            Self::Reciprocal => 1.0 / m,
            Self::Ln => m.ln(),
            Self::Exp => m.exp(),
            Self::Sqrt => m.sqrt(),
            Self::Sin => m.sin(),
            Self::Cos => m.cos(),
            Self::Tan => m.tan(),
        }
    }

    /// Numeric rule over complex numbers. `n` is ignored by unary operations.
    pub fn apply_complex(&self, m: Complex, n: Complex) -> Complex {
        match self {
            Self::Identity => m,
            Self::Add => m + n,
            Self::Subtract => m - n,
            Self::Multiply => m * n,
            Self::Divide => m / n,
            Self::Negate => -m,
            Self::Power => m.powc(n),
            Self::Reciprocal => m.recip(),
            Self::Ln => m.ln(),
            Self::Exp => m.exp(),
            Self::Sqrt => m.sqrt(),
            Self::Sin => m.sin(),
            Self::Cos => m.cos(),
            Self::Tan => m.tan(),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Identity => "identity",
            Self::Add => "addition",
            Self::Subtract => "subtraction",
            Self::Multiply => "multiplication",
            Self::Divide => "division",
            Self::Negate => "negation",
            Self::Power => "power",
            Self::Reciprocal => "reciprocal",
            Self::Ln => "ln",
            Self::Exp => "exp",
            Self::Sqrt => "sqrt",
            Self::Sin => "sin",
            Self::Cos => "cos",
            Self::Tan => "tan",
        };
        f.write_str(name)
    }
}

/// Named placeholder resolved against [`Bindings`] at evaluation time
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Variable {
    name: String,
}

impl Variable {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Variable name → value
pub type Bindings<V> = HashMap<String, V>;

/// Values that can sit at the leaves of an expression tree
pub trait Scalar: Clone + PartialEq + fmt::Debug {
    /// Value of an unbound variable
    fn zero() -> Self;

    /// Value of a numeric literal
    fn from_real(value: f64) -> Self;

    /// Value of the literal `i`, if this variant has one
    fn imaginary_unit() -> Option<Self> {
        None
    }

    /// Canonical text of a literal leaf
    fn render(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result;
}

impl Scalar for Measurement {
    fn zero() -> Self {
        Measurement::exact(0.0)
    }

    fn from_real(value: f64) -> Self {
        Measurement::exact(value)
    }

    /// Exact dimensionless literals render as plain numbers. Anything else
    /// renders in display form (`3.0±0.1 m`), which the parser does not
    /// accept, so trees holding such literals do not round-trip through
    /// text; bind them to a variable instead.
    fn render(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_exact() && self.is_dimensionless() {
            write!(f, "{}", self.value)
        } else {
            write!(f, "{}", self)
        }
    }
}

impl Scalar for Complex {
    fn zero() -> Self {
        Complex::ZERO
    }

    fn from_real(value: f64) -> Self {
        Complex::real(value)
    }

    fn imaginary_unit() -> Option<Self> {
        Some(Complex::I)
    }

    fn render(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

/// A literal value or a variable.
///
/// Leaves are also the identity of measured quantities: two equal leaves
/// are one correlated quantity. Identity is by leaf, not by resolved value,
/// so `Variable("x")` and a literal holding the measurement bound to `x` are
/// two independent quantities. Refer to a bound quantity through the same
/// variable everywhere it occurs for its error to be correlated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Leaf<V> {
    Value(V),
    Variable(Variable),
}

impl<V: Scalar> Leaf<V> {
    /// Value of this leaf, unbound variables defaulting to zero
    pub fn resolve(&self, bindings: &Bindings<V>) -> V {
        match self {
            Self::Value(value) => value.clone(),
            Self::Variable(variable) => bindings
                .get(variable.name())
                .cloned()
                .unwrap_or_else(V::zero),
        }
    }
}

/// Operand of a tree node: a leaf or a nested expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operand<V> {
    Leaf(Leaf<V>),
    Node(Box<Expr<V>>),
}

impl<V: Scalar> Operand<V> {
    /// Literal leaf holding `V::from_real(value)`
    pub fn constant(value: f64) -> Self {
        Self::Leaf(Leaf::Value(V::from_real(value)))
    }

    pub fn variable(name: &str) -> Self {
        Self::Leaf(Leaf::Variable(Variable::new(name)))
    }

    /// Tree rooted at this operand; a bare leaf is wrapped in Identity
    pub fn into_expr(self) -> Expr<V> {
        match self {
            Self::Node(expr) => *expr,
            leaf => Expr::new(Operation::Identity, leaf, None),
        }
    }

    /// Whether `leaf` occurs anywhere in this operand
    pub fn contains(&self, leaf: &Leaf<V>) -> bool {
        match self {
            Self::Leaf(own) => own == leaf,
            Self::Node(expr) => {
                expr.lhs.contains(leaf) || expr.rhs.as_ref().is_some_and(|rhs| rhs.contains(leaf))
            }
        }
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a Leaf<V>>) {
        match self {
            Self::Leaf(leaf) => {
                if !out.contains(&leaf) {
                    out.push(leaf);
                }
            }
            Self::Node(expr) => expr.collect_leaves(out),
        }
    }
}

impl<V> From<Leaf<V>> for Operand<V> {
    fn from(leaf: Leaf<V>) -> Self {
        Self::Leaf(leaf)
    }
}

impl<V> From<Variable> for Operand<V> {
    fn from(variable: Variable) -> Self {
        Self::Leaf(Leaf::Variable(variable))
    }
}

impl<V> From<&Variable> for Operand<V> {
    fn from(variable: &Variable) -> Self {
        Self::Leaf(Leaf::Variable(variable.clone()))
    }
}

impl<V> From<Expr<V>> for Operand<V> {
    fn from(expr: Expr<V>) -> Self {
        Self::Node(Box::new(expr))
    }
}

impl<V: Clone> From<&Expr<V>> for Operand<V> {
    fn from(expr: &Expr<V>) -> Self {
        Self::Node(Box::new(expr.clone()))
    }
}

impl From<Measurement> for Operand<Measurement> {
    fn from(value: Measurement) -> Self {
        Self::Leaf(Leaf::Value(value))
    }
}

impl From<&Measurement> for Operand<Measurement> {
    fn from(value: &Measurement) -> Self {
        Self::Leaf(Leaf::Value(value.clone()))
    }
}

impl From<f64> for Operand<Measurement> {
    fn from(value: f64) -> Self {
        Self::Leaf(Leaf::Value(Measurement::exact(value)))
    }
}

impl From<Complex> for Operand<Complex> {
    fn from(value: Complex) -> Self {
        Self::Leaf(Leaf::Value(value))
    }
}

impl From<f64> for Operand<Complex> {
    fn from(value: f64) -> Self {
        Self::Leaf(Leaf::Value(Complex::real(value)))
    }
}

/// A tree node: an operation over one or two operands.
///
/// Trees are immutable and own their subtrees. They carry no evaluation
/// state, so one tree can be evaluated against many bindings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr<V> {
    op: Operation,
    lhs: Operand<V>,
    rhs: Option<Operand<V>>,
}

/// Expression over measurements
pub type Formula = Expr<Measurement>;

/// Expression over complex numbers
pub type ComplexFormula = Expr<Complex>;

impl<V: Scalar> Expr<V> {
    /// Build a node. Arity is checked when the tree is evaluated.
    pub fn new(op: Operation, lhs: Operand<V>, rhs: Option<Operand<V>>) -> Self {
        Self { op, lhs, rhs }
    }

    pub fn op(&self) -> Operation {
        self.op
    }

    pub fn lhs(&self) -> &Operand<V> {
        &self.lhs
    }

    pub fn rhs(&self) -> Option<&Operand<V>> {
        self.rhs.as_ref()
    }

    fn unary(op: Operation, operand: impl Into<Operand<V>>) -> Self {
        Self::new(op, operand.into(), None)
    }

    fn binary(op: Operation, lhs: impl Into<Operand<V>>, rhs: impl Into<Operand<V>>) -> Self {
        Self::new(op, lhs.into(), Some(rhs.into()))
    }

    pub fn identity(operand: impl Into<Operand<V>>) -> Self {
        Self::unary(Operation::Identity, operand)
    }

    pub fn add(lhs: impl Into<Operand<V>>, rhs: impl Into<Operand<V>>) -> Self {
        Self::binary(Operation::Add, lhs, rhs)
    }

    pub fn subtract(lhs: impl Into<Operand<V>>, rhs: impl Into<Operand<V>>) -> Self {
        Self::binary(Operation::Subtract, lhs, rhs)
    }

    pub fn multiply(lhs: impl Into<Operand<V>>, rhs: impl Into<Operand<V>>) -> Self {
        Self::binary(Operation::Multiply, lhs, rhs)
    }

    pub fn divide(lhs: impl Into<Operand<V>>, rhs: impl Into<Operand<V>>) -> Self {
        Self::binary(Operation::Divide, lhs, rhs)
    }

    pub fn power(base: impl Into<Operand<V>>, exponent: impl Into<Operand<V>>) -> Self {
        Self::binary(Operation::Power, base, exponent)
    }

    pub fn negate(operand: impl Into<Operand<V>>) -> Self {
        Self::unary(Operation::Negate, operand)
    }

    pub fn reciprocal(operand: impl Into<Operand<V>>) -> Self {
        Self::unary(Operation::Reciprocal, operand)
    }

    pub fn ln(operand: impl Into<Operand<V>>) -> Self {
        Self::unary(Operation::Ln, operand)
    }

    pub fn exp(operand: impl Into<Operand<V>>) -> Self {
        Self::unary(Operation::Exp, operand)
    }

    pub fn sqrt(operand: impl Into<Operand<V>>) -> Self {
        Self::unary(Operation::Sqrt, operand)
    }

    pub fn sin(operand: impl Into<Operand<V>>) -> Self {
        Self::unary(Operation::Sin, operand)
    }

    pub fn cos(operand: impl Into<Operand<V>>) -> Self {
        Self::unary(Operation::Cos, operand)
    }

    pub fn tan(operand: impl Into<Operand<V>>) -> Self {
        Self::unary(Operation::Tan, operand)
    }

    /// Distinct leaves in first-occurrence order
    pub fn leaves(&self) -> Vec<&Leaf<V>> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a Leaf<V>>) {
        self.lhs.collect_leaves(out);
        if let Some(rhs) = &self.rhs {
            rhs.collect_leaves(out);
        }
    }
}

impl<V: Scalar> fmt::Display for Leaf<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => value.render(f),
            Self::Variable(variable) => write!(f, "{}", variable),
        }
    }
}

impl<V: Scalar> fmt::Display for Operand<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Leaf(leaf) => write!(f, "{}", leaf),
            Self::Node(expr) => write!(f, "{}", expr),
        }
    }
}

/// Fully parenthesized infix rendering
impl<V: Scalar> fmt::Display for Expr<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = &self.lhs;
        let Some(n) = &self.rhs else {
            return match self.op {
                Operation::Identity => write!(f, "{}", m),
                Operation::Negate => write!(f, "-({})", m),
                Operation::Reciprocal => write!(f, "1/({})", m),
                op => match op.function_name() {
                    Some(name) => write!(f, "{}({})", name, m),
                    None => write!(f, "{}({})", op, m),
                },
            };
        };
        match self.op {
            Operation::Add => write!(f, "({})+({})", m, n),
            Operation::Subtract => write!(f, "({})-({})", m, n),
            Operation::Multiply => write!(f, "({})*({})", m, n),
            Operation::Divide => write!(f, "({})/({})", m, n),
            Operation::Power => write!(f, "({})^({})", m, n),
            op => write!(f, "{}({}, {})", op, m, n),
        }
    }
}
