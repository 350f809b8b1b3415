//! End-to-end tests for formulas: parsing, propagation and rendering.

use super::*;
use crate::measurement::{measurement, Measurement};
use crate::numeric::{Complex, Similar, Tolerance};
use crate::units::{Unit, UnitType};

fn bind(pairs: &[(&str, Measurement)]) -> Bindings<Measurement> {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}

fn value_of(input: &str) -> f64 {
    evaluate(input, &Bindings::new()).unwrap().value
}

#[test]
fn test_correlated_error_is_not_independent() {
    let x = measurement(3.0, 0.1);

    let squared = evaluate("x*x", &bind(&[("x", x.clone())])).unwrap();
    assert!((squared.value - 9.0).abs() < 1e-12);
    assert!((squared.uncertainty - 0.6).abs() < 1e-12);

    let product = evaluate("x1*x2", &bind(&[("x1", x.clone()), ("x2", x)])).unwrap();
    assert!((product.uncertainty - 0.3 * 2f64.sqrt()).abs() < 1e-12);
    assert!(!squared.similar(&product));
}

#[test]
fn test_repeated_literal_is_one_quantity() {
    let x = measurement(3.0, 0.1);
    let result = Formula::multiply(&x, &x).evaluate(&Bindings::new()).unwrap();
    assert!((result.uncertainty - 0.6).abs() < 1e-12);
}

#[test]
fn test_independent_errors_add_in_quadrature() {
    let bindings = bind(&[("m", measurement(5.0, 0.1)), ("n", measurement(4.0, 0.2))]);
    let sum = evaluate("m+n", &bindings).unwrap();
    assert!((sum.value - 9.0).abs() < 1e-12);
    assert!((sum.uncertainty - (0.1f64.powi(2) + 0.2f64.powi(2)).sqrt()).abs() < 1e-12);

    let difference = evaluate("m-n", &bindings).unwrap();
    assert!((difference.uncertainty - sum.uncertainty).abs() < 1e-12);
}

#[test]
fn test_division_relative_errors_in_quadrature() {
    let bindings = bind(&[("x", measurement(20.0, 0.1)), ("y", measurement(14.0, 0.2))]);
    let quotient = evaluate("x/y", &bindings).unwrap();
    let ratio = 20.0 / 14.0;
    let expected = ratio * ((0.1f64 / 20.0).powi(2) + (0.2f64 / 14.0).powi(2)).sqrt();
    assert!((quotient.value - ratio).abs() < 1e-12);
    assert!((quotient.uncertainty - expected).abs() < 1e-12);
}

#[test]
fn test_power_agrees_with_repeated_multiplication() {
    let r = Measurement::with_unit(2.0, 0.1, Unit::Meters);
    let bindings = bind(&[("r", r)]);

    let cubed = evaluate("r^3", &bindings).unwrap();
    let product = evaluate("r*r*r", &bindings).unwrap();

    assert!(cubed.similar(&product));
    assert!((cubed.uncertainty - 1.2).abs() < 1e-9);
    assert_eq!(cubed.dimension.exponent(&UnitType::Distance), 3);
}

#[test]
fn test_exact_inputs_give_exact_result() {
    let result = evaluate("sqrt(2)*exp(1)", &Bindings::new()).unwrap();
    assert_eq!(result.uncertainty, 0.0);
}

#[test]
fn test_unit_normalization() {
    let mph = Measurement::with_unit(50.0, 0.0, Unit::Miles).per_unit(Unit::Hours);
    let mps = Measurement::with_unit(22.352, 0.0, Unit::Meters).per_unit(Unit::Seconds);
    assert!(mph.similar(&mps));

    let bindings = bind(&[("a", mph), ("b", mps)]);
    let ratio = evaluate("a/b", &bindings).unwrap();
    assert!(ratio.is_dimensionless());
    assert!(ratio.value.similar(&1.0));
}

#[test]
fn test_parser_end_to_end() {
    assert!(value_of("3+5+2").similar(&10.0));
    assert!(value_of("(1/2)^((4+3)*4/3)").similar(&0.00155));
    assert!(value_of("7/-3").similar(&(-7.0 / 3.0)));
    assert!(value_of("5cos(3/2)").similar(&0.3537));
    assert!(value_of("exp(cos(4+(5/3))-2)").similar(&0.30602));
    assert!(value_of("-2^2").similar(&4.0));
    assert!(value_of("2^3^2").similar(&512.0));
}

#[test]
fn test_complex_end_to_end() {
    let bindings = Bindings::new();
    assert!(evaluate_complex("4i+3", &bindings).unwrap().similar(&Complex::new(3.0, 4.0)));

    let expected = 1.0 / std::f64::consts::PI.exp().sqrt();
    assert!(evaluate_complex("i^i", &bindings).unwrap().similar(&expected));

    assert!(evaluate_complex("i*i", &bindings).unwrap().similar(&Complex::real(-1.0)));
    assert!(evaluate_complex("0^i", &bindings).unwrap().is_zero());
}

#[test]
fn test_render_round_trip_is_fixpoint() {
    let bindings = bind(&[("x", measurement(2.0, 0.1)), ("y", measurement(3.0, 0.2))]);
    let inputs = [
        "3+5+2",
        "(1/2)^((4+3)*4/3)",
        "7/-3",
        "5cos(3/2)",
        "exp(cos(4+(5/3))-2)",
        "2xy - sqrt(x)/tan(y)",
        "-x^2",
        "ln(x)(y)",
        "1.5e-3",
    ];
    for input in inputs {
        let once = parse_formula(input, &bindings).unwrap().to_string();
        let twice = parse_formula(&once, &bindings).unwrap().to_string();
        assert_eq!(once, twice, "rendering of {} is not stable", input);
    }
}

fn without_parentheses(text: &str) -> String {
    text.chars().filter(|c| !matches!(c, '(' | ')')).collect()
}

#[test]
fn test_every_operation_renders_back_to_itself() {
    let bindings = bind(&[("x", measurement(2.0, 0.1)), ("y", measurement(3.0, 0.2))]);
    let x = Variable::new("x");
    let y = Variable::new("y");
    let trees = [
        (Operation::Identity, Formula::identity(&x)),
        (Operation::Add, Formula::add(&x, -2.0)),
        (Operation::Subtract, Formula::subtract(&x, &y)),
        (Operation::Multiply, Formula::multiply(&x, &y)),
        (Operation::Divide, Formula::divide(&x, &y)),
        (Operation::Power, Formula::power(&x, Formula::negate(&y))),
        (Operation::Negate, Formula::negate(&x)),
        (Operation::Reciprocal, Formula::reciprocal(&x)),
        (Operation::Ln, Formula::ln(&x)),
        (Operation::Exp, Formula::exp(&x)),
        (Operation::Sqrt, Formula::sqrt(&x)),
        (Operation::Sin, Formula::sin(&x)),
        (Operation::Cos, Formula::cos(&x)),
        (Operation::Tan, Formula::tan(&x)),
    ];

    for (op, tree) in trees {
        assert_eq!(tree.op(), op);
        let rendered = tree.to_string();
        let reparsed = parse_formula(&rendered, &bindings).unwrap();
        let rerendered = reparsed.to_string();

        assert_eq!(without_parentheses(&rerendered), without_parentheses(&rendered), "{}", op);
        assert_eq!(parse_formula(&rerendered, &bindings).unwrap().to_string(), rerendered);
        assert!(
            reparsed.evaluate(&bindings).unwrap().similar(&tree.evaluate(&bindings).unwrap()),
            "value of {} changed",
            rendered
        );
    }
}

#[test]
fn test_nested_tree_round_trip() {
    let bindings = bind(&[("x", measurement(2.0, 0.1)), ("y", measurement(3.0, 0.2))]);
    let tree = Formula::sin(Formula::divide(
        Formula::reciprocal(Variable::new("x")),
        Formula::add(Formula::power(Variable::new("y"), -0.5), -2.0),
    ));
    let rendered = tree.to_string();
    let reparsed = parse_formula(&rendered, &bindings).unwrap();
    assert_eq!(without_parentheses(&reparsed.to_string()), without_parentheses(&rendered));
    assert!(reparsed.evaluate(&bindings).unwrap().similar(&tree.evaluate(&bindings).unwrap()));
}

#[test]
fn test_uncertain_literals_do_not_reparse() {
    let bindings = bind(&[("x", measurement(2.0, 0.1))]);
    let tree = Formula::add(&Variable::new("x"), Measurement::with_unit(3.0, 0.1, Unit::Meters));
    let rendered = tree.to_string();
    assert!(rendered.contains('±'));

    let err = parse_formula(&rendered, &bindings).unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::UnexpectedCharacter);
}

#[test]
fn test_variable_and_equal_literal_are_independent() {
    let x = measurement(3.0, 0.1);
    let bindings = bind(&[("x", x.clone())]);

    let same = Formula::multiply(Variable::new("x"), Variable::new("x"))
        .evaluate(&bindings)
        .unwrap();
    assert!((same.uncertainty - 0.6).abs() < 1e-12);

    let mixed = Formula::multiply(Variable::new("x"), x).evaluate(&bindings).unwrap();
    assert!((mixed.value - 9.0).abs() < 1e-12);
    assert!((mixed.uncertainty - 0.3 * 2f64.sqrt()).abs() < 1e-12);
}

#[test]
fn test_round_trip_preserves_value() {
    let bindings = bind(&[("x", measurement(2.0, 0.1))]);
    let original = parse_formula("x^2 + 3x - 1/x", &bindings).unwrap();
    let reparsed = parse_formula(&original.to_string(), &bindings).unwrap();
    assert!(original
        .evaluate(&bindings)
        .unwrap()
        .similar(&reparsed.evaluate(&bindings).unwrap()));
}

#[test]
fn test_complex_round_trip_is_fixpoint() {
    let bindings: Bindings<Complex> = Bindings::new();
    let once = parse_complex_formula("4i+3", &bindings).unwrap().to_string();
    assert_eq!(once, "((4)*(i))+(3)");
    let twice = parse_complex_formula(&once, &bindings).unwrap().to_string();
    assert_eq!(once, twice);
}

#[test]
fn test_render_shapes() {
    let x = Variable::new("x");
    assert_eq!(Formula::add(&x, 1.0).to_string(), "(x)+(1)");
    assert_eq!(Formula::negate(&x).to_string(), "-(x)");
    assert_eq!(Formula::reciprocal(&x).to_string(), "1/(x)");
    assert_eq!(Formula::sqrt(&x).to_string(), "sqrt(x)");
    assert_eq!(Formula::identity(&x).to_string(), "x");
    assert_eq!(Formula::power(&x, 0.5).to_string(), "(x)^(0.5)");
}

#[test]
fn test_dimension_mismatch_from_string() {
    let bindings = bind(&[
        ("d", Measurement::with_unit(3.0, 0.1, Unit::Meters)),
        ("t", Measurement::with_unit(2.0, 0.1, Unit::Seconds)),
    ]);
    let err = evaluate("d + t", &bindings).unwrap_err();
    assert!(matches!(err, EvalError::DimensionMismatch { operation: Operation::Add, .. }));

    let err = evaluate("sin(d)", &bindings).unwrap_err();
    assert!(err.to_string().contains("sin(d)"));

    assert!(evaluate("sqrt(d)", &bindings).is_err());
    assert!(evaluate("d^t", &bindings).is_err());
}

#[test]
fn test_angles_are_dimensionless() {
    let bindings = bind(&[("a", Measurement::with_unit(30.0, 0.0, Unit::Degrees))]);
    assert!(evaluate("sin(a)", &bindings).unwrap().value.similar(&0.5));
}

#[test]
fn test_parse_errors_surface_through_evaluate() {
    let err = evaluate("(1+2", &Bindings::new()).unwrap_err();
    assert!(matches!(
        err,
        EvalError::Parse(ParseError { kind: ParseErrorKind::UnmatchedParenthesis, .. })
    ));

    let err = evaluate("1..2", &Bindings::new()).unwrap_err();
    assert!(matches!(
        err,
        EvalError::Parse(ParseError { kind: ParseErrorKind::InvalidNumber, .. })
    ));
}

#[test]
fn test_formula_serde_round_trip() {
    let bindings = bind(&[("x", Measurement::with_unit(2.0, 0.5, Unit::Meters))]);
    let formula = parse_formula("5cos(x/x) * x", &bindings).unwrap();

    let json = serde_json::to_string(&formula).unwrap();
    let restored: Formula = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, formula);
    assert_eq!(restored.evaluate(&bindings).unwrap(), formula.evaluate(&bindings).unwrap());
}

#[test]
fn test_custom_tolerance() {
    let strict = Tolerance::default().with_relative(1e-9);
    let a = evaluate("1/3", &Bindings::new()).unwrap();
    assert!(a.similar_within(&Measurement::exact(0.3333), &Tolerance::default()));
    assert!(!a.similar_within(&Measurement::exact(0.3333), &strict));
}
