//! Expression parser producing formula trees.
//!
//! Supports:
//! - Decimal literals, with optional exponent (`1.5e-3`)
//! - Arithmetic operators (+, -, *, /, ^) and parentheses
//! - Unary functions (sqrt, exp, ln, sin, cos, tan)
//! - Unary minus at the start or after an operator (`7/-3`)
//! - Implicit multiplication before a name, function or parenthesis
//!   (`5cos(3/2)`, `2xy`, `(1+2)(3)`)
//! - Identifiers resolved against the bound variable names; any other
//!   identifier text is an error
//! - The imaginary unit `i` (complex formulas only)

use super::types::{Bindings, ComplexFormula, Expr, Formula, Leaf, Operand, Operation, Scalar};
use crate::measurement::Measurement;
use crate::numeric::Complex;
use std::collections::VecDeque;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    Empty,
    UnexpectedCharacter,
    InvalidNumber,
    UnmatchedParenthesis,
    UnexpectedToken,
    /// Identifier text that is not a bound name, a function or `i`
    UnknownIdentifier,
}

/// Parse error with location info
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Parse error at position {position}: {message}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub message: String,
    /// Character offset into the input
    pub position: usize,
}

impl ParseError {
    fn new(kind: ParseErrorKind, message: impl Into<String>, position: usize) -> Self {
        Self {
            kind,
            message: message.into(),
            position,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Name(String),
    Imaginary,
    Function(Operation),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
    Eof,
}

impl Token {
    /// Tokens that multiply the preceding factor when no operator is written
    fn starts_implicit_factor(&self) -> bool {
        matches!(
            self,
            Token::Name(_) | Token::Imaginary | Token::Function(_) | Token::LParen
        )
    }
}

/// Tokenizer
struct Lexer<'a> {
    chars: Vec<char>,
    position: usize,
    names: Vec<&'a str>,
    imaginary: bool,
    /// Tokens split out of one identifier run
    pending: VecDeque<(Token, usize)>,
}

impl<'a> Lexer<'a> {
    fn new(input: &str, names: Vec<&'a str>, imaginary: bool) -> Self {
        Self {
            chars: input.chars().collect(),
            position: 0,
            names,
            imaginary,
            pending: VecDeque::new(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.position).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.position + offset).copied()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.position += 1;
        }
    }

    /// Next token and the position it starts at
    fn next_token(&mut self) -> Result<(Token, usize), ParseError> {
        if let Some(token) = self.pending.pop_front() {
            return Ok(token);
        }

        self.skip_whitespace();
        let pos = self.position;

        let Some(c) = self.peek() else {
            return Ok((Token::Eof, pos));
        };

        let symbol = match c {
            '+' => Some(Token::Plus),
            '-' => Some(Token::Minus),
            '*' => Some(Token::Star),
            '/' => Some(Token::Slash),
            '^' => Some(Token::Caret),
            '(' => Some(Token::LParen),
            ')' => Some(Token::RParen),
            _ => None,
        };
        if let Some(token) = symbol {
            self.position += 1;
            return Ok((token, pos));
        }

        if c.is_ascii_digit() || c == '.' {
            return self.read_number().map(|number| (number, pos));
        }

        if c.is_alphabetic() || c == '_' {
            self.read_identifiers()?;
            return self.next_token();
        }

        Err(ParseError::new(
            ParseErrorKind::UnexpectedCharacter,
            format!("Unexpected character: '{}'", c),
            pos,
        ))
    }

    fn read_number(&mut self) -> Result<Token, ParseError> {
        let pos = self.position;
        let mut text = String::new();

        while let Some(c) = self.peek() {
            if c.is_ascii_digit() || c == '.' {
                text.push(c);
                self.position += 1;
            } else {
                break;
            }
        }

        // Scientific notation only when digits follow, so `2e` stays `2*e`
        if matches!(self.peek(), Some('e' | 'E')) {
            let digit_at = match self.peek_at(1) {
                Some('+' | '-') => 2,
                _ => 1,
            };
            if self.peek_at(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                for _ in 0..digit_at {
                    if let Some(c) = self.peek() {
                        text.push(c);
                    }
                    self.position += 1;
                }
                while let Some(c) = self.peek().filter(char::is_ascii_digit) {
                    text.push(c);
                    self.position += 1;
                }
            }
        }

        text.parse::<f64>().map(Token::Number).map_err(|_| {
            ParseError::new(
                ParseErrorKind::InvalidNumber,
                format!("Invalid number: '{}'", text),
                pos,
            )
        })
    }

    /// Split an identifier run into names, `i` and a trailing function.
    ///
    /// Every character of the run must belong to one of them, so `x2` with
    /// only `x` bound is rejected rather than read as a second name.
    fn read_identifiers(&mut self) -> Result<(), ParseError> {
        let start = self.position;
        let mut run = Vec::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                run.push(c);
                self.position += 1;
            } else {
                break;
            }
        }

        self.skip_whitespace();
        let before_call = self.peek() == Some('(');

        let mut function = None;
        if before_call {
            let text: String = run.iter().collect();
            if let Some(name) = super::types::UNARY_FUNCTIONS
                .iter()
                .map(|(name, _)| *name)
                .find(|name| text.ends_with(name))
            {
                let split = run.len() - name.chars().count();
                function = Operation::from_function_name(name).map(|op| (op, start + split));
                run.truncate(split);
            }
        }

        let mut offset = 0;
        while offset < run.len() {
            let rest = &run[offset..];
            let matched = (1..=rest.len()).rev().find_map(|len| {
                let candidate: String = rest[..len].iter().collect();
                self.identifier_token(&candidate).map(|token| (token, len))
            });
            match matched {
                Some((token, len)) => {
                    self.pending.push_back((token, start + offset));
                    offset += len;
                }
                None => {
                    let text: String = rest.iter().collect();
                    self.pending.clear();
                    return Err(ParseError::new(
                        ParseErrorKind::UnknownIdentifier,
                        format!("Unknown identifier: '{}'", text),
                        start + offset,
                    ));
                }
            }
        }

        if let Some((op, pos)) = function {
            self.pending.push_back((Token::Function(op), pos));
        }
        Ok(())
    }

    fn identifier_token(&self, candidate: &str) -> Option<Token> {
        if self.imaginary && candidate == "i" {
            Some(Token::Imaginary)
        } else if self.names.contains(&candidate) {
            Some(Token::Name(candidate.to_string()))
        } else {
            None
        }
    }
}

/// Parser for expressions
struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    position: usize,
}

impl<'a> Parser<'a> {
    fn new(lexer: Lexer<'a>) -> Result<Self, ParseError> {
        let mut parser = Self {
            lexer,
            current: Token::Eof,
            position: 0,
        };
        parser.advance()?;
        Ok(parser)
    }

    fn advance(&mut self) -> Result<(), ParseError> {
        let (token, position) = self.lexer.next_token()?;
        self.current = token;
        self.position = position;
        Ok(())
    }

    fn parse<V: Scalar>(&mut self) -> Result<Operand<V>, ParseError> {
        let operand = self.parse_additive()?;
        match self.current {
            Token::Eof => Ok(operand),
            Token::RParen => Err(ParseError::new(
                ParseErrorKind::UnmatchedParenthesis,
                "Unmatched ')'",
                self.position,
            )),
            _ => Err(ParseError::new(
                ParseErrorKind::UnexpectedToken,
                format!("Unexpected token after expression: {:?}", self.current),
                self.position,
            )),
        }
    }

    // Additive: term (('+' | '-') term)*
    fn parse_additive<V: Scalar>(&mut self) -> Result<Operand<V>, ParseError> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match self.current {
                Token::Plus => Operation::Add,
                Token::Minus => Operation::Subtract,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_multiplicative()?;
            left = Expr::new(op, left, Some(right)).into();
        }

        Ok(left)
    }

    // Multiplicative: power (('*' | '/')? power)*
    fn parse_multiplicative<V: Scalar>(&mut self) -> Result<Operand<V>, ParseError> {
        let mut left = self.parse_power()?;

        loop {
            let op = match self.current {
                Token::Star => Operation::Multiply,
                Token::Slash => Operation::Divide,
                _ if self.current.starts_implicit_factor() => {
                    let right: Operand<V> = self.parse_power()?;
                    left = Expr::multiply(left, right).into();
                    continue;
                }
                _ => break,
            };
            self.advance()?;
            let right = self.parse_power()?;
            left = Expr::new(op, left, Some(right)).into();
        }

        Ok(left)
    }

    // Power: unary ('^' power)?  (right associative)
    fn parse_power<V: Scalar>(&mut self) -> Result<Operand<V>, ParseError> {
        let base: Operand<V> = self.parse_unary()?;

        if self.current == Token::Caret {
            self.advance()?;
            let exponent: Operand<V> = self.parse_power()?;
            Ok(Expr::power(base, exponent).into())
        } else {
            Ok(base)
        }
    }

    // Unary: '-' unary | primary
    fn parse_unary<V: Scalar>(&mut self) -> Result<Operand<V>, ParseError> {
        if self.current == Token::Minus {
            self.advance()?;
            let operand: Operand<V> = self.parse_unary()?;
            Ok(Expr::negate(operand).into())
        } else {
            self.parse_primary()
        }
    }

    // Primary: number | name | i | function '(' expr ')' | '(' expr ')'
    fn parse_primary<V: Scalar>(&mut self) -> Result<Operand<V>, ParseError> {
        match self.current.clone() {
            Token::Number(value) => {
                self.advance()?;
                Ok(Operand::constant(value))
            }
            Token::Name(name) => {
                self.advance()?;
                Ok(Operand::variable(&name))
            }
            Token::Imaginary => match V::imaginary_unit() {
                Some(unit) => {
                    self.advance()?;
                    Ok(Leaf::Value(unit).into())
                }
                None => Err(self.unexpected()),
            },
            Token::Function(op) => {
                self.advance()?;
                if self.current != Token::LParen {
                    return Err(ParseError::new(
                        ParseErrorKind::UnexpectedToken,
                        format!("Expected '(' after {}", op),
                        self.position,
                    ));
                }
                let argument = self.parse_group()?;
                Ok(Expr::new(op, argument, None).into())
            }
            Token::LParen => self.parse_group(),
            _ => Err(self.unexpected()),
        }
    }

    /// `'(' expr ')'`, with the current token on the opening parenthesis
    fn parse_group<V: Scalar>(&mut self) -> Result<Operand<V>, ParseError> {
        let open = self.position;
        self.advance()?;
        let inner = self.parse_additive()?;
        if self.current != Token::RParen {
            return Err(ParseError::new(
                ParseErrorKind::UnmatchedParenthesis,
                "Expected ')'",
                open,
            ));
        }
        self.advance()?;
        Ok(inner)
    }

    fn unexpected(&self) -> ParseError {
        let message = match self.current {
            Token::Eof => "Unexpected end of expression".to_string(),
            ref token => format!("Unexpected token: {:?}", token),
        };
        ParseError::new(ParseErrorKind::UnexpectedToken, message, self.position)
    }
}

/// Parse an expression string into a tree.
///
/// Identifiers are matched against the names in `bindings`; the values
/// themselves are looked up again when the tree is evaluated.
pub fn parse_expression<V: Scalar>(input: &str, bindings: &Bindings<V>) -> Result<Expr<V>, ParseError> {
    if input.trim().is_empty() {
        return Err(ParseError::new(ParseErrorKind::Empty, "Empty expression", 0));
    }

    let names = bindings.keys().map(String::as_str).collect();
    let lexer = Lexer::new(input, names, V::imaginary_unit().is_some());
    let expr = Parser::new(lexer)?.parse::<V>()?.into_expr();

    tracing::debug!(input, tree = %expr, "parsed expression");
    Ok(expr)
}

pub fn parse_formula(input: &str, bindings: &Bindings<Measurement>) -> Result<Formula, ParseError> {
    parse_expression(input, bindings)
}

pub fn parse_complex_formula(input: &str, bindings: &Bindings<Complex>) -> Result<ComplexFormula, ParseError> {
    parse_expression(input, bindings)
}

#[cfg(test)]
mod parser_tests {
    use super::*;
    use crate::formula::Variable;

    fn parse(input: &str) -> Formula {
        parse_formula(input, &Bindings::new()).unwrap()
    }

    fn parse_with(input: &str, names: &[&str]) -> Formula {
        let bindings = names
            .iter()
            .map(|name| (name.to_string(), Measurement::exact(1.0)))
            .collect();
        parse_formula(input, &bindings).unwrap()
    }

    #[test]
    fn test_parse_simple_number() {
        let expr = parse("42");
        assert_eq!(expr, Formula::identity(42.0));
    }

    #[test]
    fn test_parse_scientific_notation() {
        assert_eq!(parse("1.5e-3"), Formula::identity(0.0015));
        assert_eq!(parse("2E+2"), Formula::identity(200.0));
    }

    #[test]
    fn test_parse_addition() {
        assert_eq!(parse("1 + 2"), Formula::add(1.0, 2.0));
    }

    #[test]
    fn test_parse_precedence() {
        assert_eq!(parse("1 + 2 * 3"), Formula::add(1.0, Formula::multiply(2.0, 3.0)));
    }

    #[test]
    fn test_parse_parentheses() {
        assert_eq!(parse("(1 + 2) * 3"), Formula::multiply(Formula::add(1.0, 2.0), 3.0));
    }

    #[test]
    fn test_parse_left_associative() {
        assert_eq!(parse("8 - 4 - 2"), Formula::subtract(Formula::subtract(8.0, 4.0), 2.0));
        assert_eq!(parse("8 / 4 / 2"), Formula::divide(Formula::divide(8.0, 4.0), 2.0));
    }

    #[test]
    fn test_parse_power_right_associative() {
        assert_eq!(parse("2 ^ 3 ^ 2"), Formula::power(2.0, Formula::power(3.0, 2.0)));
    }

    #[test]
    fn test_parse_negation() {
        assert_eq!(parse("-5"), Formula::negate(5.0));
        assert_eq!(parse("7/-3"), Formula::divide(7.0, Formula::negate(3.0)));
    }

    #[test]
    fn test_negation_binds_tighter_than_power() {
        assert_eq!(parse("-2^2"), Formula::power(Formula::negate(2.0), 2.0));
    }

    #[test]
    fn test_parse_function() {
        assert_eq!(parse("sqrt(16)"), Formula::sqrt(16.0));
        assert_eq!(parse("cos (0)"), Formula::cos(0.0));
    }

    #[test]
    fn test_implicit_multiplication() {
        assert_eq!(parse("5cos(3/2)"), Formula::multiply(5.0, Formula::cos(Formula::divide(3.0, 2.0))));
        assert_eq!(parse("(1+2)(3)"), Formula::multiply(Formula::add(1.0, 2.0), 3.0));
        assert_eq!(
            parse_with("2x^2", &["x"]),
            Formula::multiply(2.0, Formula::power(Variable::new("x"), 2.0))
        );
    }

    #[test]
    fn test_identifier_run_splits_on_bound_names() {
        let expected = Formula::multiply(Formula::multiply(2.0, Variable::new("x")), Variable::new("y"));
        assert_eq!(parse_with("2xy", &["x", "y"]), expected);
    }

    #[test]
    fn test_longest_bound_name_wins() {
        assert_eq!(parse_with("x1*x", &["x", "x1"]), Formula::multiply(Variable::new("x1"), Variable::new("x")));
    }

    #[test]
    fn test_function_suffix_of_run() {
        assert_eq!(
            parse_with("xsin(0)", &["x"]),
            Formula::multiply(Variable::new("x"), Formula::sin(0.0))
        );
    }

    #[test]
    fn test_bound_name_inside_function_name() {
        // `e` must not be taken out of `exp`
        assert_eq!(parse_with("exp(e)", &["e"]), Formula::exp(Variable::new("e")));
    }

    #[test]
    fn test_unknown_identifier_is_error() {
        let err = parse_formula("speed*3", &Bindings::new()).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnknownIdentifier);
        assert_eq!(err.position, 0);

        let err = parse_formula("sqr(4)", &Bindings::new()).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnknownIdentifier);

        let bindings: Bindings<Measurement> = [("x".to_string(), Measurement::exact(1.0))].into_iter().collect();
        let err = parse_formula("2 + xz", &bindings).unwrap_err();
        assert_eq!((err.kind, err.position), (ParseErrorKind::UnknownIdentifier, 5));
    }

    #[test]
    fn test_digits_after_bound_name_are_rejected() {
        let bindings: Bindings<Measurement> = [("x".to_string(), Measurement::exact(2.0))].into_iter().collect();
        let err = parse_formula("x2", &bindings).unwrap_err();
        assert_eq!((err.kind, err.position), (ParseErrorKind::UnknownIdentifier, 1));
        assert!(err.message.contains("'2'"));

        // a bound name containing digits is still matched whole
        assert_eq!(parse_with("x2", &["x", "x2"]), Formula::identity(Variable::new("x2")));
    }

    #[test]
    fn test_exponent_needs_digits() {
        assert_eq!(
            parse_with("2e", &["e"]),
            Formula::multiply(2.0, Variable::new("e"))
        );
    }

    #[test]
    fn test_imaginary_unit() {
        let expr = parse_complex_formula("4i+3", &Bindings::new()).unwrap();
        assert_eq!(
            expr,
            ComplexFormula::add(ComplexFormula::multiply(4.0, Complex::I), 3.0)
        );
    }

    #[test]
    fn test_i_is_a_name_for_measurements() {
        assert_eq!(parse_with("i", &["i"]), Formula::identity(Variable::new("i")));
        let err = parse_formula("4i", &Bindings::new()).unwrap_err();
        assert_eq!((err.kind, err.position), (ParseErrorKind::UnknownIdentifier, 1));
    }

    #[test]
    fn test_parse_empty_error() {
        let err = parse_formula("   ", &Bindings::new()).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::Empty);
    }

    #[test]
    fn test_parse_invalid_character() {
        let err = parse_formula("1 $ 2", &Bindings::new()).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnexpectedCharacter);
        assert_eq!(err.position, 2);
    }

    #[test]
    fn test_parse_invalid_number() {
        let err = parse_formula("3.4.5 + 1", &Bindings::new()).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidNumber);
        assert_eq!(err.position, 0);
    }

    #[test]
    fn test_parse_unmatched_parentheses() {
        let err = parse_formula("(1 + 2", &Bindings::new()).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnmatchedParenthesis);
        assert_eq!(err.position, 0);

        let err = parse_formula("1 + 2)", &Bindings::new()).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnmatchedParenthesis);
    }

    #[test]
    fn test_parse_dangling_operator() {
        let err = parse_formula("1 +", &Bindings::new()).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnexpectedToken);
        assert!(err.to_string().starts_with("Parse error at position 3"));
    }

    #[test]
    fn test_number_after_factor_is_not_implicit() {
        let err = parse_formula("2 3", &Bindings::new()).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnexpectedToken);
    }
}
