//! Complex numbers for the complex formula variant.
//!
//! A thin wrapper over [`num_complex::Complex64`] that pins down the
//! behaviour formulas rely on: `0^z = 0`, a `3+4i` rendering the parser can
//! read back, and approximate comparison through [`Similar`].

use super::similarity::{Similar, Tolerance};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// `re + im·i`
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Complex(Complex64);

impl Complex {
    pub const ZERO: Complex = Complex::new(0.0, 0.0);
    pub const ONE: Complex = Complex::new(1.0, 0.0);
    pub const I: Complex = Complex::new(0.0, 1.0);

    pub const fn new(re: f64, im: f64) -> Self {
        Self(Complex64::new(re, im))
    }

    pub const fn real(re: f64) -> Self {
        Self::new(re, 0.0)
    }

    pub fn from_polar(r: f64, theta: f64) -> Self {
        Self(Complex64::from_polar(r, theta))
    }

    /// `cos t + i sin t`
    pub fn cis(theta: f64) -> Self {
        Self(Complex64::cis(theta))
    }

    pub fn re(&self) -> f64 {
        self.0.re
    }

    pub fn im(&self) -> f64 {
        self.0.im
    }

    /// Principal argument in `(-π, π]`
    pub fn arg(&self) -> f64 {
        self.0.arg()
    }

    pub fn abs(&self) -> f64 {
        self.0.norm()
    }

    pub fn conj(&self) -> Self {
        Self(self.0.conj())
    }

    pub fn is_zero(&self) -> bool {
        self.0.re == 0.0 && self.0.im == 0.0
    }

    pub fn recip(self) -> Self {
        Self(self.0.inv())
    }

    /// Principal natural logarithm; total apart from zero
    pub fn ln(self) -> Self {
        Self(self.0.ln())
    }

    pub fn log10(self) -> Self {
        Self(self.0.log10())
    }

    /// Logarithm of `self` in a complex `base`
    pub fn log(self, base: Complex) -> Self {
        self.ln() / base.ln()
    }

    pub fn exp(self) -> Self {
        Self(self.0.exp())
    }

    /// `self^exponent = exp(exponent · ln self)`, with `0^z = 0`
    pub fn powc(self, exponent: Complex) -> Self {
        if self.is_zero() {
            return Self::ZERO;
        }
        Self(self.0.powc(exponent.0))
    }

    pub fn powf(self, exponent: f64) -> Self {
        if self.is_zero() {
            return Self::ZERO;
        }
        Self(self.0.powf(exponent))
    }

    pub fn sqrt(self) -> Self {
        Self(self.0.sqrt())
    }

    pub fn sin(self) -> Self {
        Self(self.0.sin())
    }

    pub fn cos(self) -> Self {
        Self(self.0.cos())
    }

    pub fn tan(self) -> Self {
        Self(self.0.tan())
    }

    pub fn asin(self) -> Self {
        Self(self.0.asin())
    }

    pub fn acos(self) -> Self {
        Self(self.0.acos())
    }

    pub fn atan(self) -> Self {
        Self(self.0.atan())
    }

    pub fn sinh(self) -> Self {
        Self(self.0.sinh())
    }

    pub fn cosh(self) -> Self {
        Self(self.0.cosh())
    }

    pub fn tanh(self) -> Self {
        Self(self.0.tanh())
    }

    pub fn asinh(self) -> Self {
        Self(self.0.asinh())
    }

    pub fn acosh(self) -> Self {
        Self(self.0.acosh())
    }

    pub fn atanh(self) -> Self {
        Self(self.0.atanh())
    }
}

impl From<f64> for Complex {
    fn from(re: f64) -> Self {
        Self::real(re)
    }
}

impl From<Complex64> for Complex {
    fn from(value: Complex64) -> Self {
        Self(value)
    }
}

impl From<Complex> for Complex64 {
    fn from(value: Complex) -> Self {
        value.0
    }
}

// Arithmetic forwards to num-complex, including the mixed forms with f64
macro_rules! forward_binary_op {
    ($trait:ident, $method:ident) => {
        impl $trait for Complex {
            type Output = Complex;
            fn $method(self, rhs: Complex) -> Complex {
                Complex(self.0.$method(rhs.0))
            }
        }

        impl $trait<f64> for Complex {
            type Output = Complex;
            fn $method(self, rhs: f64) -> Complex {
                Complex(self.0.$method(rhs))
            }
        }

        impl $trait<Complex> for f64 {
            type Output = Complex;
            fn $method(self, rhs: Complex) -> Complex {
                Complex(self.$method(rhs.0))
            }
        }
    };
}

forward_binary_op!(Add, add);
forward_binary_op!(Sub, sub);
forward_binary_op!(Mul, mul);
forward_binary_op!(Div, div);

impl Neg for Complex {
    type Output = Complex;
    fn neg(self) -> Complex {
        Complex(-self.0)
    }
}

impl fmt::Display for Complex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn imaginary(im: f64) -> String {
            if im == 1.0 {
                "i".to_string()
            } else if im == -1.0 {
                "-i".to_string()
            } else {
                format!("{}i", im)
            }
        }
        let Complex64 { re, im } = self.0;
        if im == 0.0 {
            write!(f, "{}", re)
        } else if re == 0.0 {
            write!(f, "{}", imaginary(im))
        } else if im < 0.0 {
            write!(f, "{}{}", re, imaginary(im))
        } else {
            write!(f, "{}+{}", re, imaginary(im))
        }
    }
}

impl Similar for Complex {
    fn similar_within(&self, other: &Complex, tolerance: &Tolerance) -> bool {
        tolerance.scalars_similar(self.re(), other.re()) && tolerance.scalars_similar(self.im(), other.im())
    }
}

impl Similar<f64> for Complex {
    fn similar_within(&self, other: &f64, tolerance: &Tolerance) -> bool {
        self.similar_within(&Complex::real(*other), tolerance)
    }
}
