use std::fmt::Display;
use std::ops::{Add, Div, Mul, Sub};

use num_bigint::BigInt;
use num_traits::{ToPrimitive, Zero};

/// A numeric value: either an exact integer or a float.
///
/// `+`, `-` and `*` keep integers exact, with no upper bound, when both
/// operands are integers and promote to float as soon as one side is a float.
/// Division always yields a float.
#[derive(Debug, Clone)]
pub enum Number {
    Int(BigInt),
    Float(f64),
}

impl Number {
    pub fn as_f64(&self) -> f64 {
        match self {
            Number::Int(n) => n.to_f64().unwrap_or(f64::NAN),
            Number::Float(n) => *n,
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Number::Float(_))
    }

    pub fn is_zero(&self) -> bool {
        match self {
            Number::Int(n) => n.is_zero(),
            Number::Float(n) => *n == 0.0,
        }
    }

    fn combine(
        &self,
        rhs: &Number,
        int: impl FnOnce(&BigInt, &BigInt) -> BigInt,
        float: impl FnOnce(f64, f64) -> f64,
    ) -> Number {
        match (self, rhs) {
            (Number::Int(lhs), Number::Int(rhs)) => Number::Int(int(lhs, rhs)),
            (lhs, rhs) => Number::Float(float(lhs.as_f64(), rhs.as_f64())),
        }
    }
}

impl Add for &Number {
    type Output = Number;

    fn add(self, rhs: &Number) -> Number {
        self.combine(rhs, |a, b| a + b, |a, b| a + b)
    }
}

impl Sub for &Number {
    type Output = Number;

    fn sub(self, rhs: &Number) -> Number {
        self.combine(rhs, |a, b| a - b, |a, b| a - b)
    }
}

impl Mul for &Number {
    type Output = Number;

    fn mul(self, rhs: &Number) -> Number {
        self.combine(rhs, |a, b| a * b, |a, b| a * b)
    }
}

/// Real-valued division. The caller is responsible for rejecting a zero
/// divisor.
impl Div for &Number {
    type Output = Number;

    fn div(self, rhs: &Number) -> Number {
        Number::Float(self.as_f64() / rhs.as_f64())
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Number::Int(lhs), Number::Int(rhs)) => lhs == rhs,
            (lhs, rhs) => lhs.as_f64() == rhs.as_f64(),
        }
    }
}

impl PartialEq<i64> for Number {
    fn eq(&self, other: &i64) -> bool {
        *self == Number::from(*other)
    }
}

impl PartialEq<f64> for Number {
    fn eq(&self, other: &f64) -> bool {
        *self == Number::Float(*other)
    }
}

impl From<i64> for Number {
    fn from(n: i64) -> Self {
        Number::Int(BigInt::from(n))
    }
}

impl From<BigInt> for Number {
    fn from(n: BigInt) -> Self {
        Number::Int(n)
    }
}

impl From<f64> for Number {
    fn from(n: f64) -> Self {
        Number::Float(n)
    }
}

impl Display for Number {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Number::Int(n) => write!(f, "{n}"),
            Number::Float(n) => write_float(*n, f),
        }
    }
}

/// Shortest round-trip digits. Magnitudes from `1e-4` up to below `1e16` are
/// written in positional form with at least one fractional digit, anything
/// else in exponent form with a signed two-digit exponent (`1e-05`,
/// `1.5e+20`).
fn write_float(n: f64, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    if n.is_nan() {
        return f.write_str("nan");
    }
    if n.is_infinite() {
        return f.write_str(if n > 0.0 { "inf" } else { "-inf" });
    }

    let scientific = format!("{n:e}");
    let (mantissa, exponent) = scientific.split_once('e').unwrap_or((scientific.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if n != 0.0 && !(-4..16).contains(&exponent) {
        let sign = if exponent < 0 { '-' } else { '+' };
        write!(f, "{mantissa}e{sign}{:02}", exponent.abs())
    } else if n == n.trunc() {
        write!(f, "{n}.0")
    } else {
        write!(f, "{n}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(n: i64) -> Number {
        Number::from(n)
    }

    #[test]
    fn integers_stay_exact() {
        let sum = &int(2) + &int(3);
        assert!(!sum.is_float());
        assert_eq!(sum, 5_i64);
    }

    #[test]
    fn integers_have_no_upper_bound() {
        let n = int(99_999_999_999);
        assert_eq!((&n * &n).to_string(), "9999999999800000000001");

        let max = int(i64::MAX);
        let bigger = &max + &int(1);
        assert!(!bigger.is_float());
        assert_eq!(bigger.to_string(), "9223372036854775808");
        assert_eq!((&int(i64::MIN) - &int(1)).to_string(), "-9223372036854775809");
    }

    #[test]
    fn any_float_operand_promotes() {
        let product = &int(2) * &Number::Float(1.5);
        assert!(product.is_float());
        assert_eq!(product, 3.0);
    }

    #[test]
    fn division_is_always_float() {
        let quotient = &int(10) / &int(5);
        assert!(quotient.is_float());
        assert_eq!(quotient, 2_i64);
        assert_eq!(quotient, 2.0);
    }

    #[test]
    fn zero_detection() {
        assert!(int(0).is_zero());
        assert!(Number::Float(-0.0).is_zero());
        assert!(!Number::Float(0.5).is_zero());
    }

    #[test]
    fn display_forms() {
        assert_eq!(int(15).to_string(), "15");
        assert_eq!(Number::Float(2.0).to_string(), "2.0");
        assert_eq!(Number::Float(2.5).to_string(), "2.5");
        assert_eq!((&int(10) / &int(3)).to_string(), "3.3333333333333335");
        assert_eq!(Number::Float(0.0001).to_string(), "0.0001");
        assert_eq!(Number::Float(1e15).to_string(), "1000000000000000.0");
    }

    #[test]
    fn extreme_magnitudes_use_exponent_form() {
        assert_eq!(Number::Float(0.00001).to_string(), "1e-05");
        assert_eq!(Number::Float(1e16).to_string(), "1e+16");
        assert_eq!(Number::Float(1.5e20).to_string(), "1.5e+20");
        assert_eq!(Number::Float(-2.5e-7).to_string(), "-2.5e-07");
        assert_eq!(Number::Float(f64::INFINITY).to_string(), "inf");
    }
}
