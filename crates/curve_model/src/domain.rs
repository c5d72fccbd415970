//! Arithmetic domains the curve formula can be evaluated in

use crate::{CurveConfig, CurveError};

/// Arithmetic needed by the curve formula.
///
/// Implemented for concrete `f64` evaluation by [`Numeric`] and for solver
/// terms by the symbolic domain in `proofs-z3`. Only division and
/// exponentiation can fail; everything else is total.
pub trait CurveDomain {
    type Value: Clone;
    type Error;

    /// `UNIT` lifted into the domain
    fn unit(&self) -> Self::Value;

    /// `BASE_FEE` lifted into the domain
    fn base_fee(&self) -> Self::Value;

    fn add(&self, a: &Self::Value, b: &Self::Value) -> Self::Value;

    fn sub(&self, a: &Self::Value, b: &Self::Value) -> Self::Value;

    fn mul(&self, a: &Self::Value, b: &Self::Value) -> Self::Value;

    fn div(&self, num: &Self::Value, den: &Self::Value) -> Result<Self::Value, Self::Error>;

    /// `base ** exp` for an integer exponent
    fn pow(&self, base: &Self::Value, exp: &Self::Value) -> Result<Self::Value, Self::Error>;
}

/// Real-valued evaluation over `f64`
#[derive(Debug, Clone, Copy, Default)]
pub struct Numeric {
    pub config: CurveConfig,
}

impl Numeric {
    pub fn new(config: CurveConfig) -> Self {
        Self { config }
    }
}

impl CurveDomain for Numeric {
    type Value = f64;
    type Error = CurveError;

    fn unit(&self) -> f64 {
        self.config.unit as f64
    }

    fn base_fee(&self) -> f64 {
        self.config.base_fee()
    }

    fn add(&self, a: &f64, b: &f64) -> f64 {
        a + b
    }

    fn sub(&self, a: &f64, b: &f64) -> f64 {
        a - b
    }

    fn mul(&self, a: &f64, b: &f64) -> f64 {
        a * b
    }

    fn div(&self, num: &f64, den: &f64) -> Result<f64, CurveError> {
        // An overflowed operand would silently turn the quotient into 0 or NaN
        if !num.is_finite() || !den.is_finite() {
            return Err(CurveError::NonFinite);
        }
        if *den == 0.0 {
            return Err(CurveError::ZeroDenominator);
        }
        finite(num / den)
    }

    fn pow(&self, base: &f64, exp: &f64) -> Result<f64, CurveError> {
        let n = integer_exponent(*exp).ok_or(CurveError::InvalidExponent)?;
        finite(powi(*base, n))
    }
}

fn finite(value: f64) -> Result<f64, CurveError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CurveError::NonFinite)
    }
}

/// Exponent as `u32` if it is a positive integer
pub(crate) fn integer_exponent(exp: f64) -> Option<u32> {
    if !exp.is_finite() || exp < 1.0 || exp > u32::MAX as f64 {
        return None;
    }
    let n = exp as u32;
    if n as f64 != exp {
        return None;
    }
    Some(n)
}

/// Square-and-multiply; sign of a negative base follows the exponent's parity
fn powi(base: f64, mut n: u32) -> f64 {
    let mut acc = 1.0;
    let mut sq = base;
    while n > 0 {
        if n & 1 == 1 {
            acc *= sq;
        }
        n >>= 1;
        if n > 0 {
            sq *= sq;
        }
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_powi_sign_follows_parity() {
        assert_eq!(powi(-2.0, 2), 4.0);
        assert_eq!(powi(-2.0, 3), -8.0);
        assert_eq!(powi(0.5, 1), 0.5);
        assert_eq!(powi(3.0, 5), 243.0);
    }

    #[test]
    fn test_integer_exponent_rejects_fractional_and_non_positive() {
        assert_eq!(integer_exponent(2.0), Some(2));
        assert_eq!(integer_exponent(2.5), None);
        assert_eq!(integer_exponent(0.0), None);
        assert_eq!(integer_exponent(-1.0), None);
        assert_eq!(integer_exponent(f64::NAN), None);
        assert_eq!(integer_exponent(f64::INFINITY), None);
    }

    #[test]
    fn test_div_by_zero_is_an_error() {
        let domain = Numeric::default();
        assert_eq!(domain.div(&1.0, &0.0), Err(CurveError::ZeroDenominator));
        assert_eq!(domain.div(&1.0, &-0.0), Err(CurveError::ZeroDenominator));
        assert_eq!(domain.div(&1.0, &4.0), Ok(0.25));
    }

    #[test]
    fn test_div_rejects_overflowed_operands() {
        let domain = Numeric::default();
        assert_eq!(domain.div(&1.0, &f64::INFINITY), Err(CurveError::NonFinite));
        assert_eq!(domain.div(&f64::NEG_INFINITY, &2.0), Err(CurveError::NonFinite));
        assert_eq!(domain.div(&f64::NAN, &2.0), Err(CurveError::NonFinite));
        assert_eq!(domain.div(&f64::MAX, &0.5), Err(CurveError::NonFinite));
    }

    #[test]
    fn test_pow_rejects_overflow() {
        let domain = Numeric::default();
        assert_eq!(domain.pow(&1e200, &2.0), Err(CurveError::NonFinite));
        assert_eq!(domain.pow(&2.0, &10.0), Ok(1024.0));
    }
}
