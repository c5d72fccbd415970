//! Bonding curve quote math
//!
//! The fee is the flat `BASE_FEE * x` plus a closed-form approximation of the
//! integral of the power-law marginal price over `[U, U + x]`:
//!
//! ```text
//! sumA  = ((u + x) * K - U + u) * ((U + x) / L) ** K
//! sumB  = (U - u - K * u) * (U / L) ** K
//! nom   = (sumA + sumB) * (S + U)
//! denom = K * (UNIT + K) * (s + u)
//! fee   = BASE_FEE * x + nom / denom
//! out   = x - fee
//! ```

use crate::domain::{integer_exponent, CurveDomain, Numeric};
use crate::{CurveConfig, CurveError};

/// Curve parameters of a single pool
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SwapParams<V> {
    /// `u`: lower liability bound
    pub liability_lo: V,

    /// `U`: upper liability (used liquidity) bound
    pub liability_hi: V,

    /// `s`: lower reserve bound
    pub reserve_lo: V,

    /// `S`: upper reserve bound
    pub reserve_hi: V,

    /// `L`: total liability capacity
    pub capacity: V,

    /// `K`: curve exponent
    pub exponent: V,
}

impl<V> SwapParams<V> {
    /// Parameters in formula order `(u, U, s, S, L, K)`
    pub fn new(u: V, big_u: V, s: V, big_s: V, l: V, k: V) -> Self {
        Self {
            liability_lo: u,
            liability_hi: big_u,
            reserve_lo: s,
            reserve_hi: big_s,
            capacity: l,
            exponent: k,
        }
    }
}

/// Quote for a trade of size `x`
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Quote<V> {
    /// Net amount delivered to the trader (`x - fee`)
    pub out: V,

    /// Amount retained by the pool
    pub fee: V,
}

/// Quote with the fee split into its flat and curve components
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QuoteBreakdown<V> {
    pub out: V,
    pub fee: V,

    /// `BASE_FEE * x`
    pub flat_fee: V,

    /// `nom / denom`
    pub curve_fee: V,
}

impl<V> QuoteBreakdown<V> {
    pub fn into_quote(self) -> Quote<V> {
        Quote {
            out: self.out,
            fee: self.fee,
        }
    }
}

/// Evaluate the curve formula in any [`CurveDomain`].
///
/// No validation happens here beyond what the domain's `div` and `pow`
/// enforce; callers decide what a well-formed parameter set is. Every
/// intermediate product ends up in a `div` operand or in the returned terms.
pub fn evaluate<D: CurveDomain>(
    domain: &D,
    x: &D::Value,
    p: &SwapParams<D::Value>,
) -> Result<QuoteBreakdown<D::Value>, D::Error> {
    let u = &p.liability_lo;
    let big_u = &p.liability_hi;
    let s = &p.reserve_lo;
    let big_s = &p.reserve_hi;
    let l = &p.capacity;
    let k = &p.exponent;

    // ((U + x) / L) ** K and (U / L) ** K
    let upper_ratio = domain.pow(&domain.div(&domain.add(big_u, x), l)?, k)?;
    let lower_ratio = domain.pow(&domain.div(big_u, l)?, k)?;

    // (u + x) * K - U + u
    let upper_coef = domain.add(
        &domain.sub(&domain.mul(&domain.add(u, x), k), big_u),
        u,
    );
    // U - u - K * u
    let lower_coef = domain.sub(&domain.sub(big_u, u), &domain.mul(k, u));

    let sum_a = domain.mul(&upper_coef, &upper_ratio);
    let sum_b = domain.mul(&lower_coef, &lower_ratio);

    let nom = domain.mul(&domain.add(&sum_a, &sum_b), &domain.add(big_s, big_u));
    let denom = domain.mul(
        &domain.mul(k, &domain.add(&domain.unit(), k)),
        &domain.add(s, u),
    );

    let flat_fee = domain.mul(&domain.base_fee(), x);
    let curve_fee = domain.div(&nom, &denom)?;
    let fee = domain.add(&flat_fee, &curve_fee);
    let out = domain.sub(x, &fee);

    Ok(QuoteBreakdown {
        out,
        fee,
        flat_fee,
        curve_fee,
    })
}

/// Calculate the quote for trading `x` against the pool
///
/// # Arguments
/// * `x` - Trade size
/// * `params` - Curve parameters `(u, U, s, S, L, K)`
/// * `config` - Fixed-point scale and flat fee
///
/// # Returns
/// * `Quote` with `out + fee == x`
/// * `CurveError` if the formula is undefined for these inputs
pub fn quote(x: f64, params: &SwapParams<f64>, config: &CurveConfig) -> Result<Quote<f64>, CurveError> {
    quote_detailed(x, params, config).map(QuoteBreakdown::into_quote)
}

/// Same as [`quote`], keeping the flat and curve fee terms apart
pub fn quote_detailed(
    x: f64,
    params: &SwapParams<f64>,
    config: &CurveConfig,
) -> Result<QuoteBreakdown<f64>, CurveError> {
    let inputs = [
        x,
        params.liability_lo,
        params.liability_hi,
        params.reserve_lo,
        params.reserve_hi,
        params.capacity,
        params.exponent,
    ];
    if inputs.iter().any(|v| !v.is_finite()) {
        return Err(CurveError::NonFinite);
    }
    if params.capacity == 0.0 {
        return Err(CurveError::ZeroLiability);
    }
    if integer_exponent(params.exponent).is_none() {
        return Err(CurveError::InvalidExponent);
    }
    if params.reserve_lo + params.liability_lo == 0.0
        || config.unit as f64 + params.exponent == 0.0
    {
        return Err(CurveError::ZeroDenominator);
    }

    let result = evaluate(&Numeric::new(*config), &x, params)?;

    let outputs = [result.out, result.fee, result.flat_fee, result.curve_fee];
    if outputs.iter().any(|v| !v.is_finite()) {
        return Err(CurveError::NonFinite);
    }

    Ok(result)
}
