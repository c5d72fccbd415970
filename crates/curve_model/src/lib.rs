//! Curve Model - Power-law bonding curve quote math
//!
//! This crate contains the closed-form swap quote used by the liability/reserve
//! curve pool. The formula is written once, generic over [`CurveDomain`], so the
//! same code evaluates concrete `f64` quotes and the symbolic model consumed by
//! the solver-backed invariant checks in `proofs-z3`.

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

pub mod domain;
pub mod math;

use core::fmt;

pub use domain::{CurveDomain, Numeric};
pub use math::{evaluate, quote, quote_detailed, Quote, QuoteBreakdown, SwapParams};

/// Fixed-point scale (1e18, 18-decimal convention)
pub const UNIT: u64 = 1_000_000_000_000_000_000;

/// Basis points scale (10,000 bps = 100%)
pub const BPS_SCALE: u32 = 10_000;

/// Flat proportional fee in basis points (50 bps = 0.005)
pub const BASE_FEE_BPS: u32 = 50;

/// Flat proportional fee rate
pub const BASE_FEE: f64 = 0.005;

/// Immutable curve configuration shared by the quote engine and the verifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct CurveConfig {
    /// Fixed-point scale added to the exponent in the curve denominator
    pub unit: u64,

    /// Flat fee rate in basis points of `BPS_SCALE`
    pub base_fee_bps: u32,
}

impl CurveConfig {
    /// Flat fee rate as a real number
    pub fn base_fee(&self) -> f64 {
        self.base_fee_bps as f64 / BPS_SCALE as f64
    }
}

impl Default for CurveConfig {
    fn default() -> Self {
        Self {
            unit: UNIT,
            base_fee_bps: BASE_FEE_BPS,
        }
    }
}

/// Domain errors for quote evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurveError {
    /// Liability capacity `L` is zero
    ZeroLiability,
    /// Curve denominator `K * (UNIT + K) * (s + u)` is zero
    ZeroDenominator,
    /// Exponent `K` is not a positive integer
    InvalidExponent,
    /// An input or intermediate value is NaN or infinite
    NonFinite,
}

impl fmt::Display for CurveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CurveError::ZeroLiability => write!(f, "liability capacity L must be non-zero"),
            CurveError::ZeroDenominator => {
                write!(f, "curve denominator K * (UNIT + K) * (s + u) is zero")
            }
            CurveError::InvalidExponent => write!(f, "curve exponent K must be a positive integer"),
            CurveError::NonFinite => write!(f, "quote is not finite"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for CurveError {}
