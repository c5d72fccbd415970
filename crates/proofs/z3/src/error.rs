use thiserror::Error;

use crate::config::Symbol;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VerifierError {
    #[error("Verifier error - exponent set is empty")]
    EmptyExponentSet,

    #[error("Verifier error - enumerated exponent {0} outside 1..={max}", max = crate::config::MAX_ENUMERATED_EXPONENT)]
    InvalidExponent(u32),

    #[error("Verifier error - bound on {symbol} has min {min} > max {max}")]
    InvertedBound { symbol: Symbol, min: i64, max: i64 },

    #[error("Verifier error - K is substituted per enumerated exponent and cannot be bounded")]
    ExponentBoundWithEnumeration,
}
