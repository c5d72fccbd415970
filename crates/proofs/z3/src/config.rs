//! Verification settings

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::VerifierError;

/// Largest exponent accepted for per-value enumeration
pub const MAX_ENUMERATED_EXPONENT: u32 = 16;

/// Default solver timeout (10s)
pub const DEFAULT_TIMEOUT_MS: u32 = 10_000;

/// Free variables of the symbolic model, keyed by their formula names
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Symbol {
    /// `x`, the trade size
    TradeSize,
    LiabilityLo,
    LiabilityHi,
    ReserveLo,
    ReserveHi,
    Capacity,
    Exponent,
}

impl Symbol {
    pub const ALL: [Symbol; 7] = [
        Symbol::TradeSize,
        Symbol::LiabilityLo,
        Symbol::LiabilityHi,
        Symbol::ReserveLo,
        Symbol::ReserveHi,
        Symbol::Capacity,
        Symbol::Exponent,
    ];

    /// Name of the solver constant
    pub fn name(&self) -> &'static str {
        match self {
            Symbol::TradeSize => "x",
            Symbol::LiabilityLo => "u",
            Symbol::LiabilityHi => "U",
            Symbol::ReserveLo => "s",
            Symbol::ReserveHi => "S",
            Symbol::Capacity => "L",
            Symbol::Exponent => "K",
        }
    }

    pub fn from_name(name: &str) -> Option<Symbol> {
        Symbol::ALL.into_iter().find(|s| s.name() == name)
    }
}

impl TryFrom<String> for Symbol {
    type Error = String;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        Symbol::from_name(&name).ok_or_else(|| format!("unknown symbol `{name}`, expected one of x, u, U, s, S, L, K"))
    }
}

impl From<Symbol> for String {
    fn from(symbol: Symbol) -> Self {
        symbol.name().to_string()
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Inclusive integer bound on a symbol; `min == max` pins it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Bound {
    pub min: Option<i64>,
    pub max: Option<i64>,
}

impl Bound {
    pub fn pinned(value: i64) -> Self {
        Self {
            min: Some(value),
            max: Some(value),
        }
    }
}

/// How the exponent `K` enters the model
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExponentStrategy {
    /// `K` stays a free integer; power terms go through the solver's
    /// non-linear `^`, which usually ends in `Unknown`
    #[default]
    Symbolic,

    /// One solver run per concrete `K`
    Enumerated(Vec<u32>),
}

/// What is asked of the solver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationMode {
    /// Is there an assignment satisfying all five invariants at once?
    #[default]
    Joint,

    /// For each invariant, is there an assignment violating it?
    PerInvariant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VerifierConfig {
    /// Solver timeout in milliseconds; `None` lets the solver run unbounded
    pub timeout_ms: Option<u32>,

    pub exponents: ExponentStrategy,

    pub mode: VerificationMode,

    /// Assert that every denominator of the formula is non-zero
    pub require_defined: bool,

    pub bounds: BTreeMap<Symbol, Bound>,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            timeout_ms: Some(DEFAULT_TIMEOUT_MS),
            exponents: ExponentStrategy::default(),
            mode: VerificationMode::default(),
            require_defined: false,
            bounds: BTreeMap::new(),
        }
    }
}

impl VerifierConfig {
    pub fn validate(&self) -> Result<(), VerifierError> {
        if let ExponentStrategy::Enumerated(values) = &self.exponents {
            if values.is_empty() {
                return Err(VerifierError::EmptyExponentSet);
            }
            if let Some(&k) = values
                .iter()
                .find(|&&k| k == 0 || k > MAX_ENUMERATED_EXPONENT)
            {
                return Err(VerifierError::InvalidExponent(k));
            }
            if self.bounds.contains_key(&Symbol::Exponent) {
                return Err(VerifierError::ExponentBoundWithEnumeration);
            }
        }

        for (symbol, bound) in &self.bounds {
            if let (Some(min), Some(max)) = (bound.min, bound.max) {
                if min > max {
                    return Err(VerifierError::InvertedBound {
                        symbol: *symbol,
                        min,
                        max,
                    });
                }
            }
        }

        Ok(())
    }

    /// Exponent per solver run; `None` is the free symbolic `K`
    pub fn exponent_cases(&self) -> Vec<Option<u32>> {
        match &self.exponents {
            ExponentStrategy::Symbolic => vec![None],
            ExponentStrategy::Enumerated(values) => values.iter().copied().map(Some).collect(),
        }
    }

    /// Number of solver queries a run will issue
    pub fn check_count(&self) -> usize {
        let per_case = match self.mode {
            VerificationMode::Joint => 1,
            VerificationMode::PerInvariant => crate::invariants::Invariant::ALL.len(),
        };
        per_case * self.exponent_cases().len()
    }

    pub fn pin(mut self, symbol: Symbol, value: i64) -> Self {
        self.bounds.insert(symbol, Bound::pinned(value));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_symbolic_joint_with_timeout() {
        let config = VerifierConfig::default();
        assert_eq!(config.exponents, ExponentStrategy::Symbolic);
        assert_eq!(config.mode, VerificationMode::Joint);
        assert_eq!(config.timeout_ms, Some(DEFAULT_TIMEOUT_MS));
        assert_eq!(config.exponent_cases(), vec![None]);
        assert_eq!(config.check_count(), 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_exponent_set_rejected() {
        let config = VerifierConfig {
            exponents: ExponentStrategy::Enumerated(vec![]),
            ..VerifierConfig::default()
        };
        assert_eq!(config.validate(), Err(VerifierError::EmptyExponentSet));
    }

    #[test]
    fn test_zero_and_oversized_exponents_rejected() {
        for k in [0, MAX_ENUMERATED_EXPONENT + 1] {
            let config = VerifierConfig {
                exponents: ExponentStrategy::Enumerated(vec![1, k]),
                ..VerifierConfig::default()
            };
            assert_eq!(config.validate(), Err(VerifierError::InvalidExponent(k)));
        }
    }

    #[test]
    fn test_exponent_bound_rejected_when_enumerating() {
        let config = VerifierConfig {
            exponents: ExponentStrategy::Enumerated(vec![2]),
            ..VerifierConfig::default()
        }
        .pin(Symbol::Exponent, 2);
        assert_eq!(config.validate(), Err(VerifierError::ExponentBoundWithEnumeration));
    }

    #[test]
    fn test_inverted_bound_rejected() {
        let mut config = VerifierConfig::default();
        config.bounds.insert(
            Symbol::TradeSize,
            Bound {
                min: Some(10),
                max: Some(5),
            },
        );
        assert_eq!(
            config.validate(),
            Err(VerifierError::InvertedBound {
                symbol: Symbol::TradeSize,
                min: 10,
                max: 5
            })
        );
    }

    #[test]
    fn test_check_count_per_invariant() {
        let config = VerifierConfig {
            exponents: ExponentStrategy::Enumerated(vec![1, 2, 3]),
            mode: VerificationMode::PerInvariant,
            ..VerifierConfig::default()
        };
        assert_eq!(config.check_count(), 15);
    }

    #[test]
    fn test_symbol_names_round_trip() {
        for symbol in Symbol::ALL {
            assert_eq!(Symbol::from_name(symbol.name()), Some(symbol));
        }
        assert_eq!(Symbol::from_name("amount"), None);
    }
}
