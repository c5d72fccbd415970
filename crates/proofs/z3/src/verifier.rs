//! Solver-backed invariant verification
//!
//! A single check moves through `Uninitialized -> ConstraintsAsserted ->
//! {Sat, Unsat, Unknown}`; the type parameter of [`InvariantVerifier`] tracks
//! the first two states so a solver can only be queried once constraints are in.

use std::marker::PhantomData;

use curve_model::CurveConfig;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use z3::ast::{Bool, Int};
use z3::{Config, Context, Params, SatResult, Solver};

use crate::config::{Symbol, VerificationMode, VerifierConfig, MAX_ENUMERATED_EXPONENT};
use crate::error::VerifierError;
use crate::invariants::Invariant;
use crate::symbolic::SymbolicModel;

pub const SATISFIABLE_MESSAGE: &str =
    "Invariants are satisfiable. Function behaves as expected under these conditions.";

pub const UNSATISFIABLE_MESSAGE: &str =
    "Invariants are not satisfiable. Function may have an issue or the model may need refinement.";

/// Solver verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Sat,
    Unsat,
    Unknown,
}

impl Outcome {
    /// Process exit status: `Sat -> 0`, `Unsat -> 1`, `Unknown -> 2`
    pub fn exit_code(&self) -> i32 {
        match self {
            Outcome::Sat => 0,
            Outcome::Unsat => 1,
            Outcome::Unknown => 2,
        }
    }

    /// Line printed for a joint check; anything but `Sat` reads as not satisfiable
    pub fn message(&self) -> &'static str {
        match self {
            Outcome::Sat => SATISFIABLE_MESSAGE,
            Outcome::Unsat | Outcome::Unknown => UNSATISFIABLE_MESSAGE,
        }
    }

    /// Existential aggregate over several runs: one `Sat` suffices, `Unsat`
    /// needs every run to be `Unsat`
    pub fn any_sat<I: IntoIterator<Item = Outcome>>(outcomes: I) -> Outcome {
        let mut all_unsat = true;
        for outcome in outcomes {
            match outcome {
                Outcome::Sat => return Outcome::Sat,
                Outcome::Unsat => {}
                Outcome::Unknown => all_unsat = false,
            }
        }
        if all_unsat {
            Outcome::Unsat
        } else {
            Outcome::Unknown
        }
    }
}

impl From<SatResult> for Outcome {
    fn from(result: SatResult) -> Self {
        match result {
            SatResult::Sat => Outcome::Sat,
            SatResult::Unsat => Outcome::Unsat,
            SatResult::Unknown => Outcome::Unknown,
        }
    }
}

/// Result of one solver query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Check {
    /// Invariant whose negation was asserted; `None` for the joint query
    pub invariant: Option<Invariant>,

    /// Concrete `K` of this run; `None` when `K` was free
    pub exponent: Option<u32>,

    pub outcome: Outcome,

    /// Satisfying assignment, when the solver produced one
    pub model: Option<String>,

    /// Solver's explanation for `Unknown`
    pub reason_unknown: Option<String>,
}

/// Status of an invariant under the per-invariant check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvariantStatus {
    /// Negation is unsatisfiable for every exponent
    Holds,
    /// Some assignment violates it
    Violated,
    Unknown,
}

impl From<Outcome> for InvariantStatus {
    fn from(negation: Outcome) -> Self {
        match negation {
            Outcome::Sat => InvariantStatus::Violated,
            Outcome::Unsat => InvariantStatus::Holds,
            Outcome::Unknown => InvariantStatus::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub mode: VerificationMode,

    /// Joint: aggregate of the joint queries. Per-invariant: aggregate of the
    /// negation queries, so `Unsat` means every invariant holds.
    pub outcome: Outcome,

    pub checks: Vec<Check>,
}

impl Report {
    fn new(mode: VerificationMode, checks: Vec<Check>) -> Self {
        let outcome = Outcome::any_sat(checks.iter().map(|c| c.outcome));
        Self {
            mode,
            outcome,
            checks,
        }
    }

    /// Aggregate status per invariant (per-invariant mode only)
    pub fn invariant_statuses(&self) -> Vec<(Invariant, InvariantStatus)> {
        Invariant::ALL
            .iter()
            .filter_map(|&inv| {
                let outcomes: Vec<Outcome> = self
                    .checks
                    .iter()
                    .filter(|c| c.invariant == Some(inv))
                    .map(|c| c.outcome)
                    .collect();
                if outcomes.is_empty() {
                    return None;
                }
                Some((inv, Outcome::any_sat(outcomes).into()))
            })
            .collect()
    }

    /// Exit status: joint maps the outcome directly; per-invariant exits 0
    /// when every invariant holds, 1 when one is violated, 2 otherwise
    pub fn exit_code(&self) -> i32 {
        match self.mode {
            VerificationMode::Joint => self.outcome.exit_code(),
            VerificationMode::PerInvariant => match self.outcome {
                Outcome::Unsat => 0,
                Outcome::Sat => 1,
                Outcome::Unknown => 2,
            },
        }
    }
}

pub struct Uninitialized;
pub struct ConstraintsAsserted;

/// One solver query over one symbolic model
pub struct InvariantVerifier<'ctx, State> {
    solver: Solver<'ctx>,
    model: SymbolicModel<'ctx>,
    exponent: Option<u32>,
    invariant: Option<Invariant>,
    _state: PhantomData<State>,
}

impl<'ctx> InvariantVerifier<'ctx, Uninitialized> {
    /// Build the symbolic model and a solver carrying the configured timeout,
    /// bounds and (optionally) definedness conditions
    ///
    /// A concrete `exponent` must lie in `1..=MAX_ENUMERATED_EXPONENT` and
    /// cannot be combined with a bound on `K`.
    pub fn new(
        ctx: &'ctx Context,
        curve: &CurveConfig,
        settings: &VerifierConfig,
        exponent: Option<u32>,
    ) -> Result<Self, VerifierError> {
        settings.validate()?;
        if let Some(k) = exponent {
            if k == 0 || k > MAX_ENUMERATED_EXPONENT {
                return Err(VerifierError::InvalidExponent(k));
            }
            if settings.bounds.contains_key(&Symbol::Exponent) {
                return Err(VerifierError::ExponentBoundWithEnumeration);
            }
        }

        let model = SymbolicModel::build(ctx, *curve, exponent);
        let solver = Solver::new(ctx);

        if let Some(timeout_ms) = settings.timeout_ms {
            let mut params = Params::new(ctx);
            params.set_u32("timeout", timeout_ms);
            solver.set_params(&params);
        }

        for (symbol, bound) in &settings.bounds {
            // Only K can lack a constant, and that case was rejected above
            let Some(var) = model.vars.get(*symbol) else {
                continue;
            };
            if let Some(min) = bound.min {
                solver.assert(&var.ge(&Int::from_i64(ctx, min)));
            }
            if let Some(max) = bound.max {
                solver.assert(&var.le(&Int::from_i64(ctx, max)));
            }
        }

        if settings.require_defined {
            for condition in model.domain.definedness() {
                solver.assert(&condition);
            }
        }

        Ok(Self {
            solver,
            model,
            exponent,
            invariant: None,
            _state: PhantomData,
        })
    }

    /// Assert all five invariants jointly
    pub fn assert_invariants(self) -> InvariantVerifier<'ctx, ConstraintsAsserted> {
        let ctx = self.model.domain.context();
        let constraints: Vec<Bool<'ctx>> = Invariant::ALL
            .iter()
            .map(|inv| {
                debug!("asserting {}", inv.formula());
                inv.constraint(&self.model)
            })
            .collect();
        let refs: Vec<&Bool<'ctx>> = constraints.iter().collect();
        self.solver.assert(&Bool::and(ctx, &refs));
        self.into_asserted(None)
    }

    /// Assert the negation of a single invariant
    pub fn assert_violation(self, invariant: Invariant) -> InvariantVerifier<'ctx, ConstraintsAsserted> {
        debug!("asserting not ({})", invariant.formula());
        self.solver.assert(&invariant.constraint(&self.model).not());
        self.into_asserted(Some(invariant))
    }

    fn into_asserted(self, invariant: Option<Invariant>) -> InvariantVerifier<'ctx, ConstraintsAsserted> {
        InvariantVerifier {
            solver: self.solver,
            model: self.model,
            exponent: self.exponent,
            invariant,
            _state: PhantomData,
        }
    }
}

impl<'ctx> InvariantVerifier<'ctx, ConstraintsAsserted> {
    /// Query the solver; timeouts and undecidable queries come back as `Unknown`
    pub fn check(self) -> Check {
        let outcome = Outcome::from(self.solver.check());
        let model = match outcome {
            Outcome::Sat => self.solver.get_model().map(|m| m.to_string()),
            _ => None,
        };
        let reason_unknown = match outcome {
            Outcome::Unknown => self.solver.get_reason_unknown(),
            _ => None,
        };

        match (&self.invariant, outcome) {
            (_, Outcome::Unknown) => warn!(
                "solver returned unknown (K={}): {}",
                exponent_label(self.exponent),
                reason_unknown.as_deref().unwrap_or("no reason given")
            ),
            (Some(inv), outcome) => info!(
                "not ({}) with K={}: {:?}",
                inv.formula(),
                exponent_label(self.exponent),
                outcome
            ),
            (None, outcome) => info!(
                "joint invariants with K={}: {:?}",
                exponent_label(self.exponent),
                outcome
            ),
        }

        Check {
            invariant: self.invariant,
            exponent: self.exponent,
            outcome,
            model,
            reason_unknown,
        }
    }
}

fn exponent_label(exponent: Option<u32>) -> String {
    match exponent {
        Some(k) => k.to_string(),
        None => "free".to_string(),
    }
}

/// Run every query `settings` asks for
pub fn verify(curve: &CurveConfig, settings: &VerifierConfig) -> Result<Report, VerifierError> {
    verify_with(curve, settings, |_| {})
}

/// Same as [`verify`], calling `on_check` after each solver query
pub fn verify_with<F>(
    curve: &CurveConfig,
    settings: &VerifierConfig,
    mut on_check: F,
) -> Result<Report, VerifierError>
where
    F: FnMut(&Check),
{
    settings.validate()?;

    let mut cfg = Config::new();
    cfg.set_model_generation(true);
    let ctx = Context::new(&cfg);

    let mut checks = Vec::with_capacity(settings.check_count());
    for exponent in settings.exponent_cases() {
        match settings.mode {
            VerificationMode::Joint => {
                let check = InvariantVerifier::new(&ctx, curve, settings, exponent)?
                    .assert_invariants()
                    .check();
                on_check(&check);
                checks.push(check);
            }
            VerificationMode::PerInvariant => {
                for invariant in Invariant::ALL {
                    let check = InvariantVerifier::new(&ctx, curve, settings, exponent)?
                        .assert_violation(invariant)
                        .check();
                    on_check(&check);
                    checks.push(check);
                }
            }
        }
    }

    Ok(Report::new(settings.mode, checks))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExponentStrategy;

    #[test]
    fn test_any_sat_aggregation() {
        use Outcome::*;
        assert_eq!(Outcome::any_sat([Unsat, Sat, Unknown]), Sat);
        assert_eq!(Outcome::any_sat([Unsat, Unsat]), Unsat);
        assert_eq!(Outcome::any_sat([Unsat, Unknown]), Unknown);
        assert_eq!(Outcome::any_sat([]), Unsat);
    }

    #[test]
    fn test_exit_codes_and_messages() {
        assert_eq!(Outcome::Sat.exit_code(), 0);
        assert_eq!(Outcome::Unsat.exit_code(), 1);
        assert_eq!(Outcome::Unknown.exit_code(), 2);
        assert_eq!(Outcome::Sat.message(), SATISFIABLE_MESSAGE);
        assert_eq!(Outcome::Unsat.message(), UNSATISFIABLE_MESSAGE);
        assert_eq!(Outcome::Unknown.message(), UNSATISFIABLE_MESSAGE);
    }

    #[test]
    fn test_per_invariant_report_statuses() {
        let check = |invariant, exponent, outcome| Check {
            invariant: Some(invariant),
            exponent: Some(exponent),
            outcome,
            model: None,
            reason_unknown: None,
        };
        let report = Report::new(
            VerificationMode::PerInvariant,
            vec![
                check(Invariant::Conservation, 1, Outcome::Unsat),
                check(Invariant::Conservation, 2, Outcome::Unsat),
                check(Invariant::TradeWithinReserve, 1, Outcome::Unsat),
                check(Invariant::TradeWithinReserve, 2, Outcome::Sat),
                check(Invariant::OutWithinTrade, 1, Outcome::Unknown),
            ],
        );
        assert_eq!(
            report.invariant_statuses(),
            vec![
                (Invariant::OutWithinTrade, InvariantStatus::Unknown),
                (Invariant::Conservation, InvariantStatus::Holds),
                (Invariant::TradeWithinReserve, InvariantStatus::Violated),
            ]
        );
        assert_eq!(report.outcome, Outcome::Sat);
        assert_eq!(report.exit_code(), 1);
    }

    #[test]
    fn test_new_rejects_exponent_bound_with_concrete_exponent() {
        let ctx = Context::new(&Config::new());
        let settings = VerifierConfig::default().pin(Symbol::Exponent, 3);
        let result = InvariantVerifier::new(&ctx, &CurveConfig::default(), &settings, Some(2));
        assert!(matches!(result, Err(VerifierError::ExponentBoundWithEnumeration)));

        // The same bound is kept when K stays free
        assert!(InvariantVerifier::new(&ctx, &CurveConfig::default(), &settings, None).is_ok());
    }

    #[test]
    fn test_new_rejects_out_of_range_exponent() {
        let ctx = Context::new(&Config::new());
        let settings = VerifierConfig::default();
        for k in [0, MAX_ENUMERATED_EXPONENT + 1] {
            let result = InvariantVerifier::new(&ctx, &CurveConfig::default(), &settings, Some(k));
            assert!(matches!(result, Err(VerifierError::InvalidExponent(v)) if v == k));
        }
    }

    #[test]
    fn test_new_validates_settings() {
        let ctx = Context::new(&Config::new());
        let settings = VerifierConfig {
            exponents: ExponentStrategy::Enumerated(vec![]),
            ..VerifierConfig::default()
        };
        let result = InvariantVerifier::new(&ctx, &CurveConfig::default(), &settings, None);
        assert!(matches!(result, Err(VerifierError::EmptyExponentSet)));
    }
}
