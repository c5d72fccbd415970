//! Safety invariants of the curve quote
//!
//! - **I1: Out Within Trade** - `out <= x`
//! - **I2: Fee Within Trade** - `fee <= x`
//! - **I3: Conservation** - `out + fee == x`
//! - **I4: Out Within Headroom** - `out <= L - U`
//! - **I5: Trade Within Reserve** - `x <= s`

use curve_model::CurveDomain;
use serde::{Deserialize, Serialize};
use z3::ast::Bool;

use crate::symbolic::SymbolicModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Invariant {
    OutWithinTrade,
    FeeWithinTrade,
    Conservation,
    OutWithinHeadroom,
    TradeWithinReserve,
}

impl Invariant {
    pub const ALL: [Invariant; 5] = [
        Invariant::OutWithinTrade,
        Invariant::FeeWithinTrade,
        Invariant::Conservation,
        Invariant::OutWithinHeadroom,
        Invariant::TradeWithinReserve,
    ];

    pub fn formula(&self) -> &'static str {
        match self {
            Invariant::OutWithinTrade => "out <= x",
            Invariant::FeeWithinTrade => "fee <= x",
            Invariant::Conservation => "out + fee == x",
            Invariant::OutWithinHeadroom => "out <= L - U",
            Invariant::TradeWithinReserve => "x <= s",
        }
    }

    pub fn constraint<'ctx>(&self, model: &SymbolicModel<'ctx>) -> Bool<'ctx> {
        let d = &model.domain;
        let q = &model.quote;
        let p = &model.params;
        match self {
            Invariant::OutWithinTrade => q.out.le(&model.x),
            Invariant::FeeWithinTrade => q.fee.le(&model.x),
            Invariant::Conservation => d.add(&q.out, &q.fee).equals(&model.x),
            Invariant::OutWithinHeadroom => q.out.le(&d.sub(&p.capacity, &p.liability_hi)),
            Invariant::TradeWithinReserve => model.x.le(&p.reserve_lo),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use curve_model::CurveConfig;
    use z3::{Config, Context, SatResult, Solver};

    #[test]
    fn test_conservation_holds_for_every_assignment() {
        let ctx = Context::new(&Config::new());
        let model = SymbolicModel::build(&ctx, CurveConfig::default(), Some(2));
        let solver = Solver::new(&ctx);
        solver.assert(&Invariant::Conservation.constraint(&model).not());
        assert_eq!(solver.check(), SatResult::Unsat);
    }

    #[test]
    fn test_trade_within_reserve_can_be_violated() {
        let ctx = Context::new(&Config::new());
        let model = SymbolicModel::build(&ctx, CurveConfig::default(), Some(1));
        let solver = Solver::new(&ctx);
        solver.assert(&Invariant::TradeWithinReserve.constraint(&model).not());
        assert_eq!(solver.check(), SatResult::Sat);
    }

    #[test]
    fn test_formulas_are_distinct() {
        let formulas: std::collections::HashSet<_> =
            Invariant::ALL.iter().map(|i| i.formula()).collect();
        assert_eq!(formulas.len(), Invariant::ALL.len());
    }
}
