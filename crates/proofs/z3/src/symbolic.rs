//! Symbolic evaluation of the curve formula over Z3 terms
//!
//! Sorts follow Z3 arithmetic coercion: `Int / Int` is integer division, and any
//! operation touching a rational (the flat fee, the fixed-point scale) is
//! promoted to `Real`.

use std::cell::RefCell;
use std::convert::Infallible;

use curve_model::{evaluate, CurveConfig, CurveDomain, QuoteBreakdown, SwapParams, BPS_SCALE};
use z3::ast::{Ast, Bool, Int, Real};
use z3::Context;

use crate::config::Symbol;

/// Integer or real solver term
#[derive(Debug, Clone)]
pub enum Term<'ctx> {
    Int(Int<'ctx>),
    Real(Real<'ctx>),
}

impl<'ctx> Term<'ctx> {
    pub fn to_real(&self) -> Real<'ctx> {
        match self {
            Term::Int(i) => i.to_real(),
            Term::Real(r) => r.clone(),
        }
    }

    pub fn le(&self, other: &Term<'ctx>) -> Bool<'ctx> {
        match (self, other) {
            (Term::Int(a), Term::Int(b)) => a.le(b),
            _ => self.to_real().le(&other.to_real()),
        }
    }

    pub fn equals(&self, other: &Term<'ctx>) -> Bool<'ctx> {
        match (self, other) {
            (Term::Int(a), Term::Int(b)) => a._eq(b),
            _ => self.to_real()._eq(&other.to_real()),
        }
    }

    pub fn is_zero(&self, ctx: &'ctx Context) -> Bool<'ctx> {
        match self {
            Term::Int(i) => i._eq(&Int::from_i64(ctx, 0)),
            Term::Real(r) => r._eq(&Real::from_real(ctx, 0, 1)),
        }
    }
}

/// [`CurveDomain`] over Z3 terms.
///
/// Every denominator seen by `div` is recorded so callers can assert the
/// formula is defined.
pub struct Symbolic<'ctx> {
    ctx: &'ctx Context,
    config: CurveConfig,
    denominators: RefCell<Vec<Term<'ctx>>>,
}

impl<'ctx> Symbolic<'ctx> {
    pub fn new(ctx: &'ctx Context, config: CurveConfig) -> Self {
        Self {
            ctx,
            config,
            denominators: RefCell::new(Vec::new()),
        }
    }

    pub fn context(&self) -> &'ctx Context {
        self.ctx
    }

    /// `den != 0` for every division performed so far
    pub fn definedness(&self) -> Vec<Bool<'ctx>> {
        self.denominators
            .borrow()
            .iter()
            .map(|den| den.is_zero(self.ctx).not())
            .collect()
    }

    fn one_like(&self, t: &Term<'ctx>) -> Term<'ctx> {
        match t {
            Term::Int(_) => Term::Int(Int::from_i64(self.ctx, 1)),
            Term::Real(_) => Term::Real(Real::from_real(self.ctx, 1, 1)),
        }
    }
}

impl<'ctx> CurveDomain for Symbolic<'ctx> {
    type Value = Term<'ctx>;
    type Error = Infallible;

    fn unit(&self) -> Term<'ctx> {
        Term::Real(Int::from_u64(self.ctx, self.config.unit).to_real())
    }

    fn base_fee(&self) -> Term<'ctx> {
        Term::Real(Real::from_real(
            self.ctx,
            self.config.base_fee_bps as i32,
            BPS_SCALE as i32,
        ))
    }

    fn add(&self, a: &Term<'ctx>, b: &Term<'ctx>) -> Term<'ctx> {
        match (a, b) {
            (Term::Int(a), Term::Int(b)) => Term::Int(Int::add(self.ctx, &[a, b])),
            _ => Term::Real(Real::add(self.ctx, &[&a.to_real(), &b.to_real()])),
        }
    }

    fn sub(&self, a: &Term<'ctx>, b: &Term<'ctx>) -> Term<'ctx> {
        match (a, b) {
            (Term::Int(a), Term::Int(b)) => Term::Int(Int::sub(self.ctx, &[a, b])),
            _ => Term::Real(Real::sub(self.ctx, &[&a.to_real(), &b.to_real()])),
        }
    }

    fn mul(&self, a: &Term<'ctx>, b: &Term<'ctx>) -> Term<'ctx> {
        match (a, b) {
            (Term::Int(a), Term::Int(b)) => Term::Int(Int::mul(self.ctx, &[a, b])),
            _ => Term::Real(Real::mul(self.ctx, &[&a.to_real(), &b.to_real()])),
        }
    }

    fn div(&self, num: &Term<'ctx>, den: &Term<'ctx>) -> Result<Term<'ctx>, Infallible> {
        self.denominators.borrow_mut().push(den.clone());
        Ok(match (num, den) {
            (Term::Int(a), Term::Int(b)) => Term::Int(Int::div(a, b)),
            _ => Term::Real(Real::div(&num.to_real(), &den.to_real())),
        })
    }

    fn pow(&self, base: &Term<'ctx>, exp: &Term<'ctx>) -> Result<Term<'ctx>, Infallible> {
        // A numeral exponent unrolls into multiplications and stays in the
        // base's sort; a free one needs the solver's real-valued `^`.
        let numeral = match exp {
            Term::Int(k) => k.as_i64().filter(|&k| k >= 0),
            Term::Real(_) => None,
        };
        Ok(match numeral {
            Some(k) => {
                let mut acc = self.one_like(base);
                for _ in 0..k {
                    acc = self.mul(&acc, base);
                }
                acc
            }
            None => Term::Real(Real::power(&base.to_real(), &exp.to_real())),
        })
    }
}

/// Solver constants of one model instance
pub struct Variables<'ctx> {
    pub x: Int<'ctx>,
    pub u: Int<'ctx>,
    pub big_u: Int<'ctx>,
    pub s: Int<'ctx>,
    pub big_s: Int<'ctx>,
    pub l: Int<'ctx>,
    /// `None` when `K` is substituted by a numeral
    pub k: Option<Int<'ctx>>,
}

impl<'ctx> Variables<'ctx> {
    /// Constants plus the exponent term: the free `K`, or the given numeral
    pub fn new(ctx: &'ctx Context, exponent: Option<u32>) -> (Self, Term<'ctx>) {
        let var = |symbol: Symbol| Int::new_const(ctx, symbol.name());
        let (k, exponent) = match exponent {
            Some(value) => (None, Term::Int(Int::from_u64(ctx, value as u64))),
            None => {
                let k = var(Symbol::Exponent);
                (Some(k.clone()), Term::Int(k))
            }
        };
        let vars = Self {
            x: var(Symbol::TradeSize),
            u: var(Symbol::LiabilityLo),
            big_u: var(Symbol::LiabilityHi),
            s: var(Symbol::ReserveLo),
            big_s: var(Symbol::ReserveHi),
            l: var(Symbol::Capacity),
            k,
        };
        (vars, exponent)
    }

    pub fn get(&self, symbol: Symbol) -> Option<&Int<'ctx>> {
        match symbol {
            Symbol::TradeSize => Some(&self.x),
            Symbol::LiabilityLo => Some(&self.u),
            Symbol::LiabilityHi => Some(&self.big_u),
            Symbol::ReserveLo => Some(&self.s),
            Symbol::ReserveHi => Some(&self.big_s),
            Symbol::Capacity => Some(&self.l),
            Symbol::Exponent => self.k.as_ref(),
        }
    }
}

/// The curve formula evaluated over free integer variables
pub struct SymbolicModel<'ctx> {
    pub domain: Symbolic<'ctx>,
    pub vars: Variables<'ctx>,
    pub x: Term<'ctx>,
    pub params: SwapParams<Term<'ctx>>,
    pub quote: QuoteBreakdown<Term<'ctx>>,
}

impl<'ctx> SymbolicModel<'ctx> {
    /// Build the model; `exponent` substitutes `K` by a numeral
    pub fn build(ctx: &'ctx Context, config: CurveConfig, exponent: Option<u32>) -> Self {
        let domain = Symbolic::new(ctx, config);
        let (vars, k) = Variables::new(ctx, exponent);

        let x = Term::Int(vars.x.clone());
        let params = SwapParams::new(
            Term::Int(vars.u.clone()),
            Term::Int(vars.big_u.clone()),
            Term::Int(vars.s.clone()),
            Term::Int(vars.big_s.clone()),
            Term::Int(vars.l.clone()),
            k,
        );

        let quote = match evaluate(&domain, &x, &params) {
            Ok(quote) => quote,
            Err(never) => match never {},
        };

        Self {
            domain,
            vars,
            x,
            params,
            quote,
        }
    }
}
