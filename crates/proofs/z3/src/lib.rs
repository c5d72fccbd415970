//! Z3 proofs for the curve quote invariants
//!
//! The quote formula from `curve_model` is evaluated over unbounded integer
//! solver constants `x, u, U, s, S, L, K` and checked against:
//! - **I1** `out <= x`
//! - **I2** `fee <= x`
//! - **I3** `out + fee == x`
//! - **I4** `out <= L - U`
//! - **I5** `x <= s`
//!
//! The default query is existential: it asks whether one assignment satisfies
//! all five at once, which says nothing about every assignment. The
//! per-invariant mode asserts each negation and reads `Unsat` as "holds for
//! all inputs".

pub mod config;
pub mod error;
pub mod invariants;
pub mod symbolic;
pub mod verifier;

pub use config::{Bound, ExponentStrategy, Symbol, VerificationMode, VerifierConfig};
pub use error::VerifierError;
pub use invariants::Invariant;
pub use verifier::{
    verify, verify_with, Check, InvariantStatus, InvariantVerifier, Outcome, Report,
    SATISFIABLE_MESSAGE, UNSATISFIABLE_MESSAGE,
};
