//! curvecheck CLI - Curve quotes and solver-backed invariant checks
//!
//! `quote` evaluates the bonding curve fee for one trade; `verify` hands the
//! same formula to Z3 and reports whether the quote invariants are
//! satisfiable. Exit status of `verify`: 0 sat, 1 unsat, 2 unknown.

use clap::{Parser, Subcommand};
use colored::Colorize;
use curve_model::SwapParams;
use proofs_z3::{ExponentStrategy, Symbol, VerificationMode};
use std::path::PathBuf;

mod config;
mod quote;
mod verify;

use config::AppConfig;

#[derive(Parser)]
#[command(name = "curvecheck")]
#[command(about = "Bonding curve quotes and invariant verification", long_about = None)]
#[command(version)]
struct Cli {
    /// TOML config file with [curve] and [verifier] sections
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Fixed-point scale (overrides config, default 1e18)
    #[arg(long, global = true)]
    unit: Option<u64>,

    /// Flat fee in basis points (overrides config, default 50)
    #[arg(long, global = true)]
    base_fee_bps: Option<u32>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Quote output and fee for a single trade
    Quote {
        /// Trade size
        #[arg(long = "x", allow_negative_numbers = true)]
        x: f64,

        /// Lower liability bound
        #[arg(long = "u", allow_negative_numbers = true)]
        liability_lo: f64,

        /// Upper liability bound
        #[arg(long = "U", allow_negative_numbers = true)]
        liability_hi: f64,

        /// Lower reserve bound
        #[arg(long = "s", allow_negative_numbers = true)]
        reserve_lo: f64,

        /// Upper reserve bound
        #[arg(long = "S", allow_negative_numbers = true)]
        reserve_hi: f64,

        /// Liability capacity
        #[arg(long = "L", allow_negative_numbers = true)]
        capacity: f64,

        /// Curve exponent (positive integer)
        #[arg(long = "K")]
        exponent: u32,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Check the quote invariants with Z3
    Verify {
        /// Solver timeout in milliseconds
        #[arg(long, conflicts_with = "no_timeout")]
        timeout_ms: Option<u32>,

        /// Let the solver run without a timeout
        #[arg(long)]
        no_timeout: bool,

        /// Enumerate concrete exponents instead of leaving K free (e.g. 1,2,3)
        #[arg(long, value_delimiter = ',')]
        exponents: Vec<u32>,

        /// Check each invariant's negation instead of the joint conjunction
        #[arg(long)]
        per_invariant: bool,

        /// Assert every denominator in the formula is non-zero
        #[arg(long)]
        require_defined: bool,

        /// Pin a symbol to a value (e.g. x=0); repeatable
        #[arg(long, value_parser = parse_pin)]
        pin: Vec<(Symbol, i64)>,

        /// Print the JSON report instead of text
        #[arg(long)]
        json: bool,
    },
}

fn parse_pin(raw: &str) -> Result<(Symbol, i64), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected SYMBOL=VALUE, got `{}`", raw))?;
    let symbol = Symbol::from_name(name.trim())
        .ok_or_else(|| format!("unknown symbol `{}`, expected one of x, u, U, s, S, L, K", name))?;
    let value = value
        .trim()
        .parse::<i64>()
        .map_err(|e| format!("invalid value for {}: {}", symbol, e))?;
    Ok((symbol, value))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    let mut app = AppConfig::load(cli.config.as_deref())?;
    if let Some(unit) = cli.unit {
        app.curve.unit = unit;
    }
    if let Some(bps) = cli.base_fee_bps {
        app.curve.base_fee_bps = bps;
    }

    if cli.verbose {
        eprintln!("{} {}", "Unit:".bright_cyan(), app.curve.unit);
        eprintln!("{} {} bps", "Base Fee:".bright_cyan(), app.curve.base_fee_bps);
    }

    match cli.command {
        Commands::Quote {
            x,
            liability_lo,
            liability_hi,
            reserve_lo,
            reserve_hi,
            capacity,
            exponent,
            json,
        } => {
            let params = SwapParams::new(
                liability_lo,
                liability_hi,
                reserve_lo,
                reserve_hi,
                capacity,
                exponent as f64,
            );
            quote::show_quote(&app.curve, x, params, json)?;
        }
        Commands::Verify {
            timeout_ms,
            no_timeout,
            exponents,
            per_invariant,
            require_defined,
            pin,
            json,
        } => {
            let mut settings = app.verifier;
            if no_timeout {
                settings.timeout_ms = None;
            } else if timeout_ms.is_some() {
                settings.timeout_ms = timeout_ms;
            }
            if !exponents.is_empty() {
                settings.exponents = ExponentStrategy::Enumerated(exponents);
            }
            if per_invariant {
                settings.mode = VerificationMode::PerInvariant;
            }
            if require_defined {
                settings.require_defined = true;
            }
            for (symbol, value) in pin {
                settings = settings.pin(symbol, value);
            }

            let code = verify::run_verification(&app.curve, &settings, json)?;
            std::process::exit(code);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_pin() {
        assert_eq!(parse_pin("x=0"), Ok((Symbol::TradeSize, 0)));
        assert_eq!(parse_pin("U = -5"), Ok((Symbol::LiabilityHi, -5)));
        assert!(parse_pin("amount=1").is_err());
        assert!(parse_pin("x").is_err());
        assert!(parse_pin("x=abc").is_err());
    }

    #[test]
    fn test_quote_args_are_case_sensitive() {
        let cli = Cli::try_parse_from([
            "curvecheck", "quote", "--x", "10", "--u", "0", "--U", "100", "--s", "50", "--S", "200",
            "--L", "1000", "--K", "2",
        ])
        .unwrap();
        match cli.command {
            Commands::Quote {
                x,
                liability_lo,
                liability_hi,
                reserve_lo,
                reserve_hi,
                capacity,
                exponent,
                json,
            } => {
                assert_eq!(x, 10.0);
                assert_eq!(liability_lo, 0.0);
                assert_eq!(liability_hi, 100.0);
                assert_eq!(reserve_lo, 50.0);
                assert_eq!(reserve_hi, 200.0);
                assert_eq!(capacity, 1000.0);
                assert_eq!(exponent, 2);
                assert!(!json);
            }
            _ => panic!("expected quote"),
        }
    }

    #[test]
    fn test_verify_args() {
        let cli = Cli::try_parse_from([
            "curvecheck", "verify", "--exponents", "1,2,3", "--per-invariant", "--pin", "x=0", "--pin",
            "L=1000", "--timeout-ms", "500",
        ])
        .unwrap();
        match cli.command {
            Commands::Verify {
                timeout_ms,
                exponents,
                per_invariant,
                pin,
                ..
            } => {
                assert_eq!(timeout_ms, Some(500));
                assert_eq!(exponents, vec![1, 2, 3]);
                assert!(per_invariant);
                assert_eq!(pin, vec![(Symbol::TradeSize, 0), (Symbol::Capacity, 1000)]);
            }
            _ => panic!("expected verify"),
        }
    }
}
