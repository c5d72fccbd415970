//! Invariant verification entry point

use anyhow::Result;
use colored::Colorize;
use curve_model::CurveConfig;
use indicatif::{ProgressBar, ProgressStyle};
use proofs_z3::{verify_with, InvariantStatus, Outcome, Report, VerificationMode, VerifierConfig};

/// Run the configured queries, print the verdict and return the exit status
pub fn run_verification(curve: &CurveConfig, settings: &VerifierConfig, json: bool) -> Result<i32> {
    let total = settings.check_count() as u64;
    let progress = if total > 1 && !json {
        let bar = ProgressBar::new(total);
        bar.set_style(
            ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {msg}")?.progress_chars("=> "),
        );
        Some(bar)
    } else {
        None
    };

    let report = verify_with(curve, settings, |check| {
        if let Some(bar) = &progress {
            let k = check
                .exponent
                .map(|k| format!("K={}", k))
                .unwrap_or_else(|| "K free".to_string());
            bar.set_message(k);
            bar.inc(1);
        }
    })?;

    if let Some(bar) = progress {
        bar.finish_and_clear();
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        match report.mode {
            VerificationMode::Joint => println!("{}", report.outcome.message()),
            VerificationMode::PerInvariant => print_statuses(&report),
        }
    }

    Ok(report.exit_code())
}

fn print_statuses(report: &Report) {
    for (invariant, status) in report.invariant_statuses() {
        let label = match status {
            InvariantStatus::Holds => "holds".bright_green(),
            InvariantStatus::Violated => "violated".bright_red(),
            InvariantStatus::Unknown => "unknown".yellow(),
        };
        println!("{:<14} {}", invariant.formula(), label);

        if status == InvariantStatus::Violated {
            let counterexample = report
                .checks
                .iter()
                .find(|c| c.invariant == Some(invariant) && c.outcome == Outcome::Sat)
                .and_then(|c| c.model.as_deref());
            if let Some(model) = counterexample {
                for line in model.lines() {
                    println!("  {} {}", "│".dimmed(), line.dimmed());
                }
            }
        }
    }
}
