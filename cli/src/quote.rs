//! Single swap quote

use anyhow::{Context, Result};
use colored::Colorize;
use curve_model::{quote_detailed, CurveConfig, QuoteBreakdown, SwapParams};
use serde::Serialize;

#[derive(Serialize)]
struct QuoteOutput<'a> {
    x: f64,
    params: &'a SwapParams<f64>,
    config: &'a CurveConfig,
    quote: QuoteBreakdown<f64>,
}

pub fn show_quote(config: &CurveConfig, x: f64, params: SwapParams<f64>, json: bool) -> Result<()> {
    let quote = quote_detailed(x, &params, config)
        .with_context(|| format!("Quote undefined for x={} with {:?}", x, params))?;

    if json {
        let output = QuoteOutput {
            x,
            params: &params,
            config,
            quote,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("{}", "=== Curve Quote ===".bright_green().bold());
    println!("{} {}", "Trade Size:".bright_cyan(), x);
    println!(
        "{} u={} U={} s={} S={} L={} K={}",
        "Params:".bright_cyan(),
        params.liability_lo,
        params.liability_hi,
        params.reserve_lo,
        params.reserve_hi,
        params.capacity,
        params.exponent
    );
    println!(
        "{} unit={} base_fee={}",
        "Config:".bright_cyan(),
        config.unit,
        config.base_fee()
    );

    println!("\n{} {}", "Out:".bright_cyan(), quote.out);
    println!("{} {}", "Fee:".bright_cyan(), quote.fee);
    println!("  {} flat  {}", "├─".dimmed(), quote.flat_fee);
    println!("  {} curve {}", "└─".dimmed(), quote.curve_fee);

    Ok(())
}
