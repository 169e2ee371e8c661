//! Market-attribution command implementation.

use crate::cmd::backtest::fmt_stat;
use crate::{data, EvalArgs, InputArgs};
use anyhow::Result;
use ronda::{attribute_cohorts, attribute_series, Attribution, Backtest};
use std::path::Path;

/// Regress cohort returns (and optionally the long-short portfolio series)
/// against a market proxy.
pub(crate) fn run(
    input: &InputArgs,
    eval: &EvalArgs,
    market_path: &Path,
    basket_size: Option<usize>,
) -> Result<()> {
    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║                   Market Attribution                         ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    let store = data::load_store(&input.signal, &input.returns, input.delimiter)?;
    let market = data::load_market(market_path)?;
    println!(
        "Loaded {} observations across {} dates, {} market dates",
        store.len(),
        store.n_dates(),
        market.len()
    );
    println!();

    let config = data::build_config(
        basket_size.unwrap_or(10),
        &eval.horizons,
        eval.min_samples,
        90,
        &eval.method,
    )?;

    for &horizon in &eval.horizons {
        let rows = attribute_cohorts(&store, horizon, &market, &config)?;

        if eval.format == "json" {
            println!("{}", serde_json::to_string_pretty(&rows)?);
        } else {
            println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
            println!("COHORT ATTRIBUTION (horizon = {horizon})");
            println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");

            if rows.is_empty() {
                println!("No cohort had enough matched market dates.");
                println!();
            } else {
                print_attribution_table(&rows);
            }
        }

        if let Some(k) = basket_size {
            let backtest = Backtest::new(&store, config.clone())?;
            let series = backtest.ls_series(horizon, k);
            match attribute_series("long-short", &series, &market, eval.min_samples) {
                Some(row) => {
                    if eval.format == "json" {
                        println!("{}", serde_json::to_string_pretty(&row)?);
                    } else {
                        println!("Portfolio attribution (K={k}):");
                        print_attribution_table(std::slice::from_ref(&row));
                    }
                }
                None => {
                    println!(
                        "Portfolio series has too few matched market dates (need {}).",
                        eval.min_samples
                    );
                    println!();
                }
            }
        }
    }

    Ok(())
}

fn print_attribution_table(rows: &[Attribution]) {
    println!(
        "{:<24} {:>5} {:>10} {:>8} {:>8}",
        "Label", "N", "Alpha", "Beta", "R²"
    );
    println!("{}", "─".repeat(60));
    for row in rows {
        println!(
            "{:<24} {:>5} {:>9.4}% {:>8.3} {:>8}",
            row.label,
            row.n_obs,
            row.alpha * 100.0,
            row.beta,
            fmt_stat(row.r_squared),
        );
    }
    println!();
}
