//! Signal-coverage command implementation.

use crate::{data, InputArgs};
use anyhow::Result;
use ronda::{Backtest, EvalConfig};
use serde_json::json;

/// Print per-date cross-section size and score dispersion.
pub(crate) fn run(input: &InputArgs, format: &str) -> Result<()> {
    let store = data::load_store(&input.signal, &input.returns, input.delimiter)?;
    let backtest = Backtest::new(&store, EvalConfig::default())?;
    let coverage = backtest.signal_coverage();

    if format == "json" {
        let rows: Vec<_> = coverage
            .iter()
            .map(|(date, n, dispersion)| {
                json!({
                    "date": date.to_string(),
                    "n_entities": n,
                    "score_dispersion": dispersion,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║                    Signal Coverage                           ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("{:<12} {:>9} {:>12}", "Date", "Entities", "Dispersion");
    println!("{}", "─".repeat(36));
    for (date, n, dispersion) in &coverage {
        if dispersion.is_finite() {
            println!("{:<12} {:>9} {:>12.4}", date.to_string(), n, dispersion);
        } else {
            println!("{:<12} {:>9} {:>12}", date.to_string(), n, "N/A");
        }
    }
    println!();

    Ok(())
}
