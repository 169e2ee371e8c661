//! Cohort-analysis command implementation.

use crate::cmd::backtest::fmt_stat;
use crate::{data, EvalArgs, InputArgs};
use anyhow::Result;
use ronda::cohort::CohortMetrics;
use ronda::CohortAnalyzer;

/// Analyze per-label event cohorts for every requested horizon.
pub(crate) fn run(
    input: &InputArgs,
    eval: &EvalArgs,
    rolling_label: Option<&str>,
    rolling_window: usize,
) -> Result<()> {
    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║                     Cohort Analysis                          ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    let store = data::load_store(&input.signal, &input.returns, input.delimiter)?;
    println!(
        "Loaded {} observations across {} dates",
        store.len(),
        store.n_dates()
    );
    println!();

    let config = data::build_config(
        10,
        &eval.horizons,
        eval.min_samples,
        rolling_window,
        &eval.method,
    )?;
    let analyzer = CohortAnalyzer::new(&store, config)?;

    for &horizon in &eval.horizons {
        let report = analyzer.analyze(horizon);

        if eval.format == "json" {
            println!("{}", serde_json::to_string_pretty(&report)?);
            continue;
        }

        println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        println!("COHORTS (horizon = {horizon})");
        println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");

        if report.metrics.is_empty() {
            println!("No cohort met the sample threshold ({}).", eval.min_samples);
            println!();
            continue;
        }

        println!(
            "{:<24} {:>5} {:>9} {:>8} {:>8} {:>8} {:<4} {:>8}",
            "Label", "N", "MeanRet", "Sharpe", "IC", "p-value", "Sig", "AvgMoIC"
        );
        println!("{}", "─".repeat(82));
        for row in &report.metrics {
            print_cohort_row(row);
        }
        println!();

        println!("Tercile mean returns (low / mid / high signal intensity):");
        for row in &report.metrics {
            println!(
                "  {:<24} {:>8} {:>8} {:>8}",
                row.label,
                fmt_stat(row.tercile_returns[0]),
                fmt_stat(row.tercile_returns[1]),
                fmt_stat(row.tercile_returns[2]),
            );
        }
        println!();

        let d = &report.diagnostics;
        if d.dropped_low_samples + d.dropped_nan > 0 {
            println!(
                "Dropped {} of {} labels ({} below sample threshold, {} undefined stats)",
                d.dropped_low_samples + d.dropped_nan,
                d.labels_total,
                d.dropped_low_samples,
                d.dropped_nan
            );
            println!();
        }

        if let Some(label) = rolling_label {
            let series = analyzer.rolling_sharpe(horizon, label);
            println!("Rolling Sharpe for '{label}' ({rolling_window}-day window):");
            if series.is_empty() {
                println!("  Not enough observations for the window.");
            }
            for (date, value) in series {
                println!("  {date} {:>8}", fmt_stat(value));
            }
            println!();
        }
    }

    Ok(())
}

fn print_cohort_row(row: &CohortMetrics) {
    println!(
        "{:<24} {:>5} {:>8.3}% {:>8.3} {:>8} {:>8} {:<4} {:>8}",
        row.label,
        row.n_obs,
        row.mean_ret * 100.0,
        row.sharpe,
        fmt_stat(row.ic),
        fmt_stat(row.p_value),
        row.stars,
        fmt_stat(row.avg_monthly_ic),
    );
}
