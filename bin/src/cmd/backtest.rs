//! Backtest command implementation.

use crate::{data, EvalArgs, InputArgs};
use anyhow::Result;
use ronda::eval::MonthlyPerf;
use ronda::{Backtest, PerformanceSummary};

/// Run the long-short backtest and print one summary row per
/// (basket size × horizon) configuration.
pub(crate) fn run(
    input: &InputArgs,
    eval: &EvalArgs,
    basket_size: usize,
    grid: Option<&[usize]>,
    monthly: bool,
) -> Result<()> {
    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║                   Long-Short Backtest                        ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    let store = data::load_store(&input.signal, &input.returns, input.delimiter)?;
    println!(
        "Loaded {} observations across {} dates",
        store.len(),
        store.n_dates()
    );
    let diag = store.diagnostics();
    let dropped = diag.dropped_missing_key + diag.dropped_bad_score + diag.dropped_duplicate_key;
    if dropped > 0 {
        println!(
            "Dropped {} rows ({} missing key, {} bad score, {} duplicate key)",
            dropped, diag.dropped_missing_key, diag.dropped_bad_score, diag.dropped_duplicate_key
        );
    }
    println!();

    let config = data::build_config(
        basket_size,
        &eval.horizons,
        eval.min_samples,
        90,
        &eval.method,
    )?;
    let backtest = Backtest::new(&store, config)?;

    let report = match grid {
        Some(sizes) => backtest.run_grid(sizes)?,
        None => backtest.run(),
    };

    if eval.format == "json" {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("BACKTEST RESULTS");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");

    println!(
        "{:<8} {:>4} {:>6} {:>9} {:>8} {:>8} {:>7} {:>9} {:>9} {:>9}",
        "Horizon", "K", "Days", "MeanRet", "Sharpe", "IC", "WinRate", "Turnover", "MaxDD", "CumRet"
    );
    println!("{}", "─".repeat(88));
    for summary in &report.summaries {
        print_summary_row(summary);
    }
    println!();
    println!(
        "Traded {} dates, skipped {} (no tradable basket)",
        report.diagnostics.dates_traded, report.diagnostics.dates_skipped
    );
    println!();

    if monthly {
        for summary in &report.summaries {
            println!(
                "Monthly performance ({}, K={}):",
                summary.horizon, summary.basket_size
            );
            println!(
                "{:<9} {:>9} {:>9} {:>6} {:>8}",
                "Month", "MeanRet", "StdRet", "Days", "Sharpe"
            );
            println!("{}", "─".repeat(46));
            for row in backtest.monthly_performance(summary.horizon, summary.basket_size) {
                print_monthly_row(&row);
            }
            println!();
        }
    }

    Ok(())
}

fn print_summary_row(s: &PerformanceSummary) {
    println!(
        "{:<8} {:>4} {:>6} {:>8.3}% {:>8} {:>8} {:>6.1}% {:>9.2} {:>8.2}% {:>8.2}%",
        s.horizon.to_string(),
        s.basket_size,
        s.n_days,
        s.mean_return * 100.0,
        fmt_stat(s.sharpe),
        fmt_stat(s.ic),
        s.win_rate * 100.0,
        s.avg_turnover,
        s.max_drawdown * 100.0,
        s.cumulative_return * 100.0,
    );
}

fn print_monthly_row(row: &MonthlyPerf) {
    println!(
        "{:<9} {:>8.3}% {:>8.3}% {:>6} {:>8}",
        row.month.to_string(),
        row.mean * 100.0,
        row.std * 100.0,
        row.count,
        fmt_stat(row.sharpe),
    );
}

/// Format a statistic that may be undefined.
pub(crate) fn fmt_stat(value: f64) -> String {
    if value.is_finite() {
        format!("{value:.4}")
    } else {
        "N/A".to_string()
    }
}
