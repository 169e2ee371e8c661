//! ronda CLI binary.
//!
//! Command-line interface for cross-sectional signal evaluation:
//! long-short backtesting, label-cohort analysis, and market attribution.

mod cmd;
mod data;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use ronda::Horizon;
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "ronda")]
#[command(about = "Cross-sectional signal evaluation and long-short backtesting", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Input tables shared by every subcommand.
#[derive(Args)]
struct InputArgs {
    /// Signal table CSV: date, entity_id, score[, label]
    #[arg(long)]
    signal: PathBuf,

    /// Returns table CSV: date, entity_id, return_1/return_2/return_3/return_7
    #[arg(long)]
    returns: PathBuf,

    /// Delimiter separating label tokens in the signal table
    #[arg(long, default_value = ",")]
    delimiter: char,
}

/// Analysis knobs shared by every subcommand.
#[derive(Args)]
struct EvalArgs {
    /// Forward-return horizons to evaluate
    #[arg(short = 'H', long, value_delimiter = ',', default_values_t = Horizon::ALL)]
    horizons: Vec<Horizon>,

    /// Minimum observations for a cohort or month bucket to count
    #[arg(long, default_value = "15")]
    min_samples: usize,

    /// Correlation method for IC calculations (spearman or pearson)
    #[arg(short, long, default_value = "spearman")]
    method: String,

    /// Output format (text or json)
    #[arg(long, default_value = "text")]
    format: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a long-short backtest across horizons
    Backtest {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        eval: EvalArgs,

        /// Entities per side of the book
        #[arg(short = 'k', long, default_value = "10")]
        basket_size: usize,

        /// Comma-separated basket sizes for a sensitivity grid
        #[arg(long, value_delimiter = ',')]
        grid: Option<Vec<usize>>,

        /// Also print the per-month performance table
        #[arg(long)]
        monthly: bool,
    },

    /// Analyze per-label event cohorts with significance testing
    Cohorts {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        eval: EvalArgs,

        /// Print the rolling Sharpe series for one label
        #[arg(long)]
        rolling_label: Option<String>,

        /// Trailing window in calendar days for rolling statistics
        #[arg(long, default_value = "90")]
        rolling_window: usize,
    },

    /// Attribute cohort and portfolio returns to a market proxy
    Attribution {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        eval: EvalArgs,

        /// Market proxy CSV: date, market_return
        #[arg(long)]
        market: PathBuf,

        /// Also regress the long-short portfolio series with this basket size
        #[arg(short = 'k', long)]
        basket_size: Option<usize>,
    },

    /// Show per-date signal coverage and score dispersion
    Coverage {
        #[command(flatten)]
        input: InputArgs,

        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
}

fn main() {
    init_tracing();
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Backtest {
            input,
            eval,
            basket_size,
            grid,
            monthly,
        } => cmd::backtest::run(&input, &eval, basket_size, grid.as_deref(), monthly),
        Commands::Cohorts {
            input,
            eval,
            rolling_label,
            rolling_window,
        } => cmd::cohorts::run(&input, &eval, rolling_label.as_deref(), rolling_window),
        Commands::Attribution {
            input,
            eval,
            market,
            basket_size,
        } => cmd::attribution::run(&input, &eval, &market, basket_size),
        Commands::Coverage { input, format } => cmd::coverage::run(&input, &format),
    }
}
