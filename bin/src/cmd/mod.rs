//! CLI subcommand modules.
//!
//! This module contains the implementations for all ronda CLI subcommands.

pub(crate) mod attribution;
pub(crate) mod backtest;
pub(crate) mod cohorts;
pub(crate) mod coverage;
