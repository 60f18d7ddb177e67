//! CLI interface to shift the numbers in file names up or down, keeping their formatting.
//! `009.txt` incremented is `010.txt`; `1.50_a.txt` incremented by `0.25` is `1.75_a.txt`.

pub mod error;
pub mod logging;
pub mod number;
pub mod rename;
pub mod transform;

use std::path::PathBuf;

use clap::Parser;
use error::Result;
use number::Number;
use regex::Regex;
use rename::{Config, ConsoleReport, Mode, Renamer, Staging, Summary};

/// Increment or decrement numbers in file names, selected with Rust Regex Syntax.
///
/// Every capture group of the expression is treated as a number to change.
/// The expression is matched against each file's name only, not its directory.
#[derive(Parser, Debug)]
#[command(version, about, long_about)]
pub struct Args {
    /// (Rust flavor) regex whose capture groups select the numbers to change.
    expression: String,

    /// Files to rename.
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Show renames that would occur, but don't rename files.
    #[arg(short, long)]
    no_act: bool,

    /// Add N to every captured number (default 1).
    #[arg(short, long, value_name = "N", num_args = 0..=1, default_missing_value = "1", allow_negative_numbers = true)]
    #[arg(conflicts_with = "decrement")]
    increment: Option<Number>,

    /// Subtract N from every captured number (default 1).
    #[arg(short, long, value_name = "N", num_args = 0..=1, default_missing_value = "1", allow_negative_numbers = true)]
    decrement: Option<Number>,

    /// How to keep renames within one batch from colliding.
    #[arg(short, long, value_enum, default_value_t = Staging::TwoPhase)]
    staging: Staging,

    /// More log output (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Config {
    /// Pull the run configuration out of parsed arguments.
    pub fn from_args(args: &Args) -> Self {
        let delta = match (args.increment, args.decrement) {
            (Some(n), _) => n,
            (None, Some(n)) => -n.abs(),
            (None, None) => Number::ZERO,
        };
        if delta.is_zero() {
            tracing::warn!("No increment or decrement value provided, file names will not change");
        }
        let mode = if args.no_act { Mode::Preview } else { Mode::Apply };
        Self { delta, mode, staging: args.staging }
    }
}

/// Application code.  (main in lib.rs)
#[tracing::instrument]
pub fn app(args: &Args) -> Result<Summary> {
    let re = Regex::new(&args.expression)?;
    let config = Config::from_args(args);
    let mut report = ConsoleReport;
    Ok(Renamer::new(config, &re, &mut report).run(&args.files))
}
