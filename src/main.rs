//! CLI interface to increment or decrement numbers in file names
//!
//! # Example:
//! ```bash
//! numincrement '_(\d+)' shot_009.png shot_010.png --no-act -i
//! numincrement '^([\d.]+)' 1.50_take.wav -d 0.25
//! ```

use clap::Parser;
use numincrement::{app, logging, Args};

fn main() {
    let args = Args::parse();
    logging::tracing_subscribe_boilerplate(logging::verbosity_filter(args.verbose));
    tracing::trace!("Starting up!");

    // per-file failures are already reported; only setup errors end up here
    if let Err(e) = app(&args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
