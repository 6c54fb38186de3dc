//! Module for parsing command-line arguments passed to the optimizer.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Local optimizer for three-address-code programs encoded as JSON.
#[derive(Debug, Parser)]
#[command(name = "lopt", version, about)]
pub struct Args {
    /// Input program (reads `stdin` when omitted or `-`).
    #[arg(value_name = "INPUT")]
    pub in_path: Option<PathBuf>,
    /// Output path for the optimized program (defaults to `stdout`).
    #[arg(short, long = "output", value_name = "PATH")]
    pub out_path: Option<PathBuf>,
    /// Do not run local value numbering.
    #[arg(long)]
    pub skip_lvn: bool,
    /// Do not run dead code elimination.
    #[arg(long)]
    pub skip_dce: bool,
    /// Format of the emitted program.
    #[arg(long, value_enum, default_value_t = Emit::Json)]
    pub emit: Emit,
    /// Print the number of terminator instructions in the input instead of
    /// optimizing it.
    #[arg(long)]
    pub count_terminators: bool,
}

impl Args {
    /// Returns the optimization options selected on the command line.
    #[inline]
    #[must_use]
    pub const fn opts(&self) -> Opts {
        Opts {
            lvn: !self.skip_lvn,
            dce: !self.skip_dce,
        }
    }

    /// Name used as a prefix in error reports.
    #[inline]
    #[must_use]
    pub fn program(&self) -> &'static str {
        env!("CARGO_PKG_NAME")
    }
}

/// Output formats for the optimized program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Emit {
    /// JSON program representation.
    Json,
    /// Human-readable text listing.
    Text,
}

/// Optimization passes to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opts {
    /// Local value numbering (applied once per function).
    pub lvn: bool,
    /// Dead code elimination (iterated to a fixpoint).
    pub dce: bool,
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            lvn: true,
            dce: true,
        }
    }
}

impl Opts {
    /// Returns `true` if at least one optimization pass is enabled.
    #[inline]
    #[must_use]
    pub const fn any_passes_enabled(&self) -> bool {
        self.lvn || self.dce
    }
}
