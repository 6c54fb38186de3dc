//! Local optimizer (value numbering and dead code elimination) for
//! three-address code programs.

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::use_self)]
#![allow(clippy::redundant_else)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::module_name_repetitions)]
#![warn(rust_2018_idioms)]
#![warn(missing_debug_implementations)]

pub mod args;
pub mod compiler;
pub mod error;

use std::process;

use clap::Parser;

pub type Result<T> = std::result::Result<T, error::Error>;

fn main() {
    env_logger::init();

    let args = args::Args::parse();

    if let Err(err) = compiler::driver::run(&args) {
        report_err!(args.program(), "{err}");
        process::exit(1);
    }
}
