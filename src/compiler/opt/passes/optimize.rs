//! Optimization Pipeline
//!
//! Executes the local optimization passes on an intermediate representation
//! (_IR_) program based on user-specified options.

use crate::Result;
use crate::args::Opts;
use crate::compiler::ir::Program;
use crate::compiler::opt::passes::{eliminate_dead_code, number_values};

/// Outcome of optimizing a program.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Summary {
    /// Number of computations replaced by copies during value numbering.
    pub rewritten: usize,
    /// Number of instructions deleted by each dead code elimination round, in
    /// order. The last round deletes nothing.
    pub rounds: Vec<usize>,
}

impl Summary {
    /// Returns the total number of instructions deleted.
    #[inline]
    #[must_use]
    pub fn deleted(&self) -> usize {
        self.rounds.iter().sum()
    }
}

/// Runs the local optimization passes on the given program, according to the
/// specified `opts`.
///
/// Value numbering runs once per function. Dead code elimination then runs
/// over the whole program until a round deletes nothing; every round either
/// deletes an instruction or ends the loop, so it terminates.
///
/// # Errors
///
/// Returns an error if the program contains a malformed instruction.
pub fn optimize_program(program: &mut Program, opts: &Opts) -> Result<Summary> {
    let mut summary = Summary::default();

    if !opts.any_passes_enabled() {
        return Ok(summary);
    }

    if opts.lvn {
        for func in &mut program.functions {
            let rewritten = number_values(func)?;
            log::debug!("lvn: '{}' rewrote {rewritten} instructions", func.name);
            summary.rewritten += rewritten;
        }
    }

    if opts.dce {
        loop {
            let mut deleted = 0;

            for func in &mut program.functions {
                deleted += eliminate_dead_code(func)?;
            }

            log::debug!("dce: round {} deleted {deleted}", summary.rounds.len() + 1);
            summary.rounds.push(deleted);

            if deleted == 0 {
                break;
            }
        }
    }

    log::info!(
        "optimized {} functions: {} rewritten, {} deleted in {} rounds",
        program.functions.len(),
        summary.rewritten,
        summary.deleted(),
        summary.rounds.len()
    );

    Ok(summary)
}
