//! Optimizer errors and a macro for reporting them.

use std::io;
use std::path::PathBuf;

/// Errors raised while loading, optimizing, or writing a program.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Instruction that cannot be interpreted (e.g., neither an operation nor a
    /// label).
    #[error("malformed instruction #{index} in function '{func}': {reason}")]
    MalformedInstruction {
        func: String,
        index: usize,
        reason: &'static str,
    },
    /// Internal consistency check failed. Indicates a bug in the optimizer.
    #[error("internal invariant violated: {0}")]
    InternalInvariantViolation(String),
    #[error("failed to access '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid program: {0}")]
    Json(#[from] serde_json::Error),
}

/// Report a generic error message, printing to `stderr`.
#[macro_export]
macro_rules! report_err {
    ($program:expr, $($arg:tt)+) => {{
        eprintln!("\x1b[1;1m{}\x1b[0m: \x1b[1;31merror:\x1b[0m {}", $program, format!($($arg)+));
    }};
}
