//! Optimizer driver that orchestrates loading a program, running the local
//! optimization passes, and emitting the result.

use std::fs;
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use crate::Result;
use crate::args::{Args, Emit};
use crate::compiler::ir::Program;
use crate::compiler::opt::passes;
use crate::error::Error;

/// Executes the optimization pipeline for the program named in `args`.
///
/// # Errors
///
/// Returns an error if the input cannot be read or decoded, if the program
/// contains a malformed instruction, or if the output cannot be written.
pub fn run(args: &Args) -> Result<()> {
    let mut program = read_program(args.in_path.as_deref())?;

    if args.count_terminators {
        let count = program.count_terminators();
        return write_output(args.out_path.as_deref(), |w| {
            writeln!(w, "terminators: {count}")
        });
    }

    passes::optimize_program(&mut program, &args.opts())?;

    write_output(args.out_path.as_deref(), |w| {
        emit_program(&program, args.emit, w)
    })
}

/// Reads and decodes a program from `path`, or from `stdin` if `path` is
/// `None` or `-`.
///
/// # Errors
///
/// Returns an error if the input cannot be read or is not a valid program.
pub fn read_program(path: Option<&Path>) -> Result<Program> {
    let src = match path {
        Some(path) if path != Path::new("-") => {
            fs::read_to_string(path).map_err(|source| Error::Io {
                path: path.to_path_buf(),
                source,
            })?
        }
        _ => {
            let mut src = String::new();
            io::stdin()
                .lock()
                .read_to_string(&mut src)
                .map_err(|source| Error::Io {
                    path: PathBuf::from("<stdin>"),
                    source,
                })?;
            src
        }
    };

    Ok(serde_json::from_str(&src)?)
}

/// Writes `program` in the requested format.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn emit_program<W: Write>(program: &Program, emit: Emit, mut writer: W) -> io::Result<()> {
    match emit {
        Emit::Json => {
            serde_json::to_writer(&mut writer, program)?;
            writeln!(writer)?;
        }
        Emit::Text => write!(writer, "{program}")?,
    }

    writer.flush()
}

/// Runs `f` against the output file at `path`, or `stdout` if `path` is
/// `None`.
fn write_output<F>(path: Option<&Path>, f: F) -> Result<()>
where
    F: FnOnce(&mut dyn Write) -> io::Result<()>,
{
    let (mut writer, display): (Box<dyn Write>, PathBuf) = match path {
        Some(path) => {
            let file = fs::File::create(path).map_err(|source| Error::Io {
                path: path.to_path_buf(),
                source,
            })?;
            (Box::new(BufWriter::new(file)), path.to_path_buf())
        }
        None => (Box::new(io::stdout().lock()), PathBuf::from("<stdout>")),
    };

    f(writer.as_mut())
        .and_then(|()| writer.flush())
        .map_err(|source| Error::Io {
            path: display,
            source,
        })
}
