//! Local Value Numbering (LVN)
//!
//! Transforms an intermediate representation (_IR_) by detecting computations
//! repeated within a basic block, replacing them with copies of the variable
//! that first computed the value, and rewriting operands to their canonical
//! variables.
//!
//! Instructions are never removed here. Redundant computations become `id`
//! copies, which dead code elimination can then clean up.

use std::collections::HashMap;

use crate::Result;
use crate::compiler::ir::{Function, Instruction, Literal};
use crate::compiler::opt::{Block, Blocks};
use crate::error::Error;

/// Operations with side-effects or memory aliasing that are emitted unchanged
/// and never numbered.
const EFFECTFUL_OPS: [&str; 6] = ["store", "free", "alloc", "ptradd", "load", "ret"];

/// Operations whose operands are canonicalized but never enter the value table.
const UNNUMBERED_OPS: [&str; 3] = ["print", "br", "jmp"];

/// Canonical form of the value computed by an instruction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ExprKey {
    /// Literal produced by a constant operation.
    Const { op: String, value: Literal },
    /// Operation applied to the value numbers (table rows) of its operands.
    Op {
        op: String,
        funcs: Vec<String>,
        args: Vec<usize>,
    },
    /// Value of a variable defined outside of the block.
    Opaque(String),
}

/// Row of the value table.
#[derive(Debug)]
struct Row {
    key: ExprKey,
    /// Variable holding the value.
    canonical: String,
}

/// Value table for a single basic block.
///
/// Rows are append-only; a row's index is its value number.
#[derive(Debug, Default)]
struct ValueTable {
    rows: Vec<Row>,
    /// Maps each variable to the row of its current value.
    environment: HashMap<String, usize>,
}

impl ValueTable {
    /// Appends a row, returning its value number.
    fn push(&mut self, key: ExprKey, canonical: String) -> usize {
        self.rows.push(Row { key, canonical });
        self.rows.len() - 1
    }

    /// Returns the first row recording exactly `key`.
    #[inline]
    fn lookup(&self, key: &ExprKey) -> Option<usize> {
        // NOTE: O(n) time complexity.
        self.rows.iter().position(|row| row.key == *key)
    }

    #[inline]
    fn canonical(&self, id: usize) -> &str {
        &self.rows[id].canonical
    }

    /// Returns the value number of `var`, recording a self-referential row
    /// when the variable was defined outside of the block.
    fn number_of(&mut self, var: &str) -> usize {
        if let Some(&id) = self.environment.get(var) {
            return id;
        }

        let id = self.push(ExprKey::Opaque(var.to_string()), var.to_string());
        self.environment.insert(var.to_string(), id);

        id
    }

    /// Builds the expression key of an instruction.
    fn expr_key(
        &mut self,
        inst: &Instruction,
        op: &str,
        func: &str,
        index: usize,
    ) -> Result<ExprKey> {
        if op == "const" {
            let Some(value) = inst.value else {
                return Err(Error::MalformedInstruction {
                    func: func.to_string(),
                    index,
                    reason: "constant operation without a value",
                });
            };

            return Ok(ExprKey::Const {
                op: op.to_string(),
                value,
            });
        }

        let args = inst.args().iter().map(|arg| self.number_of(arg)).collect();

        Ok(ExprKey::Op {
            op: op.to_string(),
            funcs: inst.funcs.clone().unwrap_or_default(),
            args,
        })
    }
}

/// Transforms an _IR_ function by numbering the values computed in each of
/// its basic blocks, returning the number of computations replaced by copies.
///
/// # Errors
///
/// Returns an error if the function contains a malformed instruction.
pub fn number_values(func: &mut Function) -> Result<usize> {
    let mut blocks = Blocks::partition(func)?;

    // Offset of the current block within the function, for diagnostics.
    let mut offset = 0;
    let mut rewritten = 0;

    for block in &mut blocks.blocks {
        let len = block.instructions.len();
        rewritten += number_block(block, &func.name, offset)?;
        offset += len;
    }

    blocks.apply(func);

    Ok(rewritten)
}

/// Numbers the values of a single basic block in isolation, replacing its
/// instructions with the rewritten ones.
fn number_block(block: &mut Block, func: &str, offset: usize) -> Result<usize> {
    let mut table = ValueTable::default();
    let mut rewritten = 0;

    let instructions = std::mem::take(&mut block.instructions);
    let mut numbered = Vec::with_capacity(instructions.len());

    for (i, mut inst) in instructions.into_iter().enumerate() {
        let op = match inst.op.as_deref() {
            Some(op) if !EFFECTFUL_OPS.contains(&op) => op.to_string(),
            _ => {
                numbered.push(inst);
                continue;
            }
        };

        let key = table.expr_key(&inst, &op, func, offset + i)?;

        if !UNNUMBERED_OPS.contains(&op.as_str())
            && let Some(dest) = &inst.dest
        {
            let id = match table.lookup(&key) {
                Some(id) => id,
                None => table.push(key.clone(), dest.clone()),
            };

            table.environment.insert(dest.clone(), id);
        }

        // A destination holding a value already computed by another variable
        // becomes a copy of that variable.
        if let Some(dest) = &inst.dest
            && let Some(&id) = table.environment.get(dest)
            && table.canonical(id) != dest
        {
            let src = table.canonical(id).to_string();
            numbered.push(Instruction {
                extra: std::mem::take(&mut inst.extra),
                ..Instruction::copy(dest.clone(), inst.ty.take(), src)
            });
            rewritten += 1;
            continue;
        }

        if let ExprKey::Op { args: ids, .. } = &key
            && let Some(args) = inst.args.as_mut()
        {
            *args = ids
                .iter()
                .map(|&id| table.canonical(id).to_string())
                .collect();
        }

        numbered.push(inst);
    }

    block.instructions = numbered;

    Ok(rewritten)
}
