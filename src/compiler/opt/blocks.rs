//! Basic Blocks
//!
//! Partitions the flat instruction stream of an _IR_ function into maximal
//! straight-line basic blocks, used by the local optimization passes, and
//! flattens them back once a pass is done.

use crate::Result;
use crate::compiler::ir::{Function, Instruction};
use crate::error::Error;

/// Types of instructions that determine a basic block boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockBoundary {
    /// Ends the current block, after including the instruction.
    Terminator,
    /// Ends the current block and starts a new one with the instruction.
    Label,
    /// Does not affect block boundaries.
    Other,
}

impl Instruction {
    /// Returns the block boundary classification of this instruction.
    #[inline]
    #[must_use]
    pub fn block_boundary(&self) -> BlockBoundary {
        if self.is_label() {
            BlockBoundary::Label
        } else if self.is_terminator() {
            BlockBoundary::Terminator
        } else {
            BlockBoundary::Other
        }
    }
}

/// Sequence of straight-line code.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    /// Position of the block within its function.
    pub id: usize,
    pub instructions: Vec<Instruction>,
}

/// Basic blocks of a single _IR_ function, in program order.
///
/// Derived view over the function's instructions, rebuilt for every pass.
#[derive(Debug, Default)]
pub struct Blocks {
    pub blocks: Vec<Block>,
}

impl Blocks {
    /// Partitions the instructions of `func` into basic blocks.
    ///
    /// A label always closes the current block, even an empty one, so adjacent
    /// labels produce empty blocks which are kept in order.
    ///
    /// # Errors
    ///
    /// Returns an error if an instruction has neither an operation nor a label,
    /// or if the partition does not account for every instruction.
    pub fn partition(func: &Function) -> Result<Self> {
        let mut blocks = Self::default();
        let mut current = vec![];

        for (index, inst) in func.instrs.iter().enumerate() {
            if inst.op.is_none() && inst.label.is_none() {
                return Err(Error::MalformedInstruction {
                    func: func.name.clone(),
                    index,
                    reason: "expected either an operation or a label",
                });
            }

            match inst.block_boundary() {
                BlockBoundary::Terminator => {
                    current.push(inst.clone());
                    blocks.push(std::mem::take(&mut current));
                }
                BlockBoundary::Label => {
                    blocks.push(std::mem::take(&mut current));
                    current.push(inst.clone());
                }
                BlockBoundary::Other => current.push(inst.clone()),
            }
        }

        if !current.is_empty() {
            blocks.push(current);
        }

        let num_block_instructions = blocks.num_instructions();

        if num_block_instructions != func.instrs.len() {
            return Err(Error::InternalInvariantViolation(format!(
                "function '{}' has {} instructions but its basic blocks hold {}",
                func.name,
                func.instrs.len(),
                num_block_instructions
            )));
        }

        Ok(blocks)
    }

    /// Appends a new block holding `instructions`.
    #[inline]
    fn push(&mut self, instructions: Vec<Instruction>) {
        self.blocks.push(Block {
            id: self.blocks.len(),
            instructions,
        });
    }

    /// Returns the total number of instructions across all blocks.
    #[inline]
    #[must_use]
    pub fn num_instructions(&self) -> usize {
        self.blocks.iter().map(|block| block.instructions.len()).sum()
    }

    /// Flattens the basic blocks into a list of instructions, leaving each
    /// block empty.
    #[must_use]
    pub fn flatten(&mut self) -> Vec<Instruction> {
        let mut instructions = Vec::with_capacity(self.num_instructions());

        for block in &mut self.blocks {
            instructions.append(&mut block.instructions);
        }

        instructions
    }

    /// Replaces the instructions of `func` with the flattened blocks.
    #[inline]
    pub fn apply(&mut self, func: &mut Function) {
        func.instrs = self.flatten();
    }
}
