//! Compiler Optimization
//!
//! Local optimization of an intermediate representation (_IR_): passes that
//! work on one basic block at a time to reduce redundancy without changing
//! observable behavior.

pub mod blocks;
pub mod passes;

pub use blocks::{Block, Blocks};
