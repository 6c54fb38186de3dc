//! Dead Code Elimination (DCE)
//!
//! Transforms an intermediate representation (_IR_) by removing definitions
//! that are overwritten, within the same basic block, before ever being read.
//!
//! Definitions still pending at the end of a block are always kept, since a
//! later block may read them.

use std::collections::{HashMap, HashSet};

use crate::Result;
use crate::compiler::ir::Function;
use crate::compiler::opt::{Block, Blocks};

/// Removes the dead definitions of a single _IR_ function, returning the
/// number of instructions deleted.
///
/// # Errors
///
/// Returns an error if the function contains a malformed instruction.
pub fn eliminate_dead_code(func: &mut Function) -> Result<usize> {
    let mut blocks = Blocks::partition(func)?;

    let mut deleted = 0;

    for block in &mut blocks.blocks {
        let n = eliminate_block(block);

        if n > 0 {
            log::trace!("dce: '{}' block {} deleted {n}", func.name, block.id);
        }

        deleted += n;
    }

    blocks.apply(func);

    Ok(deleted)
}

/// Removes the dead definitions of a single basic block, returning the number
/// of instructions deleted.
fn eliminate_block(block: &mut Block) -> usize {
    let removable = {
        // Maps each variable to the position of its latest definition which
        // has not been read yet.
        let mut definitions: HashMap<&str, usize> = HashMap::new();
        let mut removable = HashSet::new();

        for (i, inst) in block.instructions.iter().enumerate() {
            for arg in inst.args() {
                definitions.remove(arg.as_str());
            }

            if let Some(dest) = inst.dest.as_deref()
                && let Some(prev) = definitions.insert(dest, i)
            {
                // Overwritten without an intervening read.
                removable.insert(prev);
            }
        }

        removable
    };

    if removable.is_empty() {
        return 0;
    }

    let mut i = 0;
    block.instructions.retain(|_| {
        let keep = !removable.contains(&i);
        i += 1;
        keep
    });

    removable.len()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    use super::*;
    use crate::compiler::ir::Instruction;
    use crate::compiler::ir::testing::*;

    fn eliminate(instrs: Vec<Instruction>) -> (Vec<Instruction>, usize) {
        let mut func = function("main", instrs);
        let deleted = eliminate_dead_code(&mut func).expect("elimination should succeed");
        (func.instrs, deleted)
    }

    #[test]
    fn dce_overwritten_definition_is_deleted() {
        let (instrs, deleted) = eliminate(vec![
            constant("x", 1),
            constant("x", 2),
            effect("print", &["x"]),
        ]);

        assert_eq!(deleted, 1);
        assert_eq!(instrs, vec![constant("x", 2), effect("print", &["x"])]);
    }

    #[test]
    fn dce_read_definition_survives() {
        let instrs = vec![
            constant("x", 1),
            value("add", "x", &["x", "x"]),
            effect("print", &["x"]),
        ];

        let (eliminated, deleted) = eliminate(instrs.clone());

        assert_eq!(deleted, 0);
        assert_eq!(eliminated, instrs);
    }

    #[test]
    fn dce_unused_definition_at_block_end_survives() {
        let instrs = vec![constant("a", 1), constant("b", 2), constant("c", 3)];

        let (eliminated, deleted) = eliminate(instrs.clone());

        assert_eq!(deleted, 0);
        assert_eq!(eliminated, instrs);
    }

    #[test]
    fn dce_redefinition_across_blocks_survives() {
        let instrs = vec![
            constant("x", 1),
            jump("next"),
            label("next"),
            constant("x", 2),
            effect("print", &["x"]),
        ];

        let (eliminated, deleted) = eliminate(instrs.clone());

        assert_eq!(deleted, 0);
        assert_eq!(eliminated, instrs);
    }

    #[test]
    fn dce_chain_of_overwrites() {
        let (instrs, deleted) = eliminate(vec![
            constant("x", 1),
            constant("x", 2),
            constant("x", 3),
            effect("print", &["x"]),
        ]);

        assert_eq!(deleted, 2);
        assert_eq!(instrs, vec![constant("x", 3), effect("print", &["x"])]);
    }

    #[test]
    fn dce_identical_instructions_are_removed_by_position() {
        // Only the first of two identical definitions is dead.
        let (instrs, deleted) = eliminate(vec![
            constant("x", 1),
            constant("x", 1),
            effect("print", &["x"]),
        ]);

        assert_eq!(deleted, 1);
        assert_eq!(instrs, vec![constant("x", 1), effect("print", &["x"])]);
    }

    #[test]
    fn dce_deletion_exposes_more_dead_code() {
        let mut func = function(
            "main",
            vec![
                constant("x", 0),
                value("add", "y", &["x", "x"]),
                constant("y", 1),
                constant("x", 2),
                effect("print", &["x", "y"]),
            ],
        );

        // Deleting the dead `add` removes the only read of the first `x`.
        assert_eq!(eliminate_dead_code(&mut func).expect("round should succeed"), 1);
        assert_eq!(eliminate_dead_code(&mut func).expect("round should succeed"), 1);
        assert_eq!(eliminate_dead_code(&mut func).expect("round should succeed"), 0);

        assert_eq!(
            func.instrs,
            vec![constant("y", 1), constant("x", 2), effect("print", &["x", "y"])]
        );
    }

    /// Tags each instruction with its original position.
    fn tagged(instrs: Vec<Instruction>) -> Vec<Instruction> {
        instrs
            .into_iter()
            .enumerate()
            .map(|(i, inst)| Instruction {
                funcs: Some(vec![i.to_string()]),
                ..inst
            })
            .collect()
    }

    fn tag(inst: &Instruction) -> Option<usize> {
        inst.funcs.as_ref()?.first()?.parse().ok()
    }

    fn reads(inst: &Instruction, var: &str) -> bool {
        inst.args().iter().any(|arg| arg == var)
    }

    proptest! {
        #[test]
        fn dce_only_deletes_overwritten_unread_definitions(instrs in arb_instructions()) {
            let mut block = Block {
                id: 0,
                instructions: tagged(instrs),
            };

            let before = block.instructions.clone();
            let deleted = eliminate_block(&mut block);

            let kept: HashSet<_> = block.instructions.iter().filter_map(tag).collect();
            prop_assert_eq!(kept.len() + deleted, before.len());

            for (i, inst) in before.iter().enumerate() {
                if kept.contains(&i) {
                    continue;
                }

                let dest = inst.dest.as_deref().expect("deleted instruction should define a variable");
                let next = before[i + 1..]
                    .iter()
                    .find(|later| reads(later, dest) || later.dest.as_deref() == Some(dest));

                prop_assert!(next.is_some_and(|later| !reads(later, dest)));
            }
        }
    }
}
