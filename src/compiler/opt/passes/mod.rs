//! Machine-independent Optimization
//!
//! Optimization passes that transform an intermediate representation (_IR_) in
//! a target-agnostic way.

pub mod dce;
pub mod lvn;
pub mod optimize;

pub use dce::eliminate_dead_code;
pub use lvn::number_values;
pub use optimize::optimize_program;
