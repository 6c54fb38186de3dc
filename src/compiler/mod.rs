//! Pipeline for loading, optimizing, and emitting three-address code programs.

pub mod driver;
pub mod ir;
pub mod opt;
