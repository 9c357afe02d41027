//! Command implementations for the vfbench CLI
//!
//! Each command module provides a `run` function that executes the command logic.

pub mod check;
pub mod info;
pub mod normalize;
pub mod plot;
pub mod results;
pub mod run;
