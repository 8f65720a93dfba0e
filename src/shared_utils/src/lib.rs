//! Small helpers shared by the substitution workspace crates.

pub mod env;
