// src/physics/operations/mod.rs
pub mod cut;
pub mod overlap;
pub mod stack;
pub mod supercell;

pub use cut::{cut, cut_and_orient, orient};
pub use overlap::{remove_close_atoms, resolve_overlaps, OverlapReport, TieBreak};
pub use stack::{stack, stack_alternating};
pub use supercell::replicate;
