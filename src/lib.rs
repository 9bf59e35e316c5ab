//! Domain-wall and phase-interface structure generator.
//!
//! Bulk POSCAR in, oriented domain slabs and stacked wall supercells out.
//! The geometry lives in [`physics`] and never touches the file system;
//! [`workflow`] runs it against disk and keeps the run transcript.

pub mod arguments;
pub mod config;
pub mod errors;
pub mod io;
pub mod model;
pub mod physics;
pub mod utils;
pub mod workflow;
