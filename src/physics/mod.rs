// src/physics/mod.rs
pub mod analysis;
pub mod operations;
