//src/model/mod.rs
pub mod elements;
pub mod recipes;
pub mod structure;

// Re-exports for cleaner imports
pub use recipes::{Family, PolarAxis, WallRecipe, WallSelection, WallType};
pub use structure::{Atom, Structure};
