// src/physics/analysis/mod.rs
pub mod bonds;
pub mod neighbors;
pub mod strain;
pub mod symmetry;

pub use bonds::{analyze_bonds, compare_bonds, BondAnalysis, BondComparison};
pub use neighbors::{min_image_distance, neighbor_pairs, periodic_bonds, NeighborPair};
pub use strain::{compute_strain, StrainReport};
pub use symmetry::{MoyoClassifier, SymmetryClassifier, SymmetryInfo};
