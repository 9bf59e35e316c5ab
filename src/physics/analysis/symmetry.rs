// src/physics/analysis/symmetry.rs
use crate::errors::{BuildError, Result};
use crate::model::elements::species_numbers;
use crate::model::structure::Structure;
use crate::utils::linalg;
use moyo::base::{AngleTolerance, Cell, Lattice};
use moyo::data::Setting;
use moyo::MoyoDataset;
use nalgebra::Vector3;
use serde::Serialize;

/// Default distance tolerance (Å) for the symmetry search.
pub const DEFAULT_SYMPREC: f64 = 1e-4;

// --- Structs for Analysis Results ---
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymmetryInfo {
    pub number: i32,
    pub symbol: String,
    pub system: String,
    pub lattice_type: String,
}

impl SymmetryInfo {
    /// Fills in symbol, crystal system and lattice type from the number.
    pub fn from_number(number: i32) -> Self {
        let system = match number {
            1..=2 => "Triclinic",
            3..=15 => "Monoclinic",
            16..=74 => "Orthorhombic",
            75..=142 => "Tetragonal",
            143..=167 => "Trigonal",
            168..=194 => "Hexagonal",
            195..=230 => "Cubic",
            _ => "Unknown",
        };

        let lattice_type = match number {
            146 | 148 | 155 | 160 | 161 | 166 | 167 => "rhombohedral",
            143..=194 => "hexagonal",
            1..=2 => "triclinic",
            3..=15 => "monoclinic",
            16..=74 => "orthorhombic",
            75..=142 => "tetragonal",
            195..=230 => "cubic",
            _ => "unknown",
        };

        let symbol = if (1..=230).contains(&number) {
            SG_SYMBOLS[number as usize].to_string()
        } else {
            "Unknown".to_string()
        };

        Self {
            number,
            symbol,
            system: system.to_string(),
            lattice_type: lattice_type.to_string(),
        }
    }
}

/// Maps a structure to its space group. The pipeline only ever sees this
/// trait, so any symmetry finder can stand behind it.
pub trait SymmetryClassifier {
    fn classify(&self, structure: &Structure) -> Result<SymmetryInfo>;
}

/// Space-group detection backed by moyo.
#[derive(Debug, Clone, Copy)]
pub struct MoyoClassifier {
    pub symprec: f64,
}

impl Default for MoyoClassifier {
    fn default() -> Self {
        Self {
            symprec: DEFAULT_SYMPREC,
        }
    }
}

impl SymmetryClassifier for MoyoClassifier {
    fn classify(&self, structure: &Structure) -> Result<SymmetryInfo> {
        if structure.is_empty() {
            return Err(BuildError::EmptyStructure);
        }

        // Convert Lattice (rows are the lattice vectors)
        let lattice_mat = linalg::lattice_matrix(structure.lattice);

        // Convert Atoms to Fractional
        let positions: Vec<Vector3<f64>> = structure
            .fractional_positions()?
            .into_iter()
            .map(Vector3::from)
            .collect();
        let elements: Vec<String> = structure.atoms.iter().map(|a| a.element.clone()).collect();
        let numbers = species_numbers(&elements);

        // Run Moyo
        let cell = Cell::new(Lattice::new(lattice_mat), positions, numbers);
        let dataset = MoyoDataset::new(&cell, self.symprec, AngleTolerance::Default, Setting::Spglib, true)
            .map_err(|e| BuildError::Symmetry(format!("{:?}", e)))?;

        let info = SymmetryInfo::from_number(dataset.number);
        log::debug!(
            "Space group {} ({}) found with symprec {}",
            info.symbol,
            info.number,
            self.symprec
        );
        Ok(info)
    }
}

// =========================================================================
// DATA: Space Group Symbols (index = ITA number)
// =========================================================================
const SG_SYMBOLS: [&str; 231] = [
    "", "P1", "P-1", "P121", "P12_11", "C121", "P1m1", "P1c1", "C1m1", "C1c1", "P12/m1",
    "P12_1/m1", "C12/m1", "P12/c1", "P12_1/c1", "C12/c1", "P222", "P222_1", "P2_12_12",
    "P2_12_12_1", "C222_1", "C222", "F222", "I222", "I2_12_12_1", "Pmm2", "Pmc2_1", "Pcc2", "Pma2",
    "Pca2_1", "Pnc2", "Pmn2_1", "Pba2", "Pna2_1", "Pnn2", "Cmm2", "Cmc2_1", "Ccc2", "Amm2", "Aem2",
    "Ama2", "Aea2", "Fmm2", "Fdd2", "Imm2", "Iba2", "Ima2", "Pmmm", "Pnnn", "Pccm", "Pban", "Pmma",
    "Pnna", "Pmna", "Pcca", "Pbam", "Pccn", "Pbcm", "Pnnm", "Pmmn", "Pbcn", "Pbca", "Pnma", "Cmcm",
    "Cmce", "Cmmm", "Cccm", "Cmme", "Ccce", "Fmmm", "Fddd", "Immm", "Ibam", "Ibca", "Imma", "P4",
    "P4_1", "P4_2", "P4_3", "I4", "I4_1", "P-4", "I-4", "P4/m", "P4_2/m", "P4/n", "P4_2/n", "I4/m",
    "I4_1/a", "P422", "P42_12", "P4_122", "P4_12_12", "P4_222", "P4_22_12", "P4_322", "P4_32_12",
    "I422", "I4_122", "P4mm", "P4bm", "P4_2cm", "P4_2nm", "P4cc", "P4nc", "P4_2mc", "P4_2bc",
    "I4mm", "I4cm", "I4_1md", "I4_1cd", "P-42m", "P-42c", "P-42_1m", "P-42_1c", "P-4m2", "P-4c2",
    "P-4b2", "P-4n2", "I-4m2", "I-4c2", "I-42m", "I-42d", "P4/mmm", "P4/mcc", "P4/nbm", "P4/nnc",
    "P4/mbm", "P4/mnc", "P4/nmm", "P4/ncc", "P4_2/mmc", "P4_2/mcm", "P4_2/nbc", "P4_2/nnm",
    "P4_2/mbc", "P4_2/mnm", "P4_2/nmc", "P4_2/ncm", "I4/mmm", "I4/mcm", "I4_1/amd", "I4_1/acd",
    "P3", "P3_1", "P3_2", "R3", "P-3", "R-3", "P312", "P321", "P3_112", "P3_121", "P3_212",
    "P3_221", "R32", "P3m1", "P31m", "P3c1", "P31c", "R3m", "R3c", "P-31m", "P-31c", "P-3m1",
    "P-3c1", "R-3m", "R-3c", "P6", "P6_1", "P6_5", "P6_2", "P6_4", "P6_3", "P-6", "P6/m", "P6_3/m",
    "P622", "P6_122", "P6_522", "P6_222", "P6_422", "P6_322", "P6mm", "P6cc", "P6_3cm", "P6_3mc",
    "P-6m2", "P-6c2", "P-62m", "P-62c", "P6/mmm", "P6/mcc", "P6_3/mcm", "P6_3/mmc", "P23", "F23",
    "I23", "P2_13", "I2_13", "Pm-3", "Pn-3", "Fm-3", "Fd-3", "Im-3", "Pa-3", "Ia-3", "P432",
    "P4_232", "F432", "F4_132", "I432", "P4_332", "P4_132", "I4_132", "P-43m", "F-43m", "I-43m",
    "P-43n", "F-43c", "I-43d", "Pm-3m", "Pn-3n", "Pm-3n", "Pn-3m", "Fm-3m", "Fm-3c", "Fd-3m",
    "Fd-3c", "Im-3m", "Ia-3d",
];
