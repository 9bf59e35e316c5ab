use crate::errors::{BuildError, Result};
use crate::utils::linalg;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Atom {
    pub element: String,
    /// Cartesian position in Angstroms.
    pub position: [f64; 3],
    // Index of the atom this one was derived from in the previous stage.
    #[serde(skip)]
    pub source_index: usize,
}

impl Atom {
    pub fn new(element: impl Into<String>, position: [f64; 3], source_index: usize) -> Self {
        Self {
            element: element.into(),
            position,
            source_index,
        }
    }
}

/// A periodic crystal structure. Every pipeline stage consumes a `&Structure`
/// and hands back a fresh one.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Structure {
    // Lattice vectors: [a_vec, b_vec, c_vec]
    pub lattice: [[f64; 3]; 3],
    pub atoms: Vec<Atom>,
    /// Free text carried on the POSCAR comment line.
    #[serde(default)]
    pub title: String,
}

impl Structure {
    pub fn new(lattice: [[f64; 3]; 3], atoms: Vec<Atom>, title: impl Into<String>) -> Self {
        Self {
            lattice,
            atoms,
            title: title.into(),
        }
    }

    /// Builds a structure from (species, fractional position) pairs.
    pub fn from_fractional<S: Into<String>>(
        lattice: [[f64; 3]; 3],
        sites: impl IntoIterator<Item = (S, [f64; 3])>,
        title: impl Into<String>,
    ) -> Self {
        let atoms = sites
            .into_iter()
            .enumerate()
            .map(|(idx, (element, frac))| {
                Atom::new(element, linalg::frac_to_cart(frac, lattice), idx)
            })
            .collect();
        Self::new(lattice, atoms, title)
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    /// Signed cell volume (a × b) · c.
    pub fn signed_volume(&self) -> f64 {
        linalg::determinant(self.lattice)
    }

    pub fn volume(&self) -> f64 {
        self.signed_volume().abs()
    }

    pub fn lengths(&self) -> [f64; 3] {
        [
            linalg::norm(self.lattice[0]),
            linalg::norm(self.lattice[1]),
            linalg::norm(self.lattice[2]),
        ]
    }

    /// Fractional coordinates of every atom (not wrapped).
    pub fn fractional_positions(&self) -> Result<Vec<[f64; 3]>> {
        let inv = linalg::inverse(self.lattice).ok_or_else(|| {
            BuildError::DegenerateCell(format!("lattice {:?} is singular", self.lattice))
        })?;
        Ok(self
            .atoms
            .iter()
            .map(|a| linalg::cart_to_frac_with(a.position, &inv))
            .collect())
    }

    /// Species in order of first appearance.
    pub fn species(&self) -> Vec<String> {
        let mut seen: Vec<String> = Vec::new();
        for atom in &self.atoms {
            if !seen.contains(&atom.element) {
                seen.push(atom.element.clone());
            }
        }
        seen
    }

    /// (species, count) in order of first appearance.
    pub fn composition(&self) -> Vec<(String, usize)> {
        self.species()
            .into_iter()
            .map(|el| {
                let n = self.atoms.iter().filter(|a| a.element == el).count();
                (el, n)
            })
            .collect()
    }

    /// Compact formula such as "Bi1 Fe1 O3".
    pub fn formula(&self) -> String {
        self.composition()
            .iter()
            .map(|(el, n)| format!("{}{}", el, n))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Copy with every fractional coordinate wrapped into [0, 1).
    pub fn wrapped(&self) -> Result<Structure> {
        let frac = self.fractional_positions()?;
        let atoms = self
            .atoms
            .iter()
            .zip(frac)
            .map(|(atom, f)| {
                let w = [linalg::wrap(f[0]), linalg::wrap(f[1]), linalg::wrap(f[2])];
                Atom::new(atom.element.clone(), linalg::frac_to_cart(w, self.lattice), atom.source_index)
            })
            .collect();
        Ok(Structure::new(self.lattice, atoms, self.title.clone()))
    }

    /// Same structure with a new title.
    pub fn with_title(mut self, title: impl Into<String>) -> Structure {
        self.title = title.into();
        self
    }
}
