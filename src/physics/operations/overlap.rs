// src/physics/operations/overlap.rs
use crate::errors::{BuildError, Result};
use crate::model::structure::{Atom, Structure};
use crate::physics::analysis::neighbors::neighbor_pairs;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which atom of a close pair survives.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Keep `i`, drop `j` (`i < j`).
    #[default]
    KeepLowerIndex,
    /// Keep the atom whose species comes first in the list. Equal rank or
    /// unlisted species fall back to the lower index.
    SpeciesPriority(Vec<String>),
}

impl TieBreak {
    /// Index of the atom to drop from the close pair `(i, j)`.
    fn loser(&self, atoms: &[Atom], i: usize, j: usize) -> usize {
        match self {
            TieBreak::KeepLowerIndex => j,
            TieBreak::SpeciesPriority(order) => {
                let rank = |k: usize| {
                    order
                        .iter()
                        .position(|s| *s == atoms[k].element)
                        .unwrap_or(usize::MAX)
                };
                if rank(j) < rank(i) {
                    i
                } else {
                    j
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpeciesCount {
    pub species: String,
    pub before: usize,
    pub after: usize,
}

/// What the overlap pass did to a structure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlapReport {
    pub cutoff: f64,
    pub before: usize,
    pub after: usize,
    /// Indices (in the input structure) of the removed atoms, ascending.
    pub removed: Vec<usize>,
    pub per_species: Vec<SpeciesCount>,
    /// Species present before the pass and absent after it.
    pub vanished: Vec<String>,
}

impl fmt::Display for OverlapReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(
            f,
            "Overlap removal (cutoff {:.3} Å): {} -> {} atoms, {} removed",
            self.cutoff,
            self.before,
            self.after,
            self.removed.len()
        )?;
        for c in &self.per_species {
            writeln!(f, "  {:<4} {:>5} -> {:>5}", c.species, c.before, c.after)?;
        }
        if !self.vanished.is_empty() {
            write!(f, "  vanished: {}", self.vanished.join(", "))?;
        }
        Ok(())
    }
}

/// Drops one atom of every pair closer than `cutoff`, keeping the lower index.
pub fn remove_close_atoms(structure: &Structure, cutoff: f64) -> Result<Structure> {
    resolve_overlaps(structure, cutoff, &TieBreak::KeepLowerIndex).map(|(s, _)| s)
}

/// Overlap removal with an explicit tie-break and a report of the effect.
///
/// All close pairs are collected first and marks are applied afterwards, so
/// the result does not depend on how the neighbor search was scheduled.
/// Retained atoms keep their relative order.
pub fn resolve_overlaps(
    structure: &Structure,
    cutoff: f64,
    policy: &TieBreak,
) -> Result<(Structure, OverlapReport)> {
    if !cutoff.is_finite() || cutoff <= 0.0 {
        return Err(BuildError::InvalidCutoff(cutoff));
    }

    let pairs = neighbor_pairs(structure, cutoff)?;

    let mut marked = vec![false; structure.len()];
    for pair in &pairs {
        marked[policy.loser(&structure.atoms, pair.i, pair.j)] = true;
    }

    let atoms: Vec<Atom> = structure
        .atoms
        .iter()
        .enumerate()
        .filter(|(idx, _)| !marked[*idx])
        .map(|(idx, atom)| Atom::new(atom.element.clone(), atom.position, idx))
        .collect();
    let removed: Vec<usize> = (0..structure.len()).filter(|&idx| marked[idx]).collect();

    let cleaned = Structure::new(structure.lattice, atoms, structure.title.clone());

    let after_counts = cleaned.composition();
    let per_species: Vec<SpeciesCount> = structure
        .composition()
        .into_iter()
        .map(|(species, before)| {
            let after = after_counts
                .iter()
                .find(|(s, _)| *s == species)
                .map(|(_, n)| *n)
                .unwrap_or(0);
            SpeciesCount { species, before, after }
        })
        .collect();
    let vanished: Vec<String> = per_species
        .iter()
        .filter(|c| c.after == 0)
        .map(|c| c.species.clone())
        .collect();

    for species in &vanished {
        log::warn!("Overlap removal deleted every {} atom", species);
    }

    let report = OverlapReport {
        cutoff,
        before: structure.len(),
        after: cleaned.len(),
        removed,
        per_species,
        vanished,
    };
    Ok((cleaned, report))
}
