// src/physics/operations/supercell.rs
use crate::errors::{BuildError, Result};
use crate::model::structure::{Atom, Structure};
use crate::utils::linalg;

/// Repeats the cell `n[0] x n[1] x n[2]` times. Atoms are ordered by image
/// (a outermost, c innermost), then by their index in the source cell.
pub fn replicate(structure: &Structure, n: [usize; 3]) -> Result<Structure> {
    if n.iter().any(|&k| k == 0) {
        return Err(BuildError::InvalidMultiplier(n.to_vec()));
    }
    if n == [1, 1, 1] {
        return Ok(structure.clone());
    }

    let [nx, ny, nz] = n;
    let vec_a = structure.lattice[0];
    let vec_b = structure.lattice[1];
    let vec_c = structure.lattice[2];

    let mut new_atoms = Vec::with_capacity(structure.len() * nx * ny * nz);

    for x in 0..nx {
        for y in 0..ny {
            for z in 0..nz {
                let translation = linalg::frac_to_cart([x as f64, y as f64, z as f64], structure.lattice);

                for atom in &structure.atoms {
                    new_atoms.push(Atom::new(
                        atom.element.clone(),
                        linalg::add(atom.position, translation),
                        atom.source_index,
                    ));
                }
            }
        }
    }

    let new_lattice = [
        linalg::scale(vec_a, nx as f64),
        linalg::scale(vec_b, ny as f64),
        linalg::scale(vec_c, nz as f64),
    ];

    let title = format!("{} ({}x{}x{} supercell)", structure.title, nx, ny, nz);

    Ok(Structure::new(new_lattice, new_atoms, title.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell() -> Structure {
        Structure::from_fractional(
            [[2.0, 0.0, 0.0], [0.0, 3.0, 0.0], [0.0, 0.0, 4.0]],
            vec![("Na", [0.0, 0.0, 0.0]), ("Cl", [0.5, 0.5, 0.5])],
            "NaCl",
        )
    }

    #[test]
    fn test_replicate_counts_and_lattice() {
        let s = replicate(&cell(), [2, 1, 3]).unwrap();
        assert_eq!(s.len(), 12);
        assert_eq!(s.lattice[0], [4.0, 0.0, 0.0]);
        assert_eq!(s.lattice[2], [0.0, 0.0, 12.0]);
        assert!((s.volume() - 6.0 * cell().volume()).abs() < 1e-9);
    }

    #[test]
    fn test_replicate_order() {
        let s = replicate(&cell(), [2, 1, 2]).unwrap();
        // second image is the +c one
        assert_eq!(s.atoms[2].position, [0.0, 0.0, 4.0]);
        // third image starts the +a column
        assert_eq!(s.atoms[4].position, [2.0, 0.0, 0.0]);
        assert_eq!(s.atoms[5].element, "Cl");
    }

    #[test]
    fn test_identity_and_zero() {
        assert_eq!(replicate(&cell(), [1, 1, 1]).unwrap(), cell());
        assert!(matches!(
            replicate(&cell(), [1, 0, 1]),
            Err(BuildError::InvalidMultiplier(v)) if v == vec![1, 0, 1]
        ));
    }
}
