// src/physics/operations/cut.rs
use crate::errors::{BuildError, Result};
use crate::model::structure::{Atom, Structure};
use crate::utils::linalg;
use crate::utils::report::format_triple;
use nalgebra::{Matrix3, Vector3};

const TOLERANCE: f64 = 1e-5;

/// The new a vector is laid along +y ...
const TARGET_A: [f64; 3] = [0.0, 1.0, 0.0];
/// ... and the new b vector in the xy plane on the +x side.
const TARGET_B: [f64; 3] = [1.0, 0.0, 0.0];

/// Cuts a new periodic cell spanned by `a`, `b`, `c` (in the basis of
/// `structure`'s lattice) and rotates it into the canonical frame.
pub fn cut_and_orient(structure: &Structure, a: [f64; 3], b: [f64; 3], c: [f64; 3]) -> Result<Structure> {
    let slab = cut(structure, a, b, c)?;
    orient(&slab)
}

/// Cell cut without the rotation. Every periodic image of every atom whose
/// fractional coordinates in the new cell land in [0,1)³ is kept.
pub fn cut(structure: &Structure, a: [f64; 3], b: [f64; 3], c: [f64; 3]) -> Result<Structure> {
    // ========== INPUT VALIDATION ==========
    if structure.atoms.is_empty() {
        return Err(BuildError::EmptyStructure);
    }

    // Transformation matrix: columns are the new basis in terms of old basis indices
    let m_transform = Matrix3::new(
        a[0], b[0], c[0],
        a[1], b[1], c[1],
        a[2], b[2], c[2],
    );

    let det_transform = m_transform.determinant().abs();
    if det_transform < 1e-8 {
        return Err(BuildError::DegenerateCell(format!(
            "directions [{}] [{}] [{}] are linearly dependent",
            format_triple(a),
            format_triple(b),
            format_triple(c)
        )));
    }

    let m_inv = m_transform
        .try_inverse()
        .ok_or_else(|| BuildError::DegenerateCell("cannot invert direction matrix".to_string()))?;

    // ========== NEW LATTICE ==========
    // Row convention: new rows = [a; b; c] * old rows
    let lat_rows = linalg::lattice_matrix(structure.lattice);
    let new_rows = m_transform.transpose() * lat_rows;
    let new_lattice = linalg::matrix_rows(&new_rows);

    // ========== MAP ATOMS ==========
    let frac_old = structure.fractional_positions()?;

    // Integer hull of the new cell's corners in the old basis, padded by one cell
    let mut lo = [0i64; 3];
    let mut hi = [0i64; 3];
    for k in 0..3 {
        let (mut min, mut max) = (0.0f64, 0.0f64);
        for dir in [a, b, c] {
            if dir[k] < 0.0 {
                min += dir[k];
            } else {
                max += dir[k];
            }
        }
        lo[k] = min.floor() as i64 - 1;
        hi[k] = max.ceil() as i64 + 1;
    }

    let mut new_atoms: Vec<Atom> = Vec::new();

    for i in lo[0]..=hi[0] {
        for j in lo[1]..=hi[1] {
            for k in lo[2]..=hi[2] {
                let shift = Vector3::new(i as f64, j as f64, k as f64);

                for (idx, (atom, f)) in structure.atoms.iter().zip(&frac_old).enumerate() {
                    let wrapped = Vector3::new(linalg::wrap(f[0]), linalg::wrap(f[1]), linalg::wrap(f[2]));

                    // r_new = M_inv * r_old
                    let frac_new = m_inv * (wrapped + shift);

                    if is_in_unit_cell(frac_new) {
                        let snapped = [snap(frac_new.x), snap(frac_new.y), snap(frac_new.z)];
                        new_atoms.push(Atom::new(
                            atom.element.clone(),
                            linalg::frac_to_cart(snapped, new_lattice),
                            idx,
                        ));
                    }
                }
            }
        }
    }

    if new_atoms.is_empty() {
        return Err(BuildError::DegenerateCell(format!(
            "no atoms fall inside the cell [{}] [{}] [{}]",
            format_triple(a),
            format_triple(b),
            format_triple(c)
        )));
    }

    log::debug!(
        "Cut [{}] [{}] [{}]: {} -> {} atoms (volume x{:.3})",
        format_triple(a),
        format_triple(b),
        format_triple(c),
        structure.atoms.len(),
        new_atoms.len(),
        det_transform
    );

    Ok(Structure::new(
        new_lattice,
        new_atoms,
        format!(
            "{} [{}] [{}] [{}]",
            structure.title,
            format_triple(a),
            format_triple(b),
            format_triple(c)
        )
        .trim()
        .to_string(),
    ))
}

/// Rotation taking the cell's a vector onto +y and b into the xy plane
/// (towards +x). Always a proper rotation.
pub fn canonical_rotation(lattice: [[f64; 3]; 3]) -> Result<Matrix3<f64>> {
    let a = Vector3::from(lattice[0]);
    let b = Vector3::from(lattice[1]);

    if a.norm() < TOLERANCE {
        return Err(BuildError::DegenerateCell("lattice vector a has zero length".to_string()));
    }
    let e1 = a.normalize();
    let b_perp = b - e1 * b.dot(&e1);
    if b_perp.norm() < TOLERANCE {
        return Err(BuildError::DegenerateCell("lattice vectors a and b are parallel".to_string()));
    }
    let e2 = b_perp.normalize();
    let e3 = e1.cross(&e2);

    let t1 = Vector3::from(TARGET_A);
    let t2 = Vector3::from(TARGET_B);
    let t3 = t1.cross(&t2);

    let source = Matrix3::from_columns(&[e1, e2, e3]);
    let target = Matrix3::from_columns(&[t1, t2, t3]);
    Ok(target * source.transpose())
}

/// Rigidly rotates lattice and atoms into the canonical frame. Fractional
/// coordinates are unchanged.
pub fn orient(structure: &Structure) -> Result<Structure> {
    let rot = canonical_rotation(structure.lattice)?;
    let apply = |v: [f64; 3]| -> [f64; 3] {
        let r = rot * Vector3::from(v);
        [r.x, r.y, r.z]
    };

    let lattice = [
        apply(structure.lattice[0]),
        apply(structure.lattice[1]),
        apply(structure.lattice[2]),
    ];
    let atoms = structure
        .atoms
        .iter()
        .map(|atom| Atom::new(atom.element.clone(), apply(atom.position), atom.source_index))
        .collect();

    Ok(Structure::new(lattice, atoms, structure.title.clone()))
}

// ========== HELPER FUNCTIONS ==========

/// Check if fractional coordinate is within unit cell [0,1) with tolerance
fn is_in_unit_cell(frac: Vector3<f64>) -> bool {
    frac.iter().all(|&x| x >= -TOLERANCE && x < 1.0 - TOLERANCE)
}

/// Snap to 0 (also pulls the [-tol, 0) sliver back into the cell)
fn snap(x: f64) -> f64 {
    if x.abs() < TOLERANCE {
        0.0
    } else {
        x
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn perovskite() -> Structure {
        Structure::from_fractional(
            [[3.9, 0.0, 0.0], [0.0, 3.9, 0.0], [0.0, 0.0, 3.9]],
            vec![
                ("Sr", [0.0, 0.0, 0.0]),
                ("Ti", [0.5, 0.5, 0.5]),
                ("O", [0.5, 0.5, 0.0]),
                ("O", [0.5, 0.0, 0.5]),
                ("O", [0.0, 0.5, 0.5]),
            ],
            "SrTiO3",
        )
    }

    #[test]
    fn test_identity_cut_keeps_cell() {
        let s = perovskite();
        let c = cut(&s, [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]).unwrap();
        assert_eq!(c.len(), 5);
        assert!((c.volume() - s.volume()).abs() < 1e-9);
    }

    #[test]
    fn test_diagonal_cut_multiplies_atoms() {
        let s = perovskite();
        let c = cut(&s, [1.0, 1.0, 0.0], [0.0, 0.0, 1.0], [2.0, -2.0, 0.0]).unwrap();
        assert!((c.volume() - 4.0 * s.volume()).abs() < 1e-6);
        assert_eq!(c.len(), 20);
    }

    #[test]
    fn test_degenerate_directions() {
        let s = perovskite();
        let err = cut(&s, [1.0, 1.0, 0.0], [2.0, 2.0, 0.0], [0.0, 0.0, 1.0]).unwrap_err();
        assert!(matches!(err, BuildError::DegenerateCell(_)));
    }

    #[test]
    fn test_orient_puts_a_on_y_and_b_in_plane() {
        let s = perovskite();
        let c = cut_and_orient(&s, [1.0, 1.0, 0.0], [0.0, 0.0, 1.0], [1.0, -1.0, 0.0]).unwrap();
        let a = c.lattice[0];
        let b = c.lattice[1];
        assert!(a[0].abs() < 1e-10 && a[2].abs() < 1e-10 && a[1] > 0.0);
        assert!(b[2].abs() < 1e-10 && b[0] > 0.0);
        // lengths survive the rotation
        assert!((linalg::norm(a) - 3.9 * 2f64.sqrt()).abs() < 1e-10);
        assert!((c.volume() - 2.0 * s.volume()).abs() < 1e-6);
    }

    #[test]
    fn test_rotation_is_proper() {
        let rot = canonical_rotation([[1.0, 2.0, 0.5], [-0.3, 1.0, 2.0], [0.0, 0.0, 3.0]]).unwrap();
        assert!((rot.determinant() - 1.0).abs() < 1e-12);
        let should_be_identity = rot * rot.transpose();
        assert!((should_be_identity - Matrix3::identity()).norm() < 1e-12);
    }

    #[test]
    fn test_twin_orientations_share_canonical_cell() {
        let s = perovskite();
        let d1 = cut_and_orient(&s, [1.0, 1.0, 0.0], [0.0, 0.0, 1.0], [1.0, -1.0, 0.0]).unwrap();
        let d2 = cut_and_orient(&s, [-1.0, -1.0, 0.0], [0.0, 0.0, -1.0], [1.0, -1.0, 0.0]).unwrap();
        for i in 0..3 {
            for k in 0..3 {
                assert!((d1.lattice[i][k] - d2.lattice[i][k]).abs() < 1e-10);
            }
        }
    }
}
