// src/physics/operations/stack.rs
use crate::errors::{BuildError, Result};
use crate::model::structure::{Atom, Structure};
use crate::utils::linalg;

/// Default relative tolerance on the in-plane lattice vectors.
pub const MISMATCH_TOLERANCE: f64 = 1e-3;

/// Fractional coordinates above this are shifted down by one before the
/// alternating stack is tiled, so boundary atoms stay with their block.
const BOUNDARY_SHIFT: f64 = 0.97;

/// Largest relative difference between the two slabs' non-stacking vectors.
pub fn in_plane_mismatch(slab_a: &Structure, slab_b: &Structure, axis: usize) -> f64 {
    (0..3)
        .filter(|&k| k != axis)
        .map(|k| {
            let va = slab_a.lattice[k];
            let vb = slab_b.lattice[k];
            let diff = linalg::norm([va[0] - vb[0], va[1] - vb[1], va[2] - vb[2]]);
            let scale = linalg::norm(va).max(linalg::norm(vb));
            if scale > 0.0 {
                diff / scale
            } else {
                diff
            }
        })
        .fold(0.0, f64::max)
}

/// Stacks `slab_b` on top of `slab_a` along `axis`.
///
/// The combined vector along `axis` is the sum of both slabs' vectors, the
/// other two are `slab_a`'s. `slab_b` keeps its in-plane fractional
/// coordinates, so any in-plane mismatch ends up as strain on `slab_b`;
/// mismatch above [`MISMATCH_TOLERANCE`] is logged, never rejected.
pub fn stack(slab_a: &Structure, slab_b: &Structure, axis: usize) -> Result<Structure> {
    stack_with_tolerance(slab_a, slab_b, axis, MISMATCH_TOLERANCE)
}

pub fn stack_with_tolerance(
    slab_a: &Structure,
    slab_b: &Structure,
    axis: usize,
    tolerance: f64,
) -> Result<Structure> {
    if axis > 2 {
        return Err(BuildError::InvalidAxis(axis));
    }

    let mismatch = in_plane_mismatch(slab_a, slab_b, axis);
    if mismatch > tolerance {
        log::warn!(
            "In-plane lattice mismatch of {:.3}% between stacked slabs; the second slab is strained to fit",
            mismatch * 100.0
        );
    }

    let len_a = linalg::norm(slab_a.lattice[axis]);
    let len_b = linalg::norm(slab_b.lattice[axis]);
    if len_a + len_b <= 0.0 {
        return Err(BuildError::DegenerateCell(format!(
            "both slabs have a zero-length vector along axis {}",
            axis
        )));
    }
    // Share of the combined stacking vector that belongs to slab_a
    let w = len_a / (len_a + len_b);

    let mut lattice = slab_a.lattice;
    lattice[axis] = linalg::add(slab_a.lattice[axis], slab_b.lattice[axis]);
    if linalg::determinant(lattice).abs() < 1e-10 {
        return Err(BuildError::DegenerateCell("stacked lattice has zero volume".to_string()));
    }

    let frac_a = slab_a.fractional_positions()?;
    let frac_b = slab_b.fractional_positions()?;

    let mut atoms = Vec::with_capacity(slab_a.len() + slab_b.len());
    for (idx, (atom, mut f)) in slab_a.atoms.iter().zip(frac_a).enumerate() {
        f[axis] *= w;
        atoms.push(Atom::new(atom.element.clone(), linalg::frac_to_cart(f, lattice), idx));
    }
    for (idx, (atom, mut f)) in slab_b.atoms.iter().zip(frac_b).enumerate() {
        // offset by one slab_a length, rescaled into the combined cell
        f[axis] = w + f[axis] * (1.0 - w);
        atoms.push(Atom::new(atom.element.clone(), linalg::frac_to_cart(f, lattice), idx));
    }

    Ok(Structure::new(
        lattice,
        atoms,
        format!("{} | {}", slab_a.title, slab_b.title),
    ))
}

/// Periodic wall model built from two commensurate cells: `repeats` copies
/// along `axis`, the first half from `p1` and the rest from `p2`.
pub fn stack_alternating(p1: &Structure, p2: &Structure, axis: usize, repeats: usize) -> Result<Structure> {
    if axis > 2 {
        return Err(BuildError::InvalidAxis(axis));
    }
    if repeats < 2 {
        let mut m = vec![1, 1, 1];
        m[axis] = repeats;
        return Err(BuildError::InvalidMultiplier(m));
    }
    if p1.len() != p2.len() {
        return Err(BuildError::MismatchedDomains(format!(
            "{} atoms vs {} atoms",
            p1.len(),
            p2.len()
        )));
    }
    if let Some((i, (x, y))) = p1
        .atoms
        .iter()
        .zip(&p2.atoms)
        .enumerate()
        .find(|(_, (x, y))| x.element != y.element)
    {
        return Err(BuildError::MismatchedDomains(format!(
            "atom {} is {} in the first cell but {} in the second",
            i, x.element, y.element
        )));
    }

    let mut lattice = p1.lattice;
    lattice[axis] = linalg::scale(p1.lattice[axis], repeats as f64);

    // p2's coordinates are taken relative to p1's cell, as for a relaxed pair
    let shift_boundary = |f: [f64; 3]| -> [f64; 3] {
        let mut g = f;
        for x in g.iter_mut() {
            if *x > BOUNDARY_SHIFT {
                *x -= 1.0;
            }
        }
        g
    };
    let frac_1: Vec<[f64; 3]> = p1.fractional_positions()?.into_iter().map(shift_boundary).collect();
    let frac_2: Vec<[f64; 3]> = p2.fractional_positions()?.into_iter().map(shift_boundary).collect();

    let mut atoms = Vec::with_capacity(p1.len() * repeats);
    for block in 0..repeats {
        let (source, frac) = if 2 * (block + 1) <= repeats {
            (p1, &frac_1)
        } else {
            (p2, &frac_2)
        };
        for (idx, (atom, f)) in source.atoms.iter().zip(frac).enumerate() {
            let mut g = *f;
            g[axis] = (g[axis] + block as f64) / repeats as f64;
            atoms.push(Atom::new(atom.element.clone(), linalg::frac_to_cart(g, lattice), idx));
        }
    }

    Ok(Structure::new(
        lattice,
        atoms,
        format!("{} x{} alternating {} / {}", ["a", "b", "c"][axis], repeats, p1.title, p2.title),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slab(c: f64, species: &str) -> Structure {
        Structure::from_fractional(
            [[3.0, 0.0, 0.0], [0.0, 3.0, 0.0], [0.0, 0.0, c]],
            vec![(species, [0.0, 0.0, 0.0]), (species, [0.5, 0.5, 0.5])],
            species,
        )
    }

    #[test]
    fn test_stack_sums_axis_and_atoms() {
        let a = slab(4.0, "Ba");
        let b = slab(6.0, "Sr");
        let s = stack(&a, &b, 2).unwrap();
        assert_eq!(s.len(), 4);
        assert!((s.lengths()[2] - 10.0).abs() < 1e-12);
        assert_eq!(s.lattice[0], a.lattice[0]);
        // slab_a first, slab_b after it, same Cartesian spacing
        assert_eq!(s.atoms[0].element, "Ba");
        assert_eq!(s.atoms[2].element, "Sr");
        assert!((s.atoms[1].position[2] - 2.0).abs() < 1e-12);
        assert!((s.atoms[2].position[2] - 4.0).abs() < 1e-12);
        assert!((s.atoms[3].position[2] - 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_stacked_atoms_point_back_into_their_slab() {
        let a = slab(4.0, "Ba");
        let b = slab(6.0, "Sr");
        let s = stack(&a, &b, 2).unwrap();
        let sources: Vec<usize> = s.atoms.iter().map(|at| at.source_index).collect();
        assert_eq!(sources, vec![0, 1, 0, 1]);

        let alt = stack_alternating(&a, &a, 2, 4).unwrap();
        let sources: Vec<usize> = alt.atoms.iter().map(|at| at.source_index).collect();
        assert_eq!(sources, vec![0, 1, 0, 1, 0, 1, 0, 1]);
    }

    #[test]
    fn test_stack_rejects_bad_axis() {
        let a = slab(4.0, "Ba");
        assert!(matches!(stack(&a, &a, 3), Err(BuildError::InvalidAxis(3))));
    }

    #[test]
    fn test_mismatch_is_measured_not_rejected() {
        let a = slab(4.0, "Ba");
        let mut b = slab(4.0, "Ba");
        b.lattice[0] = [3.03, 0.0, 0.0];
        assert!((in_plane_mismatch(&a, &b, 2) - 0.03 / 3.03).abs() < 1e-12);
        assert!(stack(&a, &b, 2).is_ok());
    }

    #[test]
    fn test_alternating_stack_layout() {
        let p1 = slab(4.0, "Lu");
        let p2 = slab(4.0, "Lu");
        let s = stack_alternating(&p1, &p2, 1, 4).unwrap();
        assert_eq!(s.len(), 8);
        assert!((s.lengths()[1] - 12.0).abs() < 1e-12);
        // block 2 starts at 1/4 of the stacked b vector
        assert!((s.atoms[2].position[1] - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_alternating_stack_needs_matching_species() {
        let p1 = slab(4.0, "Lu");
        let p2 = slab(4.0, "Mn");
        assert!(matches!(
            stack_alternating(&p1, &p2, 2, 4),
            Err(BuildError::MismatchedDomains(_))
        ));
        assert!(matches!(
            stack_alternating(&p1, &p1, 2, 1),
            Err(BuildError::InvalidMultiplier(_))
        ));
    }
}
