// src/physics/analysis/neighbors.rs
use crate::errors::{BuildError, Result};
use crate::model::structure::Structure;
use crate::utils::linalg;
use nalgebra::{Matrix3, Vector3};
use rayon::prelude::*;
use serde::Serialize;

/// Two atoms closer than the search radius, `i < j`. `offset` is the lattice
/// translation applied to `j` that realises `distance`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NeighborPair {
    pub i: usize,
    pub j: usize,
    pub offset: [i32; 3],
    pub distance: f64,
}

/// Number of periodic images to scan along each axis so that every image
/// within `reach` of a wrapped difference vector is visited.
fn image_counts(lattice: [[f64; 3]; 3], reach: f64) -> Result<[i32; 3]> {
    let v = lattice.map(Vector3::from);
    let volume = v[0].cross(&v[1]).dot(&v[2]).abs();
    if volume < 1e-10 {
        return Err(BuildError::DegenerateCell("cell volume is zero".to_string()));
    }

    let mut counts = [0i32; 3];
    for k in 0..3 {
        let area = v[(k + 1) % 3].cross(&v[(k + 2) % 3]).norm();
        // interplanar spacing of the planes spanned by the other two vectors
        let spacing = volume / area;
        counts[k] = (reach / spacing + 0.5).ceil() as i32;
    }
    Ok(counts)
}

/// Shortest image of the fractional difference `df`.
fn closest_image(df: [f64; 3], to_cart: &Matrix3<f64>, counts: [i32; 3]) -> ([i32; 3], f64) {
    let base = Vector3::new(df[0] - df[0].round(), df[1] - df[1].round(), df[2] - df[2].round());
    let shift = [df[0].round() as i32, df[1].round() as i32, df[2].round() as i32];

    let mut best = ([0i32; 3], f64::INFINITY);
    for x in -counts[0]..=counts[0] {
        for y in -counts[1]..=counts[1] {
            for z in -counts[2]..=counts[2] {
                let f = base + Vector3::new(x as f64, y as f64, z as f64);
                let d = (to_cart * f).norm();
                if d < best.1 {
                    // offset is relative to atom j's stored position
                    best = ([x - shift[0], y - shift[1], z - shift[2]], d);
                }
            }
        }
    }
    best
}

/// Every unordered pair closer than `cutoff` under periodic boundary
/// conditions, sorted by `(i, j)`. Self-images are never reported.
pub fn neighbor_pairs(structure: &Structure, cutoff: f64) -> Result<Vec<NeighborPair>> {
    if !cutoff.is_finite() || cutoff <= 0.0 {
        return Err(BuildError::InvalidCutoff(cutoff));
    }
    let n = structure.len();
    if n < 2 {
        return Ok(Vec::new());
    }

    let counts = image_counts(structure.lattice, cutoff)?;
    let to_cart = linalg::lattice_matrix(structure.lattice).transpose();
    let frac = structure.fractional_positions()?;

    let mut pairs: Vec<NeighborPair> = (0..n)
        .into_par_iter()
        .flat_map_iter(|i| {
            let frac = &frac;
            let to_cart = &to_cart;
            (i + 1..n).filter_map(move |j| {
                let df = [
                    frac[j][0] - frac[i][0],
                    frac[j][1] - frac[i][1],
                    frac[j][2] - frac[i][2],
                ];
                let (offset, distance) = closest_image(df, to_cart, counts);
                (distance < cutoff).then_some(NeighborPair { i, j, offset, distance })
            })
        })
        .collect();

    pairs.sort_by(|p, q| (p.i, p.j).cmp(&(q.i, q.j)));
    log::debug!("Neighbor search (r < {:.3} Å): {} pairs among {} atoms", cutoff, pairs.len(), n);
    Ok(pairs)
}

/// Every bond shorter than `cutoff` in the periodic crystal, each listed
/// once: all images of `j` for `i < j`, and for `i == j` the images whose
/// offset is lexicographically positive. Sorted by `(i, j, offset)`.
pub fn periodic_bonds(structure: &Structure, cutoff: f64) -> Result<Vec<NeighborPair>> {
    if !cutoff.is_finite() || cutoff <= 0.0 {
        return Err(BuildError::InvalidCutoff(cutoff));
    }
    let n = structure.len();
    if n == 0 {
        return Ok(Vec::new());
    }

    let counts = image_counts(structure.lattice, cutoff)?;
    let to_cart = linalg::lattice_matrix(structure.lattice).transpose();
    let frac = structure.fractional_positions()?;

    let mut bonds: Vec<NeighborPair> = (0..n)
        .into_par_iter()
        .flat_map_iter(|i| {
            let frac = &frac;
            let to_cart = &to_cart;
            (i..n).flat_map(move |j| {
                let df = [
                    frac[j][0] - frac[i][0],
                    frac[j][1] - frac[i][1],
                    frac[j][2] - frac[i][2],
                ];
                let base = Vector3::new(df[0] - df[0].round(), df[1] - df[1].round(), df[2] - df[2].round());
                let shift = [df[0].round() as i32, df[1].round() as i32, df[2].round() as i32];
                let mut found = Vec::new();
                for x in -counts[0]..=counts[0] {
                    for y in -counts[1]..=counts[1] {
                        for z in -counts[2]..=counts[2] {
                            let offset = [x - shift[0], y - shift[1], z - shift[2]];
                            // an atom and its own image: keep one of +/- offset
                            if i == j && offset <= [0, 0, 0] {
                                continue;
                            }
                            let distance = (to_cart * (base + Vector3::new(x as f64, y as f64, z as f64))).norm();
                            if distance < cutoff {
                                found.push(NeighborPair { i, j, offset, distance });
                            }
                        }
                    }
                }
                found
            })
        })
        .collect();

    bonds.sort_by(|p, q| (p.i, p.j, p.offset).cmp(&(q.i, q.j, q.offset)));
    log::debug!("Bond search (r < {:.3} Å): {} bonds among {} atoms", cutoff, bonds.len(), n);
    Ok(bonds)
}

/// Minimum-image distance between atoms `i` and `j`.
pub fn min_image_distance(structure: &Structure, i: usize, j: usize) -> Result<f64> {
    let len = structure.len();
    if let Some(&index) = [i, j].iter().find(|&&k| k >= len) {
        return Err(BuildError::AtomIndex { index, len });
    }
    let frac = structure.fractional_positions()?;
    // no image can be further than half the sum of the cell edges
    let reach = 0.5 * structure.lengths().iter().sum::<f64>();
    let counts = image_counts(structure.lattice, reach)?;
    let to_cart = linalg::lattice_matrix(structure.lattice).transpose();
    let df = [
        frac[j][0] - frac[i][0],
        frac[j][1] - frac[i][1],
        frac[j][2] - frac[i][2],
    ];
    Ok(closest_image(df, &to_cart, counts).1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair_across_boundary() -> Structure {
        Structure::from_fractional(
            [[5.0, 0.0, 0.0], [0.0, 5.0, 0.0], [0.0, 0.0, 5.0]],
            vec![
                ("O", [0.02, 0.5, 0.5]),
                ("O", [0.98, 0.5, 0.5]),
                ("Ti", [0.5, 0.5, 0.5]),
            ],
            "",
        )
    }

    #[test]
    fn test_pair_found_through_boundary() {
        let s = pair_across_boundary();
        let pairs = neighbor_pairs(&s, 0.6).unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!((pairs[0].i, pairs[0].j), (0, 1));
        assert!((pairs[0].distance - 0.2).abs() < 1e-9);
        assert_eq!(pairs[0].offset, [-1, 0, 0]);
    }

    #[test]
    fn test_min_image_distance() {
        let s = pair_across_boundary();
        assert!((min_image_distance(&s, 0, 1).unwrap() - 0.2).abs() < 1e-9);
        assert!((min_image_distance(&s, 0, 2).unwrap() - 2.4).abs() < 1e-9);
    }

    #[test]
    fn test_skewed_cell_uses_enough_images() {
        // strongly sheared cell: the nearest image is not the wrapped one
        let s = Structure::from_fractional(
            [[4.0, 0.0, 0.0], [3.9, 0.5, 0.0], [0.0, 0.0, 4.0]],
            vec![("Na", [0.0, 0.0, 0.0]), ("Cl", [0.5, 0.5, 0.0])],
            "",
        );
        let d = min_image_distance(&s, 0, 1).unwrap();
        let pairs = neighbor_pairs(&s, d + 1e-6).unwrap();
        assert_eq!(pairs.len(), 1);
        assert!((pairs[0].distance - d).abs() < 1e-12);
    }

    #[test]
    fn test_min_image_distance_index_out_of_range() {
        let s = pair_across_boundary();
        assert!(matches!(
            min_image_distance(&s, 0, 3),
            Err(BuildError::AtomIndex { index: 3, len: 3 })
        ));
        assert!(matches!(
            min_image_distance(&s, 7, 1),
            Err(BuildError::AtomIndex { index: 7, len: 3 })
        ));
    }

    #[test]
    fn test_periodic_bonds_count_every_image() {
        // cubic perovskite: each O sits between two images of Ti
        let s = Structure::from_fractional(
            [[3.9, 0.0, 0.0], [0.0, 3.9, 0.0], [0.0, 0.0, 3.9]],
            vec![
                ("Sr", [0.0, 0.0, 0.0]),
                ("Ti", [0.5, 0.5, 0.5]),
                ("O", [0.5, 0.5, 0.0]),
                ("O", [0.5, 0.0, 0.5]),
                ("O", [0.0, 0.5, 0.5]),
            ],
            "",
        );
        let bonds = periodic_bonds(&s, 2.0).unwrap();
        assert_eq!(bonds.len(), 6);
        assert!(bonds.iter().all(|b| b.i == 1 && (b.distance - 1.95).abs() < 1e-9));
        // only the closest image survives the pair search
        assert_eq!(neighbor_pairs(&s, 2.0).unwrap().len(), 3);
    }

    #[test]
    fn test_periodic_bonds_include_self_images_once() {
        let s = Structure::from_fractional(
            [[2.5, 0.0, 0.0], [0.0, 6.0, 0.0], [0.0, 0.0, 6.0]],
            vec![("Na", [0.0, 0.0, 0.0])],
            "",
        );
        let bonds = periodic_bonds(&s, 3.0).unwrap();
        assert_eq!(bonds.len(), 1);
        assert_eq!(bonds[0].offset, [1, 0, 0]);
        assert!((bonds[0].distance - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_cutoff() {
        let s = pair_across_boundary();
        assert!(matches!(neighbor_pairs(&s, 0.0), Err(BuildError::InvalidCutoff(_))));
        assert!(matches!(neighbor_pairs(&s, f64::NAN), Err(BuildError::InvalidCutoff(_))));
    }
}
