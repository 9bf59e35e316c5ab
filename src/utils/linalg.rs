// src/utils/linalg.rs

use nalgebra::{Matrix3, Vector3};

/// Lattice rows [[ax, ay, az], [bx, by, bz], [cx, cy, cz]] as a row matrix.
pub fn lattice_matrix(lattice: [[f64; 3]; 3]) -> Matrix3<f64> {
  Matrix3::from_row_slice(&[
    lattice[0][0],
    lattice[0][1],
    lattice[0][2],
    lattice[1][0],
    lattice[1][1],
    lattice[1][2],
    lattice[2][0],
    lattice[2][1],
    lattice[2][2],
  ])
}

/// Inverse of [`lattice_matrix`]: rows back to a plain array.
pub fn matrix_rows(m: &Matrix3<f64>) -> [[f64; 3]; 3] {
  [
    [m[(0, 0)], m[(0, 1)], m[(0, 2)]],
    [m[(1, 0)], m[(1, 1)], m[(1, 2)]],
    [m[(2, 0)], m[(2, 1)], m[(2, 2)]],
  ]
}

/// Convert fractional coordinates to Cartesian using lattice matrix
///
/// # Arguments
/// * `frac` - Fractional coordinates [x, y, z]
/// * `lattice` - Lattice vectors as row matrix [[ax, ay, az], [bx, by, bz], [cx, cy, cz]]
///
/// # Returns
/// Cartesian coordinates in Angstroms
///
/// # Formula
/// ```text
/// Cartesian = Lattice^T × Fractional
/// ```
pub fn frac_to_cart(frac: [f64; 3], lattice: [[f64; 3]; 3]) -> [f64; 3] {
  let cart_vec = lattice_matrix(lattice).transpose() * Vector3::from(frac);
  [cart_vec.x, cart_vec.y, cart_vec.z]
}

/// Matrix taking Cartesian to fractional coordinates, `(Lattice^T)^-1`.
/// `None` for a singular lattice.
pub fn inverse(lattice: [[f64; 3]; 3]) -> Option<Matrix3<f64>> {
  let m = lattice_matrix(lattice).transpose();
  if m.determinant().abs() < 1e-12 {
    return None;
  }
  m.try_inverse()
}

/// Convert Cartesian coordinates to fractional using lattice matrix
///
/// # Returns
/// Fractional coordinates [x, y, z] or None if lattice is singular
///
/// # Formula
/// ```text
/// Fractional = (Lattice^T)^-1 × Cartesian
/// ```
pub fn cart_to_frac(cart: [f64; 3], lattice: [[f64; 3]; 3]) -> Option<[f64; 3]> {
  let inv_lat = inverse(lattice)?;
  Some(cart_to_frac_with(cart, &inv_lat))
}

/// Same as [`cart_to_frac`] with a precomputed [`inverse`].
pub fn cart_to_frac_with(cart: [f64; 3], inv_lat: &Matrix3<f64>) -> [f64; 3] {
  let frac_vec = inv_lat * Vector3::from(cart);
  [frac_vec.x, frac_vec.y, frac_vec.z]
}

pub fn determinant(m: [[f64; 3]; 3]) -> f64 {
  lattice_matrix(m).determinant()
}

pub fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
  a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

pub fn norm(a: [f64; 3]) -> f64 {
  dot(a, a).sqrt()
}

pub fn add(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
  [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

pub fn scale(a: [f64; 3], s: f64) -> [f64; 3] {
  [a[0] * s, a[1] * s, a[2] * s]
}

/// Wrap a fractional coordinate into [0, 1).
pub fn wrap(x: f64) -> f64 {
  let w = x - x.floor();
  // x = -1e-17 floors to -1 and lands on exactly 1.0
  if w >= 1.0 {
    0.0
  } else {
    w
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_cubic_lattice() {
    // Simple cubic lattice 5.0 Å
    let lattice = [[5.0, 0.0, 0.0], [0.0, 5.0, 0.0], [0.0, 0.0, 5.0]];

    let frac = [0.5, 0.5, 0.5];
    let cart = frac_to_cart(frac, lattice);

    assert!((cart[0] - 2.5).abs() < 1e-10);
    assert!((cart[1] - 2.5).abs() < 1e-10);
    assert!((cart[2] - 2.5).abs() < 1e-10);
  }

  #[test]
  fn test_roundtrip() {
    // Non-orthogonal lattice
    let lattice = [[4.0, 0.0, 0.0], [2.0, 3.46, 0.0], [0.0, 0.0, 5.0]];

    let frac_orig = [0.333, 0.667, 0.25];
    let cart = frac_to_cart(frac_orig, lattice);
    let frac_back = cart_to_frac(cart, lattice).unwrap();

    assert!((frac_back[0] - frac_orig[0]).abs() < 1e-10);
    assert!((frac_back[1] - frac_orig[1]).abs() < 1e-10);
    assert!((frac_back[2] - frac_orig[2]).abs() < 1e-10);
  }

  #[test]
  fn test_singular_lattice() {
    let lattice = [[1.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 5.0]];
    assert!(cart_to_frac([0.0, 0.0, 0.0], lattice).is_none());
  }

  #[test]
  fn test_matrix_rows_roundtrip() {
    let lattice = [[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 10.0]];
    assert_eq!(matrix_rows(&lattice_matrix(lattice)), lattice);
    assert!((determinant(lattice) + 3.0).abs() < 1e-10);
  }

  #[test]
  fn test_wrap() {
    assert_eq!(wrap(1.25), 0.25);
    assert_eq!(wrap(-0.25), 0.75);
    assert_eq!(wrap(-1e-17), 0.0);
    assert_eq!(wrap(0.0), 0.0);
  }
}
