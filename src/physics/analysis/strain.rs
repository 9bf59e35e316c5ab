// src/physics/analysis/strain.rs
use crate::errors::{BuildError, Result};
use crate::utils::linalg;
use serde::Serialize;
use std::fmt;

const AXES: [&str; 3] = ["a", "b", "c"];

/// Mismatch of `cell_a` relative to `cell_b`, axis by axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StrainReport {
    /// (|v_a| - |v_b|) / |v_b| in percent.
    pub linear: [f64; 3],
    /// Angle between v_a and v_b in radians.
    pub angular: [f64; 3],
}

impl StrainReport {
    pub fn max_abs_linear(&self) -> f64 {
        self.linear.iter().fold(0.0, |m, x| m.max(x.abs()))
    }
}

impl fmt::Display for StrainReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Strain (first cell relative to second):")?;
        for k in 0..3 {
            writeln!(
                f,
                "  {}: linear {:>9.4} %   angular {:>9.6} rad",
                AXES[k], self.linear[k], self.angular[k]
            )?;
        }
        Ok(())
    }
}

pub fn compute_strain(cell_a: [[f64; 3]; 3], cell_b: [[f64; 3]; 3]) -> Result<StrainReport> {
    let mut linear = [0.0; 3];
    let mut angular = [0.0; 3];

    for k in 0..3 {
        let va = cell_a[k];
        let vb = cell_b[k];
        let (la, lb) = (linalg::norm(va), linalg::norm(vb));
        if la == 0.0 || lb == 0.0 {
            return Err(BuildError::DegenerateCell(format!(
                "lattice vector {} has zero length",
                AXES[k]
            )));
        }
        linear[k] = (la - lb) / lb * 100.0;
        angular[k] = (linalg::dot(va, vb) / (la * lb)).clamp(-1.0, 1.0).acos();
    }

    Ok(StrainReport { linear, angular })
}

#[cfg(test)]
mod tests {
    use super::*;

    const CUBIC: [[f64; 3]; 3] = [[4.0, 0.0, 0.0], [0.0, 4.0, 0.0], [0.0, 0.0, 4.0]];

    #[test]
    fn test_identical_cells_have_no_strain() {
        let r = compute_strain(CUBIC, CUBIC).unwrap();
        for k in 0..3 {
            assert_eq!(r.linear[k], 0.0);
            assert!(r.angular[k].abs() < 1e-6);
        }
    }

    #[test]
    fn test_linear_and_angular() {
        let a = [[4.04, 0.0, 0.0], [0.0, 4.0, 0.0], [0.0, 4.0, 4.0]];
        let r = compute_strain(a, CUBIC).unwrap();
        assert!((r.linear[0] - 1.0).abs() < 1e-9);
        assert!((r.angular[2] - std::f64::consts::FRAC_PI_4).abs() < 1e-9);
        assert!((r.max_abs_linear() - 100.0 * (2f64.sqrt() - 1.0)).abs() < 1e-9);
    }

    #[test]
    fn test_zero_vector_is_rejected() {
        let mut a = CUBIC;
        a[1] = [0.0; 3];
        assert!(matches!(compute_strain(a, CUBIC), Err(BuildError::DegenerateCell(_))));
    }
}
