// src/io/poscar.rs

use crate::errors::{BuildError, Result};
use crate::model::elements::get_atomic_number;
use crate::model::{Atom, Structure};
use crate::utils::linalg;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

pub fn parse(path: &Path) -> Result<Structure> {
    let text = fs::read_to_string(path).map_err(|e| BuildError::read(path, 0, e.to_string()))?;
    parse_str(&text, path)
}

/// Line cursor that remembers where it is for error messages.
struct Lines<'a> {
    inner: std::iter::Enumerate<std::str::Lines<'a>>,
    origin: &'a Path,
    last: usize,
}

impl<'a> Lines<'a> {
    fn next(&mut self, what: &str) -> Result<&'a str> {
        match self.inner.next() {
            Some((i, line)) => {
                self.last = i + 1;
                Ok(line)
            }
            None => Err(BuildError::read(
                self.origin,
                self.last + 1,
                format!("Unexpected end of file, expected {}", what),
            )),
        }
    }

    fn fail(&self, reason: impl Into<String>) -> BuildError {
        BuildError::read(self.origin, self.last, reason)
    }
}

fn parse_floats(lines: &Lines, line: &str, n: usize, what: &str) -> Result<Vec<f64>> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < n {
        return Err(lines.fail(format!("Invalid {} line: '{}'", what, line.trim())));
    }
    parts[..n]
        .iter()
        .map(|p| {
            p.parse::<f64>()
                .map_err(|_| lines.fail(format!("Invalid number '{}' in {} line", p, what)))
        })
        .collect()
}

/// Strips POTCAR-style decorations ("Fe_pv", "O/abc123") from a species label.
fn clean_species(token: &str) -> String {
    token
        .split(|c| c == '/' || c == '_')
        .next()
        .unwrap_or(token)
        .to_string()
}

/// Parses POSCAR/CONTCAR text. `origin` only labels errors.
pub fn parse_str(text: &str, origin: &Path) -> Result<Structure> {
    let mut lines = Lines {
        inner: text.lines().enumerate(),
        origin,
        last: 0,
    };

    let title = lines.next("comment line")?.trim().to_string();

    // Scale: one value (negative = target volume) or one per axis
    let scale_line = lines.next("scale factor")?;
    let scale_vals: Vec<f64> = scale_line
        .split_whitespace()
        .map(|p| p.parse::<f64>())
        .collect::<std::result::Result<_, _>>()
        .map_err(|_| lines.fail("Invalid scale factor"))?;
    if scale_vals.is_empty() || scale_vals.iter().any(|s| *s == 0.0 || !s.is_finite()) {
        return Err(lines.fail("Invalid scale factor"));
    }

    // Lattice
    let mut lattice = [[0.0; 3]; 3];
    for row in lattice.iter_mut() {
        let line = lines.next("lattice vector")?;
        let v = parse_floats(&lines, line, 3, "lattice")?;
        row.copy_from_slice(&v);
    }

    let scale = if scale_vals.len() >= 3 {
        [scale_vals[0], scale_vals[1], scale_vals[2]]
    } else if scale_vals[0] < 0.0 {
        let raw = linalg::determinant(lattice).abs();
        if raw < 1e-12 {
            return Err(lines.fail("Lattice is singular"));
        }
        let s = (-scale_vals[0] / raw).cbrt();
        [s, s, s]
    } else {
        [scale_vals[0]; 3]
    };
    for row in lattice.iter_mut() {
        for k in 0..3 {
            row[k] *= scale[k];
        }
    }
    if linalg::determinant(lattice).abs() < 1e-12 {
        return Err(lines.fail("Lattice is singular"));
    }

    // Elements & Counts
    let line6 = lines.next("species or counts line")?;
    let starts_alpha = line6
        .trim()
        .chars()
        .next()
        .map(|c| c.is_alphabetic())
        .unwrap_or(false);
    let (species_tokens, counts_line): (Option<Vec<String>>, &str) = if starts_alpha {
        let names = line6.split_whitespace().map(clean_species).collect();
        (Some(names), lines.next("counts line")?)
    } else {
        (None, line6)
    };

    let counts: Vec<usize> = counts_line
        .split_whitespace()
        .map(|x| x.parse::<usize>())
        .collect::<std::result::Result<_, _>>()
        .map_err(|_| lines.fail(format!("Invalid atom counts '{}'", counts_line.trim())))?;
    if counts.is_empty() {
        return Err(lines.fail("No atom counts"));
    }

    let species: Vec<String> = match species_tokens {
        Some(names) => {
            if names.len() != counts.len() {
                return Err(lines.fail(format!(
                    "{} species but {} counts",
                    names.len(),
                    counts.len()
                )));
            }
            names
        }
        None => {
            // VASP4: species often live on the comment line
            let from_title: Vec<String> = title.split_whitespace().map(clean_species).collect();
            if from_title.len() == counts.len()
                && from_title.iter().all(|s| get_atomic_number(s) > 0)
            {
                from_title
            } else {
                (1..=counts.len()).map(|i| format!("X{}", i)).collect()
            }
        }
    };

    // Mode
    let mut mode_line = lines.next("coordinate mode")?;
    if mode_line.trim_start().to_lowercase().starts_with('s') {
        mode_line = lines.next("coordinate mode")?;
    }
    let mode = mode_line.trim_start().to_lowercase();
    let is_cartesian = mode.starts_with('c') || mode.starts_with('k');

    // Atoms
    let total: usize = counts.iter().sum();
    let mut atoms = Vec::with_capacity(total);
    for (elem, &count) in species.iter().zip(&counts) {
        for _ in 0..count {
            let line = lines.next("atomic position")?;
            let v = parse_floats(&lines, line, 3, "position")?;
            let position = if is_cartesian {
                [v[0] * scale[0], v[1] * scale[1], v[2] * scale[2]]
            } else {
                linalg::frac_to_cart([v[0], v[1], v[2]], lattice)
            };
            let idx = atoms.len();
            atoms.push(Atom::new(elem.clone(), position, idx));
        }
    }

    Ok(Structure::new(lattice, atoms, title))
}

/// Normalizes -0.0 so identical structures print identically.
fn clean(x: f64) -> f64 {
    x + 0.0
}

/// Fractional coordinate as written: wrapped into [0, 1), with values that
/// would round up to 1.0 at 12 decimals written as 0.0.
fn coordinate(x: f64) -> f64 {
    let w = linalg::wrap(x);
    if w >= 1.0 - 5e-13 {
        0.0
    } else {
        clean(w)
    }
}

/// Serializes a structure in VASP5 POSCAR layout with direct coordinates.
/// Atoms are grouped by species in order of first appearance; the order
/// within a species block is the input order.
pub fn to_poscar_string(structure: &Structure) -> Result<String> {
    let frac = structure.fractional_positions()?;
    let species = structure.species();

    let mut out = String::new();
    let title = if structure.title.trim().is_empty() {
        "Generated by dwgen"
    } else {
        structure.title.lines().next().unwrap_or("")
    };
    // Writing into a String cannot fail
    let _ = writeln!(out, "{}", title);
    let _ = writeln!(out, "{:>19.14}", 1.0);
    for vec in &structure.lattice {
        let _ = writeln!(
            out,
            " {:>22.12} {:>22.12} {:>22.12}",
            clean(vec[0]),
            clean(vec[1]),
            clean(vec[2])
        );
    }

    let mut species_line = String::new();
    let mut counts_line = String::new();
    for el in &species {
        let n = structure.atoms.iter().filter(|a| &a.element == el).count();
        let _ = write!(species_line, " {:>5}", el);
        let _ = write!(counts_line, " {:>5}", n);
    }
    let _ = writeln!(out, "{}", species_line);
    let _ = writeln!(out, "{}", counts_line);
    let _ = writeln!(out, "Direct");

    for el in &species {
        for (atom, f) in structure.atoms.iter().zip(&frac) {
            if &atom.element != el {
                continue;
            }
            let _ = writeln!(
                out,
                " {:>22.12} {:>22.12} {:>22.12}",
                coordinate(f[0]),
                coordinate(f[1]),
                coordinate(f[2])
            );
        }
    }

    Ok(out)
}

pub fn write(path: &Path, structure: &Structure) -> Result<()> {
    let text = to_poscar_string(structure)?;
    fs::write(path, text).map_err(|source| BuildError::StructureWrite {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const BATIO3: &str = "BaTiO3 tetragonal
1.0
  3.99 0.0 0.0
  0.0 3.99 0.0
  0.0 0.0 4.03
Ba Ti O
1 1 3
Direct
0.0 0.0 0.0
0.5 0.5 0.52
0.5 0.5 0.97
0.5 0.0 0.48
0.0 0.5 0.48
";

    #[test]
    fn test_parse_vasp5() {
        let s = parse_str(BATIO3, Path::new("BTO")).unwrap();
        assert_eq!(s.title, "BaTiO3 tetragonal");
        assert_eq!(s.len(), 5);
        assert_eq!(s.species(), vec!["Ba", "Ti", "O"]);
        assert!((s.atoms[1].position[2] - 0.52 * 4.03).abs() < 1e-12);
    }

    #[test]
    fn test_parse_vasp4_takes_species_from_title() {
        let text = "Sr Ti O
1.0
3.9 0 0
0 3.9 0
0 0 3.9
1 1 3
Selective dynamics
Cartesian
0 0 0 T T T
1.95 1.95 1.95 T T T
1.95 1.95 0 F F F
1.95 0 1.95 F F F
0 1.95 1.95 F F F
";
        let s = parse_str(text, Path::new("STO")).unwrap();
        assert_eq!(s.species(), vec!["Sr", "Ti", "O"]);
        assert_eq!(s.atoms[1].position, [1.95, 1.95, 1.95]);
    }

    #[test]
    fn test_negative_scale_is_volume() {
        let text = "cube\n-27.0\n1 0 0\n0 1 0\n0 0 1\nSi\n1\nDirect\n0 0 0\n";
        let s = parse_str(text, Path::new("cube")).unwrap();
        assert!((s.volume() - 27.0).abs() < 1e-9);
    }

    #[test]
    fn test_truncated_file_reports_line() {
        let text = "t\n1.0\n1 0 0\n0 1 0\n0 0 1\nSi\n2\nDirect\n0 0 0\n";
        match parse_str(text, Path::new("short")) {
            Err(BuildError::StructureRead { line, .. }) => assert_eq!(line, 10),
            other => panic!("expected read error, got {:?}", other),
        }
    }

    #[test]
    fn test_bad_number_reports_line() {
        let text = "t\n1.0\n1 0 0\n0 x 0\n0 0 1\nSi\n1\nDirect\n0 0 0\n";
        match parse_str(text, Path::new("bad")) {
            Err(BuildError::StructureRead { line, .. }) => assert_eq!(line, 4),
            other => panic!("expected read error, got {:?}", other),
        }
    }

    #[test]
    fn test_write_is_reproducible_and_reads_back() {
        let s = parse_str(BATIO3, Path::new("BTO")).unwrap();
        let first = to_poscar_string(&s).unwrap();
        let again = parse_str(&first, Path::new("again")).unwrap();
        let second = to_poscar_string(&again).unwrap();
        assert_eq!(first, second);
        for (a, b) in s.atoms.iter().zip(&again.atoms) {
            assert_eq!(a.element, b.element);
            for k in 0..3 {
                assert!((a.position[k] - b.position[k]).abs() < 1e-10);
            }
        }
    }

    #[test]
    fn test_coordinates_just_below_one_are_written_as_zero() {
        let s = Structure::from_fractional(
            [[4.0, 0.0, 0.0], [0.0, 4.0, 0.0], [0.0, 0.0, 4.0]],
            vec![("Ti", [-1e-14, 0.5, 0.5]), ("O", [0.5, 1.0 - 2e-13, 0.25])],
            "edge",
        );
        let first = to_poscar_string(&s).unwrap();
        assert!(!first.contains("1.000000000000"));

        let lines: Vec<&str> = first.lines().collect();
        let ti: Vec<&str> = lines[8].split_whitespace().collect();
        assert_eq!(ti, vec!["0.000000000000", "0.500000000000", "0.500000000000"]);
        let o: Vec<&str> = lines[9].split_whitespace().collect();
        assert_eq!(o[1], "0.000000000000");

        let again = to_poscar_string(&parse_str(&first, Path::new("edge")).unwrap()).unwrap();
        assert_eq!(first, again);
    }

    #[test]
    fn test_write_groups_species_blocks() {
        let s = Structure::from_fractional(
            [[2.0, 0.0, 0.0], [0.0, 2.0, 0.0], [0.0, 0.0, 2.0]],
            vec![("O", [0.1, 0.0, 0.0]), ("Fe", [0.5, 0.5, 0.5]), ("O", [0.2, 0.0, 0.0])],
            "mixed",
        );
        let text = to_poscar_string(&s).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[5].split_whitespace().collect::<Vec<_>>(), vec!["O", "Fe"]);
        assert_eq!(lines[6].split_whitespace().collect::<Vec<_>>(), vec!["2", "1"]);
        assert!(lines[8].trim_start().starts_with("0.1000"));
        assert!(lines[9].trim_start().starts_with("0.2000"));
        assert!(lines[10].trim_start().starts_with("0.5000"));
    }
}
