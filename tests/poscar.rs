use dwgen::errors::BuildError;
use dwgen::io::{self, poscar};
use dwgen::model::Structure;
use std::path::{Path, PathBuf};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("data").join(name)
}

#[test]
fn reads_vasp5_direct() {
    let s = io::load_structure(&fixture("BaTiO3_R3m.vasp")).unwrap();
    assert_eq!(s.len(), 5);
    assert_eq!(s.species(), vec!["Ba", "Ti", "O"]);
    assert_eq!(s.title, "BaTiO3 R3m, pseudo-cubic setting");
    assert!((s.volume() - 64.0).abs() < 1e-9);
    assert!((s.atoms[1].position[0] - 2.04).abs() < 1e-12);
}

#[test]
fn reads_vasp4_with_selective_dynamics() {
    let s = io::load_structure(&fixture("SrTiO3_vasp4.vasp")).unwrap();
    assert_eq!(s.species(), vec!["Sr", "Ti", "O"]);
    assert!((s.lengths()[0] - 3.905).abs() < 1e-12);
    // Cartesian coordinates are scaled like the lattice
    assert!((s.atoms[1].position[2] - 1.9525).abs() < 1e-12);
}

#[test]
fn reports_line_of_truncation() {
    let err = io::load_structure(&fixture("truncated.vasp")).unwrap_err();
    match err {
        BuildError::StructureRead { line, reason, .. } => {
            assert_eq!(line, 10);
            assert!(reason.contains("atomic position"));
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn negative_scale_is_a_volume() {
    let text = "cell\n-125.0\n1 0 0\n0 1 0\n0 0 1\nNa\n1\nDirect\n0 0 0\n";
    let s = poscar::parse_str(text, Path::new("inline")).unwrap();
    assert!((s.volume() - 125.0).abs() < 1e-9);
    assert!((s.lengths()[0] - 5.0).abs() < 1e-9);
}

#[test]
fn write_is_reproducible_and_round_trips() {
    let original = io::load_structure(&fixture("BaTiO3_R3m.vasp")).unwrap();
    let text = poscar::to_poscar_string(&original).unwrap();
    assert_eq!(text, poscar::to_poscar_string(&original.clone()).unwrap());

    let back = poscar::parse_str(&text, Path::new("round-trip")).unwrap();
    assert_eq!(back.species(), original.species());
    let (fa, fb) = (original.fractional_positions().unwrap(), back.fractional_positions().unwrap());
    for (a, b) in fa.iter().zip(&fb) {
        for k in 0..3 {
            assert!((a[k] - b[k]).abs() < 1e-10);
        }
    }
}

#[test]
fn species_are_grouped_on_write() {
    let s = Structure::from_fractional(
        [[4.0, 0.0, 0.0], [0.0, 4.0, 0.0], [0.0, 0.0, 4.0]],
        vec![
            ("O", [0.5, 0.5, 0.0]),
            ("Pb", [0.0, 0.0, 0.0]),
            ("O", [0.5, 0.0, 0.5]),
            ("Ti", [0.5, 0.5, 0.5]),
            ("O", [0.0, 0.5, 0.5]),
        ],
        "",
    );
    let text = poscar::to_poscar_string(&s).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[5].split_whitespace().collect::<Vec<_>>(), vec!["O", "Pb", "Ti"]);
    assert_eq!(lines[6].split_whitespace().collect::<Vec<_>>(), vec!["3", "1", "1"]);
    assert_eq!(lines[7], "Direct");
    // second O line comes straight after the first
    assert!(lines[9].trim_start().starts_with("0.500000000000"));
    assert!(lines[9].trim_end().ends_with("0.500000000000"));
}
