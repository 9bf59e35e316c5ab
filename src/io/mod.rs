// src/io/mod.rs
pub mod poscar;

use crate::errors::{BuildError, Result};
use crate::model::Structure;
use std::path::{Path, PathBuf};

/// Extensions of formats we recognise but do not read.
const FOREIGN_FORMATS: [&str; 6] = ["cif", "xyz", "in", "pwi", "qe", "xsf"];

pub fn load_structure(path: &Path) -> Result<Structure> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    if FOREIGN_FORMATS.contains(&ext.as_str()) {
        return Err(BuildError::read(
            path,
            0,
            format!("'.{}' files are not supported, convert to POSCAR first", ext),
        ));
    }
    // POSCAR, CONTCAR, *.vasp and anything without a known extension
    poscar::parse(path)
}

/// Reads every file or none: the first failure aborts the whole batch.
pub fn load_all(paths: &[PathBuf]) -> Result<Vec<Structure>> {
    paths.iter().map(|p| load_structure(p)).collect()
}

pub fn save_structure(path: &Path, structure: &Structure) -> Result<()> {
    poscar::write(path, structure)
}

/// `dir/name`, or `dir/name_1`, `dir/name_2`, ... if that already exists.
pub fn unique_path(dir: &Path, name: &str) -> PathBuf {
    let candidate = dir.join(name);
    if !candidate.exists() {
        return candidate;
    }

    let (stem, ext) = match name.rsplit_once('.') {
        Some((s, e)) if !s.is_empty() => (s.to_string(), format!(".{}", e)),
        _ => (name.to_string(), String::new()),
    };
    let mut counter = 1;
    loop {
        let p = dir.join(format!("{}_{}{}", stem, counter, ext));
        if !p.exists() {
            return p;
        }
        counter += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_foreign_format_rejected() {
        let err = load_structure(Path::new("structure.cif")).unwrap_err();
        assert!(err.to_string().contains("convert to POSCAR"));
    }

    #[test]
    fn test_missing_file() {
        let err = load_structure(Path::new("/definitely/not/here/POSCAR")).unwrap_err();
        assert!(matches!(err, BuildError::StructureRead { line: 0, .. }));
    }

    #[test]
    fn test_unique_path_on_fresh_name() {
        let dir = std::env::temp_dir();
        let p = unique_path(&dir, "dwgen_unique_path_probe_never_exists.vasp");
        assert_eq!(p, dir.join("dwgen_unique_path_probe_never_exists.vasp"));
    }
}
