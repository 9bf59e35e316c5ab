// src/config.rs

use crate::errors::{BuildError, Result};
use crate::model::recipes::PolarAxis;
use crate::physics::operations::overlap::TieBreak;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

// --- Main Config Struct ---

/// Run defaults. Every field is optional in settings.json and every one can
/// be overridden from the command line.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
  /// Overlap removal distance in Å.
  pub cutoff: f64,
  /// Scale factor applied to the recipe direction triples.
  pub domain_size: f64,
  /// Replication of the stacked wall; [1, 1, 1] skips the supercell.
  pub supercell: [usize; 3],
  /// Polar axis of Pmc2_1 inputs.
  pub polar_axis: PolarAxis,
  pub tie_break: TieBreak,
  pub symprec: f64,
  /// Relative in-plane mismatch above which stacking logs a warning.
  pub mismatch_tolerance: f64,
  /// Worker threads for the neighbor search, 0 = one per core.
  pub threads: usize,
  pub output_dir: PathBuf,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      cutoff: 0.6,
      domain_size: 1.0,
      supercell: [1, 1, 1],
      polar_axis: PolarAxis::C,
      tie_break: TieBreak::KeepLowerIndex,
      symprec: 1e-4,
      mismatch_tolerance: 1e-3,
      threads: 0,
      output_dir: PathBuf::from("."),
    }
  }
}

impl Config {
  /// Loads config from standard OS location (e.g., ~/.config/dwgen/settings.json).
  /// Never fails: problems are reported in the returned message and the
  /// defaults are used instead.
  pub fn load() -> (Self, String) {
    let path = Self::get_path();
    if path.exists() {
      match Self::load_from(&path) {
        Ok(cfg) => (cfg, format!("Config loaded from {:?}", path)),
        Err(e) => (Self::default(), format!("{}; using defaults", e)),
      }
    } else {
      (
        Self::default(),
        "No config found. Using defaults.".to_string(),
      )
    }
  }

  /// Loads an explicit config file. Unlike [`Config::load`] a bad file is an error.
  pub fn load_from(path: &Path) -> Result<Self> {
    let file = File::open(path)
      .map_err(|e| BuildError::Config(format!("cannot open {:?}: {}", path, e)))?;
    let cfg: Config = serde_json::from_reader(BufReader::new(file))
      .map_err(|e| BuildError::Config(format!("cannot parse {:?}: {}", path, e)))?;
    cfg.validate()?;
    Ok(cfg)
  }

  /// Saves config to standard OS location
  pub fn save(&self) -> String {
    let path = Self::get_path();
    match self.save_to(&path) {
      Ok(()) => format!("Config saved to {:?}", path),
      Err(e) => format!("Failed to save config: {}", e),
    }
  }

  pub fn save_to(&self, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).map_err(|e| BuildError::Config(e.to_string()))?;
    }
    let file = File::create(path).map_err(|e| BuildError::Config(format!("cannot create {:?}: {}", path, e)))?;
    serde_json::to_writer_pretty(BufWriter::new(file), self).map_err(|e| BuildError::Config(e.to_string()))
  }

  /// Rejects values no run could use, before any file is touched.
  pub fn validate(&self) -> Result<()> {
    if !self.cutoff.is_finite() || self.cutoff <= 0.0 {
      return Err(BuildError::InvalidCutoff(self.cutoff));
    }
    if !self.domain_size.is_finite() || self.domain_size <= 0.0 {
      return Err(BuildError::InvalidDomainSize(self.domain_size));
    }
    if self.supercell.contains(&0) {
      return Err(BuildError::InvalidMultiplier(self.supercell.to_vec()));
    }
    if !(self.symprec > 0.0) || !(self.mismatch_tolerance >= 0.0) {
      return Err(BuildError::Config(format!(
        "symprec must be positive and mismatch_tolerance non-negative (got {} and {})",
        self.symprec, self.mismatch_tolerance
      )));
    }
    Ok(())
  }

  pub fn get_path() -> PathBuf {
    if let Some(proj) = ProjectDirs::from("org", "dwgen", "dwgen") {
      proj.config_dir().join("settings.json")
    } else {
      PathBuf::from("settings.json")
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_partial_file_keeps_defaults() {
    let cfg: Config = serde_json::from_str(r#"{"cutoff": 0.8, "polar_axis": "a"}"#).unwrap();
    assert_eq!(cfg.cutoff, 0.8);
    assert_eq!(cfg.polar_axis, PolarAxis::A);
    assert_eq!(cfg.supercell, [1, 1, 1]);
    assert_eq!(cfg.tie_break, TieBreak::KeepLowerIndex);
  }

  #[test]
  fn test_validate() {
    assert!(Config::default().validate().is_ok());
    let bad = Config {
      supercell: [2, 0, 1],
      ..Config::default()
    };
    assert!(matches!(bad.validate(), Err(BuildError::InvalidMultiplier(_))));
    let bad = Config {
      domain_size: -1.0,
      ..Config::default()
    };
    assert!(matches!(bad.validate(), Err(BuildError::InvalidDomainSize(_))));
  }

  #[test]
  fn test_save_and_load_explicit_path() {
    let dir = std::env::temp_dir().join(format!("dwgen_config_test_{}", std::process::id()));
    let path = dir.join("settings.json");
    let cfg = Config {
      cutoff: 0.75,
      tie_break: TieBreak::SpeciesPriority(vec!["O".into()]),
      ..Config::default()
    };
    cfg.save_to(&path).unwrap();
    assert_eq!(Config::load_from(&path).unwrap(), cfg);
    let _ = fs::remove_dir_all(&dir);
  }
}
