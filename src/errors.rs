// src/errors.rs

use std::fmt;
use std::path::PathBuf;

/// Pipeline stage a failure was raised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Read,
    Classify,
    Recipe,
    Cut,
    Stack,
    Resolve,
    Replicate,
    Strain,
    Bonds,
    Write,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Stage::Read => "read",
            Stage::Classify => "symmetry classification",
            Stage::Recipe => "recipe lookup",
            Stage::Cut => "cut and orient",
            Stage::Stack => "stack",
            Stage::Resolve => "overlap removal",
            Stage::Replicate => "supercell",
            Stage::Strain => "strain analysis",
            Stage::Bonds => "bond analysis",
            Stage::Write => "write",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug)]
pub enum BuildError {
    /// Family label is not in the recipe table.
    UnknownSystem(String),
    /// Wall type is not registered for the family.
    UnknownWallType { family: String, wall: String },
    InvalidDomainSize(f64),
    /// Direction triples (or a lattice) with zero volume.
    DegenerateCell(String),
    InvalidCutoff(f64),
    InvalidAxis(usize),
    InvalidMultiplier(Vec<usize>),
    /// Two cells that must share a species sequence do not.
    MismatchedDomains(String),
    EmptyStructure,
    /// Atom index past the end of a structure with `len` atoms.
    AtomIndex { index: usize, len: usize },
    StructureRead {
        path: PathBuf,
        line: usize,
        reason: String,
    },
    StructureWrite {
        path: PathBuf,
        source: std::io::Error,
    },
    Symmetry(String),
    Config(String),
    /// The built-in recipe table failed its consistency check.
    RecipeTable(String),
    /// Any of the above, tagged with where and on what it happened.
    InStage {
        stage: Stage,
        input: String,
        source: Box<BuildError>,
    },
}

impl BuildError {
    pub fn in_stage(self, stage: Stage, input: impl Into<String>) -> Self {
        BuildError::InStage {
            stage,
            input: input.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, with stage wrappers peeled off.
    pub fn root(&self) -> &BuildError {
        match self {
            BuildError::InStage { source, .. } => source.root(),
            other => other,
        }
    }

    pub(crate) fn read(path: impl Into<PathBuf>, line: usize, reason: impl Into<String>) -> Self {
        BuildError::StructureRead {
            path: path.into(),
            line,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BuildError::UnknownSystem(family) => {
                write!(f, "Unsupported system '{}' (no orientation recipes registered)", family)
            }
            BuildError::UnknownWallType { family, wall } => {
                write!(f, "Domain wall type '{}' is not valid for system {}", wall, family)
            }
            BuildError::InvalidDomainSize(d) => {
                write!(f, "Domain size must be a positive number, got {}", d)
            }
            BuildError::DegenerateCell(what) => write!(f, "Degenerate cell: {}", what),
            BuildError::InvalidCutoff(c) => {
                write!(f, "Cutoff distance must be positive, got {} Å", c)
            }
            BuildError::InvalidAxis(axis) => {
                write!(f, "Axis index must be 0, 1 or 2, got {}", axis)
            }
            BuildError::InvalidMultiplier(m) => {
                write!(f, "Multipliers must be positive integers, got {:?}", m)
            }
            BuildError::MismatchedDomains(why) => write!(f, "Domains do not match: {}", why),
            BuildError::EmptyStructure => write!(f, "Structure contains no atoms"),
            BuildError::AtomIndex { index, len } => {
                write!(f, "Atom index {} out of range for a structure of {} atoms", index, len)
            }
            BuildError::StructureRead { path, line, reason } => {
                if *line == 0 {
                    write!(f, "Cannot read {:?}: {}", path, reason)
                } else {
                    write!(f, "Cannot read {:?} (line {}): {}", path, line, reason)
                }
            }
            BuildError::StructureWrite { path, source } => {
                write!(f, "Cannot write {:?}: {}", path, source)
            }
            BuildError::Symmetry(msg) => write!(f, "Symmetry search failed: {}", msg),
            BuildError::Config(msg) => write!(f, "Configuration error: {}", msg),
            BuildError::RecipeTable(msg) => write!(f, "Invalid recipe table: {}", msg),
            BuildError::InStage {
                stage,
                input,
                source,
            } => write!(f, "[{} | {}] {}", stage, input, source),
        }
    }
}

impl std::error::Error for BuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BuildError::StructureWrite { source, .. } => Some(source),
            BuildError::InStage { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, BuildError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_wrapper_names_stage_and_input() {
        let err = BuildError::InvalidCutoff(-1.0).in_stage(Stage::Resolve, "R180_stacked");
        let msg = err.to_string();
        assert!(msg.contains("overlap removal"));
        assert!(msg.contains("R180_stacked"));
        assert!(matches!(err.root(), BuildError::InvalidCutoff(_)));
    }

    #[test]
    fn read_error_without_line() {
        let err = BuildError::read("missing.vasp", 0, "No such file");
        assert_eq!(err.to_string(), "Cannot read \"missing.vasp\": No such file");
    }
}
