// src/model/recipes.rs
//
// Orientation relationships for the supported ferroelectric families. Each
// wall is a pair of direction triples (in the bulk lattice basis) whose
// members differ by the sign/axis flip relating the two twin domains.

use crate::errors::{BuildError, Result};
use crate::utils::linalg;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Family {
    R3m,
    R3c,
    P4mm,
    Pnma,
    Pmc21,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WallType {
    R180,
    R71,
    R109,
    T180,
    T90,
    Fdw,
    O120HhTt,
    O120Ht,
    O180,
    O90,
}

/// A single wall type or every wall registered for a family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WallSelection {
    One(WallType),
    All,
}

/// Crystallographic axis carrying the polarization of orthorhombic cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolarAxis {
    A,
    B,
    C,
}

impl Default for PolarAxis {
    fn default() -> Self {
        PolarAxis::C
    }
}

impl PolarAxis {
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "a" => Some(PolarAxis::A),
            "b" => Some(PolarAxis::B),
            "c" => Some(PolarAxis::C),
            _ => None,
        }
    }
}

pub const FAMILIES: [Family; 5] = [
    Family::R3c,
    Family::R3m,
    Family::P4mm,
    Family::Pmc21,
    Family::Pnma,
];

fn normalize(label: &str) -> String {
    label
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .collect::<String>()
        .to_ascii_uppercase()
}

impl Family {
    pub fn label(&self) -> &'static str {
        match self {
            Family::R3m => "R3m",
            Family::R3c => "R3c",
            Family::P4mm => "P4mm",
            Family::Pnma => "Pnma",
            Family::Pmc21 => "Pmc2_1",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        let key = normalize(label);
        FAMILIES.iter().copied().find(|f| normalize(f.label()) == key)
    }

    /// Family of an international space-group number, if one is registered.
    pub fn from_space_group(number: i32) -> Option<Self> {
        match number {
            26 => Some(Family::Pmc21),
            62 => Some(Family::Pnma),
            99 => Some(Family::P4mm),
            160 => Some(Family::R3m),
            161 => Some(Family::R3c),
            _ => None,
        }
    }

    pub fn walls(&self) -> &'static [WallType] {
        match self {
            Family::R3m => &[WallType::R180, WallType::R71, WallType::R109],
            Family::R3c => &[WallType::R109, WallType::R71, WallType::R180],
            Family::P4mm => &[WallType::T180, WallType::T90],
            Family::Pnma => &[WallType::Fdw],
            Family::Pmc21 => &[
                WallType::O120HhTt,
                WallType::O120Ht,
                WallType::O180,
                WallType::O90,
            ],
        }
    }

    /// Re-orientation applied to the bulk before any wall recipe is cut.
    /// Returns a short name for the intermediate cell and its triples.
    pub fn pre_orientation(&self, polar: PolarAxis) -> Option<(&'static str, [[f64; 3]; 3])> {
        match self {
            // Rhombohedral cell -> pseudo-cubic setting
            Family::R3c => Some((
                "pseudo_cubic",
                [[1.0, 1.0, -1.0], [-1.0, 1.0, 1.0], [1.0, -1.0, 1.0]],
            )),
            Family::Pmc21 => {
                let m = match polar {
                    PolarAxis::A => [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
                    PolarAxis::B => [[0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0]],
                    PolarAxis::C => [[0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
                };
                Some(("polar_reoriented", m))
            }
            _ => None,
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

const WALL_TYPES: [WallType; 10] = [
    WallType::R180,
    WallType::R71,
    WallType::R109,
    WallType::T180,
    WallType::T90,
    WallType::Fdw,
    WallType::O120HhTt,
    WallType::O120Ht,
    WallType::O180,
    WallType::O90,
];

impl WallType {
    pub fn label(&self) -> &'static str {
        match self {
            WallType::R180 => "R180",
            WallType::R71 => "R71",
            WallType::R109 => "R109",
            WallType::T180 => "T180",
            WallType::T90 => "T90",
            WallType::Fdw => "FDW",
            WallType::O120HhTt => "O120_HH_TT",
            WallType::O120Ht => "O120_HT",
            WallType::O180 => "O180",
            WallType::O90 => "O90",
        }
    }

    /// Short numeric alias used for the orthorhombic walls.
    fn alias(&self) -> Option<&'static str> {
        match self {
            WallType::O120HhTt => Some("1"),
            WallType::O120Ht => Some("2"),
            WallType::O180 => Some("3"),
            WallType::O90 => Some("4"),
            _ => None,
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        let key = normalize(label);
        WALL_TYPES
            .iter()
            .copied()
            .find(|w| normalize(w.label()) == key || w.alias() == Some(key.as_str()))
    }

    pub fn description(&self) -> &'static str {
        match self {
            WallType::R180 => "180° wall, rhombohedral",
            WallType::R71 => "71° wall, rhombohedral",
            WallType::R109 => "109° wall, rhombohedral",
            WallType::T180 => "180° wall, tetragonal",
            WallType::T90 => "90° wall, tetragonal",
            WallType::Fdw => "ferroelastic wall, orthorhombic",
            WallType::O120HhTt => "120° head-to-head / tail-to-tail wall",
            WallType::O120Ht => "120° head-to-tail wall",
            WallType::O180 => "180° wall, orthorhombic",
            WallType::O90 => "90° wall, orthorhombic",
        }
    }
}

impl fmt::Display for WallType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl WallSelection {
    pub fn from_label(label: &str) -> Option<Self> {
        if normalize(label) == "ALL" {
            Some(WallSelection::All)
        } else {
            WallType::from_label(label).map(WallSelection::One)
        }
    }
}

/// One oriented domain: new cell = [a, b, c] in the bulk basis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrientationRecipe {
    pub a: [f64; 3],
    pub b: [f64; 3],
    pub c: [f64; 3],
    pub stack_axis: usize,
    pub domain_size: f64,
}

impl OrientationRecipe {
    pub fn triples(&self) -> [[f64; 3]; 3] {
        [self.a, self.b, self.c]
    }

    /// Volume multiple of the cut cell relative to the bulk.
    pub fn volume_factor(&self) -> f64 {
        linalg::determinant(self.triples()).abs()
    }
}

/// A domain wall: exactly two domains stacked along a shared axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WallRecipe {
    pub family: Family,
    pub wall: WallType,
    pub stack_axis: usize,
    pub domains: [OrientationRecipe; 2],
}

fn pair(axis: usize, d: f64, first: [[f64; 3]; 3], second: [[f64; 3]; 3]) -> [OrientationRecipe; 2] {
    let make = |t: [[f64; 3]; 3]| OrientationRecipe {
        a: t[0],
        b: t[1],
        c: t[2],
        stack_axis: axis,
        domain_size: d,
    };
    [make(first), make(second)]
}

/// The table itself. `None` when the wall does not belong to the family.
#[rustfmt::skip]
fn lookup(family: Family, wall: WallType, d: f64) -> Option<WallRecipe> {
    use Family::*;
    use WallType::*;

    let (axis, domains) = match (family, wall) {
        (R3m, R180) => (
            2,
            pair(2, d,
                [[1.0, 1.0, 0.0], [0.0, 0.0, 1.0], [d, -d, 0.0]],
                [[-1.0, -1.0, 0.0], [0.0, 0.0, -1.0], [d, -d, 0.0]]),
        ),
        (R3m, R71) => (
            0,
            pair(0, d,
                [[d, d, 0.0], [0.0, 0.0, 1.0], [1.0, -1.0, 0.0]],
                [[d, d, 0.0], [0.0, 0.0, -1.0], [-1.0, 1.0, 0.0]]),
        ),
        (R3m, R109) => (
            0,
            pair(0, d,
                [[d, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
                [[d, 0.0, 0.0], [0.0, -1.0, 0.0], [0.0, 0.0, -1.0]]),
        ),
        (R3c, R109) => (
            2,
            pair(2, d,
                [[0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, d]],
                [[0.0, -1.0, 0.0], [-1.0, 0.0, 0.0], [0.0, 0.0, d]]),
        ),
        (R3c, R71) => (
            2,
            pair(2, d,
                [[1.0, -1.0, 0.0], [0.0, 0.0, 1.0], [d, d, 0.0]],
                [[-1.0, 1.0, 0.0], [0.0, 0.0, -1.0], [d, d, 0.0]]),
        ),
        (R3c, R180) => (
            2,
            pair(2, d,
                [[1.0, 1.0, 0.0], [0.0, 0.0, -1.0], [-d, d, 0.0]],
                [[-1.0, -1.0, 0.0], [0.0, 0.0, 1.0], [-d, d, 0.0]]),
        ),
        // 1.01 keeps the boundary atoms of the tetragonal cell from landing
        // exactly on the cut planes
        (P4mm, T180) => (
            1,
            pair(1, d,
                [[1.01, 0.0, 0.0], [0.0, d, 0.0], [0.0, 0.0, 1.01]],
                [[-1.01, 0.0, 0.0], [0.0, d, 0.0], [0.0, 0.0, -1.01]]),
        ),
        (P4mm, T90) => (
            2,
            pair(2, d,
                [[0.0, 1.0, 0.0], [-1.0, 0.0, 1.0], [d, 0.0, d]],
                [[0.0, -1.0, 0.0], [1.0, 0.0, -1.0], [d, 0.0, d]]),
        ),
        (Pnma, Fdw) => (
            2,
            pair(2, d,
                [[1.0, 1.0, 0.0], [0.0, 0.0, 1.0], [d, -d, 0.0]],
                [[-1.0, 1.0, 0.0], [0.0, 0.0, 1.0], [d, d, 0.0]]),
        ),
        (Pmc21, O120HhTt) => (
            1,
            pair(1, d,
                [[-1.0, -2.0, 0.0], [2.0 * d, -d, 0.0], [0.0, 0.0, 1.0]],
                [[-1.0, 2.0, 0.0], [-2.0 * d, -d, 0.0], [0.0, 0.0, 1.0]]),
        ),
        (Pmc21, O120Ht) => (
            0,
            pair(0, d,
                [[-d, -2.0 * d, 0.0], [2.0, -1.0, 0.0], [0.0, 0.0, 1.0]],
                [[-d, 2.0 * d, 0.0], [-2.0, -1.0, 0.0], [0.0, 0.0, 1.0]]),
        ),
        (Pmc21, O180) => (
            1,
            pair(1, d,
                [[1.0, 0.0, 0.0], [0.0, d, 0.0], [0.0, 0.0, 1.0]],
                [[-1.0, 0.0, 0.0], [0.0, -d, 0.0], [0.0, 0.0, 1.0]]),
        ),
        (Pmc21, O90) => (
            0,
            pair(0, d,
                [[0.0, d, 0.0], [-1.0, 0.0, 0.0], [0.0, 0.0, 1.0]],
                [[-d, 0.0, 0.0], [0.0, -1.0, 0.0], [0.0, 0.0, 1.0]]),
        ),
        _ => return None,
    };

    Some(WallRecipe {
        family,
        wall,
        stack_axis: axis,
        domains,
    })
}

/// Typed lookup: every recipe for `selection` in `family`.
pub fn recipes_for(family: Family, selection: WallSelection, domain_size: f64) -> Result<Vec<WallRecipe>> {
    if !(domain_size.is_finite() && domain_size > 0.0) {
        return Err(BuildError::InvalidDomainSize(domain_size));
    }

    match selection {
        WallSelection::All => Ok(family
            .walls()
            .iter()
            .filter_map(|&w| lookup(family, w, domain_size))
            .collect()),
        WallSelection::One(wall) => lookup(family, wall, domain_size)
            .map(|r| vec![r])
            .ok_or_else(|| BuildError::UnknownWallType {
                family: family.label().to_string(),
                wall: wall.label().to_string(),
            }),
    }
}

/// Label-based lookup. `wall_type` may be `ALL`.
pub fn get_recipes(family: &str, wall_type: &str, domain_size: f64) -> Result<Vec<WallRecipe>> {
    let fam = Family::from_label(family).ok_or_else(|| BuildError::UnknownSystem(family.to_string()))?;
    let selection = WallSelection::from_label(wall_type).ok_or_else(|| BuildError::UnknownWallType {
        family: fam.label().to_string(),
        wall: wall_type.to_string(),
    })?;
    recipes_for(fam, selection, domain_size)
}

/// Consistency check over the whole table.
pub fn validate_table() -> Result<()> {
    let fail = |msg: String| Err(BuildError::RecipeTable(msg));

    for family in FAMILIES {
        if family.walls().is_empty() {
            return fail(format!("{} has no wall types", family));
        }
        for &wall in family.walls() {
            let recipe = match lookup(family, wall, 1.0) {
                Some(r) => r,
                None => return fail(format!("{} lists {} without a recipe", family, wall)),
            };
            if recipe.stack_axis > 2 {
                return fail(format!("{} {}: stacking axis {}", family, wall, recipe.stack_axis));
            }
            for (i, dom) in recipe.domains.iter().enumerate() {
                if dom.stack_axis != recipe.stack_axis {
                    return fail(format!("{} {}: domain {} stacks on another axis", family, wall, i + 1));
                }
                if dom.volume_factor() < 1e-8 {
                    return fail(format!("{} {}: domain {} is degenerate", family, wall, i + 1));
                }
            }
            if recipe.domains[0].triples() == recipe.domains[1].triples() {
                return fail(format!("{} {}: both domains have the same orientation", family, wall));
            }
        }
    }

    // Walls registered for a family must be exactly the ones the table knows.
    for family in FAMILIES {
        for wall in WALL_TYPES {
            if lookup(family, wall, 1.0).is_some() && !family.walls().contains(&wall) {
                return fail(format!("{} has an unlisted recipe for {}", family, wall));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_consistent() {
        validate_table().unwrap();
    }

    #[test]
    fn test_r3m_r180_scales_with_domain_size() {
        let r = get_recipes("R3m", "R180", 2.0).unwrap();
        assert_eq!(r.len(), 1);
        assert_eq!(r[0].stack_axis, 2);
        assert_eq!(r[0].domains[0].c, [2.0, -2.0, 0.0]);
        assert_eq!(r[0].domains[1].a, [-1.0, -1.0, 0.0]);
        assert!((r[0].domains[0].volume_factor() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_all_expands_every_wall() {
        let r = get_recipes("Pmc2_1", "ALL", 1.0).unwrap();
        let walls: Vec<WallType> = r.iter().map(|w| w.wall).collect();
        assert_eq!(walls, Family::Pmc21.walls().to_vec());
    }

    #[test]
    fn test_labels_and_aliases() {
        assert_eq!(Family::from_label("pmc21"), Some(Family::Pmc21));
        assert_eq!(Family::from_label("R3c"), Some(Family::R3c));
        assert_eq!(WallType::from_label("2"), Some(WallType::O120Ht));
        assert_eq!(WallType::from_label("o120_hh_tt"), Some(WallType::O120HhTt));
        assert_eq!(WallSelection::from_label("all"), Some(WallSelection::All));
    }

    #[test]
    fn test_unknown_family() {
        let err = get_recipes("P6_3cm", "R180", 1.0).unwrap_err();
        assert!(matches!(err, BuildError::UnknownSystem(_)));
    }

    #[test]
    fn test_wall_of_other_family() {
        let err = get_recipes("P4mm", "R71", 1.0).unwrap_err();
        assert!(matches!(err, BuildError::UnknownWallType { .. }));
        let err = get_recipes("P4mm", "X42", 1.0).unwrap_err();
        assert!(matches!(err, BuildError::UnknownWallType { .. }));
    }

    #[test]
    fn test_bad_domain_size() {
        assert!(matches!(
            get_recipes("R3m", "R71", 0.0),
            Err(BuildError::InvalidDomainSize(_))
        ));
        assert!(matches!(
            get_recipes("R3m", "R71", f64::NAN),
            Err(BuildError::InvalidDomainSize(_))
        ));
    }

    #[test]
    fn test_space_group_mapping() {
        assert_eq!(Family::from_space_group(161), Some(Family::R3c));
        assert_eq!(Family::from_space_group(26), Some(Family::Pmc21));
        assert_eq!(Family::from_space_group(185), None);
    }
}
