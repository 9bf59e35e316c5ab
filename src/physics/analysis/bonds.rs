// src/physics/analysis/bonds.rs
use super::neighbors::{periodic_bonds, NeighborPair};
use crate::errors::Result;
use crate::model::structure::Structure;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Summary of a set of bond lengths, in Å.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BondStatistics {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    /// Population standard deviation.
    pub std_dev: f64,
    pub shortest: f64,
    pub longest: f64,
}

impl BondStatistics {
    /// `None` for an empty set. `lengths` must be sorted ascending.
    fn from_sorted(lengths: &[f64]) -> Option<Self> {
        let count = lengths.len();
        if count == 0 {
            return None;
        }
        let n = count as f64;
        let mean = lengths.iter().sum::<f64>() / n;
        let median = if count % 2 == 1 {
            lengths[count / 2]
        } else {
            0.5 * (lengths[count / 2 - 1] + lengths[count / 2])
        };
        let variance = lengths.iter().map(|l| (l - mean).powi(2)).sum::<f64>() / n;
        Some(Self {
            count,
            mean,
            median,
            std_dev: variance.sqrt(),
            shortest: lengths[0],
            longest: lengths[count - 1],
        })
    }
}

/// All bonds between one pair of species, e.g. `O-Ti`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BondType {
    pub bond: String,
    /// Sorted ascending.
    pub lengths: Vec<f64>,
    pub stats: BondStatistics,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BondAnalysis {
    pub cutoff: f64,
    pub total: usize,
    pub overall: Option<BondStatistics>,
    /// Ordered by bond label.
    pub by_type: Vec<BondType>,
    pub shortest: Option<NeighborPair>,
    pub longest: Option<NeighborPair>,
}

impl BondAnalysis {
    pub fn get(&self, bond: &str) -> Option<&BondType> {
        self.by_type.iter().find(|t| t.bond == bond)
    }
}

/// Label of the bond between two species, sorted so `Ti-O` and `O-Ti` agree.
pub fn bond_label(a: &str, b: &str) -> String {
    if a <= b {
        format!("{}-{}", a, b)
    } else {
        format!("{}-{}", b, a)
    }
}

/// Groups every bond shorter than `cutoff` by species pair.
pub fn analyze_bonds(structure: &Structure, cutoff: f64) -> Result<BondAnalysis> {
    let bonds = periodic_bonds(structure, cutoff)?;

    let mut groups: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for b in &bonds {
        let label = bond_label(&structure.atoms[b.i].element, &structure.atoms[b.j].element);
        groups.entry(label).or_default().push(b.distance);
    }

    let by_type: Vec<BondType> = groups
        .into_iter()
        .filter_map(|(bond, mut lengths)| {
            lengths.sort_by(f64::total_cmp);
            let stats = BondStatistics::from_sorted(&lengths)?;
            Some(BondType { bond, lengths, stats })
        })
        .collect();

    let mut all: Vec<f64> = bonds.iter().map(|b| b.distance).collect();
    all.sort_by(f64::total_cmp);

    Ok(BondAnalysis {
        cutoff,
        total: bonds.len(),
        overall: BondStatistics::from_sorted(&all),
        by_type,
        shortest: bonds.iter().min_by(|p, q| p.distance.total_cmp(&q.distance)).copied(),
        longest: bonds.iter().max_by(|p, q| p.distance.total_cmp(&q.distance)).copied(),
    })
}

/// Change of one bond type between two structures, in %.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BondChange {
    pub bond: String,
    pub count: [usize; 2],
    pub mean_change: f64,
    pub median_change: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BondComparison {
    pub changes: Vec<BondChange>,
    pub only_first: Vec<String>,
    pub only_second: Vec<String>,
}

/// Relative change of the mean and median length of every bond type the
/// two analyses share, plus the types found in only one of them.
pub fn compare_bonds(first: &BondAnalysis, second: &BondAnalysis) -> BondComparison {
    let labels = |a: &BondAnalysis| -> BTreeSet<String> { a.by_type.iter().map(|t| t.bond.clone()).collect() };
    let (l1, l2) = (labels(first), labels(second));
    let percent = |before: f64, after: f64| (after - before) / before * 100.0;

    let changes = l1
        .intersection(&l2)
        .filter_map(|bond| {
            let (a, b) = (first.get(bond)?, second.get(bond)?);
            Some(BondChange {
                bond: bond.clone(),
                count: [a.stats.count, b.stats.count],
                mean_change: percent(a.stats.mean, b.stats.mean),
                median_change: percent(a.stats.median, b.stats.median),
            })
        })
        .collect();

    BondComparison {
        changes,
        only_first: l1.difference(&l2).cloned().collect(),
        only_second: l2.difference(&l1).cloned().collect(),
    }
}

impl fmt::Display for BondAnalysis {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Found {} bonds (r < {:.3} Å)", self.total, self.cutoff)?;
        let Some(all) = &self.overall else {
            return Ok(());
        };
        writeln!(
            f,
            "  {:<10} {:>6} {:>9} {:>9} {:>9} {:>9} {:>9}",
            "Bond", "Count", "Mean", "Median", "Std", "Min", "Max"
        )?;
        let row = |f: &mut fmt::Formatter, label: &str, s: &BondStatistics| {
            writeln!(
                f,
                "  {:<10} {:>6} {:>9.4} {:>9.4} {:>9.4} {:>9.4} {:>9.4}",
                label, s.count, s.mean, s.median, s.std_dev, s.shortest, s.longest
            )
        };
        for t in &self.by_type {
            row(f, &t.bond, &t.stats)?;
        }
        row(f, "all", all)?;
        if let (Some(s), Some(l)) = (&self.shortest, &self.longest) {
            writeln!(f, "  Shortest bond: atoms {}-{} at {:.4} Å", s.i, s.j, s.distance)?;
            writeln!(f, "  Longest bond:  atoms {}-{} at {:.4} Å", l.i, l.j, l.distance)?;
        }
        Ok(())
    }
}

impl fmt::Display for BondComparison {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Percentage change in bond lengths:")?;
        for c in &self.changes {
            writeln!(
                f,
                "  {:<10} mean {:+.2}%  median {:+.2}%  ({} -> {} bonds)",
                c.bond, c.mean_change, c.median_change, c.count[0], c.count[1]
            )?;
        }
        if !self.only_first.is_empty() {
            writeln!(f, "Only in structure 1: {}", self.only_first.join(", "))?;
        }
        if !self.only_second.is_empty() {
            writeln!(f, "Only in structure 2: {}", self.only_second.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn srtio3(a: f64) -> Structure {
        Structure::from_fractional(
            [[a, 0.0, 0.0], [0.0, a, 0.0], [0.0, 0.0, a]],
            vec![
                ("Sr", [0.0, 0.0, 0.0]),
                ("Ti", [0.5, 0.5, 0.5]),
                ("O", [0.5, 0.5, 0.0]),
                ("O", [0.5, 0.0, 0.5]),
                ("O", [0.0, 0.5, 0.5]),
            ],
            "SrTiO3",
        )
    }

    #[test]
    fn test_octahedron_only() {
        let r = analyze_bonds(&srtio3(3.9), 2.0).unwrap();
        assert_eq!(r.total, 6);
        assert_eq!(r.by_type.len(), 1);
        let ti_o = r.get("O-Ti").unwrap();
        assert_eq!(ti_o.stats.count, 6);
        assert!((ti_o.stats.mean - 1.95).abs() < 1e-9);
        assert!(ti_o.stats.std_dev < 1e-9);
    }

    #[test]
    fn test_bond_types_and_statistics() {
        let r = analyze_bonds(&srtio3(3.9), 3.0).unwrap();
        let labels: Vec<&str> = r.by_type.iter().map(|t| t.bond.as_str()).collect();
        assert_eq!(labels, vec!["O-O", "O-Sr", "O-Ti"]);
        assert_eq!(r.get("O-O").unwrap().stats.count, 12);
        assert_eq!(r.get("O-Sr").unwrap().stats.count, 12);
        assert_eq!(r.total, 30);

        let all = r.overall.unwrap();
        let long = 3.9 * 0.5f64.sqrt();
        assert!((all.shortest - 1.95).abs() < 1e-9);
        assert!((all.longest - long).abs() < 1e-9);
        // 24 of 30 bonds are long, so the median is long too
        assert!((all.median - long).abs() < 1e-9);
        assert!((r.shortest.unwrap().distance - 1.95).abs() < 1e-9);
    }

    #[test]
    fn test_statistics_of_even_count() {
        let s = BondStatistics::from_sorted(&[1.0, 2.0, 3.0, 6.0]).unwrap();
        assert_eq!(s.median, 2.5);
        assert_eq!(s.mean, 3.0);
        assert!((s.std_dev - 3.5f64.sqrt()).abs() < 1e-12);
        assert!(BondStatistics::from_sorted(&[]).is_none());
    }

    #[test]
    fn test_compare_expanded_cell() {
        let before = analyze_bonds(&srtio3(3.9), 3.0).unwrap();
        let after = analyze_bonds(&srtio3(3.939), 2.0).unwrap();
        let cmp = compare_bonds(&before, &after);
        assert_eq!(cmp.changes.len(), 1);
        assert_eq!(cmp.changes[0].bond, "O-Ti");
        assert!((cmp.changes[0].mean_change - 1.0).abs() < 1e-9);
        assert!((cmp.changes[0].median_change - 1.0).abs() < 1e-9);
        assert_eq!(cmp.only_first, vec!["O-O".to_string(), "O-Sr".to_string()]);
        assert!(cmp.only_second.is_empty());
    }

    #[test]
    fn test_bond_label_is_order_independent() {
        assert_eq!(bond_label("Ti", "O"), bond_label("O", "Ti"));
    }
}
