// src/utils/report.rs

use crate::model::structure::Structure;
use crate::utils::linalg;
use std::fs;
use std::path::Path;

/// "1 1 0", "2.5 -2.5 0", "1.01 0 0"
pub fn format_triple(v: [f64; 3]) -> String {
    v.iter()
        .map(|x| {
            let x = *x + 0.0;
            if x.fract() == 0.0 {
                format!("{}", x as i64)
            } else {
                format!("{}", x)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text block describing a structure: formula, cell and the first atoms.
pub fn structure_summary(structure: &Structure, name: &str) -> String {
    let mut out = String::new();
    out.push_str(&format!("File: {}\n", name));
    out.push_str(&format!("Formula: {}\n", structure.formula()));
    let [a, b, c] = structure.lengths();
    out.push_str(&format!(
        "Cell: a={:.5} b={:.5} c={:.5} Å  alpha={:.3} beta={:.3} gamma={:.3}  V={:.4} Å³\n",
        a,
        b,
        c,
        angle_deg(structure.lattice[1], structure.lattice[2]),
        angle_deg(structure.lattice[0], structure.lattice[2]),
        angle_deg(structure.lattice[0], structure.lattice[1]),
        structure.volume()
    ));
    out.push_str("--------------------------------------------------\n");
    out.push_str(&format!(
        "{:<8} {:<8} {:<10} {:<10} {:<10}\n",
        "Index", "Element", "X", "Y", "Z"
    ));
    out.push_str("--------------------------------------------------\n");

    for (i, atom) in structure.atoms.iter().take(20).enumerate() {
        out.push_str(&format!(
            "{:<8} {:<8} {:<10.4} {:<10.4} {:<10.4}\n",
            i, atom.element, atom.position[0], atom.position[1], atom.position[2]
        ));
    }

    if structure.atoms.len() > 20 {
        out.push_str(&format!("... and {} more atoms.\n", structure.atoms.len() - 20));
    }

    out
}

fn angle_deg(u: [f64; 3], v: [f64; 3]) -> f64 {
    let denom = linalg::norm(u) * linalg::norm(v);
    if denom == 0.0 {
        return 0.0;
    }
    (linalg::dot(u, v) / denom).clamp(-1.0, 1.0).acos().to_degrees()
}

/// Transcript of one workflow run. Every line also goes to the logger.
#[derive(Debug, Default, Clone)]
pub struct RunLog {
    lines: Vec<String>,
}

impl RunLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn info(&mut self, line: impl Into<String>) {
        let line = line.into();
        log::info!("{}", line);
        self.lines.push(line);
    }

    pub fn warn(&mut self, line: impl Into<String>) {
        let line = line.into();
        log::warn!("{}", line);
        self.lines.push(format!("Warning: {}", line));
    }

    /// Multi-line text (a report's Display output) recorded line by line.
    pub fn block(&mut self, text: &str) {
        for line in text.lines() {
            self.info(line.to_string());
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn write(&self, path: &Path) -> std::io::Result<()> {
        let mut text = self.lines.join("\n");
        text.push('\n');
        fs::write(path, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_triple() {
        assert_eq!(format_triple([1.0, -1.0, 0.0]), "1 -1 0");
        assert_eq!(format_triple([1.01, 0.0, -0.0]), "1.01 0 0");
        assert_eq!(format_triple([2.5, -2.5, 0.0]), "2.5 -2.5 0");
    }

    #[test]
    fn test_summary_lists_cell() {
        let s = Structure::from_fractional(
            [[4.0, 0.0, 0.0], [0.0, 4.0, 0.0], [0.0, 0.0, 4.0]],
            vec![("Pb", [0.0, 0.0, 0.0]), ("Ti", [0.5, 0.5, 0.5])],
            "PT",
        );
        let text = structure_summary(&s, "POSCAR");
        assert!(text.contains("Formula: Pb1 Ti1"));
        assert!(text.contains("alpha=90.000"));
        assert!(text.contains("V=64.0000"));
    }

    #[test]
    fn test_runlog_marks_warnings() {
        let mut log = RunLog::new();
        log.info("start");
        log.warn("strain");
        log.block("a\nb");
        assert_eq!(log.lines(), &["start", "Warning: strain", "a", "b"]);
    }
}
