// src/workflow.rs
//
// Runs the pipeline against the file system. Everything below `physics` is
// pure; this module owns reading, writing, the run transcript and the
// output directory layout.

use crate::config::Config;
use crate::errors::{BuildError, Result, Stage};
use crate::io;
use crate::model::recipes::{self, Family, WallRecipe, WallSelection, FAMILIES};
use crate::model::structure::Structure;
use crate::physics::analysis::bonds::{analyze_bonds, compare_bonds, BondAnalysis, BondComparison};
use crate::physics::analysis::strain::{compute_strain, StrainReport};
use crate::physics::analysis::symmetry::{SymmetryClassifier, SymmetryInfo};
use crate::physics::operations::cut::cut_and_orient;
use crate::physics::operations::overlap::{resolve_overlaps, OverlapReport};
use crate::physics::operations::stack::{in_plane_mismatch, stack_alternating, stack_with_tolerance};
use crate::physics::operations::supercell::replicate;
use crate::utils::report::{format_triple, structure_summary, RunLog};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

const ARTIFACT_WARNING: &str = "Generated interfaces can contain artifacts (missing or duplicate atoms at the seam); inspect the stacked structure before using it";

// ========== PURE PIPELINE ==========

/// Every structure produced for one wall, before anything is written.
#[derive(Debug, Clone)]
pub struct WallModel {
    pub recipe: WallRecipe,
    /// Oriented slabs as cut, used for the strain report and the stack.
    pub domains: [Structure; 2],
    /// The same slabs after overlap removal, as written to disk.
    pub cleaned_domains: [Structure; 2],
    pub stacked: Structure,
    pub overlap: OverlapReport,
    pub supercell: Option<(Structure, OverlapReport)>,
    pub strain: StrainReport,
    pub mismatch: f64,
}

/// Cut -> Stack -> Resolve -> (Replicate -> Resolve) for one recipe.
pub fn build_wall(bulk: &Structure, recipe: &WallRecipe, config: &Config) -> Result<WallModel> {
    let tag = format!("{} {}", recipe.family, recipe.wall);

    let cut_domain = |k: usize| -> Result<Structure> {
        let r = &recipe.domains[k];
        cut_and_orient(bulk, r.a, r.b, r.c)
            .map_err(|e| e.in_stage(Stage::Cut, format!("{} domain {}", tag, k + 1)))
    };
    let d1 = cut_domain(0)?;
    let d2 = cut_domain(1)?;

    let mismatch = in_plane_mismatch(&d1, &d2, recipe.stack_axis);
    let stacked = stack_with_tolerance(&d1, &d2, recipe.stack_axis, config.mismatch_tolerance)
        .map_err(|e| e.in_stage(Stage::Stack, tag.clone()))?;
    let (stacked, overlap) = resolve_overlaps(&stacked, config.cutoff, &config.tie_break)
        .map_err(|e| e.in_stage(Stage::Resolve, tag.clone()))?;

    let clean = |s: &Structure| -> Result<Structure> {
        resolve_overlaps(s, config.cutoff, &config.tie_break)
            .map(|(c, _)| c)
            .map_err(|e| e.in_stage(Stage::Resolve, tag.clone()))
    };
    let cleaned_domains = [clean(&d1)?, clean(&d2)?];

    let supercell = if config.supercell != [1, 1, 1] {
        let big = replicate(&stacked, config.supercell).map_err(|e| e.in_stage(Stage::Replicate, tag.clone()))?;
        Some(
            resolve_overlaps(&big, config.cutoff, &config.tie_break)
                .map_err(|e| e.in_stage(Stage::Resolve, format!("{} supercell", tag)))?,
        )
    } else {
        None
    };

    let strain = compute_strain(d1.lattice, d2.lattice).map_err(|e| e.in_stage(Stage::Strain, tag.clone()))?;

    Ok(WallModel {
        recipe: *recipe,
        domains: [d1, d2],
        cleaned_domains,
        stacked: stacked.with_title(format!("{} {} domain wall", recipe.family, recipe.wall)),
        overlap,
        supercell,
        strain,
        mismatch,
    })
}

/// Family of `bulk`: the forced label if given, otherwise the detected one.
pub fn resolve_family(
    forced: Option<&str>,
    symmetry: Option<&SymmetryInfo>,
) -> Result<Family> {
    match (forced, symmetry) {
        (Some(label), _) => Family::from_label(label).ok_or_else(|| BuildError::UnknownSystem(label.to_string())),
        (None, Some(info)) => {
            Family::from_space_group(info.number).ok_or_else(|| BuildError::UnknownSystem(info.symbol.clone()))
        }
        (None, None) => Err(BuildError::UnknownSystem("undetermined".to_string())),
    }
}

// ========== FILE SYSTEM HELPERS ==========

fn create_unique_dir(parent: &Path, name: &str) -> Result<PathBuf> {
    let dir = io::unique_path(parent, name);
    fs::create_dir_all(&dir).map_err(|source| BuildError::StructureWrite {
        path: dir.clone(),
        source,
    })?;
    Ok(dir)
}

fn write_structure(dir: &Path, name: &str, structure: &Structure, log: &mut RunLog) -> Result<PathBuf> {
    let path = dir.join(name);
    io::save_structure(&path, structure).map_err(|e| e.in_stage(Stage::Write, name))?;
    log.info(format!("{} ({} atoms) saved to {}", name, structure.len(), path.display()));
    Ok(path)
}

fn write_summary<T: Serialize>(dir: &Path, summary: &T) -> Result<()> {
    let path = dir.join("summary.json");
    let text = serde_json::to_string_pretty(summary).map_err(|e| BuildError::StructureWrite {
        path: path.clone(),
        source: std::io::Error::from(e),
    })?;
    fs::write(&path, text).map_err(|source| BuildError::StructureWrite { path, source })
}

fn write_log(dir: &Path, log: &RunLog) -> Result<()> {
    let path = dir.join("LOGFILE.txt");
    log.write(&path).map_err(|source| BuildError::StructureWrite {
        path: path.clone(),
        source,
    })?;
    log::info!("Log file written to {}", path.display());
    Ok(())
}

fn log_symmetry(log: &mut RunLog, info: &SymmetryInfo) {
    log.info(format!("Space group number: {}", info.number));
    log.info(format!("International symbol: {}", info.symbol));
    log.info(format!("Lattice type: {}", info.lattice_type));
}

fn load(path: &Path) -> Result<Structure> {
    io::load_structure(path).map_err(|e| e.in_stage(Stage::Read, path.display().to_string()))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ========== WALLS ==========

#[derive(Debug, Clone)]
pub struct WallsRequest {
    pub input: PathBuf,
    /// Skip detection and use this family label.
    pub family: Option<String>,
    /// Wall type label, or `ALL`.
    pub wall: String,
    pub config: Config,
}

#[derive(Debug, Clone, Serialize)]
pub struct WallSummary {
    pub input: String,
    pub family: String,
    pub wall: String,
    pub description: String,
    pub symmetry: Option<SymmetryInfo>,
    pub domain_size: f64,
    pub stack_axis: usize,
    pub domain_atoms: [usize; 2],
    pub stacked_atoms: usize,
    pub in_plane_mismatch: f64,
    pub strain: StrainReport,
    pub overlap: OverlapReport,
    pub supercell: Option<[usize; 3]>,
    pub supercell_overlap: Option<OverlapReport>,
}

#[derive(Debug, Clone)]
pub struct WallOutcome {
    pub directory: PathBuf,
    pub summary: WallSummary,
}

/// Builds every requested wall for the input bulk. All validation and every
/// computation finish before the first directory is created.
pub fn run_walls(request: &WallsRequest, classifier: &dyn SymmetryClassifier) -> Result<Vec<WallOutcome>> {
    recipes::validate_table()?;
    let config = &request.config;
    config.validate()?;

    let mut log = RunLog::new();
    log.info(format!("Read file: {}", request.input.display()));
    let bulk = load(&request.input)?;

    let symmetry = match classifier.classify(&bulk) {
        Ok(info) => {
            log_symmetry(&mut log, &info);
            Some(info)
        }
        // a forced family does not need detection
        Err(e) if request.family.is_some() => {
            log.warn(format!("Symmetry detection failed ({}), using the requested family", e));
            None
        }
        Err(e) => return Err(e.in_stage(Stage::Classify, display_name(&request.input))),
    };

    let family = resolve_family(request.family.as_deref(), symmetry.as_ref())
        .map_err(|e| e.in_stage(Stage::Classify, display_name(&request.input)))?;
    let selection = WallSelection::from_label(&request.wall).ok_or_else(|| {
        BuildError::UnknownWallType {
            family: family.label().to_string(),
            wall: request.wall.clone(),
        }
        .in_stage(Stage::Recipe, family.label())
    })?;
    let walls = recipes::recipes_for(family, selection, config.domain_size)
        .map_err(|e| e.in_stage(Stage::Recipe, family.label()))?;

    log.info(format!("System: {}", family));
    log.info(format!("Domain size: {}", config.domain_size));
    log.info(format!("Cutoff distance: {} Å", config.cutoff));

    let pre = family.pre_orientation(config.polar_axis);
    let start = match pre {
        Some((name, t)) => {
            log.info(format!(
                "Re-oriented bulk ({}): [{}] [{}] [{}]",
                name,
                format_triple(t[0]),
                format_triple(t[1]),
                format_triple(t[2])
            ));
            cut_and_orient(&bulk, t[0], t[1], t[2]).map_err(|e| e.in_stage(Stage::Cut, name))?
        }
        None => bulk.clone(),
    };

    let models = walls
        .iter()
        .map(|r| build_wall(&start, r, config))
        .collect::<Result<Vec<_>>>()?;

    // ========== WRITE ==========
    let mut outcomes = Vec::with_capacity(models.len());
    for model in models {
        let recipe = model.recipe;
        let wall = recipe.wall.label();
        let mut wlog = log.clone();
        let dir = create_unique_dir(&config.output_dir, &format!("{}_{}", family.label(), wall))?;

        wlog.info(format!("Domain wall: {} ({})", wall, recipe.wall.description()));
        for (k, d) in recipe.domains.iter().enumerate() {
            wlog.info(format!(
                "Domain {}: a=[{}] b=[{}] c=[{}]",
                k + 1,
                format_triple(d.a),
                format_triple(d.b),
                format_triple(d.c)
            ));
        }
        wlog.info(format!("Stacking axis: {}", recipe.stack_axis));

        if let Some((name, _)) = pre {
            write_structure(&dir, &format!("{}.vasp", name), &start, &mut wlog)?;
        }
        write_structure(&dir, &format!("{}_stacked.vasp", wall), &model.stacked, &mut wlog)?;
        for (k, slab) in model.cleaned_domains.iter().enumerate() {
            write_structure(&dir, &format!("{}_domain{}.vasp", wall, k + 1), slab, &mut wlog)?;
        }
        if model.mismatch > config.mismatch_tolerance {
            wlog.warn(format!("In-plane mismatch between domains: {:.3}%", model.mismatch * 100.0));
        }
        wlog.block(&model.strain.to_string());
        wlog.block(&model.overlap.to_string());
        for species in &model.overlap.vanished {
            wlog.warn(format!("All {} atoms were removed from the stacked wall", species));
        }
        if let Some((sc, report)) = &model.supercell {
            write_structure(&dir, &format!("{}_supercell.vasp", wall), sc, &mut wlog)?;
            wlog.block(&report.to_string());
        }
        wlog.warn(ARTIFACT_WARNING);

        let summary = WallSummary {
            input: display_name(&request.input),
            family: family.label().to_string(),
            wall: wall.to_string(),
            description: recipe.wall.description().to_string(),
            symmetry: symmetry.clone(),
            domain_size: config.domain_size,
            stack_axis: recipe.stack_axis,
            domain_atoms: [model.domains[0].len(), model.domains[1].len()],
            stacked_atoms: model.stacked.len(),
            in_plane_mismatch: model.mismatch,
            strain: model.strain,
            overlap: model.overlap.clone(),
            supercell: model.supercell.as_ref().map(|_| config.supercell),
            supercell_overlap: model.supercell.as_ref().map(|(_, r)| r.clone()),
        };
        write_summary(&dir, &summary)?;
        write_log(&dir, &wlog)?;

        outcomes.push(WallOutcome { directory: dir, summary });
    }

    Ok(outcomes)
}

// ========== INTERFACE ==========

#[derive(Debug, Clone)]
pub struct InterfaceRequest {
    /// One file (manual domain wall) or two (heterophase interface).
    pub inputs: Vec<PathBuf>,
    /// Direction triples for the first and second slab.
    pub orientations: [[[f64; 3]; 3]; 2],
    pub axis: usize,
    pub config: Config,
}

#[derive(Debug, Clone, Serialize)]
pub struct InterfaceSummary {
    pub inputs: Vec<String>,
    pub symmetry: Vec<Option<SymmetryInfo>>,
    pub stack_axis: usize,
    pub in_plane_mismatch: f64,
    pub strain: StrainReport,
    pub overlap: OverlapReport,
}

#[derive(Debug, Clone)]
pub struct InterfaceOutcome {
    pub directory: PathBuf,
    pub summary: InterfaceSummary,
}

pub fn run_interface(request: &InterfaceRequest, classifier: &dyn SymmetryClassifier) -> Result<InterfaceOutcome> {
    let config = &request.config;
    config.validate()?;
    if request.axis > 2 {
        return Err(BuildError::InvalidAxis(request.axis));
    }
    if request.inputs.is_empty() || request.inputs.len() > 2 {
        return Err(BuildError::MismatchedDomains(format!(
            "expected one or two input files, got {}",
            request.inputs.len()
        )));
    }

    let mut log = RunLog::new();
    for (k, p) in request.inputs.iter().enumerate() {
        log.info(format!("Bulk phase {} file: {}", k + 1, p.display()));
    }
    let bulks = io::load_all(&request.inputs).map_err(|e| e.in_stage(Stage::Read, "interface inputs"))?;
    let manual = bulks.len() == 1;

    let mut symmetry = Vec::with_capacity(bulks.len());
    for (k, b) in bulks.iter().enumerate() {
        match classifier.classify(b) {
            Ok(info) => {
                log.info(format!("Bulk phase {}:", k + 1));
                log_symmetry(&mut log, &info);
                symmetry.push(Some(info));
            }
            Err(e) => {
                log.warn(format!("Symmetry detection failed for bulk phase {}: {}", k + 1, e));
                symmetry.push(None);
            }
        }
    }

    let mut slabs = Vec::with_capacity(2);
    for k in 0..2 {
        let t = request.orientations[k];
        log.info(format!(
            "Bulk {} lattice directions: a=[{}] b=[{}] c=[{}]",
            k + 1,
            format_triple(t[0]),
            format_triple(t[1]),
            format_triple(t[2])
        ));
        let source = if manual { &bulks[0] } else { &bulks[k] };
        let slab = cut_and_orient(source, t[0], t[1], t[2])
            .map_err(|e| e.in_stage(Stage::Cut, format!("slab {}", k + 1)))?;
        slabs.push(slab);
    }

    log.info(format!("Stacking direction: {}", request.axis));
    let mismatch = in_plane_mismatch(&slabs[0], &slabs[1], request.axis);
    let interface = stack_with_tolerance(&slabs[0], &slabs[1], request.axis, config.mismatch_tolerance)
        .map_err(|e| e.in_stage(Stage::Stack, "interface"))?;
    log.info(format!("Cutoff distance: {} Å", config.cutoff));
    let (cleaned, overlap) = resolve_overlaps(&interface, config.cutoff, &config.tie_break)
        .map_err(|e| e.in_stage(Stage::Resolve, "interface"))?;
    let strain = compute_strain(slabs[0].lattice, slabs[1].lattice).map_err(|e| e.in_stage(Stage::Strain, "interface"))?;

    // ========== WRITE ==========
    let dir = create_unique_dir(&config.output_dir, if manual { "Manual" } else { "HIS" })?;
    log.info(format!("Output directory: {}", dir.display()));
    write_structure(&dir, "bulk1.vasp", &slabs[0], &mut log)?;
    write_structure(&dir, "bulk2.vasp", &slabs[1], &mut log)?;
    write_structure(&dir, "interface.vasp", &interface, &mut log)?;
    write_structure(&dir, "interface_cleaned.vasp", &cleaned, &mut log)?;

    if mismatch > config.mismatch_tolerance {
        log.warn(format!("In-plane mismatch between slabs: {:.3}%", mismatch * 100.0));
    }
    log.block(&strain.to_string());
    log.block(&overlap.to_string());
    log.warn(ARTIFACT_WARNING);

    let summary = InterfaceSummary {
        inputs: request.inputs.iter().map(|p| display_name(p)).collect(),
        symmetry,
        stack_axis: request.axis,
        in_plane_mismatch: mismatch,
        strain,
        overlap,
    };
    write_summary(&dir, &summary)?;
    write_log(&dir, &log)?;

    Ok(InterfaceOutcome { directory: dir, summary })
}

// ========== SINGLE ORIENTED CELL ==========

#[derive(Debug, Clone)]
pub struct CutRequest {
    pub input: PathBuf,
    /// Directions a, b and c of the new cell in the bulk lattice.
    pub orientation: [[f64; 3]; 3],
    pub config: Config,
}

#[derive(Debug, Clone, Serialize)]
pub struct CutSummary {
    pub input: String,
    pub symmetry: Option<SymmetryInfo>,
    pub orientation: [[f64; 3]; 3],
    pub atoms: usize,
    pub overlap: OverlapReport,
}

#[derive(Debug, Clone)]
pub struct CutOutcome {
    pub directory: PathBuf,
    pub summary: CutSummary,
}

/// Cuts and rotates one bulk cell, then removes overlapping atoms. Writes
/// `bulk.vasp`, `bulk_cleaned.vasp` and the run files into `RotationMatrix[_n]`.
pub fn run_cut(request: &CutRequest, classifier: &dyn SymmetryClassifier) -> Result<CutOutcome> {
    let config = &request.config;
    config.validate()?;

    let mut log = RunLog::new();
    log.info(format!("Bulk phase file: {}", request.input.display()));
    let bulk = load(&request.input)?;
    let symmetry = match classifier.classify(&bulk) {
        Ok(info) => {
            log_symmetry(&mut log, &info);
            Some(info)
        }
        Err(e) => {
            log.warn(format!("Symmetry detection failed: {}", e));
            None
        }
    };

    let t = request.orientation;
    log.info(format!(
        "Lattice directions: a=[{}] b=[{}] c=[{}]",
        format_triple(t[0]),
        format_triple(t[1]),
        format_triple(t[2])
    ));
    let name = display_name(&request.input);
    let slab = cut_and_orient(&bulk, t[0], t[1], t[2]).map_err(|e| e.in_stage(Stage::Cut, name.clone()))?;
    log.info(format!("Cutoff distance: {} Å", config.cutoff));
    let (cleaned, overlap) =
        resolve_overlaps(&slab, config.cutoff, &config.tie_break).map_err(|e| e.in_stage(Stage::Resolve, name.clone()))?;

    // ========== WRITE ==========
    let dir = create_unique_dir(&config.output_dir, "RotationMatrix")?;
    log.info(format!("Output directory: {}", dir.display()));
    write_structure(&dir, "bulk.vasp", &slab, &mut log)?;
    write_structure(&dir, "bulk_cleaned.vasp", &cleaned, &mut log)?;
    log.block(&overlap.to_string());

    let summary = CutSummary {
        input: name,
        symmetry,
        orientation: t,
        atoms: slab.len(),
        overlap,
    };
    write_summary(&dir, &summary)?;
    write_log(&dir, &log)?;

    Ok(CutOutcome { directory: dir, summary })
}

// ========== ALTERNATING STACK ==========

#[derive(Debug, Clone)]
pub struct AlternateRequest {
    pub first: PathBuf,
    pub second: PathBuf,
    pub axis: usize,
    pub repeats: usize,
    /// File name of the result inside the output directory.
    pub output: String,
    pub config: Config,
}

/// Periodic wall from two relaxed, commensurate cells. Returns the path of
/// the written structure.
pub fn run_alternate(request: &AlternateRequest) -> Result<PathBuf> {
    let mut log = RunLog::new();
    log.info(format!("Supercell size: {}", request.repeats));
    log.info(format!("First cell: {}", request.first.display()));
    log.info(format!("Second cell: {}", request.second.display()));

    let cells = io::load_all(&[request.first.clone(), request.second.clone()])
        .map_err(|e| e.in_stage(Stage::Read, "alternating cells"))?;
    let model = stack_alternating(&cells[0], &cells[1], request.axis, request.repeats)
        .map_err(|e| e.in_stage(Stage::Stack, "alternating cells"))?;

    let out_dir = &request.config.output_dir;
    fs::create_dir_all(out_dir).map_err(|source| BuildError::StructureWrite {
        path: out_dir.clone(),
        source,
    })?;
    let path = io::unique_path(out_dir, &request.output);
    io::save_structure(&path, &model).map_err(|e| e.in_stage(Stage::Write, request.output.clone()))?;
    log.info(format!("Structure ({} atoms) written to {}", model.len(), path.display()));

    let log_path = io::unique_path(out_dir, "LOGFILE.txt");
    log.write(&log_path).map_err(|source| BuildError::StructureWrite { path: log_path, source })?;
    Ok(path)
}

// ========== SUPERCELL ==========

#[derive(Debug, Clone)]
pub struct SupercellRequest {
    pub input: PathBuf,
    pub multipliers: [usize; 3],
    /// Run the overlap pass on the replicated cell.
    pub clean: bool,
    pub config: Config,
}

pub fn run_supercell(request: &SupercellRequest) -> Result<(PathBuf, Option<OverlapReport>)> {
    let bulk = load(&request.input)?;
    let name = display_name(&request.input);
    let big = replicate(&bulk, request.multipliers).map_err(|e| e.in_stage(Stage::Replicate, name.clone()))?;
    let (big, report) = if request.clean {
        let (s, r) = resolve_overlaps(&big, request.config.cutoff, &request.config.tie_break)
            .map_err(|e| e.in_stage(Stage::Resolve, name.clone()))?;
        (s, Some(r))
    } else {
        (big, None)
    };

    let out_dir = &request.config.output_dir;
    fs::create_dir_all(out_dir).map_err(|source| BuildError::StructureWrite {
        path: out_dir.clone(),
        source,
    })?;
    let stem = name.split('.').next().filter(|s| !s.is_empty()).unwrap_or("structure");
    let path = io::unique_path(out_dir, &format!("{}_supercell.vasp", stem));
    io::save_structure(&path, &big).map_err(|e| e.in_stage(Stage::Write, name))?;
    log::info!("Supercell ({} atoms) written to {}", big.len(), path.display());
    Ok((path, report))
}

// ========== READ-ONLY REPORTS ==========

#[derive(Debug, Clone)]
pub struct BondsRequest {
    /// One structure, or two to compare.
    pub inputs: Vec<PathBuf>,
    /// Bonds are pairs closer than this, in Å.
    pub radius: f64,
}

#[derive(Debug, Clone)]
pub struct BondsOutcome {
    pub analyses: Vec<BondAnalysis>,
    /// Present when two structures were given.
    pub comparison: Option<BondComparison>,
}

pub fn run_bonds(request: &BondsRequest) -> Result<BondsOutcome> {
    if request.inputs.is_empty() || request.inputs.len() > 2 {
        return Err(BuildError::MismatchedDomains(format!(
            "expected one or two input files, got {}",
            request.inputs.len()
        )));
    }
    let structures = io::load_all(&request.inputs).map_err(|e| e.in_stage(Stage::Read, "bond analysis inputs"))?;
    let analyses = structures
        .iter()
        .zip(&request.inputs)
        .map(|(s, p)| analyze_bonds(s, request.radius).map_err(|e| e.in_stage(Stage::Bonds, display_name(p))))
        .collect::<Result<Vec<_>>>()?;
    let comparison = match analyses.as_slice() {
        [first, second] => Some(compare_bonds(first, second)),
        _ => None,
    };
    Ok(BondsOutcome { analyses, comparison })
}

pub fn run_strain(first: &Path, second: &Path) -> Result<StrainReport> {
    let cells = io::load_all(&[first.to_path_buf(), second.to_path_buf()])
        .map_err(|e| e.in_stage(Stage::Read, "strain inputs"))?;
    compute_strain(cells[0].lattice, cells[1].lattice).map_err(|e| e.in_stage(Stage::Strain, "strain inputs"))
}

/// Symmetry lines, supported family and structure summary for one file.
pub fn run_info(input: &Path, classifier: &dyn SymmetryClassifier) -> Result<String> {
    let s = load(input)?;
    let info = classifier
        .classify(&s)
        .map_err(|e| e.in_stage(Stage::Classify, display_name(input)))?;

    let mut out = String::new();
    out.push_str(&format!("Space group number: {}\n", info.number));
    out.push_str(&format!("International symbol: {}\n", info.symbol));
    out.push_str(&format!("Crystal system: {}\n", info.system));
    out.push_str(&format!("Lattice type: {}\n", info.lattice_type));
    match Family::from_space_group(info.number) {
        Some(f) => {
            let walls: Vec<&str> = f.walls().iter().map(|w| w.label()).collect();
            out.push_str(&format!("Supported family: {} (walls: {})\n", f, walls.join(", ")));
        }
        None => out.push_str("Supported family: none\n"),
    }
    out.push_str(&structure_summary(&s, &display_name(input)));
    Ok(out)
}

/// Human-readable dump of the recipe table.
pub fn recipe_listing(family: Option<Family>, domain_size: f64) -> Result<String> {
    recipes::validate_table()?;
    let families: Vec<Family> = match family {
        Some(f) => vec![f],
        None => FAMILIES.to_vec(),
    };

    let mut out = String::new();
    for f in families {
        out.push_str(&format!("{}\n", f));
        for r in recipes::recipes_for(f, WallSelection::All, domain_size)? {
            out.push_str(&format!("  {:<11} axis {}  {}\n", r.wall.label(), r.stack_axis, r.wall.description()));
            for (k, d) in r.domains.iter().enumerate() {
                out.push_str(&format!(
                    "      domain {}: [{}] [{}] [{}]  (x{:.3} volume)\n",
                    k + 1,
                    format_triple(d.a),
                    format_triple(d.b),
                    format_triple(d.c),
                    d.volume_factor()
                ));
            }
        }
    }
    Ok(out)
}
