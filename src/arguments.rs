use crate::config::Config;
use crate::errors::{BuildError, Result};
use crate::model::recipes::{Family, PolarAxis};
use crate::physics::operations::overlap::TieBreak;
use crate::utils::logger;
use crate::workflow::{
    AlternateRequest, BondsRequest, CutRequest, InterfaceRequest, SupercellRequest, WallsRequest,
};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use log::LevelFilter;
use std::path::PathBuf;

/// What the user asked the program to do.
#[derive(Debug, Clone)]
pub enum Task {
    Info(PathBuf),
    Recipes(Option<Family>),
    Walls(WallsRequest),
    Interface(InterfaceRequest),
    Cut(CutRequest),
    Alternate(AlternateRequest),
    Supercell(SupercellRequest),
    Strain(PathBuf, PathBuf),
    Bonds(BondsRequest),
}

/// Create a container for dealing with clap and being able to test arg parsing
pub enum ClapApp {
    App,
}

impl ClapApp {
    /// Create and return the clap::Command
    pub fn get(&self) -> Command {
        Command::new("dwgen")
            .about("Domain-wall and phase-interface structure generator")
            .version(env!("CARGO_PKG_VERSION"))
            .subcommand_required(true)
            .arg_required_else_help(true)
            .arg(Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count)
                .global(true)
                .help("More log output (-vv for trace)."))
            .arg(Arg::new("quiet")
                .short('q')
                .long("quiet")
                .action(ArgAction::SetTrue)
                .global(true)
                .conflicts_with("verbose")
                .help("Only log errors."))
            .arg(Arg::new("config")
                .long("config")
                .value_parser(value_parser!(PathBuf))
                .global(true)
                .help("Settings file to use instead of the per-user one.")
                .long_help(
"A JSON settings file. Without this flag the per-user settings.json in the
standard configuration directory is read if it exists. Command line flags
override values from either file."))
            .arg(Arg::new("output")
                .short('o')
                .long("output")
                .value_parser(value_parser!(PathBuf))
                .global(true)
                .help("Directory the results are written into."))
            .arg(Arg::new("save config")
                .long("save-config")
                .action(ArgAction::SetTrue)
                .global(true)
                .help("Store the settings of this run as the per-user defaults."))
            .arg(Arg::new("threads")
                .short('J')
                .long("threads")
                .value_parser(value_parser!(usize))
                .global(true)
                .help("Number of threads for the neighbor search.")
                .long_help(
"The number of threads to be used by the program. A value of 0 allows the
program to best decide how to use the available hardware."))
            .subcommand(Command::new("info")
                .about("Print symmetry information and a structure summary.")
                .arg(file_arg("file", 1, "Bulk structure (POSCAR).")))
            .subcommand(Command::new("recipes")
                .about("List the registered orientation recipes.")
                .arg(family_arg())
                .arg(domain_size_arg()))
            .subcommand(Command::new("walls")
                .about("Build domain walls from a bulk structure.")
                .arg(file_arg("file", 1, "Bulk structure (POSCAR)."))
                .arg(family_arg())
                .arg(Arg::new("wall")
                    .short('w')
                    .long("wall")
                    .default_value("ALL")
                    .help("Wall type (e.g. R180, T90, O120_HT) or ALL.")
                    .long_help(
"The domain-wall type to build. ALL builds every wall registered for the
family. The orthorhombic walls also accept the aliases 1 to 4."))
                .arg(domain_size_arg())
                .arg(cutoff_arg())
                .arg(Arg::new("supercell")
                    .short('s')
                    .long("supercell")
                    .num_args(3)
                    .value_names(["N1", "N2", "N3"])
                    .value_parser(value_parser!(usize))
                    .help("Replicate the stacked wall N1 x N2 x N3 times."))
                .arg(Arg::new("polar axis")
                    .short('p')
                    .long("polar-axis")
                    .value_parser(["a", "b", "c"])
                    .help("Polar axis of Pmc2_1 inputs."))
                .arg(keep_arg()))
            .subcommand(Command::new("interface")
                .about("Stack two oriented slabs into an interface.")
                .long_about(
"Cuts one slab from each bulk file along user-supplied lattice directions and
stacks them. With a single file both slabs are cut from it, which builds a
domain wall with manual orientation relationships.")
                .arg(file_arg("first", 1, "First bulk structure."))
                .arg(Arg::new("second")
                    .index(2)
                    .value_parser(value_parser!(PathBuf))
                    .help("Second bulk structure (omit for a manual domain wall)."))
                .arg(direction_arg("a1", "Direction a of the first slab, e.g. 1,1,0."))
                .arg(direction_arg("b1", "Direction b of the first slab."))
                .arg(direction_arg("c1", "Direction c of the first slab."))
                .arg(direction_arg("a2", "Direction a of the second slab."))
                .arg(direction_arg("b2", "Direction b of the second slab."))
                .arg(direction_arg("c2", "Direction c of the second slab."))
                .arg(axis_arg().required(true))
                .arg(cutoff_arg())
                .arg(keep_arg()))
            .subcommand(Command::new("cut")
                .about("Cut and rotate one bulk cell along new lattice directions.")
                .arg(file_arg("file", 1, "Bulk structure (POSCAR)."))
                .arg(direction_arg("a", "New lattice vector a, e.g. 1,1,0."))
                .arg(direction_arg("b", "New lattice vector b."))
                .arg(direction_arg("c", "New lattice vector c."))
                .arg(cutoff_arg())
                .arg(keep_arg()))
            .subcommand(Command::new("alternate")
                .about("Alternate two relaxed cells along one axis (NDW/CDW models).")
                .arg(file_arg("first", 1, "Cell used for the first half of the stack."))
                .arg(file_arg("second", 2, "Cell used for the second half."))
                .arg(Arg::new("repeats")
                    .short('n')
                    .long("repeats")
                    .required(true)
                    .value_parser(value_parser!(usize))
                    .help("Total number of cells along the axis."))
                .arg(axis_arg().default_value("2"))
                .arg(Arg::new("name")
                    .long("name")
                    .default_value("alternate.vasp")
                    .help("File name of the result.")))
            .subcommand(Command::new("supercell")
                .about("Replicate a structure.")
                .arg(file_arg("file", 1, "Structure to replicate."))
                .arg(Arg::new("size")
                    .long("size")
                    .num_args(3)
                    .required(true)
                    .value_names(["N1", "N2", "N3"])
                    .value_parser(value_parser!(usize))
                    .help("Multipliers along a, b and c."))
                .arg(Arg::new("clean")
                    .long("clean")
                    .action(ArgAction::SetTrue)
                    .help("Remove overlapping atoms after replication."))
                .arg(cutoff_arg())
                .arg(keep_arg()))
            .subcommand(Command::new("strain")
                .about("Report the strain of one cell relative to another.")
                .arg(file_arg("first", 1, "Strained cell."))
                .arg(file_arg("second", 2, "Reference cell.")))
            .subcommand(Command::new("bonds")
                .about("Bond-length statistics of a structure, or the change between two.")
                .arg(file_arg("first", 1, "Structure to analyse."))
                .arg(Arg::new("second")
                    .index(2)
                    .value_parser(value_parser!(PathBuf))
                    .help("Second structure to compare against the first."))
                .arg(Arg::new("radius")
                    .short('r')
                    .long("radius")
                    .required(true)
                    .value_parser(value_parser!(f64))
                    .help("Atoms closer than this (Å) are bonded.")))
    }
}

fn file_arg(id: &'static str, index: usize, help: &'static str) -> Arg {
    Arg::new(id)
        .required(true)
        .index(index)
        .value_parser(value_parser!(PathBuf))
        .help(help)
}

fn family_arg() -> Arg {
    Arg::new("family")
        .short('f')
        .long("family")
        .help("Force a family (R3m, R3c, P4mm, Pnma, Pmc2_1) instead of detecting it.")
}

fn domain_size_arg() -> Arg {
    Arg::new("domain size")
        .short('d')
        .long("domain-size")
        .value_parser(value_parser!(f64))
        .help("Scale factor of the wall-normal direction.")
}

fn cutoff_arg() -> Arg {
    Arg::new("cutoff")
        .short('c')
        .long("cutoff")
        .value_parser(value_parser!(f64))
        .help("Atoms closer than this (Å) are treated as duplicates.")
}

fn keep_arg() -> Arg {
    Arg::new("keep")
        .short('k')
        .long("keep")
        .num_args(1..)
        .value_delimiter(',')
        .help("Species kept first when two atoms overlap, e.g. Pb,Ti.")
        .long_help(
"Resolve close pairs by species priority: the atom whose species appears
earlier in this list survives. Without it the atom with the lower index is
kept.")
}

fn axis_arg() -> Arg {
    Arg::new("axis")
        .short('x')
        .long("axis")
        .value_parser(value_parser!(usize))
        .help("Stacking axis: 0 for a, 1 for b, 2 for c.")
}

fn direction_arg(id: &'static str, help: &'static str) -> Arg {
    Arg::new(id)
        .long(id)
        .required(true)
        .allow_hyphen_values(true)
        .value_parser(parse_direction)
        .help(help)
}

/// "1,1,0", "1 1 0" or "1.5,-1,0"
pub fn parse_direction(text: &str) -> std::result::Result<[f64; 3], String> {
    let values = text
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<f64>().map_err(|e| format!("'{}': {}", s, e)))
        .collect::<std::result::Result<Vec<f64>, String>>()?;
    match values.as_slice() {
        [x, y, z] => Ok([*x, *y, *z]),
        _ => Err(format!("expected three values, got {}", values.len())),
    }
}

/// Log level from -v / -q, needed before the rest of the arguments are read.
pub fn log_level(matches: &ArgMatches) -> LevelFilter {
    let (quiet, verbose) = match matches.subcommand() {
        Some((_, sub)) => (sub.get_flag("quiet"), sub.get_count("verbose")),
        None => (matches.get_flag("quiet"), matches.get_count("verbose")),
    };
    logger::level_from_verbosity(quiet, verbose)
}

/// Holds the arguments passed to the program from the command-line
#[derive(Debug, Clone)]
pub struct Args {
    pub task: Task,
    pub config: Config,
    /// Where the config came from, for the log.
    pub config_message: String,
    /// Write `config` back to the per-user settings file.
    pub save_config: bool,
}

impl Args {
    /// Initialises the structure from the command-line arguments, on top of
    /// the settings file.
    pub fn new(arguments: ArgMatches) -> Result<Self> {
        let explicit = match arguments.subcommand() {
            Some((_, sub)) => sub.get_one::<PathBuf>("config").cloned(),
            None => arguments.get_one::<PathBuf>("config").cloned(),
        };
        let (config, message) = match explicit {
            Some(path) => {
                let cfg = Config::load_from(&path)?;
                (cfg, format!("Config loaded from {:?}", path))
            }
            None => Config::load(),
        };
        Self::with_config(&arguments, config, message)
    }

    /// As [`Args::new`] with an already loaded base config.
    pub fn with_config(arguments: &ArgMatches, mut config: Config, config_message: String) -> Result<Self> {
        let (name, sub) = arguments
            .subcommand()
            .ok_or_else(|| BuildError::Config("no subcommand given".to_string()))?;

        apply_overrides(&mut config, sub)?;
        config.validate()?;

        let path = |id: &str| -> Result<PathBuf> {
            sub.get_one::<PathBuf>(id)
                .cloned()
                .ok_or_else(|| BuildError::Config(format!("missing argument <{}>", id)))
        };
        let direction = |id: &str| -> Result<[f64; 3]> {
            sub.get_one::<[f64; 3]>(id)
                .copied()
                .ok_or_else(|| BuildError::Config(format!("missing --{}", id)))
        };
        let count = |id: &str| -> Result<usize> {
            sub.get_one::<usize>(id)
                .copied()
                .ok_or_else(|| BuildError::Config(format!("missing --{}", id)))
        };

        let task = match name {
            "info" => Task::Info(path("file")?),
            "recipes" => {
                let family = match sub.get_one::<String>("family") {
                    Some(label) => Some(
                        Family::from_label(label).ok_or_else(|| BuildError::UnknownSystem(label.clone()))?,
                    ),
                    None => None,
                };
                Task::Recipes(family)
            }
            "walls" => Task::Walls(WallsRequest {
                input: path("file")?,
                family: sub.get_one::<String>("family").cloned(),
                wall: sub
                    .get_one::<String>("wall")
                    .cloned()
                    .unwrap_or_else(|| "ALL".to_string()),
                config: config.clone(),
            }),
            "interface" => Task::Interface(InterfaceRequest {
                inputs: std::iter::once(path("first")?)
                    .chain(sub.get_one::<PathBuf>("second").cloned())
                    .collect(),
                orientations: [
                    [direction("a1")?, direction("b1")?, direction("c1")?],
                    [direction("a2")?, direction("b2")?, direction("c2")?],
                ],
                axis: count("axis")?,
                config: config.clone(),
            }),
            "cut" => Task::Cut(CutRequest {
                input: path("file")?,
                orientation: [direction("a")?, direction("b")?, direction("c")?],
                config: config.clone(),
            }),
            "alternate" => Task::Alternate(AlternateRequest {
                first: path("first")?,
                second: path("second")?,
                axis: count("axis")?,
                repeats: count("repeats")?,
                output: sub
                    .get_one::<String>("name")
                    .cloned()
                    .unwrap_or_else(|| "alternate.vasp".to_string()),
                config: config.clone(),
            }),
            "supercell" => Task::Supercell(SupercellRequest {
                input: path("file")?,
                multipliers: triple_of(sub, "size")?.unwrap_or([1, 1, 1]),
                clean: sub.get_flag("clean"),
                config: config.clone(),
            }),
            "strain" => Task::Strain(path("first")?, path("second")?),
            "bonds" => Task::Bonds(BondsRequest {
                inputs: std::iter::once(path("first")?)
                    .chain(sub.get_one::<PathBuf>("second").cloned())
                    .collect(),
                radius: sub
                    .get_one::<f64>("radius")
                    .copied()
                    .ok_or_else(|| BuildError::Config("missing --radius".to_string()))?,
            }),
            other => return Err(BuildError::Config(format!("unknown subcommand '{}'", other))),
        };

        Ok(Self {
            task,
            config,
            config_message,
            save_config: sub.get_flag("save config"),
        })
    }
}

/// Three integers given to a `num_args(3)` option, if it is present.
fn triple_of(sub: &ArgMatches, id: &str) -> Result<Option<[usize; 3]>> {
    let values: Vec<usize> = match sub.try_get_many::<usize>(id).ok().flatten() {
        Some(v) => v.copied().collect(),
        None => return Ok(None),
    };
    match values.as_slice() {
        [x, y, z] => Ok(Some([*x, *y, *z])),
        _ => Err(BuildError::InvalidMultiplier(values)),
    }
}

/// Command line values win over the settings file. Options a subcommand
/// does not define are simply absent.
fn apply_overrides(config: &mut Config, sub: &ArgMatches) -> Result<()> {
    if let Some(c) = sub.try_get_one::<f64>("cutoff").ok().flatten() {
        config.cutoff = *c;
    }
    if let Some(d) = sub.try_get_one::<f64>("domain size").ok().flatten() {
        config.domain_size = *d;
    }
    if let Some(n) = triple_of(sub, "supercell")? {
        config.supercell = n;
    }
    if let Some(p) = sub.try_get_one::<String>("polar axis").ok().flatten() {
        config.polar_axis =
            PolarAxis::from_label(p).ok_or_else(|| BuildError::Config(format!("invalid polar axis '{}'", p)))?;
    }
    if let Some(species) = sub.try_get_many::<String>("keep").ok().flatten() {
        config.tie_break = TieBreak::SpeciesPriority(species.cloned().collect());
    }
    if let Some(dir) = sub.try_get_one::<PathBuf>("output").ok().flatten() {
        config.output_dir = dir.clone();
    }
    if let Some(t) = sub.try_get_one::<usize>("threads").ok().flatten() {
        config.threads = *t;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Result<Args> {
        let matches = ClapApp::App.get().try_get_matches_from(argv).unwrap();
        Args::with_config(&matches, Config::default(), String::new())
    }

    #[test]
    fn test_command_is_well_formed() {
        ClapApp::App.get().debug_assert();
    }

    #[test]
    fn test_walls_overrides() {
        let args = parse(&[
            "dwgen", "walls", "POSCAR", "-w", "R180", "-d", "2", "-c", "0.8", "-s", "1", "1", "2", "-k", "O,Bi",
            "-o", "out",
        ])
        .unwrap();
        match args.task {
            Task::Walls(r) => {
                assert_eq!(r.wall, "R180");
                assert_eq!(r.config.domain_size, 2.0);
                assert_eq!(r.config.cutoff, 0.8);
                assert_eq!(r.config.supercell, [1, 1, 2]);
                assert_eq!(r.config.output_dir, PathBuf::from("out"));
                assert_eq!(
                    r.config.tie_break,
                    TieBreak::SpeciesPriority(vec!["O".to_string(), "Bi".to_string()])
                );
            }
            other => panic!("unexpected task {:?}", other),
        }
    }

    #[test]
    fn test_interface_directions() {
        let args = parse(&[
            "dwgen", "interface", "A.vasp", "B.vasp", "--a1", "1,1,0", "--b1", "0,0,1", "--c1", "1,-1,0", "--a2",
            "-1,-1,0", "--b2", "0 0 -1", "--c2", "1,-1,0", "-x", "2",
        ])
        .unwrap();
        match args.task {
            Task::Interface(r) => {
                assert_eq!(r.inputs.len(), 2);
                assert_eq!(r.orientations[1][0], [-1.0, -1.0, 0.0]);
                assert_eq!(r.orientations[1][1], [0.0, 0.0, -1.0]);
                assert_eq!(r.axis, 2);
            }
            other => panic!("unexpected task {:?}", other),
        }
    }

    #[test]
    fn test_cut_and_bonds() {
        let args = parse(&["dwgen", "cut", "POSCAR", "--a", "1,1,0", "--b", "0,0,1", "--c", "1,-1,0", "-c", "0.5"]).unwrap();
        assert!(!args.save_config);
        match args.task {
            Task::Cut(r) => {
                assert_eq!(r.orientation[2], [1.0, -1.0, 0.0]);
                assert_eq!(r.config.cutoff, 0.5);
            }
            other => panic!("unexpected task {:?}", other),
        }

        let args = parse(&["dwgen", "bonds", "A.vasp", "B.vasp", "-r", "2.5", "--save-config"]).unwrap();
        assert!(args.save_config);
        match args.task {
            Task::Bonds(r) => {
                assert_eq!(r.inputs, vec![PathBuf::from("A.vasp"), PathBuf::from("B.vasp")]);
                assert_eq!(r.radius, 2.5);
            }
            other => panic!("unexpected task {:?}", other),
        }
    }

    #[test]
    fn test_zero_multiplier_is_rejected() {
        let err = parse(&["dwgen", "walls", "POSCAR", "-s", "1", "0", "1"]).unwrap_err();
        assert!(matches!(err, BuildError::InvalidMultiplier(_)));
    }

    #[test]
    fn test_parse_direction() {
        assert_eq!(parse_direction("1.5, -1, 0").unwrap(), [1.5, -1.0, 0.0]);
        assert!(parse_direction("1,2").is_err());
        assert!(parse_direction("1,x,2").is_err());
    }
}
