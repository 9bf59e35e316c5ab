use dwgen::arguments::{self, Args, ClapApp, Task};
use dwgen::errors::Result;
use dwgen::physics::analysis::symmetry::MoyoClassifier;
use dwgen::utils::logger;
use dwgen::workflow;
use std::process;

fn main() {
    let app = ClapApp::App;
    let matches = app.get().get_matches();

    if let Err(e) = logger::init(arguments::log_level(&matches)) {
        eprintln!("Logger already installed: {}", e);
    }

    let args = match Args::new(matches) {
        Ok(a) => a,
        Err(e) => {
            log::error!("{}", e);
            process::exit(2);
        }
    };
    log::debug!("{}", args.config_message);
    if args.save_config {
        log::info!("{}", args.config.save());
    }

    if let Err(e) = rayon::ThreadPoolBuilder::new()
        .num_threads(args.config.threads)
        .build_global()
    {
        log::warn!("Could not size the thread pool: {}", e);
    }

    if let Err(e) = run(args) {
        log::error!("{}", e);
        process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let classifier = MoyoClassifier {
        symprec: args.config.symprec,
    };

    match args.task {
        Task::Info(file) => {
            print!("{}", workflow::run_info(&file, &classifier)?);
        }
        Task::Recipes(family) => {
            print!("{}", workflow::recipe_listing(family, args.config.domain_size)?);
        }
        Task::Walls(request) => {
            let outcomes = workflow::run_walls(&request, &classifier)?;
            for o in &outcomes {
                log::info!(
                    "{} {}: {} + {} atoms stacked into {} ({} after overlap removal) -> {}",
                    o.summary.family,
                    o.summary.wall,
                    o.summary.domain_atoms[0],
                    o.summary.domain_atoms[1],
                    o.summary.overlap.before,
                    o.summary.stacked_atoms,
                    o.directory.display()
                );
            }
        }
        Task::Interface(request) => {
            let outcome = workflow::run_interface(&request, &classifier)?;
            log::info!("Interface written to {}", outcome.directory.display());
        }
        Task::Cut(request) => {
            let outcome = workflow::run_cut(&request, &classifier)?;
            print!("{}", outcome.summary.overlap);
            log::info!("Oriented cell written to {}", outcome.directory.display());
        }
        Task::Alternate(request) => {
            let path = workflow::run_alternate(&request)?;
            log::info!("Alternating stack written to {}", path.display());
        }
        Task::Supercell(request) => {
            let (path, report) = workflow::run_supercell(&request)?;
            if let Some(r) = report {
                print!("{}", r);
            }
            log::info!("Supercell written to {}", path.display());
        }
        Task::Strain(first, second) => {
            let report = workflow::run_strain(&first, &second)?;
            print!("{}", report);
        }
        Task::Bonds(request) => {
            let outcome = workflow::run_bonds(&request)?;
            for (k, analysis) in outcome.analyses.iter().enumerate() {
                if outcome.analyses.len() > 1 {
                    println!("Structure {}:", k + 1);
                }
                print!("{}", analysis);
            }
            if let Some(cmp) = outcome.comparison {
                print!("{}", cmp);
            }
        }
    }

    Ok(())
}
