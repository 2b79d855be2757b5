use clap::{Parser, Subcommand};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

use cv_funset::demos::{self, Demo, DemoContext};
use cv_funset::fixtures::ensure_fixtures;
use cv_funset::logging::init_logging;
use cv_funset::DemoConfig;

#[derive(Parser, Debug)]
#[command(
    name = "funset",
    about = "Run small image-processing and linear-algebra demos",
    version
)]
struct Cli {
    /// JSON file overriding the default demo parameters
    #[arg(long = "config", short = 'c', global = true)]
    config: Option<PathBuf>,

    /// Directory holding the input images
    #[arg(long = "images-dir", global = true)]
    images_dir: Option<PathBuf>,

    /// Directory the demos write into
    #[arg(long = "output-dir", short = 'o', global = true)]
    output_dir: Option<PathBuf>,

    /// Do not synthesize missing input images
    #[arg(long = "no-fixtures", global = true)]
    no_fixtures: bool,

    /// Raise log verbosity (-v debug, -vv trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every demo name
    List,
    /// Run the named demos in order
    Run {
        #[arg(value_enum, required = true)]
        demos: Vec<Demo>,
    },
    /// Run every demo
    All,
}

fn load_config(cli: &Cli) -> Result<DemoConfig, Box<dyn Error>> {
    let mut config = match &cli.config {
        Some(path) => DemoConfig::from_json_file(path)?,
        None => DemoConfig::default(),
    };
    if let Some(dir) = &cli.images_dir {
        config.images_dir = dir.clone();
    }
    if let Some(dir) = &cli.output_dir {
        config.output_dir = dir.clone();
    }
    if cli.no_fixtures {
        config.generate_fixtures = false;
    }
    config.validate()?;
    Ok(config)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let selected: Vec<Demo> = match &cli.command {
        Command::List => {
            for demo in Demo::ALL {
                println!("{demo}");
            }
            return ExitCode::SUCCESS;
        }
        Command::Run { demos } => demos.clone(),
        Command::All => Demo::ALL.to_vec(),
    };

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    if config.generate_fixtures
        && let Err(e) = ensure_fixtures(&config.images_dir, config.jpeg_quality)
    {
        eprintln!("Error: could not prepare {}: {e}", config.images_dir.display());
        return ExitCode::FAILURE;
    }

    let ctx = DemoContext::new(config);
    let mut failed = 0usize;
    for (demo, result) in demos::run_demos(&ctx, &selected) {
        match result {
            Ok(report) => print!("{report}"),
            Err(e) => {
                eprintln!("{demo}: {e}");
                failed += 1;
            }
        }
    }

    if failed > 0 {
        eprintln!("{failed} of {} demos failed", selected.len());
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
