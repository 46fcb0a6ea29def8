//! Storycheck - visual regression testing for component stories.

mod config;
mod differ;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use storycheck_core::CoreError;
use storycheck_runner::{approve_images, RunnerError, TestOptions, TestSuite};
use tracing_subscriber::EnvFilter;

use config::{resolve_options, FileConfig, TestArgs};
use differ::ExactDiffer;

/// Storycheck - visual regression testing tool
#[derive(Parser)]
#[command(name = "storycheck")]
#[command(about = "Visual regression testing for component stories", long_about = None)]
struct Cli {
    /// Path to the config file
    #[arg(short, long, default_value = "storycheck.config.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run visual tests against the reference images
    Test(TestArgs),

    /// Capture fresh reference images instead of comparing
    Update(TestArgs),

    /// Promote the captured images to reference images
    Approve {
        /// Only promote stories that produced a diff
        #[arg(long)]
        diff_only: bool,
    },
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Test(_) => "test",
            Commands::Update(_) => "update",
            Commands::Approve { .. } => "approve",
        }
    }

    fn silent(&self) -> bool {
        match self {
            Commands::Test(args) | Commands::Update(args) => args.silent,
            Commands::Approve { .. } => false,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Commands::Test(TestArgs::default()));

    if !command.silent() {
        println!("storycheck {}", command.name());
    }

    let config = FileConfig::load(&cli.config).await?;

    match command {
        Commands::Test(args) => run_tests(&config, &args, false).await,
        Commands::Update(args) => run_tests(&config, &args, true).await,
        Commands::Approve { diff_only } => approve(&config, diff_only).await,
    }
}

async fn run_tests(
    config: &FileConfig,
    args: &TestArgs,
    update_reference: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let options = resolve_options(config, args, update_reference);
    init_logging(&options);

    // Capture targets live in downstream crates; a distribution wires
    // them in here before running the suite.
    let suite = TestSuite::new(options, Arc::new(ExactDiffer));

    match suite.run(&config.configurations).await {
        Ok(()) => Ok(()),
        Err(RunnerError::Aggregate(aggregate)) => {
            if aggregate.all_snapshot_failures() {
                eprintln!("Visual tests failed");
            } else {
                eprintln!("Some visual tests failed to run");
            }
            process::exit(1);
        }
        Err(error) => {
            eprintln!("{error}");
            process::exit(1);
        }
    }
}

async fn approve(
    config: &FileConfig,
    diff_only: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let options = resolve_options(config, &TestArgs::default(), false);
    let diff_only = diff_only || config.diff_only.unwrap_or(false);

    match approve_images(&options, diff_only).await {
        Ok(approved) => {
            println!("Approved {approved} images");
            Ok(())
        }
        Err(CoreError::NothingToApprove) => {
            eprintln!("No images found to approve");
            eprintln!("Run update command to generate reference files instead");
            process::exit(1);
        }
        Err(error) => {
            eprintln!("{error}");
            process::exit(1);
        }
    }
}

fn init_logging(options: &TestOptions) {
    let directive = if options.silent {
        "storycheck_runner=warn"
    } else if options.verbose {
        "storycheck_runner=debug"
    } else {
        "storycheck_runner=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(directive.parse().unwrap()))
        .init();
}
