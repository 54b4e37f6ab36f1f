//! Dissolve - replace masked labels with their surroundings
//!
//! Main entry point for the dissolve CLI application.

use std::process::ExitCode;

use console::style;
use tracing_subscriber::EnvFilter;

use dissolve::cli::{self, Cli, Commands, Context};
use dissolve::config::Config;
use dissolve::error::Result;

fn main() -> ExitCode {
    // Parse CLI arguments
    let cli = Cli::parse_args();

    // Run the application
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

/// Set up logging based on CLI arguments and configuration
fn setup_logging(cli: &Cli, config: &Config) {
    let level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        config.logging.level.as_str()
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    console::set_colors_enabled(config.logging.color && console::colors_enabled());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(config.logging.color)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

/// Main application logic
fn run(cli: Cli) -> Result<()> {
    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => Config::config_path()?,
    };
    let config = Config::load_from(&config_path)?;

    // Set up logging
    setup_logging(&cli, &config);

    // Set number of parallel jobs
    if let Some(jobs) = cli.jobs.or(config.general.jobs) {
        rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build_global()
            .ok();
    }

    let ctx = Context {
        config,
        config_path,
        quiet: cli.quiet,
    };

    // Dispatch to appropriate command handler
    match &cli.command {
        Commands::Run(args) => cli::execute_run(args, &ctx),
        Commands::Phantom(args) => cli::execute_phantom(args, &ctx),
        Commands::Info(args) => cli::execute_info(args),
        Commands::Config(args) => cli::execute_config(args, &ctx),
    }
}
