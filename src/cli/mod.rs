//! Command-line interface for dissolve

mod commands;

pub use commands::*;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::Config;
use crate::models::Region;

/// Dissolve - replace masked regions of a label image with the surrounding labels
///
/// Pixels inside the mask take the label of the geodesically nearest
/// region outside it, filling from the mask boundary inwards.
#[derive(Parser, Debug)]
#[command(name = "dissolve")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "DISSOLVE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Number of parallel jobs (default: number of CPUs)
    #[arg(short, long, global = true)]
    pub jobs: Option<usize>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Dissolve masked labels into their surroundings
    Run(RunArgs),

    /// Write a synthetic label image and mask
    Phantom(PhantomArgs),

    /// Show information about an image
    Info(InfoArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

/// Arguments for the run command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Input label image(s)
    #[arg(required = true)]
    pub input: Vec<PathBuf>,

    /// Mask image; non-zero pixels are dissolved
    #[arg(short, long)]
    pub mask: PathBuf,

    /// Output image (single input only)
    #[arg(short, long, conflicts_with = "output_dir")]
    pub output: Option<PathBuf>,

    /// Output directory (default: next to each input)
    #[arg(short = 'd', long)]
    pub output_dir: Option<PathBuf>,

    /// Label assigned where the mask touches the processed region's edge
    #[arg(short, long, allow_negative_numbers = true)]
    pub background: Option<i64>,

    /// Restrict processing to INDEX:SIZE, e.g. 0,0,10:128,128,40
    #[arg(short, long)]
    pub region: Option<Region>,

    /// Compress output images
    #[arg(long, conflicts_with = "no_compress")]
    pub compress: bool,

    /// Write uncompressed output images
    #[arg(long)]
    pub no_compress: bool,

    /// Overwrite existing outputs
    #[arg(short, long)]
    pub force: bool,

    /// Summary format
    #[arg(long, value_enum, default_value_t = ReportFormat::Pretty)]
    pub format: ReportFormat,
}

/// Arguments for the phantom command
#[derive(Parser, Debug, Clone)]
pub struct PhantomArgs {
    /// Output label image
    pub image: PathBuf,

    /// Output mask image
    pub mask: PathBuf,

    /// Image size
    #[arg(long, value_delimiter = ',', default_value = "128,128,128")]
    pub size: Vec<usize>,

    /// First index of the mask box
    #[arg(long, value_delimiter = ',', default_value = "30,20,50")]
    pub mask_index: Vec<i64>,

    /// Size of the mask box
    #[arg(long, value_delimiter = ',', default_value = "10,20,30")]
    pub mask_size: Vec<usize>,

    /// Label of the lower half
    #[arg(long, default_value_t = 1)]
    pub label: u8,

    /// Write uncompressed images
    #[arg(long)]
    pub no_compress: bool,
}

/// Arguments for the info command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Image file
    #[arg(required = true)]
    pub image: PathBuf,

    /// Also report label counts inside this mask
    #[arg(short, long)]
    pub mask: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Pretty)]
    pub format: ReportFormat,
}

/// Report output format for run and info
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable pretty output
    Pretty,
    /// JSON output
    Json,
    /// TOML output
    Toml,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Configuration subcommand
    #[command(subcommand)]
    pub command: ConfigCommands,
}

/// Configuration subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Print the configuration file path
    Path,
    /// Reset configuration to defaults
    Reset,
    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,
        /// Configuration value
        value: String,
    },
    /// Get a configuration value
    Get {
        /// Configuration key
        key: String,
    },
    /// Initialize configuration file
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

/// Settings shared by every command
#[derive(Debug, Clone)]
pub struct Context {
    /// Loaded configuration
    pub config: Config,
    /// Where the configuration lives
    pub config_path: PathBuf,
    /// Suppress progress bars and summaries
    pub quiet: bool,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run() {
        let cli = Cli::try_parse_from([
            "dissolve", "run", "a.mha", "b.mha", "--mask", "m.mha", "-d", "out",
            "--background", "-2", "--region", "0,0:4,4", "--no-compress", "--format", "json",
        ])
        .unwrap();

        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.input.len(), 2);
                assert_eq!(args.background, Some(-2));
                assert_eq!(args.region.unwrap().size, vec![4, 4]);
                assert!(args.no_compress);
                assert_eq!(args.format, ReportFormat::Json);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_region_past_index_range_is_rejected() {
        let result = Cli::try_parse_from([
            "dissolve", "run", "a.mha", "-m", "m.mha", "--region", "9223372036854775807,0:10,1",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_output_conflicts_with_dir() {
        let result = Cli::try_parse_from([
            "dissolve", "run", "a.mha", "-m", "m.mha", "-o", "x.mha", "-d", "out",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_phantom_defaults() {
        let cli = Cli::try_parse_from(["dissolve", "phantom", "img.mha", "mask.mha"]).unwrap();
        match cli.command {
            Commands::Phantom(args) => {
                assert_eq!(args.size, vec![128, 128, 128]);
                assert_eq!(args.mask_index, vec![30, 20, 50]);
                assert_eq!(args.mask_size, vec![10, 20, 30]);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
