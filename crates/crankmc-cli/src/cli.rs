use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "CrankMC - a crankshaft/pivot Monte Carlo sampler for coarse-grained polypeptide chains.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a Monte Carlo sampling trajectory for a polypeptide sequence.
    Run(RunArgs),
    /// Write an annotated default configuration file.
    InitConfig(InitConfigArgs),
}

/// Arguments for the `run` subcommand. Flags override the config file.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to the run configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// One-letter amino-acid sequence; '|' separates chains (e.g. "AGLV|KEFT").
    #[arg(short = 'S', long, value_name = "SEQ")]
    pub sequence: Option<String>,

    /// Number of production Monte Carlo steps.
    #[arg(short = 'n', long, value_name = "NUM")]
    pub steps: Option<u64>,

    /// Number of 1024-step windows of amplitude calibration before production.
    #[arg(long, value_name = "NUM")]
    pub calibration_windows: Option<u64>,

    /// Seed for the random number generator; omit for an entropy seed.
    #[arg(long, value_name = "NUM")]
    pub seed: Option<u64>,

    /// Inverse temperature used in the acceptance rule.
    #[arg(short = 'b', long, value_name = "FLOAT")]
    pub thermobeta: Option<f64>,

    /// Initial rotation amplitude in radians (sign is cosmetic).
    #[arg(short = 'a', long, value_name = "FLOAT")]
    pub amplitude: Option<f64>,

    /// Use the Nested-Sampling acceptance rule instead of Metropolis.
    #[arg(long)]
    pub nested_sampling: bool,

    /// Likelihood threshold for Nested Sampling (negated energy bound).
    #[arg(long, value_name = "FLOAT", requires = "nested_sampling")]
    pub log_l_star: Option<f64>,
}

/// Arguments for the `init-config` subcommand.
#[derive(Args, Debug)]
pub struct InitConfigArgs {
    /// Where to write the configuration file.
    #[arg(short, long, default_value = "crankmc.toml", value_name = "PATH")]
    pub output: PathBuf,

    /// Overwrite the file if it already exists.
    #[arg(long)]
    pub force: bool,
}
