//! CLI argument parsing definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Set the log level (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a load test against the configured target
    Run {
        /// Base URL of the system under test (overrides configuration)
        #[arg(long, value_name = "URL")]
        base_url: Option<String>,

        /// Path to a scenario YAML file (defaults to the built-in storefront journey)
        #[arg(long, value_name = "PATH")]
        scenario: Option<PathBuf>,

        /// Write a JSON report to this path (overrides configuration)
        #[arg(long, value_name = "PATH")]
        out_json: Option<PathBuf>,

        /// Plateau duration override (example: --duration=3m)
        #[arg(long, value_name = "SPAN")]
        duration: Option<String>,

        /// Peak virtual-user count override
        #[arg(long, value_name = "COUNT")]
        users: Option<u32>,

        /// Skip the end-of-run text summary
        #[arg(long)]
        no_summary: bool,
    },

    /// Scenario inspection commands
    Scenario {
        #[command(subcommand)]
        scenario_cmd: ScenarioCommands,
    },

    /// Configuration management commands
    Config {
        #[command(subcommand)]
        config_cmd: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ScenarioCommands {
    /// Show the steps a scenario will execute
    Show {
        /// Path to a scenario YAML file (defaults to the built-in storefront journey)
        #[arg(long, value_name = "PATH")]
        scenario: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Validate a configuration file
    Validate {
        /// Path to the configuration file
        #[arg(long, value_name = "PATH")]
        config_file: PathBuf,
    },

    /// Generate a sample configuration file
    Generate {
        /// Output file path
        #[arg(long, value_name = "PATH")]
        output: PathBuf,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },

    /// Show current configuration in use
    Show {
        /// Path to configuration file (optional, uses default loading logic)
        #[arg(long, value_name = "PATH")]
        config_file: Option<PathBuf>,

        /// Output format: yaml, json
        #[arg(long, value_name = "FORMAT", default_value = "yaml")]
        format: String,
    },
}
