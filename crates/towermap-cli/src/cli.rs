//! CLI argument definitions using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Output format for commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Csv,
}

#[derive(Debug, Parser)]
#[command(name = "towermap")]
#[command(author, version, about = "Store and query geolocated cell-tower measurements", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Configuration file (defaults to the platform config directory)
    #[arg(short, long, global = true, env = "TOWERMAP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Database file, overriding the configuration
    #[arg(short, long, global = true, env = "TOWERMAP_DATABASE")]
    pub database: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Import finalized measurements from a JSON Lines file
    Import {
        /// Input file, or `-` for stdin
        input: PathBuf,
    },

    /// Stage location samples from a JSON Lines file
    Stage {
        /// Input file, or `-` for stdin
        input: PathBuf,
    },

    /// Turn a staged location into a measurement
    Finalize {
        /// Row id of the staged location
        row_id: i64,

        /// Cells observed at that moment, as a JSON array
        #[arg(long)]
        cells: String,
    },

    /// List staged locations
    Staged {
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show one measurement
    Show {
        /// Measurement id
        id: i64,

        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show the most recent measurement
    Last {
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Count stored and staged rows
    Count,

    /// List measurements inside a bounding box
    Area {
        #[arg(allow_negative_numbers = true)]
        min_lat: f64,
        #[arg(allow_negative_numbers = true)]
        min_lon: f64,
        #[arg(allow_negative_numbers = true)]
        max_lat: f64,
        #[arg(allow_negative_numbers = true)]
        max_lon: f64,

        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Maximum number of rows
        #[arg(short, long)]
        limit: Option<u32>,
    },

    /// Export every measurement as CSV
    Export {
        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Load a map viewport the way an interactive map would
    Browse {
        #[arg(allow_negative_numbers = true)]
        south: f64,
        #[arg(allow_negative_numbers = true)]
        west: f64,
        #[arg(allow_negative_numbers = true)]
        north: f64,
        #[arg(allow_negative_numbers = true)]
        east: f64,

        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Drop staged locations older than a given age
    Expire {
        /// Age in seconds
        #[arg(long)]
        older_than_secs: u64,
    },

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the configuration file path
    Path,
    /// Print the effective configuration
    Show,
    /// Write a configuration file with default settings
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
