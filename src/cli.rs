//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// FrameSched - Frame-Synchronized Task Scheduler
#[derive(Parser)]
#[command(
    name = "framesched",
    about = "Frame-synchronized task scheduler for engine subsystems",
    version
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Subcommand)]
pub enum Command {
    /// Run the pool with no task load and report observed frame ticks
    Pace {
        /// How long to run in seconds
        #[arg(short, long)]
        secs: Option<u64>,

        /// Number of worker threads
        #[arg(short, long)]
        workers: Option<usize>,
    },

    /// Drive a synthetic task and chain workload through the pool
    Soak {
        /// How long to run in seconds
        #[arg(short, long)]
        secs: Option<u64>,

        /// Number of one-shot tasks to submit
        #[arg(short, long)]
        tasks: Option<u32>,

        /// Number of chains to submit
        #[arg(long)]
        chains: Option<u32>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },
}

/// Output format for the soak report
#[derive(Clone, Debug, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}. Use: text or json", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}
