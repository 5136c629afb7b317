//! Command-line argument parsing for dipole simulations

use clap::Parser;

/// Metropolis Monte Carlo of a 2D dipole lattice with YAML configuration
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the YAML configuration file
    #[arg(short, long, default_value = "config.yaml")]
    pub config_file: String,

    /// Override the initial temperature (K)
    #[arg(long)]
    pub temperature: Option<f64>,

    /// Override the number of sweeps of a plain run
    #[arg(long, allow_negative_numbers = true)]
    pub sweeps: Option<i64>,

    /// Override the random seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Override the snapshot to start from
    #[arg(long)]
    pub initial_state: Option<String>,

    /// Override the directory receiving snapshots and series
    #[arg(short, long)]
    pub output_dir: Option<String>,

    /// Write log output to this file instead of stdout
    #[arg(long)]
    pub log_file: Option<String>,

    /// Log every sampling checkpoint
    #[arg(short, long)]
    pub verbose: bool,
}
