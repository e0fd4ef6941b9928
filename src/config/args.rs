//! Command-line argument parsing for MD runs

use crate::neighbor::NeighborAlgorithm;
use clap::Parser;

/// Classical molecular dynamics with pair and bond-order potentials
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the YAML configuration file (defaults apply when absent)
    #[arg(short, long)]
    pub config_file: Option<String>,

    /// Override lattice cell counts (one value for every axis)
    #[arg(long, num_args = 1..=3)]
    pub cells: Option<Vec<usize>>,

    /// Override number of steps
    #[arg(long)]
    pub steps: Option<usize>,

    /// Override initial temperature in K
    #[arg(long)]
    pub temperature: Option<f64>,

    /// Override time step in fs
    #[arg(long)]
    pub time_step: Option<f64>,

    /// Override neighbor search algorithm
    #[arg(long, value_enum)]
    pub algorithm: Option<NeighborAlgorithm>,

    /// Override velocity seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Log file (default stdout)
    #[arg(short, long)]
    pub output: Option<String>,
}
