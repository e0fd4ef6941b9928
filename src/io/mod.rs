//! Input/Output operations for MD runs
//!
//! This module handles logging setup and the sampled energy file.

mod output;

pub use output::{setup_output, EnergyWriter};
