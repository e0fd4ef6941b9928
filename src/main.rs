//! MD command-line interface
//!
//! Reads an optional YAML configuration, applies command-line overrides and
//! runs the simulation.

use color_eyre::eyre::Result;
use manybody_md::app::MdApplication;

fn main() -> Result<()> {
    color_eyre::install()?;
    MdApplication::from_cli()?.run()
}
