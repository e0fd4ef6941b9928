//! Configuration management for MD runs
//!
//! A YAML file describes the system, the potential, the neighbor search,
//! the integration and the output. Every field has a default, so an empty
//! file runs FCC argon with Lennard-Jones.

mod args;

pub use args::Args;

use crate::error::{MdError, Result};
use crate::lj_pot::LennardJones;
use crate::neighbor::NeighborAlgorithm;
use crate::tersoff_pot::TersoffParameters;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

/// Configuration for molecular dynamics simulations
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MdConfig {
    pub system: SystemConfig,
    pub potential: PotentialConfig,
    pub neighbor: NeighborConfig,
    pub simulation: SimulationConfig,
    pub output: OutputConfig,
}

/// System setup configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SystemConfig {
    pub lattice: LatticeConfig,
    /// Initial temperature in Kelvin
    pub temperature: f64,
    /// Seed for the initial velocities (entropy when absent)
    pub seed: Option<u64>,
}

impl Default for SystemConfig {
    fn default() -> Self {
        SystemConfig {
            lattice: LatticeConfig::default(),
            temperature: 60.0,
            seed: None,
        }
    }
}

/// Crystal to start from
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type")]
pub enum LatticeConfig {
    /// Face-centered cubic crystal, argon by default
    #[serde(rename = "fcc")]
    Fcc {
        #[serde(default = "default_fcc_cells")]
        cells: [usize; 3],
        #[serde(default = "default_fcc_lattice_constant")]
        lattice_constant: f64,
        #[serde(default = "default_argon_mass")]
        mass: f64,
    },
    /// Single graphene sheet in the xy plane
    #[serde(rename = "graphene")]
    Graphene {
        #[serde(default = "default_graphene_cells")]
        cells: [usize; 2],
        #[serde(default = "default_bond_length")]
        bond_length: f64,
        /// Box height along z
        #[serde(default = "default_vacuum")]
        vacuum: f64,
        #[serde(default = "default_carbon_mass")]
        mass: f64,
    },
}

impl Default for LatticeConfig {
    fn default() -> Self {
        LatticeConfig::Fcc {
            cells: default_fcc_cells(),
            lattice_constant: default_fcc_lattice_constant(),
            mass: default_argon_mass(),
        }
    }
}

/// Interatomic potential and its parameters
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type")]
pub enum PotentialConfig {
    #[serde(rename = "lennard_jones")]
    LennardJones {
        #[serde(default = "default_lj_epsilon")]
        epsilon: f64,
        #[serde(default = "default_lj_sigma")]
        sigma: f64,
        #[serde(default = "default_lj_cutoff")]
        cutoff: f64,
    },
    #[serde(rename = "tersoff")]
    Tersoff {
        #[serde(flatten)]
        parameters: TersoffParameters,
    },
}

impl Default for PotentialConfig {
    fn default() -> Self {
        PotentialConfig::LennardJones {
            epsilon: default_lj_epsilon(),
            sigma: default_lj_sigma(),
            cutoff: default_lj_cutoff(),
        }
    }
}

impl PotentialConfig {
    /// Distance beyond which the potential vanishes
    pub fn cutoff(&self) -> f64 {
        match self {
            PotentialConfig::LennardJones { cutoff, .. } => *cutoff,
            PotentialConfig::Tersoff { parameters } => parameters.r2,
        }
    }
}

/// Neighbor search configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct NeighborConfig {
    pub algorithm: NeighborAlgorithm,
    /// Maximum number of neighbors per atom
    pub capacity: usize,
    /// Extra search distance beyond the force cutoff; the list is rebuilt
    /// once an atom has moved half of it
    pub skin: f64,
}

impl Default for NeighborConfig {
    fn default() -> Self {
        NeighborConfig {
            algorithm: NeighborAlgorithm::CellList,
            capacity: 1000,
            skin: 1.0,
        }
    }
}

impl NeighborConfig {
    pub fn search_cutoff(&self, force_cutoff: f64) -> f64 {
        force_cutoff + self.skin
    }

    pub fn rebuild_distance(&self) -> f64 {
        0.5 * self.skin
    }
}

/// Integration parameters
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Time step in femtoseconds
    pub time_step: f64,
    pub total_steps: usize,
    pub thermostat: Option<ThermostatConfig>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            time_step: 5.0,
            total_steps: 20000,
            thermostat: None,
        }
    }
}

/// Velocity rescaling thermostat
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ThermostatConfig {
    pub target_temperature: f64,
    /// Rescale every this many steps
    #[serde(default = "default_thermostat_interval")]
    pub interval: usize,
}

/// Output configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Steps between energy samples
    pub sample_interval: usize,
    pub energy_file: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            sample_interval: 100,
            energy_file: "energy.txt".to_string(),
        }
    }
}

// Default value functions
fn default_fcc_cells() -> [usize; 3] {
    [4, 4, 4]
}
fn default_fcc_lattice_constant() -> f64 {
    5.385
}
fn default_argon_mass() -> f64 {
    40.0
}
fn default_graphene_cells() -> [usize; 2] {
    [6, 10]
}
fn default_bond_length() -> f64 {
    1.42
}
fn default_vacuum() -> f64 {
    20.0
}
fn default_carbon_mass() -> f64 {
    12.011
}
fn default_lj_epsilon() -> f64 {
    LennardJones::default().epsilon
}
fn default_lj_sigma() -> f64 {
    LennardJones::default().sigma
}
fn default_lj_cutoff() -> f64 {
    LennardJones::default().cutoff
}
fn default_thermostat_interval() -> usize {
    1
}

impl MdConfig {
    /// Load configuration from YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Reading configuration from: {}", path.display());
        let content = fs::read_to_string(path).map_err(|source| MdError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: MdConfig = serde_yml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to YAML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = serde_yml::to_string(self)?;
        fs::write(path, content).map_err(|source| MdError::Io {
            path: path.display().to_string(),
            source,
        })
    }

    /// Apply command-line overrides on top of the file values
    pub fn apply_args(&mut self, args: &Args) -> Result<()> {
        if let Some(cells) = &args.cells {
            match &mut self.system.lattice {
                LatticeConfig::Fcc { cells: fcc_cells, .. } => match cells.as_slice() {
                    &[n] => *fcc_cells = [n; 3],
                    &[nx, ny, nz] => *fcc_cells = [nx, ny, nz],
                    _ => return Err(invalid("--cells takes 1 or 3 values for an FCC lattice")),
                },
                LatticeConfig::Graphene { cells: sheet_cells, .. } => match cells.as_slice() {
                    &[n] => *sheet_cells = [n; 2],
                    &[nx, ny] => *sheet_cells = [nx, ny],
                    _ => return Err(invalid("--cells takes 1 or 2 values for a graphene sheet")),
                },
            }
        }
        if let Some(steps) = args.steps {
            info!("Overriding total_steps with: {}", steps);
            self.simulation.total_steps = steps;
        }
        if let Some(temperature) = args.temperature {
            info!("Overriding temperature with: {}", temperature);
            self.system.temperature = temperature;
        }
        if let Some(time_step) = args.time_step {
            info!("Overriding time_step with: {}", time_step);
            self.simulation.time_step = time_step;
        }
        if let Some(algorithm) = args.algorithm {
            info!("Overriding neighbor algorithm with: {:?}", algorithm);
            self.neighbor.algorithm = algorithm;
        }
        if let Some(seed) = args.seed {
            self.system.seed = Some(seed);
        }
        self.validate()
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.system.temperature <= 0.0 {
            return Err(invalid("Temperature must be positive"));
        }

        match &self.system.lattice {
            LatticeConfig::Fcc {
                cells,
                lattice_constant,
                mass,
            } => {
                if cells.contains(&0) {
                    return Err(invalid("Cell counts must be positive"));
                }
                if *lattice_constant <= 0.0 {
                    return Err(invalid("Lattice constant must be positive"));
                }
                if *mass <= 0.0 {
                    return Err(invalid("Mass must be positive"));
                }
            }
            LatticeConfig::Graphene {
                cells,
                bond_length,
                vacuum,
                mass,
            } => {
                if cells.contains(&0) {
                    return Err(invalid("Cell counts must be positive"));
                }
                if *bond_length <= 0.0 || *vacuum <= 0.0 {
                    return Err(invalid("Bond length and vacuum must be positive"));
                }
                if *mass <= 0.0 {
                    return Err(invalid("Mass must be positive"));
                }
            }
        }

        match &self.potential {
            PotentialConfig::LennardJones {
                epsilon,
                sigma,
                cutoff,
            } => {
                if *epsilon <= 0.0 {
                    return Err(invalid("LJ epsilon must be positive"));
                }
                if *sigma <= 0.0 {
                    return Err(invalid("LJ sigma must be positive"));
                }
                if *cutoff <= 0.0 {
                    return Err(invalid("LJ cutoff must be positive"));
                }
            }
            PotentialConfig::Tersoff { parameters } => {
                if parameters.r1 <= 0.0 || parameters.r2 <= parameters.r1 {
                    return Err(invalid("Tersoff cutoffs must satisfy 0 < r1 < r2"));
                }
                if parameters.n <= 0.0 {
                    return Err(invalid("Tersoff n must be positive"));
                }
            }
        }

        if self.neighbor.capacity == 0 {
            return Err(invalid("Neighbor capacity must be positive"));
        }
        if self.neighbor.skin < 0.0 {
            return Err(invalid("Neighbor skin must not be negative"));
        }

        if self.simulation.time_step <= 0.0 {
            return Err(invalid("Time step must be positive"));
        }
        if let Some(thermostat) = &self.simulation.thermostat {
            if thermostat.target_temperature <= 0.0 {
                return Err(invalid("Thermostat temperature must be positive"));
            }
            if thermostat.interval == 0 {
                return Err(invalid("Thermostat interval must be positive"));
            }
        }

        if self.output.sample_interval == 0 {
            return Err(invalid("Sample interval must be positive"));
        }

        Ok(())
    }
}

fn invalid(message: &str) -> MdError {
    MdError::InvalidConfig(message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config: MdConfig = serde_yml::from_str("{}").unwrap();
        assert_eq!(config, MdConfig::default());
        assert!(config.validate().is_ok());
        assert_eq!(config.potential.cutoff(), 9.0);
        assert_eq!(config.neighbor.search_cutoff(config.potential.cutoff()), 10.0);
        assert_eq!(config.neighbor.rebuild_distance(), 0.5);
    }

    #[test]
    fn test_tersoff_parameters_are_flattened() {
        let yaml = "
system:
  lattice:
    type: graphene
    cells: [4, 6]
potential:
  type: tersoff
  beta: 2.0e-7
neighbor:
  algorithm: all_pairs
  capacity: 20
";
        let config: MdConfig = serde_yml::from_str(yaml).unwrap();
        assert!(config.validate().is_ok());
        match &config.potential {
            PotentialConfig::Tersoff { parameters } => {
                assert_eq!(parameters.beta, 2.0e-7);
                assert_eq!(parameters.a, TersoffParameters::default().a);
            }
            other => panic!("expected Tersoff, got {other:?}"),
        }
        assert_eq!(config.potential.cutoff(), 2.1);
        assert_eq!(config.neighbor.algorithm, NeighborAlgorithm::AllPairs);
        match config.system.lattice {
            LatticeConfig::Graphene { cells, bond_length, .. } => {
                assert_eq!(cells, [4, 6]);
                assert_eq!(bond_length, 1.42);
            }
            other => panic!("expected graphene, got {other:?}"),
        }
    }

    #[test]
    fn test_config_validation() {
        let mut config = MdConfig::default();
        assert!(config.validate().is_ok());

        config.simulation.time_step = -0.1;
        assert!(matches!(config.validate(), Err(MdError::InvalidConfig(_))));
        config.simulation.time_step = 5.0;

        config.neighbor.capacity = 0;
        assert!(config.validate().is_err());
        config.neighbor.capacity = 1000;

        config.simulation.thermostat = Some(ThermostatConfig {
            target_temperature: 300.0,
            interval: 0,
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_command_line_overrides() {
        let mut config = MdConfig::default();
        let args = Args::parse_from([
            "manybody_md",
            "--cells",
            "6",
            "--steps",
            "500",
            "--temperature",
            "30",
            "--algorithm",
            "all-pairs",
        ]);
        config.apply_args(&args).unwrap();
        assert_eq!(config.simulation.total_steps, 500);
        assert_eq!(config.system.temperature, 30.0);
        assert_eq!(config.neighbor.algorithm, NeighborAlgorithm::AllPairs);
        assert!(matches!(config.system.lattice, LatticeConfig::Fcc { cells: [6, 6, 6], .. }));

        let args = Args::parse_from(["manybody_md", "--cells", "2", "3"]);
        assert!(config.apply_args(&args).is_err());
    }

    #[test]
    fn test_file_io() {
        let mut config = MdConfig::default();
        config.potential = PotentialConfig::Tersoff {
            parameters: TersoffParameters::default(),
        };
        config.system.seed = Some(7);

        let temp_file = NamedTempFile::new().unwrap();
        config.to_file(temp_file.path()).unwrap();
        let loaded = MdConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_invalid_file_is_rejected() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "simulation:\n  time_step: 0.0").unwrap();
        assert!(matches!(
            MdConfig::from_file(temp_file.path()),
            Err(MdError::InvalidConfig(_))
        ));

        assert!(matches!(
            MdConfig::from_file("/nonexistent/config.yaml"),
            Err(MdError::Io { .. })
        ));
    }
}
