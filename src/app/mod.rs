//! Command-line application: configuration, system setup, run, report.

use crate::atoms::Atoms;
use crate::config::{Args, LatticeConfig, MdConfig, PotentialConfig};
use crate::io::{setup_output, EnergyWriter};
use crate::lj_pot::LennardJones;
use crate::neighbor::NeighborListManager;
use crate::run_md::{ForceProvider, MdSimulation, RescalingThermostat, RunSummary, VelocityVerlet};
use crate::setup::{fcc_lattice, graphene_sheet, initialize_velocities};
use crate::sim_box::SimulationBox;
use crate::tersoff_pot::Tersoff;
use crate::units::fs_to_natural;
use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use nalgebra::Vector3;
use tracing::info;

pub struct MdApplication {
    args: Args,
    config: MdConfig,
}

impl MdApplication {
    pub fn from_cli() -> Result<Self> {
        let args = Args::parse();
        setup_output(args.output.as_ref());
        let config = load_config(&args)?;
        Ok(Self { args, config })
    }

    pub fn run(self) -> Result<()> {
        info!("Configuration loaded:\n{:?}", self.config);
        if let Some(path) = &self.args.config_file {
            info!("Using configuration file {}", path);
        }

        let (atoms, sim_box) = build_system(&self.config)?;
        let summary = match &self.config.potential {
            PotentialConfig::LennardJones {
                epsilon,
                sigma,
                cutoff,
            } => {
                info!("Using Lennard-Jones: epsilon = {} eV, sigma = {} A", epsilon, sigma);
                let lj = LennardJones::new(*epsilon, *sigma, *cutoff);
                run_simulation(&self.config, atoms, sim_box, lj)?
            }
            PotentialConfig::Tersoff { parameters } => {
                info!("Using Tersoff: {:?}", parameters);
                run_simulation(&self.config, atoms, sim_box, Tersoff::new(parameters.clone()))?
            }
        };

        report_summary(&summary);
        Ok(())
    }
}

fn load_config(args: &Args) -> Result<MdConfig> {
    let mut config = match &args.config_file {
        Some(path) => MdConfig::from_file(path)
            .wrap_err_with(|| format!("Unable to load configuration file: {}", path))?,
        None => MdConfig::default(),
    };
    config
        .apply_args(args)
        .wrap_err("Invalid command-line override")?;
    Ok(config)
}

/// Lattice positions, masses and thermal velocities for the configured system
pub fn build_system(config: &MdConfig) -> Result<(Atoms, SimulationBox)> {
    let (positions, sim_box, mass) = match &config.system.lattice {
        LatticeConfig::Fcc {
            cells,
            lattice_constant,
            mass,
        } => {
            let (positions, sim_box) = fcc_lattice(*cells, *lattice_constant)?;
            (positions, sim_box, *mass)
        }
        LatticeConfig::Graphene {
            cells,
            bond_length,
            vacuum,
            mass,
        } => {
            let (positions, sim_box) = graphene_sheet(*cells, *bond_length, *vacuum)?;
            (positions, sim_box, *mass)
        }
    };

    let n_atoms = positions.len();
    let mut atoms = Atoms::new(vec![mass; n_atoms], positions, vec![Vector3::zeros(); n_atoms])?;
    initialize_velocities(&mut atoms, config.system.temperature, config.system.seed);
    Ok((atoms, sim_box))
}

/// Integrate the configured number of steps, writing sampled energies.
pub fn run_simulation<F: ForceProvider>(
    config: &MdConfig,
    atoms: Atoms,
    sim_box: SimulationBox,
    provider: F,
) -> Result<RunSummary> {
    let neighbor = &config.neighbor;
    let neighbors = NeighborListManager::new(
        neighbor.algorithm,
        atoms.len(),
        neighbor.search_cutoff(provider.cutoff()),
        neighbor.capacity,
        neighbor.rebuild_distance(),
    );
    let integrator = VelocityVerlet::new(fs_to_natural(config.simulation.time_step));

    let mut simulation = MdSimulation::new(atoms, sim_box, provider, neighbors, integrator)
        .wrap_err("Failed to set up the simulation")?;
    if let Some(thermostat) = &config.simulation.thermostat {
        info!(
            "Rescaling velocities to {} K every {} steps",
            thermostat.target_temperature, thermostat.interval
        );
        simulation = simulation.with_thermostat(RescalingThermostat {
            target_temperature: thermostat.target_temperature,
            interval: thermostat.interval,
        });
    }

    let mut writer = EnergyWriter::create(&config.output.energy_file)?;
    writer.write_sample(0, simulation.kinetic_energy(), simulation.force_output())?;
    let summary = simulation
        .run(config.simulation.total_steps, config.output.sample_interval, |sim| {
            writer.write_sample(sim.current_step(), sim.kinetic_energy(), sim.force_output())
        })
        .wrap_err("Simulation aborted")?;
    writer.flush()?;

    Ok(summary)
}

fn report_summary(summary: &RunSummary) {
    info!("Finished {} steps", summary.steps);
    info!("{} neighbor list updates", summary.neighbor_updates);
    info!("Time used = {:.3} s", summary.elapsed.as_secs_f64());
    info!(
        "Final energies: kinetic = {:.8} eV, potential = {:.8} eV, total = {:.8} eV",
        summary.kinetic_energy,
        summary.potential_energy,
        summary.kinetic_energy + summary.potential_energy
    );
}
