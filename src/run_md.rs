use crate::atoms::Atoms;
use crate::error::{MdError, Result};
use crate::neighbor::{NeighborList, NeighborListManager};
use crate::sim_box::SimulationBox;
use itertools::izip;
use nalgebra::Vector3;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Global quantities produced by one force evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ForceOutput {
    pub potential_energy: f64,
    /// Diagonal of the virial tensor
    pub virial: Vector3<f64>,
    pub heat_current: Vector3<f64>,
}

pub trait ForceProvider {
    /// Distance beyond which the potential vanishes
    fn cutoff(&self) -> f64;

    /// Overwrite `atoms.forces` and `atoms.potential_energies` for the
    /// current positions, using a neighbor list built with at least
    /// `cutoff()`.
    fn compute_forces(
        &mut self,
        atoms: &mut Atoms,
        sim_box: &SimulationBox,
        neighbors: &NeighborList,
    ) -> ForceOutput;
}

pub trait Integrator {
    /// Advance the system by one time step
    fn step(&mut self) -> Result<()>;

    /// Compute the instantaneous temperature
    fn temperature(&self) -> f64;
}

/// Two-stage velocity Verlet; forces are evaluated between the stages.
#[derive(Debug, Clone, Copy)]
pub struct VelocityVerlet {
    /// Time step in natural units
    pub time_step: f64,
}

impl VelocityVerlet {
    pub fn new(time_step: f64) -> Self {
        Self { time_step }
    }

    /// Half kick with the current forces, then a full drift.
    pub fn first_half(&self, atoms: &mut Atoms) {
        let half_dt = 0.5 * self.time_step;
        for (r, v, f, &m) in izip!(
            &mut atoms.positions,
            &mut atoms.velocities,
            &atoms.forces,
            &atoms.masses
        ) {
            *v += f * (half_dt / m);
            *r += *v * self.time_step;
        }
    }

    /// Half kick with the freshly computed forces.
    pub fn second_half(&self, atoms: &mut Atoms) {
        let half_dt = 0.5 * self.time_step;
        for (v, f, &m) in izip!(&mut atoms.velocities, &atoms.forces, &atoms.masses) {
            *v += f * (half_dt / m);
        }
    }
}

/// Velocity rescaling to a fixed temperature every `interval` steps
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RescalingThermostat {
    pub target_temperature: f64,
    pub interval: usize,
}

impl RescalingThermostat {
    pub fn apply(&self, step: usize, atoms: &mut Atoms) {
        if self.interval > 0 && step % self.interval == 0 {
            atoms.rescale_to_temperature(self.target_temperature);
        }
    }
}

/// Totals reported at the end of a run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub steps: usize,
    pub neighbor_updates: usize,
    pub elapsed: Duration,
    pub kinetic_energy: f64,
    pub potential_energy: f64,
}

/// A periodic system advanced with velocity Verlet under one potential.
pub struct MdSimulation<F: ForceProvider> {
    pub atoms: Atoms,
    pub sim_box: SimulationBox,
    pub(crate) provider: F,
    neighbors: NeighborListManager,
    integrator: VelocityVerlet,
    thermostat: Option<RescalingThermostat>,
    force_output: ForceOutput,
    step: usize,
}

impl<F: ForceProvider> MdSimulation<F> {
    /// Build the first neighbor list and evaluate the initial forces.
    pub fn new(
        mut atoms: Atoms,
        sim_box: SimulationBox,
        mut provider: F,
        mut neighbors: NeighborListManager,
        integrator: VelocityVerlet,
    ) -> Result<Self> {
        if neighbors.cutoff() < provider.cutoff() {
            return Err(MdError::InvalidConfig(format!(
                "neighbor cutoff {} is shorter than the force cutoff {}",
                neighbors.cutoff(),
                provider.cutoff()
            )));
        }
        if neighbors.list().n_atoms() != atoms.len() {
            return Err(MdError::AtomCountMismatch {
                field: "neighbor list",
                expected: atoms.len(),
                found: neighbors.list().n_atoms(),
            });
        }

        neighbors.rebuild(&mut atoms, &sim_box)?;
        let force_output = provider.compute_forces(&mut atoms, &sim_box, neighbors.list());
        if !force_output.potential_energy.is_finite() {
            return Err(MdError::NonFiniteEnergy { step: 0 });
        }

        Ok(MdSimulation {
            atoms,
            sim_box,
            provider,
            neighbors,
            integrator,
            thermostat: None,
            force_output,
            step: 0,
        })
    }

    pub fn with_thermostat(mut self, thermostat: RescalingThermostat) -> Self {
        self.thermostat = Some(thermostat);
        self
    }

    pub fn provider(&self) -> &F {
        &self.provider
    }

    pub fn neighbors(&self) -> &NeighborListManager {
        &self.neighbors
    }

    /// Output of the most recent force evaluation
    pub fn force_output(&self) -> &ForceOutput {
        &self.force_output
    }

    /// Number of completed steps
    pub fn current_step(&self) -> usize {
        self.step
    }

    pub fn kinetic_energy(&self) -> f64 {
        self.atoms.kinetic_energy()
    }

    pub fn potential_energy(&self) -> f64 {
        self.force_output.potential_energy
    }

    pub fn total_energy(&self) -> f64 {
        self.kinetic_energy() + self.potential_energy()
    }

    /// Run `n_steps` steps, handing the simulation to `sample` after every
    /// `sample_interval`-th step.
    pub fn run<S>(&mut self, n_steps: usize, sample_interval: usize, mut sample: S) -> Result<RunSummary>
    where
        S: FnMut(&Self) -> Result<()>,
    {
        let start = Instant::now();
        let updates_before = self.neighbors.num_updates();
        info!(
            "Running {} steps on {} atoms, initial T = {:.3} K",
            n_steps,
            self.atoms.len(),
            self.temperature()
        );

        for _ in 0..n_steps {
            self.step()?;
            if sample_interval > 0 && self.step % sample_interval == 0 {
                debug!(
                    "Step {}: E_kin = {:.8} eV, E_pot = {:.8} eV, T = {:.3} K",
                    self.step,
                    self.kinetic_energy(),
                    self.potential_energy(),
                    self.temperature()
                );
                sample(self)?;
            }
        }

        Ok(RunSummary {
            steps: n_steps,
            neighbor_updates: self.neighbors.num_updates() - updates_before,
            elapsed: start.elapsed(),
            kinetic_energy: self.kinetic_energy(),
            potential_energy: self.potential_energy(),
        })
    }
}

impl<F: ForceProvider> Integrator for MdSimulation<F> {
    fn step(&mut self) -> Result<()> {
        self.neighbors.update(&mut self.atoms, &self.sim_box)?;

        self.integrator.first_half(&mut self.atoms);
        let output = self
            .provider
            .compute_forces(&mut self.atoms, &self.sim_box, self.neighbors.list());
        self.step += 1;
        if !output.potential_energy.is_finite() {
            return Err(MdError::NonFiniteEnergy { step: self.step });
        }
        self.integrator.second_half(&mut self.atoms);

        if let Some(thermostat) = &self.thermostat {
            thermostat.apply(self.step, &mut self.atoms);
        }
        self.force_output = output;
        Ok(())
    }

    fn temperature(&self) -> f64 {
        self.atoms.temperature()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lj_pot::LennardJones;
    use crate::neighbor::NeighborAlgorithm;
    use approx::assert_relative_eq;

    /// Pulls every atom toward a fixed point with a unit spring
    struct Spring(Vector3<f64>);

    impl ForceProvider for Spring {
        fn cutoff(&self) -> f64 {
            0.0
        }

        fn compute_forces(&mut self, atoms: &mut Atoms, _: &SimulationBox, _: &NeighborList) -> ForceOutput {
            atoms.clear_forces();
            let mut output = ForceOutput::default();
            for (f, r, u) in izip!(&mut atoms.forces, &atoms.positions, &mut atoms.potential_energies) {
                let stretch = r - self.0;
                *f = -stretch;
                *u = 0.5 * stretch.norm_squared();
                output.potential_energy += *u;
            }
            output
        }
    }

    fn manager(n_atoms: usize, cutoff: f64) -> NeighborListManager {
        NeighborListManager::new(NeighborAlgorithm::CellList, n_atoms, cutoff, 64, 0.5)
    }

    #[test]
    fn test_free_flight_keeps_momentum() {
        let sim_box = SimulationBox::cubic(10.0).unwrap();
        let atoms = Atoms::new(
            vec![1.0, 2.0, 3.0],
            vec![Vector3::new(1.0, 1.0, 1.0), Vector3::new(5.0, 5.0, 5.0), Vector3::new(8.0, 2.0, 6.0)],
            vec![Vector3::new(0.3, -0.1, 0.0), Vector3::new(0.0, 0.2, -0.4), Vector3::new(-0.1, 0.0, 0.1)],
        )
        .unwrap();
        let momentum = atoms.total_momentum();
        let lj = LennardJones::new(1.032e-2, 3.405, 1.0);
        let mut sim = MdSimulation::new(atoms, sim_box, lj, manager(3, 2.0), VelocityVerlet::new(0.1)).unwrap();
        for _ in 0..100 {
            sim.step().unwrap();
        }
        assert_relative_eq!(sim.atoms.total_momentum(), momentum, epsilon = 1e-12);
        assert_eq!(sim.current_step(), 100);
    }

    #[test]
    fn test_verlet_tracks_harmonic_oscillator() {
        let sim_box = SimulationBox::cubic(100.0).unwrap();
        let center = Vector3::repeat(50.0);
        let atoms = Atoms::new(vec![1.0], vec![center + Vector3::x()], vec![Vector3::zeros()]).unwrap();
        let dt = 0.01;
        let mut sim =
            MdSimulation::new(atoms, sim_box, Spring(center), manager(1, 1.0), VelocityVerlet::new(dt)).unwrap();
        let energy = sim.total_energy();
        let n_steps = 314;
        for _ in 0..n_steps {
            sim.step().unwrap();
        }
        let t = n_steps as f64 * dt;
        assert_relative_eq!(sim.atoms.positions[0].x - center.x, t.cos(), epsilon = 1e-3);
        assert_relative_eq!(sim.atoms.velocities[0].x, -t.sin(), epsilon = 1e-3);
        assert_relative_eq!(sim.total_energy(), energy, epsilon = 1e-4);
    }

    #[test]
    fn test_short_neighbor_cutoff_is_rejected() {
        let sim_box = SimulationBox::cubic(30.0).unwrap();
        let atoms = Atoms::new(vec![40.0], vec![Vector3::zeros()], vec![Vector3::zeros()]).unwrap();
        let result = MdSimulation::new(atoms, sim_box, LennardJones::default(), manager(1, 5.0), VelocityVerlet::new(1.0));
        assert!(matches!(result, Err(MdError::InvalidConfig(_))));
    }

    #[test]
    fn test_overlapping_atoms_give_non_finite_energy() {
        let sim_box = SimulationBox::cubic(30.0).unwrap();
        let atoms = Atoms::new(vec![40.0; 2], vec![Vector3::new(1.0, 1.0, 1.0); 2], vec![Vector3::zeros(); 2]).unwrap();
        let result = MdSimulation::new(atoms, sim_box, LennardJones::default(), manager(2, 10.0), VelocityVerlet::new(1.0));
        assert!(matches!(result, Err(MdError::NonFiniteEnergy { step: 0 })));
    }

    #[test]
    fn test_thermostat_rescales_on_interval() {
        let sim_box = SimulationBox::cubic(100.0).unwrap();
        let center = Vector3::repeat(50.0);
        let atoms = Atoms::new(vec![1.0], vec![center + Vector3::x()], vec![Vector3::new(0.0, 0.1, 0.0)]).unwrap();
        let thermostat = RescalingThermostat {
            target_temperature: 50.0,
            interval: 5,
        };
        let mut sim = MdSimulation::new(atoms, sim_box, Spring(center), manager(1, 1.0), VelocityVerlet::new(0.01))
            .unwrap()
            .with_thermostat(thermostat);

        let mut samples = Vec::new();
        let summary = sim
            .run(20, 5, |s| {
                samples.push(s.temperature());
                Ok(())
            })
            .unwrap();
        assert_eq!(summary.steps, 20);
        assert_eq!(samples.len(), 4);
        for t in samples {
            assert_relative_eq!(t, 50.0, epsilon = 1e-9);
        }
    }
}
