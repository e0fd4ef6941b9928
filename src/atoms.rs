use crate::error::{MdError, Result};
use crate::units::K_B;
use itertools::izip;
use nalgebra::Vector3;

/// Per-atom state of the simulated system.
///
/// Every vector is indexed by atom; the index is the atom identity.
#[derive(Debug, Clone)]
pub struct Atoms {
    pub masses: Vec<f64>,
    pub positions: Vec<Vector3<f64>>,
    pub velocities: Vec<Vector3<f64>>,
    pub forces: Vec<Vector3<f64>>,
    /// Positions at the last neighbor list rebuild
    pub reference_positions: Vec<Vector3<f64>>,
    pub potential_energies: Vec<f64>,
}

impl Atoms {
    pub fn new(
        masses: Vec<f64>,
        positions: Vec<Vector3<f64>>,
        velocities: Vec<Vector3<f64>>,
    ) -> Result<Self> {
        let n_atoms = positions.len();
        if masses.len() != n_atoms {
            return Err(MdError::AtomCountMismatch {
                field: "masses",
                expected: n_atoms,
                found: masses.len(),
            });
        }
        if velocities.len() != n_atoms {
            return Err(MdError::AtomCountMismatch {
                field: "velocities",
                expected: n_atoms,
                found: velocities.len(),
            });
        }
        if let Some((atom, &mass)) = masses.iter().enumerate().find(|&(_, &m)| !(m > 0.0 && m.is_finite())) {
            return Err(MdError::NonPositiveMass { atom, mass });
        }

        Ok(Self {
            masses,
            reference_positions: positions.clone(),
            positions,
            velocities,
            forces: vec![Vector3::zeros(); n_atoms],
            potential_energies: vec![0.0; n_atoms],
        })
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Zero the force and per-atom energy accumulators.
    pub fn clear_forces(&mut self) {
        self.forces.fill(Vector3::zeros());
        self.potential_energies.fill(0.0);
    }

    pub fn kinetic_energy(&self) -> f64 {
        self.velocities
            .iter()
            .zip(&self.masses)
            .map(|(v, &m)| 0.5 * m * v.norm_squared())
            .sum()
    }

    pub fn potential_energy(&self) -> f64 {
        self.potential_energies.iter().sum()
    }

    /// Instantaneous temperature in Kelvin, `2 K / (3 N k_B)`.
    pub fn temperature(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        2.0 * self.kinetic_energy() / (3.0 * K_B * self.len() as f64)
    }

    pub fn total_mass(&self) -> f64 {
        self.masses.iter().sum()
    }

    pub fn total_momentum(&self) -> Vector3<f64> {
        izip!(&self.velocities, &self.masses).map(|(v, &m)| v * m).sum()
    }

    pub fn total_force(&self) -> Vector3<f64> {
        self.forces.iter().sum()
    }

    /// Subtract the mass-weighted center-of-mass velocity from every atom.
    pub fn remove_center_of_mass_velocity(&mut self) {
        let total_mass = self.total_mass();
        if total_mass <= 0.0 {
            return;
        }
        let v_cm = self.total_momentum() / total_mass;
        for v in &mut self.velocities {
            *v -= v_cm;
        }
    }

    /// Rescale velocities so the instantaneous temperature equals `target`.
    pub fn rescale_to_temperature(&mut self, target: f64) {
        let current = self.temperature();
        if current <= 0.0 {
            return;
        }
        let scale_factor = (target / current).sqrt();
        for v in &mut self.velocities {
            *v *= scale_factor;
        }
    }
}
