// file: `src/lj_pot.rs`
use crate::atoms::Atoms;
use crate::neighbor::NeighborList;
use crate::run_md::{ForceOutput, ForceProvider};
use crate::sim_box::SimulationBox;
use nalgebra::Vector3;

/// Truncated Lennard-Jones pair potential.
#[derive(Debug, Clone)]
pub struct LennardJones {
    pub epsilon: f64,
    pub sigma: f64,
    pub cutoff: f64,
    e24s6: f64,
    e48s12: f64,
    e4s6: f64,
    e4s12: f64,
}

impl Default for LennardJones {
    /// Argon in eV and Angstrom
    fn default() -> Self {
        Self::new(1.032e-2, 3.405, 9.0)
    }
}

impl LennardJones {
    pub fn new(epsilon: f64, sigma: f64, cutoff: f64) -> Self {
        let sigma6 = sigma.powi(6);
        let sigma12 = sigma6 * sigma6;
        LennardJones {
            epsilon,
            sigma,
            cutoff,
            e24s6: 24.0 * epsilon * sigma6,
            e48s12: 48.0 * epsilon * sigma12,
            e4s6: 4.0 * epsilon * sigma6,
            e4s12: 4.0 * epsilon * sigma12,
        }
    }

    /// Pair energy and the force coefficient `f` at squared distance `r2`.
    ///
    /// The force on the first atom is `f * r_ij` with `r_ij = r_j - r_i`.
    pub fn pair(&self, r2: f64) -> (f64, f64) {
        let r2inv = 1.0 / r2;
        let r4inv = r2inv * r2inv;
        let r6inv = r2inv * r4inv;
        let r8inv = r4inv * r4inv;
        let r12inv = r4inv * r8inv;
        let r14inv = r6inv * r8inv;
        let energy = self.e4s12 * r12inv - self.e4s6 * r6inv;
        let f_ij = self.e24s6 * r8inv - self.e48s12 * r14inv;
        (energy, f_ij)
    }
}

impl ForceProvider for LennardJones {
    fn cutoff(&self) -> f64 {
        self.cutoff
    }

    fn compute_forces(
        &mut self,
        atoms: &mut Atoms,
        sim_box: &SimulationBox,
        neighbors: &NeighborList,
    ) -> ForceOutput {
        let cutoff_square = self.cutoff * self.cutoff;
        let mut output = ForceOutput::default();
        atoms.clear_forces();

        for i in 0..atoms.len() {
            let r_i = atoms.positions[i];
            for &j in neighbors.neighbors(i) {
                // each unordered pair once
                if j < i {
                    continue;
                }
                let r_ij = sim_box.minimum_image(&(atoms.positions[j] - r_i));
                let r2 = r_ij.norm_squared();
                // the list is built with a skin beyond the force cutoff
                if r2 > cutoff_square {
                    continue;
                }

                let (energy, f_ij) = self.pair(r2);
                let force = r_ij * f_ij;
                atoms.forces[i] += force;
                atoms.forces[j] -= force;
                atoms.potential_energies[i] += 0.5 * energy;
                atoms.potential_energies[j] += 0.5 * energy;

                output.potential_energy += energy;
                output.virial -= force.component_mul(&r_ij);
                // dU_i/dr_ij = force / 2 and dU_j/dr_ji = -force / 2
                let v_sum: Vector3<f64> = atoms.velocities[i] + atoms.velocities[j];
                output.heat_current -= r_ij * (0.5 * force.dot(&v_sum));
            }
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neighbor::NeighborAlgorithm;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn neighbor_list(atoms: &Atoms, sim_box: &SimulationBox, cutoff: f64) -> NeighborList {
        let mut list = NeighborList::new(atoms.len(), 64);
        NeighborAlgorithm::AllPairs
            .build(&atoms.positions, sim_box, cutoff, &mut list)
            .unwrap();
        list
    }

    fn random_cluster(n_atoms: usize, seed: u64) -> (Atoms, SimulationBox) {
        // Jittered simple cubic arrangement so no two atoms overlap
        let sim_box = SimulationBox::cubic(20.0).unwrap();
        let mut rng = StdRng::seed_from_u64(seed);
        let positions: Vec<Vector3<f64>> = (0..n_atoms)
            .map(|n| {
                let site = Vector3::new((n % 4) as f64, ((n / 4) % 4) as f64, (n / 16) as f64) * 5.0;
                let jitter = Vector3::new(rng.gen::<f64>(), rng.gen::<f64>(), rng.gen::<f64>());
                site + (jitter - Vector3::repeat(0.5)) * 0.6
            })
            .collect();
        let velocities = (0..n_atoms)
            .map(|_| Vector3::new(rng.gen::<f64>(), rng.gen::<f64>(), rng.gen::<f64>()) * 0.01)
            .collect();
        let atoms = Atoms::new(vec![40.0; n_atoms], positions, velocities).unwrap();
        (atoms, sim_box)
    }

    #[test]
    fn test_pair_energy_minimum() {
        let lj = LennardJones::default();
        let r_min = 2f64.powf(1.0 / 6.0) * lj.sigma;
        let (energy, f_ij) = lj.pair(r_min * r_min);
        assert_relative_eq!(energy, -lj.epsilon, epsilon = 1e-12);
        assert_relative_eq!(f_ij, 0.0, epsilon = 1e-12);

        let (energy, _) = lj.pair(lj.sigma * lj.sigma);
        assert_relative_eq!(energy, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_dimer_is_counted_once() {
        let sim_box = SimulationBox::cubic(30.0).unwrap();
        let r = 3.6;
        let mut atoms = Atoms::new(
            vec![40.0; 2],
            vec![Vector3::new(1.0, 1.0, 1.0), Vector3::new(1.0 + r, 1.0, 1.0)],
            vec![Vector3::zeros(); 2],
        )
        .unwrap();
        let mut lj = LennardJones::default();
        let list = neighbor_list(&atoms, &sim_box, 10.0);
        let output = lj.compute_forces(&mut atoms, &sim_box, &list);

        let (energy, f_ij) = lj.pair(r * r);
        assert_relative_eq!(output.potential_energy, energy, epsilon = 1e-14);
        assert_relative_eq!(atoms.potential_energy(), energy, epsilon = 1e-14);
        assert_relative_eq!(atoms.forces[0].x, f_ij * r, epsilon = 1e-14);
        assert_relative_eq!(atoms.forces[1].x, -f_ij * r, epsilon = 1e-14);
        assert_relative_eq!(output.virial.x, -f_ij * r * r, epsilon = 1e-14);
    }

    /// Four atoms well inside a large box, all within the force cutoff
    fn compact_cluster() -> (Atoms, SimulationBox) {
        let sim_box = SimulationBox::cubic(30.0).unwrap();
        let origin = Vector3::new(12.0, 12.0, 12.0);
        let positions = vec![
            origin,
            origin + Vector3::new(3.7, 0.2, -0.1),
            origin + Vector3::new(1.6, 3.4, 0.3),
            origin + Vector3::new(1.2, 1.1, 3.5),
        ];
        let atoms = Atoms::new(vec![40.0; 4], positions, vec![Vector3::zeros(); 4]).unwrap();
        (atoms, sim_box)
    }

    #[test]
    fn test_virial_matches_force_moment() {
        let (mut atoms, sim_box) = compact_cluster();
        let mut lj = LennardJones::default();
        let list = neighbor_list(&atoms, &sim_box, 10.0);
        assert_eq!(list.total_pairs(), 6);
        let output = lj.compute_forces(&mut atoms, &sim_box, &list);

        let moment = atoms
            .forces
            .iter()
            .zip(&atoms.positions)
            .fold(Vector3::zeros(), |sum, (f, r)| sum + f.component_mul(r));
        assert!(output.virial.norm() > 1e-4);
        assert_relative_eq!(output.virial, moment, epsilon = 1e-10);
    }

    #[test]
    fn test_uniform_drift_heat_current_is_velocity_times_virial() {
        let (mut atoms, sim_box) = compact_cluster();
        let drift = 0.02;
        atoms.velocities = vec![Vector3::new(drift, 0.0, 0.0); atoms.len()];
        let mut lj = LennardJones::default();
        let list = neighbor_list(&atoms, &sim_box, 10.0);
        let output = lj.compute_forces(&mut atoms, &sim_box, &list);

        assert!(output.heat_current.x.abs() > 1e-7);
        assert_relative_eq!(output.heat_current.x, drift * output.virial.x, epsilon = 1e-14);
    }

    #[test]
    fn test_pairs_beyond_force_cutoff_are_ignored() {
        let sim_box = SimulationBox::cubic(30.0).unwrap();
        let mut atoms = Atoms::new(
            vec![40.0; 2],
            vec![Vector3::new(1.0, 1.0, 1.0), Vector3::new(10.5, 1.0, 1.0)],
            vec![Vector3::zeros(); 2],
        )
        .unwrap();
        let mut lj = LennardJones::default();
        let list = neighbor_list(&atoms, &sim_box, 10.0);
        assert_eq!(list.total_pairs(), 1);
        let output = lj.compute_forces(&mut atoms, &sim_box, &list);
        assert_eq!(output.potential_energy, 0.0);
        assert_eq!(atoms.forces[0], Vector3::zeros());
    }

    #[test]
    fn test_total_force_vanishes() {
        let (mut atoms, sim_box) = random_cluster(64, 5);
        let mut lj = LennardJones::default();
        let list = neighbor_list(&atoms, &sim_box, 10.0);
        lj.compute_forces(&mut atoms, &sim_box, &list);
        assert_relative_eq!(atoms.total_force(), Vector3::zeros(), epsilon = 1e-10);
    }

    #[test]
    fn test_forces_match_energy_gradient() {
        let (mut atoms, sim_box) = random_cluster(64, 9);
        let mut lj = LennardJones::default();
        let list = neighbor_list(&atoms, &sim_box, 10.0);
        lj.compute_forces(&mut atoms, &sim_box, &list);
        let forces = atoms.forces.clone();

        let h = 1e-5;
        for &(atom, k) in &[(0, 0), (17, 1), (42, 2), (63, 0)] {
            let mut displaced = atoms.clone();
            displaced.positions[atom][k] += h;
            let plus = lj.compute_forces(&mut displaced, &sim_box, &list).potential_energy;
            displaced.positions[atom][k] -= 2.0 * h;
            let minus = lj.compute_forces(&mut displaced, &sim_box, &list).potential_energy;
            let numerical = -(plus - minus) / (2.0 * h);
            assert_relative_eq!(forces[atom][k], numerical, epsilon = 1e-7);
        }
    }
}
