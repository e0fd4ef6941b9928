//! Initial configurations: crystal lattices and thermal velocities.

use crate::atoms::Atoms;
use crate::error::{MdError, Result};
use crate::sim_box::SimulationBox;
use crate::units::K_B;
use nalgebra::Vector3;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, StandardNormal};
use tracing::info;

/// Fractional coordinates of the four atoms in a conventional FCC cell
const FCC_BASIS: [[f64; 3]; 4] = [
    [0.0, 0.0, 0.0],
    [0.0, 0.5, 0.5],
    [0.5, 0.0, 0.5],
    [0.5, 0.5, 0.0],
];

/// Face-centered cubic crystal of `cells` conventional cells.
pub fn fcc_lattice(cells: [usize; 3], lattice_constant: f64) -> Result<(Vec<Vector3<f64>>, SimulationBox)> {
    check_cells(&cells)?;
    let sim_box = SimulationBox::orthorhombic(Vector3::new(
        cells[0] as f64 * lattice_constant,
        cells[1] as f64 * lattice_constant,
        cells[2] as f64 * lattice_constant,
    ))?;

    let mut positions = Vec::with_capacity(4 * cells.iter().product::<usize>());
    for ix in 0..cells[0] {
        for iy in 0..cells[1] {
            for iz in 0..cells[2] {
                let origin = Vector3::new(ix as f64, iy as f64, iz as f64);
                for basis in &FCC_BASIS {
                    positions.push((origin + Vector3::from(*basis)) * lattice_constant);
                }
            }
        }
    }

    info!(
        "Built FCC lattice: {}x{}x{} cells, {} atoms, a = {} A",
        cells[0],
        cells[1],
        cells[2],
        positions.len(),
        lattice_constant
    );
    Ok((positions, sim_box))
}

/// Graphene sheet in the xy plane built from a rectangular four-atom cell
/// (armchair along x, zigzag along y), with `vacuum` as the box height.
pub fn graphene_sheet(cells: [usize; 2], bond_length: f64, vacuum: f64) -> Result<(Vec<Vector3<f64>>, SimulationBox)> {
    check_cells(&[cells[0], cells[1], 1])?;
    let cell_x = 3.0 * bond_length;
    let cell_y = 3f64.sqrt() * bond_length;
    let basis = [
        Vector3::new(0.0, 0.0, 0.0),
        Vector3::new(0.5 * bond_length, 0.5 * cell_y, 0.0),
        Vector3::new(1.5 * bond_length, 0.5 * cell_y, 0.0),
        Vector3::new(2.0 * bond_length, 0.0, 0.0),
    ];
    let sim_box = SimulationBox::orthorhombic(Vector3::new(
        cells[0] as f64 * cell_x,
        cells[1] as f64 * cell_y,
        vacuum,
    ))?;

    // Shift off the box faces so wrapping leaves the sheet intact
    let shift = Vector3::new(0.25 * bond_length, 0.25 * cell_y, 0.5 * vacuum);
    let mut positions = Vec::with_capacity(4 * cells[0] * cells[1]);
    for ix in 0..cells[0] {
        for iy in 0..cells[1] {
            let origin = Vector3::new(ix as f64 * cell_x, iy as f64 * cell_y, 0.0);
            for b in &basis {
                positions.push(origin + b + shift);
            }
        }
    }

    info!(
        "Built graphene sheet: {}x{} cells, {} atoms, a_cc = {} A",
        cells[0],
        cells[1],
        positions.len(),
        bond_length
    );
    Ok((positions, sim_box))
}

fn check_cells(cells: &[usize; 3]) -> Result<()> {
    if cells.contains(&0) {
        return Err(MdError::InvalidConfig(format!(
            "cell counts must be positive, got {:?}",
            cells
        )));
    }
    Ok(())
}

/// Draw Maxwell-Boltzmann velocities, remove the center-of-mass drift and
/// rescale to exactly `temperature` Kelvin.
///
/// With `seed` the draw is reproducible; otherwise it comes from entropy.
pub fn initialize_velocities(atoms: &mut Atoms, temperature: f64, seed: Option<u64>) {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    for (v, &m) in atoms.velocities.iter_mut().zip(&atoms.masses) {
        let sigma = (K_B * temperature / m).sqrt();
        *v = Vector3::from_fn(|_, _| {
            let x: f64 = StandardNormal.sample(&mut rng);
            sigma * x
        });
    }
    atoms.remove_center_of_mass_velocity();
    atoms.rescale_to_temperature(temperature);
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use itertools::Itertools;

    fn min_distance(positions: &[Vector3<f64>], sim_box: &SimulationBox) -> f64 {
        positions
            .iter()
            .tuple_combinations()
            .map(|(a, b)| sim_box.minimum_image(&(b - a)).norm())
            .fold(f64::INFINITY, f64::min)
    }

    #[test]
    fn test_fcc_lattice() {
        let a = 5.385;
        let (positions, sim_box) = fcc_lattice([2, 3, 2], a).unwrap();
        assert_eq!(positions.len(), 48);
        assert_relative_eq!(sim_box.volume(), 12.0 * a * a * a, epsilon = 1e-9);
        assert_relative_eq!(min_distance(&positions, &sim_box), a / 2f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_graphene_sheet() {
        let a_cc = 1.42;
        let (positions, sim_box) = graphene_sheet([3, 3], a_cc, 20.0).unwrap();
        assert_eq!(positions.len(), 36);
        assert_relative_eq!(min_distance(&positions, &sim_box), a_cc, epsilon = 1e-12);

        // Every atom has exactly three nearest neighbors across the periodic sheet
        for r in &positions {
            let bonded = positions
                .iter()
                .filter(|s| {
                    let d = sim_box.minimum_image(&(*s - r)).norm();
                    (d - a_cc).abs() < 1e-9
                })
                .count();
            assert_eq!(bonded, 3);
        }
        assert!(positions.iter().all(|r| r.z == 10.0));
    }

    #[test]
    fn test_zero_cells_are_rejected() {
        assert!(matches!(fcc_lattice([0, 1, 1], 5.0), Err(MdError::InvalidConfig(_))));
        assert!(matches!(graphene_sheet([1, 0], 1.42, 20.0), Err(MdError::InvalidConfig(_))));
    }

    #[test]
    fn test_initialize_velocities() {
        let (positions, _) = fcc_lattice([2, 2, 2], 5.385).unwrap();
        let n_atoms = positions.len();
        let mut atoms = Atoms::new(vec![40.0; n_atoms], positions, vec![Vector3::zeros(); n_atoms]).unwrap();
        initialize_velocities(&mut atoms, 60.0, Some(42));
        assert_relative_eq!(atoms.temperature(), 60.0, epsilon = 1e-9);
        assert_relative_eq!(atoms.total_momentum(), Vector3::zeros(), epsilon = 1e-10);

        let first = atoms.velocities.clone();
        initialize_velocities(&mut atoms, 60.0, Some(42));
        assert_eq!(atoms.velocities, first);
    }
}
