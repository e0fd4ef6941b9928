use super::{NeighborAlgorithm, NeighborList};
use crate::atoms::Atoms;
use crate::error::Result;
use crate::sim_box::SimulationBox;
use tracing::debug;

/// Keeps a neighbor list valid across steps.
///
/// The list is searched with `cutoff`, which should exceed the force
/// cutoff by a skin. It is rebuilt only once some atom has moved farther
/// than `rebuild_distance` from where it was at the previous rebuild.
#[derive(Debug, Clone)]
pub struct NeighborListManager {
    algorithm: NeighborAlgorithm,
    cutoff: f64,
    rebuild_distance: f64,
    list: NeighborList,
    built: bool,
    num_updates: usize,
}

impl NeighborListManager {
    pub fn new(
        algorithm: NeighborAlgorithm,
        n_atoms: usize,
        cutoff: f64,
        capacity: usize,
        rebuild_distance: f64,
    ) -> Self {
        Self {
            algorithm,
            cutoff,
            rebuild_distance,
            list: NeighborList::new(n_atoms, capacity),
            built: false,
            num_updates: 0,
        }
    }

    pub fn list(&self) -> &NeighborList {
        &self.list
    }

    pub fn algorithm(&self) -> NeighborAlgorithm {
        self.algorithm
    }

    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    /// Number of rebuilds performed so far
    pub fn num_updates(&self) -> usize {
        self.num_updates
    }

    pub fn needs_rebuild(&self, atoms: &Atoms) -> bool {
        if !self.built {
            return true;
        }
        let threshold = self.rebuild_distance * self.rebuild_distance;
        atoms
            .positions
            .iter()
            .zip(&atoms.reference_positions)
            .any(|(r, r0)| (r - r0).norm_squared() > threshold)
    }

    /// Rebuild the list if it has gone stale. Returns whether it was rebuilt.
    pub fn update(&mut self, atoms: &mut Atoms, sim_box: &SimulationBox) -> Result<bool> {
        if !self.needs_rebuild(atoms) {
            return Ok(false);
        }
        self.rebuild(atoms, sim_box)?;
        Ok(true)
    }

    /// Wrap atoms into the box, search neighbors, and take new reference
    /// positions.
    pub fn rebuild(&mut self, atoms: &mut Atoms, sim_box: &SimulationBox) -> Result<()> {
        self.num_updates += 1;
        for r in &mut atoms.positions {
            *r = sim_box.wrap_position(r);
        }
        self.algorithm
            .build(&atoms.positions, sim_box, self.cutoff, &mut self.list)?;
        atoms.reference_positions.clone_from(&atoms.positions);
        self.built = true;

        debug!(
            "Neighbor list rebuild #{} ({:?}): {} pairs",
            self.num_updates,
            self.algorithm,
            self.list.total_pairs()
        );
        Ok(())
    }
}
