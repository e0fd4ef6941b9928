//! Verlet neighbor lists.
//!
//! The list is stored as one flat buffer with a fixed number of slots per
//! atom: the neighbors of atom `i` occupy `slots[i * capacity..][..counts[i]]`.
//! Per-bond quantities (the bond order, for instance) can be kept in a
//! parallel buffer addressed by the same slot index.
//!
//! Two builders fill the list: a direct all-pairs scan and a cell-linked
//! list scan. For the same input they produce the same set of pairs.

mod all_pairs;
mod cell_list;
mod maintenance;

pub use all_pairs::build_all_pairs;
pub use cell_list::{build_cell_list, CellGrid};
pub use maintenance::NeighborListManager;

use crate::error::{MdError, Result};
use crate::sim_box::SimulationBox;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Neighbor search algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
pub enum NeighborAlgorithm {
    /// O(N^2) scan over all pairs
    #[serde(rename = "all_pairs")]
    AllPairs,
    /// O(N) scan over a grid of cells at least one cutoff wide
    #[serde(rename = "cell_list")]
    CellList,
}

impl NeighborAlgorithm {
    pub fn build(
        self,
        positions: &[Vector3<f64>],
        sim_box: &SimulationBox,
        cutoff: f64,
        list: &mut NeighborList,
    ) -> Result<()> {
        match self {
            NeighborAlgorithm::AllPairs => build_all_pairs(positions, sim_box, cutoff, list),
            NeighborAlgorithm::CellList => build_cell_list(positions, sim_box, cutoff, list),
        }
    }
}

/// The search cutoff must be positive and finite for either builder.
fn check_cutoff(cutoff: f64) -> Result<()> {
    if cutoff > 0.0 && cutoff.is_finite() {
        Ok(())
    } else {
        Err(MdError::InvalidConfig(format!(
            "neighbor cutoff must be positive and finite, got {}",
            cutoff
        )))
    }
}

#[derive(Debug, Clone)]
pub struct NeighborList {
    capacity: usize,
    counts: Vec<usize>,
    slots: Vec<usize>,
}

impl NeighborList {
    pub fn new(n_atoms: usize, capacity: usize) -> Self {
        Self {
            capacity,
            counts: vec![0; n_atoms],
            slots: vec![0; n_atoms * capacity],
        }
    }

    pub fn n_atoms(&self) -> usize {
        self.counts.len()
    }

    /// Maximum number of neighbors per atom
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Size of the slot buffer, for allocating per-bond arrays
    pub fn n_slots(&self) -> usize {
        self.slots.len()
    }

    pub fn clear(&mut self) {
        self.counts.fill(0);
    }

    /// Record `i` and `j` as neighbors of each other.
    pub fn insert_pair(&mut self, i: usize, j: usize) -> Result<()> {
        self.push(i, j)?;
        self.push(j, i)
    }

    pub(crate) fn push(&mut self, atom: usize, neighbor: usize) -> Result<()> {
        let count = self.counts[atom];
        if count >= self.capacity {
            return Err(MdError::NeighborCapacityExceeded {
                atom,
                capacity: self.capacity,
            });
        }
        self.slots[atom * self.capacity + count] = neighbor;
        self.counts[atom] = count + 1;
        Ok(())
    }

    pub fn count(&self, atom: usize) -> usize {
        self.counts[atom]
    }

    pub fn neighbors(&self, atom: usize) -> &[usize] {
        let start = atom * self.capacity;
        &self.slots[start..start + self.counts[atom]]
    }

    /// Index into the slot buffer of the `k`-th neighbor of `atom`.
    pub fn slot(&self, atom: usize, k: usize) -> usize {
        atom * self.capacity + k
    }

    /// Slot of `neighbor` within the list of `atom`, by linear search.
    pub fn find_slot(&self, atom: usize, neighbor: usize) -> Option<usize> {
        self.neighbors(atom)
            .iter()
            .position(|&n| n == neighbor)
            .map(|k| self.slot(atom, k))
    }

    pub fn total_pairs(&self) -> usize {
        self.counts.iter().sum::<usize>() / 2
    }

    /// All unordered pairs `(i, j)` with `i < j`, sorted.
    pub fn pairs(&self) -> Vec<(usize, usize)> {
        let mut pairs: Vec<(usize, usize)> = (0..self.n_atoms())
            .flat_map(|i| {
                self.neighbors(i)
                    .iter()
                    .filter(move |&&j| i < j)
                    .map(move |&j| (i, j))
            })
            .collect();
        pairs.sort_unstable();
        pairs
    }
}
