use super::{check_cutoff, NeighborList};
use crate::error::Result;
use crate::sim_box::SimulationBox;
use nalgebra::Vector3;

/// Fill `list` by testing every unordered pair of atoms.
pub fn build_all_pairs(
    positions: &[Vector3<f64>],
    sim_box: &SimulationBox,
    cutoff: f64,
    list: &mut NeighborList,
) -> Result<()> {
    check_cutoff(cutoff)?;
    let cutoff_square = cutoff * cutoff;
    list.clear();

    for (i, r_i) in positions.iter().enumerate() {
        for (j, r_j) in positions.iter().enumerate().skip(i + 1) {
            let r_ij = sim_box.minimum_image(&(r_j - r_i));
            if r_ij.norm_squared() < cutoff_square {
                list.insert_pair(i, j)?;
            }
        }
    }

    Ok(())
}
