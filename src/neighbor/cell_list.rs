use super::{check_cutoff, NeighborList};
use crate::error::Result;
use crate::sim_box::SimulationBox;
use itertools::{iproduct, Itertools};
use nalgebra::Vector3;

/// Atoms bucketed into a periodic grid of cells.
///
/// Every cell is at least `cutoff` thick along each face normal, so all
/// partners of an atom within the cutoff lie in the 27 cells around it.
/// The buckets are laid out counting-sort style: the atoms of cell `c` are
/// `contents[cell_start[c]..cell_start[c] + cell_count[c]]`.
#[derive(Debug, Clone)]
pub struct CellGrid {
    pub n_cells: [usize; 3],
    pub cell_start: Vec<usize>,
    pub cell_count: Vec<usize>,
    pub contents: Vec<usize>,
    atom_cells: Vec<[usize; 3]>,
}

impl CellGrid {
    pub fn new(positions: &[Vector3<f64>], sim_box: &SimulationBox, cutoff: f64) -> Result<Self> {
        check_cutoff(cutoff)?;
        let thickness = sim_box.face_thickness();
        let n_cells = [0, 1, 2].map(|d| ((thickness[d] / cutoff).floor() as usize).max(1));
        let total_cells = n_cells.iter().product();

        let atom_cells: Vec<[usize; 3]> = positions
            .iter()
            .map(|r| locate(sim_box, &n_cells, r))
            .collect();

        // Pass 1: count, then exclusive prefix sum for the offsets
        let mut cell_count = vec![0; total_cells];
        for cell in &atom_cells {
            cell_count[linear_index(&n_cells, cell)] += 1;
        }
        let mut cell_start = vec![0; total_cells];
        for c in 1..total_cells {
            cell_start[c] = cell_start[c - 1] + cell_count[c - 1];
        }

        // Pass 2: scatter atom indices into cell order
        let mut filled = vec![0; total_cells];
        let mut contents = vec![0; positions.len()];
        for (n, cell) in atom_cells.iter().enumerate() {
            let c = linear_index(&n_cells, cell);
            contents[cell_start[c] + filled[c]] = n;
            filled[c] += 1;
        }

        Ok(Self {
            n_cells,
            cell_start,
            cell_count,
            contents,
            atom_cells,
        })
    }

    pub fn total_cells(&self) -> usize {
        self.cell_count.len()
    }

    pub fn cell_of(&self, atom: usize) -> [usize; 3] {
        self.atom_cells[atom]
    }

    pub fn atoms_in(&self, cell: usize) -> &[usize] {
        let start = self.cell_start[cell];
        &self.contents[start..start + self.cell_count[cell]]
    }

    /// Linear indices of the 3x3x3 block of cells around `cell`.
    ///
    /// With fewer than three cells along an axis, wrapped offsets land on
    /// the same cell; each distinct cell is returned once.
    pub fn surrounding_cells(&self, cell: &[usize; 3]) -> Vec<usize> {
        iproduct!(-1isize..=1, -1isize..=1, -1isize..=1)
            .map(|(dz, dy, dx)| {
                let offsets = [dx, dy, dz];
                let shifted = [0, 1, 2].map(|d| {
                    let n = self.n_cells[d] as isize;
                    (cell[d] as isize + offsets[d]).rem_euclid(n) as usize
                });
                linear_index(&self.n_cells, &shifted)
            })
            .sorted_unstable()
            .dedup()
            .collect()
    }
}

fn locate(sim_box: &SimulationBox, n_cells: &[usize; 3], r: &Vector3<f64>) -> [usize; 3] {
    let s = sim_box.to_fractional(r);
    [0, 1, 2].map(|d| {
        let n = n_cells[d] as isize;
        ((s[d] * n as f64).floor() as isize).rem_euclid(n) as usize
    })
}

fn linear_index(n_cells: &[usize; 3], cell: &[usize; 3]) -> usize {
    cell[0] + n_cells[0] * (cell[1] + n_cells[1] * cell[2])
}

/// Fill `list` using a cell-linked list.
pub fn build_cell_list(
    positions: &[Vector3<f64>],
    sim_box: &SimulationBox,
    cutoff: f64,
    list: &mut NeighborList,
) -> Result<()> {
    let cutoff_square = cutoff * cutoff;
    let grid = CellGrid::new(positions, sim_box, cutoff)?;
    list.clear();

    for (n1, r1) in positions.iter().enumerate() {
        for neighbor_cell in grid.surrounding_cells(&grid.cell_of(n1)) {
            for &n2 in grid.atoms_in(neighbor_cell) {
                if n1 >= n2 {
                    continue;
                }
                let r12 = sim_box.minimum_image(&(positions[n2] - r1));
                if r12.norm_squared() < cutoff_square {
                    list.insert_pair(n1, n2)?;
                }
            }
        }
    }

    Ok(())
}
