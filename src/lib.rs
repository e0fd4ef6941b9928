//! Classical molecular dynamics in periodic, possibly triclinic boxes.
//!
//! Atoms move under a Lennard-Jones pair potential or a Tersoff bond-order
//! potential, integrated with velocity Verlet. Neighbors come from a Verlet
//! list with a skin, built either by an all-pairs scan or by a cell-linked
//! list.

pub mod app;
pub mod atoms;
pub mod config;
pub mod error;
pub mod io;
pub mod lj_pot;
pub mod neighbor;
pub mod run_md;
pub mod setup;
pub mod sim_box;
pub mod tersoff_pot;
pub mod units;

pub use atoms::Atoms;
pub use error::{MdError, Result};
pub use lj_pot::LennardJones;
pub use neighbor::{NeighborAlgorithm, NeighborList, NeighborListManager};
pub use run_md::{ForceOutput, ForceProvider, Integrator, MdSimulation, VelocityVerlet};
pub use sim_box::SimulationBox;
pub use tersoff_pot::{Tersoff, TersoffParameters};
