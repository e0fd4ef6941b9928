// file: `src/tersoff_pot.rs`
use crate::atoms::Atoms;
use crate::neighbor::NeighborList;
use crate::run_md::{ForceOutput, ForceProvider};
use crate::sim_box::SimulationBox;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Parameters of the Tersoff bond-order potential for a single element.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TersoffParameters {
    /// Repulsive prefactor (eV)
    pub a: f64,
    /// Repulsive decay (1/Angstrom)
    pub lambda: f64,
    /// Attractive prefactor (eV)
    pub b: f64,
    /// Attractive decay (1/Angstrom)
    pub mu: f64,
    pub beta: f64,
    pub n: f64,
    pub c: f64,
    pub d: f64,
    pub h: f64,
    /// Start of the cutoff taper
    pub r1: f64,
    /// End of the cutoff taper
    pub r2: f64,
}

impl Default for TersoffParameters {
    /// Carbon (Tersoff 1988)
    fn default() -> Self {
        Self {
            a: 1393.6,
            lambda: 3.4879,
            b: 430.0,
            mu: 2.2119,
            beta: 1.5724e-7,
            n: 0.72751,
            c: 38049.0,
            d: 4.3484,
            h: -0.930,
            r1: 1.8,
            r2: 2.1,
        }
    }
}

impl TersoffParameters {
    /// Repulsive pair term and its radial derivative.
    pub fn repulsive(&self, d: f64) -> (f64, f64) {
        let fr = self.a * (-self.lambda * d).exp();
        (fr, -self.lambda * fr)
    }

    /// Attractive pair term and its radial derivative.
    pub fn attractive(&self, d: f64) -> (f64, f64) {
        let fa = self.b * (-self.mu * d).exp();
        (fa, -self.mu * fa)
    }

    /// Smooth cutoff, 1 below `r1` and 0 beyond `r2`, with its derivative.
    pub fn cutoff_function(&self, d: f64) -> (f64, f64) {
        if d < self.r1 {
            (1.0, 0.0)
        } else if d > self.r2 {
            (0.0, 0.0)
        } else {
            let width = self.r2 - self.r1;
            let phase = PI * (d - self.r1) / width;
            (0.5 * phase.cos() + 0.5, -0.5 * PI / width * phase.sin())
        }
    }

    /// Angular term `g(cos theta)` and its derivative in `cos theta`.
    pub fn angular(&self, cos: f64) -> (f64, f64) {
        let c2 = self.c * self.c;
        let d2 = self.d * self.d;
        let h_minus_cos = self.h - cos;
        let denominator = d2 + h_minus_cos * h_minus_cos;
        let g = 1.0 + c2 / d2 - c2 / denominator;
        let gp = 2.0 * c2 * (cos - self.h) / (denominator * denominator);
        (g, gp)
    }

    /// Bond order `b(zeta)` and its derivative `db/dzeta`.
    ///
    /// An empty environment (`zeta <= 0`) gives `b = 1` and no derivative.
    pub fn bond_order(&self, zeta: f64) -> (f64, f64) {
        if zeta <= 0.0 {
            return (1.0, 0.0);
        }
        let bzn = (self.beta * zeta).powf(self.n);
        let b = (1.0 + bzn).powf(-0.5 / self.n);
        let bp = -b * bzn * 0.5 / ((1.0 + bzn) * zeta);
        (b, bp)
    }
}

/// Tersoff many-body potential.
///
/// Bond orders and their derivatives are kept per neighbor slot, so they
/// share the layout of the neighbor list they were computed from.
#[derive(Debug, Clone)]
pub struct Tersoff {
    pub params: TersoffParameters,
    bond_orders: Vec<f64>,
    bond_order_derivatives: Vec<f64>,
}

impl Default for Tersoff {
    fn default() -> Self {
        Self::new(TersoffParameters::default())
    }
}

impl Tersoff {
    pub fn new(params: TersoffParameters) -> Self {
        Tersoff {
            params,
            bond_orders: Vec::new(),
            bond_order_derivatives: Vec::new(),
        }
    }

    /// Bond order of every neighbor slot from the last force evaluation
    pub fn bond_orders(&self) -> &[f64] {
        &self.bond_orders
    }

    /// Sum `zeta_ij` over the third atoms around each ordered pair and
    /// store `b_ij` and `db_ij/dzeta_ij` in the slot of `j` within `i`'s list.
    fn find_bond_orders(&mut self, atoms: &Atoms, sim_box: &SimulationBox, neighbors: &NeighborList) {
        let params = &self.params;
        for n1 in 0..atoms.len() {
            let r1 = atoms.positions[n1];
            let partners = neighbors.neighbors(n1);
            for (i1, &n2) in partners.iter().enumerate() {
                let r12 = sim_box.minimum_image(&(atoms.positions[n2] - r1));
                let d12 = r12.norm();
                let mut zeta = 0.0;
                for &n3 in partners {
                    if n3 == n2 {
                        continue;
                    }
                    let r13 = sim_box.minimum_image(&(atoms.positions[n3] - r1));
                    let d13 = r13.norm();
                    let (fc13, _) = params.cutoff_function(d13);
                    if fc13 == 0.0 {
                        continue;
                    }
                    let cos123 = r12.dot(&r13) / (d12 * d13);
                    let (g123, _) = params.angular(cos123);
                    zeta += fc13 * g123;
                }
                let (b12, bp12) = params.bond_order(zeta);
                let slot = neighbors.slot(n1, i1);
                self.bond_orders[slot] = b12;
                self.bond_order_derivatives[slot] = bp12;
            }
        }
    }

    /// Accumulate forces and energies from the stored bond orders, visiting
    /// every bond once.
    fn accumulate_forces(
        &self,
        atoms: &mut Atoms,
        sim_box: &SimulationBox,
        neighbors: &NeighborList,
    ) -> ForceOutput {
        let params = &self.params;
        let b = &self.bond_orders;
        let bp = &self.bond_order_derivatives;
        let mut output = ForceOutput::default();

        for n1 in 0..atoms.len() {
            for (i1, &n2) in neighbors.neighbors(n1).iter().enumerate() {
                if n2 < n1 {
                    continue;
                }
                let slot21 = neighbors.find_slot(n2, n1);
                debug_assert!(slot21.is_some(), "atom {} is missing from the neighbors of {}", n1, n2);
                let Some(slot21) = slot21 else {
                    continue;
                };
                let slot12 = neighbors.slot(n1, i1);

                let r12 = sim_box.minimum_image(&(atoms.positions[n2] - atoms.positions[n1]));
                let d12 = r12.norm();
                if d12 > params.r2 {
                    continue;
                }
                let d12inv = 1.0 / d12;
                let (fc12, fcp12) = params.cutoff_function(d12);
                let (fa12, fap12) = params.attractive(d12);
                let (fr12, frp12) = params.repulsive(d12);

                // Two-body part seen from each end of the bond
                let mut f12 = Vector3::zeros();
                let mut f21 = Vector3::zeros();
                let pair_part = |b_ij: f64| {
                    let factor1 = -b_ij * fa12 + fr12;
                    let factor2 = -b_ij * fap12 + frp12;
                    let factor3 = (fcp12 * factor1 + fc12 * factor2) * d12inv;
                    (factor1 * fc12, factor3)
                };
                let (p12, factor3) = pair_part(b[slot12]);
                f12 += r12 * (factor3 * 0.5);
                let (p21, factor3) = pair_part(b[slot21]);
                f21 -= r12 * (factor3 * 0.5);

                // Three-body part through the other neighbors of n1
                let bp12 = bp[slot12];
                for (i2, &n3) in neighbors.neighbors(n1).iter().enumerate() {
                    if n3 == n2 {
                        continue;
                    }
                    let r13 = sim_box.minimum_image(&(atoms.positions[n3] - atoms.positions[n1]));
                    let d13 = r13.norm();
                    let (fc13, _) = params.cutoff_function(d13);
                    if fc13 == 0.0 {
                        continue;
                    }
                    let (fa13, _) = params.attractive(d13);
                    let bp13 = bp[neighbors.slot(n1, i2)];
                    let cos123 = r12.dot(&r13) / (d12 * d13);
                    let (g123, gp123) = params.angular(cos123);
                    let cos_d = r13 / (d12 * d13) - r12 * (cos123 * d12inv * d12inv);
                    let factor123a =
                        (-bp12 * fc12 * fa12 * fc13 - bp13 * fc13 * fa13 * fc12) * gp123;
                    let factor123b = -bp13 * fc13 * fa13 * fcp12 * g123 * d12inv;
                    f12 += (r12 * factor123b + cos_d * factor123a) * 0.5;
                }

                // Three-body part through the other neighbors of n2
                let bp21 = bp[slot21];
                for (i2, &n3) in neighbors.neighbors(n2).iter().enumerate() {
                    if n3 == n1 {
                        continue;
                    }
                    let r23 = sim_box.minimum_image(&(atoms.positions[n3] - atoms.positions[n2]));
                    let d23 = r23.norm();
                    let (fc23, _) = params.cutoff_function(d23);
                    if fc23 == 0.0 {
                        continue;
                    }
                    let (fa23, _) = params.attractive(d23);
                    let bp23 = bp[neighbors.slot(n2, i2)];
                    let cos213 = -r12.dot(&r23) / (d12 * d23);
                    let (g213, gp213) = params.angular(cos213);
                    let cos_d = r23 / (d12 * d23) + r12 * (cos213 * d12inv * d12inv);
                    let factor213a =
                        (-bp21 * fc12 * fa12 * fc23 - bp23 * fc23 * fa23 * fc12) * gp213;
                    let factor213b = -bp23 * fc23 * fa23 * fcp12 * g213 * d12inv;
                    f21 += (-r12 * factor213b + cos_d * factor213a) * 0.5;
                }

                let force = f12 - f21;
                atoms.forces[n1] += force;
                atoms.forces[n2] -= force;
                atoms.potential_energies[n1] += 0.5 * p12;
                atoms.potential_energies[n2] += 0.5 * p21;

                output.potential_energy += 0.5 * (p12 + p21);
                output.virial -= force.component_mul(&r12);
                let heat = f12.dot(&atoms.velocities[n2]) - f21.dot(&atoms.velocities[n1]);
                output.heat_current -= r12 * heat;
            }
        }

        output
    }
}

impl ForceProvider for Tersoff {
    fn cutoff(&self) -> f64 {
        self.params.r2
    }

    fn compute_forces(
        &mut self,
        atoms: &mut Atoms,
        sim_box: &SimulationBox,
        neighbors: &NeighborList,
    ) -> ForceOutput {
        let n_slots = neighbors.n_slots();
        self.bond_orders.resize(n_slots, 0.0);
        self.bond_order_derivatives.resize(n_slots, 0.0);

        atoms.clear_forces();
        self.find_bond_orders(atoms, sim_box, neighbors);
        self.accumulate_forces(atoms, sim_box, neighbors)
    }
}
