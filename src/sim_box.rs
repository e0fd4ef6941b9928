//! Periodic simulation cell.
//!
//! The lattice matrix holds the three lattice vectors as its columns, so a
//! fractional coordinate `s` maps to the Cartesian position `r = H * s`.
//! The inverse is computed once at construction and never exposed for
//! mutation, so the two can not drift apart.

use crate::error::{MdError, Result};
use nalgebra::{Matrix3, Vector3};

/// Determinants smaller than this are treated as a collapsed cell.
const DEGENERATE_DETERMINANT: f64 = 1e-12;

pub fn determinant(matrix: &Matrix3<f64>) -> f64 {
    matrix.determinant()
}

/// Invert a lattice matrix, refusing degenerate cells.
pub fn invert(matrix: &Matrix3<f64>) -> Result<Matrix3<f64>> {
    let det = determinant(matrix);
    if det.abs() < DEGENERATE_DETERMINANT {
        return Err(MdError::DegenerateBox { determinant: det });
    }
    matrix
        .try_inverse()
        .ok_or(MdError::DegenerateBox { determinant: det })
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationBox {
    lattice: Matrix3<f64>,
    inverse: Matrix3<f64>,
}

impl SimulationBox {
    pub fn new(lattice: Matrix3<f64>) -> Result<Self> {
        let inverse = invert(&lattice)?;
        Ok(Self { lattice, inverse })
    }

    /// Orthorhombic box with the given edge lengths.
    pub fn orthorhombic(lengths: Vector3<f64>) -> Result<Self> {
        Self::new(Matrix3::from_diagonal(&lengths))
    }

    pub fn cubic(length: f64) -> Result<Self> {
        Self::orthorhombic(Vector3::repeat(length))
    }

    pub fn lattice(&self) -> &Matrix3<f64> {
        &self.lattice
    }

    pub fn inverse(&self) -> &Matrix3<f64> {
        &self.inverse
    }

    pub fn volume(&self) -> f64 {
        determinant(&self.lattice).abs()
    }

    /// Perpendicular distance between each pair of opposite faces.
    ///
    /// Component `d` is the thickness along lattice vector `d`, i.e. the
    /// volume divided by the area of the face spanned by the other two.
    pub fn face_thickness(&self) -> Vector3<f64> {
        let volume = self.volume();
        let a = self.lattice.column(0).into_owned();
        let b = self.lattice.column(1).into_owned();
        let c = self.lattice.column(2).into_owned();
        Vector3::new(
            volume / b.cross(&c).norm(),
            volume / c.cross(&a).norm(),
            volume / a.cross(&b).norm(),
        )
    }

    pub fn to_fractional(&self, r: &Vector3<f64>) -> Vector3<f64> {
        self.inverse * r
    }

    pub fn to_cartesian(&self, s: &Vector3<f64>) -> Vector3<f64> {
        self.lattice * s
    }

    /// Displacement to the nearest periodic image.
    ///
    /// Each fractional component is shifted by one box length when it lies
    /// outside `[-0.5, 0.5]`. A displacement of exactly half a box is left
    /// untouched.
    pub fn minimum_image(&self, d: &Vector3<f64>) -> Vector3<f64> {
        let mut s = self.to_fractional(d);
        for k in 0..3 {
            if s[k] < -0.5 {
                s[k] += 1.0;
            } else if s[k] > 0.5 {
                s[k] -= 1.0;
            }
        }
        self.to_cartesian(&s)
    }

    /// Map a position back into the primary cell, `s` in `[0, 1)`.
    pub fn wrap_position(&self, r: &Vector3<f64>) -> Vector3<f64> {
        let mut s = self.to_fractional(r);
        for k in 0..3 {
            s[k] -= s[k].floor();
            // floor can leave exactly 1.0 behind for tiny negative inputs
            if s[k] >= 1.0 {
                s[k] -= 1.0;
            }
        }
        self.to_cartesian(&s)
    }
}
