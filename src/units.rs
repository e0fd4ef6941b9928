//! Natural units: eV for energy, Angstrom for length, amu for mass.

/// Boltzmann constant in eV/K
pub const K_B: f64 = 8.617343e-5;

/// Femtoseconds per natural time unit
pub const TIME_UNIT_CONVERSION: f64 = 1.018051e+1;

pub fn fs_to_natural(time_fs: f64) -> f64 {
    time_fs / TIME_UNIT_CONVERSION
}
