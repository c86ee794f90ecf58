// src/core/state.rs

use super::constants::qspin_constants::STATE_DIM;
use super::unit::Outcome;
use num_complex::Complex;
use num_traits::Zero;
use std::fmt;

/// Joint state of the three units before measurement.
///
/// Eight complex amplitudes indexed by [`Outcome`] (unit 0 is the most
/// significant bit). A freshly built vector is the ground state |000⟩; gates
/// produce new vectors rather than mutating a shared one, so each request
/// owns its state outright.
#[derive(Debug, Clone, PartialEq)] // Avoid Eq for floating-point complex numbers
pub struct AmplitudeVector {
    amplitudes: [Complex<f64>; STATE_DIM],
}

impl AmplitudeVector {
    /// The all-zero basis state |000⟩.
    pub fn ground() -> Self {
        Self::basis(Outcome::default())
    }

    /// The basis state for a single outcome: amplitude 1 there, 0 elsewhere.
    pub fn basis(outcome: Outcome) -> Self {
        let mut amplitudes = [Complex::zero(); STATE_DIM];
        amplitudes[outcome.index()] = Complex::new(1.0, 0.0);
        Self { amplitudes }
    }

    /// Wraps raw amplitudes. No normalization is applied here; see
    /// [`crate::validation::check_normalization`].
    pub fn from_amplitudes(amplitudes: [Complex<f64>; STATE_DIM]) -> Self {
        Self { amplitudes }
    }

    /// Read-only view of the amplitudes.
    pub fn amplitudes(&self) -> &[Complex<f64>; STATE_DIM] {
        &self.amplitudes
    }

    /// Amplitude of one basis outcome.
    pub fn amplitude(&self, outcome: Outcome) -> Complex<f64> {
        self.amplitudes[outcome.index()]
    }

    /// Σ|a_k|².
    pub fn norm_sqr(&self) -> f64 {
        self.amplitudes.iter().map(|c| c.norm_sqr()).sum()
    }

    pub fn dim(&self) -> usize {
        STATE_DIM
    }
}

impl Default for AmplitudeVector {
    fn default() -> Self {
        Self::ground()
    }
}

impl fmt::Display for AmplitudeVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Amplitudes[")?;
        for (i, c) in self.amplitudes.iter().enumerate() {
            write!(f, "{}{:.4}", if i > 0 { ", " } else { "" }, c)?;
        }
        write!(f, "]")
    }
}
