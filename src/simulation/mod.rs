// src/simulation/mod.rs

//! State-vector simulation of the three-unit register.
//!
//! [`Simulator`] runs a [`GateSequence`] from |000⟩ through the stateless
//! [`GateEngine`] and derives the measurement [`ProbabilityDistribution`].
//! Sampling that distribution lives in [`crate::sampling`].

pub mod engine;
mod probability;
mod results;

pub use engine::GateEngine;
pub use probability::ProbabilityDistribution;
pub use results::Histogram;

use crate::circuits::GateSequence;
use crate::core::{AmplitudeVector, Result};
use crate::validation::check_normalization;
use tracing::debug;

/// Runs gate sequences and derives their measurement distributions.
#[derive(Debug, Default, Clone, Copy)]
pub struct Simulator {
    engine: GateEngine,
}

impl Simulator {
    /// Creates a new Simulator with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies every operation of `sequence` to a fresh |000⟩ state.
    ///
    /// # Returns
    /// * `Ok(AmplitudeVector)` holding the final state.
    /// * `Err(QspinError::InvalidOperation)` for gates on units outside the register.
    pub fn run(&self, sequence: &GateSequence) -> Result<AmplitudeVector> {
        let mut state = AmplitudeVector::ground();
        for op in sequence.operations() {
            state = self.engine.apply(&state, op)?;
        }
        if let Err(e) = check_normalization(&state, None) {
            // Rotations and swaps are unitary, so this only shows float drift;
            // the distribution step corrects it.
            debug!(error = %e, "state norm drifted after gate sequence");
        }
        Ok(state)
    }

    /// Runs `sequence` and derives the distribution of its final state.
    pub fn distribution(&self, sequence: &GateSequence) -> Result<ProbabilityDistribution> {
        let state = self.run(sequence)?;
        ProbabilityDistribution::derive(&state)
    }
}
