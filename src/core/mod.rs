// src/core/mod.rs

//! Core data structures and types

pub mod error;
pub mod state;
pub mod unit;

// Re-export public types for convenient access via `qspin::core::TypeName`
pub use error::{QspinError, Result};
pub use state::AmplitudeVector;
pub use unit::{Outcome, UnitId};

pub mod constants;
pub use constants::qspin_constants::{
    DEFAULT_TRIALS, NORM_TOLERANCE, NUM_UNITS, PI, PROBABILITY_FLOOR, RENORMALIZE_TOLERANCE,
    STATE_DIM,
};
