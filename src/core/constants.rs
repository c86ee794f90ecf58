//! Fixed dimensions and tolerances of the three-unit spin register.

/// Constants shared by the simulation, sampling and selection layers.
pub mod qspin_constants {
    /// Number of binary units in the register. The topology is fixed.
    pub const NUM_UNITS: usize = 3;
    /// Dimension of the joint state vector (2^NUM_UNITS).
    pub const STATE_DIM: usize = 1 << NUM_UNITS;
    /// Allowed deviation of Σ|a|² from 1.0 for a valid amplitude vector.
    pub const NORM_TOLERANCE: f64 = 1e-9;
    /// Deviation of Σp from 1.0 beyond which a distribution is renormalized.
    pub const RENORMALIZE_TOLERANCE: f64 = 1e-6;
    /// Probabilities below this are treated as exactly zero.
    pub const PROBABILITY_FLOOR: f64 = 1e-12;
    /// Trials per spin when nothing else is configured.
    pub const DEFAULT_TRIALS: usize = 100;
    /// Used for rotation angles.
    pub const PI: f64 = std::f64::consts::PI;
}
