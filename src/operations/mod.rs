// src/operations/mod.rs

//! Defines the two gate kinds a spin can apply to the register.
//!
//! The register topology is fixed, but gates are still expressed as a short
//! tagged instruction list so that sequences can be built, inspected, and
//! tested step by step.

use crate::core::UnitId;

/// A single gate applied to the three-unit register.
#[derive(Debug, Clone, PartialEq)] // f64 angle rules out Eq
pub enum Operation {
    /// Real rotation of one unit about the Y axis by `theta` radians.
    ///
    /// |0⟩ → cos(θ/2)|0⟩ + sin(θ/2)|1⟩, biasing the unit towards 1 as θ → π.
    ///
    /// Analogy: the `RY(θ)` gate.
    Rotate {
        /// The unit being rotated.
        unit: UnitId,
        /// Rotation angle in radians.
        theta: f64,
    },

    /// Flip of `target` conditioned on `control` being 1.
    ///
    /// Swaps the amplitude pairs that differ only in the target bit, within the
    /// half of the state where the control bit is set. This correlates the two
    /// units' measured bits.
    ///
    /// Analogy: the `CNOT` / `CX` gate.
    ControlledFlip {
        /// The unit whose value decides whether the flip happens.
        control: UnitId,
        /// The unit that is flipped.
        target: UnitId,
    },
}

impl Operation {
    /// Returns the units touched by this operation.
    pub fn involved_units(&self) -> Vec<UnitId> {
        match self {
            Operation::Rotate { unit, .. } => vec![*unit],
            Operation::ControlledFlip { control, target } => vec![*control, *target],
        }
    }

    /// Short gate symbol used by the circuit diagram.
    pub fn symbol(&self) -> &'static str {
        match self {
            Operation::Rotate { .. } => "RY",
            Operation::ControlledFlip { .. } => "X",
        }
    }
}
