// src/simulation/engine.rs
use crate::core::{AmplitudeVector, QspinError, Result, STATE_DIM, UnitId};
use crate::operations::Operation;
use num_complex::Complex;
use num_traits::Zero;
use tracing::trace;

/// Applies gates to an [`AmplitudeVector`].
///
/// Every method takes the input state by reference and returns a new one;
/// the engine holds no state of its own, so a single instance can serve any
/// number of concurrent requests.
#[derive(Debug, Default, Clone, Copy)]
pub struct GateEngine;

impl GateEngine {
    pub fn new() -> Self {
        Self
    }

    /// Dispatches one [`Operation`].
    pub fn apply(&self, state: &AmplitudeVector, op: &Operation) -> Result<AmplitudeVector> {
        trace!(?op, "applying gate");
        match op {
            Operation::Rotate { unit, theta } => self.apply_rotation(state, *unit, *theta),
            Operation::ControlledFlip { control, target } => {
                self.apply_controlled_flip(state, *control, *target)
            }
        }
    }

    /// Rotates one unit by `theta`, holding every other unit's bit fixed.
    ///
    /// For each of the four pairs of basis states that differ only in `unit`'s
    /// bit, with pre-rotation amplitudes a0 (bit = 0) and a1 (bit = 1):
    ///
    /// ```text
    /// a0' = cos(θ/2)·a0 − sin(θ/2)·a1
    /// a1' = sin(θ/2)·a0 + cos(θ/2)·a1
    /// ```
    pub fn apply_rotation(
        &self,
        state: &AmplitudeVector,
        unit: UnitId,
        theta: f64,
    ) -> Result<AmplitudeVector> {
        let half = theta / 2.0;
        let (sin_a, cos_a) = half.sin_cos();
        let matrix = [
            [Complex::new(cos_a, 0.0), Complex::new(-sin_a, 0.0)],
            [Complex::new(sin_a, 0.0), Complex::new(cos_a, 0.0)],
        ];
        apply_single_unit_gate(state, unit, &matrix)
    }

    /// Flips `target` wherever `control` is 1.
    ///
    /// Amplitudes are swapped between each basis pair that has the control bit
    /// set and differs only in the target bit; the control-0 half of the state
    /// is untouched.
    pub fn apply_controlled_flip(
        &self,
        state: &AmplitudeVector,
        control: UnitId,
        target: UnitId,
    ) -> Result<AmplitudeVector> {
        if control == target {
            return Err(QspinError::InvalidOperation {
                message: format!("Control and target cannot both be {}", control),
            });
        }
        let control_mask = control.mask()?;
        let target_mask = target.mask()?;

        let mut amplitudes = *state.amplitudes();
        for index in 0..STATE_DIM {
            // Visit each swapped pair once, from its target-0 member.
            if index & control_mask != 0 && index & target_mask == 0 {
                amplitudes.swap(index, index | target_mask);
            }
        }
        Ok(AmplitudeVector::from_amplitudes(amplitudes))
    }
}

/// Applies a 2x2 matrix to one unit of the register.
/// Assumes standard tensor product structure for the state vector.
fn apply_single_unit_gate(
    state: &AmplitudeVector,
    unit: UnitId,
    matrix: &[[Complex<f64>; 2]; 2],
) -> Result<AmplitudeVector> {
    let k_mask = unit.mask()?;
    let lower_mask = k_mask - 1; // bits to the right of the unit
    let upper_mask = !((k_mask << 1) - 1); // bits to the left

    let input = state.amplitudes();
    let mut output = [Complex::zero(); STATE_DIM];

    // Iterate over pairs of basis states differing only at the unit's position
    for i in 0..STATE_DIM / 2 {
        let i0 = ((i << 1) & upper_mask) | (i & lower_mask);
        let i1 = i0 | k_mask;

        let psi_0 = input[i0];
        let psi_1 = input[i1];

        output[i0] = matrix[0][0] * psi_0 + matrix[0][1] * psi_1;
        output[i1] = matrix[1][0] * psi_0 + matrix[1][1] * psi_1;
    }

    Ok(AmplitudeVector::from_amplitudes(output))
}
