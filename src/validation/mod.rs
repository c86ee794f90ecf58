// src/validation/mod.rs

//! Input and state validation.

use crate::core::{AmplitudeVector, NORM_TOLERANCE, PI, QspinError, Result};

/// Checks if the state vector is normalized (Σ|a_k|² ≈ 1.0).
///
/// # Arguments
/// * `state` - The `AmplitudeVector` to check.
/// * `tolerance` - Allowed deviation from 1.0. Defaults to 1e-9.
///
/// # Returns
/// * `Ok(())` if normalized within tolerance.
/// * `Err(QspinError::NumericAnomaly)` if normalization fails.
pub fn check_normalization(state: &AmplitudeVector, tolerance: Option<f64>) -> Result<()> {
    let effective_tolerance = tolerance.unwrap_or(NORM_TOLERANCE);
    let norm_sq = state.norm_sqr();
    if (norm_sq - 1.0).abs() > effective_tolerance {
        Err(QspinError::NumericAnomaly {
            message: format!(
                "State vector normalization failed. Sum(|c_i|^2) = {} (Deviation > {})",
                norm_sq, effective_tolerance
            ),
        })
    } else {
        Ok(())
    }
}

/// Validates a requested bias angle, which must be finite and within [0, π].
pub fn validate_bias_angle(theta: f64) -> Result<f64> {
    if !theta.is_finite() {
        return Err(QspinError::Validation {
            field: "theta",
            message: format!("{} is not a finite angle", theta),
        });
    }
    if !(0.0..=PI).contains(&theta) {
        return Err(QspinError::Validation {
            field: "theta",
            message: format!("{} is outside [0, π]", theta),
        });
    }
    Ok(theta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::STATE_DIM;
    use num_complex::Complex;
    use num_traits::Zero;

    #[test]
    fn test_bias_angle_bounds() {
        assert_eq!(validate_bias_angle(0.0), Ok(0.0));
        assert_eq!(validate_bias_angle(PI), Ok(PI));
        for bad in [-1e-9, PI + 1e-9, f64::NAN, f64::INFINITY] {
            match validate_bias_angle(bad) {
                Err(QspinError::Validation { field, .. }) => assert_eq!(field, "theta"),
                other => panic!("{} should be rejected, got {:?}", bad, other),
            }
        }
    }

    #[test]
    fn test_normalization() {
        assert!(check_normalization(&AmplitudeVector::ground(), None).is_ok());

        let mut amps = [Complex::zero(); STATE_DIM];
        amps[0] = Complex::new(0.5, 0.0);
        let short = AmplitudeVector::from_amplitudes(amps);
        assert!(matches!(check_normalization(&short, None), Err(QspinError::NumericAnomaly { .. })));
        assert!(check_normalization(&short, Some(0.8)).is_ok());
    }
}
