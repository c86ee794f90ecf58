// src/simulation/probability.rs

use crate::core::{
    AmplitudeVector, Outcome, PROBABILITY_FLOOR, QspinError, RENORMALIZE_TOLERANCE, Result,
    STATE_DIM,
};
use std::collections::BTreeMap;
use std::fmt;
use tracing::warn;

/// Discrete distribution over the eight 3-bit outcomes.
///
/// Every outcome has an entry, zero-probability ones included. Entries below
/// [`PROBABILITY_FLOOR`] are stored as exactly zero, so basis states come out
/// as true delta distributions rather than "almost certain" ones.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbabilityDistribution {
    probabilities: [f64; STATE_DIM],
    renormalized: bool,
}

impl ProbabilityDistribution {
    /// Derives the measurement distribution of `state`: p(k) = |a_k|².
    ///
    /// If the total drifts from 1 by more than [`RENORMALIZE_TOLERANCE`] the
    /// probabilities are rescaled (and a warning is logged). A zero or
    /// non-finite total cannot be rescaled and is reported as
    /// [`QspinError::NumericAnomaly`].
    pub fn derive(state: &AmplitudeVector) -> Result<Self> {
        let mut probabilities = [0.0; STATE_DIM];
        for (p, amp) in probabilities.iter_mut().zip(state.amplitudes()) {
            let value = amp.norm_sqr();
            *p = if value < PROBABILITY_FLOOR { 0.0 } else { value };
        }
        Self::from_weights(probabilities)
    }

    /// Builds a distribution from raw non-negative weights, applying the same
    /// floor and renormalization rules as [`derive`](Self::derive).
    pub fn from_weights(mut probabilities: [f64; STATE_DIM]) -> Result<Self> {
        if let Some((k, bad)) = probabilities.iter().enumerate().find(|(_, p)| !p.is_finite() || **p < 0.0) {
            return Err(QspinError::NumericAnomaly {
                message: format!("Probability for outcome {:03b} is invalid: {}", k, bad),
            });
        }
        for p in probabilities.iter_mut() {
            if *p < PROBABILITY_FLOOR {
                *p = 0.0;
            }
        }

        let total: f64 = probabilities.iter().sum();
        if !total.is_finite() || total <= 0.0 {
            return Err(QspinError::NumericAnomaly {
                message: format!("Probabilities sum to {}, cannot renormalize", total),
            });
        }

        let renormalized = (total - 1.0).abs() > RENORMALIZE_TOLERANCE;
        if renormalized {
            warn!(total, "probability total outside tolerance, renormalizing");
            for p in probabilities.iter_mut() {
                *p /= total;
            }
        }
        Ok(Self { probabilities, renormalized })
    }

    /// Probability of one outcome.
    pub fn probability(&self, outcome: Outcome) -> f64 {
        self.probabilities[outcome.index()]
    }

    /// `(outcome, probability)` pairs in ascending bitstring order.
    pub fn iter(&self) -> impl Iterator<Item = (Outcome, f64)> + '_ {
        Outcome::all().map(|o| (o, self.probabilities[o.index()]))
    }

    /// Σp, which is 1 within tolerance for any successfully built distribution.
    pub fn total(&self) -> f64 {
        self.probabilities.iter().sum()
    }

    /// Whether derivation had to rescale the probabilities.
    pub fn was_renormalized(&self) -> bool {
        self.renormalized
    }

    /// The single outcome carrying all probability, if there is one.
    pub fn certain_outcome(&self) -> Option<Outcome> {
        let mut support = self.iter().filter(|(_, p)| *p > 0.0);
        match (support.next(), support.next()) {
            (Some((outcome, _)), None) => Some(outcome),
            _ => None,
        }
    }

    /// Bitstring-keyed view, all eight keys present.
    pub fn to_map(&self) -> BTreeMap<String, f64> {
        self.iter().map(|(o, p)| (o.bitstring(), p)).collect()
    }
}

impl fmt::Display for ProbabilityDistribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Distribution{{")?;
        for (i, (outcome, p)) in self.iter().enumerate() {
            write!(f, "{}{}: {:.4}", if i > 0 { ", " } else { "" }, outcome.bitstring(), p)?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex;
    use num_traits::Zero;

    #[test]
    fn test_basis_state_is_delta() -> Result<()> {
        let dist = ProbabilityDistribution::derive(&AmplitudeVector::basis(Outcome::new(5)?))?;
        assert_eq!(dist.probability(Outcome::new(5)?), 1.0);
        assert_eq!(dist.certain_outcome(), Some(Outcome::new(5)?));
        assert!(!dist.was_renormalized());
        Ok(())
    }

    #[test]
    fn test_drifted_state_is_renormalized() -> Result<()> {
        let mut amps = [Complex::zero(); STATE_DIM];
        amps[0] = Complex::new(0.9, 0.0);
        amps[7] = Complex::new(0.0, 0.9);
        let dist = ProbabilityDistribution::derive(&AmplitudeVector::from_amplitudes(amps))?;
        assert!(dist.was_renormalized());
        assert!((dist.total() - 1.0).abs() < 1e-12);
        assert!((dist.probability(Outcome::new(0)?) - 0.5).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn test_small_drift_is_accepted_as_is() -> Result<()> {
        let dist = ProbabilityDistribution::from_weights([0.5 + 1e-8, 0.5, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0])?;
        assert!(!dist.was_renormalized());
        assert_eq!(dist.probability(Outcome::new(1)?), 0.5);
        Ok(())
    }

    #[test]
    fn test_zero_state_is_numeric_anomaly() {
        let zero = AmplitudeVector::from_amplitudes([Complex::zero(); STATE_DIM]);
        assert!(matches!(
            ProbabilityDistribution::derive(&zero),
            Err(QspinError::NumericAnomaly { .. })
        ));
        assert!(ProbabilityDistribution::from_weights([f64::NAN, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]).is_err());
        assert!(ProbabilityDistribution::from_weights([-0.5, 1.5, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]).is_err());
    }

    #[test]
    fn test_map_has_all_keys() -> Result<()> {
        let dist = ProbabilityDistribution::derive(&AmplitudeVector::ground())?;
        let map = dist.to_map();
        assert_eq!(map.len(), 8);
        assert_eq!(map["000"], 1.0);
        assert_eq!(map["111"], 0.0);
        Ok(())
    }
}
