// src/sampling/mod.rs

//! Measurement sampling.
//!
//! Outcomes are drawn by inverse-CDF over the eight outcomes in ascending
//! bitstring order, one uniform draw u ∈ [0, 1) per trial. Sampling is
//! classical: the distribution is read, never collapsed, so every trial of a
//! spin is independent and identically distributed.
//!
//! All functions take the random source explicitly. A seeded
//! [`rand::rngs::StdRng`] reproduces the same outcomes run after run.

use crate::core::{DEFAULT_TRIALS, Outcome};
use crate::simulation::{Histogram, ProbabilityDistribution};
use rand::Rng;
use rand::distr::{Distribution, StandardUniform};

/// Maps one uniform draw `u` ∈ [0, 1) to an outcome.
///
/// Returns the first outcome whose cumulative probability exceeds `u`.
/// Zero-probability outcomes are never returned; if float rounding leaves the
/// cumulative sum just short of `u`, the last outcome with non-zero
/// probability is used.
pub fn outcome_for_draw(distribution: &ProbabilityDistribution, u: f64) -> Outcome {
    let mut cumulative = 0.0;
    let mut last_supported = None;
    for (outcome, p) in distribution.iter() {
        if p <= 0.0 {
            continue;
        }
        cumulative += p;
        last_supported = Some(outcome);
        if u < cumulative {
            return outcome;
        }
    }
    // A built distribution always has support; default is unreachable in practice.
    last_supported.unwrap_or_default()
}

/// Draws single outcomes and trial histograms from a distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutcomeSampler {
    trials: usize,
}

impl OutcomeSampler {
    /// Sampler producing `trials` draws per histogram.
    pub fn new(trials: usize) -> Self {
        Self { trials }
    }

    /// Trials per histogram.
    pub fn trials(&self) -> usize {
        self.trials
    }

    /// Draws one outcome using a single uniform draw from `rng`.
    pub fn sample_one<R: Rng + ?Sized>(&self, distribution: &ProbabilityDistribution, rng: &mut R) -> Outcome {
        let u: f64 = StandardUniform.sample(rng);
        outcome_for_draw(distribution, u)
    }

    /// Draws `n` independent outcomes and tallies them.
    pub fn sample_many<R: Rng + ?Sized>(
        &self,
        distribution: &ProbabilityDistribution,
        rng: &mut R,
        n: usize,
    ) -> Histogram {
        let mut histogram = Histogram::new();
        for _ in 0..n {
            histogram.record(self.sample_one(distribution, rng));
        }
        histogram
    }

    /// Draws the configured number of trials.
    pub fn sample_trials<R: Rng + ?Sized>(&self, distribution: &ProbabilityDistribution, rng: &mut R) -> Histogram {
        self.sample_many(distribution, rng, self.trials)
    }
}

impl Default for OutcomeSampler {
    fn default() -> Self {
        Self::new(DEFAULT_TRIALS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Result;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn quarter_split() -> Result<ProbabilityDistribution> {
        // 25% on 001, 75% on 110
        ProbabilityDistribution::from_weights([0.0, 0.25, 0.0, 0.0, 0.0, 0.0, 0.75, 0.0])
    }

    #[test]
    fn test_inverse_cdf_boundaries() -> Result<()> {
        let dist = quarter_split()?;
        assert_eq!(outcome_for_draw(&dist, 0.0).bitstring(), "001");
        assert_eq!(outcome_for_draw(&dist, 0.2499).bitstring(), "001");
        assert_eq!(outcome_for_draw(&dist, 0.25).bitstring(), "110");
        assert_eq!(outcome_for_draw(&dist, 0.9999).bitstring(), "110");
        // Past the end of the CDF resolves to the last supported outcome
        assert_eq!(outcome_for_draw(&dist, 1.0).bitstring(), "110");
        Ok(())
    }

    #[test]
    fn test_zero_probability_never_drawn_at_u_zero() -> Result<()> {
        let dist = ProbabilityDistribution::from_weights([0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0])?;
        assert_eq!(outcome_for_draw(&dist, 0.0).bitstring(), "111");
        Ok(())
    }

    #[test]
    fn test_seeded_sampling_is_reproducible() -> Result<()> {
        let dist = ProbabilityDistribution::from_weights([0.125; 8])?;
        let sampler = OutcomeSampler::default();

        let mut rng_a = StdRng::seed_from_u64(7);
        let mut rng_b = StdRng::seed_from_u64(7);
        assert_eq!(sampler.sample_one(&dist, &mut rng_a), sampler.sample_one(&dist, &mut rng_b));
        assert_eq!(sampler.sample_trials(&dist, &mut rng_a), sampler.sample_trials(&dist, &mut rng_b));
        Ok(())
    }

    #[test]
    fn test_histogram_total_matches_trials() -> Result<()> {
        let dist = quarter_split()?;
        let mut rng = StdRng::seed_from_u64(2024);
        let sampler = OutcomeSampler::new(37);
        let hist = sampler.sample_trials(&dist, &mut rng);
        assert_eq!(hist.total(), 37);
        assert_eq!(hist.count(crate::core::Outcome::new(0)?), 0);
        // Large sample lands near the 1:3 split
        let big = sampler.sample_many(&dist, &mut rng, 20_000);
        let share = big.count(crate::core::Outcome::from_bitstring("110")?) as f64 / 20_000.0;
        assert!((share - 0.75).abs() < 0.02, "share of 110 was {}", share);
        Ok(())
    }
}
