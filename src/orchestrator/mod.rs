// src/orchestrator/mod.rs

//! One spin, end to end.
//!
//! [`SpinOrchestrator::spin`] validates the request, runs the gate sequence
//! on the local simulator, lets the [`BackendSelector`] decide which backend
//! services the request, then samples the headline outcome and the trial
//! histogram from the local distribution. Requests share no mutable state,
//! so one orchestrator can serve any number of concurrent spins.

mod symbols;

pub use symbols::{REEL, ReelSymbols, SymbolMapper};

use crate::backend::{BackendSelector, FallbackReason, RemoteResource, SelectorState, SpinJob};
use crate::config::SpinConfig;
use crate::core::{NUM_UNITS, Outcome, Result, UnitId};
use crate::sampling::OutcomeSampler;
use crate::simulation::{Histogram, ProbabilityDistribution, Simulator};
use crate::validation::validate_bias_angle;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Everything produced by one spin. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct SpinResult {
    theta: f64,
    entanglement: bool,
    outcome: Outcome,
    symbols: [String; NUM_UNITS],
    histogram: Histogram,
    distribution: ProbabilityDistribution,
    backend_used: String,
    queue_position: Option<u32>,
    fallback: Option<FallbackReason>,
    remote_counts: Option<Histogram>,
    selector_trail: Vec<SelectorState>,
}

impl SpinResult {
    /// Bias angle the spin ran with.
    pub fn theta(&self) -> f64 {
        self.theta
    }

    pub fn entanglement(&self) -> bool {
        self.entanglement
    }

    /// The headline outcome.
    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    /// Headline bits in unit order.
    pub fn measurements(&self) -> [u8; NUM_UNITS] {
        self.outcome.bits()
    }

    /// One symbol per unit, in unit order.
    pub fn symbols(&self) -> &[String; NUM_UNITS] {
        &self.symbols
    }

    /// Trial counts; the total equals the configured trials.
    pub fn histogram(&self) -> &Histogram {
        &self.histogram
    }

    /// The distribution both the headline and the histogram were drawn from.
    pub fn distribution(&self) -> &ProbabilityDistribution {
        &self.distribution
    }

    pub fn backend_used(&self) -> &str {
        &self.backend_used
    }

    pub fn queue_position(&self) -> Option<u32> {
        self.queue_position
    }

    pub fn fallback(&self) -> Option<&FallbackReason> {
        self.fallback.as_ref()
    }

    /// Counts the remote measured, when it ran the job. Informational only.
    pub fn remote_counts(&self) -> Option<&Histogram> {
        self.remote_counts.as_ref()
    }

    pub fn selector_trail(&self) -> &[SelectorState] {
        &self.selector_trail
    }
}

impl fmt::Display for SpinResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Spin θ={:.4} entanglement={} on {}",
            self.theta, self.entanglement, self.backend_used
        )?;
        writeln!(f, "  Outcome: {} {}", self.outcome, self.symbols.join(" "))?;
        if let Some(reason) = &self.fallback {
            writeln!(f, "  Fallback: {}", reason)?;
        }
        write!(f, "  {}", self.histogram)
    }
}

/// Composes simulation, backend selection, sampling and symbol mapping.
pub struct SpinOrchestrator {
    config: Arc<SpinConfig>,
    simulator: Simulator,
    sampler: OutcomeSampler,
    selector: BackendSelector,
    mapper: Arc<dyn SymbolMapper>,
}

impl fmt::Debug for SpinOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpinOrchestrator")
            .field("config", &self.config)
            .field("sampler", &self.sampler)
            .field("selector", &self.selector)
            .finish_non_exhaustive()
    }
}

impl SpinOrchestrator {
    /// Orchestrator using `remote` when the config carries a credential.
    pub fn new(config: Arc<SpinConfig>, remote: Option<Arc<dyn RemoteResource>>) -> Self {
        Self {
            sampler: OutcomeSampler::new(config.trials),
            selector: BackendSelector::new(Arc::clone(&config), remote),
            simulator: Simulator::new(),
            mapper: Arc::new(ReelSymbols),
            config,
        }
    }

    /// Orchestrator that never leaves the local simulator.
    pub fn local(config: Arc<SpinConfig>) -> Self {
        Self::new(config, None)
    }

    /// Replaces the default [`ReelSymbols`] mapping.
    pub fn with_symbol_mapper(mut self, mapper: Arc<dyn SymbolMapper>) -> Self {
        self.mapper = mapper;
        self
    }

    pub fn config(&self) -> &SpinConfig {
        &self.config
    }

    pub fn selector(&self) -> &BackendSelector {
        &self.selector
    }

    pub fn symbol_mapper(&self) -> &dyn SymbolMapper {
        self.mapper.as_ref()
    }

    /// Runs one spin with a freshly seeded random source.
    ///
    /// # Errors
    /// * `Validation` if `theta` is not a finite angle in [0, π].
    /// * `RemoteUnavailable` / `QueueExceeded` only when fallback is disabled.
    /// * `NumericAnomaly` if the derived probabilities are unusable.
    pub async fn spin(&self, theta: f64, entanglement: bool) -> Result<SpinResult> {
        let mut rng = StdRng::seed_from_u64(rand::random());
        self.spin_with_rng(theta, entanglement, &mut rng).await
    }

    /// Runs one spin drawing every sample from `rng`.
    ///
    /// With a seeded generator and a local backend the result is fully
    /// reproducible.
    pub async fn spin_with_rng<R>(&self, theta: f64, entanglement: bool, rng: &mut R) -> Result<SpinResult>
    where
        R: Rng + Send + ?Sized,
    {
        let theta = validate_bias_angle(theta)?;
        let job = SpinJob::new(theta, entanglement, self.config.trials);
        let distribution = self.simulator.distribution(job.sequence())?;
        debug!(theta, entanglement, %distribution, "distribution derived");

        let selection = self.selector.select(&job).await?;

        let outcome = self.sampler.sample_one(&distribution, rng);
        let histogram = self.sampler.sample_trials(&distribution, rng);
        let symbols = UnitId::ALL.map(|unit| self.mapper.symbol_for_bit(unit, outcome.bit(unit)));

        info!(
            theta,
            entanglement,
            outcome = %outcome.bitstring(),
            backend = %selection.backend_name(),
            fallback = ?selection.fallback(),
            "spin complete"
        );

        Ok(SpinResult {
            theta,
            entanglement,
            outcome,
            symbols,
            histogram,
            distribution,
            backend_used: selection.backend_name().to_string(),
            queue_position: selection.queue_position(),
            fallback: selection.fallback().cloned(),
            remote_counts: selection.remote_counts().cloned(),
            selector_trail: selection.trail().to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{PI, QspinError};

    fn orchestrator() -> SpinOrchestrator {
        SpinOrchestrator::local(Arc::new(SpinConfig::default()))
    }

    #[tokio::test]
    async fn test_certain_spin_is_all_stars() -> Result<()> {
        let result = orchestrator().spin(PI, false).await?;
        assert_eq!(result.outcome().bitstring(), "111");
        assert_eq!(result.measurements(), [1, 1, 1]);
        assert_eq!(result.symbols(), &["⭐", "⭐", "⭐"].map(String::from));
        assert_eq!(result.histogram().count(result.outcome()), 100);
        assert_eq!(result.backend_used(), "local_simulator");
        assert_eq!(result.queue_position(), None);
        Ok(())
    }

    #[tokio::test]
    async fn test_seeded_spins_repeat() -> Result<()> {
        let orch = orchestrator();
        let mut rng_a = StdRng::seed_from_u64(99);
        let mut rng_b = StdRng::seed_from_u64(99);
        let a = orch.spin_with_rng(PI / 2.0, true, &mut rng_a).await?;
        let b = orch.spin_with_rng(PI / 2.0, true, &mut rng_b).await?;
        assert_eq!(a, b);
        Ok(())
    }

    #[tokio::test]
    async fn test_out_of_range_theta_is_rejected() {
        let err = orchestrator().spin(-0.5, false).await.unwrap_err();
        assert!(matches!(err, QspinError::Validation { field: "theta", .. }));
    }

    #[tokio::test]
    async fn test_custom_symbol_mapper() -> Result<()> {
        struct Digits;
        impl SymbolMapper for Digits {
            fn symbol_for_bit(&self, unit: UnitId, bit: u8) -> String {
                format!("{}:{}", unit.0, bit)
            }
            fn symbols(&self) -> Vec<String> {
                Vec::new()
            }
        }
        let orch = orchestrator().with_symbol_mapper(Arc::new(Digits));
        let result = orch.spin(0.0, false).await?;
        assert_eq!(result.symbols(), &["0:0", "1:0", "2:0"].map(String::from));
        Ok(())
    }
}
