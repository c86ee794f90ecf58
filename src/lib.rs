// src/lib.rs

//! `qspin` - A three-reel quantum slot machine
//!
//! Each spin prepares three binary units with an RY(θ) rotation, optionally
//! chains them with controlled flips, and measures. The headline outcome and
//! a histogram of repeated trials are sampled from the exact state-vector
//! distribution; a remote quantum resource can be asked to run the same
//! circuit, with bounded waiting and fallback to the local simulator.

pub mod backend;
pub mod circuits;
pub mod config;
pub mod core;
pub mod operations;
pub mod orchestrator;
pub mod sampling;
pub mod service;
pub mod simulation;
pub mod validation;

// Re-export the most common types for easier top-level use
pub use backend::{BackendDescriptor, BackendSelector, FallbackReason, RemoteResource, SelectorState};
pub use circuits::{GateSequence, SequenceBuilder};
pub use config::SpinConfig;
pub use core::{AmplitudeVector, Outcome, QspinError, Result, UnitId};
pub use operations::Operation;
pub use orchestrator::{ReelSymbols, SpinOrchestrator, SpinResult, SymbolMapper};
pub use sampling::OutcomeSampler;
pub use service::{SpinRequest, SpinResponse, SpinService};
pub use simulation::{GateEngine, Histogram, ProbabilityDistribution, Simulator};
pub use validation::{check_normalization, validate_bias_angle};

// Example 1: Fair reels
// Every unit is rotated by π/2, so all eight outcomes are equally likely.
// A seeded generator makes the sampled histogram reproducible.
/// ```
/// use qspin::{GateSequence, OutcomeSampler, Simulator, QspinError};
/// use rand::SeedableRng;
/// use rand::rngs::StdRng;
/// use std::f64::consts::PI;
///
/// let sequence = GateSequence::for_spin(PI / 2.0, false);
/// let distribution = Simulator::new().distribution(&sequence)?;
/// for (outcome, p) in distribution.iter() {
///     assert!((p - 0.125).abs() < 1e-9, "{} had p = {}", outcome, p);
/// }
///
/// let mut rng = StdRng::seed_from_u64(42);
/// let histogram = OutcomeSampler::new(100).sample_trials(&distribution, &mut rng);
/// assert_eq!(histogram.total(), 100);
/// println!("{}", histogram);
/// # Ok::<(), QspinError>(())
/// ```
#[doc(hidden)]
const _: () = (); // Attaches the preceding doc comment block to a hidden item

// Example 2: A full spin through the service surface
// Without a credential the local simulator services the request and the
// queue position is absent.
/// ```
/// use qspin::{SpinConfig, SpinRequest, SpinService};
///
/// let runtime = tokio::runtime::Builder::new_current_thread()
///     .enable_time()
///     .build()
///     .expect("runtime");
///
/// let service = SpinService::from_config(SpinConfig::default()).expect("valid config");
/// let response = runtime
///     .block_on(service.spin(SpinRequest { theta: 0.0, entanglement: true }))
///     .expect("spin succeeds");
///
/// assert_eq!(response.symbols, vec!["🍒", "🍒", "🍒"]);
/// assert_eq!(response.measurements, vec![0, 0, 0]);
/// assert_eq!(response.backend_used, "local_simulator");
/// assert_eq!(response.queue_position, None);
/// ```
#[doc(hidden)]
const _: () = (); // Attaches the preceding doc comment block to a hidden item
