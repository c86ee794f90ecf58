// src/backend/selector.rs

//! Per-request choice between the remote resource and the local simulator.
//!
//! Each request walks a small state machine:
//!
//! ```text
//! Idle ──(no credential)──────────────────────────────► LocalSelected
//! Idle ──► Probing ──(unreachable / unusable)──► ConnectFailed ──(fallback)──► LocalSelected
//!          Probing ──(submission unanswered)───► ConnectFailed
//!          Probing ──(queue too deep, fallback)───────────────────────────────► LocalSelected
//!          Probing ──► Queued ──(done in time)──► Executing
//!                      Queued ──(job failed)──► ConnectFailed ──(fallback)──► LocalSelected
//!                      Queued ──(wait bound hit)──► TimedOutFallback ──► LocalSelected
//! ```
//!
//! With fallback disabled, `ConnectFailed` surfaces `RemoteUnavailable` and an
//! elapsed wait surfaces `QueueExceeded` instead of moving to `LocalSelected`.
//! `TimedOutFallback` only follows `Queued`: a job that was never accepted
//! is a connection failure, whatever the clock says.
//! Every await on the remote runs under the configured wait bound, so a
//! request never blocks longer than `max_queue_wait`.

use super::{BackendDescriptor, JobTicket, RemoteResource, SpinJob};
use crate::config::SpinConfig;
use crate::core::{NUM_UNITS, QspinError, Result};
use crate::simulation::Histogram;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, info, warn};

/// States a single selection passes through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorState {
    Idle,
    Probing,
    ConnectFailed { reason: String },
    /// Job accepted; `position` is the queue depth observed at enqueue time.
    Queued { position: u32 },
    Executing,
    TimedOutFallback,
    LocalSelected,
}

impl SelectorState {
    /// True for the states a selection can end in.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SelectorState::Executing | SelectorState::LocalSelected)
    }
}

impl fmt::Display for SelectorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectorState::Idle => write!(f, "Idle"),
            SelectorState::Probing => write!(f, "Probing"),
            SelectorState::ConnectFailed { reason } => write!(f, "ConnectFailed({})", reason),
            SelectorState::Queued { position } => write!(f, "Queued({})", position),
            SelectorState::Executing => write!(f, "Executing"),
            SelectorState::TimedOutFallback => write!(f, "TimedOutFallback"),
            SelectorState::LocalSelected => write!(f, "LocalSelected"),
        }
    }
}

/// Why a request with a configured remote ended up on the local simulator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    /// Probe, submission or job failed.
    ConnectFailed(String),
    /// More jobs were pending than `max_queue_depth` allows.
    QueueTooDeep { pending: u32, limit: u32 },
    /// The job was still queued when the wait bound elapsed.
    TimedOut { waited: Duration },
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackReason::ConnectFailed(reason) => write!(f, "remote unavailable: {}", reason),
            FallbackReason::QueueTooDeep { pending, limit } => {
                write!(f, "{} jobs pending (limit {})", pending, limit)
            }
            FallbackReason::TimedOut { waited } => {
                write!(f, "queue wait exceeded {}s", waited.as_secs())
            }
        }
    }
}

/// Outcome of backend selection for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    descriptor: BackendDescriptor,
    queue_position: Option<u32>,
    remote_counts: Option<Histogram>,
    fallback: Option<FallbackReason>,
    trail: Vec<SelectorState>,
}

impl Selection {
    fn local(trail: Vec<SelectorState>, fallback: Option<FallbackReason>) -> Self {
        Self {
            descriptor: BackendDescriptor::local(),
            queue_position: None,
            remote_counts: None,
            fallback,
            trail,
        }
    }

    /// The backend reported as having serviced the request.
    pub fn descriptor(&self) -> &BackendDescriptor {
        &self.descriptor
    }

    pub fn backend_name(&self) -> &str {
        &self.descriptor.name
    }

    /// Queue depth at enqueue time; `None` unless the remote serviced the request.
    pub fn queue_position(&self) -> Option<u32> {
        self.queue_position
    }

    /// Counts measured by the remote, when it ran the job.
    pub fn remote_counts(&self) -> Option<&Histogram> {
        self.remote_counts.as_ref()
    }

    pub fn fallback(&self) -> Option<&FallbackReason> {
        self.fallback.as_ref()
    }

    pub fn is_remote(&self) -> bool {
        !self.descriptor.is_local()
    }

    /// Every state visited, from `Idle` to the terminal state.
    pub fn trail(&self) -> &[SelectorState] {
        &self.trail
    }

    pub fn final_state(&self) -> Option<&SelectorState> {
        self.trail.last()
    }
}

/// Chooses the backend for each spin request.
#[derive(Clone)]
pub struct BackendSelector {
    config: Arc<SpinConfig>,
    remote: Option<Arc<dyn RemoteResource>>,
}

impl fmt::Debug for BackendSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendSelector")
            .field("config", &self.config)
            .field("remote", &self.remote.as_ref().map(|_| "<dyn RemoteResource>"))
            .finish()
    }
}

impl BackendSelector {
    pub fn new(config: Arc<SpinConfig>, remote: Option<Arc<dyn RemoteResource>>) -> Self {
        Self { config, remote }
    }

    /// A selector that always picks the local simulator.
    pub fn local_only(config: Arc<SpinConfig>) -> Self {
        Self::new(config, None)
    }

    pub fn config(&self) -> &SpinConfig {
        &self.config
    }

    /// True when requests will try the remote before the local simulator.
    pub fn remote_enabled(&self) -> bool {
        self.config.has_credential() && self.remote.is_some()
    }

    /// Probes the remote under the wait bound, for status reporting.
    ///
    /// Returns `None` when no remote is configured.
    pub async fn probe_remote(&self) -> Option<Result<BackendDescriptor>> {
        let remote = self.active_remote()?;
        let deadline = Instant::now() + self.config.max_queue_wait;
        Some(self.bounded_probe(remote, deadline).await)
    }

    /// Runs the selection state machine for one request.
    ///
    /// # Errors
    /// Only with fallback disabled: `RemoteUnavailable` when the remote
    /// cannot be used, `QueueExceeded` when the wait bound elapses.
    pub async fn select(&self, job: &SpinJob) -> Result<Selection> {
        let mut trail = vec![SelectorState::Idle];

        let Some(remote) = self.active_remote() else {
            debug!("no remote credential configured, using local simulator");
            trail.push(SelectorState::LocalSelected);
            return Ok(Selection::local(trail, None));
        };

        let deadline = Instant::now() + self.config.max_queue_wait;

        trail.push(SelectorState::Probing);
        let descriptor = match self.bounded_probe(remote, deadline).await {
            Ok(descriptor) => descriptor,
            Err(e) => return self.connect_failed(trail, e),
        };
        debug!(backend = %descriptor, "remote probe succeeded");

        let pending = descriptor.pending_jobs;
        if pending > self.config.max_queue_depth && self.config.use_simulator_fallback {
            info!(
                backend = %descriptor.name,
                pending,
                limit = self.config.max_queue_depth,
                "remote queue too deep, using local simulator"
            );
            trail.push(SelectorState::LocalSelected);
            let reason = FallbackReason::QueueTooDeep { pending, limit: self.config.max_queue_depth };
            return Ok(Selection::local(trail, Some(reason)));
        }

        let ticket = match timeout_at(deadline, remote.submit(&descriptor, job)).await {
            Ok(Ok(ticket)) => ticket,
            Ok(Err(e)) => return self.connect_failed(trail, e),
            Err(_) => {
                let error = QspinError::remote(format!(
                    "submission to '{}' did not complete within the queue wait bound",
                    descriptor.name
                ));
                return self.connect_failed(trail, error);
            }
        };
        trail.push(SelectorState::Queued { position: pending });
        info!(backend = %descriptor.name, job_id = %ticket.id, position = pending, "job queued on remote");

        match timeout_at(deadline, remote.wait_for_completion(&ticket)).await {
            Ok(Ok(counts)) => {
                trail.push(SelectorState::Executing);
                info!(backend = %descriptor.name, job_id = %ticket.id, shots = counts.total(), "remote job completed");
                Ok(Selection {
                    descriptor,
                    queue_position: Some(pending),
                    remote_counts: Some(counts),
                    fallback: None,
                    trail,
                })
            }
            Ok(Err(e)) => self.connect_failed(trail, e),
            Err(_) => {
                let backend = descriptor.name.clone();
                self.timed_out(trail, &backend, ticket)
            }
        }
    }

    fn active_remote(&self) -> Option<&Arc<dyn RemoteResource>> {
        self.remote.as_ref().filter(|_| self.config.has_credential())
    }

    async fn bounded_probe(&self, remote: &Arc<dyn RemoteResource>, deadline: Instant) -> Result<BackendDescriptor> {
        let descriptor = timeout_at(deadline, remote.probe())
            .await
            .map_err(|_| QspinError::remote("probe did not answer within the queue wait bound"))??;
        if !descriptor.operational {
            return Err(QspinError::remote(format!(
                "backend '{}' is not operational: {}",
                descriptor.name, descriptor.status_message
            )));
        }
        if (descriptor.num_qubits as usize) < NUM_UNITS {
            return Err(QspinError::remote(format!(
                "backend '{}' has {} qubits, {} required",
                descriptor.name, descriptor.num_qubits, NUM_UNITS
            )));
        }
        Ok(descriptor)
    }

    fn connect_failed(&self, mut trail: Vec<SelectorState>, error: QspinError) -> Result<Selection> {
        let reason = error.to_string();
        trail.push(SelectorState::ConnectFailed { reason: reason.clone() });
        if !self.config.use_simulator_fallback {
            warn!(error = %reason, "remote unavailable and fallback disabled");
            return Err(match error {
                e @ QspinError::RemoteUnavailable { .. } => e,
                other => QspinError::remote(other.to_string()),
            });
        }
        warn!(error = %reason, "remote unavailable, falling back to local simulator");
        trail.push(SelectorState::LocalSelected);
        Ok(Selection::local(trail, Some(FallbackReason::ConnectFailed(reason))))
    }

    fn timed_out(&self, mut trail: Vec<SelectorState>, backend: &str, ticket: JobTicket) -> Result<Selection> {
        let waited = self.config.max_queue_wait;
        if let Some(remote) = self.remote.as_ref() {
            abandon(Arc::clone(remote), ticket);
        }
        if !self.config.use_simulator_fallback {
            warn!(backend, waited_secs = waited.as_secs(), "queue wait exceeded and fallback disabled");
            return Err(QspinError::QueueExceeded { backend: backend.to_string(), waited });
        }
        warn!(backend, waited_secs = waited.as_secs(), "queue wait exceeded, falling back to local simulator");
        trail.push(SelectorState::TimedOutFallback);
        trail.push(SelectorState::LocalSelected);
        Ok(Selection::local(trail, Some(FallbackReason::TimedOut { waited })))
    }
}

/// Cancels an abandoned job in the background; failures are only logged.
fn abandon(remote: Arc<dyn RemoteResource>, ticket: JobTicket) {
    tokio::spawn(async move {
        match remote.cancel(&ticket).await {
            Ok(()) => debug!(job_id = %ticket.id, "abandoned remote job cancelled"),
            Err(e) => warn!(job_id = %ticket.id, error = %e, "failed to cancel abandoned remote job"),
        }
    });
}
