//! Execution backends.
//!
//! A spin is always computed by the local state-vector simulator. A remote,
//! queue-bound resource may additionally be asked to run the same circuit; the
//! [`BackendSelector`] decides per request which backend is reported as having
//! serviced it, and falls back to the local path when the remote is
//! unreachable or congested.
//!
//! # Architecture
//!
//! The remote side is the [`RemoteResource`] trait, so the selector can be
//! driven by a fake in tests. With the `ibm-runtime` feature,
//! `ibm::IbmRuntimeClient` implements it against a Qiskit-Runtime style REST API.

pub mod selector;

#[cfg(feature = "ibm-runtime")]
pub mod ibm;

pub use selector::{BackendSelector, FallbackReason, Selection, SelectorState};

use crate::circuits::GateSequence;
use crate::core::{NUM_UNITS, Result};
use crate::operations::Operation;
use crate::simulation::Histogram;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Name reported when the local simulator services a request.
pub const LOCAL_BACKEND_NAME: &str = "local_simulator";

/// Identifies the compute resource servicing a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendDescriptor {
    /// Backend name, e.g. `"ibm_brisbane"` or [`LOCAL_BACKEND_NAME`].
    pub name: String,
    /// Number of units (qubits) the backend offers.
    pub num_qubits: u32,
    /// Whether the backend currently accepts jobs.
    pub operational: bool,
    /// Human-readable status reported by the backend.
    pub status_message: String,
    /// Jobs waiting ahead of a new submission.
    pub pending_jobs: u32,
}

impl BackendDescriptor {
    /// The static descriptor of the local simulator.
    pub fn local() -> Self {
        Self {
            name: LOCAL_BACKEND_NAME.to_string(),
            num_qubits: NUM_UNITS as u32,
            operational: true,
            status_message: "active".to_string(),
            pending_jobs: 0,
        }
    }

    pub fn is_local(&self) -> bool {
        self.name == LOCAL_BACKEND_NAME
    }
}

impl fmt::Display for BackendDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} qubits, {}, {} pending)",
            self.name, self.num_qubits, self.status_message, self.pending_jobs
        )
    }
}

/// The circuit and shot count of one spin, as submitted to a remote backend.
#[derive(Debug, Clone, PartialEq)]
pub struct SpinJob {
    pub theta: f64,
    pub entanglement: bool,
    pub shots: usize,
    sequence: GateSequence,
}

impl SpinJob {
    pub fn new(theta: f64, entanglement: bool, shots: usize) -> Self {
        Self {
            theta,
            entanglement,
            shots,
            sequence: GateSequence::for_spin(theta, entanglement),
        }
    }

    pub fn sequence(&self) -> &GateSequence {
        &self.sequence
    }

    /// OpenQASM 3 text of the circuit, measuring every unit into `c`.
    pub fn to_qasm(&self) -> String {
        let mut qasm = String::new();
        qasm.push_str("OPENQASM 3.0;\n");
        qasm.push_str("include \"stdgates.inc\";\n\n");
        qasm.push_str(&format!("qubit[{}] q;\n", NUM_UNITS));
        qasm.push_str(&format!("bit[{}] c;\n\n", NUM_UNITS));
        for op in self.sequence.operations() {
            match op {
                Operation::Rotate { unit, theta } => {
                    qasm.push_str(&format!("ry({}) q[{}];\n", theta, unit.0));
                }
                Operation::ControlledFlip { control, target } => {
                    qasm.push_str(&format!("cx q[{}], q[{}];\n", control.0, target.0));
                }
            }
        }
        for i in 0..NUM_UNITS {
            qasm.push_str(&format!("c[{}] = measure q[{}];\n", i, i));
        }
        qasm
    }
}

/// Handle to a job accepted by a remote backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobTicket {
    pub id: String,
    pub backend: String,
}

/// A remote, queue-bound compute resource.
///
/// Implementations must not block the thread: every method is awaited under
/// the selector's deadline, and a future dropped at the deadline must leave
/// nothing behind except the remote job itself. Per-request state (the chosen
/// backend, the ticket) travels through the arguments, never through `self`.
#[async_trait]
pub trait RemoteResource: Send + Sync {
    /// Queries the backend's name, capacity, status and queue depth.
    async fn probe(&self) -> Result<BackendDescriptor>;

    /// Enqueues a job on `target`, the backend this request looked up, and
    /// returns its ticket without waiting for it to run.
    async fn submit(&self, target: &BackendDescriptor, job: &SpinJob) -> Result<JobTicket>;

    /// Resolves once the job has finished, with its measured counts.
    async fn wait_for_completion(&self, ticket: &JobTicket) -> Result<Histogram>;

    /// Asks the backend to drop a job. Best effort; the default does nothing.
    async fn cancel(&self, _ticket: &JobTicket) -> Result<()> {
        Ok(())
    }
}
