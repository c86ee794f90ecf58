//! Request/response surface of the spin service.
//!
//! [`SpinService`] exposes the three operations a front end calls: a liveness
//! [`status`](SpinService::status), [`spin`](SpinService::spin) and a
//! descriptive [`info`](SpinService::info). Every body is a serde type, so any
//! transport can carry them as JSON.

use crate::backend::{BackendDescriptor, RemoteResource};
use crate::config::SpinConfig;
use crate::core::{NUM_UNITS, PI, QspinError, Result};
use crate::circuits::GateSequence;
use crate::orchestrator::{SpinOrchestrator, SpinResult};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

pub const SERVICE_NAME: &str = "Quantum Slot Machine API";
pub const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

fn default_theta() -> f64 {
    PI / 2.0
}

/// Body of a spin request. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpinRequest {
    /// Bias angle in [0, π]; defaults to π/2 (fair reels).
    #[serde(default = "default_theta")]
    pub theta: f64,
    #[serde(default)]
    pub entanglement: bool,
}

impl Default for SpinRequest {
    fn default() -> Self {
        Self { theta: default_theta(), entanglement: false }
    }
}

/// Body returned for a successful spin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpinResponse {
    pub symbols: Vec<String>,
    pub measurements: Vec<u8>,
    /// Bitstring counts over all trials; outcomes never drawn are omitted.
    pub distribution: BTreeMap<String, u32>,
    pub backend_used: String,
    /// Queue depth at enqueue time, `null` when the local simulator ran.
    pub queue_position: Option<u32>,
}

impl From<&SpinResult> for SpinResponse {
    fn from(result: &SpinResult) -> Self {
        Self {
            symbols: result.symbols().to_vec(),
            measurements: result.measurements().to_vec(),
            distribution: result.histogram().to_counts_map(),
            backend_used: result.backend_used().to_string(),
            queue_position: result.queue_position(),
        }
    }
}

/// Body returned for a failed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl From<&QspinError> for ErrorResponse {
    fn from(err: &QspinError) -> Self {
        let field = match err {
            QspinError::Validation { field, .. } => Some(field.to_string()),
            QspinError::Configuration { key, .. } => Some(key.clone()),
            _ => None,
        };
        Self { error: err.to_string(), kind: err.kind().to_string(), field }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    pub message: String,
    pub version: String,
}

/// What the remote resource reported when probed.
///
/// With a credential configured every field is serialized, `null` included,
/// so a failed connection still shows the backend fields. Without one only
/// `connected` and `message` are written.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteStatus {
    pub connected: bool,
    pub backend: Option<String>,
    pub num_qubits: Option<u32>,
    pub status: Option<String>,
    pub pending_jobs: Option<u32>,
    pub message: Option<String>,
    #[serde(skip)]
    configured: bool,
}

impl RemoteStatus {
    fn not_configured() -> Self {
        Self {
            configured: false,
            ..Self::unreachable("No IBM Quantum token configured. Using simulator only.")
        }
    }

    fn unreachable(message: impl Into<String>) -> Self {
        Self {
            connected: false,
            backend: None,
            num_qubits: None,
            status: None,
            pending_jobs: None,
            message: Some(message.into()),
            configured: true,
        }
    }

    fn connected(descriptor: BackendDescriptor) -> Self {
        Self {
            connected: true,
            backend: Some(descriptor.name),
            num_qubits: Some(descriptor.num_qubits),
            status: Some(descriptor.status_message),
            pending_jobs: Some(descriptor.pending_jobs),
            message: None,
            configured: true,
        }
    }
}

impl Serialize for RemoteStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("RemoteStatus", 6)?;
        state.serialize_field("connected", &self.connected)?;
        if self.configured {
            state.serialize_field("backend", &self.backend)?;
            state.serialize_field("num_qubits", &self.num_qubits)?;
            state.serialize_field("status", &self.status)?;
            state.serialize_field("pending_jobs", &self.pending_jobs)?;
        } else {
            state.skip_field("backend")?;
            state.skip_field("num_qubits")?;
            state.skip_field("status")?;
            state.skip_field("pending_jobs")?;
        }
        state.serialize_field("message", &self.message)?;
        state.end()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitInfo {
    pub units: usize,
    pub gates: String,
    pub measurement: String,
    pub entanglement: String,
    /// ASCII rendering of the entangled sequence at θ = π/2.
    pub diagram: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigurationInfo {
    pub use_simulator_fallback: bool,
    /// Seconds.
    pub max_queue_wait: u64,
    pub max_queue_depth: u32,
    pub trials: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfoResponse {
    pub ibm_quantum: RemoteStatus,
    pub quantum_circuit: CircuitInfo,
    pub randomness_source: String,
    pub symbols: Vec<String>,
    pub configuration: ConfigurationInfo,
}

/// Serves spin, status and info requests over one shared orchestrator.
#[derive(Debug, Clone)]
pub struct SpinService {
    orchestrator: Arc<SpinOrchestrator>,
}

impl SpinService {
    pub fn new(orchestrator: Arc<SpinOrchestrator>) -> Self {
        Self { orchestrator }
    }

    /// Service wired from configuration alone.
    ///
    /// With the `ibm-runtime` feature and a credential, spins go through
    /// the IBM Quantum runtime; a client that cannot be built is logged and
    /// the service runs local-only.
    pub fn from_config(config: SpinConfig) -> Result<Self> {
        config.validate()?;
        let config = Arc::new(config);
        let remote = default_remote(&config);
        Ok(Self::with_remote(config, remote))
    }

    pub fn with_remote(config: Arc<SpinConfig>, remote: Option<Arc<dyn RemoteResource>>) -> Self {
        Self::new(Arc::new(SpinOrchestrator::new(config, remote)))
    }

    pub fn orchestrator(&self) -> &SpinOrchestrator {
        &self.orchestrator
    }

    pub fn status(&self) -> StatusResponse {
        StatusResponse {
            status: "online".to_string(),
            message: SERVICE_NAME.to_string(),
            version: SERVICE_VERSION.to_string(),
        }
    }

    /// Runs one spin, mapping any failure to an [`ErrorResponse`].
    pub async fn spin(&self, request: SpinRequest) -> std::result::Result<SpinResponse, ErrorResponse> {
        match self.orchestrator.spin(request.theta, request.entanglement).await {
            Ok(result) => Ok(SpinResponse::from(&result)),
            Err(e) => {
                warn!(error = %e, kind = e.kind(), "spin request failed");
                Err(ErrorResponse::from(&e))
            }
        }
    }

    /// Describes the circuit, symbols, configuration and remote connectivity.
    pub async fn info(&self) -> InfoResponse {
        let config = self.orchestrator.config();
        let ibm_quantum = match self.orchestrator.selector().probe_remote().await {
            None => RemoteStatus::not_configured(),
            Some(Ok(descriptor)) => RemoteStatus::connected(descriptor),
            Some(Err(e)) => RemoteStatus::unreachable(e.to_string()),
        };

        InfoResponse {
            ibm_quantum,
            quantum_circuit: CircuitInfo {
                units: NUM_UNITS,
                gates: "RY(θ) rotation on each unit".to_string(),
                measurement: "Computational basis, one bit per unit".to_string(),
                entanglement: "Optional controlled flips U(0)→U(1), U(1)→U(2)".to_string(),
                diagram: GateSequence::for_spin(default_theta(), true).to_string(),
            },
            randomness_source: if config.has_credential() {
                "IBM Quantum hardware when available, local state-vector simulation otherwise".to_string()
            } else {
                "Local state-vector simulation".to_string()
            },
            symbols: self.orchestrator.symbol_mapper().symbols(),
            configuration: ConfigurationInfo {
                use_simulator_fallback: config.use_simulator_fallback,
                max_queue_wait: config.max_queue_wait.as_secs(),
                max_queue_depth: config.max_queue_depth,
                trials: config.trials,
            },
        }
    }
}

#[cfg(feature = "ibm-runtime")]
fn default_remote(config: &SpinConfig) -> Option<Arc<dyn RemoteResource>> {
    use crate::backend::ibm::IbmRuntimeClient;

    if !config.has_credential() {
        return None;
    }
    match IbmRuntimeClient::from_config(config) {
        Ok(client) => {
            info!(api_url = %config.ibm_api_url, "IBM Quantum runtime client configured");
            Some(Arc::new(client))
        }
        Err(e) => {
            warn!(error = %e, "failed to set up IBM Quantum client, using simulator only");
            None
        }
    }
}

#[cfg(not(feature = "ibm-runtime"))]
fn default_remote(config: &SpinConfig) -> Option<Arc<dyn RemoteResource>> {
    if config.has_credential() {
        warn!("IBM Quantum token set but the ibm-runtime feature is disabled, using simulator only");
    } else {
        info!("no IBM Quantum token configured, using simulator only");
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults() {
        let req: SpinRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req, SpinRequest::default());
        assert!((req.theta - PI / 2.0).abs() < 1e-12);
        assert!(!req.entanglement);
    }

    #[test]
    fn test_error_response_names_field() {
        let err = QspinError::Validation { field: "theta", message: "4 is outside [0, π]".to_string() };
        let body = serde_json::to_value(ErrorResponse::from(&err)).unwrap();
        assert_eq!(body["kind"], "validation_error");
        assert_eq!(body["field"], "theta");

        let body = serde_json::to_value(ErrorResponse::from(&QspinError::remote("down"))).unwrap();
        assert!(body.get("field").is_none());
    }

    #[test]
    fn test_remote_status_nulls_follow_credential() {
        let failed = serde_json::to_value(RemoteStatus::unreachable("timed out")).unwrap();
        assert!(failed["backend"].is_null());
        assert!(failed["pending_jobs"].is_null());
        assert_eq!(failed.as_object().unwrap().len(), 6);

        let absent = serde_json::to_value(RemoteStatus::not_configured()).unwrap();
        assert!(absent.get("backend").is_none());
        assert!(absent.get("num_qubits").is_none());
        assert_eq!(absent["connected"], false);

        let up = serde_json::to_value(RemoteStatus::connected(BackendDescriptor::local())).unwrap();
        assert_eq!(up["num_qubits"], 3);
        assert!(up["message"].is_null());
    }

    #[test]
    fn test_status_is_online() {
        let service = SpinService::from_config(SpinConfig::default()).unwrap();
        let status = service.status();
        assert_eq!(status.status, "online");
        assert_eq!(status.message, SERVICE_NAME);
    }

    #[tokio::test]
    async fn test_local_spin_serializes_null_queue_position() {
        let service = SpinService::from_config(SpinConfig::default()).unwrap();
        let response = service.spin(SpinRequest { theta: 0.0, entanglement: false }).await.unwrap();
        let body = serde_json::to_value(&response).unwrap();
        assert!(body["queue_position"].is_null());
        assert_eq!(body["backend_used"], "local_simulator");
        assert_eq!(body["distribution"]["000"], 100);
        assert_eq!(body["symbols"], serde_json::json!(["🍒", "🍒", "🍒"]));
    }
}
