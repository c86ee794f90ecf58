// tests/service_tests.rs

use async_trait::async_trait;
use qspin::backend::{JobTicket, SpinJob};
use qspin::{
    BackendDescriptor, FallbackReason, Histogram, QspinError, RemoteResource, SelectorState, SpinConfig,
    SpinOrchestrator, SpinRequest, SpinService,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::VecDeque;
use std::f64::consts::PI;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Remote whose probe and job results are scripted up front.
/// A job with no scripted result stays queued forever.
struct ScriptedRemote {
    pending_jobs: u32,
    probe_error: Option<String>,
    results: Mutex<VecDeque<Result<Histogram, QspinError>>>,
    submitted: Mutex<Vec<String>>,
    cancelled: AtomicUsize,
}

impl ScriptedRemote {
    fn healthy(pending_jobs: u32) -> Self {
        Self {
            pending_jobs,
            probe_error: None,
            results: Mutex::new(VecDeque::new()),
            submitted: Mutex::new(Vec::new()),
            cancelled: AtomicUsize::new(0),
        }
    }

    fn unreachable() -> Self {
        Self { probe_error: Some("connection refused".to_string()), ..Self::healthy(0) }
    }

    fn finishing_with(self, counts: Histogram) -> Self {
        self.results.lock().unwrap().push_back(Ok(counts));
        self
    }
}

#[async_trait]
impl RemoteResource for ScriptedRemote {
    async fn probe(&self) -> Result<BackendDescriptor, QspinError> {
        if let Some(message) = &self.probe_error {
            return Err(QspinError::RemoteUnavailable { message: message.clone() });
        }
        Ok(BackendDescriptor {
            name: "ibm_scripted".to_string(),
            num_qubits: 127,
            operational: true,
            status_message: "active".to_string(),
            pending_jobs: self.pending_jobs,
        })
    }

    async fn submit(&self, target: &BackendDescriptor, job: &SpinJob) -> Result<JobTicket, QspinError> {
        self.submitted.lock().unwrap().push(job.to_qasm());
        Ok(JobTicket { id: "job-1".to_string(), backend: target.name.clone() })
    }

    async fn wait_for_completion(&self, _ticket: &JobTicket) -> Result<Histogram, QspinError> {
        let next = self.results.lock().unwrap().pop_front();
        match next {
            Some(result) => result,
            None => std::future::pending().await,
        }
    }

    async fn cancel(&self, _ticket: &JobTicket) -> Result<(), QspinError> {
        self.cancelled.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn remote_config() -> SpinConfig {
    SpinConfig::new()
        .with_ibm_token("test-token")
        .with_max_queue_wait(Duration::from_secs(300))
}

fn service_with(config: SpinConfig, remote: Arc<ScriptedRemote>) -> SpinService {
    SpinService::with_remote(Arc::new(config), Some(remote))
}

#[tokio::test]
async fn test_local_only_spin_has_no_queue_position() -> Result<(), QspinError> {
    let orchestrator = SpinOrchestrator::local(Arc::new(SpinConfig::default()));
    let result = orchestrator.spin(PI / 2.0, false).await?;

    assert_eq!(result.backend_used(), "local_simulator");
    assert_eq!(result.queue_position(), None);
    assert_eq!(result.histogram().total(), 100);
    assert_eq!(result.selector_trail(), &[SelectorState::Idle, SelectorState::LocalSelected]);
    for (unit, symbol) in result.symbols().iter().enumerate() {
        let expected = if result.measurements()[unit] == 1 { "⭐" } else { "🍒" };
        assert_eq!(symbol, expected);
    }
    Ok(())
}

#[tokio::test]
async fn test_remote_services_request_and_reports_queue() -> Result<(), QspinError> {
    let remote = Arc::new(ScriptedRemote::healthy(3).finishing_with(Histogram::from_counts([0, 0, 0, 0, 0, 100, 0, 0])));
    let service = service_with(remote_config(), remote.clone());

    let response = service
        .spin(SpinRequest { theta: PI, entanglement: true })
        .await
        .map_err(|e| QspinError::InvalidOperation { message: e.error })?;

    assert_eq!(response.backend_used, "ibm_scripted");
    assert_eq!(response.queue_position, Some(3));
    // Local distribution is authoritative for the histogram
    assert_eq!(response.measurements, vec![1, 0, 1]);
    assert_eq!(response.distribution.get("101"), Some(&100));
    assert_eq!(response.symbols, vec!["⭐", "🍒", "⭐"]);

    let submitted = remote.submitted.lock().unwrap();
    assert_eq!(submitted.len(), 1);
    assert!(submitted[0].contains("cx q[0], q[1];"));
    Ok(())
}

#[tokio::test]
async fn test_unreachable_remote_falls_back_to_local() -> Result<(), QspinError> {
    let orchestrator = SpinOrchestrator::new(Arc::new(remote_config()), Some(Arc::new(ScriptedRemote::unreachable())));
    let mut rng = StdRng::seed_from_u64(5);
    let result = orchestrator.spin_with_rng(0.0, false, &mut rng).await?;

    assert_eq!(result.backend_used(), "local_simulator");
    assert_eq!(result.outcome().bitstring(), "000");
    assert!(matches!(result.fallback(), Some(FallbackReason::ConnectFailed(_))));
    Ok(())
}

#[tokio::test]
async fn test_unreachable_remote_without_fallback_surfaces_error() {
    let config = remote_config().with_simulator_fallback(false);
    let service = service_with(config, Arc::new(ScriptedRemote::unreachable()));

    let err = service.spin(SpinRequest::default()).await.unwrap_err();
    assert_eq!(err.kind, "remote_unavailable");
}

#[tokio::test(start_paused = true)]
async fn test_stuck_queue_is_bounded_and_cancelled() -> Result<(), QspinError> {
    let remote = Arc::new(ScriptedRemote::healthy(1));
    let config = remote_config().with_max_queue_wait(Duration::from_secs(5));
    let orchestrator = SpinOrchestrator::new(Arc::new(config), Some(remote.clone()));

    let started = tokio::time::Instant::now();
    let result = orchestrator.spin(PI / 2.0, false).await?;
    let elapsed = started.elapsed();

    assert!(elapsed >= Duration::from_secs(5));
    assert!(elapsed < Duration::from_secs(6));
    assert_eq!(result.backend_used(), "local_simulator");
    assert_eq!(result.fallback(), Some(&FallbackReason::TimedOut { waited: Duration::from_secs(5) }));
    assert!(result.selector_trail().contains(&SelectorState::TimedOutFallback));

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(remote.cancelled.load(Ordering::SeqCst), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_stuck_queue_without_fallback_is_queue_exceeded() {
    let config = remote_config()
        .with_simulator_fallback(false)
        .with_max_queue_wait(Duration::from_secs(5));
    let service = service_with(config, Arc::new(ScriptedRemote::healthy(1)));

    let err = service.spin(SpinRequest::default()).await.unwrap_err();
    assert_eq!(err.kind, "queue_exceeded");
}

#[tokio::test]
async fn test_invalid_theta_is_a_validation_error() {
    let service = SpinService::from_config(SpinConfig::default()).unwrap();
    for theta in [-0.1, PI + 0.1, f64::NAN] {
        let err = service.spin(SpinRequest { theta, entanglement: false }).await.unwrap_err();
        assert_eq!(err.kind, "validation_error");
        assert_eq!(err.field.as_deref(), Some("theta"));
    }
}

#[tokio::test]
async fn test_concurrent_spins_are_independent() -> Result<(), QspinError> {
    let orchestrator = Arc::new(SpinOrchestrator::local(Arc::new(SpinConfig::default())));
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let orchestrator = Arc::clone(&orchestrator);
            tokio::spawn(async move { orchestrator.spin(PI * (i as f64 / 7.0), i % 2 == 0).await })
        })
        .collect();

    for handle in handles {
        let result = handle.await.map_err(|e| QspinError::InvalidOperation { message: e.to_string() })??;
        assert_eq!(result.histogram().total(), 100);
    }
    Ok(())
}

#[tokio::test]
async fn test_info_without_credential() {
    let service = SpinService::from_config(SpinConfig::default()).unwrap();
    let info = service.info().await;

    assert!(!info.ibm_quantum.connected);
    assert_eq!(
        info.ibm_quantum.message.as_deref(),
        Some("No IBM Quantum token configured. Using simulator only.")
    );
    assert_eq!(info.quantum_circuit.units, 3);
    assert!(info.quantum_circuit.diagram.contains("U(2)"));
    assert_eq!(info.symbols.len(), 8);
    assert_eq!(info.configuration.max_queue_wait, 300);
    assert!(info.configuration.use_simulator_fallback);
}

#[tokio::test]
async fn test_info_reports_probed_remote() {
    let service = service_with(remote_config(), Arc::new(ScriptedRemote::healthy(6)));
    let body = serde_json::to_value(service.info().await).unwrap();

    assert_eq!(body["ibm_quantum"]["connected"], true);
    assert_eq!(body["ibm_quantum"]["backend"], "ibm_scripted");
    assert_eq!(body["ibm_quantum"]["pending_jobs"], 6);
    assert!(body["ibm_quantum"]["message"].is_null());
}

#[tokio::test]
async fn test_info_with_unreachable_remote_reports_nulls() {
    let service = service_with(remote_config(), Arc::new(ScriptedRemote::unreachable()));
    let body = serde_json::to_value(service.info().await).unwrap();
    let remote = body["ibm_quantum"].as_object().unwrap();

    assert_eq!(remote["connected"], false);
    for key in ["backend", "num_qubits", "status", "pending_jobs"] {
        assert!(remote.contains_key(key), "{} missing", key);
        assert!(remote[key].is_null(), "{} should be null", key);
    }
    assert!(remote["message"].as_str().unwrap().contains("connection refused"));
}

#[tokio::test]
async fn test_info_without_credential_omits_backend_fields() {
    let service = SpinService::from_config(SpinConfig::default()).unwrap();
    let body = serde_json::to_value(service.info().await).unwrap();
    let remote = body["ibm_quantum"].as_object().unwrap();

    assert_eq!(remote["connected"], false);
    for key in ["backend", "num_qubits", "status", "pending_jobs"] {
        assert!(!remote.contains_key(key), "{} should be omitted", key);
    }
}
