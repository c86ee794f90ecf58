//! IBM Quantum runtime backend.
//!
//! Talks to the Qiskit Runtime REST API:
//!
//! - `GET  /v1/backends` and `GET /v1/backends/{name}` to probe
//! - `POST /v1/jobs` to submit the OpenQASM 3 circuit to the sampler primitive
//! - `GET  /v1/jobs/{id}` polled until the job settles, then `/v1/jobs/{id}/results`
//! - `DELETE /v1/jobs/{id}` to cancel
//!
//! Without a configured backend name the least busy operational,
//! non-simulator backend with enough qubits is used.

use super::{BackendDescriptor, JobTicket, RemoteResource, SpinJob};
use crate::config::SpinConfig;
use crate::core::{NUM_UNITS, Outcome, QspinError, Result, STATE_DIM};
use crate::simulation::Histogram;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Async client for the IBM Quantum runtime.
pub struct IbmRuntimeClient {
    client: reqwest::Client,
    api_url: String,
    token: String,
    backend: Option<String>,
    poll_interval: Duration,
}

impl IbmRuntimeClient {
    /// Builds a client from the configured credential and endpoint.
    ///
    /// # Errors
    /// `Configuration` when no token is set, `RemoteUnavailable` when the HTTP
    /// client cannot be built.
    pub fn from_config(config: &SpinConfig) -> Result<Self> {
        let token = config
            .ibm_token
            .clone()
            .filter(|_| config.has_credential())
            .ok_or_else(|| QspinError::Configuration {
                key: crate::config::ENV_IBM_TOKEN.to_string(),
                message: "no IBM Quantum token configured".to_string(),
            })?;

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| QspinError::remote(format!("HTTP client error: {}", e)))?;

        Ok(Self {
            client,
            api_url: config.ibm_api_url.trim_end_matches('/').to_string(),
            token,
            backend: config.ibm_backend.clone(),
            poll_interval: config.poll_interval,
        })
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.api_url, path);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| QspinError::remote(format!("GET {} failed: {}", path, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(QspinError::remote(format!("GET {} returned {} - {}", path, status, body)));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| QspinError::remote(format!("cannot parse response of {}: {}", path, e)))
    }

    async fn job_status(&self, job_id: &str) -> Result<RuntimeJobStatus> {
        let info: IbmJobInfo = self.get_json(&format!("/v1/jobs/{}", job_id)).await?;
        Ok(RuntimeJobStatus::parse(&info.status))
    }
}

#[async_trait]
impl RemoteResource for IbmRuntimeClient {
    async fn probe(&self) -> Result<BackendDescriptor> {
        let properties = match &self.backend {
            Some(name) => self.get_json::<IbmBackendProperties>(&format!("/v1/backends/{}", name)).await?,
            None => {
                let listing: IbmBackendListing = self.get_json("/v1/backends").await?;
                least_busy(listing.devices)
                    .ok_or_else(|| QspinError::remote("no operational hardware backend with enough qubits"))?
            }
        };

        let descriptor = properties.into_descriptor();
        debug!(backend = %descriptor, "probed IBM backend");
        Ok(descriptor)
    }

    async fn submit(&self, target: &BackendDescriptor, job: &SpinJob) -> Result<JobTicket> {
        let request = IbmJobRequest::sampler(target, job);
        let backend = request.backend.clone();

        let response = self
            .client
            .post(format!("{}/v1/jobs", self.api_url))
            .bearer_auth(&self.token)
            .json(&request)
            .send()
            .await
            .map_err(|e| QspinError::remote(format!("job submission failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(QspinError::remote(format!("job submission returned {} - {}", status, body)));
        }

        let accepted: IbmJobResponse = response
            .json()
            .await
            .map_err(|e| QspinError::remote(format!("cannot parse job response: {}", e)))?;
        info!(backend = %backend, job_id = %accepted.id, "submitted job to IBM Quantum");
        Ok(JobTicket { id: accepted.id, backend })
    }

    async fn wait_for_completion(&self, ticket: &JobTicket) -> Result<Histogram> {
        loop {
            match self.job_status(&ticket.id).await? {
                RuntimeJobStatus::Completed => break,
                RuntimeJobStatus::Failed(status) => {
                    return Err(QspinError::remote(format!("job {} ended with status {}", ticket.id, status)));
                }
                RuntimeJobStatus::Pending(status) => {
                    debug!(job_id = %ticket.id, status = %status, "job still pending");
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        }

        let results: IbmResults = self.get_json(&format!("/v1/jobs/{}/results", ticket.id)).await?;
        counts_from_quasi_dists(&results)
    }

    async fn cancel(&self, ticket: &JobTicket) -> Result<()> {
        let response = self
            .client
            .delete(format!("{}/v1/jobs/{}", self.api_url, ticket.id))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| QspinError::remote(format!("cancel request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(QspinError::remote(format!(
                "failed to cancel job {}: {}",
                ticket.id,
                response.status()
            )));
        }
        Ok(())
    }
}

/// Runtime job state, collapsed to what polling needs.
#[derive(Debug, Clone, PartialEq, Eq)]
enum RuntimeJobStatus {
    Pending(String),
    Completed,
    Failed(String),
}

impl RuntimeJobStatus {
    fn parse(status: &str) -> Self {
        match status.to_ascii_uppercase().as_str() {
            "QUEUED" | "VALIDATING" | "RUNNING" | "INITIALIZING" => Self::Pending(status.to_string()),
            "COMPLETED" | "DONE" => Self::Completed,
            // FAILED, ERROR, CANCELLED and anything unknown
            _ => Self::Failed(status.to_string()),
        }
    }
}

/// Operational, non-simulator backend with enough qubits and the fewest pending jobs.
fn least_busy(devices: Vec<IbmBackendProperties>) -> Option<IbmBackendProperties> {
    devices
        .into_iter()
        .filter(|d| d.operational && !d.simulator && d.num_qubits as usize >= NUM_UNITS)
        .min_by_key(|d| d.pending_jobs)
}

/// Converts the sampler's quasi-distributions into counts.
///
/// Keys are classical register values (decimal, `0x` hex or a binary string)
/// with `c[0]` as the least significant bit; unit 0 is the most significant
/// bit of an [`Outcome`], so the register value is bit-reversed.
fn counts_from_quasi_dists(results: &IbmResults) -> Result<Histogram> {
    let mut counts = [0u32; STATE_DIM];
    let shots = results.metadata.as_ref().and_then(|m| m.shots).unwrap_or(1);
    for dist in results.quasi_dists.iter().flatten() {
        for (key, quasi) in dist {
            let register = parse_register(key)
                .ok_or_else(|| QspinError::remote(format!("unrecognised result key '{}'", key)))?;
            let outcome = outcome_from_register(register)?;
            counts[outcome.index()] += (quasi.max(0.0) * shots as f64).round() as u32;
        }
    }
    if counts.iter().all(|&c| c == 0) {
        return Err(QspinError::remote("no measurement counts found in results"));
    }
    Ok(Histogram::from_counts(counts))
}

fn parse_register(key: &str) -> Option<usize> {
    if let Some(hex) = key.strip_prefix("0x") {
        usize::from_str_radix(hex, 16).ok()
    } else if key.len() == NUM_UNITS && key.chars().all(|c| c == '0' || c == '1') {
        usize::from_str_radix(key, 2).ok()
    } else {
        key.parse().ok()
    }
}

fn outcome_from_register(register: usize) -> Result<Outcome> {
    if register >= STATE_DIM {
        return Err(QspinError::remote(format!(
            "register value {} does not fit {} measured bits",
            register, NUM_UNITS
        )));
    }
    let index = (0..NUM_UNITS).fold(0, |acc, bit| acc | (((register >> bit) & 1) << (NUM_UNITS - 1 - bit)));
    Outcome::new(index)
}

#[derive(Debug, Deserialize)]
struct IbmBackendListing {
    #[serde(default)]
    devices: Vec<IbmBackendProperties>,
}

#[derive(Debug, Clone, Deserialize)]
struct IbmBackendProperties {
    #[serde(rename = "backend_name")]
    name: String,
    num_qubits: u32,
    #[serde(default)]
    simulator: bool,
    #[serde(default = "default_true")]
    operational: bool,
    #[serde(default = "default_status")]
    status_msg: String,
    #[serde(default)]
    pending_jobs: u32,
}

impl IbmBackendProperties {
    fn into_descriptor(self) -> BackendDescriptor {
        BackendDescriptor {
            name: self.name,
            num_qubits: self.num_qubits,
            operational: self.operational,
            status_message: self.status_msg,
            pending_jobs: self.pending_jobs,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_status() -> String {
    "active".to_string()
}

#[derive(Debug, Serialize)]
struct IbmJobRequest {
    program_id: String,
    backend: String,
    params: IbmJobParams,
}

impl IbmJobRequest {
    /// Sampler job running `job` on the backend this request looked up.
    fn sampler(target: &BackendDescriptor, job: &SpinJob) -> Self {
        Self {
            program_id: "sampler".to_string(),
            backend: target.name.clone(),
            params: IbmJobParams {
                pubs: vec![IbmPub { circuit: job.to_qasm(), shots: job.shots }],
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct IbmJobParams {
    pubs: Vec<IbmPub>,
}

#[derive(Debug, Serialize)]
struct IbmPub {
    circuit: String,
    shots: usize,
}

#[derive(Debug, Deserialize)]
struct IbmJobResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct IbmJobInfo {
    status: String,
}

#[derive(Debug, Deserialize)]
struct IbmResults {
    #[serde(default)]
    quasi_dists: Option<Vec<HashMap<String, f64>>>,
    #[serde(default)]
    metadata: Option<IbmResultMetadata>,
}

#[derive(Debug, Deserialize)]
struct IbmResultMetadata {
    #[serde(default)]
    shots: Option<usize>,
}
