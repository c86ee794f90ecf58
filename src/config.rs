//! Runtime configuration.
//!
//! Settings come from the process environment (see [`SpinConfig::from_env`])
//! or are assembled in code through the `with_*` builders. Either way the
//! result is checked by [`SpinConfig::validate`] before use.

use crate::core::{DEFAULT_TRIALS, QspinError, Result};
use std::fmt;
use std::time::Duration;

pub const ENV_IBM_TOKEN: &str = "IBM_QUANTUM_TOKEN";
pub const ENV_IBM_BACKEND: &str = "IBM_QUANTUM_BACKEND";
pub const ENV_IBM_API_URL: &str = "IBM_QUANTUM_API_URL";
pub const ENV_USE_FALLBACK: &str = "USE_SIMULATOR_FALLBACK";
pub const ENV_MAX_QUEUE_WAIT: &str = "MAX_QUEUE_WAIT";
pub const ENV_MAX_QUEUE_DEPTH: &str = "MAX_QUEUE_DEPTH";
pub const ENV_TRIALS: &str = "SPIN_TRIALS";
pub const ENV_POLL_INTERVAL_MS: &str = "QUEUE_POLL_INTERVAL_MS";

/// Placeholder shipped in sample `.env` files; treated as no token.
const PLACEHOLDER_TOKEN: &str = "your_token_here";

pub const DEFAULT_API_URL: &str = "https://api.quantum.ibm.com";
pub const DEFAULT_MAX_QUEUE_WAIT: Duration = Duration::from_secs(300);
pub const DEFAULT_MAX_QUEUE_DEPTH: u32 = 9;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);

/// Settings for spins and backend selection.
#[derive(Clone, PartialEq)]
pub struct SpinConfig {
    /// API token for the remote resource. `None` keeps every spin local.
    pub ibm_token: Option<String>,
    /// Fixed remote backend name; `None` picks the least busy one.
    pub ibm_backend: Option<String>,
    /// Base URL of the remote runtime API.
    pub ibm_api_url: String,
    /// Fall back to the local simulator when the remote is unusable.
    pub use_simulator_fallback: bool,
    /// Upper bound on the wait for a queued remote job.
    pub max_queue_wait: Duration,
    /// Largest remote queue still worth joining when fallback is enabled.
    pub max_queue_depth: u32,
    /// Trials per spin histogram.
    pub trials: usize,
    /// Delay between remote job status polls.
    pub poll_interval: Duration,
}

impl Default for SpinConfig {
    fn default() -> Self {
        Self {
            ibm_token: None,
            ibm_backend: None,
            ibm_api_url: DEFAULT_API_URL.to_string(),
            use_simulator_fallback: true,
            max_queue_wait: DEFAULT_MAX_QUEUE_WAIT,
            max_queue_depth: DEFAULT_MAX_QUEUE_DEPTH,
            trials: DEFAULT_TRIALS,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

// The token is a credential; keep it out of logs.
impl fmt::Debug for SpinConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpinConfig")
            .field("ibm_token", &self.ibm_token.as_ref().map(|_| "<redacted>"))
            .field("ibm_backend", &self.ibm_backend)
            .field("ibm_api_url", &self.ibm_api_url)
            .field("use_simulator_fallback", &self.use_simulator_fallback)
            .field("max_queue_wait", &self.max_queue_wait)
            .field("max_queue_depth", &self.max_queue_depth)
            .field("trials", &self.trials)
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

impl SpinConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads configuration from the process environment.
    ///
    /// Unset variables keep their defaults. See [`SpinConfig::from_lookup`].
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    ///
    /// * `IBM_QUANTUM_TOKEN`: empty or `your_token_here` counts as unset.
    /// * `USE_SIMULATOR_FALLBACK`: only a case-insensitive `true` enables it.
    /// * `MAX_QUEUE_WAIT`: whole seconds.
    /// * `QUEUE_POLL_INTERVAL_MS`: milliseconds.
    ///
    /// # Errors
    /// `QspinError::Configuration` naming the key of any unparsable or
    /// out-of-range value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let read = |key: &str| lookup(key).map(|v| v.trim().to_string());

        config.ibm_token = read(ENV_IBM_TOKEN).filter(|t| is_real_token(t));
        config.ibm_backend = read(ENV_IBM_BACKEND).filter(|b| !b.is_empty());
        if let Some(url) = read(ENV_IBM_API_URL).filter(|u| !u.is_empty()) {
            config.ibm_api_url = url.trim_end_matches('/').to_string();
        }
        if let Some(flag) = read(ENV_USE_FALLBACK) {
            config.use_simulator_fallback = flag.eq_ignore_ascii_case("true");
        }
        if let Some(raw) = read(ENV_MAX_QUEUE_WAIT) {
            config.max_queue_wait = Duration::from_secs(parse_number(ENV_MAX_QUEUE_WAIT, &raw)?);
        }
        if let Some(raw) = read(ENV_MAX_QUEUE_DEPTH) {
            config.max_queue_depth = parse_number(ENV_MAX_QUEUE_DEPTH, &raw)?;
        }
        if let Some(raw) = read(ENV_TRIALS) {
            config.trials = parse_number(ENV_TRIALS, &raw)?;
        }
        if let Some(raw) = read(ENV_POLL_INTERVAL_MS) {
            config.poll_interval = Duration::from_millis(parse_number(ENV_POLL_INTERVAL_MS, &raw)?);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_ibm_token(mut self, token: impl Into<String>) -> Self {
        self.ibm_token = Some(token.into());
        self
    }

    pub fn with_ibm_backend(mut self, backend: impl Into<String>) -> Self {
        self.ibm_backend = Some(backend.into());
        self
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.ibm_api_url = url.into();
        self
    }

    pub fn with_simulator_fallback(mut self, enabled: bool) -> Self {
        self.use_simulator_fallback = enabled;
        self
    }

    pub fn with_max_queue_wait(mut self, wait: Duration) -> Self {
        self.max_queue_wait = wait;
        self
    }

    pub fn with_max_queue_depth(mut self, depth: u32) -> Self {
        self.max_queue_depth = depth;
        self
    }

    pub fn with_trials(mut self, trials: usize) -> Self {
        self.trials = trials;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// True when a usable remote credential is configured.
    pub fn has_credential(&self) -> bool {
        self.ibm_token.as_deref().is_some_and(is_real_token)
    }

    /// Checks that every bound is usable.
    pub fn validate(&self) -> Result<()> {
        if self.trials == 0 {
            return Err(invalid(ENV_TRIALS, "trials must be at least 1"));
        }
        if self.max_queue_wait.is_zero() {
            return Err(invalid(ENV_MAX_QUEUE_WAIT, "queue wait bound must be positive"));
        }
        if self.poll_interval.is_zero() {
            return Err(invalid(ENV_POLL_INTERVAL_MS, "poll interval must be positive"));
        }
        if self.ibm_api_url.is_empty() {
            return Err(invalid(ENV_IBM_API_URL, "API URL must not be empty"));
        }
        Ok(())
    }
}

fn is_real_token(token: &str) -> bool {
    !token.is_empty() && token != PLACEHOLDER_TOKEN
}

fn parse_number<T>(key: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    raw.parse::<T>()
        .map_err(|e| invalid(key, format!("cannot parse '{}': {}", raw, e)))
}

fn invalid(key: &str, message: impl Into<String>) -> QspinError {
    QspinError::Configuration { key: key.to_string(), message: message.into() }
}
