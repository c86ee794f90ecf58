//! Error handling logic

use std::time::Duration;
use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, QspinError>;

/// Failures a single spin request can run into.
///
/// None of these are fatal to the process: each one is scoped to the request
/// that produced it. `RemoteUnavailable` and `QueueExceeded` are normally
/// absorbed by falling back to local simulation, and only reach the caller when
/// fallback is disabled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QspinError {
    /// Request input rejected before any computation (e.g. bias angle outside [0, π]).
    #[error("Validation Error ({field}): {message}")]
    Validation {
        /// Name of the offending request field
        field: &'static str,
        /// Validation failure message
        message: String,
    },

    /// The remote resource could not be reached, rejected the credential,
    /// or failed the job.
    #[error("Remote Unavailable: {message}")]
    RemoteUnavailable {
        /// RemoteUnavailable failure message
        message: String,
    },

    /// The bounded queue wait elapsed before the remote job completed.
    #[error("Queue Exceeded: job on '{backend}' still pending after {}s", waited.as_secs())]
    QueueExceeded {
        /// Remote backend the job was queued on
        backend: String,
        /// How long the request waited before giving up
        waited: Duration,
    },

    /// Derived probabilities could not be brought back to a valid distribution.
    #[error("Numeric Anomaly: {message}")]
    NumericAnomaly {
        /// NumericAnomaly failure message
        message: String,
    },

    /// A gate was applied to a unit outside the register, or with control == target.
    #[error("Invalid Operation: {message}")]
    InvalidOperation {
        /// InvalidOperation failure message
        message: String,
    },

    /// A configuration value could not be parsed or is out of range.
    #[error("Configuration Error ({key}): {message}")]
    Configuration {
        /// Configuration key (environment variable name)
        key: String,
        /// Configuration failure message
        message: String,
    },
}

impl QspinError {
    /// Stable snake_case tag for the error class, suitable for response bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            QspinError::Validation { .. } => "validation_error",
            QspinError::RemoteUnavailable { .. } => "remote_unavailable",
            QspinError::QueueExceeded { .. } => "queue_exceeded",
            QspinError::NumericAnomaly { .. } => "numeric_anomaly",
            QspinError::InvalidOperation { .. } => "invalid_operation",
            QspinError::Configuration { .. } => "configuration_error",
        }
    }

    /// True for the remote-path conditions a fallback can absorb.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, QspinError::RemoteUnavailable { .. } | QspinError::QueueExceeded { .. })
    }

    pub(crate) fn remote(message: impl Into<String>) -> Self {
        QspinError::RemoteUnavailable { message: message.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_are_distinguishable() {
        let unavailable = QspinError::remote("probe refused");
        let exceeded = QspinError::QueueExceeded {
            backend: "ibm_test".to_string(),
            waited: Duration::from_secs(300),
        };
        assert_ne!(unavailable.kind(), exceeded.kind());
        assert!(unavailable.is_recoverable());
        assert!(exceeded.is_recoverable());
    }

    #[test]
    fn test_display_names_field_and_wait() {
        let err = QspinError::Validation { field: "theta", message: "4.0 is outside [0, π]".to_string() };
        assert_eq!(err.to_string(), "Validation Error (theta): 4.0 is outside [0, π]");
        assert!(!err.is_recoverable());

        let err = QspinError::QueueExceeded { backend: "ibm_kyiv".to_string(), waited: Duration::from_secs(12) };
        assert_eq!(err.to_string(), "Queue Exceeded: job on 'ibm_kyiv' still pending after 12s");
    }
}
