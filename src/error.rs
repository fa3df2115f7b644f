//! Error types for the Replication Operator
//!
//! Provides structured error types for environment resolution, network
//! discovery, volume sizing, remote submission and asynchronous job tracking.

use thiserror::Error;

/// Unified error type for the operator
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Internal Errors
    // =========================================================================
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    // =========================================================================
    // Resolution Errors
    // =========================================================================
    #[error("Missing reference: {kind} requires an id or a name")]
    MissingReference { kind: String },

    #[error("Ambiguous reference: {matches} {kind} entries are named '{name}'")]
    AmbiguousReference {
        kind: String,
        name: String,
        matches: usize,
    },

    #[error("Environment not found: {reference}")]
    EnvironmentNotFound { reference: String },

    #[error("Volume not found: {volume} in environment {environment}{}", svm_suffix(.svm))]
    VolumeNotFound {
        environment: String,
        volume: String,
        svm: Option<String>,
    },

    #[error("Aggregate not found: {aggregate} in environment {environment}")]
    AggregateNotFound {
        environment: String,
        aggregate: String,
    },

    #[error("No intercluster network path between {source_env} and {destination_env}")]
    NetworkPathNotFound {
        source_env: String,
        destination_env: String,
    },

    // =========================================================================
    // Remote Errors
    // =========================================================================
    #[error("Control plane rejected {operation} (HTTP {status}): {message}")]
    RemoteValidation {
        operation: String,
        status: u16,
        message: String,
    },

    #[error("Control plane failed {operation} (HTTP {status}): {message}")]
    RemoteServer {
        operation: String,
        status: u16,
        message: String,
    },

    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    // =========================================================================
    // Job Errors
    // =========================================================================
    #[error("Job {request_id} for {operation} failed: {reason}")]
    JobFailed {
        operation: String,
        request_id: String,
        reason: String,
    },

    #[error("Job {request_id} for {operation} did not finish after {attempts} attempts")]
    JobTimedOut {
        operation: String,
        request_id: String,
        attempts: u32,
    },

    // =========================================================================
    // Parse Errors
    // =========================================================================
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    // =========================================================================
    // IO Errors
    // =========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for a boundary validation failure on a remote payload
    /// that arrived with HTTP `status`
    pub fn remote_validation(operation: &str, status: u16, message: impl Into<String>) -> Self {
        Error::RemoteValidation {
            operation: operation.to_string(),
            status,
            message: message.into(),
        }
    }

    /// Check if this error is transient
    ///
    /// Nothing in the crate retries on its own; this is a hint for callers.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::Http(_) | Error::RemoteServer { .. } | Error::JobTimedOut { .. }
        )
    }

    /// Check if this error means the addressed entity does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::EnvironmentNotFound { .. }
                | Error::VolumeNotFound { .. }
                | Error::AggregateNotFound { .. }
        )
    }
}

fn svm_suffix(svm: &Option<String>) -> String {
    svm.as_ref().map(|s| format!(" (svm {s})")).unwrap_or_default()
}

/// Result type alias for the operator
pub type Result<T> = std::result::Result<T, Error>;
