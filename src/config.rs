//! Operator configuration
//!
//! Client connection settings and workflow tunables. Both load from YAML and
//! fall back to defaults for every omitted field.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

// =============================================================================
// Client Configuration
// =============================================================================

/// Configuration for the control-plane HTTP client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientConfig {
    /// Connector API base URL
    pub connector_url: String,
    /// Hosted services API base URL
    pub services_url: String,
    /// OAuth token endpoint
    pub auth_url: String,
    /// OAuth client id
    pub client_id: String,
    /// Long-lived refresh token (should come from a secret store)
    pub refresh_token: String,
    /// Connector agent id sent with every call
    pub agent_id: Option<String>,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connector_url: "https://cloudmanager.cloud.netapp.com".to_string(),
            services_url: "https://api.services.cloud.netapp.com".to_string(),
            auth_url: "https://netapp-cloud-account.auth0.com/oauth/token".to_string(),
            client_id: String::new(),
            refresh_token: String::new(),
            agent_id: None,
            timeout_secs: 60,
        }
    }
}

impl ClientConfig {
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("connectorUrl", &self.connector_url),
            ("servicesUrl", &self.services_url),
            ("authUrl", &self.auth_url),
            ("clientId", &self.client_id),
        ] {
            if value.trim().is_empty() {
                return Err(Error::Configuration(format!("{} must not be empty", field)));
            }
        }
        if self.refresh_token.trim().is_empty() {
            return Err(Error::Configuration("refreshToken is required".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(Error::Configuration(
                "timeoutSecs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// =============================================================================
// Workflow Configuration
// =============================================================================

/// Tunables shared by the provisioning and teardown workflows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkflowConfig {
    /// Seconds between job status polls
    pub poll_interval_secs: u64,
    /// Polls before a job is declared timed out
    pub max_attempts: u32,
    /// Replication policy when the caller names none
    pub default_policy: String,
    /// Transfer schedule when the caller names none
    pub default_schedule: String,
    /// Transfer rate cap when the caller sets none
    pub default_max_transfer_rate: u64,
    /// Appended to the source volume name when no destination name is given
    pub copy_suffix: String,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 10,
            max_attempts: 10,
            default_policy: "MirrorAllSnapshots".to_string(),
            default_schedule: "1hour".to_string(),
            default_max_transfer_rate: 100000,
            copy_suffix: "_copy".to_string(),
        }
    }
}

impl WorkflowConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(Error::Configuration(
                "maxAttempts must be greater than zero".to_string(),
            ));
        }
        if self.default_max_transfer_rate == 0 {
            return Err(Error::Configuration(
                "defaultMaxTransferRate must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Operator Configuration
// =============================================================================

/// Complete configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OperatorConfig {
    pub client: ClientConfig,
    pub workflow: WorkflowConfig,
}

impl OperatorConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: OperatorConfig = serde_yaml::from_str(yaml)?;
        config.workflow.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::io::Write;

    #[test]
    fn test_workflow_defaults() {
        let config = WorkflowConfig::default();
        assert_eq!(config.poll_interval(), Duration::from_secs(10));
        assert_eq!(config.max_attempts, 10);
        assert_eq!(config.default_policy, "MirrorAllSnapshots");
        assert_eq!(config.default_schedule, "1hour");
        assert_eq!(config.default_max_transfer_rate, 100000);
        assert_eq!(config.copy_suffix, "_copy");
    }

    #[test]
    fn test_client_validation() {
        let config = ClientConfig::default();
        assert_matches!(config.validate(), Err(Error::Configuration(_)));

        let config = ClientConfig {
            client_id: "client".into(),
            refresh_token: "rt".into(),
            ..Default::default()
        };
        assert!(config.validate().is_ok());

        let config = ClientConfig {
            client_id: "client".into(),
            refresh_token: "rt".into(),
            timeout_secs: 0,
            ..Default::default()
        };
        assert_matches!(config.validate(), Err(Error::Configuration(_)));
    }

    #[test]
    fn test_load_partial_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "client:\n  refreshToken: secret\n  agentId: agent-1\nworkflow:\n  maxAttempts: 3\n  defaultPolicy: Mirror"
        )
        .unwrap();

        let config = OperatorConfig::from_yaml_file(file.path()).unwrap();
        assert_eq!(config.client.refresh_token, "secret");
        assert_eq!(config.client.agent_id.as_deref(), Some("agent-1"));
        assert_eq!(config.client.timeout_secs, 60);
        assert_eq!(config.workflow.max_attempts, 3);
        assert_eq!(config.workflow.default_policy, "Mirror");
        assert_eq!(config.workflow.default_schedule, "1hour");
    }

    #[test]
    fn test_reject_zero_attempts() {
        let result = OperatorConfig::from_yaml_str("workflow:\n  maxAttempts: 0\n");
        assert_matches!(result, Err(Error::Configuration(_)));
    }
}
