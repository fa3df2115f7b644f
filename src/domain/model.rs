//! Domain Model - Replication entities
//!
//! Everything here is transient: built fresh for a single create, read or
//! delete invocation and dropped when it returns. The control plane is the
//! only authority on persisted state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Identifier prefix carried by managed file-system environments
pub const MANAGED_FILE_SYSTEM_PREFIX: &str = "fs-";

// =============================================================================
// Environment Types
// =============================================================================

/// Caller-supplied reference to an environment, by id, by name, or both
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentRef {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl EnvironmentRef {
    pub fn by_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            name: None,
        }
    }

    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: Some(name.into()),
        }
    }

    /// Identifier, ignoring empty strings
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }

    /// Name, ignoring empty strings
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref().filter(|name| !name.is_empty())
    }
}

impl std::fmt::Display for EnvironmentRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.id(), self.name()) {
            (Some(id), _) => write!(f, "id={}", id),
            (None, Some(name)) => write!(f, "name={}", name),
            (None, None) => write!(f, "<unset>"),
        }
    }
}

/// Category of an environment, fixed at resolution time
///
/// Managed file systems are always hosted on AWS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EnvironmentCategory {
    CloudManaged(CloudProvider),
    OnPremises,
    ManagedFileSystem,
}

impl EnvironmentCategory {
    pub fn cloud_provider(&self) -> Option<CloudProvider> {
        match self {
            EnvironmentCategory::CloudManaged(provider) => Some(*provider),
            EnvironmentCategory::ManagedFileSystem => Some(CloudProvider::Aws),
            EnvironmentCategory::OnPremises => None,
        }
    }
}

impl std::fmt::Display for EnvironmentCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnvironmentCategory::CloudManaged(provider) => write!(f, "cloud-managed ({})", provider),
            EnvironmentCategory::OnPremises => write!(f, "on-premises"),
            EnvironmentCategory::ManagedFileSystem => write!(f, "managed-file-system"),
        }
    }
}

/// Cloud provider hosting a cloud-managed or managed file-system environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CloudProvider {
    #[serde(rename = "AWS")]
    Aws,
    #[serde(rename = "Azure")]
    Azure,
    #[serde(rename = "GCP")]
    Gcp,
}

impl CloudProvider {
    /// Parse the provider name reported by the control plane
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "aws" | "amazon" => Some(CloudProvider::Aws),
            "azure" => Some(CloudProvider::Azure),
            "gcp" | "google" => Some(CloudProvider::Gcp),
            _ => None,
        }
    }

    /// Object-storage capacity tier used when the caller sets none
    pub fn default_capacity_tier(&self) -> &'static str {
        match self {
            CloudProvider::Aws => "S3",
            CloudProvider::Azure => "Blob",
            CloudProvider::Gcp => "cloudStorage",
        }
    }

    /// Path prefix of the provider's volume, aggregate and quote endpoints
    pub fn api_prefix(&self) -> &'static str {
        match self {
            CloudProvider::Aws => "/occm/api/vsa",
            CloudProvider::Azure => "/occm/api/azure/vsa",
            CloudProvider::Gcp => "/occm/api/gcp/vsa",
        }
    }
}

impl std::fmt::Display for CloudProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CloudProvider::Aws => write!(f, "AWS"),
            CloudProvider::Azure => write!(f, "Azure"),
            CloudProvider::Gcp => write!(f, "GCP"),
        }
    }
}

/// Canonical description of a resolved environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentDescriptor {
    pub id: String,
    pub name: String,
    pub category: EnvironmentCategory,
    pub svm_name: String,
}

impl EnvironmentDescriptor {
    pub fn is_on_premises(&self) -> bool {
        self.category == EnvironmentCategory::OnPremises
    }

    /// Hosting provider; none for on-premises clusters
    pub fn cloud_provider(&self) -> Option<CloudProvider> {
        self.category.cloud_provider()
    }

    /// Path prefix of this environment's volume and aggregate endpoints
    pub fn api_prefix(&self) -> &'static str {
        match self.category {
            EnvironmentCategory::OnPremises => "/occm/api/onprem",
            EnvironmentCategory::ManagedFileSystem => "/occm/api/fsx",
            EnvironmentCategory::CloudManaged(provider) => provider.api_prefix(),
        }
    }
}

// =============================================================================
// Replication Request
// =============================================================================

/// Destination reference of a replication request
///
/// Serialized flattened into the request body, so exactly one of the two
/// keys ever appears on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DestinationTarget {
    #[serde(rename = "destinationWorkingEnvironmentId")]
    Environment(String),
    #[serde(rename = "destinationFsxId")]
    ManagedFileSystem(String),
}

impl DestinationTarget {
    /// Select the request variant for a resolved destination
    pub fn for_environment(destination: &EnvironmentDescriptor) -> Self {
        match destination.category {
            EnvironmentCategory::ManagedFileSystem => {
                DestinationTarget::ManagedFileSystem(destination.id.clone())
            }
            EnvironmentCategory::CloudManaged(_) | EnvironmentCategory::OnPremises => {
                DestinationTarget::Environment(destination.id.clone())
            }
        }
    }

    pub fn environment_id(&self) -> Option<&str> {
        match self {
            DestinationTarget::Environment(id) => Some(id),
            DestinationTarget::ManagedFileSystem(_) => None,
        }
    }

    pub fn managed_file_system_id(&self) -> Option<&str> {
        match self {
            DestinationTarget::ManagedFileSystem(id) => Some(id),
            DestinationTarget::Environment(_) => None,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            DestinationTarget::Environment(id) | DestinationTarget::ManagedFileSystem(id) => id,
        }
    }
}

/// Relationship-level half of a replication submission
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplicationRequest {
    #[serde(rename = "sourceWorkingEnvironmentId")]
    pub source_environment_id: String,
    #[serde(flatten)]
    pub destination: DestinationTarget,
    #[serde(rename = "sourceInterclusterLifIps")]
    pub source_endpoints: Vec<String>,
    #[serde(rename = "destinationInterclusterLifIps")]
    pub destination_endpoints: Vec<String>,
    pub policy_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_transfer_rate: Option<u64>,
}

/// Volume-level half of a replication submission
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplicationVolume {
    pub source_svm_name: String,
    pub source_volume_name: String,
    pub destination_volume_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_svm_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_aggregate_name: Option<String>,
    pub advanced_mode: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_provider_volume_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_capacity_tier: Option<String>,
    #[serde(
        rename = "numOfDisksApprovedToAdd",
        skip_serializing_if = "Option::is_none"
    )]
    pub disk_count_approval: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iops: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub throughput: Option<u64>,
}

// =============================================================================
// Volume and Aggregate Types
// =============================================================================

/// Volume size as the control plane reports it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeSize {
    pub size: f64,
    pub unit: String,
}

/// A located volume
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeDescriptor {
    pub name: String,
    pub svm_name: String,
    pub size: VolumeSize,
    pub snapshot_policy_name: Option<String>,
    pub dedup_enabled: bool,
    pub thin_provisioning_enabled: bool,
    pub compression_enabled: bool,
    pub aggregate_name: Option<String>,
    pub provider_volume_type: Option<String>,
}

/// One disk group backing an aggregate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderVolume {
    pub disk_type: String,
    pub iops: Option<u64>,
    pub throughput: Option<u64>,
}

/// Disk aggregate; provider volumes are assumed homogeneous
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateDescriptor {
    pub name: String,
    pub provider_volumes: Vec<ProviderVolume>,
}

impl AggregateDescriptor {
    pub fn primary_provider_volume(&self) -> Option<&ProviderVolume> {
        self.provider_volumes.first()
    }
}

// =============================================================================
// Quote Types
// =============================================================================

/// Sizing request sent to the control plane ahead of submission
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    pub working_environment_id: String,
    pub svm_name: String,
    pub name: String,
    pub size: VolumeSize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_policy_name: Option<String>,
    pub enable_deduplication: bool,
    pub enable_thin_provisioning: bool,
    pub enable_compression: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_volume_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity_tier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregate_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iops: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub throughput: Option<u64>,
    pub verify_name_uniqueness: bool,
}

/// Destination sizing plan produced by the quote engine
#[derive(Debug, Clone, PartialEq)]
pub struct QuotePlan {
    pub request: QuoteRequest,
    pub advanced_mode: bool,
    pub aggregate_name: Option<String>,
    pub disk_count_approval: Option<u32>,
}

impl QuotePlan {
    /// Copy the planned destination parameters onto a replication volume
    pub fn apply_to(&self, volume: &mut ReplicationVolume) {
        volume.advanced_mode = self.advanced_mode;
        volume.destination_aggregate_name = self.aggregate_name.clone();
        volume.disk_count_approval = self.disk_count_approval;
        volume.destination_capacity_tier = self.request.capacity_tier.clone();
        volume.destination_provider_volume_type = self.request.provider_volume_type.clone();
        volume.iops = self.request.iops;
        volume.throughput = self.request.throughput;
    }
}

// =============================================================================
// Job Types
// =============================================================================

/// Handle to a remote asynchronous job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsyncJob {
    pub request_id: String,
    pub kind: String,
    pub action: String,
    pub poll_interval: Duration,
    pub max_attempts: u32,
}

impl AsyncJob {
    /// Operation label used in logs and errors, e.g. "create replication"
    pub fn operation(&self) -> String {
        format!("{} {}", self.action, self.kind)
    }
}

/// Job state as reported by the control plane
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    InProgress,
    Succeeded,
    Failed { reason: String },
}

// =============================================================================
// Relationship Surface
// =============================================================================

/// Desired replication relationship, as handed over by the resource layer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplicationSpec {
    pub source: EnvironmentRef,
    pub destination: EnvironmentRef,
    /// Workspace owning managed file-system environments
    #[serde(default)]
    pub workspace_id: Option<String>,
    pub source_volume_name: String,
    #[serde(default)]
    pub source_svm_name: Option<String>,
    #[serde(default)]
    pub destination_volume_name: Option<String>,
    #[serde(default)]
    pub destination_svm_name: Option<String>,
    #[serde(default)]
    pub destination_aggregate_name: Option<String>,
    #[serde(default)]
    pub destination_capacity_tier: Option<String>,
    #[serde(default)]
    pub destination_provider_volume_type: Option<String>,
    #[serde(default)]
    pub policy_name: Option<String>,
    #[serde(default)]
    pub schedule_name: Option<String>,
    #[serde(default)]
    pub max_transfer_rate: Option<u64>,
}

impl ReplicationSpec {
    /// Destination volume name, defaulting to the source name plus `suffix`
    pub fn destination_volume_name_or(&self, suffix: &str) -> String {
        self.destination_volume_name
            .clone()
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| format!("{}{}", self.source_volume_name, suffix))
    }

    pub fn workspace_id(&self) -> Option<&str> {
        self.workspace_id.as_deref().filter(|ws| !ws.is_empty())
    }
}

/// Result of a successful create
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplicationRecord {
    /// Destination volume name; the relationship's identity
    pub id: String,
    pub source_environment_id: String,
    #[serde(flatten)]
    pub destination: DestinationTarget,
    pub source_svm_name: String,
    pub source_volume_name: String,
    pub destination_svm_name: String,
    pub destination_volume_name: String,
    pub policy_name: String,
    pub schedule_name: String,
    pub max_transfer_rate: u64,
    pub capacity_tier: Option<String>,
    pub aggregate_name: Option<String>,
    pub advanced_mode: bool,
    pub created_at: DateTime<Utc>,
}

/// One row of the replication status listing for a source environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplicationStatusEntry {
    pub destination_volume_name: String,
    pub destination_svm_name: Option<String>,
    pub destination_environment_id: Option<String>,
}
