//! Wire payloads
//!
//! One typed structure per endpoint response. Decoding goes through
//! [`ApiResponse::json`](crate::domain::ApiResponse::json), and every
//! conversion into a domain type validates the fields it relies on, so a
//! malformed payload surfaces as `RemoteValidation` instead of a silent
//! default.

use crate::domain::{
    AggregateDescriptor, CloudProvider, EnvironmentCategory, EnvironmentDescriptor, JobState,
    ProviderVolume, ReplicationStatusEntry, VolumeDescriptor, VolumeSize,
};
use crate::error::{Error, Result};
use serde::Deserialize;

/// Environment type string for on-premises clusters
const ON_PREM_TYPE: &str = "ON_PREM";

fn require(operation: &str, status: u16, field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::remote_validation(
            operation,
            status,
            format!("field '{}' is empty", field),
        ));
    }
    Ok(())
}

// =============================================================================
// Environments
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkingEnvironmentWire {
    pub public_id: String,
    pub name: String,
    pub svm_name: String,
    #[serde(default)]
    pub cloud_provider_name: Option<String>,
    pub working_environment_type: String,
}

impl WorkingEnvironmentWire {
    pub fn into_descriptor(self, operation: &str, status: u16) -> Result<EnvironmentDescriptor> {
        require(operation, status, "publicId", &self.public_id)?;
        require(operation, status, "name", &self.name)?;
        require(operation, status, "svmName", &self.svm_name)?;

        let category = if self.working_environment_type == ON_PREM_TYPE {
            EnvironmentCategory::OnPremises
        } else {
            let name = self.cloud_provider_name.as_deref().unwrap_or_default();
            let provider = CloudProvider::parse(name).ok_or_else(|| {
                Error::remote_validation(
                    operation,
                    status,
                    format!(
                        "environment {} reports unknown cloud provider '{}'",
                        self.public_id, name
                    ),
                )
            })?;
            EnvironmentCategory::CloudManaged(provider)
        };

        Ok(EnvironmentDescriptor {
            id: self.public_id,
            name: self.name,
            category,
            svm_name: self.svm_name,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkingEnvironmentListWire {
    #[serde(default)]
    pub vsa_working_environments: Vec<WorkingEnvironmentWire>,
    #[serde(default)]
    pub on_prem_working_environments: Vec<WorkingEnvironmentWire>,
    #[serde(default)]
    pub azure_vsa_working_environments: Vec<WorkingEnvironmentWire>,
    #[serde(default)]
    pub gcp_vsa_working_environments: Vec<WorkingEnvironmentWire>,
}

impl WorkingEnvironmentListWire {
    pub fn into_descriptors(
        self,
        operation: &str,
        status: u16,
    ) -> Result<Vec<EnvironmentDescriptor>> {
        self.vsa_working_environments
            .into_iter()
            .chain(self.on_prem_working_environments)
            .chain(self.azure_vsa_working_environments)
            .chain(self.gcp_vsa_working_environments)
            .map(|env| env.into_descriptor(operation, status))
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedFileSystemWire {
    pub id: String,
    pub name: String,
    pub svm_name: String,
}

impl ManagedFileSystemWire {
    pub fn into_descriptor(self, operation: &str, status: u16) -> Result<EnvironmentDescriptor> {
        require(operation, status, "id", &self.id)?;
        require(operation, status, "name", &self.name)?;
        require(operation, status, "svmName", &self.svm_name)?;

        Ok(EnvironmentDescriptor {
            id: self.id,
            name: self.name,
            category: EnvironmentCategory::ManagedFileSystem,
            svm_name: self.svm_name,
        })
    }
}

// =============================================================================
// Network
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct InterclusterLifWire {
    pub address: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterclusterLifsWire {
    pub inter_cluster_lifs: Vec<InterclusterLifWire>,
    pub peer_inter_cluster_lifs: Vec<InterclusterLifWire>,
}

pub fn addresses(
    operation: &str,
    status: u16,
    lifs: Vec<InterclusterLifWire>,
) -> Result<Vec<String>> {
    lifs.into_iter()
        .map(|lif| {
            require(operation, status, "address", &lif.address)?;
            Ok(lif.address)
        })
        .collect()
}

// =============================================================================
// Volumes and Aggregates
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct VolumeSizeWire {
    pub size: f64,
    pub unit: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeWire {
    pub name: String,
    pub svm_name: String,
    pub size: VolumeSizeWire,
    #[serde(default)]
    pub snapshot_policy: Option<String>,
    #[serde(default)]
    pub deduplication: bool,
    #[serde(default)]
    pub thin_provisioning: bool,
    #[serde(default)]
    pub compression: bool,
    #[serde(default)]
    pub aggregate_name: Option<String>,
    #[serde(default)]
    pub provider_volume_type: Option<String>,
}

impl VolumeWire {
    pub fn into_descriptor(self, operation: &str, status: u16) -> Result<VolumeDescriptor> {
        require(operation, status, "name", &self.name)?;
        require(operation, status, "svmName", &self.svm_name)?;
        require(operation, status, "size.unit", &self.size.unit)?;
        if !self.size.size.is_finite() || self.size.size < 0.0 {
            return Err(Error::remote_validation(
                operation,
                status,
                format!("volume {} reports invalid size {}", self.name, self.size.size),
            ));
        }

        Ok(VolumeDescriptor {
            name: self.name,
            svm_name: self.svm_name,
            size: VolumeSize {
                size: self.size.size,
                unit: self.size.unit,
            },
            snapshot_policy_name: self.snapshot_policy,
            dedup_enabled: self.deduplication,
            thin_provisioning_enabled: self.thin_provisioning,
            compression_enabled: self.compression,
            aggregate_name: self.aggregate_name.filter(|name| !name.is_empty()),
            provider_volume_type: self.provider_volume_type.filter(|t| !t.is_empty()),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderVolumeWire {
    pub disk_type: String,
    #[serde(default)]
    pub iops: Option<u64>,
    #[serde(default)]
    pub throughput: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateWire {
    pub name: String,
    #[serde(default)]
    pub provider_volumes: Vec<ProviderVolumeWire>,
}

impl AggregateWire {
    pub fn into_descriptor(self, operation: &str, status: u16) -> Result<AggregateDescriptor> {
        require(operation, status, "name", &self.name)?;
        let provider_volumes = self
            .provider_volumes
            .into_iter()
            .map(|pv| {
                require(operation, status, "providerVolumes.diskType", &pv.disk_type)?;
                Ok(ProviderVolume {
                    disk_type: pv.disk_type,
                    iops: pv.iops,
                    throughput: pv.throughput,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(AggregateDescriptor {
            name: self.name,
            provider_volumes,
        })
    }
}

// =============================================================================
// Quote
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponseWire {
    pub aggregate_name: String,
    pub num_of_disks: u32,
    #[serde(default)]
    pub new_aggregate: bool,
}

impl QuoteResponseWire {
    pub fn validate(self, operation: &str, status: u16) -> Result<Self> {
        require(operation, status, "aggregateName", &self.aggregate_name)?;
        Ok(self)
    }
}

// =============================================================================
// Jobs
// =============================================================================

/// Job status codes reported by the audit endpoint
const JOB_SUCCEEDED: i32 = 1;
const JOB_IN_PROGRESS: i32 = 0;
const JOB_FAILED: i32 = -1;

#[derive(Debug, Clone, Deserialize)]
pub struct JobStatusWire {
    pub status: i32,
    #[serde(default)]
    pub error: Option<String>,
}

impl JobStatusWire {
    pub fn into_state(self, operation: &str, http_status: u16) -> Result<JobState> {
        match self.status {
            JOB_SUCCEEDED => Ok(JobState::Succeeded),
            JOB_IN_PROGRESS => Ok(JobState::InProgress),
            JOB_FAILED => Ok(JobState::Failed {
                reason: self
                    .error
                    .filter(|e| !e.is_empty())
                    .unwrap_or_else(|| "no diagnostic supplied".to_string()),
            }),
            other => Err(Error::remote_validation(
                operation,
                http_status,
                format!("unknown job status code {}", other),
            )),
        }
    }
}

// =============================================================================
// Replication Status
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplicationEndpointWire {
    pub volume_name: String,
    #[serde(default)]
    pub svm_name: Option<String>,
    #[serde(default)]
    pub working_environment_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReplicationStatusWire {
    pub destination: ReplicationEndpointWire,
}

impl ReplicationStatusWire {
    pub fn into_entry(self, operation: &str, status: u16) -> Result<ReplicationStatusEntry> {
        require(operation, status, "destination.volumeName", &self.destination.volume_name)?;
        Ok(ReplicationStatusEntry {
            destination_volume_name: self.destination.volume_name,
            destination_svm_name: self.destination.svm_name,
            destination_environment_id: self.destination.working_environment_id,
        })
    }
}
