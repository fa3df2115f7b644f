//! Provisioning Workflow
//!
//! Sequences one replication create:
//!
//! ```text
//! ResolveEnvironments -> DiscoverNetwork -> LocateSourceVolume
//!     -> [Quote, unless the destination is on-premises]
//!     -> SelectDestinationTarget -> Submit -> Poll
//! ```
//!
//! Any stage can abort the run with a typed error. Nothing is rolled back on
//! the remote side; the control plane owns compensation for its own jobs.
//!
//! The read path lives here as well, since it shares the resolver and the
//! destination naming rules.

use crate::config::WorkflowConfig;
use crate::controlplane::client::wire::ReplicationStatusWire;
use crate::discovery::{EnvironmentResolver, NetworkDiscovery, VolumeLocator};
use crate::domain::model::{
    AsyncJob, DestinationTarget, EnvironmentDescriptor, ReplicationRecord, ReplicationRequest,
    ReplicationSpec, ReplicationStatusEntry, ReplicationVolume,
};
use crate::domain::ports::{ApiRequest, ControlPlaneTransportRef};
use crate::error::{Error, Result};
use crate::jobs::JobPoller;
use crate::metrics::WorkflowMetrics;
use crate::sizing::{capacity_tier, QuoteEngine};
use serde_json::json;
use tracing::{debug, info, warn};
use urlencoding::encode;

/// Replication endpoints on the connector host
pub(crate) const REPLICATION_PATH: &str = "/occm/api/replication";

// =============================================================================
// Stages
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowStage {
    ResolveEnvironments,
    DiscoverNetwork,
    LocateSourceVolume,
    Quote,
    SelectDestinationTarget,
    Submit,
    Poll,
}

impl std::fmt::Display for WorkflowStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            WorkflowStage::ResolveEnvironments => "resolve environments",
            WorkflowStage::DiscoverNetwork => "discover network",
            WorkflowStage::LocateSourceVolume => "locate source volume",
            WorkflowStage::Quote => "quote destination volume",
            WorkflowStage::SelectDestinationTarget => "select destination target",
            WorkflowStage::Submit => "submit",
            WorkflowStage::Poll => "poll",
        };
        write!(f, "{}", name)
    }
}

fn enter(relationship: &str, stage: WorkflowStage) {
    debug!("Replication {}: {}", relationship, stage);
}

// =============================================================================
// Provisioning Workflow
// =============================================================================

pub struct ProvisioningWorkflow {
    transport: ControlPlaneTransportRef,
    config: WorkflowConfig,
    resolver: EnvironmentResolver,
    network: NetworkDiscovery,
    volumes: VolumeLocator,
    quotes: QuoteEngine,
    poller: JobPoller,
}

impl ProvisioningWorkflow {
    pub fn new(transport: ControlPlaneTransportRef, config: WorkflowConfig) -> Self {
        Self {
            resolver: EnvironmentResolver::new(transport.clone()),
            network: NetworkDiscovery::new(transport.clone()),
            volumes: VolumeLocator::new(transport.clone()),
            quotes: QuoteEngine::new(transport.clone()),
            poller: JobPoller::new(transport.clone()),
            transport,
            config,
        }
    }

    pub fn with_metrics(mut self, metrics: WorkflowMetrics) -> Self {
        self.poller = JobPoller::new(self.transport.clone()).with_metrics(metrics);
        self
    }

    /// Create the replication relationship described by `spec`
    pub async fn create(&self, spec: &ReplicationSpec) -> Result<ReplicationRecord> {
        validate(spec)?;
        let destination_volume_name = spec.destination_volume_name_or(&self.config.copy_suffix);
        let relationship = format!("{} -> {}", spec.source_volume_name, destination_volume_name);

        enter(&relationship, WorkflowStage::ResolveEnvironments);
        let workspace = spec.workspace_id();
        let source = self.resolver.resolve(&spec.source, workspace).await?;
        let destination = self.resolver.resolve(&spec.destination, workspace).await?;

        enter(&relationship, WorkflowStage::DiscoverNetwork);
        let endpoints = self.network.discover(&source, &destination).await?;

        enter(&relationship, WorkflowStage::LocateSourceVolume);
        let source_svm_name = non_empty(&spec.source_svm_name)
            .unwrap_or_else(|| source.svm_name.clone());
        let volume = self
            .volumes
            .locate(&source, &spec.source_volume_name, Some(source_svm_name.as_str()))
            .await?;

        let destination_aggregate_name = non_empty(&spec.destination_aggregate_name);
        let mut replication_volume = ReplicationVolume {
            source_svm_name,
            source_volume_name: volume.name.clone(),
            destination_volume_name: destination_volume_name.clone(),
            destination_svm_name: Some(
                non_empty(&spec.destination_svm_name)
                    .unwrap_or_else(|| destination.svm_name.clone()),
            ),
            advanced_mode: destination_aggregate_name.is_some(),
            destination_aggregate_name,
            destination_provider_volume_type: non_empty(&spec.destination_provider_volume_type),
            destination_capacity_tier: non_empty(&spec.destination_capacity_tier),
            ..Default::default()
        };

        if destination.is_on_premises() {
            debug!(
                "Replication {}: destination {} is on-premises, no quote",
                relationship, destination.id
            );
            replication_volume.destination_capacity_tier = capacity_tier(
                replication_volume.destination_capacity_tier.as_deref(),
                &destination,
            );
        } else {
            enter(&relationship, WorkflowStage::Quote);
            let plan = self
                .quotes
                .quote(&source, &volume, &destination, &replication_volume)
                .await?;
            plan.apply_to(&mut replication_volume);
        }

        enter(&relationship, WorkflowStage::SelectDestinationTarget);
        let target = DestinationTarget::for_environment(&destination);
        let (source_endpoints, destination_endpoints) = endpoints.active_pair();
        let request = ReplicationRequest {
            source_environment_id: source.id.clone(),
            destination: target,
            source_endpoints,
            destination_endpoints,
            policy_name: non_empty(&spec.policy_name)
                .unwrap_or_else(|| self.config.default_policy.clone()),
            schedule_name: Some(
                non_empty(&spec.schedule_name)
                    .unwrap_or_else(|| self.config.default_schedule.clone()),
            ),
            max_transfer_rate: Some(
                spec.max_transfer_rate
                    .unwrap_or(self.config.default_max_transfer_rate),
            ),
        };

        enter(&relationship, WorkflowStage::Submit);
        let request_id = self
            .submit(&destination, &request, &replication_volume)
            .await?;

        enter(&relationship, WorkflowStage::Poll);
        self.poller
            .wait(&AsyncJob {
                request_id,
                kind: "replication".to_string(),
                action: "create".to_string(),
                poll_interval: self.config.poll_interval(),
                max_attempts: self.config.max_attempts,
            })
            .await?;

        info!(
            "Replication {} established ({} -> {})",
            relationship,
            source.id,
            request.destination.id()
        );

        Ok(ReplicationRecord {
            id: destination_volume_name.clone(),
            source_environment_id: request.source_environment_id,
            destination: request.destination,
            source_svm_name: replication_volume.source_svm_name,
            source_volume_name: replication_volume.source_volume_name,
            destination_svm_name: replication_volume
                .destination_svm_name
                .unwrap_or_else(|| destination.svm_name.clone()),
            destination_volume_name,
            policy_name: request.policy_name,
            schedule_name: request
                .schedule_name
                .unwrap_or_else(|| self.config.default_schedule.clone()),
            max_transfer_rate: request
                .max_transfer_rate
                .unwrap_or(self.config.default_max_transfer_rate),
            capacity_tier: replication_volume.destination_capacity_tier,
            aggregate_name: replication_volume.destination_aggregate_name,
            advanced_mode: replication_volume.advanced_mode,
            created_at: chrono::Utc::now(),
        })
    }

    async fn submit(
        &self,
        destination: &EnvironmentDescriptor,
        request: &ReplicationRequest,
        volume: &ReplicationVolume,
    ) -> Result<String> {
        let operation = "submit replication";
        let endpoint = if destination.is_on_premises() {
            "onprem"
        } else {
            "vsa"
        };
        let body = json!({
            "replicationRequest": request,
            "replicationVolume": volume,
        });

        let response = self
            .transport
            .call(ApiRequest::post(
                format!("{}/{}", REPLICATION_PATH, endpoint),
                body,
            ))
            .await?
            .ensure_success(operation)?;
        let request_id = response.require_request_id(operation)?;

        info!(
            "Submitted replication {} -> {} via /replication/{} (job {})",
            volume.source_volume_name, volume.destination_volume_name, endpoint, request_id
        );
        Ok(request_id)
    }

    // =========================================================================
    // Read Path
    // =========================================================================

    /// Status entry for the relationship `spec` describes, if the source
    /// environment reports one
    pub async fn find_relationship(
        &self,
        spec: &ReplicationSpec,
    ) -> Result<Option<ReplicationStatusEntry>> {
        let operation = "read replication status";
        let source = self
            .resolver
            .resolve(&spec.source, spec.workspace_id())
            .await?;
        let destination_volume_name = spec.destination_volume_name_or(&self.config.copy_suffix);

        let response = self
            .transport
            .call(ApiRequest::get(format!(
                "{}/status/{}",
                REPLICATION_PATH,
                encode(&source.id)
            )))
            .await?
            .ensure_success(operation)?;

        let mut found = None;
        for row in response.json::<Vec<ReplicationStatusWire>>(operation)? {
            let entry = row.into_entry(operation, response.status)?;
            if entry.destination_volume_name == destination_volume_name {
                found = Some(entry);
                break;
            }
        }

        if let Some(entry) = &found {
            if let (Some(desired), Some(reported)) = (
                non_empty(&spec.destination_svm_name),
                entry.destination_svm_name.as_deref(),
            ) {
                if desired != reported {
                    warn!(
                        "Replication to {} reports destination svm {}, expected {}",
                        destination_volume_name, reported, desired
                    );
                }
            }
        }

        debug!(
            "Replication {} on {}: {}",
            destination_volume_name,
            source.id,
            if found.is_some() { "present" } else { "absent" }
        );
        Ok(found)
    }

    pub async fn exists(&self, spec: &ReplicationSpec) -> Result<bool> {
        Ok(self.find_relationship(spec).await?.is_some())
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.clone().filter(|v| !v.is_empty())
}

/// Reject create input that can never succeed
fn validate(spec: &ReplicationSpec) -> Result<()> {
    if spec.source_volume_name.is_empty() {
        return Err(Error::Configuration(
            "sourceVolumeName must not be empty".to_string(),
        ));
    }
    if spec.max_transfer_rate == Some(0) {
        return Err(Error::Configuration(
            "maxTransferRate must be greater than zero".to_string(),
        ));
    }
    Ok(())
}
