//! Teardown Workflow
//!
//! Re-resolves the environment pair, derives the destination volume the same
//! way create does, then deletes the relationship and waits for the job.

use crate::config::WorkflowConfig;
use crate::controlplane::provisioning::REPLICATION_PATH;
use crate::discovery::EnvironmentResolver;
use crate::domain::model::{AsyncJob, ReplicationSpec};
use crate::domain::ports::{ApiRequest, ControlPlaneTransportRef};
use crate::error::Result;
use crate::jobs::JobPoller;
use crate::metrics::WorkflowMetrics;
use tracing::info;
use urlencoding::encode;

pub struct TeardownWorkflow {
    transport: ControlPlaneTransportRef,
    config: WorkflowConfig,
    resolver: EnvironmentResolver,
    poller: JobPoller,
}

impl TeardownWorkflow {
    pub fn new(transport: ControlPlaneTransportRef, config: WorkflowConfig) -> Self {
        Self {
            resolver: EnvironmentResolver::new(transport.clone()),
            poller: JobPoller::new(transport.clone()),
            transport,
            config,
        }
    }

    pub fn with_metrics(mut self, metrics: WorkflowMetrics) -> Self {
        self.poller = JobPoller::new(self.transport.clone()).with_metrics(metrics);
        self
    }

    pub async fn delete(&self, spec: &ReplicationSpec) -> Result<()> {
        let operation = "delete replication";
        let workspace = spec.workspace_id();
        let source = self.resolver.resolve(&spec.source, workspace).await?;
        let destination = self.resolver.resolve(&spec.destination, workspace).await?;

        let volume = spec.destination_volume_name_or(&self.config.copy_suffix);
        let svm = spec
            .destination_svm_name
            .clone()
            .filter(|svm| !svm.is_empty())
            .unwrap_or_else(|| destination.svm_name.clone());

        info!(
            "Deleting replication {} -> {}/{}/{}",
            source.id, destination.id, svm, volume
        );

        let path = format!(
            "{}/{}/{}/{}",
            REPLICATION_PATH,
            encode(&destination.id),
            encode(&svm),
            encode(&volume)
        );
        let response = self
            .transport
            .call(ApiRequest::delete(path))
            .await?
            .ensure_success(operation)?;
        let request_id = response.require_request_id(operation)?;

        self.poller
            .wait(&AsyncJob {
                request_id,
                kind: "replication".to_string(),
                action: "delete".to_string(),
                poll_interval: self.config.poll_interval(),
                max_attempts: self.config.max_attempts,
            })
            .await?;

        info!("Deleted replication to {}/{}", svm, volume);
        Ok(())
    }
}
