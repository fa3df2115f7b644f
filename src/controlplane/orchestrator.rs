//! Replication Orchestrator
//!
//! Entry points handed to the resource-management surface:
//! - `create`: provision a relationship and return its record
//! - `read`: report whether the relationship still exists
//! - `delete`: tear the relationship down
//!
//! A relationship is identified by its destination volume name. Every call
//! is timed and counted in the workflow metrics.

use crate::config::WorkflowConfig;
use crate::controlplane::provisioning::ProvisioningWorkflow;
use crate::controlplane::teardown::TeardownWorkflow;
use crate::domain::model::{ReplicationRecord, ReplicationSpec};
use crate::domain::ports::ControlPlaneTransportRef;
use crate::error::Result;
use crate::metrics::{Outcome, WorkflowMetrics};
use prometheus::Registry;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

// =============================================================================
// Orchestrator
// =============================================================================

pub struct ReplicationOrchestrator {
    provisioning: ProvisioningWorkflow,
    teardown: TeardownWorkflow,
    metrics: WorkflowMetrics,
}

impl ReplicationOrchestrator {
    /// Create an orchestrator whose instruments register into `registry`
    pub fn new(
        transport: ControlPlaneTransportRef,
        config: WorkflowConfig,
        registry: &Registry,
    ) -> Result<Arc<Self>> {
        config.validate()?;
        let metrics = WorkflowMetrics::register(registry)?;

        Ok(Arc::new(Self {
            provisioning: ProvisioningWorkflow::new(transport.clone(), config.clone())
                .with_metrics(metrics.clone()),
            teardown: TeardownWorkflow::new(transport, config).with_metrics(metrics.clone()),
            metrics,
        }))
    }

    /// Provision a replication relationship
    pub async fn create(&self, spec: &ReplicationSpec) -> Result<ReplicationRecord> {
        info!(
            "Creating replication of {} from {} to {}",
            spec.source_volume_name, spec.source, spec.destination
        );

        let started = Instant::now();
        let result = self.provisioning.create(spec).await;
        self.record("create", started, &result);

        if let Ok(record) = &result {
            info!("Created replication {}", record.id);
        }
        result
    }

    /// Whether relationship `id` is still reported by the control plane
    pub async fn read(&self, id: &str, spec: &ReplicationSpec) -> Result<bool> {
        let spec = with_identity(id, spec);

        let started = Instant::now();
        let result = self.provisioning.exists(&spec).await;
        self.record("read", started, &result);
        result
    }

    /// Delete relationship `id`
    pub async fn delete(&self, id: &str, spec: &ReplicationSpec) -> Result<()> {
        info!("Deleting replication {}", id);
        let spec = with_identity(id, spec);

        let started = Instant::now();
        let result = self.teardown.delete(&spec).await;
        self.record("delete", started, &result);
        result
    }

    fn record<T>(&self, operation: &str, started: Instant, result: &Result<T>) {
        let outcome = match result {
            Ok(_) => Outcome::Success,
            Err(e) => {
                error!("Replication {} failed: {}", operation, e);
                Outcome::Failure
            }
        };
        self.metrics.observe(operation, outcome, started.elapsed());
    }
}

/// The spec with its destination volume pinned to the relationship id
fn with_identity(id: &str, spec: &ReplicationSpec) -> ReplicationSpec {
    let mut spec = spec.clone();
    if !id.is_empty() {
        spec.destination_volume_name = Some(id.to_string());
    }
    spec
}
