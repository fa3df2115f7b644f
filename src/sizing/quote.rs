//! Quote Engine
//!
//! Derives the destination volume's sizing and performance plan from the
//! source volume and its disk aggregate, then asks the control plane where
//! to place it. Rules, in order:
//!
//! 1. Size, snapshot policy and efficiency flags copy from the source volume.
//! 2. Capacity tier: the caller's value unless it is `"none"`, otherwise the
//!    destination provider's object tier.
//! 3. Provider volume type: the caller's value, otherwise the source's.
//! 4. IOPS are inherited from gp3/io1/io2 aggregates, throughput from gp3
//!    only. A failed aggregate lookup just means nothing is inherited.
//! 5. A caller-named aggregate turns on advanced mode and skips the remote
//!    quote; otherwise the quoted aggregate and disk count are adopted.

use crate::controlplane::client::wire::QuoteResponseWire;
use crate::discovery::AggregateLookup;
use crate::domain::model::{
    AggregateDescriptor, EnvironmentDescriptor, QuotePlan, QuoteRequest, ReplicationVolume,
    VolumeDescriptor,
};
use crate::domain::ports::{ApiRequest, ControlPlaneTransportRef};
use crate::error::Result;
use tracing::{debug, info, warn};

/// Capacity tier value that disables tiering
pub const CAPACITY_TIER_NONE: &str = "none";

const IOPS_DISK_TYPES: [&str; 3] = ["gp3", "io1", "io2"];
const THROUGHPUT_DISK_TYPE: &str = "gp3";

// =============================================================================
// Pure Derivation
// =============================================================================

/// Performance settings carried over from the source aggregate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InheritedPerformance {
    pub iops: Option<u64>,
    pub throughput: Option<u64>,
}

impl InheritedPerformance {
    pub fn from_aggregate(aggregate: &AggregateDescriptor) -> Self {
        let Some(disks) = aggregate.primary_provider_volume() else {
            return Self::default();
        };
        let disk_type = disks.disk_type.to_ascii_lowercase();

        Self {
            iops: if IOPS_DISK_TYPES.contains(&disk_type.as_str()) {
                disks.iops
            } else {
                None
            },
            throughput: if disk_type == THROUGHPUT_DISK_TYPE {
                disks.throughput
            } else {
                None
            },
        }
    }
}

/// Capacity tier for a destination, given what the caller asked for
pub fn capacity_tier(
    requested: Option<&str>,
    destination: &EnvironmentDescriptor,
) -> Option<String> {
    match requested {
        Some(tier) if tier.eq_ignore_ascii_case(CAPACITY_TIER_NONE) => None,
        Some(tier) if !tier.is_empty() => Some(tier.to_string()),
        _ => destination
            .cloud_provider()
            .map(|provider| provider.default_capacity_tier().to_string()),
    }
}

/// Build the quote request for `replication` (rules 1 to 4)
pub fn build_quote_request(
    volume: &VolumeDescriptor,
    destination: &EnvironmentDescriptor,
    replication: &ReplicationVolume,
    performance: InheritedPerformance,
) -> QuoteRequest {
    QuoteRequest {
        working_environment_id: destination.id.clone(),
        svm_name: replication
            .destination_svm_name
            .clone()
            .unwrap_or_else(|| destination.svm_name.clone()),
        name: replication.destination_volume_name.clone(),
        size: volume.size.clone(),
        snapshot_policy_name: volume.snapshot_policy_name.clone(),
        enable_deduplication: volume.dedup_enabled,
        enable_thin_provisioning: volume.thin_provisioning_enabled,
        enable_compression: volume.compression_enabled,
        provider_volume_type: replication
            .destination_provider_volume_type
            .clone()
            .or_else(|| volume.provider_volume_type.clone()),
        capacity_tier: capacity_tier(replication.destination_capacity_tier.as_deref(), destination),
        aggregate_name: replication.destination_aggregate_name.clone(),
        iops: performance.iops,
        throughput: performance.throughput,
        verify_name_uniqueness: true,
    }
}

// =============================================================================
// Quote Engine
// =============================================================================

pub struct QuoteEngine {
    transport: ControlPlaneTransportRef,
    aggregates: AggregateLookup,
}

impl QuoteEngine {
    pub fn new(transport: ControlPlaneTransportRef) -> Self {
        Self {
            aggregates: AggregateLookup::new(transport.clone()),
            transport,
        }
    }

    /// Plan the destination volume for replicating `volume` out of `source`
    pub async fn quote(
        &self,
        source: &EnvironmentDescriptor,
        volume: &VolumeDescriptor,
        destination: &EnvironmentDescriptor,
        replication: &ReplicationVolume,
    ) -> Result<QuotePlan> {
        let performance = self.inherit_performance(source, volume).await;
        let request = build_quote_request(volume, destination, replication, performance);

        if let Some(aggregate) = replication
            .destination_aggregate_name
            .clone()
            .filter(|name| !name.is_empty())
        {
            debug!(
                "Aggregate {} named by caller, skipping remote quote for {}",
                aggregate, request.name
            );
            return Ok(QuotePlan {
                request,
                advanced_mode: true,
                aggregate_name: Some(aggregate),
                disk_count_approval: None,
            });
        }

        let operation = "quote destination volume";
        let path = format!("{}/volumes/quote", destination.api_prefix());
        let response = self
            .transport
            .call(ApiRequest::post(path, serde_json::to_value(&request)?))
            .await?
            .ensure_success(operation)?;
        let quoted = response
            .json::<QuoteResponseWire>(operation)?
            .validate(operation, response.status)?;

        info!(
            "Quoted {} on {}: aggregate {} ({} disks{})",
            request.name,
            destination.id,
            quoted.aggregate_name,
            quoted.num_of_disks,
            if quoted.new_aggregate { ", new aggregate" } else { "" }
        );

        Ok(QuotePlan {
            request,
            advanced_mode: false,
            aggregate_name: Some(quoted.aggregate_name),
            disk_count_approval: Some(quoted.num_of_disks),
        })
    }

    async fn inherit_performance(
        &self,
        source: &EnvironmentDescriptor,
        volume: &VolumeDescriptor,
    ) -> InheritedPerformance {
        let Some(name) = volume.aggregate_name.as_deref() else {
            return InheritedPerformance::default();
        };

        match self.aggregates.find(source, name).await {
            Ok(aggregate) => InheritedPerformance::from_aggregate(&aggregate),
            Err(e) => {
                warn!(
                    "Aggregate lookup for {} on {} failed, not inheriting performance: {}",
                    name, source.id, e
                );
                InheritedPerformance::default()
            }
        }
    }
}
