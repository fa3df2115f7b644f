//! Replication Operator - Cross-Environment Volume Replication
//!
//! Provisions and tears down volume replication relationships between cloud,
//! on-premises and managed file-system environments, driving an asynchronous
//! remote control plane from request to finished job.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────────┐
//! │                       Replication Orchestrator                               │
//! │                  create  /  read  /  delete  (+ metrics)                     │
//! ├──────────────────────────────────────┬──────────────────────────────────────┤
//! │        Provisioning Workflow         │          Teardown Workflow           │
//! │  resolve → discover → locate →       │  resolve → delete → poll             │
//! │  quote → select target → submit →    │                                      │
//! │  poll                                │                                      │
//! ├──────────────┬──────────────┬────────┴───────┬──────────────┬───────────────┤
//! │ Environment  │   Network    │    Volume      │    Quote     │   Async Job   │
//! │  Resolver    │  Discovery   │    Locator     │    Engine    │    Poller     │
//! ├──────────────┴──────────────┴────────────────┴──────────────┴───────────────┤
//! │                    ControlPlaneTransport (port)                              │
//! │  ┌────────────────────────────────┐  ┌───────────────────────────────────┐  │
//! │  │     HttpControlPlaneClient     │  │  TokenCache (single-flight        │  │
//! │  │     (reqwest, typed wire)      │  │  refresh, RefreshTokenSource)     │  │
//! │  └────────────────────────────────┘  └───────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`controlplane`]: HTTP client, provisioning and teardown workflows, orchestrator
//! - [`discovery`]: Environment, network, volume and aggregate lookups
//! - [`sizing`]: Destination quote planning
//! - [`jobs`]: Asynchronous job polling
//! - [`domain`]: Core domain types and ports
//! - [`config`]: Client and workflow configuration
//! - [`metrics`]: Prometheus instruments
//! - [`error`]: Error types and handling

pub mod config;
pub mod controlplane;
pub mod discovery;
pub mod domain;
pub mod error;
pub mod jobs;
pub mod metrics;
pub mod sizing;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use config::{ClientConfig, OperatorConfig, WorkflowConfig};

pub use controlplane::{
    HttpControlPlaneClient, ProvisioningWorkflow, RefreshTokenSource, ReplicationOrchestrator,
    TeardownWorkflow, TokenCache, WorkflowStage,
};

pub use discovery::{
    AggregateLookup, EnvironmentResolver, NetworkDiscovery, NetworkEndpoints, VolumeLocator,
};

pub use domain::model::{
    AggregateDescriptor, AsyncJob, CloudProvider, DestinationTarget, EnvironmentCategory,
    EnvironmentDescriptor, EnvironmentRef, JobState, QuotePlan, QuoteRequest, ReplicationRecord,
    ReplicationRequest, ReplicationSpec, ReplicationStatusEntry, ReplicationVolume,
    VolumeDescriptor,
};

pub use domain::ports::{
    AccessToken, ApiHost, ApiRequest, ApiResponse, ControlPlaneTransport,
    ControlPlaneTransportRef, HttpMethod, TokenSource, TokenSourceRef,
};

pub use error::{Error, Result};

pub use jobs::JobPoller;

pub use metrics::{Outcome, WorkflowMetrics};

pub use sizing::{InheritedPerformance, QuoteEngine};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
