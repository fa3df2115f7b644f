//! Control Plane Module
//!
//! The HTTP client for the remote control plane, and the workflows that
//! drive replication relationships through it.

pub mod client;
pub mod orchestrator;
pub mod provisioning;
pub mod teardown;

pub use client::{HttpControlPlaneClient, RefreshTokenSource, TokenCache};
pub use orchestrator::ReplicationOrchestrator;
pub use provisioning::{ProvisioningWorkflow, WorkflowStage};
pub use teardown::TeardownWorkflow;
