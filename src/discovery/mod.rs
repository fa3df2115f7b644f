//! Discovery Module
//!
//! Read-only lookups against the control plane:
//! - Environment resolution (id or unique name)
//! - Intercluster network endpoints between two environments
//! - Volume location within an environment
//! - Aggregate lookup for performance inheritance

pub mod aggregate;
pub mod environment;
pub mod network;
pub mod volume;

pub use aggregate::AggregateLookup;
pub use environment::EnvironmentResolver;
pub use network::{NetworkDiscovery, NetworkEndpoints};
pub use volume::VolumeLocator;
