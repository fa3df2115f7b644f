//! Network Adjacency Discovery
//!
//! Finds the intercluster endpoints two environments replicate over.

use crate::controlplane::client::wire::{addresses, InterclusterLifsWire};
use crate::domain::model::EnvironmentDescriptor;
use crate::domain::ports::{ApiRequest, ControlPlaneTransportRef};
use crate::error::{Error, Result};
use tracing::debug;
use urlencoding::encode;

const INTERCLUSTER_LIFS_PATH: &str = "/occm/api/replication/intercluster-lifs";

/// Intercluster endpoints on both sides of a replication path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkEndpoints {
    pub source_endpoints: Vec<String>,
    pub destination_endpoints: Vec<String>,
}

impl NetworkEndpoints {
    /// Active transport addresses: the first endpoint on each side.
    ///
    /// Multi-homed topologies are not load-balanced.
    pub fn active_pair(&self) -> (Vec<String>, Vec<String>) {
        (
            self.source_endpoints.iter().take(1).cloned().collect(),
            self.destination_endpoints.iter().take(1).cloned().collect(),
        )
    }
}

pub struct NetworkDiscovery {
    transport: ControlPlaneTransportRef,
}

impl NetworkDiscovery {
    pub fn new(transport: ControlPlaneTransportRef) -> Self {
        Self { transport }
    }

    pub async fn discover(
        &self,
        source: &EnvironmentDescriptor,
        destination: &EnvironmentDescriptor,
    ) -> Result<NetworkEndpoints> {
        let operation = "discover intercluster endpoints";
        let path = format!(
            "{}?peerWorkingEnvironmentId={}&workingEnvironmentId={}",
            INTERCLUSTER_LIFS_PATH,
            encode(&source.id),
            encode(&destination.id)
        );

        let response = self
            .transport
            .call(ApiRequest::get(path))
            .await?
            .ensure_success(operation)?;
        let wire: InterclusterLifsWire = response.json(operation)?;
        let status = response.status;

        let endpoints = NetworkEndpoints {
            source_endpoints: addresses(operation, status, wire.peer_inter_cluster_lifs)?,
            destination_endpoints: addresses(operation, status, wire.inter_cluster_lifs)?,
        };

        if endpoints.source_endpoints.is_empty() || endpoints.destination_endpoints.is_empty() {
            return Err(Error::NetworkPathNotFound {
                source_env: source.id.clone(),
                destination_env: destination.id.clone(),
            });
        }

        debug!(
            "Intercluster endpoints {} -> {}: {:?} -> {:?}",
            source.id, destination.id, endpoints.source_endpoints, endpoints.destination_endpoints
        );
        Ok(endpoints)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{CloudProvider, EnvironmentCategory};
    use crate::domain::ports::HttpMethod;
    use crate::testing::{self, FakeControlPlane};
    use assert_matches::assert_matches;
    use std::sync::Arc;

    fn env(id: &str) -> EnvironmentDescriptor {
        EnvironmentDescriptor {
            id: id.into(),
            name: id.into(),
            category: EnvironmentCategory::CloudManaged(CloudProvider::Aws),
            svm_name: "svm".into(),
        }
    }

    const PATH: &str =
        "/occm/api/replication/intercluster-lifs?peerWorkingEnvironmentId=env-A&workingEnvironmentId=env-B";

    #[tokio::test]
    async fn test_discover_uses_first_endpoint_pair() {
        let fake = Arc::new(FakeControlPlane::new());
        fake.on_json(
            HttpMethod::Get,
            PATH,
            testing::lifs(&["10.0.0.1", "10.0.0.2"], &["10.1.0.1"]),
        );

        let endpoints = NetworkDiscovery::new(fake.clone())
            .discover(&env("env-A"), &env("env-B"))
            .await
            .unwrap();

        assert_eq!(endpoints.source_endpoints.len(), 2);
        let (source, destination) = endpoints.active_pair();
        assert_eq!(source, vec!["10.0.0.1".to_string()]);
        assert_eq!(destination, vec!["10.1.0.1".to_string()]);
    }

    #[tokio::test]
    async fn test_empty_side_is_no_path() {
        let fake = Arc::new(FakeControlPlane::new());
        fake.on_json(HttpMethod::Get, PATH, testing::lifs(&["10.0.0.1"], &[]));

        let result = NetworkDiscovery::new(fake.clone())
            .discover(&env("env-A"), &env("env-B"))
            .await;
        assert_matches!(result, Err(Error::NetworkPathNotFound { .. }));
    }
}
