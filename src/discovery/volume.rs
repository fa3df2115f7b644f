//! Volume Locator
//!
//! Finds a named volume within an environment. Each environment category
//! lists volumes through its own endpoint; the selection rule is shared.

use crate::controlplane::client::wire::VolumeWire;
use crate::domain::model::{EnvironmentDescriptor, VolumeDescriptor};
use crate::domain::ports::{ApiRequest, ControlPlaneTransportRef};
use crate::error::{Error, Result};
use tracing::debug;
use urlencoding::encode;

pub struct VolumeLocator {
    transport: ControlPlaneTransportRef,
}

impl VolumeLocator {
    pub fn new(transport: ControlPlaneTransportRef) -> Self {
        Self { transport }
    }

    pub async fn locate(
        &self,
        environment: &EnvironmentDescriptor,
        volume_name: &str,
        expected_svm: Option<&str>,
    ) -> Result<VolumeDescriptor> {
        let operation = "list volumes";
        let path = format!(
            "{}/volumes?workingEnvironmentId={}",
            environment.api_prefix(),
            encode(&environment.id)
        );

        let response = self
            .transport
            .call(ApiRequest::get(path))
            .await?
            .ensure_success(operation)?;
        let candidates = response
            .json::<Vec<VolumeWire>>(operation)?
            .into_iter()
            .map(|v| v.into_descriptor(operation, response.status))
            .collect::<Result<Vec<_>>>()?;

        let volume = select_volume(candidates, volume_name, expected_svm).ok_or_else(|| {
            Error::VolumeNotFound {
                environment: environment.id.clone(),
                volume: volume_name.to_string(),
                svm: expected_svm.map(String::from),
            }
        })?;

        debug!(
            "Located volume {} on svm {} in {} ({} {})",
            volume.name, volume.svm_name, environment.id, volume.size.size, volume.size.unit
        );
        Ok(volume)
    }
}

/// First candidate named `name`, rejected if it lives on another SVM
pub fn select_volume(
    candidates: Vec<VolumeDescriptor>,
    name: &str,
    expected_svm: Option<&str>,
) -> Option<VolumeDescriptor> {
    let candidate = candidates.into_iter().find(|v| v.name == name)?;
    match expected_svm {
        Some(svm) if svm != candidate.svm_name => None,
        _ => Some(candidate),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{CloudProvider, EnvironmentCategory};
    use crate::domain::ports::HttpMethod;
    use crate::testing::{self, FakeControlPlane};
    use assert_matches::assert_matches;
    use serde_json::json;
    use std::sync::Arc;

    fn env(id: &str, category: EnvironmentCategory) -> EnvironmentDescriptor {
        EnvironmentDescriptor {
            id: id.into(),
            name: id.into(),
            category,
            svm_name: "svm1".into(),
        }
    }

    #[tokio::test]
    async fn test_cloud_and_on_prem_use_distinct_endpoints() {
        let fake = Arc::new(FakeControlPlane::new());
        fake.on_json(
            HttpMethod::Get,
            "/occm/api/vsa/volumes?workingEnvironmentId=env-A",
            json!([testing::volume("vol1", "svm1", "aggr1")]),
        );
        fake.on_json(
            HttpMethod::Get,
            "/occm/api/onprem/volumes?workingEnvironmentId=env-B",
            json!([testing::volume("vol1", "svm1", "aggr1")]),
        );
        let locator = VolumeLocator::new(fake.clone());

        let cloud = env("env-A", EnvironmentCategory::CloudManaged(CloudProvider::Aws));
        let volume = locator.locate(&cloud, "vol1", None).await.unwrap();
        assert_eq!(volume.svm_name, "svm1");
        assert!(volume.dedup_enabled);

        let on_prem = env("env-B", EnvironmentCategory::OnPremises);
        locator.locate(&on_prem, "vol1", Some("svm1")).await.unwrap();

        assert_eq!(fake.calls_to(HttpMethod::Get, "/occm/api/vsa/volumes").len(), 1);
        assert_eq!(fake.calls_to(HttpMethod::Get, "/occm/api/onprem/volumes").len(), 1);
    }

    #[tokio::test]
    async fn test_azure_volumes_endpoint() {
        let fake = Arc::new(FakeControlPlane::new());
        fake.on_json(
            HttpMethod::Get,
            "/occm/api/azure/vsa/volumes?workingEnvironmentId=env-Z",
            json!([testing::volume("data", "svm_z", "aggr1")]),
        );

        let azure = env("env-Z", EnvironmentCategory::CloudManaged(CloudProvider::Azure));
        let volume = VolumeLocator::new(fake.clone())
            .locate(&azure, "data", None)
            .await
            .unwrap();
        assert_eq!(volume.name, "data");
    }

    #[tokio::test]
    async fn test_svm_mismatch_rejects_first_match() {
        let fake = Arc::new(FakeControlPlane::new());
        fake.on_json(
            HttpMethod::Get,
            "/occm/api/vsa/volumes?workingEnvironmentId=env-A",
            json!([
                testing::volume("vol1", "svm_other", "aggr1"),
                testing::volume("vol1", "svm1", "aggr1"),
            ]),
        );

        let cloud = env("env-A", EnvironmentCategory::CloudManaged(CloudProvider::Aws));
        let result = VolumeLocator::new(fake.clone())
            .locate(&cloud, "vol1", Some("svm1"))
            .await;
        assert_matches!(result, Err(Error::VolumeNotFound { svm: Some(_), .. }));
    }

    #[tokio::test]
    async fn test_missing_volume() {
        let fake = Arc::new(FakeControlPlane::new());
        fake.on_json(
            HttpMethod::Get,
            "/occm/api/vsa/volumes?workingEnvironmentId=env-A",
            json!([testing::volume("other", "svm1", "aggr1")]),
        );

        let cloud = env("env-A", EnvironmentCategory::CloudManaged(CloudProvider::Aws));
        let result = VolumeLocator::new(fake.clone()).locate(&cloud, "vol1", None).await;
        assert_matches!(result, Err(Error::VolumeNotFound { svm: None, .. }));
    }
}
