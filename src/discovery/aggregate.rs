//! Aggregate lookup

use crate::controlplane::client::wire::AggregateWire;
use crate::domain::model::{AggregateDescriptor, EnvironmentDescriptor};
use crate::domain::ports::{ApiRequest, ControlPlaneTransportRef};
use crate::error::{Error, Result};
use urlencoding::encode;

pub struct AggregateLookup {
    transport: ControlPlaneTransportRef,
}

impl AggregateLookup {
    pub fn new(transport: ControlPlaneTransportRef) -> Self {
        Self { transport }
    }

    /// Find the aggregate named `name` in `environment`
    pub async fn find(
        &self,
        environment: &EnvironmentDescriptor,
        name: &str,
    ) -> Result<AggregateDescriptor> {
        let operation = "list aggregates";
        let path = format!(
            "{}/aggregates?workingEnvironmentId={}",
            environment.api_prefix(),
            encode(&environment.id)
        );

        let response = self
            .transport
            .call(ApiRequest::get(path))
            .await?
            .ensure_success(operation)?;

        response
            .json::<Vec<AggregateWire>>(operation)?
            .into_iter()
            .find(|aggr| aggr.name == name)
            .ok_or_else(|| Error::AggregateNotFound {
                environment: environment.id.clone(),
                aggregate: name.to_string(),
            })?
            .into_descriptor(operation, response.status)
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

    fn gcp_env() -> EnvironmentDescriptor {
        EnvironmentDescriptor {
            id: "env-G".into(),
            name: "gcp".into(),
            category: EnvironmentCategory::CloudManaged(CloudProvider::Gcp),
            svm_name: "svm_g".into(),
        }
    }

    #[tokio::test]
    async fn test_find_by_name() {
        let fake = Arc::new(FakeControlPlane::new());
        fake.on_json(
            HttpMethod::Get,
            "/occm/api/gcp/vsa/aggregates?workingEnvironmentId=env-G",
            json!([
                testing::aggregate("aggr0", "pd-ssd", 0, 0),
                testing::aggregate("aggr1", "pd-standard", 0, 0),
            ]),
        );

        let aggr = AggregateLookup::new(fake.clone())
            .find(&gcp_env(), "aggr1")
            .await
            .unwrap();
        assert_eq!(aggr.primary_provider_volume().unwrap().disk_type, "pd-standard");

        let missing = AggregateLookup::new(fake.clone()).find(&gcp_env(), "aggr9").await;
        assert_matches!(missing, Err(Error::AggregateNotFound { .. }));
    }
}
