//! In-memory control plane for unit tests

use crate::domain::ports::{ApiRequest, ApiResponse, ControlPlaneTransport, HttpMethod};
use crate::error::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};

/// Serves canned responses per `(method, path)` and records every call.
///
/// A route answers its queued responses in order; the last one is sticky.
/// Unknown routes answer 404.
#[derive(Default)]
pub(crate) struct FakeControlPlane {
    routes: Mutex<HashMap<(HttpMethod, String), VecDeque<ApiResponse>>>,
    calls: Mutex<Vec<ApiRequest>>,
}

impl FakeControlPlane {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn on(&self, method: HttpMethod, path: &str, response: ApiResponse) -> &Self {
        self.routes
            .lock()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(response);
        self
    }

    pub(crate) fn on_json(&self, method: HttpMethod, path: &str, body: Value) -> &Self {
        self.on(method, path, ApiResponse::new(200, body.to_string()))
    }

    pub(crate) fn calls(&self) -> Vec<ApiRequest> {
        self.calls.lock().clone()
    }

    pub(crate) fn calls_to(&self, method: HttpMethod, path_prefix: &str) -> Vec<ApiRequest> {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.method == method && c.path.starts_with(path_prefix))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ControlPlaneTransport for FakeControlPlane {
    async fn call(&self, request: ApiRequest) -> Result<ApiResponse> {
        self.calls.lock().push(request.clone());

        let mut routes = self.routes.lock();
        let response = match routes.get_mut(&(request.method, request.path.clone())) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        };

        Ok(response.unwrap_or_else(|| {
            ApiResponse::new(
                404,
                json!({ "message": format!("no route for {} {}", request.method, request.path) })
                    .to_string(),
            )
        }))
    }
}

// =============================================================================
// Fixtures
// =============================================================================

pub(crate) fn aws_environment(id: &str, name: &str, svm: &str) -> Value {
    json!({
        "publicId": id,
        "name": name,
        "svmName": svm,
        "cloudProviderName": "Amazon",
        "workingEnvironmentType": "VSA",
    })
}

pub(crate) fn on_prem_environment(id: &str, name: &str, svm: &str) -> Value {
    json!({
        "publicId": id,
        "name": name,
        "svmName": svm,
        "workingEnvironmentType": "ON_PREM",
    })
}

pub(crate) fn managed_file_system(id: &str, name: &str, svm: &str) -> Value {
    json!({ "id": id, "name": name, "svmName": svm })
}

pub(crate) fn volume(name: &str, svm: &str, aggregate: &str) -> Value {
    json!({
        "name": name,
        "svmName": svm,
        "size": { "size": 100.0, "unit": "GB" },
        "snapshotPolicy": "default",
        "deduplication": true,
        "thinProvisioning": true,
        "compression": false,
        "aggregateName": aggregate,
        "providerVolumeType": "gp2",
    })
}

pub(crate) fn aggregate(name: &str, disk_type: &str, iops: u64, throughput: u64) -> Value {
    json!({
        "name": name,
        "providerVolumes": [
            { "diskType": disk_type, "iops": iops, "throughput": throughput }
        ],
    })
}

pub(crate) fn lifs(source: &[&str], destination: &[&str]) -> Value {
    let wrap = |addrs: &[&str]| -> Vec<Value> {
        addrs.iter().map(|a| json!({ "address": a })).collect()
    };
    json!({
        "interClusterLifs": wrap(destination),
        "peerInterClusterLifs": wrap(source),
    })
}

pub(crate) fn job_status(status: i32, error: Option<&str>) -> ApiResponse {
    ApiResponse::new(200, json!({ "status": status, "error": error }).to_string())
}

pub(crate) fn accepted(request_id: &str) -> ApiResponse {
    ApiResponse::new(202, "").with_request_id(request_id)
}
