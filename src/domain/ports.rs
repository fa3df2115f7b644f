//! Domain Ports - Core trait definitions for the replication operator
//!
//! These traits define the boundaries between the workflows and the remote
//! control plane. Adapters implement these traits to provide concrete
//! functionality.

use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// =============================================================================
// Request/Response
// =============================================================================

/// HTTP methods used against the control plane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Delete,
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HttpMethod::Get => write!(f, "GET"),
            HttpMethod::Post => write!(f, "POST"),
            HttpMethod::Delete => write!(f, "DELETE"),
        }
    }
}

/// Which control-plane host serves a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiHost {
    /// Connector API (environments, volumes, replication, jobs)
    Connector,
    /// Hosted services API (managed file systems)
    Services,
}

/// A single control-plane call
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: HttpMethod,
    pub path: String,
    pub body: Option<serde_json::Value>,
    pub host: ApiHost,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            path: path.into(),
            body: None,
            host: ApiHost::Connector,
        }
    }

    pub fn post(path: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            method: HttpMethod::Post,
            path: path.into(),
            body: Some(body),
            host: ApiHost::Connector,
        }
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Delete,
            path: path.into(),
            body: None,
            host: ApiHost::Connector,
        }
    }

    pub fn on(mut self, host: ApiHost) -> Self {
        self.host = host;
        self
    }
}

/// Raw control-plane response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
    /// Job handle returned by asynchronous endpoints
    pub request_id: Option<String>,
}

/// Error payload the control plane attaches to failed calls
#[derive(Debug, Deserialize)]
struct RemoteErrorBody {
    message: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            request_id: None,
        }
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Map a non-2xx response to a typed error for `operation`
    pub fn ensure_success(self, operation: &str) -> Result<Self> {
        if self.is_success() {
            return Ok(self);
        }

        let message = serde_json::from_str::<RemoteErrorBody>(&self.body)
            .map(|body| body.message)
            .unwrap_or_else(|_| truncate(&self.body, 512));

        if self.status >= 500 {
            Err(Error::RemoteServer {
                operation: operation.to_string(),
                status: self.status,
                message,
            })
        } else {
            Err(Error::RemoteValidation {
                operation: operation.to_string(),
                status: self.status,
                message,
            })
        }
    }

    /// Decode the body, rejecting unexpected shapes
    pub fn json<T: DeserializeOwned>(&self, operation: &str) -> Result<T> {
        serde_json::from_str(&self.body).map_err(|e| Error::RemoteValidation {
            operation: operation.to_string(),
            status: self.status,
            message: format!("unexpected response shape: {}", e),
        })
    }

    /// Job handle of an asynchronous call
    pub fn require_request_id(&self, operation: &str) -> Result<String> {
        self.request_id
            .clone()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| Error::RemoteValidation {
                operation: operation.to_string(),
                status: self.status,
                message: "response carries no job request id".to_string(),
            })
    }
}

fn truncate(body: &str, max: usize) -> String {
    if body.len() <= max {
        return body.to_string();
    }
    let mut end = max;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}

// =============================================================================
// Control Plane Transport Port
// =============================================================================

/// Port for issuing calls against the control plane
///
/// Implementations own authentication: every call carries a token obtained
/// for that call alone.
#[async_trait]
pub trait ControlPlaneTransport: Send + Sync {
    async fn call(&self, request: ApiRequest) -> Result<ApiResponse>;
}

// =============================================================================
// Token Source Port
// =============================================================================

/// Bearer token with its expiry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

/// Port for acquiring fresh access tokens
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn fetch_token(&self) -> Result<AccessToken>;
}

// =============================================================================
// Type Aliases for Arc'd Traits
// =============================================================================

pub type ControlPlaneTransportRef = Arc<dyn ControlPlaneTransport>;
pub type TokenSourceRef = Arc<dyn TokenSource>;

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_ensure_success_maps_status() {
        let ok = ApiResponse::new(200, "[]");
        assert!(ok.ensure_success("list volumes").is_ok());

        let rejected = ApiResponse::new(400, r#"{"message":"policy unknown"}"#);
        assert_matches!(
            rejected.ensure_success("create replication"),
            Err(Error::RemoteValidation { status: 400, ref message, .. }) if message == "policy unknown"
        );

        let failed = ApiResponse::new(502, "bad gateway");
        assert_matches!(
            failed.ensure_success("create replication"),
            Err(Error::RemoteServer { status: 502, ref message, .. }) if message == "bad gateway"
        );
    }

    #[test]
    fn test_json_rejects_unexpected_shape() {
        #[derive(Debug, Deserialize)]
        struct Shape {
            #[allow(dead_code)]
            name: String,
        }

        let response = ApiResponse::new(200, r#"{"other": 1}"#);
        assert_matches!(
            response.json::<Shape>("read"),
            Err(Error::RemoteValidation { .. })
        );
    }

    #[test]
    fn test_request_id_required() {
        let response = ApiResponse::new(202, "");
        assert_matches!(
            response.require_request_id("create replication"),
            Err(Error::RemoteValidation { .. })
        );

        let response = ApiResponse::new(202, "").with_request_id("req-1");
        assert_eq!(response.require_request_id("create replication").unwrap(), "req-1");
    }

    #[test]
    fn test_http_method_display() {
        assert_eq!(format!("{}", HttpMethod::Get), "GET");
        assert_eq!(format!("{}", HttpMethod::Delete), "DELETE");
    }
}
