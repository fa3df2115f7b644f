//! reqwest-backed control plane transport

use super::token::TokenCache;
use crate::config::ClientConfig;
use crate::domain::ports::{ApiHost, ApiRequest, ApiResponse, ControlPlaneTransport, HttpMethod};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// Header carrying the job handle of asynchronous calls
pub const REQUEST_ID_HEADER: &str = "OnCloud-Request-Id";

/// Header identifying the connector agent
pub const AGENT_ID_HEADER: &str = "x-agent-id";

/// HTTP client for the control plane
pub struct HttpControlPlaneClient {
    http: reqwest::Client,
    config: ClientConfig,
    tokens: Arc<TokenCache>,
}

impl HttpControlPlaneClient {
    pub fn new(config: ClientConfig, tokens: Arc<TokenCache>) -> Result<Self> {
        config.validate()?;
        let http = reqwest::Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            http,
            config,
            tokens,
        })
    }

    fn url(&self, host: ApiHost, path: &str) -> String {
        let base = match host {
            ApiHost::Connector => &self.config.connector_url,
            ApiHost::Services => &self.config.services_url,
        };
        format!("{}{}", base.trim_end_matches('/'), path)
    }

    async fn send(&self, request: &ApiRequest, token: &str) -> Result<ApiResponse> {
        let url = self.url(request.host, &request.path);
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.http.request(method, &url).bearer_auth(token);
        if let Some(agent_id) = &self.config.agent_id {
            builder = builder.header(AGENT_ID_HEADER, agent_id);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let request_id = response
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let body = response.text().await?;

        debug!("{} {} -> {}", request.method, url, status);

        Ok(ApiResponse {
            status,
            body,
            request_id,
        })
    }
}

#[async_trait]
impl ControlPlaneTransport for HttpControlPlaneClient {
    async fn call(&self, request: ApiRequest) -> Result<ApiResponse> {
        let token = self.tokens.access_token().await?;
        let response = self.send(&request, &token).await?;
        if response.status != 401 {
            return Ok(response);
        }

        warn!(
            "{} {} rejected the access token, refreshing once",
            request.method, request.path
        );
        self.tokens.invalidate_if(&token);
        let token = self.tokens.access_token().await?;
        self.send(&request, &token).await
    }
}
