use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::{ApiError, RunError};
use crate::types::{
    AllocatorOverview, ClusterHealthRecord, ClusterStatsRecord, Config, Credentials, Deployment,
    DeploymentDetails, DeploymentList, PlatformInfo,
};

const MAX_ERROR_BODY: usize = 512;

/// Authenticated client for the ECE control-plane API and the
/// Elasticsearch endpoints it exposes. One attempt per call.
pub struct CloudApiClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Credentials,
}

impl CloudApiClient {
    pub fn new(config: &Config) -> Result<Self, RunError> {
        let mut builder = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.request_timeout);

        if !config.verify_ssl {
            warn!("VERIFY_SSL is off - TLS certificate verification disabled");
            builder = builder.danger_accept_invalid_certs(true);
        }

        let http = builder.build().map_err(|e| RunError::Client(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.host.clone(),
            credentials: config.credentials.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn list_deployments(&self) -> Result<Vec<Deployment>, ApiError> {
        let url = format!("{}/api/v1/deployments", self.base_url);
        let list: DeploymentList = self.get_json(&url).await?;
        Ok(list.deployments)
    }

    pub async fn get_platform_info(&self) -> Result<PlatformInfo, ApiError> {
        let url = format!("{}/api/v1/platform", self.base_url);
        self.get_json(&url).await
    }

    pub async fn get_allocator_stats(&self) -> Result<AllocatorOverview, ApiError> {
        let url = format!("{}/api/v1/platform/infrastructure/allocators", self.base_url);
        self.get_json(&url).await
    }

    pub async fn get_deployment_details(&self, deployment_id: &str) -> Result<DeploymentDetails, ApiError> {
        let url = format!(
            "{}/api/v1/deployments/{}?show_metadata=true",
            self.base_url, deployment_id
        );
        self.get_json(&url).await
    }

    pub async fn get_cluster_health(&self, es_endpoint: &str) -> Result<ClusterHealthRecord, ApiError> {
        let url = format!("{}/_cluster/health", es_endpoint.trim_end_matches('/'));
        self.get_json(&url).await
    }

    pub async fn get_cluster_stats(&self, es_endpoint: &str) -> Result<ClusterStatsRecord, ApiError> {
        let url = format!("{}/_cluster/stats", es_endpoint.trim_end_matches('/'));
        self.get_json(&url).await
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.credentials {
            Credentials::ApiKey(key) => req.header(AUTHORIZATION, format!("ApiKey {}", key)),
            Credentials::Basic { username, password } => req.basic_auth(username, Some(password)),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        debug!("GET {}", url);
        let req = self.authorize(self.http.get(url).header(ACCEPT, "application/json"));
        let response = req.send().await.map_err(|e| transport_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(url, status, body));
        }

        let body = response.text().await.map_err(|e| transport_error(url, e))?;
        serde_json::from_str(&body).map_err(|e| ApiError::InvalidResponse {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

fn transport_error(url: &str, e: reqwest::Error) -> ApiError {
    let message = if e.is_timeout() {
        format!("request timed out: {}", e)
    } else if e.is_connect() {
        format!("connection failed: {}", e)
    } else {
        e.to_string()
    };
    ApiError::Transient {
        url: url.to_string(),
        status: None,
        message,
    }
}

pub(crate) fn classify_status(url: &str, status: StatusCode, body: String) -> ApiError {
    let url = url.to_string();
    let body = truncate(body);
    match status.as_u16() {
        401 | 403 => ApiError::Authentication {
            url,
            status: status.as_u16(),
        },
        404 => ApiError::NotFound { url },
        408 | 429 => ApiError::Transient {
            url,
            status: Some(status.as_u16()),
            message: format!("HTTP {}", status),
        },
        code if code >= 500 => ApiError::Transient {
            url,
            status: Some(code),
            message: if body.is_empty() {
                format!("HTTP {}", status)
            } else {
                format!("HTTP {} - {}", status, body)
            },
        },
        code => ApiError::UnexpectedStatus {
            url,
            status: code,
            body,
        },
    }
}

fn truncate(mut body: String) -> String {
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
        body.push_str("...");
    }
    body
}
