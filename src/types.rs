use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ApiError, ErrorKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    ApiKey(String),
    Basic { username: String, password: String },
}

impl Credentials {
    pub fn scheme(&self) -> &'static str {
        match self {
            Credentials::ApiKey(_) => "api-key",
            Credentials::Basic { .. } => "basic",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub credentials: Credentials,
    pub verify_ssl: bool,
    pub output_file: Option<String>,
    pub deployment_filter: String,
    pub request_timeout: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportStyle {
    Full,
    Simple,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HealthStatus {
    Green,
    Yellow,
    Red,
    Unknown,
}

impl HealthStatus {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "green" => HealthStatus::Green,
            "yellow" => HealthStatus::Yellow,
            "red" => HealthStatus::Red,
            _ => HealthStatus::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            HealthStatus::Green => "GREEN",
            HealthStatus::Yellow => "YELLOW",
            HealthStatus::Red => "RED",
            HealthStatus::Unknown => "UNKNOWN",
        }
    }
}

// Control-plane payloads. Each keeps the fields it does not model in
// `extra` so the JSON dump reproduces what the API returned.

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlatformInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub regions: Vec<RegionInfo>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegionInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runners: Option<RunnersInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxies: Option<ProxiesInfo>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunnersInfo {
    #[serde(default)]
    pub healthy_runners: u64,
    #[serde(default)]
    pub total_runners: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProxiesInfo {
    #[serde(default)]
    pub proxies_count: u64,
    #[serde(default)]
    pub healthy: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AllocatorOverview {
    #[serde(default)]
    pub zones: Vec<AllocatorZone>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AllocatorZone {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allocators: Vec<AllocatorStat>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AllocatorStat {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allocator_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<AllocatorStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<AllocatorCapacity>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub instances: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AllocatorStatus {
    #[serde(default)]
    pub healthy: bool,
    #[serde(default)]
    pub connected: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Allocator capacity, in MB.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AllocatorCapacity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<CapacityUsage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<CapacityUsage>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CapacityUsage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub used: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeploymentList {
    #[serde(default)]
    pub deployments: Vec<Deployment>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Deployment {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub healthy: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<ResourceRef>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Deployment {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().filter(|n| !n.is_empty()).unwrap_or(&self.id)
    }

    /// Region of the first resource that reports one.
    pub fn region(&self) -> Option<&str> {
        self.resources.iter().find_map(|r| r.region.as_deref())
    }

    pub fn elasticsearch_refs(&self) -> impl Iterator<Item = &ResourceRef> {
        self.resources
            .iter()
            .filter(|r| r.kind.as_deref() == Some("elasticsearch"))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ref_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Full deployment document from `GET /api/v1/deployments/{id}`.
///
/// The document is deep and varies between platform versions, so it is
/// kept as raw JSON and read through accessors in `metrics::deployments`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeploymentDetails(pub Value);

// Data-plane payloads from the deployment's Elasticsearch endpoint.

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterHealthRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_name: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub number_of_nodes: u64,
    #[serde(default)]
    pub number_of_data_nodes: u64,
    #[serde(default)]
    pub active_primary_shards: u64,
    #[serde(default)]
    pub active_shards: u64,
    #[serde(default)]
    pub relocating_shards: u64,
    #[serde(default)]
    pub initializing_shards: u64,
    #[serde(default)]
    pub unassigned_shards: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ClusterHealthRecord {
    pub fn health(&self) -> HealthStatus {
        HealthStatus::parse(&self.status)
    }

    /// The reported status upper-cased, so values outside green/yellow/red
    /// still show as sent.
    pub fn status_label(&self) -> String {
        match self.status.trim() {
            "" => HealthStatus::Unknown.label().to_string(),
            s => s.to_uppercase(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterStatsRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default)]
    pub indices: IndicesStats,
    #[serde(default)]
    pub nodes: NodesStats,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicesStats {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub docs: DocsStats,
    #[serde(default)]
    pub store: StoreStats,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocsStats {
    #[serde(default)]
    pub count: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreStats {
    #[serde(default)]
    pub size_in_bytes: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodesStats {
    #[serde(default)]
    pub count: NodeCount,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeCount {
    #[serde(default)]
    pub total: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Why a resource could not be collected. Serializes in the same shape
/// the API error objects take in the JSON dump.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchFailure {
    pub resource: String,
    pub error: ErrorKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    pub details: String,
}

impl FetchFailure {
    pub fn from_api_error(resource: &str, err: &ApiError) -> Self {
        Self {
            resource: resource.to_string(),
            error: err.kind(),
            status_code: err.status(),
            details: err.to_string(),
        }
    }

    pub fn not_ready(resource: &str, reason: &str) -> Self {
        Self {
            resource: resource.to_string(),
            error: ErrorKind::NotReady,
            status_code: None,
            details: reason.to_string(),
        }
    }
}

/// A platform-wide section that either came back or failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Section<T> {
    Collected(T),
    Failed(FetchFailure),
}

impl<T> Section<T> {
    pub fn collected(&self) -> Option<&T> {
        match self {
            Section::Collected(v) => Some(v),
            Section::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&FetchFailure> {
        match self {
            Section::Collected(_) => None,
            Section::Failed(f) => Some(f),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeploymentRecord {
    #[serde(flatten)]
    pub deployment: Deployment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<DeploymentDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elasticsearch_endpoint: Option<String>,
    #[serde(rename = "elasticsearch_cluster_health", skip_serializing_if = "Option::is_none")]
    pub health: Option<ClusterHealthRecord>,
    #[serde(rename = "elasticsearch_cluster_stats", skip_serializing_if = "Option::is_none")]
    pub stats: Option<ClusterStatsRecord>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FetchFailure>,
}

impl DeploymentRecord {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty() && self.health.is_some() && self.stats.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub collected_at: DateTime<Utc>,
    pub host: String,
    pub platform_info: Section<PlatformInfo>,
    pub allocators: Section<AllocatorOverview>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployment_list_error: Option<FetchFailure>,
    #[serde(rename = "deployments_details")]
    pub deployments: Vec<DeploymentRecord>,
}

impl MetricsSnapshot {
    pub fn failed_deployments(&self) -> usize {
        self.deployments.iter().filter(|d| !d.is_success()).count()
    }

    /// True when any section or deployment could not be collected.
    pub fn has_failures(&self) -> bool {
        self.platform_info.failure().is_some()
            || self.allocators.failure().is_some()
            || self.deployment_list_error.is_some()
            || self.failed_deployments() > 0
    }
}
