use std::collections::BTreeMap;

use serde_json::Value;

use crate::parsing::mb_to_gb;
use crate::types::{DeploymentDetails, DeploymentRecord, HealthStatus};

/// Value ECE reports in `cluster_id` before the cluster has been created.
pub const PLACEHOLDER_CLUSTER_ID: &str = "cluster_id";

pub const HEALTH_RESOURCE: &str = "elasticsearch_cluster_health";
pub const STATS_RESOURCE: &str = "elasticsearch_cluster_stats";
pub const DETAILS_RESOURCE: &str = "details";
/// Recorded when no ready Elasticsearch endpoint was found; health was never fetched.
pub const ENDPOINT_RESOURCE: &str = "elasticsearch_endpoint";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndpointLookup {
    Found(String),
    /// No Elasticsearch resource with a real cluster id.
    NotReady,
    /// Cluster exists but exposes no service URL.
    NoServiceUrl,
}

impl EndpointLookup {
    pub fn reason(&self) -> &'static str {
        match self {
            EndpointLookup::Found(_) => "Elasticsearch endpoint found",
            EndpointLookup::NotReady => {
                "Elasticsearch resource endpoint not found or deployment is not ready"
            }
            EndpointLookup::NoServiceUrl => "Elasticsearch service URL not found in metadata",
        }
    }
}

/// Memory and disk allotted to one topology instance, in MB.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InstanceCapacity {
    pub memory_mb: f64,
    pub disk_mb: f64,
}

impl DeploymentDetails {
    pub fn elasticsearch_resources(&self) -> &[Value] {
        self.resources_of_kind("elasticsearch")
    }

    pub fn kibana_count(&self) -> usize {
        self.resources_of_kind("kibana").len()
    }

    fn resources_of_kind(&self, kind: &str) -> &[Value] {
        self.0
            .get("resources")
            .and_then(|r| r.get(kind))
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Resolve the Elasticsearch endpoint of the first resource that
    /// carries a cluster id.
    pub fn elasticsearch_endpoint(&self) -> EndpointLookup {
        let info = self
            .elasticsearch_resources()
            .iter()
            .filter_map(|r| r.get("info"))
            .find(|info| info.get("cluster_id").is_some());

        let info = match info {
            Some(info) => info,
            None => return EndpointLookup::NotReady,
        };
        match info.get("cluster_id").and_then(Value::as_str) {
            Some(id) if !id.is_empty() && id != PLACEHOLDER_CLUSTER_ID => {}
            _ => return EndpointLookup::NotReady,
        }

        let url = info
            .pointer("/metadata/service_url")
            .and_then(Value::as_str)
            .or_else(|| info.pointer("/links/https").and_then(Value::as_str))
            .filter(|u| !u.is_empty());

        match url {
            Some(u) => EndpointLookup::Found(u.trim_end_matches('/').to_string()),
            None => EndpointLookup::NoServiceUrl,
        }
    }

    /// Elasticsearch version of each resource's current plan; "unknown" when absent.
    pub fn elasticsearch_versions(&self) -> Vec<String> {
        self.elasticsearch_resources()
            .iter()
            .map(|r| {
                r.pointer("/info/plan_info/current/plan/elasticsearch/version")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown")
                    .to_string()
            })
            .collect()
    }

    pub fn instances(&self) -> Vec<InstanceCapacity> {
        self.elasticsearch_resources()
            .iter()
            .filter_map(|r| r.pointer("/info/topology/instances").and_then(Value::as_array))
            .flatten()
            .map(|i| InstanceCapacity {
                memory_mb: i
                    .pointer("/memory/instance_capacity")
                    .and_then(Value::as_f64)
                    .unwrap_or(0.0),
                disk_mb: i
                    .pointer("/disk/disk_space_available")
                    .and_then(Value::as_f64)
                    .unwrap_or(0.0),
            })
            .collect()
    }

    pub fn memory_gb(&self) -> f64 {
        mb_to_gb(self.instances().iter().map(|i| i.memory_mb).sum())
    }
}

/// Health bucket of a deployment for the status distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HealthBucket {
    Status(HealthStatus),
    Error,
}

impl HealthBucket {
    pub fn of(record: &DeploymentRecord) -> Self {
        if record.errors.iter().any(|e| e.resource == HEALTH_RESOURCE) {
            return HealthBucket::Error;
        }
        match &record.health {
            Some(h) => HealthBucket::Status(h.health()),
            None => HealthBucket::Status(HealthStatus::Unknown),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            HealthBucket::Status(s) => s.label(),
            HealthBucket::Error => "ERROR",
        }
    }
}

/// Aggregates over every inspected deployment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FleetSummary {
    pub deployment_count: usize,
    pub status_distribution: BTreeMap<HealthBucket, usize>,
    pub versions: BTreeMap<String, usize>,
    pub elasticsearch_count: usize,
    pub kibana_count: usize,
    pub memory_total_gb: f64,
    pub storage_total_gb: f64,
    pub total_nodes: usize,
}

pub fn summarize_fleet(records: &[DeploymentRecord]) -> FleetSummary {
    let mut summary = FleetSummary {
        deployment_count: records.len(),
        ..Default::default()
    };
    let mut memory_mb = 0.0;
    let mut storage_mb = 0.0;

    for record in records {
        *summary
            .status_distribution
            .entry(HealthBucket::of(record))
            .or_insert(0) += 1;

        let details = match &record.details {
            Some(d) => d,
            None => continue,
        };
        summary.elasticsearch_count += details.elasticsearch_resources().len();
        summary.kibana_count += details.kibana_count();
        for version in details.elasticsearch_versions() {
            *summary.versions.entry(version).or_insert(0) += 1;
        }
        for instance in details.instances() {
            summary.total_nodes += 1;
            memory_mb += instance.memory_mb;
            storage_mb += instance.disk_mb;
        }
    }

    summary.memory_total_gb = mb_to_gb(memory_mb);
    summary.storage_total_gb = mb_to_gb(storage_mb);
    summary
}
