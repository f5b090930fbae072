use chrono::Utc;
use tracing::{debug, info, warn};

use crate::client::CloudApiClient;
use crate::error::{ApiError, ConfigError};
use crate::metrics::{
    EndpointLookup, DETAILS_RESOURCE, ENDPOINT_RESOURCE, HEALTH_RESOURCE, STATS_RESOURCE,
};
use crate::parsing::NameFilter;
use crate::types::*;

pub const PLATFORM_RESOURCE: &str = "platform_info";
pub const ALLOCATORS_RESOURCE: &str = "allocators";
pub const DEPLOYMENTS_RESOURCE: &str = "deployments";

/// Drives one collection run: platform, allocators, then each deployment
/// in turn. Requests are issued one at a time.
pub struct MetricsCollector<'a> {
    client: &'a CloudApiClient,
    filter: NameFilter,
}

impl<'a> MetricsCollector<'a> {
    pub fn new(client: &'a CloudApiClient, config: &'a Config) -> Result<Self, ConfigError> {
        let filter = NameFilter::new(&config.deployment_filter)?;
        Ok(Self { client, filter })
    }

    /// Run the whole collection. Only a control-plane authentication
    /// failure ends the run early; everything else is recorded.
    pub async fn collect(&self) -> Result<MetricsSnapshot, ApiError> {
        info!("Fetching platform and allocator information");
        let platform_info = self.collect_platform_info().await?;
        let allocators = self.collect_allocators().await?;

        info!("Fetching deployment list");
        let (deployments, deployment_list_error) = match self.list_deployments().await {
            Ok(d) => (d, None),
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!("Could not list deployments: {}", e);
                (Vec::new(), Some(FetchFailure::from_api_error(DEPLOYMENTS_RESOURCE, &e)))
            }
        };

        let mut records = Vec::with_capacity(deployments.len());
        for deployment in deployments {
            records.push(self.collect_deployment(deployment).await?);
        }

        Ok(MetricsSnapshot {
            collected_at: Utc::now(),
            host: self.client.base_url().to_string(),
            platform_info,
            allocators,
            deployment_list_error,
            deployments: records,
        })
    }

    pub async fn collect_platform_info(&self) -> Result<Section<PlatformInfo>, ApiError> {
        section(PLATFORM_RESOURCE, self.client.get_platform_info().await)
    }

    pub async fn collect_allocators(&self) -> Result<Section<AllocatorOverview>, ApiError> {
        section(ALLOCATORS_RESOURCE, self.client.get_allocator_stats().await)
    }

    /// Deployments whose name matches the configured filter.
    pub async fn list_deployments(&self) -> Result<Vec<Deployment>, ApiError> {
        let all = self.client.list_deployments().await?;
        let total = all.len();
        let matching: Vec<Deployment> = all
            .into_iter()
            .filter(|d| self.filter.matches(d.display_name()))
            .collect();
        if self.filter.matches_everything() {
            info!("Found {} deployments", total);
        } else {
            info!(
                "Found {} deployments, {} matching '{}'",
                total,
                matching.len(),
                self.filter.pattern()
            );
        }
        Ok(matching)
    }

    /// Fetch details, health and stats for one deployment. Failures are
    /// recorded on the returned record; only an authentication failure on
    /// the control-plane details call is returned as an error.
    pub async fn collect_deployment(&self, deployment: Deployment) -> Result<DeploymentRecord, ApiError> {
        info!("Processing deployment '{}' ({})", deployment.display_name(), deployment.id);

        let mut record = DeploymentRecord {
            deployment,
            details: None,
            elasticsearch_endpoint: None,
            health: None,
            stats: None,
            errors: Vec::new(),
        };

        match self.client.get_deployment_details(&record.deployment.id).await {
            Ok(details) => record.details = Some(details),
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!("Could not fetch details for {}: {}", record.deployment.id, e);
                record.errors.push(FetchFailure::from_api_error(DETAILS_RESOURCE, &e));
                return Ok(record);
            }
        }

        let lookup = record
            .details
            .as_ref()
            .map(DeploymentDetails::elasticsearch_endpoint)
            .unwrap_or(EndpointLookup::NotReady);
        let endpoint = match lookup {
            EndpointLookup::Found(url) => url,
            other => {
                info!("  {}", other.reason());
                record.errors.push(FetchFailure::not_ready(ENDPOINT_RESOURCE, other.reason()));
                return Ok(record);
            }
        };
        debug!("  Found Elasticsearch endpoint: {}", endpoint);

        // Data-plane failures, authentication included, stay with the deployment.
        match self.client.get_cluster_health(&endpoint).await {
            Ok(h) => record.health = Some(h),
            Err(e) => {
                warn!("Cluster health failed for {}: {}", record.deployment.id, e);
                record.errors.push(FetchFailure::from_api_error(HEALTH_RESOURCE, &e));
            }
        }
        match self.client.get_cluster_stats(&endpoint).await {
            Ok(s) => record.stats = Some(s),
            Err(e) => {
                warn!("Cluster stats failed for {}: {}", record.deployment.id, e);
                record.errors.push(FetchFailure::from_api_error(STATS_RESOURCE, &e));
            }
        }
        record.elasticsearch_endpoint = Some(endpoint);

        Ok(record)
    }
}

fn section<T>(resource: &str, result: Result<T, ApiError>) -> Result<Section<T>, ApiError> {
    match result {
        Ok(v) => Ok(Section::Collected(v)),
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => {
            warn!("Could not fetch {}: {}", resource, e);
            Ok(Section::Failed(FetchFailure::from_api_error(resource, &e)))
        }
    }
}
