// Aggregations over collected payloads
pub mod platform;
pub mod deployments;

// Re-export commonly used items
pub use platform::{summarize_allocators, zone_ids, AllocatorSummary};
pub use deployments::{
    summarize_fleet, EndpointLookup, FleetSummary, HealthBucket, InstanceCapacity,
    DETAILS_RESOURCE, ENDPOINT_RESOURCE, HEALTH_RESOURCE, STATS_RESOURCE,
};
