use crate::metrics::{
    summarize_allocators, summarize_fleet, AllocatorSummary, FleetSummary, HEALTH_RESOURCE,
};
use crate::parsing::format_bytes;
use crate::types::*;

const WIDE_RULE: usize = 50;

/// Text report over one collected snapshot.
pub struct HealthReport<'a> {
    pub snapshot: &'a MetricsSnapshot,
    pub allocators: Option<AllocatorSummary>,
    pub fleet: FleetSummary,
}

impl<'a> HealthReport<'a> {
    pub fn new(snapshot: &'a MetricsSnapshot) -> Self {
        Self {
            snapshot,
            allocators: snapshot.allocators.collected().map(summarize_allocators),
            fleet: summarize_fleet(&snapshot.deployments),
        }
    }

    /// Get a summary of what was collected and what failed
    pub fn summary(&self) -> ReportSummary {
        let failed = self.snapshot.failed_deployments();
        ReportSummary {
            deployment_count: self.snapshot.deployments.len(),
            succeeded_count: self.snapshot.deployments.len() - failed,
            failed_count: failed,
            platform_failed: self.snapshot.platform_info.failure().is_some(),
            allocators_failed: self.snapshot.allocators.failure().is_some(),
            deployment_list_failed: self.snapshot.deployment_list_error.is_some(),
        }
    }

    pub fn render(&self, style: ReportStyle) -> String {
        let lines = match style {
            ReportStyle::Full => self.full_lines(),
            ReportStyle::Simple => self.simple_lines(),
        };
        let mut out = lines.join("\n");
        out.push('\n');
        out
    }

    fn full_lines(&self) -> Vec<String> {
        let mut lines = vec![
            "=".repeat(WIDE_RULE),
            "                 METRICS SUMMARY".to_string(),
            "=".repeat(WIDE_RULE),
            format!("Host: {}", self.snapshot.host),
            format!(
                "Collected at: {}",
                self.snapshot
                    .collected_at
                    .to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
            ),
        ];

        self.platform_block(&mut lines);
        self.zones_block(&mut lines);
        self.allocator_block(&mut lines);
        self.fleet_block(&mut lines);

        lines.push(String::new());
        lines.push("=".repeat(80));
        lines
    }

    fn platform_block(&self, lines: &mut Vec<String>) {
        lines.push(String::new());
        match &self.snapshot.platform_info {
            Section::Collected(p) => {
                lines.push("--- Platform Info ---".to_string());
                lines.push(format!("  Version: {}", p.version.as_deref().unwrap_or("Unknown")));
                if !p.regions.is_empty() {
                    lines.push(format!("  Regions: {}", p.regions.len()));
                }
                for region in &p.regions {
                    lines.push(format!("    - {}", region.region_id.as_deref().unwrap_or("Unknown")));
                    if let Some(r) = &region.runners {
                        lines.push(format!(
                            "      Runners: {}/{} healthy",
                            r.healthy_runners, r.total_runners
                        ));
                    }
                    if let Some(p) = &region.proxies {
                        lines.push(format!(
                            "      Proxies: {} ({})",
                            p.proxies_count,
                            if p.healthy { "Healthy" } else { "Unhealthy" }
                        ));
                    }
                }
            }
            Section::Failed(f) => {
                lines.push("--- Platform Info: Could not retrieve data ---".to_string());
                lines.push(format!("  Error details: {}", f.details));
            }
        }
    }

    fn zones_block(&self, lines: &mut Vec<String>) {
        if let Some(a) = &self.allocators {
            lines.push(String::new());
            lines.push(format!("--- Zones ({} found) ---", a.zones.len()));
            for zone in &a.zones {
                lines.push(format!("  - {}", zone));
            }
        }
    }

    fn allocator_block(&self, lines: &mut Vec<String>) {
        lines.push(String::new());
        let a = match &self.allocators {
            Some(a) if a.allocator_count > 0 => a,
            _ => {
                lines.push("--- Allocators: Could not retrieve data or no allocators found. ---".to_string());
                if let Some(f) = self.snapshot.allocators.failure() {
                    lines.push(format!("  Error details: {}", f.details));
                }
                return;
            }
        };

        lines.push(format!("--- Allocators ({} found) ---", a.allocator_count));
        lines.push(format!("  Total Memory Capacity: {:.2} GB", a.total_memory_gb));
        lines.push(match a.memory_used_percent() {
            Some(pct) => format!(
                "  Used Memory Capacity:  {:.2} GB ({:.1}% used)",
                a.used_memory_gb, pct
            ),
            None => "  Used Memory Capacity: N/A".to_string(),
        });
        lines.push(format!("  Total Storage: {:.2} GB", a.total_storage_gb));
        lines.push(format!("  Total Instances: {}", a.instance_count));
        lines.push(format!("  Healthy Allocators: {}/{}", a.healthy_count, a.allocator_count));
        lines.push(format!(
            "  Available Features: {}",
            a.features.iter().cloned().collect::<Vec<_>>().join(", ")
        ));
    }

    fn fleet_block(&self, lines: &mut Vec<String>) {
        let f = &self.fleet;
        lines.push(String::new());
        lines.push(format!("--- Inspected Deployments ({} found) ---", f.deployment_count));
        if let Some(err) = &self.snapshot.deployment_list_error {
            lines.push(format!("  Could not list deployments: {}", err.details));
        }
        if f.deployment_count == 0 {
            lines.push("  No deployments found or collected.".to_string());
            return;
        }

        let distribution: Vec<String> = f
            .status_distribution
            .iter()
            .map(|(bucket, count)| format!("{}: {}", bucket.label(), count))
            .collect();
        lines.push(format!("  Status Distribution: {}", distribution.join(", ")));

        let versions: Vec<String> = f
            .versions
            .iter()
            .map(|(version, count)| format!("{} ({})", version, count))
            .collect();
        lines.push(format!(
            "  Elasticsearch Versions: {}",
            if versions.is_empty() {
                "None found".to_string()
            } else {
                versions.join(", ")
            }
        ));
        lines.push(format!(
            "  Resource Counts: {} Elasticsearch, {} Kibana",
            f.elasticsearch_count, f.kibana_count
        ));
        lines.push(format!("  Total Memory Allocated: {:.2} GB", f.memory_total_gb));
        lines.push(format!("  Total Storage Allocated: {:.2} GB", f.storage_total_gb));
        lines.push(format!("  Total Nodes: {}", f.total_nodes));

        lines.push(String::new());
        lines.push("--- Deployment Details ---".to_string());
        for record in sorted_records(&self.snapshot.deployments) {
            lines.push(deployment_line(record, true));
        }
    }

    fn simple_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(f) = self.snapshot.platform_info.failure() {
            lines.push(format!("Platform Info: Could not retrieve data ({})", f.details));
        }
        match &self.allocators {
            Some(a) if a.allocator_count > 0 => {
                lines.push(format!("Allocators: {} found", a.allocator_count));
                lines.push(format!("Total Memory Capacity: {:.2} GB", a.total_memory_gb));
                lines.push(match a.memory_used_percent() {
                    Some(pct) => format!("Used Memory Capacity:  {:.2} GB ({:.1}%)", a.used_memory_gb, pct),
                    None => "Used Memory Capacity: N/A".to_string(),
                });
            }
            _ => lines.push("Allocators: Could not retrieve data.".to_string()),
        }

        lines.push(String::new());
        lines.push(format!(
            "Inspected Deployments: {} found matching filter",
            self.snapshot.deployments.len()
        ));
        if let Some(err) = &self.snapshot.deployment_list_error {
            lines.push(format!("Could not list deployments: {}", err.details));
        }
        for record in sorted_records(&self.snapshot.deployments) {
            lines.push(deployment_line(record, false));
        }
        lines.push("-------------------------".to_string());
        lines
    }
}

/// Deployments ordered by display name, then id.
pub fn sorted_records(records: &[DeploymentRecord]) -> Vec<&DeploymentRecord> {
    let mut sorted: Vec<&DeploymentRecord> = records.iter().collect();
    sorted.sort_by(|a, b| {
        a.deployment
            .display_name()
            .cmp(b.deployment.display_name())
            .then_with(|| a.deployment.id.cmp(&b.deployment.id))
    });
    sorted
}

fn deployment_line(record: &DeploymentRecord, detailed: bool) -> String {
    let tag = if record.is_success() { "OK" } else { "FAILED" };
    let mut parts: Vec<String> = Vec::new();

    let health_error = record.errors.iter().find(|e| e.resource == HEALTH_RESOURCE);
    match (health_error, &record.health) {
        (Some(e), _) => parts.push(format!("Could not fetch health (Error: {})", e.details)),
        (None, Some(h)) => {
            parts.push(format!("Status: {}", h.status_label()));
            if h.relocating_shards > 0 || !detailed {
                parts.push(format!("Relocating Shards: {}", h.relocating_shards));
            }
            if detailed {
                if h.number_of_nodes > 0 {
                    parts.push(format!("Nodes: {}", h.number_of_nodes));
                }
                if h.unassigned_shards > 0 {
                    parts.push(format!("Unassigned Shards: {}", h.unassigned_shards));
                }
            }
        }
        (None, None) => parts.push(format!("Status: {}", HealthStatus::Unknown.label())),
    }

    if detailed {
        if let Some(s) = &record.stats {
            parts.push(format!("Indices: {}", s.indices.count));
            parts.push(format!("Docs: {}", s.indices.docs.count));
            parts.push(format!("Store: {}", format_bytes(s.indices.store.size_in_bytes)));
        }
        if let Some(d) = &record.details {
            let memory = d.memory_gb();
            if memory > 0.0 {
                parts.push(format!("Memory: {:.1} GB", memory));
            }
        }
    }

    for e in record.errors.iter().filter(|e| e.resource != HEALTH_RESOURCE) {
        parts.push(format!("{} error: {}", e.resource, e.details));
    }

    let region = match (detailed, record.deployment.region()) {
        (true, Some(r)) => format!(", {}", r),
        _ => String::new(),
    };
    format!(
        "  - {} ({}{}) [{}]: {}",
        record.deployment.display_name(),
        record.deployment.id,
        region,
        tag,
        parts.join(" | ")
    )
}

pub struct ReportSummary {
    pub deployment_count: usize,
    pub succeeded_count: usize,
    pub failed_count: usize,
    pub platform_failed: bool,
    pub allocators_failed: bool,
    pub deployment_list_failed: bool,
}

impl ReportSummary {
    pub fn total_failures(&self) -> usize {
        self.failed_count
            + self.platform_failed as usize
            + self.allocators_failed as usize
            + self.deployment_list_failed as usize
    }

    pub fn has_failures(&self) -> bool {
        self.total_failures() > 0
    }
}
