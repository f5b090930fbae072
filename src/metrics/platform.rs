use std::collections::BTreeSet;

use crate::parsing::{mb_to_gb, usage_percent};
use crate::types::{AllocatorOverview, AllocatorStat};

/// Platform-wide allocator capacity, aggregated over every zone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AllocatorSummary {
    pub allocator_count: usize,
    pub healthy_count: usize,
    pub connected_count: usize,
    pub total_memory_gb: f64,
    pub used_memory_gb: f64,
    pub total_storage_gb: f64,
    pub instance_count: usize,
    pub zones: BTreeSet<String>,
    pub features: BTreeSet<String>,
}

impl AllocatorSummary {
    pub fn memory_used_percent(&self) -> Option<f64> {
        usage_percent(self.used_memory_gb, self.total_memory_gb)
    }
}

pub fn all_allocators(overview: &AllocatorOverview) -> impl Iterator<Item = &AllocatorStat> {
    overview.zones.iter().flat_map(|z| z.allocators.iter())
}

/// Zone ids; zones without an id are reported as "Unknown".
pub fn zone_ids(overview: &AllocatorOverview) -> BTreeSet<String> {
    overview
        .zones
        .iter()
        .map(|z| z.zone_id.clone().unwrap_or_else(|| "Unknown".to_string()))
        .collect()
}

pub fn summarize_allocators(overview: &AllocatorOverview) -> AllocatorSummary {
    let mut summary = AllocatorSummary {
        zones: zone_ids(overview),
        ..Default::default()
    };
    let mut total_mem_mb = 0.0;
    let mut used_mem_mb = 0.0;
    let mut storage_mb = 0.0;

    for a in all_allocators(overview) {
        summary.allocator_count += 1;
        if let Some(status) = &a.status {
            if status.healthy {
                summary.healthy_count += 1;
            }
            if status.connected {
                summary.connected_count += 1;
            }
        }
        if let Some(capacity) = &a.capacity {
            if let Some(memory) = &capacity.memory {
                total_mem_mb += memory.total.unwrap_or(0.0);
                used_mem_mb += memory.used.unwrap_or(0.0);
            }
            if let Some(storage) = &capacity.storage {
                storage_mb += storage.total.unwrap_or(0.0);
            }
        }
        summary.instance_count += a.instances.len();
        summary.features.extend(a.features.iter().cloned());
    }

    summary.total_memory_gb = mb_to_gb(total_mem_mb);
    summary.used_memory_gb = mb_to_gb(used_mem_mb);
    summary.total_storage_gb = mb_to_gb(storage_mb);
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn overview() -> AllocatorOverview {
        serde_json::from_value(json!({
            "zones": [
                {
                    "zone_id": "zone-b",
                    "allocators": [
                        {
                            "allocator_id": "10.0.0.1",
                            "status": {"healthy": true, "connected": true},
                            "capacity": {
                                "memory": {"total": 65536, "used": 16384},
                                "storage": {"total": 204800}
                            },
                            "instances": [{"cluster_id": "a"}, {"cluster_id": "b"}],
                            "features": ["apm", "elasticsearch"]
                        },
                        {
                            "allocator_id": "10.0.0.2",
                            "status": {"healthy": false, "connected": true},
                            "capacity": {"memory": {"total": 32768, "used": 0}},
                            "features": ["elasticsearch", "kibana"]
                        }
                    ]
                },
                {"zone_id": "zone-a", "allocators": []},
                {"allocators": [{"allocator_id": "10.0.0.3"}]}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_summarize_allocators() {
        let s = summarize_allocators(&overview());

        assert_eq!(s.allocator_count, 3);
        assert_eq!(s.healthy_count, 1);
        assert_eq!(s.connected_count, 2);
        assert_eq!(s.total_memory_gb, 96.0);
        assert_eq!(s.used_memory_gb, 16.0);
        assert_eq!(s.total_storage_gb, 200.0);
        assert_eq!(s.instance_count, 2);
        assert_eq!(
            s.zones.iter().cloned().collect::<Vec<_>>(),
            vec!["Unknown", "zone-a", "zone-b"]
        );
        assert_eq!(
            s.features.iter().cloned().collect::<Vec<_>>(),
            vec!["apm", "elasticsearch", "kibana"]
        );
        assert_eq!(s.memory_used_percent(), Some(16.0 / 96.0 * 100.0));
    }

    #[test]
    fn test_empty_overview() {
        let s = summarize_allocators(&AllocatorOverview::default());
        assert_eq!(s.allocator_count, 0);
        assert!(s.zones.is_empty());
        assert_eq!(s.memory_used_percent(), None);
    }

    #[test]
    fn test_unknown_fields_survive_round_trip() {
        let raw = json!({
            "zones": [{"zone_id": "z", "allocators": [{"allocator_id": "x", "host_ip": "10.1.1.1"}]}],
            "next_page": null
        });
        let parsed: AllocatorOverview = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(serde_json::to_value(&parsed).unwrap(), raw);
    }
}
