use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ece_health_reporter::metrics::{summarize_allocators, summarize_fleet};
use ece_health_reporter::parsing::NameFilter;
use ece_health_reporter::types::*;
use serde_json::json;

fn allocator_overview(zones: usize, per_zone: usize) -> AllocatorOverview {
    let zones: Vec<_> = (0..zones)
        .map(|z| {
            let allocators: Vec<_> = (0..per_zone)
                .map(|a| {
                    json!({
                        "allocator_id": format!("10.0.{}.{}", z, a),
                        "status": {"healthy": a % 7 != 0, "connected": true},
                        "capacity": {
                            "memory": {"total": 65536, "used": 1024 * (a % 64)},
                            "storage": {"total": 1048576}
                        },
                        "instances": [{"cluster_id": "c"}, {"cluster_id": "k"}],
                        "features": ["elasticsearch", "kibana", "apm"]
                    })
                })
                .collect();
            json!({"zone_id": format!("zone-{}", z), "allocators": allocators})
        })
        .collect();
    serde_json::from_value(json!({ "zones": zones })).unwrap()
}

fn deployment_records(count: usize) -> Vec<DeploymentRecord> {
    let statuses = ["green", "yellow", "red"];
    (0..count)
        .map(|i| DeploymentRecord {
            deployment: Deployment {
                id: format!("d{:04}", i),
                name: Some(format!("deployment-{}", count - i)),
                ..Default::default()
            },
            details: Some(DeploymentDetails(json!({
                "resources": {
                    "elasticsearch": [{
                        "info": {
                            "cluster_id": format!("c{}", i),
                            "plan_info": {"current": {"plan": {"elasticsearch": {"version": format!("8.{}.0", i % 5)}}}},
                            "topology": {"instances": [
                                {"memory": {"instance_capacity": 4096}, "disk": {"disk_space_available": 131072}},
                                {"memory": {"instance_capacity": 4096}, "disk": {"disk_space_available": 131072}}
                            ]}
                        }
                    }],
                    "kibana": [{}]
                }
            }))),
            elasticsearch_endpoint: Some(format!("https://es-{}.example.com:9243", i)),
            health: Some(ClusterHealthRecord {
                status: statuses[i % 3].to_string(),
                number_of_nodes: 3,
                relocating_shards: (i % 4) as u64,
                ..Default::default()
            }),
            stats: Some(ClusterStatsRecord::default()),
            errors: Vec::new(),
        })
        .collect()
}

fn allocator_summary_benchmark(c: &mut Criterion) {
    let overview = allocator_overview(3, 100);

    c.bench_function("summarize_allocators", |b| {
        b.iter(|| black_box(summarize_allocators(black_box(&overview))))
    });
}

fn fleet_summary_benchmark(c: &mut Criterion) {
    let records = deployment_records(500);

    c.bench_function("summarize_fleet", |b| {
        b.iter(|| black_box(summarize_fleet(black_box(&records))))
    });
}

fn render_benchmark(c: &mut Criterion) {
    let snapshot = MetricsSnapshot {
        collected_at: Utc::now(),
        host: "https://ece.example.com:12443".to_string(),
        platform_info: Section::Collected(PlatformInfo::default()),
        allocators: Section::Collected(allocator_overview(3, 20)),
        deployment_list_error: None,
        deployments: deployment_records(200),
    };

    c.bench_function("render_full_report", |b| {
        b.iter(|| {
            let report = ece_health_reporter::HealthReport::new(black_box(&snapshot));
            black_box(report.render(ReportStyle::Full))
        })
    });
}

fn name_filter_benchmark(c: &mut Criterion) {
    let filter = NameFilter::new("prod-*-search").unwrap();
    let names: Vec<String> = (0..200)
        .map(|i| match i % 3 {
            0 => format!("prod-{}-search", i),
            1 => format!("dev-{}-search", i),
            _ => format!("prod-{}-logs", i),
        })
        .collect();

    c.bench_function("name_filter_matches", |b| {
        b.iter(|| names.iter().filter(|n| filter.matches(black_box(n))).count())
    });
}

criterion_group!(
    benches,
    allocator_summary_benchmark,
    fleet_summary_benchmark,
    render_benchmark,
    name_filter_benchmark
);
criterion_main!(benches);
