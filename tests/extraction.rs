//! End-to-end extraction: snapshot JSON in, tagged metric records out.

use container_insights::metric::{TAG_NAMESPACE, TAG_NODE_NAME, TAG_POD_ID};
use container_insights::{
    CollectorConfig, EntityType, FieldKey, HostInfo, MetricCollector, RateError, Summary,
};

struct TestHost;

impl HostInfo for TestHost {
    fn num_cores(&self) -> u64 {
        2
    }

    fn memory_capacity_bytes(&self) -> u64 {
        4 * 1024 * 1024 * 1024
    }
}

/// Renders a snapshot as the node agent would serve it.
fn snapshot(time: &str, cpu_nanos: u64, rx_bytes: u64, tx_bytes: u64, page_faults: u64) -> Summary {
    let json = format!(
        r#"{{
        "node": {{
            "nodeName": "ip-10-0-0-1",
            "cpu": {{
                "time": "{time}",
                "usageCoreNanoSeconds": {cpu_nanos}
            }},
            "memory": {{
                "time": "{time}",
                "usageBytes": 3221225472,
                "workingSetBytes": 2147483648,
                "rssBytes": 1073741824,
                "pageFaults": {page_faults},
                "majorPageFaults": 0
            }},
            "network": {{
                "time": "{time}",
                "name": "eth0",
                "interfaces": [
                    {{"name": "eth0", "rxBytes": {rx_bytes}, "rxErrors": 0, "txBytes": {tx_bytes}, "txErrors": 0}},
                    {{"name": "eth1", "rxBytes": {rx_bytes}, "rxErrors": 0, "txBytes": 0, "txErrors": 0}}
                ]
            }}
        }},
        "pods": [
            {{
                "podRef": {{"name": "web-0", "namespace": "default", "uid": "uid-web-0"}},
                "cpu": {{"time": "{time}", "usageCoreNanoSeconds": {cpu_nanos}}},
                "memory": {{"time": "{time}", "workingSetBytes": 536870912}},
                "network": {{
                    "time": "{time}",
                    "name": "eth0",
                    "rxBytes": {rx_bytes},
                    "rxErrors": 0,
                    "txBytes": {tx_bytes},
                    "txErrors": 0
                }},
                "containers": [
                    {{
                        "name": "app",
                        "cpu": {{"time": "{time}", "usageCoreNanoSeconds": {cpu_nanos}}},
                        "memory": {{"time": "{time}", "workingSetBytes": 268435456}}
                    }}
                ]
            }}
        ]
    }}"#
    );
    serde_json::from_str(&json).expect("snapshot fixture parses")
}

#[test]
fn two_polls_produce_rates_utilizations_and_totals() {
    let collector = MetricCollector::new();

    let first = collector
        .collect(&snapshot("2024-05-01T12:00:00Z", 0, 0, 0, 0), &TestHost)
        .unwrap();
    // Gauge-backed records flow on the first poll; no rates anywhere yet.
    assert!(!first.is_empty());
    assert!(first
        .iter()
        .all(|record| record.field(FieldKey::CpuTotal).is_none()
            && record.field(FieldKey::NetRxBytes).is_none()));

    // One second later every counter advanced.
    let records = collector
        .collect(
            &snapshot("2024-05-01T12:00:01Z", 2_000_000_000, 1000, 500, 300),
            &TestHost,
        )
        .unwrap();

    let node_cpu = records
        .iter()
        .find(|record| {
            record.entity_type() == EntityType::Node && record.field(FieldKey::CpuTotal).is_some()
        })
        .expect("node cpu record");
    // 2e9 core-nanoseconds over one second on two cores.
    assert!((node_cpu.field(FieldKey::CpuTotal).unwrap() - 2000.0).abs() < 1e-9);
    assert!((node_cpu.field(FieldKey::CpuUtilization).unwrap() - 100.0).abs() < 1e-9);
    assert!((node_cpu.field(FieldKey::CpuLimit).unwrap() - 2000.0).abs() < 1e-9);
    assert_eq!(
        node_cpu.tags().get(TAG_NODE_NAME).map(String::as_str),
        Some("ip-10-0-0-1")
    );

    // Node network aggregates across eth0 and eth1.
    let node_net = records
        .iter()
        .find(|record| {
            record.entity_type() == EntityType::Node && record.field(FieldKey::NetRxBytes).is_some()
        })
        .expect("node network record");
    assert!((node_net.field(FieldKey::NetRxBytes).unwrap() - 2000.0).abs() < 1e-9);
    assert!((node_net.field(FieldKey::NetTxBytes).unwrap() - 500.0).abs() < 1e-9);
    assert!((node_net.field(FieldKey::NetTotalBytes).unwrap() - 2500.0).abs() < 1e-9);

    // Node memory gauges and page-fault rate.
    let node_mem = records
        .iter()
        .find(|record| {
            record.entity_type() == EntityType::Node && record.field(FieldKey::MemUsage).is_some()
        })
        .expect("node memory record");
    assert!((node_mem.field(FieldKey::MemWorkingSet).unwrap() - 2_147_483_648.0).abs() < 1e-9);
    assert!((node_mem.field(FieldKey::MemUtilization).unwrap() - 50.0).abs() < 1e-9);
    assert!((node_mem.field(FieldKey::MemPageFaults).unwrap() - 300.0).abs() < 1e-9);

    // Pod records carry pod identity.
    let pod_net = records
        .iter()
        .find(|record| {
            record.entity_type() == EntityType::Pod && record.field(FieldKey::NetRxBytes).is_some()
        })
        .expect("pod network record");
    assert_eq!(
        pod_net.tags().get(TAG_POD_ID).map(String::as_str),
        Some("uid-web-0")
    );
    assert_eq!(
        pod_net.tags().get(TAG_NAMESPACE).map(String::as_str),
        Some("default")
    );

    // Containers report cpu and memory but never network.
    let container_records: Vec<_> = records
        .iter()
        .filter(|record| record.entity_type() == EntityType::Container)
        .collect();
    assert!(!container_records.is_empty());
    assert!(container_records
        .iter()
        .any(|record| record.field(FieldKey::CpuTotal).is_some()));
    assert!(container_records
        .iter()
        .all(|record| record.field(FieldKey::NetRxBytes).is_none()));
}

#[test]
fn counter_reset_suppresses_rates_for_one_poll() {
    let collector = MetricCollector::new();
    collector
        .collect(&snapshot("2024-05-01T12:00:00Z", 5_000_000_000, 9000, 9000, 0), &TestHost)
        .unwrap();

    // Counters went backwards: the node restarted. No rates this poll.
    let records = collector
        .collect(&snapshot("2024-05-01T12:00:01Z", 1_000_000_000, 100, 100, 0), &TestHost)
        .unwrap();
    assert!(records
        .iter()
        .all(|record| record.field(FieldKey::CpuTotal).is_none()
            && record.field(FieldKey::NetRxBytes).is_none()));

    // The next poll rates against the post-reset baseline.
    let records = collector
        .collect(&snapshot("2024-05-01T12:00:02Z", 2_000_000_000, 200, 200, 0), &TestHost)
        .unwrap();
    let node_cpu = records
        .iter()
        .find(|record| {
            record.entity_type() == EntityType::Node && record.field(FieldKey::CpuTotal).is_some()
        })
        .expect("node cpu record");
    assert!((node_cpu.field(FieldKey::CpuTotal).unwrap() - 1000.0).abs() < 1e-9);
}

#[test]
fn configured_collector_honors_validation() {
    let config = CollectorConfig::from_toml("poll_interval_secs = 5\ncache_ttl_secs = 60\n").unwrap();
    let collector = MetricCollector::with_config(&config);
    let records = collector
        .collect(&snapshot("2024-05-01T12:00:00Z", 0, 0, 0, 0), &TestHost)
        .unwrap();
    assert!(!records.is_empty());
}

#[test]
fn shutdown_is_terminal_and_idempotent() {
    let collector = MetricCollector::new();
    collector
        .collect(&snapshot("2024-05-01T12:00:00Z", 0, 0, 0, 0), &TestHost)
        .unwrap();

    collector.shutdown();
    collector.shutdown();

    let result = collector.collect(&snapshot("2024-05-01T12:00:01Z", 1, 1, 1, 1), &TestHost);
    assert!(matches!(result, Err(RateError::Closed)));
}
