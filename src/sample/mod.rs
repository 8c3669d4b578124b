//! Normalized raw samples.
//!
//! The normalizer flattens the snapshot schema into one shape the extractors
//! share: identity, a timestamp, and optional counter/gauge groups. It is
//! pure and stateless; a [`RawSample`] lives for one poll cycle and is
//! dropped after extraction.

use chrono::{DateTime, Utc};

use crate::summary::{
    ContainerStats, CpuStats, MemoryStats, NetworkStats, NodeStats, PodStats,
};

/// One entity's stats for one poll cycle, normalized from the snapshot.
#[derive(Debug, Clone)]
pub struct RawSample {
    /// Stable entity identifier: node name, pod UID, or
    /// `podUID-containerName`.
    pub identifier: String,
    /// Display name.
    pub name: String,
    /// Kubernetes namespace, for pod and container entities.
    pub namespace: Option<String>,
    /// Clock reading the sample was taken at.
    pub timestamp: Option<DateTime<Utc>>,
    /// Cumulative CPU counters, when reported.
    pub cpu: Option<CpuCounters>,
    /// Memory gauges and page-fault counters, when reported.
    pub memory: Option<MemoryGauges>,
    /// Per-interface network counters, in snapshot order. Empty when the
    /// snapshot carried no network group.
    pub network: Vec<NetworkCounters>,
}

/// Cumulative CPU counters.
#[derive(Debug, Clone, Copy)]
pub struct CpuCounters {
    pub usage_core_nano_seconds: Option<u64>,
    pub usage_nano_cores: Option<u64>,
}

/// Memory gauges plus cumulative page-fault counters.
#[derive(Debug, Clone, Copy)]
pub struct MemoryGauges {
    pub usage_bytes: Option<u64>,
    pub available_bytes: Option<u64>,
    pub working_set_bytes: Option<u64>,
    pub rss_bytes: Option<u64>,
    pub page_faults: Option<u64>,
    pub major_page_faults: Option<u64>,
}

/// Cumulative counters for one network interface.
#[derive(Debug, Clone)]
pub struct NetworkCounters {
    pub interface: String,
    pub rx_bytes: Option<u64>,
    pub rx_errors: Option<u64>,
    pub tx_bytes: Option<u64>,
    pub tx_errors: Option<u64>,
}

impl RawSample {
    /// Normalizes node-level stats.
    #[must_use]
    pub fn from_node(node: &NodeStats) -> Self {
        Self {
            identifier: node.node_name.clone(),
            name: node.node_name.clone(),
            namespace: None,
            timestamp: sample_time(node.cpu.as_ref(), node.network.as_ref(), node.memory.as_ref()),
            cpu: node.cpu.as_ref().map(convert_cpu),
            memory: node.memory.as_ref().map(convert_memory),
            network: node.network.as_ref().map(convert_network).unwrap_or_default(),
        }
    }

    /// Normalizes pod-level stats. The pod UID is the identifier.
    #[must_use]
    pub fn from_pod(pod: &PodStats) -> Self {
        Self {
            identifier: pod.pod_ref.uid.clone(),
            name: pod.pod_ref.name.clone(),
            namespace: non_empty(&pod.pod_ref.namespace),
            timestamp: sample_time(pod.cpu.as_ref(), pod.network.as_ref(), pod.memory.as_ref()),
            cpu: pod.cpu.as_ref().map(convert_cpu),
            memory: pod.memory.as_ref().map(convert_memory),
            network: pod.network.as_ref().map(convert_network).unwrap_or_default(),
        }
    }

    /// Normalizes container-level stats. Container identifiers are scoped by
    /// the owning pod's UID so same-named containers in different pods stay
    /// distinct. The pod's CPU clock stands in when the container reports
    /// none.
    #[must_use]
    pub fn from_container(container: &ContainerStats, pod: &PodStats) -> Self {
        let timestamp = container
            .cpu
            .as_ref()
            .and_then(|cpu| cpu.time)
            .or_else(|| pod.cpu.as_ref().and_then(|cpu| cpu.time))
            .or_else(|| container.memory.as_ref().and_then(|memory| memory.time));
        Self {
            identifier: format!("{}-{}", pod.pod_ref.uid, container.name),
            name: container.name.clone(),
            namespace: non_empty(&pod.pod_ref.namespace),
            timestamp,
            cpu: container.cpu.as_ref().map(convert_cpu),
            memory: container.memory.as_ref().map(convert_memory),
            network: Vec::new(),
        }
    }
}

/// Picks the sample clock: CPU first, then network, then memory.
fn sample_time(
    cpu: Option<&CpuStats>,
    network: Option<&NetworkStats>,
    memory: Option<&MemoryStats>,
) -> Option<DateTime<Utc>> {
    cpu.and_then(|stats| stats.time)
        .or_else(|| network.and_then(|stats| stats.time))
        .or_else(|| memory.and_then(|stats| stats.time))
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_owned())
    }
}

fn convert_cpu(stats: &CpuStats) -> CpuCounters {
    CpuCounters {
        usage_core_nano_seconds: stats.usage_core_nano_seconds,
        usage_nano_cores: stats.usage_nano_cores,
    }
}

fn convert_memory(stats: &MemoryStats) -> MemoryGauges {
    MemoryGauges {
        usage_bytes: stats.usage_bytes,
        available_bytes: stats.available_bytes,
        working_set_bytes: stats.working_set_bytes,
        rss_bytes: stats.rss_bytes,
        page_faults: stats.page_faults,
        major_page_faults: stats.major_page_faults,
    }
}

/// Uses the enumerated interface list when present, otherwise the flattened
/// default interface.
fn convert_network(stats: &NetworkStats) -> Vec<NetworkCounters> {
    let interfaces: &[crate::summary::InterfaceStats] = if stats.interfaces.is_empty() {
        std::slice::from_ref(&stats.default_interface)
    } else {
        &stats.interfaces
    };
    interfaces
        .iter()
        .map(|interface| NetworkCounters {
            interface: interface.name.clone(),
            rx_bytes: interface.rx_bytes,
            rx_errors: interface.rx_errors,
            tx_bytes: interface.tx_bytes,
            tx_errors: interface.tx_errors,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::summary::{InterfaceStats, PodReference};

    fn pod_fixture() -> PodStats {
        PodStats {
            pod_ref: PodReference {
                name: "web-0".to_owned(),
                namespace: "default".to_owned(),
                uid: "abc-123".to_owned(),
            },
            cpu: Some(CpuStats {
                time: Some(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()),
                usage_nano_cores: Some(250_000_000),
                usage_core_nano_seconds: Some(1_000_000),
            }),
            memory: None,
            network: Some(NetworkStats {
                time: Some(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()),
                default_interface: InterfaceStats {
                    name: "eth0".to_owned(),
                    rx_bytes: Some(100),
                    ..InterfaceStats::default()
                },
                interfaces: vec![],
            }),
            containers: vec![ContainerStats {
                name: "app".to_owned(),
                cpu: None,
                memory: Some(MemoryStats {
                    time: None,
                    usage_bytes: Some(64),
                    available_bytes: None,
                    working_set_bytes: Some(32),
                    rss_bytes: None,
                    page_faults: None,
                    major_page_faults: None,
                }),
            }],
        }
    }

    #[test]
    fn test_pod_sample_identity_and_groups() {
        let pod = pod_fixture();
        let sample = RawSample::from_pod(&pod);
        assert_eq!(sample.identifier, "abc-123");
        assert_eq!(sample.name, "web-0");
        assert_eq!(sample.namespace.as_deref(), Some("default"));
        assert!(sample.timestamp.is_some());
        assert!(sample.cpu.is_some());
        assert!(sample.memory.is_none());
        // Default interface stands in for an empty interface list.
        assert_eq!(sample.network.len(), 1);
        assert_eq!(sample.network[0].interface, "eth0");
        assert_eq!(sample.network[0].rx_bytes, Some(100));
        assert_eq!(sample.network[0].tx_bytes, None);
    }

    #[test]
    fn test_container_identifier_is_pod_scoped() {
        let pod = pod_fixture();
        let sample = RawSample::from_container(&pod.containers[0], &pod);
        assert_eq!(sample.identifier, "abc-123-app");
        assert_eq!(sample.name, "app");
        assert_eq!(sample.namespace.as_deref(), Some("default"));
        // No container CPU clock; the pod's stands in.
        assert!(sample.timestamp.is_some());
        assert!(sample.network.is_empty());
    }

    #[test]
    fn test_node_sample_without_optional_groups() {
        let node = NodeStats {
            node_name: "ip-10-0-0-1".to_owned(),
            cpu: None,
            memory: None,
            network: None,
        };
        let sample = RawSample::from_node(&node);
        assert_eq!(sample.identifier, "ip-10-0-0-1");
        assert!(sample.namespace.is_none());
        assert!(sample.timestamp.is_none());
        assert!(sample.cpu.is_none());
        assert!(sample.memory.is_none());
        assert!(sample.network.is_empty());
    }

    #[test]
    fn test_interface_list_preferred_over_default() {
        let mut pod = pod_fixture();
        if let Some(network) = pod.network.as_mut() {
            network.interfaces = vec![
                InterfaceStats {
                    name: "eth0".to_owned(),
                    rx_bytes: Some(1),
                    ..InterfaceStats::default()
                },
                InterfaceStats {
                    name: "eth1".to_owned(),
                    rx_bytes: Some(2),
                    ..InterfaceStats::default()
                },
            ];
        }
        let sample = RawSample::from_pod(&pod);
        assert_eq!(sample.network.len(), 2);
        assert_eq!(sample.network[1].interface, "eth1");
    }
}
