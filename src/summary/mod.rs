//! Stats-snapshot schema for the node agent's summary endpoint.
//!
//! These types mirror the kubelet Summary API wire format: camelCase field
//! names, RFC 3339 timestamps, and optional leaves throughout. A missing
//! field stays `None` end to end; it is never defaulted to zero, because a
//! zero counter and an unreported counter mean different things to the rate
//! cache.
//!
//! Retrieval of the snapshot (HTTP, auth, retries) lives outside this crate;
//! this module only gives the normalizer a concrete shape to consume.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A full stats snapshot: the node plus every pod scheduled on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    /// Node-level stats.
    pub node: NodeStats,
    /// Per-pod stats.
    #[serde(default)]
    pub pods: Vec<PodStats>,
}

/// Node-level stats.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeStats {
    /// Node name; doubles as the node's stable identifier.
    pub node_name: String,
    /// CPU counters, when the agent reported them.
    #[serde(default)]
    pub cpu: Option<CpuStats>,
    /// Memory gauges, when the agent reported them.
    #[serde(default)]
    pub memory: Option<MemoryStats>,
    /// Network counters, when the agent reported them.
    #[serde(default)]
    pub network: Option<NetworkStats>,
}

/// Pod-level stats plus the pod's containers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodStats {
    /// Pod identity.
    pub pod_ref: PodReference,
    #[serde(default)]
    pub cpu: Option<CpuStats>,
    #[serde(default)]
    pub memory: Option<MemoryStats>,
    #[serde(default)]
    pub network: Option<NetworkStats>,
    /// Stats for each container in the pod.
    #[serde(default)]
    pub containers: Vec<ContainerStats>,
}

/// Identity of a pod.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodReference {
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    /// Pod UID, stable for the pod's lifetime.
    pub uid: String,
}

/// Per-container stats. Containers report no network group; network stats
/// exist at pod and node granularity only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerStats {
    pub name: String,
    #[serde(default)]
    pub cpu: Option<CpuStats>,
    #[serde(default)]
    pub memory: Option<MemoryStats>,
}

/// Cumulative CPU counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CpuStats {
    /// Clock reading the counters were sampled at.
    #[serde(default)]
    pub time: Option<DateTime<Utc>>,
    /// Instantaneous usage in nanocores.
    #[serde(default)]
    pub usage_nano_cores: Option<u64>,
    /// Cumulative core-nanoseconds consumed.
    #[serde(default)]
    pub usage_core_nano_seconds: Option<u64>,
}

/// Instantaneous memory gauges plus cumulative page-fault counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryStats {
    #[serde(default)]
    pub time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub usage_bytes: Option<u64>,
    #[serde(default)]
    pub available_bytes: Option<u64>,
    #[serde(default)]
    pub working_set_bytes: Option<u64>,
    #[serde(default)]
    pub rss_bytes: Option<u64>,
    #[serde(default)]
    pub page_faults: Option<u64>,
    #[serde(default)]
    pub major_page_faults: Option<u64>,
}

/// Network counters: a default interface inlined at the top level plus the
/// full interface list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkStats {
    #[serde(default)]
    pub time: Option<DateTime<Utc>>,
    /// The default interface's counters, flattened into this object.
    #[serde(flatten)]
    pub default_interface: InterfaceStats,
    /// All interfaces, when the agent enumerates them.
    #[serde(default)]
    pub interfaces: Vec<InterfaceStats>,
}

/// Cumulative counters for one network interface.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterfaceStats {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub rx_bytes: Option<u64>,
    #[serde(default)]
    pub rx_errors: Option<u64>,
    #[serde(default)]
    pub tx_bytes: Option<u64>,
    #[serde(default)]
    pub tx_errors: Option<u64>,
}
