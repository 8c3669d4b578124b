//! Emittable metric records and the metric-name vocabulary.
//!
//! A [`MetricRecord`] is the unit handed to the exporter: one entity, one
//! poll cycle, a map of metric fields to `f64` values plus identity tags.
//! Field names are drawn from the fixed [`FieldKey`] enumeration rather than
//! free-form strings, so a typo cannot silently mint a new metric and values
//! never need runtime type assertions.
//!
//! Records are built fresh per extraction call and ownership transfers to the
//! caller once returned; nothing in this module retains them.

use std::collections::HashMap;

/// Tag key for the entity type of a record.
pub const TAG_METRIC_TYPE: &str = "type";
/// Tag key for the entity display name.
pub const TAG_NAME: &str = "name";
/// Tag key for the Kubernetes namespace, when the entity has one.
pub const TAG_NAMESPACE: &str = "namespace";
/// Tag key for the sample timestamp in epoch milliseconds.
pub const TAG_TIMESTAMP: &str = "timestamp";
/// Tag key for the node name on node-level records.
pub const TAG_NODE_NAME: &str = "node_name";
/// Tag key for the pod UID on pod-level records.
pub const TAG_POD_ID: &str = "pod_id";

/// The kind of entity a sample or record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum EntityType {
    /// A cluster node.
    Node,
    /// A pod.
    Pod,
    /// A single container within a pod.
    Container,
}

impl EntityType {
    /// Returns the lowercase name used as a metric-name prefix and tag value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Pod => "pod",
            Self::Container => "container",
        }
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The fixed vocabulary of metric fields produced by the extractors.
///
/// Keys are scoped to an entity at emission time via [`FieldKey::qualified`]
/// (`cpu_usage_total` becomes `node_cpu_usage_total` and so on).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum FieldKey {
    /// Total CPU consumption rate in millicores.
    CpuTotal,
    /// CPU consumption as a percentage of host capacity.
    CpuUtilization,
    /// Host CPU capacity in millicores.
    CpuLimit,
    /// Memory usage gauge in bytes.
    MemUsage,
    /// Resident set size gauge in bytes.
    MemRss,
    /// Working set gauge in bytes.
    MemWorkingSet,
    /// Host memory capacity in bytes.
    MemReservedCapacity,
    /// Working set as a percentage of host memory capacity.
    MemUtilization,
    /// Page fault rate per second.
    MemPageFaults,
    /// Major page fault rate per second.
    MemMajorPageFaults,
    /// Received bytes per second, summed across interfaces.
    NetRxBytes,
    /// Receive errors per second, summed across interfaces.
    NetRxErrors,
    /// Transmitted bytes per second, summed across interfaces.
    NetTxBytes,
    /// Transmit errors per second, summed across interfaces.
    NetTxErrors,
    /// Combined rx + tx bytes per second.
    NetTotalBytes,
}

impl FieldKey {
    /// Returns the unqualified field name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CpuTotal => "cpu_usage_total",
            Self::CpuUtilization => "cpu_utilization",
            Self::CpuLimit => "cpu_limit",
            Self::MemUsage => "memory_usage",
            Self::MemRss => "memory_rss",
            Self::MemWorkingSet => "memory_working_set",
            Self::MemReservedCapacity => "memory_reserved_capacity",
            Self::MemUtilization => "memory_utilization",
            Self::MemPageFaults => "memory_pgfault",
            Self::MemMajorPageFaults => "memory_pgmajfault",
            Self::NetRxBytes => "network_rx_bytes",
            Self::NetRxErrors => "network_rx_errors",
            Self::NetTxBytes => "network_tx_bytes",
            Self::NetTxErrors => "network_tx_errors",
            Self::NetTotalBytes => "network_total_bytes",
        }
    }

    /// Returns the entity-qualified emission name, e.g.
    /// `pod_network_rx_bytes`.
    #[must_use]
    pub fn qualified(&self, entity_type: EntityType) -> String {
        format!("{}_{}", entity_type.as_str(), self.as_str())
    }
}

impl std::fmt::Display for FieldKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An emittable metric record for one entity and one poll cycle.
#[derive(Debug, Clone)]
pub struct MetricRecord {
    entity_type: EntityType,
    fields: HashMap<FieldKey, f64>,
    tags: HashMap<String, String>,
}

impl MetricRecord {
    /// Creates an empty record for the given entity type.
    #[must_use]
    pub fn new(entity_type: EntityType) -> Self {
        Self {
            entity_type,
            fields: HashMap::new(),
            tags: HashMap::new(),
        }
    }

    /// Returns the entity type this record describes.
    #[must_use]
    pub const fn entity_type(&self) -> EntityType {
        self.entity_type
    }

    /// Adds a field value. A second write to the same key overwrites the
    /// first.
    pub fn add_field(&mut self, key: FieldKey, value: f64) {
        self.fields.insert(key, value);
    }

    /// Returns a field value, if present.
    #[must_use]
    pub fn field(&self, key: FieldKey) -> Option<f64> {
        self.fields.get(&key).copied()
    }

    /// Returns the field map.
    #[must_use]
    pub const fn fields(&self) -> &HashMap<FieldKey, f64> {
        &self.fields
    }

    /// Adds a single tag, overwriting any previous value for the key.
    pub fn add_tag(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.tags.insert(key.into(), value.into());
    }

    /// Merges a tag map into the record, overwriting on key collision.
    pub fn add_tags(&mut self, tags: HashMap<String, String>) {
        self.tags.extend(tags);
    }

    /// Returns the tag map.
    #[must_use]
    pub const fn tags(&self) -> &HashMap<String, String> {
        &self.tags
    }

    /// Renders the fields under their entity-qualified emission names.
    #[must_use]
    pub fn qualified_fields(&self) -> HashMap<String, f64> {
        self.fields
            .iter()
            .map(|(key, value)| (key.qualified(self.entity_type), *value))
            .collect()
    }
}

/// Sums per-interface field maps into one aggregate map.
///
/// A key appears in the output when at least one input map carries it;
/// missing entries contribute nothing rather than zero.
#[must_use]
pub fn sum_fields(field_maps: &[HashMap<FieldKey, f64>]) -> HashMap<FieldKey, f64> {
    let mut aggregated = HashMap::new();
    for fields in field_maps {
        for (key, value) in fields {
            *aggregated.entry(*key).or_insert(0.0) += value;
        }
    }
    aggregated
}
