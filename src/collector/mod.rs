//! Pipeline wiring: from a stats snapshot to emittable records.
//!
//! The [`MetricCollector`] owns one instance of each extractor (and through
//! them, each rate cache) and walks a snapshot node-first, then pods, then
//! containers. Per entity it probes each extractor's `has_value`, extracts,
//! tags the resulting records with entity identity, and drops records that
//! ended up with no fields, a normal outcome on an entity's first poll.
//!
//! One collector per pipeline; construct it in the wiring and pass it down,
//! never through a process-global.
//!
//! # Example
//!
//! ```rust,ignore
//! use container_insights::{CollectorConfig, MetricCollector};
//!
//! let collector = MetricCollector::with_config(&config);
//! loop {
//!     let summary = client.fetch_summary()?; // external collaborator
//!     let records = collector.collect(&summary, &host)?;
//!     exporter.publish(records)?; // external collaborator
//! }
//! ```

use std::collections::HashMap;

use tracing::debug;

use crate::config::CollectorConfig;
use crate::extract::{CpuExtractor, MemoryExtractor, MetricExtractor, NetworkExtractor};
use crate::host::HostInfo;
use crate::metric::{
    EntityType, MetricRecord, TAG_METRIC_TYPE, TAG_NAME, TAG_NAMESPACE, TAG_NODE_NAME, TAG_POD_ID,
    TAG_TIMESTAMP,
};
use crate::rate::{RateCalculator, RateError};
use crate::sample::RawSample;
use crate::summary::Summary;

/// Runs the three extractors over every entity in a snapshot.
#[derive(Debug)]
pub struct MetricCollector {
    cpu: CpuExtractor,
    memory: MemoryExtractor,
    network: NetworkExtractor,
}

impl MetricCollector {
    /// Creates a collector with default cache expiry.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(&CollectorConfig::default())
    }

    /// Creates a collector whose rate caches use the configured expiry.
    #[must_use]
    pub fn with_config(config: &CollectorConfig) -> Self {
        let calculator =
            || RateCalculator::with_expiry(config.cache_ttl(), config.sweep_interval());
        Self {
            cpu: CpuExtractor::with_calculator(calculator()),
            memory: MemoryExtractor::with_calculator(calculator()),
            network: NetworkExtractor::with_calculator(calculator()),
        }
    }

    /// Extracts all metric records for one poll cycle.
    ///
    /// Records come back in entity order (node, then each pod followed by
    /// its containers). A snapshot that establishes no rates yields an
    /// empty list, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`RateError::Closed`] if the collector has been shut down.
    pub fn collect(
        &self,
        summary: &Summary,
        host: &dyn HostInfo,
    ) -> Result<Vec<MetricRecord>, RateError> {
        let mut records = Vec::new();

        let node_sample = RawSample::from_node(&summary.node);
        self.extract_entity(&node_sample, host, EntityType::Node, &mut records)?;

        for pod in &summary.pods {
            let pod_sample = RawSample::from_pod(pod);
            self.extract_entity(&pod_sample, host, EntityType::Pod, &mut records)?;

            for container in &pod.containers {
                let container_sample = RawSample::from_container(container, pod);
                self.extract_entity(&container_sample, host, EntityType::Container, &mut records)?;
            }
        }

        debug!(records = records.len(), pods = summary.pods.len(), "assembled metric records");
        Ok(records)
    }

    fn extract_entity(
        &self,
        sample: &RawSample,
        host: &dyn HostInfo,
        entity_type: EntityType,
        records: &mut Vec<MetricRecord>,
    ) -> Result<(), RateError> {
        let extractors: [&dyn MetricExtractor; 3] = [&self.cpu, &self.memory, &self.network];
        for extractor in extractors {
            if !extractor.has_value(sample) {
                continue;
            }
            for mut record in extractor.extract(sample, host, entity_type)? {
                if record.fields().is_empty() {
                    continue;
                }
                decorate(&mut record, sample);
                records.push(record);
            }
        }
        Ok(())
    }

    /// Releases every extractor's cache state. Idempotent; `collect` fails
    /// fast afterwards.
    pub fn shutdown(&self) {
        self.cpu.shutdown();
        self.memory.shutdown();
        self.network.shutdown();
    }
}

impl Default for MetricCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Stamps entity identity onto a record.
fn decorate(record: &mut MetricRecord, sample: &RawSample) {
    let mut tags = HashMap::new();
    tags.insert(TAG_METRIC_TYPE.to_owned(), record.entity_type().to_string());
    tags.insert(TAG_NAME.to_owned(), sample.name.clone());
    if let Some(namespace) = &sample.namespace {
        tags.insert(TAG_NAMESPACE.to_owned(), namespace.clone());
    }
    if let Some(timestamp) = sample.timestamp {
        tags.insert(TAG_TIMESTAMP.to_owned(), timestamp.timestamp_millis().to_string());
    }
    match record.entity_type() {
        EntityType::Node => {
            tags.insert(TAG_NODE_NAME.to_owned(), sample.name.clone());
        },
        EntityType::Pod => {
            tags.insert(TAG_POD_ID.to_owned(), sample.identifier.clone());
        },
        EntityType::Container => {},
    }
    record.add_tags(tags);
}
