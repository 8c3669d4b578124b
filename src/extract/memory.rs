#![allow(clippy::cast_precision_loss)] // Byte and fault counts fit f64's integer range.
//! Memory metric extraction.
//!
//! Memory gauges are instantaneous and copy straight through; only the
//! cumulative page-fault counters go through the rate cache. Utilization is
//! the working set over host capacity, omitted when either side is missing.

use crate::host::HostInfo;
use crate::metric::{EntityType, FieldKey, MetricRecord};
use crate::rate::{RateCalculator, RateError};
use crate::sample::RawSample;

use super::{MetricExtractor, NANOS_PER_SECOND};

/// Extracts memory gauges, utilization, and page-fault rates.
#[derive(Debug)]
pub struct MemoryExtractor {
    rate_calculator: RateCalculator,
}

impl MemoryExtractor {
    /// Creates an extractor with a default-configured rate cache.
    #[must_use]
    pub fn new() -> Self {
        Self::with_calculator(RateCalculator::new())
    }

    /// Creates an extractor around an explicitly configured rate cache.
    #[must_use]
    pub const fn with_calculator(rate_calculator: RateCalculator) -> Self {
        Self { rate_calculator }
    }
}

impl Default for MemoryExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricExtractor for MemoryExtractor {
    fn has_value(&self, sample: &RawSample) -> bool {
        sample.memory.is_some()
    }

    fn extract(
        &self,
        sample: &RawSample,
        host: &dyn HostInfo,
        entity_type: EntityType,
    ) -> Result<Vec<MetricRecord>, RateError> {
        let mut record = MetricRecord::new(entity_type);

        if let Some(gauges) = sample.memory.as_ref() {
            let capacity = host.memory_capacity_bytes();

            if let Some(usage) = gauges.usage_bytes {
                record.add_field(FieldKey::MemUsage, usage as f64);
            }
            if let Some(rss) = gauges.rss_bytes {
                record.add_field(FieldKey::MemRss, rss as f64);
            }
            if let Some(working_set) = gauges.working_set_bytes {
                record.add_field(FieldKey::MemWorkingSet, working_set as f64);
                if capacity != 0 {
                    record.add_field(
                        FieldKey::MemUtilization,
                        working_set as f64 / capacity as f64 * 100.0,
                    );
                }
            }

            if let Some(timestamp) = sample.timestamp {
                if let Some(faults) = gauges.page_faults {
                    if let Some(rate) = self.rate_calculator.compute(
                        FieldKey::MemPageFaults,
                        &sample.identifier,
                        faults as f64,
                        timestamp,
                        NANOS_PER_SECOND,
                    )? {
                        record.add_field(FieldKey::MemPageFaults, rate);
                    }
                }
                if let Some(faults) = gauges.major_page_faults {
                    if let Some(rate) = self.rate_calculator.compute(
                        FieldKey::MemMajorPageFaults,
                        &sample.identifier,
                        faults as f64,
                        timestamp,
                        NANOS_PER_SECOND,
                    )? {
                        record.add_field(FieldKey::MemMajorPageFaults, rate);
                    }
                }
            }

            record.add_field(FieldKey::MemReservedCapacity, capacity as f64);
        }

        Ok(vec![record])
    }

    fn shutdown(&self) {
        self.rate_calculator.shutdown();
    }
}
