#![allow(clippy::cast_precision_loss)] // Byte counts fit f64's integer range.
//! Network metric extraction.
//!
//! Network stats are reported at pod and node granularity only; container
//! entities are skipped outright. Rates are computed per interface under
//! interface-scoped cache keys, then summed into at most one record per
//! entity, so `eth0` and `eth1` on the same pod never collide in the cache
//! but emit as a single aggregate.

use std::collections::HashMap;

use crate::host::HostInfo;
use crate::metric::{sum_fields, EntityType, FieldKey, MetricRecord};
use crate::rate::{RateCalculator, RateError};
use crate::sample::RawSample;

use super::{MetricExtractor, NANOS_PER_SECOND};

/// Extracts per-second network rates aggregated across interfaces.
#[derive(Debug)]
pub struct NetworkExtractor {
    rate_calculator: RateCalculator,
}

impl NetworkExtractor {
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

impl Default for NetworkExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricExtractor for NetworkExtractor {
    /// Interfaces may legitimately report all-zero counters, so presence is
    /// judged by the sample clock rather than the counter values.
    fn has_value(&self, sample: &RawSample) -> bool {
        sample.timestamp.is_some()
    }

    fn extract(
        &self,
        sample: &RawSample,
        _host: &dyn HostInfo,
        entity_type: EntityType,
    ) -> Result<Vec<MetricRecord>, RateError> {
        if entity_type == EntityType::Container {
            return Ok(Vec::new());
        }
        let Some(timestamp) = sample.timestamp else {
            return Ok(Vec::new());
        };

        let mut per_interface = Vec::with_capacity(sample.network.len());
        for interface in &sample.network {
            // Interface-scoped key: multiple interfaces on one entity must
            // not share a baseline.
            let identifier = format!(
                "{}{}{}",
                sample.identifier,
                entity_type.as_str(),
                interface.interface
            );

            let counters = [
                (FieldKey::NetRxBytes, interface.rx_bytes),
                (FieldKey::NetRxErrors, interface.rx_errors),
                (FieldKey::NetTxBytes, interface.tx_bytes),
                (FieldKey::NetTxErrors, interface.tx_errors),
            ];
            let mut fields = HashMap::new();
            for (key, counter) in counters {
                if let Some(count) = counter {
                    if let Some(rate) = self.rate_calculator.compute(
                        key,
                        &identifier,
                        count as f64,
                        timestamp,
                        NANOS_PER_SECOND,
                    )? {
                        fields.insert(key, rate);
                    }
                }
            }

            if let (Some(&rx), Some(&tx)) = (
                fields.get(&FieldKey::NetRxBytes),
                fields.get(&FieldKey::NetTxBytes),
            ) {
                fields.insert(FieldKey::NetTotalBytes, rx + tx);
            }

            per_interface.push(fields);
        }

        let aggregated = sum_fields(&per_interface);
        if aggregated.is_empty() {
            return Ok(Vec::new());
        }

        let mut record = MetricRecord::new(entity_type);
        for (key, value) in aggregated {
            record.add_field(key, value);
        }
        Ok(vec![record])
    }

    fn shutdown(&self) {
        self.rate_calculator.shutdown();
    }
}
