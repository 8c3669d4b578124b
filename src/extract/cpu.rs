#![allow(clippy::cast_precision_loss)] // Counter and core counts fit f64's integer range.
//! CPU metric extraction.
//!
//! The cumulative core-nanosecond counter becomes a millicore rate through
//! the rate cache; utilization is that rate over host capacity. Node
//! entities additionally report their capacity as `cpu_limit`.

use crate::host::HostInfo;
use crate::metric::{EntityType, FieldKey, MetricRecord};
use crate::rate::{RateCalculator, RateError};
use crate::sample::RawSample;

use super::{MetricExtractor, DECIMAL_TO_MILLICORES};

/// Extracts CPU rate and utilization metrics.
#[derive(Debug)]
pub struct CpuExtractor {
    rate_calculator: RateCalculator,
}

impl CpuExtractor {
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

impl Default for CpuExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricExtractor for CpuExtractor {
    fn has_value(&self, sample: &RawSample) -> bool {
        sample.cpu.is_some()
    }

    fn extract(
        &self,
        sample: &RawSample,
        host: &dyn HostInfo,
        entity_type: EntityType,
    ) -> Result<Vec<MetricRecord>, RateError> {
        let mut record = MetricRecord::new(entity_type);

        if let (Some(counters), Some(timestamp)) = (sample.cpu.as_ref(), sample.timestamp) {
            if let Some(total_nanos) = counters.usage_core_nano_seconds {
                let rate = self.rate_calculator.compute(
                    FieldKey::CpuTotal,
                    &sample.identifier,
                    total_nanos as f64,
                    timestamp,
                    DECIMAL_TO_MILLICORES,
                )?;
                if let Some(millicores) = rate {
                    record.add_field(FieldKey::CpuTotal, millicores);
                    let num_cores = host.num_cores();
                    if num_cores != 0 {
                        record.add_field(
                            FieldKey::CpuUtilization,
                            millicores / (num_cores as f64 * DECIMAL_TO_MILLICORES) * 100.0,
                        );
                    }
                }
            }
        }

        if entity_type == EntityType::Node {
            record.add_field(
                FieldKey::CpuLimit,
                host.num_cores() as f64 * DECIMAL_TO_MILLICORES,
            );
        }

        Ok(vec![record])
    }

    fn shutdown(&self) {
        self.rate_calculator.shutdown();
    }
}
