//! Metric extractors.
//!
//! Each extractor covers one capability of a raw sample (CPU counters,
//! memory gauges, network counters), owns a dedicated
//! [`RateCalculator`](crate::rate::RateCalculator), and turns the sample
//! plus host context into metric records. The pipeline
//! probes `has_value` before paying for `extract`, and cascades `shutdown`
//! when tearing down.

use crate::host::HostInfo;
use crate::metric::{EntityType, MetricRecord};
use crate::rate::RateError;
use crate::sample::RawSample;

pub mod cpu;
pub mod memory;
pub mod network;

pub use cpu::CpuExtractor;
pub use memory::MemoryExtractor;
pub use network::NetworkExtractor;

/// Multiplier converting a core-nanosecond rate into millicores.
pub const DECIMAL_TO_MILLICORES: f64 = 1000.0;

/// Multiplier converting a per-nanosecond rate into a per-second rate.
pub const NANOS_PER_SECOND: f64 = 1_000_000_000.0;

/// Capability set shared by the three extractors.
pub trait MetricExtractor {
    /// Whether the sample carries the data this extractor consumes.
    fn has_value(&self, sample: &RawSample) -> bool;

    /// Extracts metric records from the sample.
    ///
    /// Unestablished rates and guarded divisions surface as omitted fields,
    /// never as errors.
    ///
    /// # Errors
    ///
    /// Returns [`RateError::Closed`] when called after `shutdown`.
    fn extract(
        &self,
        sample: &RawSample,
        host: &dyn HostInfo,
        entity_type: EntityType,
    ) -> Result<Vec<MetricRecord>, RateError>;

    /// Releases the extractor's rate-cache state. Idempotent.
    fn shutdown(&self);
}
