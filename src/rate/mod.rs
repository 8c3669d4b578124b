//! Keyed rate calculation over cumulative counters.
//!
//! Stats endpoints report counters as monotonically increasing totals
//! (CPU core-nanoseconds consumed, bytes transmitted since interface up).
//! Turning those into per-second rates requires remembering exactly one
//! previous observation per `(metric, entity)` key: the [`RateCalculator`]
//! is that memory, shared by every entity an extractor ever sees.
//!
//! # Semantics
//!
//! For a key with a stored baseline, a new observation yields
//! `(value - lastValue) / elapsedNanoseconds * multiplier`. The multiplier
//! selects the output unit: `1000.0` turns a core-nanosecond counter into
//! millicores, [`NANOS_PER_SECOND`](crate::extract::NANOS_PER_SECOND) turns
//! a byte counter into bytes per second.
//!
//! Three conditions produce no rate and are expected in normal operation,
//! never errors:
//! - first observation of a key (no baseline yet),
//! - a non-positive time delta (duplicate or out-of-order sample; stored
//!   state is left untouched),
//! - a decreasing value (the underlying process restarted; the baseline is
//!   reset to the new observation and the next sample starts fresh).
//!
//! The reset check is exactly `delta < 0` with no jitter tolerance.
//!
//! # Eviction and shutdown
//!
//! Entities churn; their cache entries must not outlive them. Every call
//! refreshes the entry's last-access stamp, and a sweep piggybacked on
//! `compute` drops entries idle longer than the TTL. The sweep runs under
//! the same lock as lookups, so it cannot observe or produce a half-written
//! entry. [`RateCalculator::shutdown`] releases the whole cache; `compute`
//! afterwards fails fast with [`RateError::Closed`] instead of silently
//! rebuilding state.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, trace};

use crate::metric::FieldKey;

/// Default idle lifetime of a cache entry. Several times the usual poll
/// interval, so a missed poll or two does not drop an entity's baseline.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Default minimum spacing between eviction sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(30);

/// Rate calculator errors.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum RateError {
    /// The calculator was shut down; callers must not keep using it.
    #[error("rate calculator is closed")]
    Closed,
}

/// Cache key: metric name plus entity identifier.
///
/// Metric names come from the fixed [`FieldKey`] vocabulary and identifiers
/// from entity identity, so distinct keys cannot collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    metric: FieldKey,
    identifier: String,
}

#[derive(Debug, Clone, Copy)]
struct CacheEntry {
    last_value: f64,
    last_timestamp: DateTime<Utc>,
    last_access: Instant,
}

#[derive(Debug)]
struct CacheState {
    entries: HashMap<CacheKey, CacheEntry>,
    last_sweep: Instant,
}

impl CacheState {
    fn sweep_expired(&mut self, now: Instant, ttl: Duration, interval: Duration) {
        if now.duration_since(self.last_sweep) < interval {
            return;
        }
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| now.duration_since(entry.last_access) <= ttl);
        let evicted = before - self.entries.len();
        if evicted > 0 {
            trace!(evicted, remaining = self.entries.len(), "evicted idle rate cache entries");
        }
        self.last_sweep = now;
    }
}

/// Concurrency-safe cache of previous counter observations.
///
/// One instance is owned by each extractor and shared across every entity
/// that extractor processes; a single map-wide mutex gives per-key
/// atomicity. No call blocks on I/O.
#[derive(Debug)]
pub struct RateCalculator {
    ttl: Duration,
    sweep_interval: Duration,
    state: Mutex<Option<CacheState>>,
}

impl RateCalculator {
    /// Creates a calculator with the default TTL and sweep cadence.
    #[must_use]
    pub fn new() -> Self {
        Self::with_expiry(DEFAULT_CACHE_TTL, DEFAULT_SWEEP_INTERVAL)
    }

    /// Creates a calculator with an explicit entry TTL and sweep cadence.
    ///
    /// The TTL must exceed the poll interval by a safety margin or baselines
    /// will be evicted between polls; [`crate::config::CollectorConfig`]
    /// validates that relationship.
    #[must_use]
    pub fn with_expiry(ttl: Duration, sweep_interval: Duration) -> Self {
        Self {
            ttl,
            sweep_interval,
            state: Mutex::new(Some(CacheState {
                entries: HashMap::new(),
                last_sweep: Instant::now(),
            })),
        }
    }

    /// Feeds one counter observation and returns the rate since the previous
    /// observation of the same key, if one can be established.
    ///
    /// `Ok(None)` is the normal unestablished-rate outcome (first sample,
    /// counter reset, or non-positive time delta); callers omit the
    /// dependent fields rather than emitting zero.
    ///
    /// # Errors
    ///
    /// Returns [`RateError::Closed`] if the calculator has been shut down.
    pub fn compute(
        &self,
        metric: FieldKey,
        identifier: &str,
        value: f64,
        timestamp: DateTime<Utc>,
        multiplier: f64,
    ) -> Result<Option<f64>, RateError> {
        let now = Instant::now();
        let mut guard = self.state.lock().expect("rate cache lock poisoned");
        let state = guard.as_mut().ok_or(RateError::Closed)?;

        state.sweep_expired(now, self.ttl, self.sweep_interval);

        let key = CacheKey {
            metric,
            identifier: identifier.to_owned(),
        };
        match state.entries.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(CacheEntry {
                    last_value: value,
                    last_timestamp: timestamp,
                    last_access: now,
                });
                Ok(None)
            },
            Entry::Occupied(mut slot) => {
                let entry = slot.get_mut();
                entry.last_access = now;

                let delta = timestamp.signed_duration_since(entry.last_timestamp);
                if delta <= chrono::Duration::zero() {
                    // Duplicate or out-of-order sample; keep the baseline.
                    return Ok(None);
                }

                let delta_value = value - entry.last_value;
                if delta_value < 0.0 {
                    debug!(
                        metric = metric.as_str(),
                        identifier, "counter decreased, re-baselining after reset"
                    );
                    entry.last_value = value;
                    entry.last_timestamp = timestamp;
                    return Ok(None);
                }

                // num_nanoseconds only overflows for deltas past ~292 years;
                // fall back to the millisecond count scaled up if it ever does.
                #[allow(clippy::cast_precision_loss)]
                let delta_nanos = delta.num_nanoseconds().map_or_else(
                    || delta.num_milliseconds() as f64 * 1_000_000.0,
                    |nanos| nanos as f64,
                );
                let rate = delta_value / delta_nanos * multiplier;
                entry.last_value = value;
                entry.last_timestamp = timestamp;
                Ok(Some(rate))
            },
        }
    }

    /// Number of live cache entries.
    ///
    /// # Errors
    ///
    /// Returns [`RateError::Closed`] if the calculator has been shut down.
    pub fn len(&self) -> Result<usize, RateError> {
        let guard = self.state.lock().expect("rate cache lock poisoned");
        guard
            .as_ref()
            .map(|state| state.entries.len())
            .ok_or(RateError::Closed)
    }

    /// Returns `true` when the cache holds no entries.
    ///
    /// # Errors
    ///
    /// Returns [`RateError::Closed`] if the calculator has been shut down.
    pub fn is_empty(&self) -> Result<bool, RateError> {
        Ok(self.len()? == 0)
    }

    /// Releases all cache state. Idempotent; safe to call concurrently with
    /// in-flight `compute` calls, which either complete against the old
    /// state or observe the closed condition.
    pub fn shutdown(&self) {
        let mut guard = self.state.lock().expect("rate cache lock poisoned");
        if let Some(state) = guard.take() {
            debug!(entries = state.entries.len(), "rate calculator shut down");
        }
    }
}

impl Default for RateCalculator {
    fn default() -> Self {
        Self::new()
    }
}
