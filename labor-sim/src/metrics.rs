//! Per-tick metrics events and the sinks that receive them.
//!
//! With the `instrument` feature the default sink emits a `tracing` event
//! under the `tick` target, which `instrument::DataFrameSubscriber` turns into
//! one table row per tick.

use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

use crate::aggregate::{Aggregates, FrustrationIndex};

/// Tracing target for per-tick aggregates.
pub const TICK_TARGET: &str = "tick";
/// Tracing target for per-firm hiring records.
pub const HIRING_TARGET: &str = "hiring";

/// The model's externally meaningful outputs for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct TickMetrics {
    pub tick: u64,
    pub employment_total: usize,
    pub unemployment_rate: f64,
    pub i1: f64,
    pub i2: f64,
    pub i3: FrustrationIndex,
}

impl TickMetrics {
    pub fn from_aggregates(tick: u64, aggregates: &Aggregates) -> Self {
        Self {
            tick,
            employment_total: aggregates.employment_total,
            unemployment_rate: aggregates.unemployment_rate,
            i1: aggregates.i1,
            i2: aggregates.i2,
            i3: aggregates.i3,
        }
    }
}

/// Receives one event per completed tick.
pub trait MetricsSink {
    fn record(&mut self, metrics: &TickMetrics);
}

/// Emits each tick as a `tracing` event. Silent without the `instrument` feature.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl MetricsSink for TracingSink {
    fn record(&mut self, metrics: &TickMetrics) {
        #[cfg(feature = "instrument")]
        tracing::info!(
            target: "tick",
            tick = metrics.tick,
            employment_total = metrics.employment_total as u64,
            unemployment_rate = metrics.unemployment_rate,
            i1 = metrics.i1,
            i2 = metrics.i2,
            // Unbounded is carried by the flag; the ratio column reads 0 there
            i3 = metrics.i3.value().unwrap_or(0.0),
            i3_unbounded = metrics.i3.is_unbounded(),
        );
        #[cfg(not(feature = "instrument"))]
        let _ = metrics;
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl MetricsSink for NullSink {
    fn record(&mut self, _metrics: &TickMetrics) {}
}

/// In-memory history.
impl MetricsSink for Vec<TickMetrics> {
    fn record(&mut self, metrics: &TickMetrics) {
        self.push(*metrics);
    }
}

impl<S: MetricsSink + ?Sized> MetricsSink for &mut S {
    fn record(&mut self, metrics: &TickMetrics) {
        (**self).record(metrics);
    }
}
