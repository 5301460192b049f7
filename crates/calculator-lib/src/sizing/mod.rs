//! Multi-component sizing model
//!
//! Turns a [`WorkloadProfile`] into a [`ResourcePlan`]:
//! - normalize the profile once (ingestion rate, clamped interval)
//! - run the storage estimator and the seven per-component sizers
//! - floor requests, derive limits and check `limit >= request`
//! - aggregate cluster totals and the advisory safety report
//!
//! Rendering a plan formats every number as a Kubernetes quantity and checks
//! each string against its canonical pattern.

mod components;
mod limits;
mod plan;
mod quantity;
mod safety;
mod storage;

#[cfg(test)]
mod tests;

pub use components::{size_component, RawSizing};
pub use limits::{ensure_limit, LimitPolicy};
pub use plan::{
    calculate, collector_resources, estimate_storage, plan, plan_components, pool_resources,
    ClusterTotals, ResourcePlan,
};
pub use quantity::{
    format_bytes, format_cores, render_bytes, render_cores, validate_quantity,
    CPU_CLAMP_THRESHOLD_CORES, MIN_CPU_QUANTITY, ZERO_QUANTITY,
};
pub use safety::SafetyReport;
pub use storage::{RetentionWindows, StorageEstimate, StorageEstimator};

use crate::models::WorkloadProfile;

pub(crate) const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

const SECONDS_PER_HOUR: f64 = 3_600.0;
const SECONDS_PER_DAY: f64 = 86_400.0;

/// Workload profile normalized for arithmetic.
///
/// The ingestion rate is derived here exactly once; every sizer reads it
/// from this struct.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Workload {
    pub active_series: f64,
    /// Scrape interval clamped to at least one second
    pub scrape_interval_secs: f64,
    /// Samples per second
    pub ingestion_rate: f64,
    pub query_rate: f64,
    pub performance_factor: f64,
    pub query_complexity_bytes: f64,
    pub local_retention_hours: f64,
    pub retention: RetentionWindows,
}

impl Workload {
    pub fn normalize(profile: &WorkloadProfile) -> Self {
        let active_series = profile.active_series as f64;
        let scrape_interval_secs = f64::from(profile.scrape_interval_secs.max(1));

        Self {
            active_series,
            scrape_interval_secs,
            ingestion_rate: active_series / scrape_interval_secs,
            query_rate: profile.query_rate,
            performance_factor: profile.performance_factor,
            query_complexity_bytes: profile.query_complexity_bytes as f64,
            local_retention_hours: f64::from(profile.local_retention_hours),
            retention: RetentionWindows {
                raw_days: f64::from(profile.raw_retention_days),
                downsample_5m_days: f64::from(profile.downsample_5m_retention_days),
                downsample_1h_days: f64::from(profile.downsample_1h_retention_days),
            },
        }
    }

    /// Memory held by concurrently executing queries
    pub fn query_memory_bytes(&self) -> f64 {
        self.query_rate * self.query_complexity_bytes
    }

    /// Ingestion rate as reported to users
    pub fn dps(&self) -> u64 {
        self.ingestion_rate.floor() as u64
    }
}

/// Linear interpolation from `from` to `to` as `value` moves from `start`
/// to `end`, flat outside that range
pub(crate) fn taper(value: f64, start: f64, end: f64, from: f64, to: f64) -> f64 {
    if value <= start {
        return from;
    }
    let factor = ((value - start) / (end - start)).min(1.0);
    from - factor * (from - to)
}

#[cfg(test)]
mod workload_tests {
    use super::*;

    fn profile(series: u64, interval: u32) -> WorkloadProfile {
        WorkloadProfile {
            active_series: series,
            scrape_interval_secs: interval,
            query_rate: 0.0,
            performance_factor: 1.0,
            query_complexity_bytes: 0,
            local_retention_hours: 0,
            raw_retention_days: 0,
            downsample_5m_retention_days: 0,
            downsample_1h_retention_days: 0,
        }
    }

    #[test]
    fn test_ingestion_rate() {
        let workload = Workload::normalize(&profile(100_000, 60));
        assert!((workload.ingestion_rate - 1666.666_666).abs() < 1e-3);
        assert_eq!(workload.dps(), 1666);
    }

    #[test]
    fn test_zero_interval_treated_as_one() {
        let workload = Workload::normalize(&profile(5_000, 0));
        assert_eq!(workload.scrape_interval_secs, 1.0);
        assert_eq!(workload.ingestion_rate, 5_000.0);
    }

    #[test]
    fn test_taper() {
        assert_eq!(taper(10.0, 100.0, 200.0, 2.0, 1.0), 2.0);
        assert_eq!(taper(100.0, 100.0, 200.0, 2.0, 1.0), 2.0);
        assert_eq!(taper(150.0, 100.0, 200.0, 2.0, 1.0), 1.5);
        assert_eq!(taper(500.0, 100.0, 200.0, 2.0, 1.0), 1.0);
    }
}
