//! Advisory runtime limits derived from the workload
//!
//! These are suggested flag values for the deployed components. They are
//! reported alongside a plan and never feed back into the sizing.

use super::Workload;
use crate::calibration::SafetyConstants;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyReport {
    /// Samples a single remote-write request may carry
    pub receive_request_limit: u64,
    /// Concurrent write workers per receiver
    pub receive_concurrency: u32,
    pub query_max_concurrent: u32,
    pub store_max_concurrency: u32,
    /// Samples a single store series request may touch
    pub store_series_sample_limit: u64,
    /// Whether store gateways should be split by time range
    pub partition_store_by_time: bool,
}

impl SafetyReport {
    pub fn derive(w: &Workload, object_storage_bytes: f64, c: &SafetyConstants) -> Self {
        let receive_request_limit = ((w.ingestion_rate * c.receive_request_window_secs).floor()
            as u64)
            .max(c.min_receive_request_limit);
        let receive_concurrency = ((w.ingestion_rate / c.dps_per_receive_worker).ceil() as u32)
            .max(c.min_receive_concurrency);
        let query_max_concurrent = ((w.query_rate * c.query_concurrency_per_qps).ceil() as u32)
            .max(c.min_query_concurrency);
        let store_max_concurrency = ((w.active_series / c.series_per_store_slot).floor() as u32)
            .max(c.min_store_concurrency);
        let store_series_sample_limit = ((w.active_series * c.store_samples_per_series).floor()
            as u64)
            .max(c.min_store_sample_limit);

        Self {
            receive_request_limit,
            receive_concurrency,
            query_max_concurrent,
            store_max_concurrency,
            store_series_sample_limit,
            partition_store_by_time: object_storage_bytes > c.store_partition_threshold_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WorkloadProfile;

    fn workload(series: u64, qps: f64) -> Workload {
        Workload::normalize(&WorkloadProfile {
            active_series: series,
            scrape_interval_secs: 15,
            query_rate: qps,
            performance_factor: 1.0,
            query_complexity_bytes: 0,
            local_retention_hours: 0,
            raw_retention_days: 0,
            downsample_5m_retention_days: 0,
            downsample_1h_retention_days: 0,
        })
    }

    #[test]
    fn test_small_workload_uses_minimums() {
        let report = SafetyReport::derive(&workload(1_000, 1.0), 0.0, &SafetyConstants::default());
        assert_eq!(report.receive_request_limit, 10_000);
        assert_eq!(report.receive_concurrency, 4);
        assert_eq!(report.query_max_concurrent, 20);
        assert_eq!(report.store_max_concurrency, 20);
        assert_eq!(report.store_series_sample_limit, 50_000_000);
        assert!(!report.partition_store_by_time);
    }

    #[test]
    fn test_large_workload_scales_linearly() {
        // 15M series at 15s = 1M dps
        let report = SafetyReport::derive(
            &workload(15_000_000, 40.0),
            2.0 * 1024.0 * 1024.0 * 1024.0 * 1024.0,
            &SafetyConstants::default(),
        );
        assert_eq!(report.receive_request_limit, 5_000_000);
        assert_eq!(report.receive_concurrency, 40);
        assert_eq!(report.query_max_concurrent, 80);
        assert_eq!(report.store_max_concurrency, 300);
        assert_eq!(report.store_series_sample_limit, 3_600_000_000);
        assert!(report.partition_store_by_time);
    }
}
