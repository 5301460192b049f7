//! Long-term object storage estimation
//!
//! Bytes per series-day shrink as a cluster grows (better compression and
//! index amortization), so each tier cost is scaled by a multiplier that
//! stays at its baseline up to `taper_start_series` and then falls linearly
//! until `taper_end_series`, where it levels off.

use super::taper;
use crate::calibration::StorageCurve;
use serde::{Deserialize, Serialize};

/// Retention per resolution tier, in days
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetentionWindows {
    pub raw_days: f64,
    pub downsample_5m_days: f64,
    pub downsample_1h_days: f64,
}

/// Object storage footprint broken down by tier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StorageEstimate {
    pub scale_multiplier: f64,
    pub raw_bytes: f64,
    pub downsample_5m_bytes: f64,
    pub downsample_1h_bytes: f64,
    pub total_bytes: f64,
}

pub struct StorageEstimator<'a> {
    curve: &'a StorageCurve,
}

impl<'a> StorageEstimator<'a> {
    pub fn new(curve: &'a StorageCurve) -> Self {
        Self { curve }
    }

    /// Per-series storage efficiency in (0, 1]
    pub fn scale_multiplier(&self, active_series: f64) -> f64 {
        taper(
            active_series,
            self.curve.taper_start_series,
            self.curve.taper_end_series,
            self.curve.baseline_multiplier,
            self.curve.taper_end_multiplier,
        )
    }

    pub fn estimate(&self, active_series: f64, retention: &RetentionWindows) -> StorageEstimate {
        let scale_multiplier = self.scale_multiplier(active_series);
        let per_day = |tier_cost: f64| tier_cost * scale_multiplier * self.curve.safety_margin;

        let raw_bytes =
            active_series * per_day(self.curve.raw_bytes_per_series_day) * retention.raw_days;
        let downsample_5m_bytes = active_series
            * per_day(self.curve.downsample_5m_bytes_per_series_day)
            * retention.downsample_5m_days;
        let downsample_1h_bytes = active_series
            * per_day(self.curve.downsample_1h_bytes_per_series_day)
            * retention.downsample_1h_days;

        StorageEstimate {
            scale_multiplier,
            raw_bytes,
            downsample_5m_bytes,
            downsample_1h_bytes,
            total_bytes: raw_bytes + downsample_5m_bytes + downsample_1h_bytes,
        }
    }
}
