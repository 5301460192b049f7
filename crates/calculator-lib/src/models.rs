//! Core data models for the resource calculator
//!
//! Input records use the camelCase field names of the calculator's JSON API.
//! Output records come in two shapes: numeric [`ComponentSizing`] values used
//! by the sizing core, and rendered [`ComponentResources`] holding canonical
//! Kubernetes quantity strings.

use crate::error::{SizingError, SizingResult};
use crate::sizing::SafetyReport;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

/// Accepted range for the performance/cost dial
pub const PERFORMANCE_FACTOR_RANGE: RangeInclusive<f64> = 1.0..=2.0;

/// Highest accepted query rate
pub const MAX_QUERY_RATE: f64 = 1_000_000.0;

/// Workload description for a full ingestion/query pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkloadProfile {
    /// Distinct time series currently ingested
    #[serde(rename = "activeSeries")]
    pub active_series: u64,
    /// Seconds between scrapes
    #[serde(rename = "interval")]
    pub scrape_interval_secs: u32,
    /// Sustained read queries per second
    #[serde(rename = "qps")]
    pub query_rate: f64,
    /// Cost/latency dial (1.0 cost optimized .. 2.0 low latency)
    #[serde(rename = "perfFactor")]
    pub performance_factor: f64,
    /// Memory cost of an average query in bytes
    #[serde(rename = "queryComplexity")]
    pub query_complexity_bytes: u64,
    #[serde(rename = "retLocalHours")]
    pub local_retention_hours: u32,
    #[serde(rename = "retRawDays")]
    pub raw_retention_days: u32,
    #[serde(rename = "ret5mDays")]
    pub downsample_5m_retention_days: u32,
    #[serde(rename = "ret1hDays")]
    pub downsample_1h_retention_days: u32,
}

impl WorkloadProfile {
    /// Range-check every field before the profile reaches the sizing core
    pub fn validate(&self) -> SizingResult<()> {
        validate_series(self.active_series)?;
        validate_interval(self.scrape_interval_secs)?;
        if !(0.0..=MAX_QUERY_RATE).contains(&self.query_rate) {
            return Err(SizingError::invalid_profile(
                "qps",
                format!("must be within [0, {}], got {}", MAX_QUERY_RATE, self.query_rate),
            ));
        }
        validate_performance_factor(self.performance_factor)
    }
}

/// Reduced input for the standalone collector calculation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectorProfile {
    #[serde(rename = "activeSeries")]
    pub active_series: u64,
    #[serde(rename = "interval")]
    pub scrape_interval_secs: u32,
    #[serde(rename = "perfFactor")]
    pub performance_factor: f64,
}

impl CollectorProfile {
    pub fn validate(&self) -> SizingResult<()> {
        validate_series(self.active_series)?;
        validate_interval(self.scrape_interval_secs)?;
        validate_performance_factor(self.performance_factor)
    }
}

impl From<&CollectorProfile> for WorkloadProfile {
    fn from(profile: &CollectorProfile) -> Self {
        Self {
            active_series: profile.active_series,
            scrape_interval_secs: profile.scrape_interval_secs,
            query_rate: 0.0,
            performance_factor: profile.performance_factor,
            query_complexity_bytes: 0,
            local_retention_hours: 0,
            raw_retention_days: 0,
            downsample_5m_retention_days: 0,
            downsample_1h_retention_days: 0,
        }
    }
}

/// Input for the object storage estimate alone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageProfile {
    #[serde(rename = "activeSeries")]
    pub active_series: u64,
    #[serde(rename = "retRawDays")]
    pub raw_retention_days: u32,
    #[serde(rename = "ret5mDays")]
    pub downsample_5m_retention_days: u32,
    #[serde(rename = "ret1hDays")]
    pub downsample_1h_retention_days: u32,
}

impl StorageProfile {
    pub fn validate(&self) -> SizingResult<()> {
        validate_series(self.active_series)
    }
}

impl From<&WorkloadProfile> for StorageProfile {
    fn from(profile: &WorkloadProfile) -> Self {
        Self {
            active_series: profile.active_series,
            raw_retention_days: profile.raw_retention_days,
            downsample_5m_retention_days: profile.downsample_5m_retention_days,
            downsample_1h_retention_days: profile.downsample_1h_retention_days,
        }
    }
}

fn validate_series(active_series: u64) -> SizingResult<()> {
    if active_series == 0 {
        return Err(SizingError::invalid_profile(
            "activeSeries",
            "must be greater than 0",
        ));
    }
    Ok(())
}

fn validate_interval(interval: u32) -> SizingResult<()> {
    if interval == 0 {
        return Err(SizingError::invalid_profile("interval", "must be greater than 0"));
    }
    Ok(())
}

fn validate_performance_factor(factor: f64) -> SizingResult<()> {
    if !PERFORMANCE_FACTOR_RANGE.contains(&factor) {
        return Err(SizingError::invalid_profile(
            "perfFactor",
            format!(
                "must be within [{}, {}], got {}",
                PERFORMANCE_FACTOR_RANGE.start(),
                PERFORMANCE_FACTOR_RANGE.end(),
                factor
            ),
        ));
    }
    Ok(())
}

/// Named positions of the performance/cost dial
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerformanceMode {
    CostOptimized,
    Balanced,
    LowLatency,
}

impl PerformanceMode {
    pub const ALL: [PerformanceMode; 3] = [
        PerformanceMode::CostOptimized,
        PerformanceMode::Balanced,
        PerformanceMode::LowLatency,
    ];

    pub fn factor(&self) -> f64 {
        match self {
            PerformanceMode::CostOptimized => 1.0,
            PerformanceMode::Balanced => 1.3,
            PerformanceMode::LowLatency => 2.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PerformanceMode::CostOptimized => "cost-optimized",
            PerformanceMode::Balanced => "balanced",
            PerformanceMode::LowLatency => "low-latency",
        }
    }
}

impl fmt::Display for PerformanceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PerformanceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                format!("unknown performance mode {s:?} (expected cost-optimized, balanced or low-latency)")
            })
    }
}

/// Typical per-query memory costs by query shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryComplexity {
    /// Instant queries
    Light,
    /// 1h range queries
    Medium,
    /// 1d-3d range queries
    Heavy,
    /// 30d+ ranges or high cardinality
    Extreme,
}

impl QueryComplexity {
    pub const ALL: [QueryComplexity; 4] = [
        QueryComplexity::Light,
        QueryComplexity::Medium,
        QueryComplexity::Heavy,
        QueryComplexity::Extreme,
    ];

    pub fn bytes(&self) -> u64 {
        const MIB: u64 = 1024 * 1024;
        match self {
            QueryComplexity::Light => 50 * MIB,
            QueryComplexity::Medium => 250 * MIB,
            QueryComplexity::Heavy => 1536 * MIB,
            QueryComplexity::Extreme => 3072 * MIB,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QueryComplexity::Light => "light",
            QueryComplexity::Medium => "medium",
            QueryComplexity::Heavy => "heavy",
            QueryComplexity::Extreme => "extreme",
        }
    }
}

impl fmt::Display for QueryComplexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryComplexity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|preset| preset.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                format!("unknown query complexity {s:?} (expected light, medium, heavy or extreme)")
            })
    }
}

/// Pipeline stages, in data-flow order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Component {
    #[serde(rename = "collector")]
    Collector,
    #[serde(rename = "receiver_router")]
    Router,
    #[serde(rename = "receiver_ingestor")]
    Ingestor,
    #[serde(rename = "compactor")]
    Compactor,
    #[serde(rename = "store")]
    Store,
    #[serde(rename = "query_frontend")]
    QueryFrontend,
    #[serde(rename = "query")]
    Querier,
}

impl Component {
    pub const ALL: [Component; 7] = [
        Component::Collector,
        Component::Router,
        Component::Ingestor,
        Component::Compactor,
        Component::Store,
        Component::QueryFrontend,
        Component::Querier,
    ];

    /// Everything except the collector, which is sized on its own
    pub const POOL: [Component; 6] = [
        Component::Router,
        Component::Ingestor,
        Component::Compactor,
        Component::Store,
        Component::QueryFrontend,
        Component::Querier,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Component::Collector => "collector",
            Component::Router => "receiver_router",
            Component::Ingestor => "receiver_ingestor",
            Component::Compactor => "compactor",
            Component::Store => "store",
            Component::QueryFrontend => "query_frontend",
            Component::Querier => "query",
        }
    }

    /// Stages that own persistent volumes
    pub fn is_stateful(&self) -> bool {
        matches!(
            self,
            Component::Ingestor | Component::Compactor | Component::Store
        )
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Cpu,
    Memory,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Cpu => f.write_str("cpu"),
            ResourceKind::Memory => f.write_str("memory"),
        }
    }
}

/// Numeric per-pod sizing of one stage
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComponentSizing {
    pub replicas: u32,
    pub request_cpu_cores: f64,
    pub request_memory_bytes: f64,
    pub limit_cpu_cores: f64,
    pub limit_memory_bytes: f64,
    /// Persistent volume per replica, stateful stages only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_bytes: Option<f64>,
}

/// A cpu/memory pair of quantity strings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceQuantities {
    pub cpu: String,
    pub memory: String,
}

/// Rendered sizing of one stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentResources {
    pub replicas: u32,
    pub requests: ResourceQuantities,
    pub limits: ResourceQuantities,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<String>,
}

/// Rendered cluster-wide totals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TotalsResponse {
    pub pods: u32,
    pub cpu_cores: f64,
    pub cpu: String,
    pub memory: String,
    pub storage: String,
}

/// Response of the standalone collector calculation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectorResponse {
    pub formula_version: String,
    pub dps: u64,
    #[serde(flatten)]
    pub resources: ComponentResources,
}

/// Response of the full and pool calculations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanResponse {
    pub formula_version: String,
    pub dps: u64,
    pub components: BTreeMap<Component, ComponentResources>,
    /// Estimated long-term object storage
    pub s3: String,
    pub totals: TotalsResponse,
    pub safety: SafetyReport,
}

/// Response of the object storage estimate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageResponse {
    pub formula_version: String,
    pub scale_multiplier: f64,
    pub raw: String,
    pub downsample_5m: String,
    pub downsample_1h: String,
    pub total: String,
    pub total_bytes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_profile() -> WorkloadProfile {
        WorkloadProfile {
            active_series: 100_000,
            scrape_interval_secs: 60,
            query_rate: 15.0,
            performance_factor: 1.3,
            query_complexity_bytes: QueryComplexity::Medium.bytes(),
            local_retention_hours: 6,
            raw_retention_days: 14,
            downsample_5m_retention_days: 90,
            downsample_1h_retention_days: 365,
        }
    }

    #[test]
    fn test_profile_deserializes_api_field_names() {
        let json = r#"{
            "activeSeries": 100000,
            "interval": 60,
            "qps": 15,
            "perfFactor": 1.3,
            "queryComplexity": 268435456,
            "retLocalHours": 6,
            "retRawDays": 14,
            "ret5mDays": 90,
            "ret1hDays": 365
        }"#;
        let profile: WorkloadProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile, sample_profile());
    }

    #[test]
    fn test_valid_profile_passes() {
        assert!(sample_profile().validate().is_ok());
    }

    #[test]
    fn test_zero_series_rejected() {
        let mut profile = sample_profile();
        profile.active_series = 0;
        let err = profile.validate().unwrap_err();
        assert!(matches!(
            err,
            SizingError::InvalidProfile { field: "activeSeries", .. }
        ));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut profile = sample_profile();
        profile.scrape_interval_secs = 0;
        assert!(profile.validate().is_err());
    }

    #[test]
    fn test_performance_factor_bounds() {
        let mut profile = sample_profile();
        profile.performance_factor = 2.0;
        assert!(profile.validate().is_ok());
        profile.performance_factor = 2.01;
        assert!(profile.validate().is_err());
        profile.performance_factor = 0.9;
        assert!(profile.validate().is_err());
        profile.performance_factor = f64::NAN;
        assert!(profile.validate().is_err());
    }

    #[test]
    fn test_negative_qps_rejected() {
        let mut profile = sample_profile();
        profile.query_rate = -1.0;
        let err = profile.validate().unwrap_err();
        assert!(matches!(err, SizingError::InvalidProfile { field: "qps", .. }));
    }

    #[test]
    fn test_qps_upper_bound() {
        let mut profile = sample_profile();
        profile.query_rate = MAX_QUERY_RATE;
        assert!(profile.validate().is_ok());

        for qps in [MAX_QUERY_RATE + 1.0, 1.0e11, f64::INFINITY, f64::NAN] {
            profile.query_rate = qps;
            let err = profile.validate().unwrap_err();
            assert!(matches!(err, SizingError::InvalidProfile { field: "qps", .. }));
        }
    }

    #[test]
    fn test_collector_profile_widens_with_zeroes() {
        let collector = CollectorProfile {
            active_series: 5_000,
            scrape_interval_secs: 30,
            performance_factor: 1.0,
        };
        let profile = WorkloadProfile::from(&collector);
        assert_eq!(profile.active_series, 5_000);
        assert_eq!(profile.query_rate, 0.0);
        assert_eq!(profile.raw_retention_days, 0);
        assert!(profile.validate().is_ok());
    }

    #[test]
    fn test_presets_parse() {
        assert_eq!(
            "balanced".parse::<PerformanceMode>().unwrap().factor(),
            1.3
        );
        assert_eq!(
            "Low-Latency".parse::<PerformanceMode>().unwrap(),
            PerformanceMode::LowLatency
        );
        assert!("turbo".parse::<PerformanceMode>().is_err());
        assert_eq!(
            "heavy".parse::<QueryComplexity>().unwrap().bytes(),
            1_610_612_736
        );
        assert_eq!(QueryComplexity::Light.bytes(), 52_428_800);
    }

    #[test]
    fn test_component_keys_match_api_names() {
        for component in Component::ALL {
            let key = serde_json::to_value(component).unwrap();
            assert_eq!(key, component.as_str());
        }
        assert!(Component::Store.is_stateful());
        assert!(!Component::Router.is_stateful());
    }
}
