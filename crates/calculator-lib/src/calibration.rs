//! Calibration constants for the sizing formulas
//!
//! Every empirical number the sizers use lives here, grouped by pipeline
//! stage. The defaults form one consolidated formula set identified by
//! [`FORMULA_VERSION`]. They were fitted against a handful of measured
//! clusters and should be re-validated against real usage before they are
//! treated as more than a starting point.
//!
//! All structs deserialize with `#[serde(default)]`, so an override file only
//! needs the fields it changes.

use crate::error::{SizingError, SizingResult};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Version of the consolidated formula set
pub const FORMULA_VERSION: &str = "v3";

const MIB: f64 = 1024.0 * 1024.0;
const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Complete calibration for one calculation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SizingConfig {
    pub formula_version: String,
    pub storage: StorageCurve,
    pub collector: CollectorConstants,
    pub router: RouterConstants,
    pub ingestor: IngestorConstants,
    pub compactor: CompactorConstants,
    pub store: StoreConstants,
    pub query_frontend: QueryFrontendConstants,
    pub querier: QuerierConstants,
    pub limits: LimitPolicyConfig,
    pub floors: RequestFloors,
    pub safety: SafetyConstants,
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            formula_version: FORMULA_VERSION.to_string(),
            storage: StorageCurve::default(),
            collector: CollectorConstants::default(),
            router: RouterConstants::default(),
            ingestor: IngestorConstants::default(),
            compactor: CompactorConstants::default(),
            store: StoreConstants::default(),
            query_frontend: QueryFrontendConstants::default(),
            querier: QuerierConstants::default(),
            limits: LimitPolicyConfig::default(),
            floors: RequestFloors::default(),
            safety: SafetyConstants::default(),
        }
    }
}

/// Empirical object-storage curve.
///
/// Fitted to 5k series -> 4.3 GiB and 200k series -> ~104 GiB at 14d raw /
/// 90d 5m / 180d 1h retention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageCurve {
    /// Series count up to which the baseline multiplier applies
    pub taper_start_series: f64,
    /// Series count at which the multiplier reaches `taper_end_multiplier`
    pub taper_end_series: f64,
    pub baseline_multiplier: f64,
    pub taper_end_multiplier: f64,
    /// Applied on top of the curve
    pub safety_margin: f64,
    pub raw_bytes_per_series_day: f64,
    pub downsample_5m_bytes_per_series_day: f64,
    pub downsample_1h_bytes_per_series_day: f64,
}

impl Default for StorageCurve {
    fn default() -> Self {
        Self {
            taper_start_series: 200_000.0,
            taper_end_series: 2_000_000.0,
            baseline_multiplier: 1.0,
            // 0.45 / 0.52: relative saving measured between 200k and 2M series
            taper_end_multiplier: 0.865,
            safety_margin: 1.10,
            raw_bytes_per_series_day: 38_000.0,
            downsample_5m_bytes_per_series_day: 3_000.0,
            downsample_1h_bytes_per_series_day: 300.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConstants {
    /// Samples per second one core can forward
    pub dps_per_core: f64,
    pub base_memory_bytes: f64,
    /// Memory added per 1000 samples per second
    pub memory_per_thousand_dps_bytes: f64,
    pub replicas: u32,
}

impl Default for CollectorConstants {
    fn default() -> Self {
        Self {
            dps_per_core: 20_000.0,
            base_memory_bytes: 512.0 * MIB,
            memory_per_thousand_dps_bytes: GIB,
            replicas: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConstants {
    pub dps_per_replica: f64,
    pub min_replicas: u32,
    pub cpu_per_replica: f64,
    pub memory_per_replica_bytes: f64,
}

impl Default for RouterConstants {
    fn default() -> Self {
        Self {
            dps_per_replica: 30_000.0,
            min_replicas: 2,
            cpu_per_replica: 1.0,
            memory_per_replica_bytes: 2.0 * GIB,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestorConstants {
    pub max_series_per_shard: f64,
    /// Head block plus replication copy per series
    pub memory_per_series_bytes: f64,
    pub dps_per_core: f64,
    pub qps_per_core: f64,
    pub wal_window_secs: f64,
    /// WAL segments kept while the head is cut and replayed
    pub wal_retention_factor: f64,
    pub bytes_per_sample: f64,
    /// Hours covered by the in-memory head; only retention beyond it hits local blocks
    pub head_window_hours: f64,
}

impl Default for IngestorConstants {
    fn default() -> Self {
        Self {
            max_series_per_shard: 4_000_000.0,
            memory_per_series_bytes: 12_288.0,
            dps_per_core: 15_000.0,
            qps_per_core: 5.0,
            wal_window_secs: 7_200.0,
            wal_retention_factor: 3.0,
            bytes_per_sample: 6.0,
            head_window_hours: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompactorConstants {
    /// Uncompressed bytes per sample written to blocks
    pub bytes_per_sample: f64,
    pub max_block_days: f64,
    pub scratch_safety_multiplier: f64,
    /// Lower bound of the series-in-thousands term fed to log10
    pub min_series_thousands: f64,
    pub base_memory_gib: f64,
    pub memory_gib_per_decade: f64,
    pub min_memory_gib: f64,
    pub max_memory_gib: f64,
    pub base_cpu: f64,
    pub cpu_per_decade: f64,
    pub min_cpu: f64,
    pub max_cpu: f64,
}

impl Default for CompactorConstants {
    fn default() -> Self {
        Self {
            bytes_per_sample: 1.5,
            max_block_days: 14.0,
            scratch_safety_multiplier: 3.0,
            min_series_thousands: 10.0,
            base_memory_gib: 2.0,
            memory_gib_per_decade: 5.0,
            min_memory_gib: 2.0,
            max_memory_gib: 32.0,
            base_cpu: 2.0,
            cpu_per_decade: 1.2,
            min_cpu: 2.0,
            max_cpu: 8.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConstants {
    pub base_memory_bytes: f64,
    pub index_bytes_per_series: f64,
    /// Index cost per series once the taper has fully applied
    pub large_cluster_index_bytes_per_series: f64,
    pub index_taper_start_series: f64,
    pub index_taper_end_series: f64,
    pub memory_headroom: f64,
    pub series_per_core: f64,
    pub qps_per_core: f64,
    pub min_cpu: f64,
    pub replicas: u32,
    /// Share of object storage kept as local block cache
    pub cache_fraction: f64,
    pub large_cluster_cache_fraction: f64,
    pub cache_taper_start_series: f64,
    pub cache_taper_end_series: f64,
}

impl Default for StoreConstants {
    fn default() -> Self {
        Self {
            base_memory_bytes: 2.0 * GIB,
            index_bytes_per_series: 2_000.0,
            large_cluster_index_bytes_per_series: 1_400.0,
            index_taper_start_series: 200_000.0,
            index_taper_end_series: 10_000_000.0,
            memory_headroom: 1.2,
            series_per_core: 1_500_000.0,
            qps_per_core: 15.0,
            min_cpu: 1.0,
            replicas: 1,
            cache_fraction: 0.10,
            large_cluster_cache_fraction: 0.05,
            cache_taper_start_series: 1_000_000.0,
            cache_taper_end_series: 10_000_000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryFrontendConstants {
    pub qps_per_replica: f64,
    pub base_cpu: f64,
    /// Series merged per additional core
    pub series_per_core: f64,
    pub base_memory_bytes: f64,
    pub series_per_gib: f64,
    /// Share of one query's complexity cached per pod
    pub complexity_memory_ratio: f64,
}

impl Default for QueryFrontendConstants {
    fn default() -> Self {
        Self {
            qps_per_replica: 25.0,
            base_cpu: 1.0,
            series_per_core: 1_500_000.0,
            base_memory_bytes: 2.0 * GIB,
            series_per_gib: 100_000.0,
            complexity_memory_ratio: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuerierConstants {
    pub qps_per_replica: f64,
    pub cpu_per_replica: f64,
    pub series_per_gib: f64,
}

impl Default for QuerierConstants {
    fn default() -> Self {
        Self {
            qps_per_replica: 20.0,
            cpu_per_replica: 2.5,
            series_per_gib: 100_000.0,
        }
    }
}

/// Request-to-limit multipliers for one stage
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LimitMultipliers {
    pub cpu: f64,
    pub memory: f64,
}

impl LimitMultipliers {
    pub const fn new(cpu: f64, memory: f64) -> Self {
        Self { cpu, memory }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitPolicyConfig {
    pub collector: LimitMultipliers,
    pub router: LimitMultipliers,
    pub ingestor: LimitMultipliers,
    pub compactor: LimitMultipliers,
    pub store: LimitMultipliers,
    pub query_frontend: LimitMultipliers,
    pub querier: LimitMultipliers,
    /// CPU requests below this get at least `min_cpu_buffer_cores` of headroom
    pub small_cpu_request_cores: f64,
    pub min_cpu_buffer_cores: f64,
    /// Memory requests below this get at least `min_memory_buffer_bytes` of headroom
    pub small_memory_request_bytes: f64,
    pub min_memory_buffer_bytes: f64,
    /// Memory requests above this have their multiplier damped toward 1.0
    pub large_memory_request_bytes: f64,
    /// Share of the multiplier's extra portion removed for large requests
    pub large_memory_damping: f64,
}

impl Default for LimitPolicyConfig {
    fn default() -> Self {
        Self {
            collector: LimitMultipliers::new(2.0, 1.5),
            router: LimitMultipliers::new(2.0, 1.25),
            ingestor: LimitMultipliers::new(1.5, 1.25),
            compactor: LimitMultipliers::new(1.5, 1.25),
            store: LimitMultipliers::new(2.0, 1.5),
            query_frontend: LimitMultipliers::new(2.0, 1.5),
            querier: LimitMultipliers::new(2.0, 1.5),
            small_cpu_request_cores: 0.5,
            min_cpu_buffer_cores: 0.3,
            small_memory_request_bytes: 2.0 * GIB,
            min_memory_buffer_bytes: GIB,
            large_memory_request_bytes: 100.0 * GIB,
            large_memory_damping: 0.3,
        }
    }
}

/// Minimum requests applied before limits are derived
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestFloors {
    pub min_cpu_cores: f64,
    pub min_memory_bytes: f64,
}

impl Default for RequestFloors {
    fn default() -> Self {
        Self {
            min_cpu_cores: 0.1,
            min_memory_bytes: 64.0 * MIB,
        }
    }
}

/// Coefficients of the advisory safety report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetyConstants {
    /// Seconds of ingest a single write request may carry
    pub receive_request_window_secs: f64,
    pub min_receive_request_limit: u64,
    pub dps_per_receive_worker: f64,
    pub min_receive_concurrency: u32,
    pub query_concurrency_per_qps: f64,
    pub min_query_concurrency: u32,
    pub series_per_store_slot: f64,
    pub min_store_concurrency: u32,
    /// Samples per series a single store request may touch
    pub store_samples_per_series: f64,
    pub min_store_sample_limit: u64,
    /// Object storage above which time-partitioned store gateways are advised
    pub store_partition_threshold_bytes: f64,
}

impl Default for SafetyConstants {
    fn default() -> Self {
        Self {
            receive_request_window_secs: 5.0,
            min_receive_request_limit: 10_000,
            dps_per_receive_worker: 25_000.0,
            min_receive_concurrency: 4,
            query_concurrency_per_qps: 2.0,
            min_query_concurrency: 20,
            series_per_store_slot: 50_000.0,
            min_store_concurrency: 20,
            store_samples_per_series: 240.0,
            min_store_sample_limit: 50_000_000,
            store_partition_threshold_bytes: 1024.0 * GIB,
        }
    }
}

impl SizingConfig {
    /// Load a (partial) calibration override from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read calibration file {}", path.display()))?;
        let config: SizingConfig =
            serde_json::from_str(&content).context("Failed to parse calibration file")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject calibrations that would make the formulas meaningless
    pub fn validate(&self) -> SizingResult<()> {
        let s = &self.storage;
        require(
            s.taper_start_series < s.taper_end_series,
            "storage taper_start_series must be below taper_end_series",
        )?;
        require(
            s.taper_end_multiplier > 0.0
                && s.taper_end_multiplier <= s.baseline_multiplier
                && s.baseline_multiplier <= 1.0,
            "storage multipliers must satisfy 0 < taper_end_multiplier <= baseline_multiplier <= 1",
        )?;
        require(s.safety_margin >= 1.0, "storage safety_margin must be >= 1")?;
        require(
            s.raw_bytes_per_series_day >= 0.0
                && s.downsample_5m_bytes_per_series_day >= 0.0
                && s.downsample_1h_bytes_per_series_day >= 0.0,
            "storage tier costs must be >= 0",
        )?;

        positive(self.collector.dps_per_core, "collector dps_per_core")?;
        require(self.collector.replicas >= 1, "collector replicas must be >= 1")?;
        positive(self.router.dps_per_replica, "router dps_per_replica")?;
        require(self.router.min_replicas >= 1, "router min_replicas must be >= 1")?;
        positive(self.ingestor.max_series_per_shard, "ingestor max_series_per_shard")?;
        positive(self.ingestor.dps_per_core, "ingestor dps_per_core")?;
        positive(self.ingestor.qps_per_core, "ingestor qps_per_core")?;

        let c = &self.compactor;
        positive(c.min_series_thousands, "compactor min_series_thousands")?;
        require(
            c.min_memory_gib <= c.max_memory_gib,
            "compactor min_memory_gib must not exceed max_memory_gib",
        )?;
        require(c.min_cpu <= c.max_cpu, "compactor min_cpu must not exceed max_cpu")?;

        let st = &self.store;
        require(st.replicas >= 1, "store replicas must be >= 1")?;
        positive(st.series_per_core, "store series_per_core")?;
        positive(st.qps_per_core, "store qps_per_core")?;
        require(st.memory_headroom >= 1.0, "store memory_headroom must be >= 1")?;
        require(
            st.index_taper_start_series < st.index_taper_end_series
                && st.cache_taper_start_series < st.cache_taper_end_series,
            "store taper start thresholds must be below their end thresholds",
        )?;
        require(
            fraction(st.cache_fraction) && fraction(st.large_cluster_cache_fraction),
            "store cache fractions must be within (0, 1]",
        )?;

        positive(self.query_frontend.qps_per_replica, "query_frontend qps_per_replica")?;
        positive(self.query_frontend.series_per_core, "query_frontend series_per_core")?;
        positive(self.query_frontend.series_per_gib, "query_frontend series_per_gib")?;
        positive(self.querier.qps_per_replica, "querier qps_per_replica")?;
        positive(self.querier.series_per_gib, "querier series_per_gib")?;

        let l = &self.limits;
        for (name, m) in [
            ("collector", l.collector),
            ("router", l.router),
            ("ingestor", l.ingestor),
            ("compactor", l.compactor),
            ("store", l.store),
            ("query_frontend", l.query_frontend),
            ("querier", l.querier),
        ] {
            require(
                m.cpu >= 1.0 && m.memory >= 1.0,
                &format!("{name} limit multipliers must be >= 1"),
            )?;
        }
        require(
            (0.0..=1.0).contains(&l.large_memory_damping),
            "large_memory_damping must be within [0, 1]",
        )?;

        positive(self.floors.min_cpu_cores, "floors min_cpu_cores")?;
        positive(self.floors.min_memory_bytes, "floors min_memory_bytes")?;
        positive(self.safety.dps_per_receive_worker, "safety dps_per_receive_worker")?;
        positive(self.safety.series_per_store_slot, "safety series_per_store_slot")?;

        Ok(())
    }
}

fn require(condition: bool, message: &str) -> SizingResult<()> {
    if condition {
        Ok(())
    } else {
        Err(SizingError::InvalidCalibration(message.to_string()))
    }
}

fn positive(value: f64, name: &str) -> SizingResult<()> {
    require(value > 0.0, &format!("{name} must be > 0"))
}

fn fraction(value: f64) -> bool {
    value > 0.0 && value <= 1.0
}
