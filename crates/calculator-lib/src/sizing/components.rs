//! Per-component sizing formulas
//!
//! Each sizer maps the normalized [`Workload`] to a per-pod [`RawSizing`].
//! Sizers are independent of each other; only the store reads the object
//! storage estimate. Requests are not floored here and limits are not
//! derived here; that happens when the plan is assembled.

use super::{taper, StorageEstimate, Workload, GIB, SECONDS_PER_DAY, SECONDS_PER_HOUR};
use crate::calibration::{
    CollectorConstants, CompactorConstants, IngestorConstants, QuerierConstants,
    QueryFrontendConstants, RouterConstants, SizingConfig, StoreConstants,
};
use crate::models::Component;

/// Per-pod output of a sizer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawSizing {
    pub replicas: u32,
    pub cpu_cores: f64,
    pub memory_bytes: f64,
    pub storage_bytes: Option<f64>,
}

/// Run the sizer for `component`
pub fn size_component(
    component: Component,
    workload: &Workload,
    storage: &StorageEstimate,
    config: &SizingConfig,
) -> RawSizing {
    match component {
        Component::Collector => size_collector(workload, &config.collector),
        Component::Router => size_router(workload, &config.router),
        Component::Ingestor => size_ingestor(workload, &config.ingestor),
        Component::Compactor => size_compactor(workload, &config.compactor),
        Component::Store => size_store(workload, storage, &config.store),
        Component::QueryFrontend => size_query_frontend(workload, &config.query_frontend),
        Component::Querier => size_querier(workload, &config.querier),
    }
}

/// Ceil a fractional replica count, never going below `min`
fn replicas_for(value: f64, min: u32) -> u32 {
    (value.max(0.0).ceil() as u32).max(min)
}

fn size_collector(w: &Workload, c: &CollectorConstants) -> RawSizing {
    let cpu = (w.ingestion_rate / c.dps_per_core * w.performance_factor)
        .ceil()
        .max(1.0);
    let memory = c.base_memory_bytes + w.ingestion_rate / 1_000.0 * c.memory_per_thousand_dps_bytes;

    RawSizing {
        replicas: c.replicas,
        cpu_cores: cpu,
        memory_bytes: memory,
        storage_bytes: None,
    }
}

fn size_router(w: &Workload, c: &RouterConstants) -> RawSizing {
    RawSizing {
        replicas: replicas_for(w.ingestion_rate / c.dps_per_replica, c.min_replicas),
        cpu_cores: c.cpu_per_replica * w.performance_factor,
        memory_bytes: c.memory_per_replica_bytes,
        storage_bytes: None,
    }
}

fn size_ingestor(w: &Workload, c: &IngestorConstants) -> RawSizing {
    let shards = replicas_for(w.active_series / c.max_series_per_shard, 1);
    let per_shard = f64::from(shards);

    let ingest_cpu = w.ingestion_rate / c.dps_per_core;
    let query_cpu = w.query_rate / c.qps_per_core;
    let cpu = ((ingest_cpu + query_cpu) * w.performance_factor).ceil();

    let memory = w.active_series * c.memory_per_series_bytes + w.query_memory_bytes();

    let wal_bytes =
        w.ingestion_rate * c.wal_window_secs * c.wal_retention_factor * c.bytes_per_sample;
    let local_block_bytes = if w.local_retention_hours > c.head_window_hours {
        let retention_secs = (w.local_retention_hours - c.head_window_hours) * SECONDS_PER_HOUR;
        w.ingestion_rate * retention_secs * c.bytes_per_sample
    } else {
        0.0
    };

    RawSizing {
        replicas: shards,
        cpu_cores: cpu / per_shard,
        memory_bytes: memory / per_shard,
        storage_bytes: Some((wal_bytes + local_block_bytes) / per_shard),
    }
}

fn size_compactor(w: &Workload, c: &CompactorConstants) -> RawSizing {
    let daily_bytes = w.ingestion_rate * SECONDS_PER_DAY * c.bytes_per_sample;
    let block_days = w.retention.raw_days.min(c.max_block_days);
    let scratch_bytes = daily_bytes * block_days * c.scratch_safety_multiplier;

    // Compaction cost grows with the number of decades of cardinality
    let decades = (w.active_series / 1_000.0)
        .max(c.min_series_thousands)
        .log10();
    let memory_gib = (c.base_memory_gib + decades * c.memory_gib_per_decade)
        .clamp(c.min_memory_gib, c.max_memory_gib);
    let cpu = (c.base_cpu + decades * c.cpu_per_decade)
        .ceil()
        .clamp(c.min_cpu, c.max_cpu);

    RawSizing {
        replicas: 1,
        cpu_cores: cpu,
        memory_bytes: memory_gib * GIB,
        storage_bytes: Some(scratch_bytes),
    }
}

fn size_store(w: &Workload, storage: &StorageEstimate, c: &StoreConstants) -> RawSizing {
    let index_bytes_per_series = taper(
        w.active_series,
        c.index_taper_start_series,
        c.index_taper_end_series,
        c.index_bytes_per_series,
        c.large_cluster_index_bytes_per_series,
    );
    let memory = (c.base_memory_bytes
        + w.active_series * index_bytes_per_series
        + w.query_memory_bytes())
        * c.memory_headroom;

    let cpu = ((w.active_series / c.series_per_core + w.query_rate / c.qps_per_core)
        * w.performance_factor)
        .ceil()
        .max(c.min_cpu);

    let cache_fraction = taper(
        w.active_series,
        c.cache_taper_start_series,
        c.cache_taper_end_series,
        c.cache_fraction,
        c.large_cluster_cache_fraction,
    );

    RawSizing {
        replicas: c.replicas,
        cpu_cores: cpu,
        memory_bytes: memory / f64::from(c.replicas),
        storage_bytes: Some(storage.total_bytes * cache_fraction),
    }
}

fn size_query_frontend(w: &Workload, c: &QueryFrontendConstants) -> RawSizing {
    let cpu = ((c.base_cpu + w.active_series / c.series_per_core) * w.performance_factor).ceil();
    let memory = (c.base_memory_bytes
        + w.active_series / c.series_per_gib * GIB
        + c.complexity_memory_ratio * w.query_complexity_bytes)
        * w.performance_factor;

    RawSizing {
        replicas: replicas_for(w.query_rate / c.qps_per_replica, 1),
        cpu_cores: cpu,
        memory_bytes: memory,
        storage_bytes: None,
    }
}

fn size_querier(w: &Workload, c: &QuerierConstants) -> RawSizing {
    let replicas = ((w.query_rate / c.qps_per_replica).floor() as u32).saturating_add(1);
    let per_replica = f64::from(replicas);

    let cpu = (per_replica * c.cpu_per_replica * w.performance_factor).ceil();
    let memory = (w.active_series / c.series_per_gib * GIB + w.query_memory_bytes())
        * w.performance_factor;

    RawSizing {
        replicas,
        cpu_cores: cpu / per_replica,
        memory_bytes: memory / per_replica,
        storage_bytes: None,
    }
}
