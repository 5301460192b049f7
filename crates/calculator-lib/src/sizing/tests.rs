use super::*;
use crate::calibration::{LimitMultipliers, SizingConfig};
use crate::error::SizingError;
use crate::models::{
    CollectorProfile, Component, ResourceKind, StorageProfile, WorkloadProfile, MAX_QUERY_RATE,
};

fn reference_profile() -> WorkloadProfile {
    WorkloadProfile {
        active_series: 100_000,
        scrape_interval_secs: 60,
        query_rate: 10.0,
        performance_factor: 1.3,
        query_complexity_bytes: 50_000_000,
        local_retention_hours: 6,
        raw_retention_days: 14,
        downsample_5m_retention_days: 30,
        downsample_1h_retention_days: 90,
    }
}

fn profile_with(series: u64, qps: f64, perf: f64) -> WorkloadProfile {
    WorkloadProfile {
        active_series: series,
        query_rate: qps,
        performance_factor: perf,
        ..reference_profile()
    }
}

#[test]
fn test_reference_cluster_plan() {
    let config = SizingConfig::default();
    let response = calculate(&reference_profile(), &config).unwrap();

    assert_eq!(response.formula_version, "v3");
    assert_eq!(response.dps, 1666);
    assert_eq!(response.components.len(), 7);

    let router = &response.components[&Component::Router];
    assert_eq!(router.replicas, 2);
    assert_eq!(router.requests.cpu, "1300m");
    assert_eq!(router.requests.memory, "2Gi");
    assert_eq!(router.limits.cpu, "2600m");
    assert!(router.storage.is_none());

    let ingestor = &response.components[&Component::Ingestor];
    assert_eq!(ingestor.replicas, 1);
    assert_eq!(ingestor.requests.cpu, "3");
    assert_eq!(ingestor.requests.memory, "2Gi");
    assert_eq!(ingestor.storage.as_deref(), Some("344Mi"));

    let compactor = &response.components[&Component::Compactor];
    assert_eq!(compactor.replicas, 1);
    assert_eq!(compactor.requests.cpu, "5");
    assert_eq!(compactor.requests.memory, "12Gi");
    assert_eq!(compactor.storage.as_deref(), Some("9Gi"));

    let store = &response.components[&Component::Store];
    assert_eq!(store.replicas, 1);
    assert_eq!(store.storage.as_deref(), Some("7Gi"));

    assert_eq!(response.components[&Component::Collector].replicas, 1);
    assert_eq!(response.components[&Component::Querier].replicas, 1);
    assert_eq!(response.s3, "67Gi");
    assert_eq!(response.totals.pods, 8);
}

#[test]
fn test_reference_plan_quantities_are_canonical() {
    let config = SizingConfig::default();
    let response = calculate(&reference_profile(), &config).unwrap();

    for (component, resources) in &response.components {
        for cpu in [&resources.requests.cpu, &resources.limits.cpu] {
            assert!(
                validate_quantity(ResourceKind::Cpu, cpu).is_ok(),
                "{component} cpu {cpu}"
            );
        }
        for memory in [&resources.requests.memory, &resources.limits.memory]
            .into_iter()
            .chain(resources.storage.as_ref())
        {
            assert!(
                validate_quantity(ResourceKind::Memory, memory).is_ok(),
                "{component} bytes {memory}"
            );
        }
    }
}

#[test]
fn test_totals_sum_requests_across_replicas() {
    let config = SizingConfig::default();
    let plan = plan(&reference_profile(), &config).unwrap();

    let expected_cpu: f64 = plan
        .components
        .values()
        .map(|s| s.request_cpu_cores * f64::from(s.replicas))
        .sum();
    let expected_pods: u32 = plan.components.values().map(|s| s.replicas).sum();

    assert!((plan.totals.cpu_cores - expected_cpu).abs() < 1e-9);
    assert_eq!(plan.totals.pods, expected_pods);
}

#[test]
fn test_pool_excludes_collector() {
    let config = SizingConfig::default();
    let response = pool_resources(&reference_profile(), &config).unwrap();

    assert_eq!(response.components.len(), 6);
    assert!(!response.components.contains_key(&Component::Collector));
    assert!(response.components.contains_key(&Component::Querier));
}

#[test]
fn test_collector_alone() {
    let config = SizingConfig::default();
    let response = collector_resources(
        &CollectorProfile {
            active_series: 100_000,
            scrape_interval_secs: 60,
            performance_factor: 1.3,
        },
        &config,
    )
    .unwrap();

    assert_eq!(response.dps, 1666);
    assert_eq!(response.resources.replicas, 1);
    assert_eq!(response.resources.requests.cpu, "1");
    assert_eq!(response.resources.requests.memory, "3Gi");
    assert_eq!(response.resources.limits.cpu, "2");
    assert_eq!(response.resources.limits.memory, "4Gi");
}

#[test]
fn test_storage_estimate_matches_plan() {
    let config = SizingConfig::default();
    let profile = reference_profile();
    let storage = estimate_storage(&StorageProfile::from(&profile), &config).unwrap();
    let plan = calculate(&profile, &config).unwrap();

    assert_eq!(storage.total, plan.s3);
    assert_eq!(storage.scale_multiplier, 1.0);
    assert!(storage.total_bytes > 70_000_000_000);
}

#[test]
fn test_limits_never_below_requests() {
    let config = SizingConfig::default();

    for series in [1, 5_000, 100_000, 1_000_000, 5_000_000, 30_000_000] {
        for qps in [0.0, 1.0, 50.0, 500.0] {
            for perf in [1.0, 1.3, 2.0] {
                let plan = plan(&profile_with(series, qps, perf), &config).unwrap();
                for (component, sizing) in &plan.components {
                    assert!(sizing.limit_cpu_cores >= sizing.request_cpu_cores, "{component}");
                    assert!(
                        sizing.limit_memory_bytes >= sizing.request_memory_bytes,
                        "{component}"
                    );
                    assert!(sizing.replicas >= 1, "{component}");
                }
                assert!(plan.components[&Component::Router].replicas >= 2);
                assert!(plan.render().is_ok());
            }
        }
    }
}

#[test]
fn test_growth_is_monotonic_in_series() {
    let config = SizingConfig::default();

    let mut shards = 0;
    let mut store_memory = 0.0;
    let mut object_storage = 0.0;
    for step in 0..=80 {
        let series = 1 + step * 250_000;
        let plan = plan(&profile_with(series, 10.0, 1.3), &config).unwrap();

        let ingestor = &plan.components[&Component::Ingestor];
        assert!(ingestor.replicas >= shards, "shards dropped at {series}");
        shards = ingestor.replicas;

        let store = &plan.components[&Component::Store];
        let memory = store.request_memory_bytes * f64::from(store.replicas);
        assert!(memory >= store_memory, "store memory dropped at {series}");
        store_memory = memory;

        assert!(
            plan.storage.total_bytes >= object_storage,
            "object storage dropped at {series}"
        );
        object_storage = plan.storage.total_bytes;
    }
}

#[test]
fn test_requests_are_floored() {
    let config = SizingConfig::default();
    let mut config_without_base = config.clone();
    config_without_base.router.cpu_per_replica = 0.0;
    config_without_base.router.memory_per_replica_bytes = 0.0;

    let plan = plan(&reference_profile(), &config_without_base).unwrap();
    let router = &plan.components[&Component::Router];
    assert_eq!(router.request_cpu_cores, config.floors.min_cpu_cores);
    assert_eq!(router.request_memory_bytes, config.floors.min_memory_bytes);
}

#[test]
fn test_broken_calibration_fails_instead_of_clamping() {
    let mut config = SizingConfig::default();
    config.limits.querier = LimitMultipliers::new(2.0, 0.5);

    let err = plan(&reference_profile(), &config).unwrap_err();
    assert!(matches!(
        err,
        SizingError::LimitBelowRequest {
            component: Component::Querier,
            resource: ResourceKind::Memory,
            ..
        }
    ));
    assert!(err.is_invariant_violation());
}

#[test]
fn test_plan_components_subset() {
    let config = SizingConfig::default();
    let plan = plan_components(
        &reference_profile(),
        &config,
        &[Component::Store, Component::Compactor],
    )
    .unwrap();

    assert_eq!(plan.components.len(), 2);
    assert_eq!(plan.totals.pods, 2);
    assert_eq!(plan.dps(), 1666);
}

#[test]
fn test_highest_accepted_qps_plans() {
    let profile = profile_with(100_000, MAX_QUERY_RATE, 2.0);
    assert!(profile.validate().is_ok());

    let response = calculate(&profile, &SizingConfig::default()).unwrap();
    let querier = &response.components[&Component::Querier];
    assert_eq!(querier.replicas, 50_001);
    assert!(response.totals.pods > querier.replicas);
}

#[test]
fn test_replica_counts_saturate_instead_of_overflowing() {
    // Bypasses validation to reach the sizers with an out-of-range rate
    for qps in [5.0e10, 1.0e11] {
        let plan = plan(&profile_with(100_000, qps, 1.3), &SizingConfig::default()).unwrap();
        let querier = &plan.components[&Component::Querier];
        assert_eq!(querier.replicas, u32::MAX);
        assert!(querier.request_cpu_cores.is_finite());
        assert!(querier.limit_cpu_cores >= querier.request_cpu_cores);
        assert_eq!(plan.totals.pods, u32::MAX);
    }
}
