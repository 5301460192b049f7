//! Plan assembly, aggregation and rendering

use super::components::{size_component, RawSizing};
use super::limits::LimitPolicy;
use super::quantity::{render_bytes, render_cores};
use super::safety::SafetyReport;
use super::storage::{RetentionWindows, StorageEstimate, StorageEstimator};
use super::Workload;
use crate::calibration::{RequestFloors, SizingConfig};
use crate::error::SizingResult;
use crate::models::{
    CollectorProfile, CollectorResponse, Component, ComponentResources, ComponentSizing,
    PlanResponse, ResourceQuantities, StorageProfile, StorageResponse, TotalsResponse,
    WorkloadProfile,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Cluster-wide sums over the sized components
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterTotals {
    pub pods: u32,
    pub cpu_cores: f64,
    pub memory_bytes: f64,
    pub storage_bytes: f64,
}

impl ClusterTotals {
    /// Sum requests and volumes across every replica of every component
    pub fn from_components<'a>(sizings: impl IntoIterator<Item = &'a ComponentSizing>) -> Self {
        sizings
            .into_iter()
            .fold(ClusterTotals::default(), |mut totals, sizing| {
                let replicas = f64::from(sizing.replicas);
                totals.pods = totals.pods.saturating_add(sizing.replicas);
                totals.cpu_cores += sizing.request_cpu_cores * replicas;
                totals.memory_bytes += sizing.request_memory_bytes * replicas;
                totals.storage_bytes += sizing.storage_bytes.unwrap_or(0.0) * replicas;
                totals
            })
    }

    fn render(&self) -> SizingResult<TotalsResponse> {
        Ok(TotalsResponse {
            pods: self.pods,
            cpu_cores: self.cpu_cores,
            cpu: render_cores(self.cpu_cores)?,
            memory: render_bytes(self.memory_bytes)?,
            storage: render_bytes(self.storage_bytes)?,
        })
    }
}

/// Numeric sizing for a set of components
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourcePlan {
    pub formula_version: String,
    /// Samples per second
    pub ingestion_rate: f64,
    pub components: BTreeMap<Component, ComponentSizing>,
    pub storage: StorageEstimate,
    pub totals: ClusterTotals,
    pub safety: SafetyReport,
}

impl ResourcePlan {
    pub fn dps(&self) -> u64 {
        self.ingestion_rate.floor() as u64
    }

    /// Format every quantity; fails if any string breaks its pattern
    pub fn render(&self) -> SizingResult<PlanResponse> {
        let components = self
            .components
            .iter()
            .map(|(component, sizing)| Ok((*component, render_component(sizing)?)))
            .collect::<SizingResult<BTreeMap<_, _>>>()?;

        Ok(PlanResponse {
            formula_version: self.formula_version.clone(),
            dps: self.dps(),
            components,
            s3: render_bytes(self.storage.total_bytes)?,
            totals: self.totals.render()?,
            safety: self.safety,
        })
    }
}

fn render_component(sizing: &ComponentSizing) -> SizingResult<ComponentResources> {
    Ok(ComponentResources {
        replicas: sizing.replicas,
        requests: ResourceQuantities {
            cpu: render_cores(sizing.request_cpu_cores)?,
            memory: render_bytes(sizing.request_memory_bytes)?,
        },
        limits: ResourceQuantities {
            cpu: render_cores(sizing.limit_cpu_cores)?,
            memory: render_bytes(sizing.limit_memory_bytes)?,
        },
        storage: sizing.storage_bytes.map(render_bytes).transpose()?,
    })
}

/// Floor the raw requests and attach checked limits
fn finalize(
    component: Component,
    raw: RawSizing,
    policy: &LimitPolicy<'_>,
    floors: &RequestFloors,
) -> SizingResult<ComponentSizing> {
    let request_cpu_cores = raw.cpu_cores.max(floors.min_cpu_cores);
    let request_memory_bytes = raw.memory_bytes.max(floors.min_memory_bytes);
    let (limit_cpu_cores, limit_memory_bytes) =
        policy.apply(component, request_cpu_cores, request_memory_bytes)?;

    Ok(ComponentSizing {
        replicas: raw.replicas.max(1),
        request_cpu_cores,
        request_memory_bytes,
        limit_cpu_cores,
        limit_memory_bytes,
        storage_bytes: raw.storage_bytes,
    })
}

/// Size the given components for a profile
///
/// The profile is assumed to have passed [`WorkloadProfile::validate`]; only
/// the scrape interval is clamped here.
pub fn plan_components(
    profile: &WorkloadProfile,
    config: &SizingConfig,
    components: &[Component],
) -> SizingResult<ResourcePlan> {
    let workload = Workload::normalize(profile);
    let storage = StorageEstimator::new(&config.storage)
        .estimate(workload.active_series, &workload.retention);
    let policy = LimitPolicy::new(&config.limits);

    let mut sized = BTreeMap::new();
    for &component in components {
        let raw = size_component(component, &workload, &storage, config);
        let sizing = finalize(component, raw, &policy, &config.floors)?;
        debug!(
            component = %component,
            replicas = sizing.replicas,
            request_cpu_cores = sizing.request_cpu_cores,
            request_memory_bytes = sizing.request_memory_bytes,
            "Sized component"
        );
        sized.insert(component, sizing);
    }

    let totals = ClusterTotals::from_components(sized.values());
    let safety = SafetyReport::derive(&workload, storage.total_bytes, &config.safety);

    Ok(ResourcePlan {
        formula_version: config.formula_version.clone(),
        ingestion_rate: workload.ingestion_rate,
        components: sized,
        storage,
        totals,
        safety,
    })
}

/// Size all seven components
pub fn plan(profile: &WorkloadProfile, config: &SizingConfig) -> SizingResult<ResourcePlan> {
    plan_components(profile, config, &Component::ALL)
}

/// Full plan rendered as quantity strings
pub fn calculate(profile: &WorkloadProfile, config: &SizingConfig) -> SizingResult<PlanResponse> {
    plan(profile, config)?.render()
}

/// Every component except the collector, rendered
pub fn pool_resources(
    profile: &WorkloadProfile,
    config: &SizingConfig,
) -> SizingResult<PlanResponse> {
    plan_components(profile, config, &Component::POOL)?.render()
}

/// The collector alone, rendered
pub fn collector_resources(
    profile: &CollectorProfile,
    config: &SizingConfig,
) -> SizingResult<CollectorResponse> {
    let workload = Workload::normalize(&WorkloadProfile::from(profile));
    let storage = StorageEstimator::new(&config.storage)
        .estimate(workload.active_series, &workload.retention);
    let raw = size_component(Component::Collector, &workload, &storage, config);
    let sizing = finalize(
        Component::Collector,
        raw,
        &LimitPolicy::new(&config.limits),
        &config.floors,
    )?;

    Ok(CollectorResponse {
        formula_version: config.formula_version.clone(),
        dps: workload.dps(),
        resources: render_component(&sizing)?,
    })
}

/// Object storage estimate with per-tier quantities
pub fn estimate_storage(
    profile: &StorageProfile,
    config: &SizingConfig,
) -> SizingResult<StorageResponse> {
    let retention = RetentionWindows {
        raw_days: f64::from(profile.raw_retention_days),
        downsample_5m_days: f64::from(profile.downsample_5m_retention_days),
        downsample_1h_days: f64::from(profile.downsample_1h_retention_days),
    };
    let estimate =
        StorageEstimator::new(&config.storage).estimate(profile.active_series as f64, &retention);

    Ok(StorageResponse {
        formula_version: config.formula_version.clone(),
        scale_multiplier: estimate.scale_multiplier,
        raw: render_bytes(estimate.raw_bytes)?,
        downsample_5m: render_bytes(estimate.downsample_5m_bytes)?,
        downsample_1h: render_bytes(estimate.downsample_1h_bytes)?,
        total: render_bytes(estimate.total_bytes)?,
        total_bytes: estimate.total_bytes.ceil() as u64,
    })
}
