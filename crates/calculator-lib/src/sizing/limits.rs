//! Request to limit derivation
//!
//! A limit is the request scaled by a per-component multiplier, with two
//! adjustments: small requests get a minimum absolute buffer, and very large
//! memory requests have the multiplier's headroom damped. The result must
//! never fall below the request; a violation is reported as an error and is
//! never patched up here.

use crate::calibration::{LimitMultipliers, LimitPolicyConfig};
use crate::error::{SizingError, SizingResult};
use crate::models::{Component, ResourceKind};
use tracing::error;

/// Derives limits for requests using a calibrated policy
pub struct LimitPolicy<'a> {
    config: &'a LimitPolicyConfig,
}

impl<'a> LimitPolicy<'a> {
    pub fn new(config: &'a LimitPolicyConfig) -> Self {
        Self { config }
    }

    /// Base multipliers configured for a component
    pub fn multipliers(&self, component: Component) -> LimitMultipliers {
        match component {
            Component::Collector => self.config.collector,
            Component::Router => self.config.router,
            Component::Ingestor => self.config.ingestor,
            Component::Compactor => self.config.compactor,
            Component::Store => self.config.store,
            Component::QueryFrontend => self.config.query_frontend,
            Component::Querier => self.config.querier,
        }
    }

    /// Derive a limit from a request
    pub fn derive_limit(&self, request: f64, base_multiplier: f64, kind: ResourceKind) -> f64 {
        match kind {
            ResourceKind::Cpu => {
                let limit = request * base_multiplier;
                if request < self.config.small_cpu_request_cores {
                    limit.max(request + self.config.min_cpu_buffer_cores)
                } else {
                    limit
                }
            }
            ResourceKind::Memory => {
                let multiplier = if request > self.config.large_memory_request_bytes {
                    1.0 + (base_multiplier - 1.0) * (1.0 - self.config.large_memory_damping)
                } else {
                    base_multiplier
                };
                let limit = request * multiplier;
                if request < self.config.small_memory_request_bytes {
                    limit.max(request + self.config.min_memory_buffer_bytes)
                } else {
                    limit
                }
            }
        }
    }

    /// Derive cpu and memory limits for a component and check `limit >= request`
    ///
    /// Returns `(limit_cpu_cores, limit_memory_bytes)`.
    pub fn apply(
        &self,
        component: Component,
        request_cpu_cores: f64,
        request_memory_bytes: f64,
    ) -> SizingResult<(f64, f64)> {
        let multipliers = self.multipliers(component);

        let limit_cpu = self.derive_limit(request_cpu_cores, multipliers.cpu, ResourceKind::Cpu);
        ensure_limit(component, ResourceKind::Cpu, request_cpu_cores, limit_cpu)?;

        let limit_memory =
            self.derive_limit(request_memory_bytes, multipliers.memory, ResourceKind::Memory);
        ensure_limit(
            component,
            ResourceKind::Memory,
            request_memory_bytes,
            limit_memory,
        )?;

        Ok((limit_cpu, limit_memory))
    }
}

/// Fails when `limit < request`, including when either side is NaN
pub fn ensure_limit(
    component: Component,
    resource: ResourceKind,
    request: f64,
    limit: f64,
) -> SizingResult<()> {
    if limit >= request {
        return Ok(());
    }

    error!(
        event = "invariant_violation",
        component = %component,
        resource = %resource,
        request = request,
        limit = limit,
        "Derived limit is below request"
    );
    Err(SizingError::LimitBelowRequest {
        component,
        resource,
        request,
        limit,
    })
}
