//! Health tracking for the calculator service
//!
//! The service is ready once a calibration has been loaded and validated.
//! The calculator subsystem turns degraded when a calculation trips a sizing
//! invariant; it keeps serving, but the probe reports the last violation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Parts of the service that report health
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subsystem {
    /// Loaded calibration constants
    Calibration,
    /// Sizing formulas and limit derivation
    Calculator,
}

impl Subsystem {
    pub const ALL: [Subsystem; 2] = [Subsystem::Calibration, Subsystem::Calculator];
}

/// Health status of a subsystem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Healthy,
    /// Still serving, with a recorded problem
    Degraded,
    Unhealthy,
}

impl ComponentStatus {
    /// Returns true if requests can still be served
    pub fn is_operational(&self) -> bool {
        !matches!(self, ComponentStatus::Unhealthy)
    }

    fn worst(self, other: ComponentStatus) -> ComponentStatus {
        match (self, other) {
            (ComponentStatus::Unhealthy, _) | (_, ComponentStatus::Unhealthy) => {
                ComponentStatus::Unhealthy
            }
            (ComponentStatus::Degraded, _) | (_, ComponentStatus::Degraded) => {
                ComponentStatus::Degraded
            }
            _ => ComponentStatus::Healthy,
        }
    }
}

/// Last reported state of one subsystem
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub status: ComponentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub last_check_timestamp: i64,
}

impl ComponentHealth {
    fn new(status: ComponentStatus, message: Option<String>) -> Self {
        Self {
            status,
            message,
            last_check_timestamp: chrono::Utc::now().timestamp(),
        }
    }

    pub fn healthy() -> Self {
        Self::new(ComponentStatus::Healthy, None)
    }
}

/// Body of the liveness probe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: ComponentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formula_version: Option<String>,
    pub components: BTreeMap<Subsystem, ComponentHealth>,
}

/// Body of the readiness probe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Default)]
struct RegistryState {
    subsystems: BTreeMap<Subsystem, ComponentHealth>,
    /// Formula version of the loaded calibration
    calibration: Option<String>,
}

/// Shared health state behind the probes
#[derive(Debug, Clone, Default)]
pub struct HealthRegistry {
    state: Arc<RwLock<RegistryState>>,
}

impl HealthRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every subsystem as healthy
    pub async fn register_all(&self) {
        let mut state = self.state.write().await;
        for subsystem in Subsystem::ALL {
            state.subsystems.insert(subsystem, ComponentHealth::healthy());
        }
    }

    async fn report(&self, subsystem: Subsystem, status: ComponentStatus, message: Option<String>) {
        self.state
            .write()
            .await
            .subsystems
            .insert(subsystem, ComponentHealth::new(status, message));
    }

    pub async fn set_healthy(&self, subsystem: Subsystem) {
        self.report(subsystem, ComponentStatus::Healthy, None).await;
    }

    pub async fn set_degraded(&self, subsystem: Subsystem, message: impl Into<String>) {
        self.report(subsystem, ComponentStatus::Degraded, Some(message.into()))
            .await;
    }

    pub async fn set_unhealthy(&self, subsystem: Subsystem, message: impl Into<String>) {
        self.report(subsystem, ComponentStatus::Unhealthy, Some(message.into()))
            .await;
    }

    /// Record a validated calibration; the service becomes ready
    pub async fn calibration_loaded(&self, formula_version: impl Into<String>) {
        let mut state = self.state.write().await;
        state.calibration = Some(formula_version.into());
        state
            .subsystems
            .insert(Subsystem::Calibration, ComponentHealth::healthy());
    }

    /// Forget the calibration; the service stops being ready
    pub async fn calibration_unloaded(&self) {
        self.state.write().await.calibration = None;
    }

    pub async fn health(&self) -> HealthResponse {
        let state = self.state.read().await;
        let status = state
            .subsystems
            .values()
            .fold(ComponentStatus::Healthy, |acc, health| acc.worst(health.status));

        HealthResponse {
            status,
            formula_version: state.calibration.clone(),
            components: state.subsystems.clone(),
        }
    }

    pub async fn readiness(&self) -> ReadinessResponse {
        let health = self.health().await;

        let reason = if health.formula_version.is_none() {
            Some("Calibration not yet loaded")
        } else if !health.status.is_operational() {
            Some("Critical component unhealthy")
        } else {
            None
        };

        ReadinessResponse {
            ready: reason.is_none(),
            reason: reason.map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_registry_is_healthy_but_not_ready() {
        let registry = HealthRegistry::new();
        let health = registry.health().await;

        assert_eq!(health.status, ComponentStatus::Healthy);
        assert!(health.components.is_empty());

        let readiness = registry.readiness().await;
        assert!(!readiness.ready);
        assert_eq!(readiness.reason.as_deref(), Some("Calibration not yet loaded"));
    }

    #[tokio::test]
    async fn test_calibration_loaded_makes_ready() {
        let registry = HealthRegistry::new();
        registry.register_all().await;
        registry.calibration_loaded("v3").await;

        let health = registry.health().await;
        assert_eq!(health.formula_version.as_deref(), Some("v3"));
        assert_eq!(health.components.len(), 2);
        assert!(registry.readiness().await.ready);

        registry.calibration_unloaded().await;
        assert!(!registry.readiness().await.ready);
    }

    #[tokio::test]
    async fn test_invariant_violation_degrades_service() {
        let registry = HealthRegistry::new();
        registry.register_all().await;
        registry.calibration_loaded("v3").await;

        registry
            .set_degraded(Subsystem::Calculator, "store memory limit is below request")
            .await;

        let health = registry.health().await;
        assert_eq!(health.status, ComponentStatus::Degraded);
        assert!(health.components[&Subsystem::Calculator].message.is_some());
        // Degraded still serves traffic
        assert!(registry.readiness().await.ready);

        registry.set_healthy(Subsystem::Calculator).await;
        assert_eq!(registry.health().await.status, ComponentStatus::Healthy);
    }

    #[tokio::test]
    async fn test_not_ready_when_calibration_unhealthy() {
        let registry = HealthRegistry::new();
        registry.register_all().await;
        registry.calibration_loaded("v3").await;
        registry
            .set_unhealthy(Subsystem::Calibration, "invalid calibration file")
            .await;

        let readiness = registry.readiness().await;
        assert!(!readiness.ready);
        assert_eq!(readiness.reason.as_deref(), Some("Critical component unhealthy"));
    }

    #[test]
    fn test_subsystems_serialize_lowercase() {
        let json = serde_json::to_string(&Subsystem::Calibration).unwrap();
        assert_eq!(json, "\"calibration\"");
    }
}
