//! Resource calculator for Thanos-style metrics pipelines
//!
//! This crate provides:
//! - Workload profiles and their validation
//! - Calibrated sizing formulas for each pipeline stage
//! - Limit derivation and Kubernetes quantity rendering
//! - Health checks and observability for the calculator service

pub mod calibration;
pub mod error;
pub mod health;
pub mod models;
pub mod observability;
pub mod sizing;

pub use calibration::{SizingConfig, FORMULA_VERSION};
pub use error::{SizingError, SizingResult};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse, Subsystem,
};
pub use models::*;
pub use observability::{
    CalculationKind, CalculationSummary, CalculatorMetrics, StructuredLogger,
};
pub use sizing::{
    calculate, collector_resources, estimate_storage, plan, pool_resources, ResourcePlan,
    SafetyReport,
};
