//! Observability for the calculator service
//!
//! Provides:
//! - Prometheus metrics (calculation latency, calculations by kind, rejected
//!   requests, invariant violations, formula version)
//! - Structured JSON logging with tracing

use crate::error::SizingError;
use crate::models::{CollectorResponse, PlanResponse, StorageResponse};
use crate::sizing::ZERO_QUANTITY;
use prometheus::{
    register_gauge_vec, register_histogram, register_int_counter, register_int_counter_vec,
    GaugeVec, Histogram, IntCounter, IntCounterVec,
};
use std::sync::OnceLock;
use tracing::{error, info, warn};

/// Calculations are pure arithmetic, so buckets stop well below a second
const LATENCY_BUCKETS: &[f64] = &[
    0.00001, 0.00005, 0.0001, 0.00025, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.05, 0.1,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<CalculatorMetricsInner> = OnceLock::new();

struct CalculatorMetricsInner {
    calculation_latency_seconds: Histogram,
    calculations_total: IntCounterVec,
    rejected_requests_total: IntCounter,
    invariant_violations_total: IntCounter,
    formula_version_info: GaugeVec,
}

impl CalculatorMetricsInner {
    fn new() -> Self {
        Self {
            calculation_latency_seconds: register_histogram!(
                "thanos_calculator_calculation_latency_seconds",
                "Time spent computing a resource plan",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register calculation_latency_seconds"),

            calculations_total: register_int_counter_vec!(
                "thanos_calculator_calculations_total",
                "Completed calculations by kind",
                &["kind"]
            )
            .expect("Failed to register calculations_total"),

            rejected_requests_total: register_int_counter!(
                "thanos_calculator_rejected_requests_total",
                "Requests rejected because of an invalid workload profile"
            )
            .expect("Failed to register rejected_requests_total"),

            invariant_violations_total: register_int_counter!(
                "thanos_calculator_invariant_violations_total",
                "Calculations aborted by a sizing invariant violation"
            )
            .expect("Failed to register invariant_violations_total"),

            formula_version_info: register_gauge_vec!(
                "thanos_calculator_formula_version_info",
                "Version of the loaded sizing formula set",
                &["version"]
            )
            .expect("Failed to register formula_version_info"),
        }
    }
}

/// Kinds of calculation served
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalculationKind {
    Plan,
    Pool,
    Collector,
    Storage,
}

impl CalculationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CalculationKind::Plan => "plan",
            CalculationKind::Pool => "pool",
            CalculationKind::Collector => "collector",
            CalculationKind::Storage => "storage",
        }
    }
}

/// Headline numbers of a calculation, as logged
#[derive(Debug, Clone, Copy)]
pub struct CalculationSummary<'a> {
    pub dps: u64,
    pub pods: u32,
    pub cpu: &'a str,
    pub memory: &'a str,
    pub object_storage: &'a str,
    pub formula_version: &'a str,
}

impl<'a> From<&'a PlanResponse> for CalculationSummary<'a> {
    fn from(plan: &'a PlanResponse) -> Self {
        Self {
            dps: plan.dps,
            pods: plan.totals.pods,
            cpu: &plan.totals.cpu,
            memory: &plan.totals.memory,
            object_storage: &plan.s3,
            formula_version: &plan.formula_version,
        }
    }
}

impl<'a> From<&'a CollectorResponse> for CalculationSummary<'a> {
    fn from(collector: &'a CollectorResponse) -> Self {
        Self {
            dps: collector.dps,
            pods: collector.resources.replicas,
            cpu: &collector.resources.requests.cpu,
            memory: &collector.resources.requests.memory,
            object_storage: ZERO_QUANTITY,
            formula_version: &collector.formula_version,
        }
    }
}

impl<'a> From<&'a StorageResponse> for CalculationSummary<'a> {
    fn from(storage: &'a StorageResponse) -> Self {
        Self {
            dps: 0,
            pods: 0,
            cpu: "0",
            memory: ZERO_QUANTITY,
            object_storage: &storage.total,
            formula_version: &storage.formula_version,
        }
    }
}

/// Handle to the global calculator metrics
///
/// Multiple clones share the same underlying metrics.
#[derive(Clone)]
pub struct CalculatorMetrics {
    _private: (),
}

impl Default for CalculatorMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl CalculatorMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(CalculatorMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &CalculatorMetricsInner {
        GLOBAL_METRICS.get_or_init(CalculatorMetricsInner::new)
    }

    /// Record a completed calculation and its latency
    pub fn observe_calculation(&self, kind: CalculationKind, duration_secs: f64) {
        self.inner().calculation_latency_seconds.observe(duration_secs);
        self.inner()
            .calculations_total
            .with_label_values(&[kind.as_str()])
            .inc();
    }

    pub fn inc_rejected_requests(&self) {
        self.inner().rejected_requests_total.inc();
    }

    pub fn inc_invariant_violations(&self) {
        self.inner().invariant_violations_total.inc();
    }

    /// Publish the formula version of the loaded calibration
    pub fn set_formula_version(&self, version: &str) {
        self.inner().formula_version_info.reset();
        self.inner()
            .formula_version_info
            .with_label_values(&[version])
            .set(1.0);
    }

    pub fn calculations(&self, kind: CalculationKind) -> u64 {
        self.inner()
            .calculations_total
            .with_label_values(&[kind.as_str()])
            .get()
    }
}

/// Structured logger for calculator events
#[derive(Clone)]
pub struct StructuredLogger {
    service: String,
}

impl StructuredLogger {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    pub fn log_startup(&self, version: &str, formula_version: &str, calibration_source: &str) {
        info!(
            event = "service_started",
            service = %self.service,
            version = %version,
            formula_version = %formula_version,
            calibration = %calibration_source,
            "Resource calculator started"
        );
    }

    /// Log a completed calculation with its headline numbers
    pub fn log_calculation(&self, kind: CalculationKind, summary: &CalculationSummary<'_>) {
        info!(
            event = "calculation_completed",
            service = %self.service,
            kind = kind.as_str(),
            dps = summary.dps,
            pods = summary.pods,
            cpu = %summary.cpu,
            memory = %summary.memory,
            s3 = %summary.object_storage,
            formula_version = %summary.formula_version,
            "Computed resource plan"
        );
    }

    pub fn log_rejected(&self, error: &SizingError) {
        let field = match error {
            SizingError::InvalidProfile { field, .. } => *field,
            _ => "",
        };
        warn!(
            event = "request_rejected",
            service = %self.service,
            field = %field,
            reason = %error,
            "Rejected workload profile"
        );
    }

    /// Log an aborted calculation; errors caused by bad input are ignored
    pub fn log_invariant_violation(&self, violation: &SizingError) {
        match violation {
            SizingError::LimitBelowRequest {
                component,
                resource,
                request,
                limit,
            } => error!(
                event = "invariant_violation",
                service = %self.service,
                component = %component,
                resource = %resource,
                request = *request,
                limit = *limit,
                "Calculation aborted: limit below request"
            ),
            SizingError::MalformedQuantity { kind, value } => error!(
                event = "invariant_violation",
                service = %self.service,
                resource = %kind,
                quantity = %value,
                "Calculation aborted: malformed quantity"
            ),
            SizingError::InvalidProfile { .. } | SizingError::InvalidCalibration(_) => {}
        }
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "service_shutdown",
            service = %self.service,
            reason = %reason,
            "Resource calculator shutting down"
        );
    }
}
