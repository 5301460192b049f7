//! Error types for the sizing core

use crate::models::{Component, ResourceKind};
use thiserror::Error;

/// Errors produced while validating input or assembling a resource plan.
///
/// `InvalidProfile` and `InvalidCalibration` are caller mistakes. The last two
/// variants are invariant violations: they mean a formula or calibration
/// constant produced an impossible plan, and the calculation is aborted.
#[derive(Debug, Error)]
pub enum SizingError {
    #[error("invalid workload profile: {field} {reason}")]
    InvalidProfile { field: &'static str, reason: String },

    #[error("invalid calibration: {0}")]
    InvalidCalibration(String),

    #[error("{component} {resource} limit {limit} is below request {request}")]
    LimitBelowRequest {
        component: Component,
        resource: ResourceKind,
        request: f64,
        limit: f64,
    },

    #[error("malformed {kind} quantity: {value:?}")]
    MalformedQuantity { kind: ResourceKind, value: String },
}

impl SizingError {
    pub(crate) fn invalid_profile(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidProfile {
            field,
            reason: reason.into(),
        }
    }

    /// True for defects in the formulas or calibration rather than bad input
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            SizingError::LimitBelowRequest { .. } | SizingError::MalformedQuantity { .. }
        )
    }
}

pub type SizingResult<T> = Result<T, SizingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invariant_classification() {
        let limit = SizingError::LimitBelowRequest {
            component: Component::Store,
            resource: ResourceKind::Memory,
            request: 2.0,
            limit: 1.0,
        };
        assert!(limit.is_invariant_violation());

        let quantity = SizingError::MalformedQuantity {
            kind: ResourceKind::Cpu,
            value: "1.5".to_string(),
        };
        assert!(quantity.is_invariant_violation());

        assert!(!SizingError::invalid_profile("interval", "must be > 0").is_invariant_violation());
        assert!(!SizingError::InvalidCalibration("bad".into()).is_invariant_violation());
    }

    #[test]
    fn test_error_messages_name_the_component() {
        let err = SizingError::LimitBelowRequest {
            component: Component::Ingestor,
            resource: ResourceKind::Cpu,
            request: 2.0,
            limit: 1.5,
        };
        let msg = err.to_string();
        assert!(msg.contains("receiver_ingestor"));
        assert!(msg.contains("cpu"));
    }
}
