//! CLI command implementations

pub mod calibration;
pub mod plan;
pub mod storage;

use crate::client::ApiClient;
use anyhow::Result;
use calculator_lib::{
    sizing, CollectorProfile, CollectorResponse, PlanResponse, SizingConfig, StorageProfile,
    StorageResponse, WorkloadProfile,
};

/// Where calculations run
pub enum Backend {
    /// In-process with the given calibration
    Local(Box<SizingConfig>),
    /// On a calculator service
    Remote(ApiClient),
}

impl Backend {
    pub fn is_remote(&self) -> bool {
        matches!(self, Backend::Remote(_))
    }

    pub async fn calculate(&self, profile: &WorkloadProfile) -> Result<PlanResponse> {
        match self {
            Backend::Local(config) => {
                profile.validate()?;
                Ok(sizing::calculate(profile, config)?)
            }
            Backend::Remote(client) => client.calculate(profile).await,
        }
    }

    pub async fn pool_resources(&self, profile: &WorkloadProfile) -> Result<PlanResponse> {
        match self {
            Backend::Local(config) => {
                profile.validate()?;
                Ok(sizing::pool_resources(profile, config)?)
            }
            Backend::Remote(client) => client.pool_resources(profile).await,
        }
    }

    pub async fn collector_resources(
        &self,
        profile: &CollectorProfile,
    ) -> Result<CollectorResponse> {
        match self {
            Backend::Local(config) => {
                profile.validate()?;
                Ok(sizing::collector_resources(profile, config)?)
            }
            Backend::Remote(client) => client.collector_resources(profile).await,
        }
    }

    pub async fn storage(&self, profile: &StorageProfile) -> Result<StorageResponse> {
        match self {
            Backend::Local(config) => {
                profile.validate()?;
                Ok(sizing::estimate_storage(profile, config)?)
            }
            Backend::Remote(client) => client.storage(profile).await,
        }
    }

    pub async fn calibration(&self) -> Result<SizingConfig> {
        match self {
            Backend::Local(config) => Ok(config.as_ref().clone()),
            Backend::Remote(client) => client.calibration().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local() -> Backend {
        Backend::Local(Box::default())
    }

    #[tokio::test]
    async fn test_local_backend_validates_before_sizing() {
        let profile = CollectorProfile {
            active_series: 0,
            scrape_interval_secs: 30,
            performance_factor: 1.0,
        };
        let err = local().collector_resources(&profile).await.unwrap_err();
        assert!(err.to_string().contains("activeSeries"));
    }

    #[tokio::test]
    async fn test_local_storage_estimate() {
        let profile = StorageProfile {
            active_series: 5_000,
            raw_retention_days: 14,
            downsample_5m_retention_days: 90,
            downsample_1h_retention_days: 180,
        };
        let estimate = local().storage(&profile).await.unwrap();
        assert_eq!(estimate.total, "5Gi");
        assert!(!local().is_remote());
    }
}
