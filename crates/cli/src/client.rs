//! API client for the calculator service

use anyhow::{Context, Result};
use calculator_lib::{
    CollectorProfile, CollectorResponse, PlanResponse, SizingConfig, StorageProfile,
    StorageResponse, WorkloadProfile,
};
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Error body returned by the service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Non-success answer from the service
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{error} ({code}): {details}")]
    Rejected {
        status: u16,
        error: String,
        code: String,
        details: String,
    },

    #[error("API error ({status}): {body}")]
    Unexpected { status: u16, body: String },
}

/// API client for the calculator service
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(base_url).context("Invalid API URL")?;

        Ok(Self { client, base_url })
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send request")?;

        Self::decode(response).await
    }

    /// Make a POST request with JSON body
    pub async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .context("Failed to send request")?;

        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let error = match serde_json::from_str::<ErrorResponse>(&body) {
                Ok(parsed) => ClientError::Rejected {
                    status: status.as_u16(),
                    error: parsed.error,
                    code: parsed.code.unwrap_or_else(|| "unknown".to_string()),
                    details: parsed.details.unwrap_or_default(),
                },
                Err(_) => ClientError::Unexpected {
                    status: status.as_u16(),
                    body,
                },
            };
            return Err(error.into());
        }

        response.json().await.context("Failed to parse response")
    }

    pub async fn calculate(&self, profile: &WorkloadProfile) -> Result<PlanResponse> {
        self.post("api/calculate", profile).await
    }

    pub async fn pool_resources(&self, profile: &WorkloadProfile) -> Result<PlanResponse> {
        self.post("api/calculate/pool_resources", profile).await
    }

    pub async fn collector_resources(
        &self,
        profile: &CollectorProfile,
    ) -> Result<CollectorResponse> {
        self.post("api/calculate/collector_resources", profile).await
    }

    pub async fn storage(&self, profile: &StorageProfile) -> Result<StorageResponse> {
        self.post("api/calculate/storage", profile).await
    }

    pub async fn calibration(&self) -> Result<SizingConfig> {
        self.get("api/calibration").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calculator_lib::calculate;

    fn profile() -> WorkloadProfile {
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

    #[tokio::test]
    async fn test_calculate_posts_profile() {
        let mut server = mockito::Server::new_async().await;
        let plan = calculate(&profile(), &SizingConfig::default()).unwrap();

        let mock = server
            .mock("POST", "/api/calculate")
            .match_body(mockito::Matcher::PartialJson(
                serde_json::json!({ "activeSeries": 100000, "interval": 60 }),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(serde_json::to_string(&plan).unwrap())
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let response = client.calculate(&profile()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(response, plan);
    }

    #[tokio::test]
    async fn test_rejection_surfaces_error_code() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/calculate/collector_resources")
            .with_status(400)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"error":"Invalid workload profile","code":"invalid_profile","details":"perfFactor out of range"}"#,
            )
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let err = client
            .collector_resources(&CollectorProfile {
                active_series: 1,
                scrape_interval_secs: 30,
                performance_factor: 9.0,
            })
            .await
            .unwrap_err();

        match err.downcast_ref::<ClientError>() {
            Some(ClientError::Rejected { status, code, .. }) => {
                assert_eq!(*status, 400);
                assert_eq!(code, "invalid_profile");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_non_json_error_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/calibration")
            .with_status(502)
            .with_body("bad gateway")
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let err = client.calibration().await.unwrap_err();
        assert!(err.to_string().contains("502"));
        assert!(matches!(
            err.downcast_ref::<ClientError>(),
            Some(ClientError::Unexpected { .. })
        ));
    }

    #[tokio::test]
    async fn test_calibration_roundtrip() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/calibration")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(serde_json::to_string(&SizingConfig::default()).unwrap())
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let calibration = client.calibration().await.unwrap();
        assert_eq!(calibration.formula_version, "v3");
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(ApiClient::new("not a url").is_err());
    }
}
