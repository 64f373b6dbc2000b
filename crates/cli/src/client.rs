//! API client for a running transaction monitor

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use txmon_lib::{Baseline, HealthResponse, LiveSample, MonitorRequest, Verdict};
use url::Url;

/// API client for the monitor service
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

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("API error ({}): {}", status, body);
        }

        response.json().await.context("Failed to parse response")
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

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("API error ({}): {}", status, body);
        }

        response.json().await.context("Failed to parse response")
    }

    /// Classify a live sample
    pub async fn check(&self, counts: LiveSample) -> Result<Verdict> {
        self.post("monitor", &MonitorRequest { counts }).await
    }

    pub async fn baseline(&self) -> Result<Baseline> {
        self.get("baseline").await
    }

    /// Health report; a 503 still carries the component breakdown
    pub async fn health(&self) -> Result<HealthResponse> {
        let url = self.base_url.join("healthz").context("Invalid path")?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send request")?;

        let status = response.status();
        if !status.is_success() && status != reqwest::StatusCode::SERVICE_UNAVAILABLE {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("API error ({}): {}", status, body);
        }

        response.json().await.context("Failed to parse response")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use txmon_lib::{ComponentStatus, Recommendation};

    #[tokio::test]
    async fn test_check_posts_counts() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/monitor")
            .match_body(mockito::Matcher::Json(
                serde_json::json!({ "counts": { "denied": 10 } }),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"recommendation":"alertar","details":["Status 'denied' above normal. Count: 10, Threshold: 6.00"]}"#,
            )
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let verdict = client
            .check(LiveSample::new().with("denied", 10))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(verdict.recommendation, Recommendation::Alert);
        assert_eq!(verdict.details.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_bad_request_is_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/monitor")
            .with_status(400)
            .with_body(r#"{"error":"bad json"}"#)
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let err = client.check(LiveSample::new()).await.unwrap_err();
        assert!(err.to_string().contains("400"));
    }

    #[tokio::test]
    async fn test_remote_baseline() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/baseline")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"policy_version":"payments-v1","minutes_observed":2,
                    "statuses":{"denied":{"mean":3.0,"std_dev":1.0}}}"#,
            )
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let baseline = client.baseline().await.unwrap();

        assert_eq!(baseline.minutes_observed(), 2);
        assert_eq!(baseline.get("denied").unwrap().threshold(3.0), 6.0);
    }

    #[tokio::test]
    async fn test_unhealthy_service_still_reports() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/healthz")
            .with_status(503)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"status":"unhealthy","components":{"baseline":
                    {"status":"unhealthy","message":"gone","last_check_timestamp":0}}}"#,
            )
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let health = client.health().await.unwrap();
        assert_eq!(health.status, ComponentStatus::Unhealthy);
    }

    #[test]
    fn test_invalid_url() {
        assert!(ApiClient::new("not a url").is_err());
    }
}
