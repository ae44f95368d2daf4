use std::time::Duration;

use serde::Serialize;
use tracing::info;

use crate::error::ControllerError;

#[derive(Debug, Serialize)]
struct CleanupRequest<'a> {
    max_age: &'a str,
    batch_size: i64,
    filter_locally: bool,
}

/// Client for the external process-history cleanup tool. The agent only
/// triggers runs; retention logic lives in the collaborator.
pub struct HistoryCleanup {
    client: reqwest::Client,
    location: String,
    max_age: String,
    batch_size: i64,
    filter_locally: bool,
}

impl HistoryCleanup {
    pub fn new(
        location: impl Into<String>,
        max_age: impl Into<String>,
        batch_size: i64,
        filter_locally: bool,
    ) -> Result<Self, ControllerError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            location: location.into(),
            max_age: max_age.into(),
            batch_size,
            filter_locally,
        })
    }

    pub async fn run_once(&self) -> Result<(), ControllerError> {
        let resp = self
            .client
            .post(&self.location)
            .json(&CleanupRequest {
                max_age: &self.max_age,
                batch_size: self.batch_size,
                filter_locally: self.filter_locally,
            })
            .send()
            .await?;
        let status = resp.status();
        resp.error_for_status_ref().map_err(ControllerError::from)?;
        info!(status = %status, "history cleanup triggered");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn posts_the_configured_parameters() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/cleanup"))
            .and(body_json(serde_json::json!({
                "max_age": "720h",
                "batch_size": 50,
                "filter_locally": true,
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let cleanup =
            HistoryCleanup::new(format!("{}/cleanup", server.uri()), "720h", 50, true).unwrap();
        cleanup.run_once().await.unwrap();
    }

    #[tokio::test]
    async fn surfaces_collaborator_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let cleanup = HistoryCleanup::new(server.uri(), "720h", 50, false).unwrap();
        assert!(cleanup.run_once().await.is_err());
    }
}
