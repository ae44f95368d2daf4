use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::ControllerError;

#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub title: String,
    pub message: String,
}

/// Best-effort notification channel to the platform's notifier service.
/// Failures are logged and never propagated; an unset URL disables sending.
#[derive(Clone)]
pub struct Notifier {
    client: reqwest::Client,
    url: String,
}

impl Notifier {
    pub fn new(url: impl Into<String>) -> Result<Self, ControllerError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub async fn send(&self, title: impl Into<String>, message: impl Into<String>) {
        let msg = Message {
            title: title.into(),
            message: message.into(),
        };
        if self.url.is_empty() {
            debug!(title = %msg.title, "no notification url configured, dropping notification");
            return;
        }
        match self.client.post(&self.url).json(&msg).send().await {
            Ok(resp) if !resp.status().is_success() => {
                warn!(status = %resp.status(), title = %msg.title, "notification rejected");
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, title = %msg.title, "notification failed"),
        }
    }
}
