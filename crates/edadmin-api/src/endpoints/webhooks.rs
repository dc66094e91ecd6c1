use tracing::debug;

use crate::client::ApiClient;
use crate::error::Error;
use crate::models::{WebhookEvent, WebhookTestRequest, WebhookTestResult};

impl ApiClient {
    /// Fire a sample payload at `target_url` through the backend.
    ///
    /// `POST /api/resthooks/test`
    pub async fn test_webhook(
        &self,
        target_url: &str,
        event: WebhookEvent,
    ) -> Result<WebhookTestResult, Error> {
        debug!(target_url, %event, "testing webhook");
        let body = WebhookTestRequest {
            target_url: target_url.trim().to_owned(),
            payload: event.example_payload(),
        };
        self.post("resthooks/test", &body).await
    }
}
