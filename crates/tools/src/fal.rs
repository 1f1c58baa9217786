//! Shared HTTP client for the Fal generation endpoints.

use std::time::Duration;

use admuse_core::error::ToolError;
use serde_json::Value;
use tracing::debug;

pub(crate) struct FalClient {
    key: Option<String>,
    client: reqwest::Client,
}

impl FalClient {
    pub(crate) fn new(key: Option<String>) -> Self {
        Self {
            key,
            client: reqwest::Client::new(),
        }
    }

    /// POST `payload` to a Fal endpoint and return the parsed JSON body.
    ///
    /// The credential is checked before any request is made, so a missing
    /// key never touches the network. `operation` and `limit` label the
    /// timeout error, e.g. "Image generation" and "120s".
    pub(crate) async fn post(
        &self,
        endpoint: &str,
        payload: &Value,
        timeout: Duration,
        operation: &'static str,
        limit: &'static str,
    ) -> Result<Value, ToolError> {
        let key = self
            .key
            .as_deref()
            .ok_or(ToolError::NotConfigured("FAL_KEY"))?;

        debug!(endpoint, "calling Fal API");

        let response = self
            .client
            .post(endpoint)
            .header("Authorization", format!("Key {key}"))
            .json(payload)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ToolError::Timeout { operation, limit }
                } else {
                    ToolError::ExecutionFailed(format!("Request failed: {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ToolError::UpstreamStatus {
                service: "Fal API",
                status: status.as_u16(),
                detail: extract_detail(&body),
            });
        }

        response
            .json()
            .await
            .map_err(|e| ToolError::ExecutionFailed(format!("Invalid response: {e}")))
    }
}

/// Pull a human-readable error out of a Fal error body. Fal returns
/// `{"detail": ...}` on validation failures; anything else is passed
/// through truncated.
fn extract_detail(body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<Value>(body) {
        if let Some(detail) = json.get("detail") {
            return match detail.as_str() {
                Some(s) => s.to_string(),
                None => detail.to_string(),
            };
        }
    }
    let mut detail = body.to_string();
    if detail.len() > 200 {
        let mut end = 200;
        while !detail.is_char_boundary(end) {
            end -= 1;
        }
        detail.truncate(end);
    }
    detail
}
