//! HTTP client for a generateContent-style image model.

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use pixshop_core::Snapshot;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::prompt::build_prompt;
use crate::response::{parse_response, GenerateResponseV1};
use crate::{Transform, TransformError, TransformRequest};

/// Service connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub endpoint: String,
    pub model: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com/v1beta".into(),
            model: "gemini-2.5-flash-image-preview".into(),
            api_key_env: "GEMINI_API_KEY".into(),
            timeout_secs: 120,
        }
    }
}

impl ClientConfig {
    pub fn generate_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.endpoint.trim_end_matches('/'),
            self.model
        )
    }

    pub fn validate(&self) -> Result<(), ClientError> {
        if self.endpoint.trim().is_empty() {
            return Err(ClientError::InvalidConfig {
                reason: "endpoint is empty".into(),
            });
        }
        if self.model.trim().is_empty() {
            return Err(ClientError::InvalidConfig {
                reason: "model is empty".into(),
            });
        }
        if self.timeout_secs == 0 {
            return Err(ClientError::InvalidConfig {
                reason: "timeout_secs must be > 0".into(),
            });
        }
        Ok(())
    }
}

pub struct GenerativeClient {
    http: reqwest::Client,
    config: ClientConfig,
    api_key: String,
}

impl GenerativeClient {
    /// Build a client, reading the API key from the configured env var.
    pub fn from_env(config: ClientConfig) -> Result<Self, ClientError> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            tracing::error!(var = %config.api_key_env, "API key env var not set");
            ClientError::MissingApiKey {
                var: config.api_key_env.clone(),
            }
        })?;
        Self::new(config, api_key)
    }

    pub fn new(config: ClientConfig, api_key: impl Into<String>) -> Result<Self, ClientError> {
        config.validate()?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ClientError::Build(e.to_string()))?;

        tracing::info!(model = %config.model, endpoint = %config.endpoint, "generative client ready");
        Ok(Self {
            http,
            config,
            api_key: api_key.into(),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

pub fn request_body(request: &TransformRequest) -> serde_json::Value {
    json!({
        "contents": [{
            "parts": [
                {
                    "inlineData": {
                        "mimeType": request.image.mime(),
                        "data": general_purpose::STANDARD.encode(request.image.bytes()),
                    }
                },
                { "text": build_prompt(&request.operation) }
            ]
        }]
    })
}

/// Turn a raw HTTP reply into the transform contract. Error statuses and
/// bodies that are not the expected JSON are transport failures.
pub fn decode_reply(
    status: reqwest::StatusCode,
    body: &str,
    request: &TransformRequest,
) -> Result<Snapshot, TransformError> {
    if !status.is_success() {
        return Err(TransformError::Transport(format!(
            "provider returned {status}: {body}"
        )));
    }
    let parsed: GenerateResponseV1 = serde_json::from_str(body)
        .map_err(|e| TransformError::Transport(format!("malformed provider response: {e}")))?;
    parse_response(&parsed, &request.image, request.operation.edit_kind())
}

#[async_trait]
impl Transform for GenerativeClient {
    async fn transform(&self, request: TransformRequest) -> Result<Snapshot, TransformError> {
        let started = Instant::now();
        let op = request.operation.name();
        tracing::info!(operation = op, image = %request.image.name(), "sending transform request");

        let response = self
            .http
            .post(self.config.generate_url())
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body(&request))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        let result = decode_reply(status, &body, &request);
        if let Err(TransformError::Transport(reason)) = &result {
            tracing::error!(operation = op, status = %status, reason = %reason, "provider reply unusable");
        }

        tracing::info!(
            operation = op,
            ok = result.is_ok(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "transform finished"
        );
        result
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("environment variable {var} with the API key is not set")]
    MissingApiKey { var: String },

    #[error("invalid client configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("could not build HTTP client: {0}")]
    Build(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Operation;

    #[test]
    fn test_default_config_is_valid() {
        let config = ClientConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(
            config.generate_url(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash-image-preview:generateContent"
        );
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = ClientConfig {
            timeout_secs: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ClientError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_missing_api_key() {
        let config = ClientConfig {
            api_key_env: "PIXSHOP_TEST_KEY_THAT_IS_NOT_SET".into(),
            ..Default::default()
        };
        assert!(matches!(
            GenerativeClient::from_env(config),
            Err(ClientError::MissingApiKey { .. })
        ));
    }

    #[test]
    fn test_request_body_inlines_image() {
        let request = TransformRequest {
            image: Snapshot::new(
                "a.png",
                "image/png",
                vec![0u8, 1, 2],
                pixshop_core::SnapshotOrigin::Upload,
            ),
            operation: Operation::Adjust {
                instruction: "warmer".into(),
            },
        };
        let body = request_body(&request);
        let parts = &body["contents"][0]["parts"];
        assert_eq!(parts[0]["inlineData"]["mimeType"], "image/png");
        assert_eq!(parts[0]["inlineData"]["data"], "AAEC");
        assert!(parts[1]["text"].as_str().unwrap().contains("warmer"));
    }

    fn filter_request() -> TransformRequest {
        TransformRequest {
            image: Snapshot::upload("a.png", vec![1u8, 2]),
            operation: Operation::Filter {
                style: "noir".into(),
            },
        }
    }

    #[test]
    fn test_error_status_is_transport() {
        let err = decode_reply(
            reqwest::StatusCode::TOO_MANY_REQUESTS,
            "quota exceeded",
            &filter_request(),
        )
        .unwrap_err();
        match err {
            TransformError::Transport(msg) => {
                assert!(msg.contains("429"));
                assert!(msg.contains("quota exceeded"));
            }
            other => panic!("expected transport error, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_body_is_transport() {
        let err = decode_reply(reqwest::StatusCode::OK, "<html>oops</html>", &filter_request())
            .unwrap_err();
        assert!(matches!(err, TransformError::Transport(_)));
    }

    #[test]
    fn test_ok_reply_decodes_image() {
        let body = r#"{"candidates":[{"content":{"parts":[{"inlineData":{"mimeType":"image/png","data":"AAEC"}}]},"finishReason":"STOP"}]}"#;
        let out = decode_reply(reqwest::StatusCode::OK, body, &filter_request()).unwrap();
        assert_eq!(out.bytes(), &[0, 1, 2]);
        assert_eq!(out.name(), "a.png");
    }

    #[test]
    fn test_ok_reply_with_block_stays_blocked() {
        let body = r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#;
        let err = decode_reply(reqwest::StatusCode::OK, body, &filter_request()).unwrap_err();
        assert!(matches!(err, TransformError::Blocked { .. }));
    }
}
