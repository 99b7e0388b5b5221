use crate::config::ServerConfig;
use crate::models::ModelResponse;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, warn};

/// Upstream error bodies are logged, not forwarded; keep the log line bounded.
const MAX_ERROR_BODY_CHARS: usize = 512;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InferenceError {
    #[error("Could not reach inference endpoint: {0}")]
    Connection(String),

    #[error("Inference endpoint did not answer within {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },

    #[error("Inference endpoint returned HTTP {status}")]
    Status { status: u16, body: String },

    #[error("Inference endpoint returned an unreadable body: {0}")]
    MalformedBody(String),
}

/// A text-generation service: prompt in, generated text out. One attempt per call.
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<ModelResponse, InferenceError>;
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    max_tokens: u32,
    think: bool,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: Option<String>,
}

/// Client for an Ollama-style `generate` endpoint with streaming and
/// reasoning output switched off.
#[derive(Debug, Clone)]
pub struct GenerateClient {
    http: Client,
    url: String,
    model: String,
    max_tokens: u32,
    timeout: Duration,
}

impl GenerateClient {
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            http: Client::new(),
            url: config.inference_url.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            timeout: config.inference_timeout,
        }
    }

    async fn send(&self, prompt: &str) -> Result<ModelResponse, InferenceError> {
        let payload = GenerateRequest {
            model: &self.model,
            prompt,
            max_tokens: self.max_tokens,
            think: false,
            stream: false,
        };

        let response = self
            .http
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| InferenceError::Connection(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| InferenceError::Connection(e.to_string()))?;

        if !status.is_success() {
            let body: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
            error!("Inference request failed: {} {}", status, body);
            return Err(InferenceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        parse_generate_body(&body)
    }
}

#[async_trait]
impl InferenceBackend for GenerateClient {
    async fn generate(&self, prompt: &str) -> Result<ModelResponse, InferenceError> {
        info!(
            model = %self.model,
            prompt_chars = prompt.chars().count(),
            "Calling inference endpoint"
        );

        match tokio::time::timeout(self.timeout, self.send(prompt)).await {
            Ok(result) => result,
            Err(_) => {
                warn!("Inference call timed out after {:?}", self.timeout);
                Err(InferenceError::Timeout {
                    elapsed_ms: self.timeout.as_millis() as u64,
                })
            }
        }
    }
}

fn parse_generate_body(body: &str) -> Result<ModelResponse, InferenceError> {
    let parsed: GenerateResponse =
        serde_json::from_str(body).map_err(|e| InferenceError::MalformedBody(e.to_string()))?;

    match parsed.response {
        Some(text) if !text.is_empty() => {
            info!("Inference returned {} characters", text.len());
            Ok(ModelResponse::Generated(text))
        }
        _ => {
            warn!("Inference response had no usable payload");
            Ok(ModelResponse::Missing)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
    use serde_json::{Value, json};
    use std::sync::Arc;
    use tokio::sync::Mutex;

    async fn spawn_stub(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/api/generate", addr)
    }

    fn client_for(url: String, timeout: Duration) -> GenerateClient {
        let mut config = ServerConfig::new(url);
        config.inference_timeout = timeout;
        GenerateClient::new(&config)
    }

    #[tokio::test]
    async fn sends_fixed_request_shape_and_passes_text_through() {
        let seen: Arc<Mutex<Option<Value>>> = Arc::default();
        let router = Router::new()
            .route(
                "/api/generate",
                post(
                    |State(seen): State<Arc<Mutex<Option<Value>>>>, Json(body): Json<Value>| async move {
                        *seen.lock().await = Some(body);
                        Json(json!({ "response": "### Verdict\n**87%** likely AI. *Rejected*.\n" }))
                    },
                ),
            )
            .with_state(seen.clone());
        let client = client_for(spawn_stub(router).await, Duration::from_secs(5));

        let response = client.generate("some paper").await.unwrap();
        assert_eq!(
            response,
            ModelResponse::Generated("### Verdict\n**87%** likely AI. *Rejected*.\n".to_string())
        );

        let body = seen.lock().await.take().unwrap();
        assert_eq!(
            body,
            json!({
                "model": "deepseek-r1",
                "prompt": "some paper",
                "max_tokens": 256,
                "think": false,
                "stream": false
            })
        );
    }

    #[tokio::test]
    async fn server_error_maps_to_status() {
        let router = Router::new().route(
            "/api/generate",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "model crashed") }),
        );
        let client = client_for(spawn_stub(router).await, Duration::from_secs(5));

        let err = client.generate("x").await.unwrap_err();
        assert_eq!(
            err,
            InferenceError::Status {
                status: 500,
                body: "model crashed".to_string()
            }
        );
    }

    #[tokio::test]
    async fn missing_payload_field_is_soft() {
        let router = Router::new().route(
            "/api/generate",
            post(|| async { Json(json!({ "done": true })) }),
        );
        let client = client_for(spawn_stub(router).await, Duration::from_secs(5));

        assert_eq!(client.generate("x").await.unwrap(), ModelResponse::Missing);
    }

    #[tokio::test]
    async fn non_json_body_is_malformed() {
        let router = Router::new().route("/api/generate", post(|| async { "<html>oops</html>" }));
        let client = client_for(spawn_stub(router).await, Duration::from_secs(5));

        let err = client.generate("x").await.unwrap_err();
        assert!(matches!(err, InferenceError::MalformedBody(_)));
    }

    #[tokio::test]
    async fn slow_endpoint_times_out() {
        let router = Router::new().route(
            "/api/generate",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(json!({ "response": "too late" }))
            }),
        );
        let client = client_for(spawn_stub(router).await, Duration::from_millis(100));

        let err = client.generate("x").await.unwrap_err();
        assert_eq!(err, InferenceError::Timeout { elapsed_ms: 100 });
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_connection_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let client = client_for(
            format!("http://{}/api/generate", addr),
            Duration::from_secs(5),
        );

        let err = client.generate("x").await.unwrap_err();
        assert!(matches!(err, InferenceError::Connection(_)), "got {err:?}");
    }
}
