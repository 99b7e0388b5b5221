use crate::config::ClientConfig;
use crate::file::SelectedFile;
use async_trait::async_trait;
use reqwest::{
    Client,
    multipart::{Form, Part},
};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

/// What the server decided about a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerReply {
    Verdict(String),
    Rejected { reason: Option<String> },
}

/// The request never produced a readable answer.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("unreadable response (HTTP {status}): {detail}")]
    Decode { status: u16, detail: String },
}

#[async_trait]
pub trait AnalysisApi: Send + Sync {
    async fn submit(&self, file: &SelectedFile) -> Result<ServerReply, TransportError>;
}

#[derive(Debug, Deserialize)]
struct WireOutcome {
    #[serde(default)]
    success: bool,
    response: Option<String>,
    reason: Option<String>,
}

/// Failure bodies are read regardless of HTTP status; the body is the contract.
pub fn decode_reply(body: &str) -> Result<ServerReply, serde_json::Error> {
    let outcome: WireOutcome = serde_json::from_str(body)?;
    Ok(match outcome {
        WireOutcome {
            success: true,
            response: Some(text),
            ..
        } if !text.is_empty() => ServerReply::Verdict(text),
        WireOutcome { reason, .. } => ServerReply::Rejected {
            reason: reason.filter(|r| !r.trim().is_empty()),
        },
    })
}

/// Posts the file as multipart field `file` to `{endpoint}/check`.
#[derive(Debug, Clone)]
pub struct HttpAnalysisApi {
    http: Client,
    check_url: String,
}

impl HttpAnalysisApi {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            http: Client::new(),
            check_url: config.check_url(),
        }
    }
}

#[async_trait]
impl AnalysisApi for HttpAnalysisApi {
    async fn submit(&self, file: &SelectedFile) -> Result<ServerReply, TransportError> {
        info!("Submitting '{}' to {}", file.name, self.check_url);

        let part = Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str(&file.media_type)?;
        let form = Form::new().part("file", part);

        let response = self.http.post(&self.check_url).multipart(form).send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!("Server answered HTTP {}", status);

        decode_reply(&body).map_err(|e| TransportError::Decode {
            status: status.as_u16(),
            detail: e.to_string(),
        })
    }
}
