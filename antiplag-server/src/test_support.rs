//! Stand-ins for the PDF decoder and the model endpoint.

use crate::models::{ExtractedText, ModelResponse};
use crate::tasks::{ExtractionError, InferenceBackend, InferenceError, TextExtractor};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

pub struct FixedExtractor {
    text: Option<String>,
}

impl FixedExtractor {
    pub fn text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
        }
    }

    pub fn failing() -> Self {
        Self { text: None }
    }
}

#[async_trait]
impl TextExtractor for FixedExtractor {
    async fn extract(&self, _bytes: Vec<u8>) -> Result<ExtractedText, ExtractionError> {
        match &self.text {
            Some(text) => ExtractedText::new(text.clone()).ok_or(ExtractionError::NoText),
            None => Err(ExtractionError::Malformed("unexpected end of file".to_string())),
        }
    }
}

pub struct StubBackend {
    reply: Result<ModelResponse, InferenceError>,
    prompts: Mutex<Vec<String>>,
}

impl StubBackend {
    pub fn replying(text: &str) -> Arc<Self> {
        Self::with_reply(Ok(ModelResponse::Generated(text.to_string())))
    }

    pub fn with_reply(reply: Result<ModelResponse, InferenceError>) -> Arc<Self> {
        Arc::new(Self {
            reply,
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub async fn prompts(&self) -> Vec<String> {
        self.prompts.lock().await.clone()
    }
}

#[async_trait]
impl InferenceBackend for StubBackend {
    async fn generate(&self, prompt: &str) -> Result<ModelResponse, InferenceError> {
        self.prompts.lock().await.push(prompt.to_string());
        self.reply.clone()
    }
}
