use crate::config::ServerConfig;
use crate::error::{AnalysisError, INVALID_PDF, PROMPT_REQUIRED};
use crate::models::{AnalysisInput, ModelResponse, Verdict};
use crate::tasks::*;
use std::sync::Arc;
use tracing::info;

/// Extract → build prompt → infer, run to completion for one request.
#[derive(Clone)]
pub struct AnalysisWorkflow {
    extractor: Arc<dyn TextExtractor>,
    inference: Arc<dyn InferenceBackend>,
    max_prompt_chars: Option<usize>,
}

impl AnalysisWorkflow {
    pub fn new(
        extractor: Arc<dyn TextExtractor>,
        inference: Arc<dyn InferenceBackend>,
        max_prompt_chars: Option<usize>,
    ) -> Self {
        Self {
            extractor,
            inference,
            max_prompt_chars,
        }
    }

    pub async fn run(&self, input: AnalysisInput) -> Result<Verdict, AnalysisError> {
        let prompt = match input {
            AnalysisInput::FileUpload(document) => {
                if !document.is_pdf() {
                    return Err(AnalysisError::validation(INVALID_PDF));
                }
                info!(
                    "Analyzing uploaded document '{}' ({} bytes)",
                    document.filename,
                    document.bytes.len()
                );
                let text = self.extractor.extract(document.bytes).await?;
                build_prompt(fit_to_limit(text.as_str(), self.max_prompt_chars))
            }
            AnalysisInput::DirectPrompt(prompt) => {
                if prompt.trim().is_empty() {
                    return Err(AnalysisError::validation(PROMPT_REQUIRED));
                }
                info!("Analyzing direct prompt ({} characters)", prompt.len());
                build_prompt(&prompt)
            }
        };

        match self.inference.generate(&prompt).await? {
            ModelResponse::Generated(text) => Ok(Verdict::new(text)),
            ModelResponse::Missing => Err(AnalysisError::EmptyModelResponse),
        }
    }
}

pub fn create_workflow(config: &ServerConfig) -> AnalysisWorkflow {
    AnalysisWorkflow::new(
        Arc::new(PdfTextExtractor),
        Arc::new(GenerateClient::new(config)),
        config.max_prompt_chars,
    )
}
