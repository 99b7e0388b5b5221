use serde::{Deserialize, Serialize, Serializer};

pub const PDF_MEDIA_TYPE: &str = "application/pdf";

/// Reason given when the model answers without a usable payload.
pub const FALLBACK_RESPONSE: &str = "Something went wrong";

#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub filename: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl UploadedDocument {
    pub fn is_pdf(&self) -> bool {
        media_type_is_pdf(&self.media_type)
    }
}

/// Compares the essence of a media type, ignoring parameters and case.
pub fn media_type_is_pdf(media_type: &str) -> bool {
    media_type
        .split(';')
        .next()
        .map(|essence| essence.trim().eq_ignore_ascii_case(PDF_MEDIA_TYPE))
        .unwrap_or(false)
}

/// Text pulled out of a PDF. Never empty: a document without text is an
/// extraction error, not an `ExtractedText`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText(String);

impl ExtractedText {
    pub(crate) fn new(text: String) -> Option<Self> {
        if text.trim().is_empty() {
            None
        } else {
            Some(Self(text))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn char_count(&self) -> usize {
        self.0.chars().count()
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

/// The two accepted request shapes. Exactly one is ever built per request.
#[derive(Debug, Clone)]
pub enum AnalysisInput {
    FileUpload(UploadedDocument),
    DirectPrompt(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelResponse {
    Generated(String),
    /// The endpoint answered 2xx but without a usable `response` field.
    Missing,
}

/// Model output handed back to the client untouched, rendered as Markdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Verdict(String);

impl Verdict {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The only contract between server and client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisOutcome {
    Success(Verdict),
    Failure { reason: String },
}

impl AnalysisOutcome {
    pub fn failure(reason: impl Into<String>) -> Self {
        Self::Failure {
            reason: reason.into(),
        }
    }
}

#[derive(Serialize)]
struct OutcomeBody<'a> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    response: Option<&'a Verdict>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'a str>,
}

impl Serialize for AnalysisOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let body = match self {
            AnalysisOutcome::Success(verdict) => OutcomeBody {
                success: true,
                response: Some(verdict),
                reason: None,
            },
            AnalysisOutcome::Failure { reason } => OutcomeBody {
                success: false,
                response: None,
                reason: Some(reason),
            },
        };
        body.serialize(serializer)
    }
}

/// Direct-prompt request, from either `?prompt=` or a JSON body.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct PromptRequest {
    pub prompt: Option<String>,
}
