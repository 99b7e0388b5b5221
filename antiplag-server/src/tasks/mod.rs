pub mod inference;
pub mod pdf_extract;
pub mod prompt;
pub mod upload;

pub use inference::{GenerateClient, InferenceBackend, InferenceError};
pub use pdf_extract::{ExtractionError, PdfTextExtractor, TextExtractor};
pub use prompt::{ANALYSIS_INSTRUCTION, build_prompt, fit_to_limit};
pub use upload::{StagedUpload, UploadError};
