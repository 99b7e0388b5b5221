use crate::models::ExtractedText;
use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, warn};

/// PDF headers may be preceded by junk; readers accept it within the first KiB.
const HEADER_SEARCH_WINDOW: usize = 1024;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("File is not a valid PDF")]
    NotAPdf,

    #[error("PDF could not be read: {0}")]
    Malformed(String),

    #[error("No text could be extracted from the PDF; it may be scanned or image-only")]
    NoText,

    #[error("PDF decoder failed unexpectedly while reading the document")]
    Panicked,
}

/// Turns raw document bytes into plain text.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, bytes: Vec<u8>) -> Result<ExtractedText, ExtractionError>;
}

/// `pdf-extract` backed extractor. Decoding is CPU bound and may panic on
/// hostile input, so it runs on the blocking pool where a panic is just a
/// failed join.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfTextExtractor;

#[async_trait]
impl TextExtractor for PdfTextExtractor {
    async fn extract(&self, bytes: Vec<u8>) -> Result<ExtractedText, ExtractionError> {
        if !has_pdf_header(&bytes) {
            return Err(ExtractionError::NotAPdf);
        }

        info!("Extracting text from PDF ({} bytes)", bytes.len());

        let text =
            decode_on_blocking_pool(move || pdf_extract::extract_text_from_mem(&bytes)).await?;

        let extracted = ExtractedText::new(text).ok_or_else(|| {
            warn!("PDF decoded but contained no text");
            ExtractionError::NoText
        })?;

        info!(
            "Extracted {} characters from PDF",
            extracted.char_count()
        );
        Ok(extracted)
    }
}

/// Runs `decode` on the blocking pool. A panic inside it becomes
/// `Panicked` instead of unwinding into the request task.
async fn decode_on_blocking_pool<F, E>(decode: F) -> Result<String, ExtractionError>
where
    F: FnOnce() -> Result<String, E> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    tokio::task::spawn_blocking(decode)
        .await
        .map_err(|e| {
            if e.is_panic() {
                warn!("PDF decoder panicked");
                ExtractionError::Panicked
            } else {
                ExtractionError::Malformed(e.to_string())
            }
        })?
        .map_err(|e| ExtractionError::Malformed(e.to_string()))
}

fn has_pdf_header(bytes: &[u8]) -> bool {
    let window = &bytes[..bytes.len().min(HEADER_SEARCH_WINDOW)];
    window.windows(5).any(|w| w == b"%PDF-")
}

/// Single-page PDF with one line of Courier text, for tests across the crate.
#[cfg(test)]
pub(crate) fn sample_pdf(line: &str) -> Vec<u8> {
    use lopdf::content::{Content, Operation};
    use lopdf::{Document, Object, Stream, dictionary};

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });
    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 24.into()]),
            Operation::new("Td", vec![72.into(), 700.into()]),
            Operation::new("Tj", vec![Object::string_literal(line)]),
            Operation::new("ET", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}
