//! Prompt construction.
//!
//! The instruction and its position after the document text are fixed so
//! verdicts stay comparable across documents. Changing either changes every
//! verdict the service produces.

use tracing::warn;

pub const ANALYSIS_INSTRUCTION: &str = "Just tell me how likely this content is AI generated. \
(in percentage) And tell me if this document gets accepted or rejected for academic publishing";

/// Document text followed by the fixed instruction. Never truncates.
pub fn build_prompt(text: &str) -> String {
    format!("{} {}", text, ANALYSIS_INSTRUCTION)
}

/// Cuts `text` to at most `max_chars` characters on a char boundary.
///
/// Returns the input unchanged when it already fits or when no limit is set.
/// A cut is logged, since the model then judges only the beginning of the document.
pub fn fit_to_limit(text: &str, max_chars: Option<usize>) -> &str {
    let Some(max_chars) = max_chars else {
        return text;
    };

    match text.char_indices().nth(max_chars) {
        None => text,
        Some((byte_end, _)) => {
            warn!(
                original_chars = text.chars().count(),
                kept_chars = max_chars,
                "Extracted text exceeds prompt limit, truncating"
            );
            &text[..byte_end]
        }
    }
}
