use std::path::Path;

pub const PDF_MEDIA_TYPE: &str = "application/pdf";

/// A file the user picked, with the media type it was declared as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            bytes,
        }
    }

    /// Reads `path`, declaring the media type from its extension unless one is given.
    pub async fn from_path(path: &Path, media_type: Option<&str>) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.pdf".to_string());
        let media_type = media_type
            .map(str::to_owned)
            .unwrap_or_else(|| media_type_for_path(path).to_string());
        Ok(Self::new(name, media_type, bytes))
    }

    /// Same essence comparison as the server's upload check; keep the two in step.
    pub fn is_pdf(&self) -> bool {
        self.media_type
            .split(';')
            .next()
            .is_some_and(|essence| essence.trim().eq_ignore_ascii_case(PDF_MEDIA_TYPE))
    }
}

/// The media type a browser would declare for a file with this extension.
pub fn media_type_for_path(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase());

    match extension.as_deref() {
        Some("pdf") => PDF_MEDIA_TYPE,
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        Some("doc") => "application/msword",
        Some("txt") => "text/plain",
        Some("md") => "text/markdown",
        _ => "application/octet-stream",
    }
}
