//! Upload/display state machine.
//!
//! `Idle` → `FileSelected` → `Submitting` → `VerdictReady`, falling back to
//! `FileSelected` with an inline error when a submission fails. All
//! transitions take `&mut self`, so only one submission can be in flight.
//! A verdict is shown only when the whole request succeeded.

use crate::api::{AnalysisApi, ServerReply, TransportError};
use crate::file::SelectedFile;
use thiserror::Error;
use tracing::{info, warn};

pub const INVALID_SELECTION: &str = "Please select a valid PDF file";
pub const NO_FILE_SELECTED: &str = "Please upload a PDF file first.";
pub const CONNECTION_FAILED: &str = "Server connection failed.";
pub const GENERIC_FAILURE: &str = "Something went wrong.";

pub const SUBMIT_LABEL: &str = "Check for AI / Plagiarism";
pub const SUBMITTING_LABEL: &str = "Analyzing...";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    FileSelected,
    Submitting,
    VerdictReady,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StateError {
    #[error("a submission is already in progress")]
    Busy,

    #[error("no PDF file has been selected")]
    NoFile,

    #[error("no submission is in progress")]
    NotSubmitting,
}

#[derive(Debug, Default)]
pub struct UploadState {
    phase: Phase,
    file: Option<SelectedFile>,
    error: Option<String>,
    verdict: Option<String>,
}

impl UploadState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn file(&self) -> Option<&SelectedFile> {
        self.file.as_ref()
    }

    /// Inline error text, if the last action failed.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Last verdict received. Kept after the modal is dismissed.
    pub fn verdict(&self) -> Option<&str> {
        self.verdict.as_deref()
    }

    pub fn is_modal_open(&self) -> bool {
        self.phase == Phase::VerdictReady
    }

    pub fn can_submit(&self) -> bool {
        self.file.is_some() && self.phase != Phase::Submitting
    }

    pub fn submit_label(&self) -> &'static str {
        if self.phase == Phase::Submitting {
            SUBMITTING_LABEL
        } else {
            SUBMIT_LABEL
        }
    }

    /// A non-PDF selection leaves the current file and phase alone and sets
    /// an inline error.
    pub fn select_file(&mut self, file: SelectedFile) -> Result<(), StateError> {
        if self.phase == Phase::Submitting {
            return Err(StateError::Busy);
        }

        if !file.is_pdf() {
            warn!(
                "Rejected selection '{}' declared as '{}'",
                file.name, file.media_type
            );
            self.error = Some(INVALID_SELECTION.to_string());
            return Ok(());
        }

        self.file = Some(file);
        self.verdict = None;
        self.error = None;
        self.phase = Phase::FileSelected;
        Ok(())
    }

    /// Moves to `Submitting` and hands back the file to send.
    pub fn begin_submission(&mut self) -> Result<SelectedFile, StateError> {
        if self.phase == Phase::Submitting {
            return Err(StateError::Busy);
        }

        let Some(file) = self.file.clone() else {
            self.error = Some(NO_FILE_SELECTED.to_string());
            return Err(StateError::NoFile);
        };

        self.phase = Phase::Submitting;
        self.error = None;
        self.verdict = None;
        Ok(file)
    }

    pub fn complete_submission(
        &mut self,
        result: Result<ServerReply, TransportError>,
    ) -> Result<(), StateError> {
        if self.phase != Phase::Submitting {
            return Err(StateError::NotSubmitting);
        }

        match result {
            Ok(ServerReply::Verdict(text)) => {
                info!("Verdict received ({} characters)", text.len());
                self.verdict = Some(text);
                self.phase = Phase::VerdictReady;
            }
            Ok(ServerReply::Rejected { reason }) => {
                warn!("Server rejected submission: {:?}", reason);
                self.error = Some(reason.unwrap_or_else(|| GENERIC_FAILURE.to_string()));
                self.phase = Phase::FileSelected;
            }
            Err(e) => {
                warn!("Submission failed: {}", e);
                self.error = Some(CONNECTION_FAILED.to_string());
                self.phase = Phase::FileSelected;
            }
        }
        Ok(())
    }

    /// Closes the verdict modal. The verdict itself is kept.
    pub fn dismiss_verdict(&mut self) {
        if self.phase == Phase::VerdictReady {
            self.phase = Phase::FileSelected;
        }
    }

    /// Runs one submission to completion against `api`.
    pub async fn submit<A>(&mut self, api: &A) -> Result<Phase, StateError>
    where
        A: AnalysisApi + ?Sized,
    {
        let file = self.begin_submission()?;
        let result = api.submit(&file).await;
        self.complete_submission(result)?;
        Ok(self.phase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::HttpAnalysisApi;
    use crate::config::ClientConfig;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeApi {
        reply: Option<ServerReply>,
        calls: AtomicUsize,
    }

    impl FakeApi {
        fn replying(reply: ServerReply) -> Self {
            Self {
                reply: Some(reply),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AnalysisApi for FakeApi {
        async fn submit(&self, _file: &SelectedFile) -> Result<ServerReply, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.reply {
                Some(reply) => Ok(reply.clone()),
                None => Err(TransportError::Decode {
                    status: 502,
                    detail: "not json".to_string(),
                }),
            }
        }
    }

    fn pdf() -> SelectedFile {
        SelectedFile::new("paper.pdf", "application/pdf", b"%PDF-1.4".to_vec())
    }

    fn renamed_docx() -> SelectedFile {
        SelectedFile::new(
            "paper.pdf",
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            b"PK\x03\x04".to_vec(),
        )
    }

    #[test]
    fn starts_idle_and_not_submittable() {
        let state = UploadState::new();
        assert_eq!(state.phase(), Phase::Idle);
        assert!(!state.can_submit());
        assert_eq!(state.submit_label(), SUBMIT_LABEL);
    }

    #[tokio::test]
    async fn non_pdf_selection_stays_idle_and_never_calls_server() {
        let api = FakeApi::replying(ServerReply::Verdict("x".into()));
        let mut state = UploadState::new();

        state.select_file(renamed_docx()).unwrap();

        assert_eq!(state.phase(), Phase::Idle);
        assert_eq!(state.error(), Some(INVALID_SELECTION));
        assert!(!state.can_submit());
        assert_eq!(state.submit(&api).await, Err(StateError::NoFile));
        assert_eq!(api.calls(), 0);
    }

    #[test]
    fn invalid_reselection_keeps_previous_file() {
        let mut state = UploadState::new();
        state.select_file(pdf()).unwrap();
        state.select_file(renamed_docx()).unwrap();

        assert_eq!(state.phase(), Phase::FileSelected);
        assert_eq!(state.file(), Some(&pdf()));
        assert_eq!(state.error(), Some(INVALID_SELECTION));
    }

    #[test]
    fn valid_selection_clears_error() {
        let mut state = UploadState::new();
        state.select_file(renamed_docx()).unwrap();
        state.select_file(pdf()).unwrap();

        assert_eq!(state.phase(), Phase::FileSelected);
        assert_eq!(state.error(), None);
        assert!(state.can_submit());
    }

    #[test]
    fn second_submission_while_submitting_is_refused() {
        let mut state = UploadState::new();
        state.select_file(pdf()).unwrap();

        state.begin_submission().unwrap();

        assert_eq!(state.phase(), Phase::Submitting);
        assert!(!state.can_submit());
        assert_eq!(state.submit_label(), SUBMITTING_LABEL);
        assert_eq!(state.begin_submission(), Err(StateError::Busy));
        assert_eq!(state.select_file(pdf()), Err(StateError::Busy));
    }

    #[tokio::test]
    async fn success_opens_modal_and_dismiss_keeps_verdict() {
        let api = FakeApi::replying(ServerReply::Verdict("**15%** AI\n\nAccepted".into()));
        let mut state = UploadState::new();
        state.select_file(pdf()).unwrap();

        assert_eq!(state.submit(&api).await, Ok(Phase::VerdictReady));
        assert!(state.is_modal_open());
        assert_eq!(state.verdict(), Some("**15%** AI\n\nAccepted"));

        state.dismiss_verdict();

        assert_eq!(state.phase(), Phase::FileSelected);
        assert!(!state.is_modal_open());
        assert_eq!(state.verdict(), Some("**15%** AI\n\nAccepted"));
        assert!(state.can_submit());
    }

    #[tokio::test]
    async fn server_rejection_shows_reason_without_modal() {
        let api = FakeApi::replying(ServerReply::Rejected {
            reason: Some("File is not a valid PDF".into()),
        });
        let mut state = UploadState::new();
        state.select_file(pdf()).unwrap();

        assert_eq!(state.submit(&api).await, Ok(Phase::FileSelected));
        assert_eq!(state.error(), Some("File is not a valid PDF"));
        assert_eq!(state.verdict(), None);
        assert!(!state.is_modal_open());
    }

    #[tokio::test]
    async fn rejection_without_reason_uses_generic_message() {
        let api = FakeApi::replying(ServerReply::Rejected { reason: None });
        let mut state = UploadState::new();
        state.select_file(pdf()).unwrap();

        state.submit(&api).await.unwrap();

        assert_eq!(state.error(), Some(GENERIC_FAILURE));
    }

    #[tokio::test]
    async fn unreadable_reply_counts_as_connection_failure() {
        let api = FakeApi {
            reply: None,
            calls: AtomicUsize::new(0),
        };
        let mut state = UploadState::new();
        state.select_file(pdf()).unwrap();

        state.submit(&api).await.unwrap();

        assert_eq!(state.error(), Some(CONNECTION_FAILED));
    }

    #[tokio::test]
    async fn unreachable_server_keeps_file_and_reenables_submit() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let api = HttpAnalysisApi::new(&ClientConfig::new(format!("http://{}", addr)));
        let mut state = UploadState::new();
        state.select_file(pdf()).unwrap();

        assert_eq!(state.submit(&api).await, Ok(Phase::FileSelected));

        assert_eq!(state.error(), Some(CONNECTION_FAILED));
        assert_eq!(state.file(), Some(&pdf()));
        assert!(state.can_submit());
        assert!(!state.is_modal_open());
    }

    #[test]
    fn completion_outside_submission_is_refused() {
        let mut state = UploadState::new();
        assert_eq!(
            state.complete_submission(Ok(ServerReply::Verdict("x".into()))),
            Err(StateError::NotSubmitting)
        );
    }

    #[test]
    fn submit_without_file_sets_inline_error() {
        let mut state = UploadState::new();
        assert_eq!(state.begin_submission(), Err(StateError::NoFile));
        assert_eq!(state.error(), Some(NO_FILE_SELECTED));
        assert_eq!(state.phase(), Phase::Idle);
    }
}
