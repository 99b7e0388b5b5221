pub mod api;
pub mod config;
pub mod file;
pub mod state;

pub use api::{AnalysisApi, HttpAnalysisApi, ServerReply, TransportError};
pub use config::{ClientConfig, DEFAULT_ENDPOINT};
pub use file::SelectedFile;
pub use state::{Phase, StateError, UploadState};
