pub mod config;
pub mod error;
pub mod models;
pub mod service;
pub mod tasks;
pub mod workflow;

#[cfg(test)]
mod test_support;

pub use config::ServerConfig;
pub use error::AnalysisError;
pub use models::*;
pub use service::{AppState, build_router, create_app};
pub use workflow::{AnalysisWorkflow, create_workflow};
