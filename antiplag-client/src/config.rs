pub const DEFAULT_ENDPOINT: &str = "http://localhost:8080";

/// Where the client sends submissions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub endpoint_url: String,
}

impl ClientConfig {
    pub fn new(endpoint_url: impl Into<String>) -> Self {
        Self {
            endpoint_url: endpoint_url.into(),
        }
    }

    pub fn check_url(&self) -> String {
        format!("{}/check", self.endpoint_url.trim_end_matches('/'))
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT)
    }
}
