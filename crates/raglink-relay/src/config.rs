//! Relay configuration.

use serde::{Deserialize, Serialize};

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

/// Where the relay forwards requests to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Base URL of the RAG backend, without a trailing slash.
    #[serde(default = "default_base_url")]
    pub backend_base_url: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            backend_base_url: default_base_url(),
        }
    }
}

impl RelayConfig {
    /// Creates a config pointing at the given backend base URL.
    pub fn new(backend_base_url: impl Into<String>) -> Self {
        let mut backend_base_url = backend_base_url.into();
        while backend_base_url.ends_with('/') {
            backend_base_url.pop();
        }
        Self { backend_base_url }
    }

    /// Joins a backend path onto the base URL.
    pub fn backend_url(&self, path: &str) -> String {
        format!("{}{}", self.backend_base_url, path)
    }
}
