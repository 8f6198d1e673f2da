//! Upstream endpoints and credentials.
//!
//! Values are optional at construction and checked when an operation first
//! needs them, so a partially configured bridge still starts.

use std::time::Duration;

use reqwest::Client;

use crate::error::{BridgeError, Result};

/// Timeout for every upstream call except login, which has its own.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Configuration for the upstream identity and API services.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    /// Identity service base URL (`SUPABASE_URL`)
    pub identity_url: Option<String>,
    /// Public API key sent to the identity service (`SUPABASE_ANON_KEY`)
    pub api_key: Option<String>,
    /// Indexing platform API base URL (`BACKEND_URL`)
    pub backend_url: Option<String>,
    /// Cloud-storage connection all listings go through (`CONNECTION_ID`)
    pub connection_id: Option<String>,
    pub request_timeout: Duration,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            identity_url: None,
            api_key: None,
            backend_url: None,
            connection_id: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl UpstreamConfig {
    pub fn identity_url(&self) -> Result<&str> {
        require(&self.identity_url, "SUPABASE_URL").map(trim_base_url)
    }

    pub fn api_key(&self) -> Result<&str> {
        require(&self.api_key, "SUPABASE_ANON_KEY")
    }

    pub fn backend_url(&self) -> Result<&str> {
        require(&self.backend_url, "BACKEND_URL").map(trim_base_url)
    }

    pub fn connection_id(&self) -> Result<&str> {
        require(&self.connection_id, "CONNECTION_ID")
    }

    /// Build the HTTP client shared by all components.
    pub fn http_client(&self) -> Result<Client> {
        Client::builder()
            .timeout(self.request_timeout)
            .build()
            .map_err(|e| BridgeError::Configuration(format!("Failed to create HTTP client: {}", e)))
    }
}

fn require<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(BridgeError::Configuration(format!("{} must be set", name))),
    }
}

fn trim_base_url(url: &str) -> &str {
    url.trim_end_matches('/')
}
