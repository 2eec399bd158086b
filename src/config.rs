//! Configuration options for the Cenner client

use std::path::PathBuf;
use std::time::Duration;

/// Default base address of the CRM/analytics collector.
pub const DEFAULT_COLLECTOR_URL: &str = "https://api.cenner.io";

/// Client identification string sent with every request and recorded
/// as the user agent on analytics events.
pub const CLIENT_INFO: &str = concat!("cenner-client/", env!("CARGO_PKG_VERSION"));

/// Configuration options for the Cenner client
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Base URL of the CRM/analytics collector
    pub collector_url: String,

    /// Base URL of the upstream identity provider, if one is configured
    pub provider_url: Option<String>,

    /// API key for the upstream identity provider
    pub provider_api_key: Option<String>,

    /// Directory for durable storage; `None` keeps all state in memory
    pub storage_dir: Option<PathBuf>,

    /// The request timeout
    pub request_timeout: Option<Duration>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            collector_url: DEFAULT_COLLECTOR_URL.to_string(),
            provider_url: None,
            provider_api_key: None,
            storage_dir: None,
            request_timeout: Some(Duration::from_secs(30)),
        }
    }
}

impl ClientOptions {
    /// Set the collector base URL
    pub fn with_collector_url(mut self, value: &str) -> Self {
        self.collector_url = value.to_string();
        self
    }

    /// Set the identity provider base URL
    pub fn with_provider_url(mut self, value: &str) -> Self {
        self.provider_url = Some(value.to_string());
        self
    }

    /// Set the identity provider API key
    pub fn with_provider_api_key(mut self, value: &str) -> Self {
        self.provider_api_key = Some(value.to_string());
        self
    }

    /// Set the durable storage directory
    pub fn with_storage_dir(mut self, value: impl Into<PathBuf>) -> Self {
        self.storage_dir = Some(value.into());
        self
    }

    /// Set the request timeout
    pub fn with_request_timeout(mut self, value: Option<Duration>) -> Self {
        self.request_timeout = value;
        self
    }

    /// Whether the upstream identity provider configuration is usable.
    ///
    /// When this returns false the client falls back to the local
    /// simulation provider.
    pub fn provider_configured(&self) -> bool {
        matches!((&self.provider_url, &self.provider_api_key),
            (Some(url), Some(key)) if !url.is_empty() && !key.is_empty())
    }
}
