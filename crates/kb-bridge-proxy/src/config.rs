use std::time::Duration;

use clap::Parser;
use kb_bridge_core::UpstreamConfig;

/// Configuration for the kb-bridge HTTP front end.
#[derive(Parser, Debug, Clone)]
#[command(name = "kb-bridge-proxy")]
#[command(about = "Backend-for-frontend for the knowledge base indexing platform")]
pub struct Config {
    /// TCP host to bind to
    #[arg(long, default_value = "0.0.0.0", env = "BRIDGE_HOST")]
    pub host: String,

    /// TCP port to bind to
    #[arg(long, default_value = "8000", env = "BRIDGE_PORT")]
    pub port: u16,

    /// Identity service base URL
    #[arg(long, env = "SUPABASE_URL")]
    pub supabase_url: Option<String>,

    /// Public API key for the identity service
    #[arg(long, env = "SUPABASE_ANON_KEY", hide_env_values = true)]
    pub supabase_anon_key: Option<String>,

    /// Indexing platform API base URL
    #[arg(long, env = "BACKEND_URL")]
    pub backend_url: Option<String>,

    /// Cloud-storage connection to browse and index
    #[arg(long, env = "CONNECTION_ID")]
    pub connection_id: Option<String>,

    /// Timeout for upstream calls other than login (seconds)
    #[arg(long, default_value = "60", env = "REQUEST_TIMEOUT_SECS")]
    pub request_timeout_secs: u64,

    /// Allowed browser origins (comma separated)
    #[arg(
        long,
        default_value = "http://localhost:3000",
        env = "CORS_ORIGINS",
        value_delimiter = ','
    )]
    pub cors_origins: Vec<String>,
}

impl Config {
    /// Upstream settings handed to the core; checked there on first use.
    pub fn upstream(&self) -> UpstreamConfig {
        UpstreamConfig {
            identity_url: self.supabase_url.clone(),
            api_key: self.supabase_anon_key.clone(),
            backend_url: self.backend_url.clone(),
            connection_id: self.connection_id.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }
}
