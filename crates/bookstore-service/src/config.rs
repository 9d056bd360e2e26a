//! Service configuration.

use bookstore_ledger::{DEFAULT_CLAIM_LEASE, DEFAULT_MAX_ATTEMPTS};

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to listen on (default: "0.0.0.0:8080").
    pub listen_addr: String,

    /// Path to the `RocksDB` data directory. The in-memory store is used when unset.
    pub data_dir: Option<String>,

    /// Shared secret for HS256 bearer tokens.
    pub jwt_secret: String,

    /// Admin API key for catalog administration.
    pub admin_api_key: Option<String>,

    /// CORS allowed origins.
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,

    /// Attempts per unit of work before reporting the store as unavailable.
    pub tx_max_attempts: u32,

    /// Seconds before an unsettled payment claim may be taken over.
    pub claim_lease_seconds: u64,
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let jwt_secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| {
            tracing::warn!("JWT_SECRET not set, using the development secret");
            Self::default().jwt_secret
        });

        Self {
            listen_addr: std::env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".into()),
            data_dir: std::env::var("DATA_DIR").ok().filter(|s| !s.is_empty()),
            jwt_secret,
            admin_api_key: std::env::var("ADMIN_API_KEY").ok(),
            cors_origins: parse_origins(
                &std::env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".into()),
            ),
            max_body_bytes: parse_or("MAX_BODY_BYTES", 1024 * 1024), // 1MB
            request_timeout_seconds: parse_or("REQUEST_TIMEOUT_SECONDS", 30),
            tx_max_attempts: parse_or("TX_MAX_ATTEMPTS", DEFAULT_MAX_ATTEMPTS),
            claim_lease_seconds: parse_or("CLAIM_LEASE_SECONDS", DEFAULT_CLAIM_LEASE.as_secs()),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".into(),
            data_dir: None,
            jwt_secret: "bookstore-dev-secret".into(),
            admin_api_key: None,
            cors_origins: vec!["*".into()],
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 30,
            tx_max_attempts: DEFAULT_MAX_ATTEMPTS,
            claim_lease_seconds: DEFAULT_CLAIM_LEASE.as_secs(),
        }
    }
}

/// Read a numeric variable, falling back to `default` when unset or malformed.
fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
