use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    pub locations_path: PathBuf,
    pub cache_dir: PathBuf,
    pub artifact_dir: PathBuf,
    /// Validity window applied by the automatic-skip check, in hours.
    pub refresh_validity_hours: f32,
    /// Cap on source groups fetching concurrently within one batch.
    pub refresh_max_concurrent_sources: usize,
    /// Development override: refresh every location regardless of freshness.
    pub refresh_ignore_freshness: bool,
    /// Surface skipped locations in a notification (off by default).
    pub notify_skipped: bool,
    pub source_request_timeout_secs: u64,
    pub source_user_agent: String,
    pub source_max_retries: u32,
    pub source_retry_backoff_base_ms: u64,
    pub source_api_key: Option<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("locations_path", &self.locations_path)
            .field("cache_dir", &self.cache_dir)
            .field("artifact_dir", &self.artifact_dir)
            .field("refresh_validity_hours", &self.refresh_validity_hours)
            .field(
                "refresh_max_concurrent_sources",
                &self.refresh_max_concurrent_sources,
            )
            .field("refresh_ignore_freshness", &self.refresh_ignore_freshness)
            .field("notify_skipped", &self.notify_skipped)
            .field(
                "source_request_timeout_secs",
                &self.source_request_timeout_secs,
            )
            .field("source_user_agent", &self.source_user_agent)
            .field("source_max_retries", &self.source_max_retries)
            .field(
                "source_retry_backoff_base_ms",
                &self.source_retry_backoff_base_ms,
            )
            .field(
                "source_api_key",
                &self.source_api_key.as_ref().map(|_| "[redacted]"),
            )
            .finish()
    }
}
