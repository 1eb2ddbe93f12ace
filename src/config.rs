//! Panel configuration, validated once at startup.
//!
//! Values arrive from CLI flags with environment fallbacks (see `main.rs`);
//! this module only checks and normalizes them so a bad endpoint fails
//! before the first request instead of on the first click.

use reqwest::Url;

pub const DEFAULT_BUCKET: &str = "menu-images";
pub const DEFAULT_TABLE: &str = "menu_items";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required value: {0}")]
    Missing(&'static str),
    #[error("invalid backend URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelConfig {
    /// Backend base URL without a trailing slash.
    pub supabase_url: String,
    pub anon_key: String,
    pub bucket: String,
    pub table: String,
    pub timeouts: HttpTimeouts,
}

impl PanelConfig {
    /// Validate the two required values and fill in defaults for the rest.
    ///
    /// # Errors
    ///
    /// Returns `Missing` for blank values and `InvalidUrl` when the URL does
    /// not parse or is not http(s).
    pub fn new(supabase_url: &str, anon_key: &str) -> Result<Self, ConfigError> {
        let supabase_url = normalize_url(supabase_url)?;
        let anon_key = non_blank(anon_key, "anon key")?;
        Ok(Self {
            supabase_url,
            anon_key,
            bucket: DEFAULT_BUCKET.to_owned(),
            table: DEFAULT_TABLE.to_owned(),
            timeouts: HttpTimeouts::default(),
        })
    }

    /// # Errors
    ///
    /// Returns `Missing` for a blank bucket name.
    pub fn with_bucket(mut self, bucket: &str) -> Result<Self, ConfigError> {
        self.bucket = non_blank(bucket, "bucket")?;
        Ok(self)
    }

    /// # Errors
    ///
    /// Returns `Missing` for a blank table name.
    pub fn with_table(mut self, table: &str) -> Result<Self, ConfigError> {
        self.table = non_blank(table, "table")?;
        Ok(self)
    }

    /// # Errors
    ///
    /// Returns `ZeroTimeout` if either timeout is zero.
    pub fn with_timeouts(mut self, timeouts: HttpTimeouts) -> Result<Self, ConfigError> {
        if timeouts.request_secs == 0 {
            return Err(ConfigError::ZeroTimeout("request timeout"));
        }
        if timeouts.connect_secs == 0 {
            return Err(ConfigError::ZeroTimeout("connect timeout"));
        }
        self.timeouts = timeouts;
        Ok(self)
    }

    /// First label of the backend host, used to name persisted session keys
    /// (`sb-<ref>-auth-token`).
    #[must_use]
    pub fn project_ref(&self) -> String {
        let Ok(url) = Url::parse(&self.supabase_url) else {
            return String::new();
        };
        url.host_str()
            .and_then(|host| host.split('.').next())
            .unwrap_or_default()
            .to_owned()
    }
}

fn non_blank(value: &str, name: &'static str) -> Result<String, ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Missing(name));
    }
    Ok(trimmed.to_owned())
}

fn normalize_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = non_blank(raw, "backend URL")?;
    let url = Url::parse(&trimmed).map_err(|e| ConfigError::InvalidUrl { url: trimmed.clone(), reason: e.to_string() })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl { url: trimmed, reason: format!("unsupported scheme `{}`", url.scheme()) });
    }
    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl { url: trimmed, reason: "missing host".to_owned() });
    }
    Ok(trimmed.trim_end_matches('/').to_owned())
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
