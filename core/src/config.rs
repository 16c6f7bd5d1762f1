//! Client configuration resolved once at process start.
//!
//! Values come from defaults overridden by environment variables. There is no
//! runtime reconfiguration: build an `ApiClient` from a `ClientConfig` and keep
//! it for the life of the process.

use std::path::PathBuf;
use std::time::Duration;

use tracing::{debug, warn};

pub const ENV_BASE_URL: &str = "BACKOFFICE_API_BASE_URL";
pub const ENV_TOKEN_PATH: &str = "BACKOFFICE_TOKEN_PATH";
pub const ENV_TIMEOUT_SECS: &str = "BACKOFFICE_HTTP_TIMEOUT_SECS";

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Candidate multipart field names for a blog's image, tried in order.
pub const DEFAULT_BLOG_IMAGE_FIELDS: [&str; 4] = ["image", "featuredImage", "file", "blogImage"];

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API origin without trailing slash.
    pub base_url: String,
    /// Where `FileTokenStore` keeps the session token.
    pub token_path: PathBuf,
    pub timeout: Duration,
    pub blog_image_fields: Vec<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token_path: default_token_path(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            blog_image_fields: DEFAULT_BLOG_IMAGE_FIELDS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self::default().with_base_url(base_url)
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_token_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_path = path.into();
        self
    }

    pub fn with_blog_image_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.blog_image_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Defaults overridden by `BACKOFFICE_*` environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_overrides(|key| std::env::var(key).ok());
        config
    }

    /// Apply overrides from any key lookup. Split out from `from_env` so tests
    /// don't have to mutate the process environment.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_BASE_URL) {
            debug!(url = %url, "Overriding API base URL from environment");
            self.base_url = url.trim_end_matches('/').to_string();
        }

        if let Some(path) = lookup(ENV_TOKEN_PATH) {
            self.token_path = PathBuf::from(path);
        }

        if let Some(secs) = lookup(ENV_TIMEOUT_SECS) {
            match secs.parse::<u64>() {
                Ok(secs) if secs > 0 => self.timeout = Duration::from_secs(secs),
                _ => warn!(value = %secs, "Ignoring invalid HTTP timeout in environment"),
            }
        }
    }
}

fn default_token_path() -> PathBuf {
    directories::ProjectDirs::from("com", "backoffice", "admin")
        .map(|dirs| dirs.config_dir().join("session.json"))
        .unwrap_or_else(|| PathBuf::from("session.json"))
}
