//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.postjoin.toml` files.

use crate::fetch::FetcherConfig;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = ".postjoin.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Remote endpoint settings.
    #[serde(default)]
    pub endpoints: EndpointsConfig,

    /// HTTP client settings.
    #[serde(default)]
    pub http: HttpConfig,

    /// Output file settings.
    #[serde(default)]
    pub output: OutputConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,

    /// Show a progress bar while fetching.
    #[serde(default = "default_true")]
    pub show_progress: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            show_progress: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// URLs of the three collections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointsConfig {
    #[serde(default = "default_users_url")]
    pub users_url: String,

    #[serde(default = "default_posts_url")]
    pub posts_url: String,

    #[serde(default = "default_comments_url")]
    pub comments_url: String,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            users_url: default_users_url(),
            posts_url: default_posts_url(),
            comments_url: default_comments_url(),
        }
    }
}

const DEFAULT_BASE_URL: &str = "https://jsonplaceholder.typicode.com";

fn default_users_url() -> String {
    format!("{}/users", DEFAULT_BASE_URL)
}

fn default_posts_url() -> String {
    format!("{}/posts", DEFAULT_BASE_URL)
}

fn default_comments_url() -> String {
    format!("{}/comments", DEFAULT_BASE_URL)
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Value of the User-Agent header.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("postjoin/{}", env!("CARGO_PKG_VERSION"))
}

impl From<&HttpConfig> for FetcherConfig {
    fn from(config: &HttpConfig) -> Self {
        Self {
            timeout_seconds: config.timeout_seconds,
            user_agent: config.user_agent.clone(),
        }
    }
}

/// Output file settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Where the aggregate is written and read back from.
    #[serde(default = "default_output_path")]
    pub path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
        }
    }
}

fn default_output_path() -> PathBuf {
    PathBuf::from("data.json")
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load `.postjoin.toml` from `dir`.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(DEFAULT_CONFIG_FILE);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were given explicitly.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref url) = args.users_url {
            self.endpoints.users_url = url.clone();
        }
        if let Some(ref url) = args.posts_url {
            self.endpoints.posts_url = url.clone();
        }
        if let Some(ref url) = args.comments_url {
            self.endpoints.comments_url = url.clone();
        }

        if let Some(timeout) = args.timeout {
            self.http.timeout_seconds = timeout;
        }

        if let Some(ref output) = args.output {
            self.output.path = output.clone();
        }

        if args.verbose {
            self.general.verbose = true;
        }
        if args.no_progress || args.quiet {
            self.general.show_progress = false;
        }
    }

    /// Check the merged settings before they reach the fetcher and store.
    ///
    /// Values from the config file skip the CLI checks, so the same rules
    /// are applied here once file and flags are combined.
    pub fn validate(&self) -> Result<()> {
        let urls = [
            ("users", &self.endpoints.users_url),
            ("posts", &self.endpoints.posts_url),
            ("comments", &self.endpoints.comments_url),
        ];
        for (name, url) in urls {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                bail!(
                    "The {} URL must start with 'http://' or 'https://' (got '{}')",
                    name,
                    url
                );
            }
        }

        if self.http.timeout_seconds == 0 {
            bail!("http.timeout_seconds must be at least 1");
        }

        if self.output.path.as_os_str().is_empty() {
            bail!("output.path must not be empty");
        }

        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
