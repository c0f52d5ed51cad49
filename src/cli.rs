//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// Postjoin - fetch users, posts and comments and join them into one document
///
/// Downloads the three collections concurrently, nests comments under their
/// posts and posts under their users, writes the result as JSON and prints
/// summary statistics read back from the written file.
///
/// Examples:
///   postjoin
///   postjoin --output out/data.json --format json
///   postjoin --users-url http://localhost:8080/users --strict
///   postjoin --analyze-only --output data.json
///   postjoin --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to configuration file
    ///
    /// If not specified, looks for .postjoin.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// File the joined data is written to and read back from
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Endpoint serving the users collection
    #[arg(long, value_name = "URL", env = "POSTJOIN_USERS_URL")]
    pub users_url: Option<String>,

    /// Endpoint serving the posts collection
    #[arg(long, value_name = "URL", env = "POSTJOIN_POSTS_URL")]
    pub posts_url: Option<String>,

    /// Endpoint serving the comments collection
    #[arg(long, value_name = "URL", env = "POSTJOIN_COMMENTS_URL")]
    pub comments_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Summary output format (text, json)
    #[arg(long, default_value = "text", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Skip fetching and summarize an existing output file
    #[arg(long)]
    pub analyze_only: bool,

    /// Fail instead of dropping posts or comments whose parent is missing
    #[arg(long)]
    pub strict: bool,

    /// Do not draw the fetch progress bar
    #[arg(long)]
    pub no_progress: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .postjoin.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Plain text (default)
    #[default]
    Text,
    /// JSON document
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        let urls = [
            ("users", &self.users_url),
            ("posts", &self.posts_url),
            ("comments", &self.comments_url),
        ];
        for (name, url) in urls {
            if let Some(url) = url {
                if !url.starts_with("http://") && !url.starts_with("https://") {
                    return Err(format!(
                        "The {} URL must start with 'http://' or 'https://'",
                        name
                    ));
                }
            }
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if self.analyze_only && self.strict {
            return Err("--strict has no effect with --analyze-only".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
