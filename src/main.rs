//! Postjoin - concurrent fetch-and-join of users, posts and comments
//!
//! Fetches three related collections concurrently, nests them into a
//! user → posts → comments document, saves it as JSON and prints summary
//! statistics read back from the saved file.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Invalid arguments or configuration
//!   2 - A collection could not be fetched
//!   3 - The output file could not be written or read back
//!   4 - `--strict` was set and the join would drop records

mod analysis;
mod cli;
mod config;
mod error;
mod fetch;
mod models;
mod report;

use anyhow::{Context, Result};
use cli::{Args, OutputFormat};
use config::{Config, DEFAULT_CONFIG_FILE};
use error::{FetchError, IntegrityError, StoreError};
use fetch::{Endpoints, Fetcher, FetcherConfig};
use models::AggregatedUser;
use report::SummaryReport;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const EXIT_USAGE: i32 = 1;
const EXIT_FETCH: i32 = 2;
const EXIT_STORE: i32 = 3;
const EXIT_INTEGRITY: i32 = 4;

/// Where the effective configuration came from.
enum ConfigSource {
    Explicit(PathBuf),
    WorkingDir,
    BuiltIn,
    /// The default file exists but could not be parsed.
    Fallback(anyhow::Error),
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(EXIT_USAGE);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    let (config, source) = match prepare_config(&args) {
        Ok(prepared) => prepared,
        Err(e) => {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(EXIT_USAGE);
        }
    };

    init_logging(&args, &config);

    info!("Postjoin v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    report_config_source(&source);

    if let Err(e) = run(&args, &config).await {
        if let Some(resource) = e.downcast_ref::<FetchError>().and_then(FetchError::resource) {
            error!("The {} collection could not be fetched", resource);
        }
        error!("Run failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(exit_code(&e));
    }

    Ok(())
}

/// Handle --init-config: generate a default .postjoin.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            DEFAULT_CONFIG_FILE
        );
        std::process::exit(EXIT_USAGE);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", DEFAULT_CONFIG_FILE);
    println!("   Edit it to customize endpoints, timeout and output path.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// Logs go to stderr so stdout carries only the progress lines and summary.
fn init_logging(args: &Args, config: &Config) {
    let level = if config.general.verbose && !args.quiet {
        tracing::Level::DEBUG
    } else {
        args.log_level()
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Load the configuration, apply CLI overrides and check the result.
fn prepare_config(args: &Args) -> Result<(Config, ConfigSource)> {
    let (mut config, source) = load_config(args)?;
    config.merge_with_args(args);
    config.validate().context("Invalid configuration")?;
    Ok((config, source))
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<(Config, ConfigSource)> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        let config = Config::load(config_path)?;
        return Ok((config, ConfigSource::Explicit(config_path.clone())));
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok((config, ConfigSource::WorkingDir)),
        Ok(None) => Ok((Config::default(), ConfigSource::BuiltIn)),
        Err(e) => Ok((Config::default(), ConfigSource::Fallback(e))),
    }
}

fn report_config_source(source: &ConfigSource) {
    match source {
        ConfigSource::Explicit(path) => info!("Loaded config from: {}", path.display()),
        ConfigSource::WorkingDir => info!("Loaded default config from {}", DEFAULT_CONFIG_FILE),
        ConfigSource::BuiltIn => debug!("No config file found, using defaults"),
        ConfigSource::Fallback(e) => warn!("Failed to load config, using defaults: {:#}", e),
    }
}

/// Run the fetch → join → save → read back → summarize pipeline.
async fn run(args: &Args, config: &Config) -> Result<()> {
    let start_time = Instant::now();
    let output = &config.output.path;
    let chatty = !args.quiet && args.format == OutputFormat::Text;

    if args.analyze_only {
        info!("Skipping fetch, analyzing {}", output.display());
    } else {
        if chatty {
            println!("📥 Fetching users, posts and comments...");
            println!("   Users: {}", config.endpoints.users_url);
            println!("   Posts: {}", config.endpoints.posts_url);
            println!("   Comments: {}", config.endpoints.comments_url);
        }

        let aggregated = fetch_and_join(config, args.strict).await?;

        if chatty {
            println!("💾 Saving {} users to {}", aggregated.len(), output.display());
        }
        report::write_aggregate(output, &aggregated).context("Failed to save joined data")?;
    }

    let stored = report::read_aggregate(output).context("Failed to read back joined data")?;
    let summary = analysis::summarize(&stored);
    let summary_report = SummaryReport::new(output, summary);

    let rendered = match args.format {
        OutputFormat::Text => format!("\n{}", report::generate_text_summary(&summary_report)),
        OutputFormat::Json => report::generate_json_summary(&summary_report)?,
    };
    println!("{}", rendered);

    info!("Completed in {:.2}s", start_time.elapsed().as_secs_f64());
    Ok(())
}

/// Fetch the three collections concurrently and join them.
async fn fetch_and_join(config: &Config, strict: bool) -> Result<Vec<AggregatedUser>> {
    let fetcher = Fetcher::new(&FetcherConfig::from(&config.http))?;
    let endpoints = Endpoints::from(&config.endpoints);

    let outcome = fetch::fetch_all(&fetcher, &endpoints, config.general.show_progress).await;
    let data = outcome.into_data().context("Failed to fetch source data")?;

    let anomalies = analysis::find_anomalies(&data.users, &data.posts, &data.comments);
    if !anomalies.is_empty() {
        warn!(
            "Join drops {} record(s): {} post(s) reference unknown users, {} comment(s) reference unknown posts",
            anomalies.len(),
            anomalies.orphan_posts.len(),
            anomalies.orphan_comments.len()
        );
        debug!("Orphan posts: {:?}", anomalies.orphan_posts);
        debug!("Orphan comments: {:?}", anomalies.orphan_comments);

        if strict {
            return Err(IntegrityError { anomalies }.into());
        }
    }

    let aggregated = analysis::aggregate(&data.users, &data.posts, &data.comments);
    info!(
        "Joined {} users, {} posts, {} comments",
        data.users.len(),
        data.posts.len(),
        data.comments.len()
    );

    Ok(aggregated)
}

/// Map the underlying error of a failed run to the process exit code.
fn exit_code(err: &anyhow::Error) -> i32 {
    if err.downcast_ref::<FetchError>().is_some() {
        EXIT_FETCH
    } else if err.downcast_ref::<StoreError>().is_some() {
        EXIT_STORE
    } else if err.downcast_ref::<IntegrityError>().is_some() {
        EXIT_INTEGRITY
    } else {
        EXIT_USAGE
    }
}
