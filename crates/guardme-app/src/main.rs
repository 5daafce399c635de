//! GuardME - content safety moderator backed by Gemini.
//!
//! Runs the HTTP server that hosts the moderator interface and JSON API.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use directories::ProjectDirs;
use guardme_core::{ClientConfig, ConfigError, ContentClassifier, GeminiClassifier};
use guardme_server::{AppState, Server, ServerConfig, DEFAULT_HOST, DEFAULT_PORT};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// GuardME - content safety moderator
#[derive(Parser, Debug)]
#[command(name = "guardme", version, about)]
struct Args {
    /// Host to bind the server to
    #[arg(long, default_value = DEFAULT_HOST)]
    host: String,

    /// Port to bind the server to
    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Gemini model to use (overrides GUARDME_MODEL)
    #[arg(long)]
    model: Option<String>,

    /// Base URL of the Gemini API (overrides GUARDME_BASE_URL)
    #[arg(long)]
    base_url: Option<String>,

    /// Request timeout in seconds (overrides GUARDME_TIMEOUT_SECS)
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// Get the logs directory path.
fn logs_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "guardme", "GuardME").map(|dirs| dirs.data_dir().join("logs"))
}

fn filter_directive(args: &Args) -> String {
    let log_level = if args.debug { "debug" } else { &args.log_level };
    format!("guardme={0},guardme_core={0},guardme_server={0},warn", log_level)
}

/// Initialize logging to the console and a daily rotated file.
fn init_logging(args: &Args) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(args)));

    if let Some(log_dir) = logs_dir() {
        if std::fs::create_dir_all(&log_dir).is_ok() {
            let file_appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .max_log_files(5)
                .filename_prefix("guardme")
                .filename_suffix("log")
                .build(&log_dir)
                .ok();

            if let Some(appender) = file_appender {
                let (non_blocking, guard) = tracing_appender::non_blocking(appender);

                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().with_writer(std::io::stdout))
                    .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
                    .init();

                tracing::info!("Logging to {:?}", log_dir);
                return Some(guard);
            }
        }
    }

    // Fallback: console logging only
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::warn!("File logging unavailable, using console only");
    None
}

/// Resolves the client config, letting command-line flags win over the environment.
fn client_config<F>(args: &Args, lookup: F) -> Result<ClientConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = ClientConfig::from_lookup(lookup)?;

    if let Some(model) = &args.model {
        config = config.with_model(model.clone());
    }
    if let Some(url) = &args.base_url {
        config = config.with_base_url(url.clone());
    }
    if let Some(secs) = args.timeout_secs {
        config = config.with_timeout(Duration::from_secs(secs));
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Keep the guard alive for the duration of the program
    let _log_guard = init_logging(&args);

    tracing::info!("Starting GuardME...");

    let config = client_config(&args, |name| std::env::var(name).ok())
        .context("classification service is not configured")?;
    tracing::info!(
        model = %config.model,
        timeout_secs = config.timeout.as_secs(),
        "Classification service configured"
    );

    let classifier: Arc<dyn ContentClassifier> = Arc::new(
        GeminiClassifier::new(config).context("failed to build classification client")?,
    );

    let server_config = ServerConfig::default()
        .with_host(args.host.clone())
        .with_port(args.port);
    let server = Server::new(server_config, AppState::with_classifier(classifier))?;
    tracing::info!("Open http://{} to use the moderator", server.addr());

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => tracing::info!("Interrupt received"),
    }

    tracing::info!("GuardME shutting down");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use guardme_core::config::DEFAULT_TIMEOUT;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("guardme").chain(argv.iter().copied())).unwrap()
    }

    fn env_with_key(name: &str) -> Option<String> {
        match name {
            "GEMINI_API_KEY" => Some("test-key".to_string()),
            "GUARDME_MODEL" => Some("env-model".to_string()),
            _ => None,
        }
    }

    #[test]
    fn test_default_args() {
        let args = parse(&[]);
        assert_eq!(args.host, DEFAULT_HOST);
        assert_eq!(args.port, DEFAULT_PORT);
        assert!(args.model.is_none());
        assert!(!args.debug);
        assert_eq!(args.log_level, "info");
    }

    #[test]
    fn test_flags_override_environment() {
        let args = parse(&[
            "--model",
            "cli-model",
            "--base-url",
            "http://localhost:9999/",
            "--timeout-secs",
            "5",
        ]);
        let config = client_config(&args, env_with_key).unwrap();

        assert_eq!(config.api_key, "test-key");
        assert_eq!(config.model, "cli-model");
        assert_eq!(config.base_url, "http://localhost:9999");
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_environment_used_without_flags() {
        let config = client_config(&parse(&[]), env_with_key).unwrap();
        assert_eq!(config.model, "env-model");
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_missing_key_fails() {
        let result = client_config(&parse(&["--model", "cli-model"]), |_| None);
        assert!(matches!(result, Err(ConfigError::MissingApiKey)));
    }

    #[test]
    fn test_debug_flag_raises_level() {
        let args = parse(&["--debug", "--log-level", "warn"]);
        assert!(filter_directive(&args).starts_with("guardme=debug"));

        let args = parse(&["--log-level", "trace"]);
        assert!(filter_directive(&args).contains("guardme_core=trace"));
    }
}
