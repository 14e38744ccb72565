//! Logging setup
//!
//! The interactive view owns the terminal, so log records never go to the
//! terminal unless asked for. They go to a file when one is configured, to
//! stderr when `RUST_LOG` is set (or stderr is explicitly allowed), and
//! nowhere otherwise.

use crate::config::LoggingConfig;
use anyhow::Result;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Where log records are written
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    /// Append to a file
    File(PathBuf),
    /// Write to standard error
    Stderr,
    /// No subscriber is installed
    Disabled,
}

/// Chooses the log destination
///
/// # Arguments
///
/// * `config` - Logging section of the configuration file
/// * `file_override` - File given on the command line, takes precedence
/// * `allow_stderr` - Whether stderr may be used without `RUST_LOG`
/// * `rust_log_set` - Whether `RUST_LOG` is present in the environment
pub fn resolve_target(
    config: &LoggingConfig,
    file_override: Option<&Path>,
    allow_stderr: bool,
    rust_log_set: bool,
) -> LogTarget {
    if let Some(path) = file_override.or(config.file_path.as_deref()) {
        return LogTarget::File(path.to_path_buf());
    }
    if rust_log_set || allow_stderr {
        return LogTarget::Stderr;
    }
    LogTarget::Disabled
}

/// Initialize logging based on configuration
///
/// # Arguments
///
/// * `config` - Logging configuration
/// * `file_override` - Log file from `--log-file`, if any
/// * `allow_stderr` - Log to stderr even without `RUST_LOG`
///
/// # Errors
///
/// Returns an error if the filter is invalid, the log file cannot be opened,
/// or a global subscriber is already installed
pub fn init_logging(
    config: &LoggingConfig,
    file_override: Option<&Path>,
    allow_stderr: bool,
) -> Result<()> {
    let target = resolve_target(
        config,
        file_override,
        allow_stderr,
        std::env::var_os("RUST_LOG").is_some(),
    );

    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.level))?;
    let registry = tracing_subscriber::registry().with(env_filter);

    match target {
        LogTarget::Disabled => {}
        LogTarget::Stderr => {
            let stderr_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_level(true);
            registry.with(stderr_layer).try_init()?;
        }
        LogTarget::File(path) => {
            let file = OpenOptions::new().create(true).append(true).open(&path)?;

            if config.json_format {
                let file_layer = fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_writer(Arc::new(file));
                registry.with(file_layer).try_init()?;
            } else {
                let file_layer = fmt::layer()
                    .with_ansi(false)
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_level(true)
                    .with_writer(Arc::new(file));
                registry.with(file_layer).try_init()?;
            }
        }
    }

    Ok(())
}
