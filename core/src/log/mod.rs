//! Tracing setup for hosts embedding the desktop core.
//!
//! [`init`] installs a registry with a rolling file sink and a stderr sink. The first call
//! wins; later calls return the handle that is already installed.

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::SystemTime;

use anyhow::{Context, Result};
use tracing_appender::rolling::Rotation;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, filter::LevelFilter, util::SubscriberInitExt};

const FILTER_ENV_VARS: [&str; 2] = ["WEBDESK_LOG", "RUST_LOG"];

static LOG_HANDLE: OnceLock<LogHandle> = OnceLock::new();

pub use tracing_subscriber::filter::LevelFilter as LogLevel;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum LogRolling {
    Hourly,
    Daily,
    /// Single append-only file.
    Never,
}

impl From<LogRolling> for Rotation {
    fn from(rolling: LogRolling) -> Self {
        match rolling {
            LogRolling::Hourly => Rotation::HOURLY,
            LogRolling::Daily => Rotation::DAILY,
            LogRolling::Never => Rotation::NEVER,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub directory: PathBuf,
    /// Log files are named `<prefix>.<date>.log`.
    pub file_prefix: String,
    /// Rolled files kept on startup. `None` keeps everything.
    pub retention: Option<usize>,
    pub file_level: LevelFilter,
    pub console_level: LevelFilter,
    /// Forward `log` crate records into tracing.
    pub capture_log: bool,
    /// Explicit filter directive such as `webdesk_core=debug`. Falls back to the environment.
    pub env_filter: Option<String>,
    pub rolling: LogRolling,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            directory: default_log_directory(),
            file_prefix: "webdesk".to_string(),
            retention: Some(7),
            file_level: LevelFilter::DEBUG,
            console_level: if cfg!(debug_assertions) { LevelFilter::INFO } else { LevelFilter::WARN },
            capture_log: true,
            env_filter: None,
            rolling: LogRolling::Daily,
        }
    }
}

impl LogConfig {
    pub fn with_directory<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.directory = path.into();
        self
    }

    pub fn with_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.file_prefix = prefix.into();
        self
    }

    pub fn with_filter<S: Into<String>>(mut self, directive: S) -> Self {
        self.env_filter = Some(directive.into());
        self
    }

    /// Directive actually used: the explicit one, then `WEBDESK_LOG`, then `RUST_LOG`,
    /// then a build-dependent default.
    fn directive(&self) -> String {
        self.env_filter
            .clone()
            .or_else(|| FILTER_ENV_VARS.iter().find_map(|var| std::env::var(var).ok()))
            .filter(|directive| !directive.trim().is_empty())
            .unwrap_or_else(|| if cfg!(debug_assertions) { "debug" } else { "info" }.to_string())
    }
}

/// Keeps the non-blocking file writer alive.
#[derive(Debug)]
pub struct LogHandle {
    _guard: tracing_appender::non_blocking::WorkerGuard,
    directory: PathBuf,
    file_prefix: String,
}

impl LogHandle {
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn file_prefix(&self) -> &str {
        &self.file_prefix
    }
}

/// Install the global subscriber, or return the one installed earlier.
pub fn init(config: LogConfig) -> Result<&'static LogHandle> {
    if let Some(handle) = LOG_HANDLE.get() {
        return Ok(handle);
    }
    let handle = install(config)?;
    Ok(LOG_HANDLE.get_or_init(|| handle))
}

fn install(config: LogConfig) -> Result<LogHandle> {
    if config.capture_log {
        let max = config.file_level.max(config.console_level);
        let _ = tracing_log::LogTracer::builder().with_max_level(to_log_level(max)).init();
    }

    fs::create_dir_all(&config.directory)
        .with_context(|| format!("creating log directory at {}", config.directory.display()))?;
    if let Some(retention) = config.retention.filter(|keep| *keep > 0) {
        prune_old_logs(&config.directory, &config.file_prefix, retention)
            .context("pruning old log files")?;
    }

    let appender = tracing_appender::rolling::Builder::new()
        .rotation(config.rolling.into())
        .filename_prefix(&config.file_prefix)
        .filename_suffix("log")
        .build(&config.directory)
        .context("creating rolling log appender")?;
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_new(config.directive()).context("parsing log filter directive")?;

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(file_writer)
                .with_target(true)
                .with_filter(config.file_level),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_filter(config.console_level),
        )
        .try_init()
        .map_err(|err| anyhow::anyhow!(err))?;

    Ok(LogHandle { _guard: guard, directory: config.directory, file_prefix: config.file_prefix })
}

fn to_log_level(level: LevelFilter) -> log::LevelFilter {
    match level {
        LevelFilter::OFF => log::LevelFilter::Off,
        LevelFilter::ERROR => log::LevelFilter::Error,
        LevelFilter::WARN => log::LevelFilter::Warn,
        LevelFilter::INFO => log::LevelFilter::Info,
        LevelFilter::DEBUG => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    }
}

/// Delete the oldest `<prefix>*` files beyond `retention`.
fn prune_old_logs(dir: &Path, prefix: &str, retention: usize) -> Result<()> {
    let mut files: Vec<(PathBuf, SystemTime)> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().map(|kind| kind.is_file()).unwrap_or(false)
                && entry.path().file_name().and_then(OsStr::to_str).is_some_and(|name| name.starts_with(prefix))
        })
        .map(|entry| {
            let modified =
                entry.metadata().and_then(|meta| meta.modified()).unwrap_or(SystemTime::UNIX_EPOCH);
            (entry.path(), modified)
        })
        .collect();

    if files.len() <= retention {
        return Ok(());
    }
    files.sort_by_key(|(_, modified)| *modified);
    let excess = files.len() - retention;
    for (path, _) in files.into_iter().take(excess) {
        if let Err(err) = fs::remove_file(&path) {
            log::debug!("could not prune {}: {err}", path.display());
        }
    }
    Ok(())
}

fn default_log_directory() -> PathBuf {
    directories::ProjectDirs::from("com", "WebDesk", "webdesk")
        .map(|dirs| dirs.data_dir().join("logs"))
        .unwrap_or_else(|| std::env::temp_dir().join("webdesk-logs"))
}
