use std::{
    fs,
    path::{Path, PathBuf},
    time::{Duration, SystemTime},
};

use anyhow::{Context, Result, anyhow};
use tracing::Span;
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{RollingFileAppender, Rotation},
};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, Layer, filter::LevelFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};
use uuid::Uuid;

use crate::{
    config::{LoggingConfig, LoggingRotation},
    method::MethodId,
};

pub const LOG_FILE_PREFIX: &str = "cbm-concepts.log";

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Flushes the JSON log file until dropped. Also owns the id of the run.
pub struct LoggingGuard {
    _worker_guard: WorkerGuard,
    run_id: String,
}

impl LoggingGuard {
    pub fn run_id(&self) -> &str {
        &self.run_id
    }
}

/// Installs the global subscriber: JSON lines into a rotating file under
/// `logging.dir`, WARN and above on stderr when enabled.
///
/// `logging.dir` is used as given; [`crate::config::Config::load`] has
/// already resolved it against the config file's directory.
pub fn init_tracing(logging_config: &LoggingConfig) -> Result<LoggingGuard> {
    let filter = build_env_filter(&logging_config.filter)?;
    let log_dir = logging_config.dir.as_path();
    if log_dir.as_os_str().is_empty() {
        return Err(anyhow!("logging.dir cannot be empty"));
    }
    fs::create_dir_all(log_dir)
        .with_context(|| format!("failed to create log directory {}", log_dir.display()))?;

    let retention = RetentionPolicy::from_days(LOG_FILE_PREFIX, logging_config.retention_days);
    let purge = retention.purge(log_dir, SystemTime::now());

    let (writer, worker_guard) =
        tracing_appender::non_blocking(open_log_file(log_dir, &logging_config.rotation)?);
    let json_file = fmt::layer()
        .json()
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_current_span(true)
        .with_span_list(true)
        .with_ansi(false)
        .with_writer(writer)
        .with_filter(filter);
    let stderr_warnings = logging_config.stderr_warn_enabled.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_filter(LevelFilter::WARN)
    });

    tracing_subscriber::registry()
        .with(ErrorLayer::default())
        .with(json_file)
        .with(stderr_warnings)
        .try_init()
        .context("a global tracing subscriber is already installed")?;

    let run_id = Uuid::now_v7().to_string();
    tracing::info!(
        target: "logging",
        run_id = %run_id,
        dir = %log_dir.display(),
        filter = %logging_config.filter,
        rotation = ?logging_config.rotation,
        retention_days = logging_config.retention_days,
        expired_removed = purge.removed.len(),
        "logging_initialized"
    );
    // Retention runs before the subscriber exists, so its problems are
    // reported once logging is up.
    for warning in &purge.warnings {
        tracing::warn!(target: "logging", warning = %warning, "log_retention_failed");
    }

    Ok(LoggingGuard {
        _worker_guard: worker_guard,
        run_id,
    })
}

/// Root span of one generation run; request spans nest under it.
pub fn run_span(run_id: &str, dataset: &str, method: MethodId) -> Span {
    tracing::info_span!(
        target: "pipeline",
        "concept_run",
        run_id = %run_id,
        dataset = %dataset,
        method = %method,
    )
}

fn build_env_filter(directives: &str) -> Result<EnvFilter> {
    if directives.trim().is_empty() {
        return Err(anyhow!("logging.filter cannot be empty"));
    }
    EnvFilter::try_new(directives)
        .with_context(|| format!("invalid logging.filter '{directives}'"))
}

fn rotation_for(rotation: &LoggingRotation) -> Rotation {
    match rotation {
        LoggingRotation::Daily => Rotation::DAILY,
        LoggingRotation::Hourly => Rotation::HOURLY,
    }
}

fn open_log_file(log_dir: &Path, rotation: &LoggingRotation) -> Result<RollingFileAppender> {
    RollingFileAppender::builder()
        .rotation(rotation_for(rotation))
        .filename_prefix(LOG_FILE_PREFIX)
        .build(log_dir)
        .with_context(|| format!("failed to open log file in {}", log_dir.display()))
}

/// Age-based cleanup of rotated log files sharing one prefix.
#[derive(Debug, Clone)]
pub struct RetentionPolicy {
    prefix: &'static str,
    max_age: Duration,
}

#[derive(Debug, Default)]
pub struct PurgeReport {
    pub removed: Vec<PathBuf>,
    pub warnings: Vec<String>,
}

impl RetentionPolicy {
    pub fn from_days(prefix: &'static str, days: usize) -> Self {
        let days = u64::try_from(days).unwrap_or(u64::MAX);
        Self {
            prefix,
            max_age: Duration::from_secs(days.saturating_mul(SECONDS_PER_DAY)),
        }
    }

    /// Files modified in the future are never expired.
    pub fn is_expired(&self, modified: SystemTime, now: SystemTime) -> bool {
        now.duration_since(modified)
            .is_ok_and(|age| age >= self.max_age)
    }

    /// Deletes expired prefixed files in `dir`. Other files and
    /// subdirectories are left alone.
    pub fn purge(&self, dir: &Path, now: SystemTime) -> PurgeReport {
        let mut report = PurgeReport::default();
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) => {
                report
                    .warnings
                    .push(format!("cannot list {}: {err}", dir.display()));
                return report;
            }
        };

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    report
                        .warnings
                        .push(format!("cannot read entry in {}: {err}", dir.display()));
                    continue;
                }
            };
            if !entry.file_name().to_string_lossy().starts_with(self.prefix) {
                continue;
            }

            let path = entry.path();
            let modified = entry.metadata().and_then(|meta| {
                if meta.is_file() {
                    meta.modified().map(Some)
                } else {
                    Ok(None)
                }
            });
            match modified {
                Ok(Some(modified)) if self.is_expired(modified, now) => {
                    match fs::remove_file(&path) {
                        Ok(()) => report.removed.push(path),
                        Err(err) => report
                            .warnings
                            .push(format!("cannot remove {}: {err}", path.display())),
                    }
                }
                Ok(_) => {}
                Err(err) => report
                    .warnings
                    .push(format!("cannot stat {}: {err}", path.display())),
            }
        }

        report
    }
}
