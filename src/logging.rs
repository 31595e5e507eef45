//! Process-wide logger initialization for the enclosing application.
//!
//! Configuration comes from the environment: `LOG_LEVEL` selects the
//! threshold (`DEBUG`, `INFO`, `WARNING`, `ERROR`, `FATAL`; default `INFO`)
//! and `LOG_FILE` optionally redirects output from standard out to a file.
//! An unopenable log file is a fatal initialization error and must stop
//! the application.
//!
//! Records are formatted as
//! `YYYY-MM-DD HH:MM:SS.mmm [LEVEL] target: message | structured-data`.

use std::{
    env, fmt,
    fmt::Write as _,
    fs::OpenOptions,
    io,
    io::Write as _,
    path::PathBuf,
    str::FromStr,
    sync::{Arc, Mutex},
};

use thiserror::Error;
use tracing::{
    Event, Level, Subscriber,
    field::{Field, Visit},
    level_filters::LevelFilter,
};
use tracing_subscriber::{
    fmt::{FmtContext, FormatEvent, FormatFields, format::Writer},
    registry::LookupSpan,
};

/// Threshold levels recognized in `LOG_LEVEL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warning,
    Error,
    Fatal,
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARNING" => Ok(LogLevel::Warning),
            "ERROR" => Ok(LogLevel::Error),
            "FATAL" => Ok(LogLevel::Fatal),
            other => Err(format!("unknown log level `{other}`")),
        }
    }
}

impl LogLevel {
    fn level_filter(self) -> LevelFilter {
        match self {
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warning => LevelFilter::WARN,
            // Tracing has no FATAL; both map to ERROR.
            LogLevel::Error | LogLevel::Fatal => LevelFilter::ERROR,
        }
    }
}

/// Logger configuration, normally read from the environment.
#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    pub level: LogLevel,
    pub file: Option<PathBuf>,
}

impl LogConfig {
    /// Read `LOG_LEVEL` and `LOG_FILE`. An unrecognized level falls back to
    /// the default; a set but empty `LOG_FILE` counts as unset.
    pub fn from_env() -> LogConfig {
        let level = env::var("LOG_LEVEL")
            .ok()
            .and_then(|raw| LogLevel::from_str(&raw).ok())
            .unwrap_or_default();
        let file = env::var("LOG_FILE")
            .ok()
            .filter(|raw| !raw.is_empty())
            .map(PathBuf::from);
        LogConfig { level, file }
    }
}

/// Fatal logger initialization failures.
#[derive(Error, Debug)]
pub enum LogInitError {
    /// `LOG_FILE` could not be opened for appending.
    #[error("logging init: cannot open log file `{path}`")]
    File {
        path: String,
        #[source]
        source: io::Error,
    },

    /// Another global subscriber was installed first.
    #[error("logging init: a global subscriber is already installed")]
    AlreadyInitialized,
}

fn level_label(level: Level) -> &'static str {
    match level {
        Level::TRACE | Level::DEBUG => "DEBUG",
        Level::INFO => "INFO",
        Level::WARN => "WARNING",
        _ => "ERROR",
    }
}

#[derive(Default)]
struct RecordVisitor {
    message: String,
    fields: Vec<String>,
}

impl Visit for RecordVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.fields.push(format!("{}={:?}", field.name(), value));
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.push(format!("{}={value}", field.name()));
        }
    }
}

/// Emits the fixed record format documented at the module level.
struct RecordFormat;

impl<S, N> FormatEvent<S, N> for RecordFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        let level = level_label(*event.metadata().level());

        let mut visitor = RecordVisitor::default();
        event.record(&mut visitor);

        write!(
            writer,
            "{timestamp} [{level}] {}: {}",
            event.metadata().target(),
            visitor.message
        )?;
        if !visitor.fields.is_empty() {
            write!(writer, " | {}", visitor.fields.join(" "))?;
        }
        writeln!(writer)
    }
}

#[derive(Clone)]
struct FileWriter(Arc<Mutex<std::fs::File>>);

impl io::Write for FileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.0.lock() {
            Ok(mut file) => file.write(buf),
            Err(_) => Err(io::Error::other("log file lock poisoned")),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.0.lock() {
            Ok(mut file) => file.flush(),
            Err(_) => Err(io::Error::other("log file lock poisoned")),
        }
    }
}

/// Install the global subscriber for `config`. Call once at startup; a bad
/// log file or a pre-existing subscriber is an error that should stop the
/// application.
pub fn init(config: &LogConfig) -> Result<(), LogInitError> {
    let builder = tracing_subscriber::fmt()
        .event_format(RecordFormat)
        .with_max_level(config.level.level_filter());

    match &config.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| LogInitError::File {
                    path: path.display().to_string(),
                    source: e,
                })?;
            let writer = FileWriter(Arc::new(Mutex::new(file)));
            builder
                .with_writer(move || writer.clone())
                .try_init()
                .map_err(|_| LogInitError::AlreadyInitialized)
        }
        None => builder
            .try_init()
            .map_err(|_| LogInitError::AlreadyInitialized),
    }
}

/// [`init`] with configuration read from the environment.
pub fn init_from_env() -> Result<(), LogInitError> {
    init(&LogConfig::from_env())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Level names parse case-insensitively; junk is rejected.
    #[test]
    fn test_level_parsing() {
        assert_eq!(LogLevel::from_str("debug").unwrap(), LogLevel::Debug);
        assert_eq!(LogLevel::from_str("WARNING").unwrap(), LogLevel::Warning);
        assert_eq!(LogLevel::from_str("Fatal").unwrap(), LogLevel::Fatal);
        assert!(LogLevel::from_str("verbose").is_err());
    }

    /// FATAL and ERROR share the strictest filter.
    #[test]
    fn test_level_filters() {
        assert_eq!(LogLevel::Fatal.level_filter(), LevelFilter::ERROR);
        assert_eq!(LogLevel::Error.level_filter(), LevelFilter::ERROR);
        assert_eq!(LogLevel::Debug.level_filter(), LevelFilter::DEBUG);
    }

    /// An unopenable log file fails initialization.
    #[test]
    fn test_bad_log_file_is_fatal() {
        let config = LogConfig {
            level: LogLevel::Info,
            file: Some(PathBuf::from("/nonexistent-dir-for-test/eisenkan.log")),
        };
        assert!(matches!(init(&config), Err(LogInitError::File { .. })));
    }
}
