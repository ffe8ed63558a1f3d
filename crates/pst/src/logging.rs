//! Forward the crate's lifecycle log lines to a host callback
//!
//! The crate logs through the `log` facade, tagging each line with the
//! handle it concerns (`[PST]`, `[EXPORT]`, or `[MEMORY]` for the in-memory
//! engine). A host that embeds the library without a `log` backend of its
//! own installs this one with [`init_logger`] and receives each line as a
//! [`LogEvent`], with the tag decoded into a [`Handle`] and record lines
//! carrying their index. Lines from other crates are not forwarded.

use std::sync::{Arc, OnceLock, RwLock};

use log::{Level, Log, Metadata, Record, SetLoggerError};

use crate::error::Handle;

/// Log level handed to a [`LogSink`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<Level> for LogLevel {
    fn from(level: Level) -> Self {
        match level {
            Level::Error => LogLevel::Error,
            Level::Warn => LogLevel::Warn,
            Level::Info => LogLevel::Info,
            Level::Debug => LogLevel::Debug,
            Level::Trace => LogLevel::Trace,
        }
    }
}

/// One forwarded line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    pub level: LogLevel,
    /// Handle kind the line concerns; `None` for engine-internal lines
    pub handle: Option<Handle>,
    /// Record index, for lines about a single record
    pub index: Option<usize>,
    /// Line text without its tag
    pub message: String,
}

impl LogEvent {
    fn parse(level: LogLevel, line: &str) -> Self {
        let (handle, message) = if let Some(rest) = line.strip_prefix("[PST] ") {
            (Some(Handle::Pst), rest)
        } else if let Some(rest) = line.strip_prefix("[EXPORT] ") {
            (Some(Handle::Export), rest)
        } else if let Some(rest) = line.strip_prefix("[MEMORY] ") {
            (None, rest)
        } else {
            (None, line)
        };

        let index = message
            .strip_prefix("Record ")
            .and_then(|rest| rest.split(' ').next())
            .and_then(|n| n.parse().ok());
        let handle = match (handle, index) {
            (Some(Handle::Pst), Some(_)) => Some(Handle::Record),
            (handle, _) => handle,
        };

        Self {
            level,
            handle,
            index,
            message: message.to_string(),
        }
    }
}

/// Receiver for forwarded log lines
pub trait LogSink: Send + Sync {
    fn on_log(&self, event: LogEvent);
}

static LOGGER: OnceLock<SinkLogger> = OnceLock::new();

struct SinkLogger {
    sink: RwLock<Option<Arc<dyn LogSink>>>,
    max_level: RwLock<Level>,
}

impl SinkLogger {
    fn new(max_level: Level) -> Self {
        Self {
            sink: RwLock::new(None),
            max_level: RwLock::new(max_level),
        }
    }

    fn set_sink(&self, sink: Option<Arc<dyn LogSink>>) {
        if let Ok(mut guard) = self.sink.write() {
            *guard = sink;
        }
    }

    fn set_max_level(&self, level: Level) {
        if let Ok(mut guard) = self.max_level.write() {
            *guard = level;
        }
    }

    fn max_level(&self) -> Level {
        self.max_level.read().map(|l| *l).unwrap_or(Level::Info)
    }
}

/// Whether `target` is a module of this crate
fn is_own_target(target: &str) -> bool {
    let krate = env!("CARGO_CRATE_NAME");
    target
        .strip_prefix(krate)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
}

impl Log for SinkLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.max_level()
            && is_own_target(metadata.target())
            && self.sink.read().ok().is_some_and(|s| s.is_some())
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        if let Ok(guard) = self.sink.read()
            && let Some(sink) = guard.as_ref()
        {
            let line = record.args().to_string();
            sink.on_log(LogEvent::parse(record.level().into(), &line));
        }
    }

    fn flush(&self) {}
}

/// Install the forwarding logger as the global `log` backend
///
/// Lines are dropped until a sink is set with [`set_log_sink`]. Fails if
/// another backend is already installed.
pub fn init_logger(max_level: Level) -> Result<(), SetLoggerError> {
    let logger = LOGGER.get_or_init(|| SinkLogger::new(max_level));
    log::set_logger(logger)?;
    log::set_max_level(max_level.to_level_filter());
    Ok(())
}

/// Replace the sink; `None` drops further lines
pub fn set_log_sink(sink: Option<Arc<dyn LogSink>>) {
    if let Some(logger) = LOGGER.get() {
        logger.set_sink(sink);
    }
}

pub fn set_log_level(level: Level) {
    if let Some(logger) = LOGGER.get() {
        logger.set_max_level(level);
        log::set_max_level(level.to_level_filter());
    }
}
