//! Routes the crate's `log` records into a host application's logging.

use std::sync::{Arc, OnceLock};

/// Receives the crate's log records in a host application.
///
/// Implement this in the host (Swift, Kotlin, or Rust) and hand it to [`set_logger`] to
/// route passcode generation and verification logs into the host's own logging.
///
/// # Examples
///
/// ```rust
/// use passcode_core::logger::{Logger, LogLevel};
///
/// struct StderrLogger;
///
/// impl Logger for StderrLogger {
///     fn log(&self, level: LogLevel, message: String) {
///         eprintln!("[{level:?}] {message}");
///     }
/// }
/// ```
///
/// ## Swift
///
/// ```swift
/// final class PasscodeLoggerBridge: PasscodeCore.Logger {
///     func log(level: PasscodeCore.LogLevel, message: String) {
///         print("[passcode] \(level): \(message)")
///     }
/// }
///
/// PasscodeCore.setLogger(logger: PasscodeLoggerBridge()) // once, at launch
/// ```
#[uniffi::export(with_foreign)]
pub trait Logger: Sync + Send {
    /// Logs a message at the specified log level.
    ///
    /// # Arguments
    ///
    /// * `level` - The severity level of the log message.
    /// * `message` - The log message to be recorded.
    fn log(&self, level: LogLevel, message: String);
}

/// Severity of a log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum LogLevel {
    /// Very detailed tracing.
    Trace,
    /// Debugging information, such as superseded requests.
    Debug,
    /// Normal progress, such as a generated passcode.
    Info,
    /// Failed authority calls.
    Warn,
    /// Errors.
    Error,
}

/// Forwards `log` records to the installed [`Logger`].
///
/// This struct implements the `log::Log` trait and integrates with the Rust `log` crate.
struct ForeignLogger;

impl log::Log for ForeignLogger {
    fn enabled(&self, _metadata: &log::Metadata) -> bool {
        true
    }

    /// Forwards the record to the host's logger if one is installed.
    ///
    /// # Arguments
    ///
    /// * `record` - The log record containing the message and metadata.
    fn log(&self, record: &log::Record) {
        if !should_forward(record.level(), record.module_path()) {
            return;
        }

        if let Some(logger) = LOGGER_INSTANCE.get() {
            logger.log(log_level(record.level()), format!("{}", record.args()));
        } else {
            eprintln!("Logger not set: {}", record.args());
        }
    }

    fn flush(&self) {}
}

/// Debug and trace records are only forwarded when they come from this crate.
fn should_forward(level: log::Level, module_path: Option<&str>) -> bool {
    let is_debug_or_trace = level == log::Level::Debug || level == log::Level::Trace;
    let is_from_passcode =
        module_path.is_some_and(|module_path| module_path.starts_with("passcode"));
    !is_debug_or_trace || is_from_passcode
}

/// Converts a `log::Level` to a `LogLevel`.
const fn log_level(level: log::Level) -> LogLevel {
    match level {
        log::Level::Error => LogLevel::Error,
        log::Level::Warn => LogLevel::Warn,
        log::Level::Info => LogLevel::Info,
        log::Level::Debug => LogLevel::Debug,
        log::Level::Trace => LogLevel::Trace,
    }
}

/// The logger installed by the host, read by `ForeignLogger` for every record.
static LOGGER_INSTANCE: OnceLock<Arc<dyn Logger>> = OnceLock::new();

/// Installs `logger` as the destination for this crate's logs.
///
/// Call this once, before any generation or verification runs.
///
/// # Arguments
///
/// * `logger` - An `Arc` containing the host's logger implementation.
///
/// # Note
///
/// If a logger has already been set, this function prints a message and does nothing.
#[uniffi::export]
pub fn set_logger(logger: Arc<dyn Logger>) {
    if LOGGER_INSTANCE.set(logger).is_err() {
        eprintln!("Logger already set");
        return;
    }

    if let Err(e) = init_logger() {
        eprintln!("Failed to set logger: {e}");
    }
}

/// Registers `ForeignLogger` with the `log` crate and lets every level through.
///
/// # Errors
///
/// Returns a `log::SetLoggerError` if another logger was already registered.
fn init_logger() -> Result<(), log::SetLoggerError> {
    static LOGGER: ForeignLogger = ForeignLogger;
    log::set_logger(&LOGGER)?;
    log::set_max_level(log::LevelFilter::Trace);
    Ok(())
}
