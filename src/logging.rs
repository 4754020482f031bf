// src/logging.rs
// =============================================================================
// Logging setup for the binary.
//
// The library only uses the `log` macros (log::info!, log::warn!, ...).
// Nothing is printed until a logger is installed; the binary installs
// env_logger here, writing to stderr so stdout stays clean for reports.
//
// Level precedence: RUST_LOG is read first, then --log-level overrides it.
// =============================================================================

use clap::ValueEnum;
use log::LevelFilter;

/// Verbosity accepted by `--log-level`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogLevel {
    /// Only errors
    Error,
    /// Errors and warnings (unreadable files, corrupt caches)
    #[default]
    Warn,
    /// Plus progress messages
    Info,
    /// Plus per-file and cache-hit details
    Debug,
    /// Everything
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

// Installs the global logger
//
// Uses try_init so a second call (tests, embedding) is an error value
// instead of a panic.
pub fn init_logger(level: LogLevel) -> Result<(), log::SetLoggerError> {
    let level = LevelFilter::from(level);

    let mut builder = env_logger::Builder::from_default_env();
    builder.filter_level(level);
    builder.filter_module("reqwest", level.min(LevelFilter::Info));
    builder.filter_module("hyper", level.min(LevelFilter::Info));
    builder.filter_module("link_checker", level);
    builder.format_timestamp(None);

    builder.try_init()
}
