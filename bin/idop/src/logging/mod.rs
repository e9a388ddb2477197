use anyhow::Result;
use clap::Args;
use clap::ValueEnum;
use slog::Logger;

mod logger;

/// Enumerate valid log verbosity levels.
#[derive(Clone, Debug, ValueEnum)]
enum LogLevel {
    Critical,
    Error,
    Warning,
    Info,
    Debug,
    Trace,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Critical => write!(f, "critical"),
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
            Self::Debug => write!(f, "debug"),
            Self::Trace => write!(f, "trace"),
        }
    }
}

impl From<LogLevel> for slog::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Critical => slog::Level::Critical,
            LogLevel::Error => slog::Level::Error,
            LogLevel::Warning => slog::Level::Warning,
            LogLevel::Info => slog::Level::Info,
            LogLevel::Debug => slog::Level::Debug,
            LogLevel::Trace => slog::Level::Trace,
        }
    }
}

/// Logging-related options.
#[derive(Args, Debug)]
pub struct LogOpt {
    /// Emit JSON logs to this file instead of the terminal.
    #[arg(long = "log-file", name = "log-file", global = true, env = "IDOP_LOG_FILE")]
    file: Option<String>,

    /// Verbosity level for emitted logs.
    #[arg(
        long = "log-level", global = true, env = "IDOP_LOG_LEVEL",
        default_value_t = LogLevel::Info,
    )]
    level: LogLevel,
}

/// Initialise a logger based on the given CLI arguments.
pub fn configure(opt: &LogOpt) -> Result<Logger> {
    let level = opt.level.clone().into();
    match &opt.file {
        Some(file) => self::logger::file(file.clone(), level),
        None => Ok(self::logger::terminal(level)),
    }
}
