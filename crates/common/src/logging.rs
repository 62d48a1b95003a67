//! `tracing` setup shared by the command-line tools.
//!
//! Level and format come from CLI flags first, then from the
//! `ASYNCIFY_LOG_LEVEL` / `ASYNCIFY_LOG_FORMAT` environment variables.
//! `RUST_LOG` still wins over both when it parses as a filter.

use std::env;
use std::fmt;

pub const LOG_LEVEL_ENV: &str = "ASYNCIFY_LOG_LEVEL";
pub const LOG_FORMAT_ENV: &str = "ASYNCIFY_LOG_FORMAT";

/// Output format for log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    pub fn parse(spec: &str) -> Option<Self> {
        match spec.to_ascii_lowercase().as_str() {
            "text" | "plain" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogFormat::Text => "text",
            LogFormat::Json => "json",
        })
    }
}

/// Logging verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn parse(spec: &str) -> Option<Self> {
        match spec.to_ascii_lowercase().as_str() {
            "error" | "err" => Some(Self::Error),
            "warn" | "warning" => Some(Self::Warn),
            "info" => Some(Self::Info),
            "debug" => Some(Self::Debug),
            "trace" | "verbose" => Some(Self::Trace),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogOptions {
    pub format: LogFormat,
    pub level: LogLevel,
}

impl LogOptions {
    pub const DEFAULT: Self = Self {
        format: LogFormat::Text,
        level: LogLevel::Warn,
    };

    /// Environment settings with CLI values layered on top.
    #[must_use]
    pub fn resolve(level: Option<&str>, format: Option<&str>) -> Self {
        let env_level = env::var(LOG_LEVEL_ENV).ok();
        let env_format = env::var(LOG_FORMAT_ENV).ok();
        let base = apply_overrides(Self::DEFAULT, env_level.as_deref(), env_format.as_deref());
        apply_overrides(base, level, format)
    }
}

impl Default for LogOptions {
    fn default() -> Self {
        Self::DEFAULT
    }
}

fn apply_overrides(mut options: LogOptions, level: Option<&str>, format: Option<&str>) -> LogOptions {
    if let Some(spec) = level.and_then(LogLevel::parse) {
        options.level = spec;
    }
    if let Some(spec) = format.and_then(LogFormat::parse) {
        options.format = spec;
    }
    options
}

/// Installs the global subscriber once; later calls are no-ops.
pub fn init_logging(options: &LogOptions) {
    use std::io::IsTerminal;
    use std::sync::OnceLock;
    use tracing_subscriber::EnvFilter;

    static INITIALISED: OnceLock<()> = OnceLock::new();

    INITIALISED.get_or_init(|| {
        let use_ansi = env::var_os("NO_COLOR").is_none() && std::io::stderr().is_terminal();
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(options.level.to_string()));
        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(use_ansi)
            .with_writer(std::io::stderr)
            .with_target(true);

        let _ = match options.format {
            LogFormat::Json => {
                tracing::subscriber::set_global_default(builder.json().finish())
            }
            LogFormat::Text => {
                tracing::subscriber::set_global_default(builder.compact().finish())
            }
        };
    });
}
