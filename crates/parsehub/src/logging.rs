//! Log sinks for the tracker.
//!
//! Background watch tasks log through a [`Dispatch`] handed to the
//! tracker builder instead of process-wide logger state. [`log_sink`]
//! builds one from a verbosity level and any writer; without one the
//! tracker uses [`noop_sink`].

use std::fmt;
use std::str::FromStr;

use tracing::level_filters::LevelFilter;
use tracing::subscriber::NoSubscriber;
use tracing::Dispatch;
use tracing_subscriber::fmt::MakeWriter;

/// Verbosity of a log sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Everything, including per-request and per-poll detail.
    Debug,
    /// Problems worth attention: failed requests, handler errors.
    Warning,
    /// Only errors that end a watch.
    Fatal,
}

impl LogLevel {
    pub fn level_filter(self) -> LevelFilter {
        match self {
            Self::Debug => LevelFilter::DEBUG,
            Self::Warning => LevelFilter::WARN,
            Self::Fatal => LevelFilter::ERROR,
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "warning" | "warn" => Ok(Self::Warning),
            "fatal" | "error" => Ok(Self::Fatal),
            other => Err(format!("unknown log level: {other}")),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Debug => "debug",
            Self::Warning => "warning",
            Self::Fatal => "fatal",
        })
    }
}

/// Build a log sink that writes formatted events at or above `level` to
/// `writer`.
pub fn log_sink<W>(level: LogLevel, writer: W) -> Dispatch
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level.level_filter())
        .with_ansi(false)
        .with_writer(writer)
        .finish();
    Dispatch::new(subscriber)
}

/// A sink that discards everything.
pub fn noop_sink() -> Dispatch {
    Dispatch::new(NoSubscriber::default())
}
