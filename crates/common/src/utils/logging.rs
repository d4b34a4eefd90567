//! Process-wide tracing setup shared by the server and seed binaries.

use std::io;
use tracing_subscriber::{fmt, EnvFilter};

/// Directives used when `RUST_LOG` is unset. sqlx statement logs are noisy
/// at info, so they start at warn.
const DEFAULT_DIRECTIVES: &str = "info,tower_http=info,axum=info,sqlx=warn";
/// JSON output additionally surfaces the contact service's debug events.
const JSON_DIRECTIVES: &str = "info,service::contacts=debug,sqlx=warn";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    /// Single-line human readable output.
    Compact,
    /// One JSON object per event, for log shippers.
    Json,
}

impl LogFormat {
    /// `json` (any case) selects JSON; everything else, including unset, is compact.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Compact,
        }
    }

    fn default_directives(self) -> &'static str {
        match self {
            LogFormat::Compact => DEFAULT_DIRECTIVES,
            LogFormat::Json => JSON_DIRECTIVES,
        }
    }
}

fn env_filter(format: LogFormat) -> EnvFilter {
    // RUST_LOG always wins, e.g. RUST_LOG=info,service::contacts=trace
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(format.default_directives()))
}

/// Install the global subscriber writing to stdout.
///
/// Safe to call more than once: later calls are ignored, so a binary and
/// `server::run` can both initialize without coordinating.
pub fn init_logging(format: LogFormat) {
    let builder = fmt().with_env_filter(env_filter(format)).with_writer(io::stdout);
    let _ = match format {
        LogFormat::Compact => builder.with_target(false).compact().try_init(),
        LogFormat::Json => builder.with_target(true).json().try_init(),
    };
}

/// Pick the format from `LOG_FORMAT` and install it.
pub fn init_logging_from_env() {
    init_logging(LogFormat::parse(std::env::var("LOG_FORMAT").ok().as_deref()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_format_parsing() {
        assert_eq!(LogFormat::parse(Some("json")), LogFormat::Json);
        assert_eq!(LogFormat::parse(Some(" JSON ")), LogFormat::Json);
        assert_eq!(LogFormat::parse(Some("pretty")), LogFormat::Compact);
        assert_eq!(LogFormat::parse(None), LogFormat::Compact);
    }

    #[test]
    fn repeated_init_is_harmless() {
        init_logging(LogFormat::Compact);
        init_logging(LogFormat::Json);
        tracing::info!("still logging");
    }
}
