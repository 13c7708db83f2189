//! Logging setup.
//!
//! All components log through `tracing` macros with structured fields; this module
//! only installs the global subscriber.

use std::fmt;
use std::str::FromStr;
use std::sync::Once;

use tracing_subscriber::{fmt as layer_fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable multi-line output.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format {other:?} (expected pretty or json)")),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogFormat::Pretty => "pretty",
            LogFormat::Json => "json",
        })
    }
}

/// Installs the global `tracing` subscriber.
///
/// `RUST_LOG` takes precedence over `default_level`. Calls after the first are
/// no-ops, as is a call made when another global subscriber is already set.
pub fn init_logging(format: LogFormat, default_level: &str) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(default_level))
            .unwrap_or_else(|_| EnvFilter::new("info"));

        let registry = tracing_subscriber::registry().with(filter);
        let installed = match format {
            LogFormat::Json => registry.with(layer_fmt::layer().json()).try_init(),
            LogFormat::Pretty => registry.with(layer_fmt::layer().pretty()).try_init(),
        };
        if installed.is_err() {
            tracing::debug!("global subscriber already installed");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_parse_case_insensitively() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert!("xml".parse::<LogFormat>().is_err());
        assert_eq!(LogFormat::Json.to_string(), "json");
    }

    #[test]
    fn repeated_init_is_a_no_op() {
        init_logging(LogFormat::Pretty, "debug");
        init_logging(LogFormat::Json, "info");
    }
}
