//! Process-wide log setup.
//!
//! Everything is routed through `tracing`; records emitted with the `log`
//! macros are bridged in by `tracing-log`. The filter comes from `RUST_LOG`
//! and defaults to `info`.

use std::str::FromStr;
use std::sync::OnceLock;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter};

static INITIALIZED: OnceLock<()> = OnceLock::new();

const DEFAULT_FILTER: &str = "info";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{}' (expected text or json)", other)),
        }
    }
}

/// Installs the global subscriber. Later calls are no-ops.
pub fn init(format: LogFormat) {
    INITIALIZED.get_or_init(|| {
        // Fails if a logger is already set, e.g. by a test harness.
        let _ = tracing_log::LogTracer::init();

        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

        let registry = tracing_subscriber::registry().with(filter);
        let result = match format {
            LogFormat::Text => tracing::subscriber::set_global_default(
                registry.with(fmt::layer().with_target(true)),
            ),
            LogFormat::Json => tracing::subscriber::set_global_default(
                registry.with(fmt::layer().json().with_current_span(true)),
            ),
        };

        if let Err(e) = result {
            eprintln!("Logging already initialized: {}", e);
        }
    });
}
