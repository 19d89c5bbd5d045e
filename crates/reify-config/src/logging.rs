use std::sync::Once;

use serde::{Deserialize, Serialize};
use tracing_subscriber::filter::{Directive, LevelFilter};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

static TRACING_INIT: Once = Once::new();

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// A level (`info`, `debug`, ...) or a full `EnvFilter` directive string.
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,

    /// Emit logs as JSON lines.
    #[serde(default)]
    pub json: bool,

    /// Write logs to stderr. When disabled, events are filtered but not printed.
    #[serde(default = "LoggingConfig::default_stderr")]
    pub stderr: bool,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_owned()
    }

    fn default_stderr() -> bool {
        true
    }

    /// The filter for the configured level, with every `RUST_LOG` directive layered on top.
    ///
    /// `RUST_LOG` wins for targets both name. Directives that do not parse are skipped rather
    /// than discarding the whole filter.
    pub fn env_filter(&self) -> EnvFilter {
        let mut filter = EnvFilter::builder()
            .with_default_directive(LevelFilter::INFO.into())
            .parse_lossy(self.directives());
        for directive in rust_log_directives() {
            filter = filter.add_directive(directive);
        }
        filter
    }

    /// `level` as filter directives; `warning` is accepted for `warn`.
    fn directives(&self) -> String {
        let level = self.level.trim();
        if level.is_empty() {
            Self::default_level()
        } else if level.eq_ignore_ascii_case("warning") {
            "warn".to_owned()
        } else {
            level.to_owned()
        }
    }
}

fn rust_log_directives() -> Vec<Directive> {
    let Ok(value) = std::env::var(EnvFilter::DEFAULT_ENV) else {
        return Vec::new();
    };
    value
        .split(',')
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .filter_map(|raw| raw.parse().ok())
        .collect()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
            json: false,
            stderr: Self::default_stderr(),
        }
    }
}

/// Install the global `tracing` subscriber.
///
/// Safe to call repeatedly; only the first call has an effect, and it silently yields to a
/// subscriber installed by the host.
pub fn init_tracing(config: &LoggingConfig) {
    TRACING_INIT.call_once(|| {
        let filter = config.env_filter();

        let writer = if !config.stderr {
            BoxMakeWriter::new(std::io::sink)
        } else if cfg!(debug_assertions) {
            // Lets `cargo test` capture output.
            BoxMakeWriter::new(tracing_subscriber::fmt::writer::TestWriter::with_stderr)
        } else {
            BoxMakeWriter::new(std::io::stderr)
        };

        let layer: Box<dyn tracing_subscriber::Layer<_> + Send + Sync> = if config.json {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(writer)
                .with_ansi(false)
                .boxed()
        } else {
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .boxed()
        };

        let subscriber = tracing_subscriber::registry().with(filter).with(layer);
        if tracing::subscriber::set_global_default(subscriber).is_ok() {
            tracing::debug!(
                target: "reify.config",
                level = %config.level,
                json = config.json,
                "installed tracing subscriber"
            );
        }
    });
}
