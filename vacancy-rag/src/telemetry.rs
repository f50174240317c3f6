//! Logging setup for binaries and tools embedding the crate.
//!
//! The library itself only emits `tracing` events; nothing is printed unless
//! the host installs a subscriber. [`init_logging`] installs a compact `fmt`
//! subscriber with per-module levels. `RUST_LOG` takes precedence:
//!
//! ```bash
//! RUST_LOG=vacancy_rag=debug my-indexer
//! RUST_LOG=vacancy_rag::search=trace,warn my-server
//! ```

use std::collections::HashMap;
use std::sync::Once;

use serde::{Deserialize, Serialize};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

static INIT: Once = Once::new();

/// Default level plus per-module overrides.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Level for everything not listed in `modules`, e.g. `"warn"`.
    pub default: String,
    /// Module path to level, e.g. `"vacancy_rag::index" => "info"`.
    pub modules: HashMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { default: "warn".to_string(), modules: HashMap::new() }
    }
}

impl LoggingConfig {
    pub fn with_module(mut self, module: impl Into<String>, level: impl Into<String>) -> Self {
        self.modules.insert(module.into(), level.into());
        self
    }

    /// The `EnvFilter` directive string for this config.
    pub fn directives(&self) -> String {
        let mut modules: Vec<_> = self.modules.iter().collect();
        modules.sort();
        modules.into_iter().fold(self.default.clone(), |mut acc, (module, level)| {
            acc.push_str(&format!(",{module}={level}"));
            acc
        })
    }
}

/// Install the global subscriber.
///
/// Only the first call takes effect. If another subscriber is already
/// installed, this is a no-op.
pub fn init_logging(config: &LoggingConfig) {
    INIT.call_once(|| {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            EnvFilter::new(config.directives())
        };

        let fmt_layer =
            tracing_subscriber::fmt::layer().with_target(true).with_level(true).with_filter(filter);

        if tracing_subscriber::registry().with(fmt_layer).try_init().is_err() {
            tracing::debug!("a global subscriber is already installed");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directives_list_modules_after_default() {
        let config = LoggingConfig::default()
            .with_module("vacancy_rag::search", "debug")
            .with_module("vacancy_rag::index", "info");
        assert_eq!(config.directives(), "warn,vacancy_rag::index=info,vacancy_rag::search=debug");
    }

    #[test]
    fn init_twice_is_harmless() {
        init_logging(&LoggingConfig::default());
        init_logging(&LoggingConfig::default().with_module("vacancy_rag", "trace"));
    }
}
