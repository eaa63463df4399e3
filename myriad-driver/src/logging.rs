//! Environment-driven logging setup.
//!
//! The driver logs through `tracing` and never installs a subscriber on its
//! own. Applications that want driver output either install their own
//! subscriber or call [`init`] with the `tracing-subscriber` feature enabled.
//!
//! # Environment Variables
//!
//! - `MYRIAD_DEBUG=true|1|yes` - Enable debug logging
//! - `MYRIAD_LOG_LEVEL=trace|debug|info|warn|error` - Set the level explicitly
//! - `MYRIAD_LOG_FORMAT=json|pretty|compact` - Output format (default: json)
//!
//! ```rust,no_run
//! use myriad_driver::logging;
//!
//! logging::init();
//! ```

use std::sync::Once;

use myriad_url::{EnvSource, StdEnvSource};

/// Enables debug logging.
pub const DEBUG_VAR: &str = "MYRIAD_DEBUG";
/// Selects the log level.
pub const LEVEL_VAR: &str = "MYRIAD_LOG_LEVEL";
/// Selects the output format.
pub const FORMAT_VAR: &str = "MYRIAD_LOG_FORMAT";

static INIT: Once = Once::new();

/// Output format of the installed subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
    Compact,
}

/// Logging settings read from the environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogSettings {
    /// `MYRIAD_DEBUG` is on.
    pub debug: bool,
    /// Explicit `MYRIAD_LOG_LEVEL`, if it named a known level.
    pub explicit_level: Option<&'static str>,
    /// Output format.
    pub format: LogFormat,
}

impl LogSettings {
    /// Read the settings from `env`.
    pub fn from_env(env: &dyn EnvSource) -> Self {
        let debug = env
            .get(DEBUG_VAR)
            .is_some_and(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"));

        let explicit_level = env.get(LEVEL_VAR).and_then(|level| {
            match level.to_lowercase().as_str() {
                "trace" => Some("trace"),
                "debug" => Some("debug"),
                "info" => Some("info"),
                "warn" => Some("warn"),
                "error" => Some("error"),
                _ => None,
            }
        });

        let format = match env.get(FORMAT_VAR).map(|f| f.to_lowercase()) {
            Some(f) if f == "pretty" => LogFormat::Pretty,
            Some(f) if f == "compact" => LogFormat::Compact,
            _ => LogFormat::Json,
        };

        Self {
            debug,
            explicit_level,
            format,
        }
    }

    /// Effective level: explicit, else `debug` when debugging, else `warn`.
    pub fn level(&self) -> &'static str {
        match self.explicit_level {
            Some(level) => level,
            None if self.debug => "debug",
            None => "warn",
        }
    }

    /// Check if the environment asked for any logging at all.
    pub fn requested(&self) -> bool {
        self.debug || self.explicit_level.is_some()
    }
}

/// Check if `MYRIAD_DEBUG` is enabled in the process environment.
#[inline]
pub fn is_debug_enabled() -> bool {
    LogSettings::from_env(&StdEnvSource).debug
}

/// Install a subscriber for the driver crates. Subsequent calls are no-ops.
///
/// Nothing is installed unless `MYRIAD_DEBUG` or `MYRIAD_LOG_LEVEL` is set,
/// or when the `tracing-subscriber` feature is off.
pub fn init() {
    INIT.call_once(|| {
        let settings = LogSettings::from_env(&StdEnvSource);
        if !settings.requested() {
            return;
        }

        #[cfg(feature = "tracing-subscriber")]
        {
            use tracing_subscriber::{EnvFilter, fmt, prelude::*};

            let level = settings.level();
            let filter = EnvFilter::try_new(format!(
                "myriad={},myriad_url={},myriad_driver={}",
                level, level, level
            ))
            .unwrap_or_else(|_| EnvFilter::new("warn"));

            let installed = match settings.format {
                LogFormat::Json => tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt::layer().json())
                    .try_init(),
                LogFormat::Compact => tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt::layer().compact())
                    .try_init(),
                LogFormat::Pretty => tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt::layer().pretty())
                    .try_init(),
            };

            if installed.is_ok() {
                tracing::info!(
                    level = level,
                    format = ?settings.format,
                    "Myriad logging initialized"
                );
            }
        }
    });
}

/// Debug log only when `MYRIAD_DEBUG` is enabled at runtime.
#[macro_export]
macro_rules! myriad_debug {
    ($($arg:tt)*) => {
        if $crate::logging::is_debug_enabled() {
            tracing::debug!($($arg)*);
        }
    };
}
