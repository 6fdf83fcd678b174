//! Telemetry - tracing subscriber setup
//!
//! `TigerStyle`: One initialization point, explicit configuration, no panics
//! on a second call.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use triage_engine::telemetry::{init_tracing, TelemetryConfig};
//!
//! init_tracing(&TelemetryConfig::default().with_level("debug")).expect("tracing init");
//! ```
//!
//! `RUST_LOG` takes precedence over the configured level when set.

use tracing_subscriber::EnvFilter;

/// Level used when neither `RUST_LOG` nor a level is given.
pub const LOG_LEVEL_DEFAULT: &str = "info";

/// Telemetry setup errors
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// The filter directive did not parse
    #[error("invalid log filter '{directive}': {reason}")]
    InvalidFilter {
        /// The rejected directive
        directive: String,
        /// Parser message
        reason: String,
    },

    /// A global subscriber is already installed
    #[error("tracing subscriber already initialized")]
    AlreadyInitialized,
}

/// Subscriber configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Filter directive used when `RUST_LOG` is unset (e.g. `info`,
    /// `triage_engine=debug`)
    pub level: String,

    /// Emit one JSON object per event instead of compact text
    pub json: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            level: LOG_LEVEL_DEFAULT.to_string(),
            json: false,
        }
    }
}

impl TelemetryConfig {
    /// Set the fallback filter directive.
    #[must_use]
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// Switch to JSON output.
    #[must_use]
    pub fn with_json(mut self) -> Self {
        self.json = true;
        self
    }

    /// Filter from `RUST_LOG`, falling back to `level`.
    ///
    /// # Errors
    /// `InvalidFilter` if `level` does not parse.
    pub fn env_filter(&self) -> Result<EnvFilter, TelemetryError> {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.level))
            .map_err(|e| TelemetryError::InvalidFilter {
                directive: self.level.clone(),
                reason: e.to_string(),
            })
    }
}

/// Install the global subscriber. Logs go to stderr.
///
/// # Errors
/// `InvalidFilter` for a bad directive, `AlreadyInitialized` if a global
/// subscriber exists.
pub fn init_tracing(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = config.env_filter()?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.compact().try_init()
    };

    installed.map_err(|_| TelemetryError::AlreadyInitialized)
}
