//! Error types for the SSMD engine.

use ssmd_config::ConfigError;

/// Error raised while resolving engine options.
///
/// Conversion and parsing never fail on malformed markup; only loading and
/// resolving options can fail.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SsmdError {
    /// Capability preset name is not known.
    #[error("Unknown preset '{name}'. Available: {available}")]
    UnknownPreset {
        /// Requested preset name.
        name: String,
        /// Comma-separated list of known presets.
        available: String,
    },
    /// Configuration file could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Platform table file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Platform table is not valid JSON.
    #[error("Platform table parse error: {0}")]
    PlatformTable(#[from] serde_json::Error),
    /// Option value is structurally valid but not usable.
    #[error("Invalid option: {0}")]
    InvalidOption(String),
}
