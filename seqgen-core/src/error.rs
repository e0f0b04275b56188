//! Error types for the seqgen core library.
//!
//! Uses `thiserror` for public API error types with structured variants
//! covering override parsing, configuration resolution, and run-directory
//! preparation. All configuration errors are fatal and surfaced before any
//! run directory is touched.

use std::path::PathBuf;

/// Top-level error type for the seqgen core library.
#[derive(Debug, thiserror::Error)]
pub enum SeqgenError {
    #[error("Override error: {0}")]
    Override(#[from] OverrideError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] toml::ser::Error),
}

/// Errors from parsing CLI override tokens.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum OverrideError {
    #[error("Malformed override '{token}': expected key=value")]
    MissingDelimiter { token: String },

    #[error("Malformed override '{token}': unbalanced escape at end of token")]
    UnbalancedEscape { token: String },

    #[error("Malformed override '{token}': empty key")]
    EmptyKey { token: String },
}

/// Errors from configuration resolution and run-directory preparation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Unknown configuration key: {key}")]
    UnknownKey { key: String },

    #[error("Value '{value}' for key '{key}' is not a valid {expected}")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        value: String,
    },

    #[error("Unknown {category} preset: {name}")]
    UnknownPreset {
        category: &'static str,
        name: String,
    },

    #[error("Override '{key}' sweeps over multiple values; pass --multirun to run the sweep")]
    SweepWithoutMultirun { key: String },

    #[error("Default selector '{key}' cannot sweep over multiple values")]
    SweepOnSelector { key: String },

    #[error("Run directory already exists: {path}")]
    DirectoryCollision { path: PathBuf },

    #[error("Invalid configuration: {message}")]
    Extract { message: String },
}

/// A type alias for results using the top-level `SeqgenError`.
pub type Result<T> = std::result::Result<T, SeqgenError>;
