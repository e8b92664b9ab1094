// crates/wfpfix-core/src/error.rs

use serde::Serialize;
use thiserror::Error;

/// Why a target profile was left with its original timestamps.
///
/// Every variant is local to one profile; none of them abort processing of
/// sibling profiles or other files.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CorrectionError {
    #[error("reference source yielded no time-value tuples, can not adjust sample times")]
    NoReferenceData,

    #[error("found {matches} matching reference values, need at least two to derive a sample interval")]
    NoMatchFound { matches: usize },

    #[error("interpolation model underdetermined: {reason}")]
    ModelUnderdetermined { reason: String },

    #[error("no reference profile covers target profile spanning {start} to {end}")]
    ProfileUnresolved { start: String, end: String },

    #[error("reference stream interrupted after {collected} tuples: {message}")]
    ReferenceInterrupted { collected: usize, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Error,
}

impl CorrectionError {
    pub fn severity(&self) -> Severity {
        match self {
            CorrectionError::ModelUnderdetermined { .. } => Severity::Error,
            _ => Severity::Warning,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid config value for {field}: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
}
