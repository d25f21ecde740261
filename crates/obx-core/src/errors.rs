//! Structured error types shared across OBX crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload attached to every [`ObxError`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key value pairs (identifiers, paths, sizes, etc.).
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Optional hint that may help the caller resolve the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Creates a new error payload with the provided code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Adds a context entry to the payload.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Sets a human readable hint for remediation.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Canonical error type for the OBX experiment engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum ObxError {
    /// Invalid experiment configuration, detected before any task executes.
    #[error("configuration error: {0}")]
    Config(ErrorInfo),
    /// Function id not registered for the requested suite.
    #[error("unknown problem: {0}")]
    UnknownProblem(ErrorInfo),
    /// Suite-specific structural requirement on dimension violated.
    #[error("dimension constraint: {0}")]
    DimensionConstraint(ErrorInfo),
    /// Unrecognized content encountered while folding an output shard.
    #[error("merge format error: {0}")]
    MergeFormat(ErrorInfo),
    /// A task failed while executing inside a worker.
    #[error("worker failure: {0}")]
    Worker(ErrorInfo),
    /// Filesystem errors.
    #[error("io error: {0}")]
    Io(ErrorInfo),
    /// Serialization and schema errors.
    #[error("serde error: {0}")]
    Serde(ErrorInfo),
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)?;
        if !self.context.is_empty() {
            write!(f, " | context: [")?;
            for (idx, (key, value)) in self.context.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{key}={value}")?;
            }
            write!(f, "]")?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " | hint: {hint}")?;
        }
        Ok(())
    }
}

impl ObxError {
    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            ObxError::Config(info)
            | ObxError::UnknownProblem(info)
            | ObxError::DimensionConstraint(info)
            | ObxError::MergeFormat(info)
            | ObxError::Worker(info)
            | ObxError::Io(info)
            | ObxError::Serde(info) => info,
        }
    }

    /// Wraps a filesystem failure with a stable code and the offending path.
    pub fn io(code: &str, path: impl Display, err: impl ToString) -> Self {
        ObxError::Io(
            ErrorInfo::new(code, "filesystem operation failed")
                .with_context("path", path.to_string())
                .with_hint(err.to_string()),
        )
    }
}
