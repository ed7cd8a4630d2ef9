use std::path::PathBuf;

use thiserror::Error;

use crate::resource::ResourceKind;

/// Errors that make a dataset unusable. Any of these aborts a run.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The dataset file could not be read.
    #[error("failed to read dataset {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The dataset file is not valid JSON or does not match the expected shape.
    #[error("malformed dataset {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A spec is structurally valid JSON but semantically unusable.
    #[error("invalid {kind} '{key}': {reason}")]
    Invalid {
        kind: ResourceKind,
        key: String,
        reason: String,
    },

    /// Two specs of the same kind share a natural key.
    #[error("duplicate {kind} '{key}' in dataset")]
    Duplicate { kind: ResourceKind, key: String },
}

impl LoadError {
    pub(crate) fn invalid(
        kind: ResourceKind,
        key: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Invalid {
            kind,
            key: key.into(),
            reason: reason.into(),
        }
    }
}
