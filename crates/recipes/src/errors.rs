use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecErrorKind {
    #[error("unknown recipe '{0}'")]
    NotFound(String),
    #[error("duplicate recipe id '{0}'")]
    Duplicate(String),
    #[error("invalid recipe '{id}': {reason}")]
    InvalidInput { id: String, reason: String },
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

#[derive(Debug, Error)]
#[error(transparent)]
pub struct RecError(pub RecErrorKind);

impl RecError {
    pub fn new(kind: RecErrorKind) -> Self {
        Self(kind)
    }

    pub fn kind(&self) -> &RecErrorKind {
        &self.0
    }

    pub fn invalid(id: &str, reason: impl Into<String>) -> Self {
        Self(RecErrorKind::InvalidInput {
            id: id.to_string(),
            reason: reason.into(),
        })
    }
}

impl From<RecErrorKind> for RecError {
    fn from(kind: RecErrorKind) -> Self {
        Self(kind)
    }
}
