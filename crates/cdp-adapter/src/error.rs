use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// High-level error categories surfaced by the adapter.
#[derive(Clone, Debug, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdapterErrorKind {
    #[error("navigation timed out")]
    NavTimeout,
    #[error("operation timed out")]
    Timeout,
    #[error("cdp i/o failure")]
    CdpIo,
    #[error("target element not found")]
    TargetNotFound,
    #[error("script evaluation failed")]
    Script,
    #[error("browser launch failed")]
    Launch,
    #[error("session closed")]
    Closed,
    #[error("internal error")]
    Internal,
}

/// Enriched error metadata passed back to higher layers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AdapterError {
    pub kind: AdapterErrorKind,
    pub hint: Option<String>,
    pub retriable: bool,
}

impl fmt::Display for AdapterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(hint) = &self.hint {
            write!(f, ": {}", hint)?;
        }
        Ok(())
    }
}

impl std::error::Error for AdapterError {}

impl AdapterError {
    pub fn new(kind: AdapterErrorKind) -> Self {
        let retriable = matches!(
            kind,
            AdapterErrorKind::NavTimeout | AdapterErrorKind::Timeout | AdapterErrorKind::CdpIo
        );
        Self {
            kind,
            hint: None,
            retriable,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn retriable(mut self, flag: bool) -> Self {
        self.retriable = flag;
        self
    }

    pub fn timeout(what: impl Into<String>) -> Self {
        Self::new(AdapterErrorKind::Timeout).with_hint(what)
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::new(AdapterErrorKind::TargetNotFound).with_hint(what)
    }

    pub fn cdp(err: impl fmt::Display) -> Self {
        Self::new(AdapterErrorKind::CdpIo).with_hint(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_hint() {
        let err = AdapterError::not_found("button[title*=\"Excel\"]");
        assert_eq!(
            err.to_string(),
            "target element not found: button[title*=\"Excel\"]"
        );
        assert!(!err.retriable);
    }

    #[test]
    fn timeouts_are_retriable_by_default() {
        assert!(AdapterError::timeout("click").retriable);
        assert!(AdapterError::new(AdapterErrorKind::CdpIo).retriable);
        assert!(!AdapterError::new(AdapterErrorKind::Launch).retriable);
    }
}
