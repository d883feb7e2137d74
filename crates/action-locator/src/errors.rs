//! Error types for locator system

use cdp_adapter::AdapterError;
use thiserror::Error;

/// Locator error enumeration
#[derive(Debug, Error, Clone)]
pub enum LocatorError {
    /// No declared candidate resolved to a visible, enabled element
    #[error("Element not found for '{target}' (tried: {})", tried.join(", "))]
    NotFound { target: String, tried: Vec<String> },

    /// Interaction with a resolved element failed
    #[error("Browser error on '{target}': {source}")]
    Adapter {
        target: String,
        #[source]
        source: AdapterError,
    },
}

impl LocatorError {
    /// Name of the logical target the error refers to
    pub fn target(&self) -> &str {
        match self {
            LocatorError::NotFound { target, .. } | LocatorError::Adapter { target, .. } => target,
        }
    }
}
