//! Flow execution error types

use action_locator::LocatorError;
use thiserror::Error;

/// Flow execution errors
#[derive(Debug, Error, Clone)]
pub enum FlowError {
    /// A navigation step could not be resolved or clicked
    #[error("Navigation failed at step {step} ({target}): {source}")]
    NavigationFailed {
        step: usize,
        target: String,
        #[source]
        source: LocatorError,
    },

    /// The export trigger never resolved
    #[error("Export trigger not found: {source}")]
    TriggerNotFound {
        #[source]
        source: LocatorError,
    },

    /// The export trigger resolved but clicking it failed
    #[error("Export trigger click failed: {source}")]
    TriggerClickFailed {
        #[source]
        source: LocatorError,
    },

    /// Neither the primary confirmation control nor any fallback resolved
    #[error("Export confirmation not found (tried: {})", tried.join(", "))]
    ConfirmationNotFound { tried: Vec<String> },
}

/// Error returned once the retry budget is spent, wrapping the last failure
#[derive(Debug, Error, Clone)]
#[error("{label} failed after {attempts} attempt(s): {source}")]
pub struct ExhaustedRetries<E>
where
    E: std::error::Error + 'static,
{
    pub label: String,
    pub attempts: u32,
    #[source]
    pub source: E,
}
