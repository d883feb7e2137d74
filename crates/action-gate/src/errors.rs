//! Error types for filter application

use action_locator::LocatorError;
use cdp_adapter::AdapterError;
use thiserror::Error;

/// Filter application error enumeration
#[derive(Debug, Error, Clone)]
pub enum GateError {
    /// The filter input or a dialog control could not be resolved or clicked
    #[error("Filter control unavailable: {0}")]
    Locator(#[from] LocatorError),

    /// The value read back never matched what was applied
    #[error("Filter '{field}' did not stick: expected {expected:?}, found {actual:?}")]
    VerificationFailed {
        field: String,
        expected: String,
        actual: Option<String>,
    },

    /// A dialog field selected no input on the form
    #[error("Dialog field '{matcher}' matched no input")]
    FieldNotFound { matcher: String },

    /// Browser interaction on a resolved control failed
    #[error("Browser error on filter '{field}': {source}")]
    Adapter {
        field: String,
        #[source]
        source: AdapterError,
    },
}

impl GateError {
    pub(crate) fn adapter(field: &str) -> impl FnOnce(AdapterError) -> GateError + '_ {
        move |source| GateError::Adapter {
            field: field.to_string(),
            source,
        }
    }
}
