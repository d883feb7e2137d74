//! Run-level errors and their process exit codes

use action_flow::{ExhaustedRetries, FlowError};
use action_gate::GateError;
use cdp_adapter::AdapterError;
use crm_recipes::RecError;
use l6_observe::ObserveError;
use thiserror::Error;

use crate::config::ConfigError;

pub const EXIT_FAILURE: i32 = 1;
pub const EXIT_INTERRUPTED: i32 = 130;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Browser launch failed: {0}")]
    Launch(#[source] AdapterError),

    #[error(transparent)]
    Login(#[from] ExhaustedRetries<AdapterError>),

    #[error(transparent)]
    Flow(#[from] FlowError),

    #[error(transparent)]
    Filter(#[from] GateError),

    #[error("Page preparation failed: {0}")]
    Adapter(#[from] AdapterError),

    #[error(transparent)]
    Recipe(#[from] RecError),

    #[error("Screenshot directory unavailable: {0}")]
    Observe(#[from] ObserveError),

    #[error("Interrupted")]
    Interrupted,
}

impl RunError {
    pub fn exit_code(&self) -> i32 {
        match self {
            RunError::Interrupted => EXIT_INTERRUPTED,
            _ => EXIT_FAILURE,
        }
    }

    /// Pipeline stage the error belongs to, used in the failure summary.
    pub fn stage(&self) -> &'static str {
        match self {
            RunError::Config(_) => "config",
            RunError::Launch(_) => "launch",
            RunError::Login(_) => "login",
            RunError::Flow(FlowError::NavigationFailed { .. }) => "navigation",
            RunError::Flow(_) => "export",
            RunError::Filter(_) => "filter",
            RunError::Adapter(_) => "prepare",
            RunError::Recipe(_) => "recipe",
            RunError::Observe(_) => "screenshots",
            RunError::Interrupted => "interrupted",
        }
    }
}
