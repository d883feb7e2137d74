//! CRM report export driver.
//!
//! Logs into the CRM, walks to a report, applies its filters and requests the
//! Excel export, with every step resolved through declared selector fallbacks.

pub mod config;
pub mod errors;
pub mod login;
pub mod pipeline;
pub mod prepare;
pub mod session;

pub use config::{ConfigError, Credentials, RunConfig};
pub use errors::RunError;
pub use login::Login;
pub use pipeline::{ReportRunner, RunSummary};
pub use prepare::{prepare_page, TableProbe};
pub use session::{with_session, ChromiumLauncher, Launcher};
