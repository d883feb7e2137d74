//! Flow layer: retried operations, menu navigation and the export state machine.

pub mod errors;
pub mod export;
pub mod navigation;
pub mod retry;

pub use errors::{ExhaustedRetries, FlowError};
pub use export::{ExportMachine, ExportPlan, ExportState};
pub use navigation::{NavigationSequencer, NavigationStep, Reached};
pub use retry::{execute, RetryPolicy};
