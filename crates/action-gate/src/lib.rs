//! Filter gate: apply a value to a CRM filter control and verify it stuck.
//!
//! - [`FilterApplicator`] drives column filters typed into the grid header
//! - [`DialogFilterApplicator`] fills modal filter forms by input name
//! - [`value_matches`] is the case-insensitive comparison both rely on

pub mod conditions;
pub mod dialog;
pub mod errors;
pub mod filter;
pub mod types;

pub use conditions::*;
pub use dialog::*;
pub use errors::*;
pub use filter::*;
pub use types::*;
