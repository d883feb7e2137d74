//! Locator strategy chain
//!
//! A [`LogicalTarget`] names a UI role and lists selector candidates in a
//! fixed order. The resolver probes each candidate and returns the first one
//! whose picked match is visible and enabled.

pub mod errors;
pub mod resolver;
pub mod strategies;
pub mod types;

pub use errors::*;
pub use resolver::*;
pub use strategies::*;
pub use types::*;
