//! Browser engine boundary for the CRM export driver.
//!
//! Upper layers talk to a [`BrowserPage`]; [`ChromiumSession`] drives a real
//! Chromium over the DevTools Protocol and `fake::FakePage` (feature `fake`)
//! stands in for it in tests.

pub mod chromium;
pub mod config;
pub mod error;
#[cfg(any(test, feature = "fake"))]
pub mod fake;
pub mod page;
pub mod selector;

pub use chromium::ChromiumSession;
pub use config::{detect_chrome_executable, CdpConfig};
pub use error::{AdapterError, AdapterErrorKind};
pub use page::{first_css, BrowserPage, DomEvent, ElementRef};
pub use selector::{js_string, Selector};
