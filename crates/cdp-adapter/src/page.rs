//! The browser engine boundary consumed by the interaction layers.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AdapterError;
use crate::selector::Selector;

/// Handle to the `index`-th match of `selector` in document order.
///
/// Handles are re-resolved on every use, so a handle stays meaningful across
/// re-renders as long as the DOM order of matches is stable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementRef {
    pub selector: Selector,
    pub index: usize,
}

impl ElementRef {
    pub fn new(selector: Selector, index: usize) -> Self {
        Self { selector, index }
    }
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} >> nth={}", self.selector, self.index)
    }
}

/// DOM events synthesized on inputs whose reactive bindings ignore raw value changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DomEvent {
    Input,
    Change,
    Blur,
}

impl DomEvent {
    pub fn name(&self) -> &'static str {
        match self {
            DomEvent::Input => "input",
            DomEvent::Change => "change",
            DomEvent::Blur => "blur",
        }
    }
}

/// One exclusively-owned browser page.
///
/// All calls are sequential; implementations never see two interactions in flight.
#[async_trait]
pub trait BrowserPage: Send + Sync {
    async fn navigate(&self, url: &str) -> Result<(), AdapterError>;

    /// Wait until the page stops loading, bounded by `timeout`.
    async fn wait_for_network_idle(&self, timeout: Duration) -> Result<(), AdapterError>;

    async fn query_all(&self, selector: &Selector) -> Result<Vec<ElementRef>, AdapterError>;

    /// Poll until the element is visible; `Ok(false)` once `timeout` elapses.
    async fn is_visible(&self, element: &ElementRef, timeout: Duration)
        -> Result<bool, AdapterError>;

    async fn is_enabled(&self, element: &ElementRef) -> Result<bool, AdapterError>;

    async fn attribute(
        &self,
        element: &ElementRef,
        name: &str,
    ) -> Result<Option<String>, AdapterError>;

    async fn click(&self, element: &ElementRef, timeout: Duration) -> Result<(), AdapterError>;

    /// Replace the element's value, as a user clearing the field and typing would.
    async fn fill(&self, element: &ElementRef, value: &str) -> Result<(), AdapterError>;

    async fn press(&self, element: &ElementRef, key: &str) -> Result<(), AdapterError>;

    async fn input_value(&self, element: &ElementRef) -> Result<Option<String>, AdapterError>;

    async fn dispatch_event(&self, element: &ElementRef, event: DomEvent)
        -> Result<(), AdapterError>;

    /// Click an empty area of the document to flush pending blur handlers.
    async fn click_body(&self) -> Result<(), AdapterError>;

    async fn evaluate(&self, script: &str) -> Result<Value, AdapterError>;

    /// PNG bytes of the current viewport.
    async fn screenshot(&self) -> Result<Vec<u8>, AdapterError>;

    /// Release the browser; called exactly once per session.
    async fn close(&self) -> Result<(), AdapterError>;
}

/// Resolve the first match of a CSS selector, failing with `TargetNotFound`.
pub async fn first_css(page: &dyn BrowserPage, css: &str) -> Result<ElementRef, AdapterError> {
    page.query_all(&Selector::css(css))
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| AdapterError::not_found(css.to_string()))
}
