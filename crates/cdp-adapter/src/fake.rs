//! In-memory [`BrowserPage`] used by unit and pipeline tests.
//!
//! The fake holds a flat list of elements in document order. CSS and script
//! selectors match through explicit aliases declared on each element; text and
//! attribute selectors are evaluated against the element's fields.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{AdapterError, AdapterErrorKind};
use crate::page::{BrowserPage, DomEvent, ElementRef};
use crate::selector::Selector;

/// One element of the fake document.
#[derive(Debug, Clone)]
pub struct FakeElement {
    pub id: String,
    pub tag: String,
    pub text: String,
    pub attrs: BTreeMap<String, String>,
    pub aliases: Vec<String>,
    pub visible: bool,
    pub enabled: bool,
    pub value: Option<String>,
    /// Element ids made visible when this element is clicked.
    pub reveals: Vec<String>,
    /// Number of upcoming fills the page silently discards.
    pub dropped_fills: usize,
}

impl FakeElement {
    pub fn new(id: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tag: tag.into(),
            text: String::new(),
            attrs: BTreeMap::new(),
            aliases: Vec::new(),
            visible: true,
            enabled: true,
            value: None,
            reveals: Vec::new(),
            dropped_fills: 0,
        }
    }

    /// Text input with an empty value.
    pub fn input(id: impl Into<String>) -> Self {
        Self::new(id, "input").with_value("")
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    /// Declare that a CSS or script selector matches this element.
    pub fn matching(mut self, selector: impl Into<String>) -> Self {
        self.aliases.push(selector.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn reveals(mut self, id: impl Into<String>) -> Self {
        self.reveals.push(id.into());
        self
    }

    pub fn dropping_fills(mut self, count: usize) -> Self {
        self.dropped_fills = count;
        self
    }

    fn matches(&self, selector: &Selector) -> bool {
        match selector {
            Selector::Css { css } => css == &self.tag || self.aliases.iter().any(|a| a == css),
            Selector::Script { expression } => self.aliases.iter().any(|a| a == expression),
            Selector::Text { tag, text, exact } => {
                if tag.as_deref().is_some_and(|tag| tag != self.tag) {
                    return false;
                }
                let own = self.text.trim();
                if *exact {
                    own == text
                } else {
                    own.contains(text.as_str())
                }
            }
            Selector::AttributeContains {
                tag,
                attribute,
                needle,
            } => {
                if tag.as_deref().is_some_and(|tag| tag != self.tag) {
                    return false;
                }
                self.attrs
                    .get(attribute)
                    .map(|value| value.to_lowercase().contains(&needle.to_lowercase()))
                    .unwrap_or(false)
            }
        }
    }
}

/// Interactions recorded by the fake, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeAction {
    Navigate(String),
    WaitIdle,
    Click(String),
    Fill { id: String, value: String },
    Press { id: String, key: String },
    Dispatch { id: String, event: DomEvent },
    ClickBody,
    Evaluate(String),
    Screenshot,
    Close,
}

#[derive(Default)]
struct FakeState {
    elements: Vec<FakeElement>,
    actions: Vec<FakeAction>,
    eval_responses: Vec<(String, Value)>,
    failing_navigations: usize,
    failing_screenshots: bool,
    failing_clicks: Vec<String>,
    closed: usize,
}

/// Scriptable stand-in for a live browser page.
#[derive(Default)]
pub struct FakePage {
    state: Mutex<FakeState>,
}

impl FakePage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_elements(elements: impl IntoIterator<Item = FakeElement>) -> Self {
        let page = Self::new();
        for element in elements {
            page.add(element);
        }
        page
    }

    pub fn add(&self, element: FakeElement) {
        self.lock().elements.push(element);
    }

    /// Answer any evaluated script containing `needle` with `value`.
    pub fn respond_to_script(&self, needle: impl Into<String>, value: Value) {
        self.lock().eval_responses.push((needle.into(), value));
    }

    /// Make the next `count` navigations fail with a retriable timeout.
    pub fn fail_navigations(&self, count: usize) {
        self.lock().failing_navigations = count;
    }

    pub fn fail_screenshots(&self) {
        self.lock().failing_screenshots = true;
    }

    /// Clicks on `id` resolve the element but time out.
    pub fn fail_clicks_on(&self, id: impl Into<String>) {
        self.lock().failing_clicks.push(id.into());
    }

    pub fn actions(&self) -> Vec<FakeAction> {
        self.lock().actions.clone()
    }

    /// Ids of clicked elements, in order.
    pub fn clicks(&self) -> Vec<String> {
        self.actions()
            .into_iter()
            .filter_map(|action| match action {
                FakeAction::Click(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    pub fn value_of(&self, id: &str) -> Option<String> {
        self.lock()
            .elements
            .iter()
            .find(|el| el.id == id)
            .and_then(|el| el.value.clone())
    }

    pub fn set_value(&self, id: &str, value: &str) {
        if let Some(el) = self.lock().elements.iter_mut().find(|el| el.id == id) {
            el.value = Some(value.to_string());
        }
    }

    pub fn close_count(&self) -> usize {
        self.lock().closed
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn position(state: &FakeState, element: &ElementRef) -> Result<usize, AdapterError> {
        state
            .elements
            .iter()
            .enumerate()
            .filter(|(_, el)| el.matches(&element.selector))
            .nth(element.index)
            .map(|(pos, _)| pos)
            .ok_or_else(|| AdapterError::not_found(element.to_string()))
    }

    fn ensure_open(state: &FakeState) -> Result<(), AdapterError> {
        if state.closed > 0 {
            return Err(AdapterError::new(AdapterErrorKind::Closed));
        }
        Ok(())
    }
}

#[async_trait]
impl BrowserPage for FakePage {
    async fn navigate(&self, url: &str) -> Result<(), AdapterError> {
        let mut state = self.lock();
        Self::ensure_open(&state)?;
        state.actions.push(FakeAction::Navigate(url.to_string()));
        if state.failing_navigations > 0 {
            state.failing_navigations -= 1;
            return Err(AdapterError::new(AdapterErrorKind::NavTimeout).with_hint(url.to_string()));
        }
        Ok(())
    }

    async fn wait_for_network_idle(&self, _timeout: Duration) -> Result<(), AdapterError> {
        let mut state = self.lock();
        Self::ensure_open(&state)?;
        state.actions.push(FakeAction::WaitIdle);
        Ok(())
    }

    async fn query_all(&self, selector: &Selector) -> Result<Vec<ElementRef>, AdapterError> {
        let state = self.lock();
        Self::ensure_open(&state)?;
        let count = state
            .elements
            .iter()
            .filter(|el| el.matches(selector))
            .count();
        Ok((0..count)
            .map(|index| ElementRef::new(selector.clone(), index))
            .collect())
    }

    async fn is_visible(&self, element: &ElementRef, _timeout: Duration) -> Result<bool, AdapterError> {
        let state = self.lock();
        match Self::position(&state, element) {
            Ok(pos) => Ok(state.elements[pos].visible),
            Err(_) => Ok(false),
        }
    }

    async fn is_enabled(&self, element: &ElementRef) -> Result<bool, AdapterError> {
        let state = self.lock();
        let pos = Self::position(&state, element)?;
        Ok(state.elements[pos].enabled)
    }

    async fn attribute(&self, element: &ElementRef, name: &str) -> Result<Option<String>, AdapterError> {
        let state = self.lock();
        let pos = Self::position(&state, element)?;
        Ok(state.elements[pos].attrs.get(name).cloned())
    }

    async fn click(&self, element: &ElementRef, _timeout: Duration) -> Result<(), AdapterError> {
        let mut state = self.lock();
        Self::ensure_open(&state)?;
        let pos = Self::position(&state, element)?;
        let target = state.elements[pos].clone();
        if !target.visible || !target.enabled {
            return Err(AdapterError::timeout(format!("{} is not clickable", target.id)));
        }
        if state.failing_clicks.contains(&target.id) {
            return Err(AdapterError::timeout(format!("click on {} timed out", target.id)));
        }
        state.actions.push(FakeAction::Click(target.id.clone()));
        for el in state.elements.iter_mut() {
            if target.reveals.contains(&el.id) {
                el.visible = true;
            }
        }
        Ok(())
    }

    async fn fill(&self, element: &ElementRef, value: &str) -> Result<(), AdapterError> {
        let mut state = self.lock();
        Self::ensure_open(&state)?;
        let pos = Self::position(&state, element)?;
        let id = state.elements[pos].id.clone();
        state.actions.push(FakeAction::Fill {
            id,
            value: value.to_string(),
        });
        let el = &mut state.elements[pos];
        if el.dropped_fills > 0 {
            el.dropped_fills -= 1;
        } else {
            el.value = Some(value.to_string());
        }
        Ok(())
    }

    async fn press(&self, element: &ElementRef, key: &str) -> Result<(), AdapterError> {
        let mut state = self.lock();
        let pos = Self::position(&state, element)?;
        let id = state.elements[pos].id.clone();
        state.actions.push(FakeAction::Press {
            id,
            key: key.to_string(),
        });
        Ok(())
    }

    async fn input_value(&self, element: &ElementRef) -> Result<Option<String>, AdapterError> {
        let state = self.lock();
        let pos = Self::position(&state, element)?;
        Ok(state.elements[pos].value.clone())
    }

    async fn dispatch_event(&self, element: &ElementRef, event: DomEvent) -> Result<(), AdapterError> {
        let mut state = self.lock();
        let pos = Self::position(&state, element)?;
        let id = state.elements[pos].id.clone();
        state.actions.push(FakeAction::Dispatch { id, event });
        Ok(())
    }

    async fn click_body(&self) -> Result<(), AdapterError> {
        self.lock().actions.push(FakeAction::ClickBody);
        Ok(())
    }

    async fn evaluate(&self, script: &str) -> Result<Value, AdapterError> {
        let mut state = self.lock();
        Self::ensure_open(&state)?;
        state.actions.push(FakeAction::Evaluate(script.to_string()));
        let response = state
            .eval_responses
            .iter()
            .find(|(needle, _)| script.contains(needle.as_str()))
            .map(|(_, value)| value.clone());
        Ok(response.unwrap_or(Value::Null))
    }

    async fn screenshot(&self) -> Result<Vec<u8>, AdapterError> {
        let mut state = self.lock();
        Self::ensure_open(&state)?;
        if state.failing_screenshots {
            return Err(AdapterError::cdp("screenshot capture failed"));
        }
        state.actions.push(FakeAction::Screenshot);
        Ok(b"\x89PNG\r\n\x1a\n".to_vec())
    }

    async fn close(&self) -> Result<(), AdapterError> {
        let mut state = self.lock();
        state.closed += 1;
        state.actions.push(FakeAction::Close);
        if state.closed > 1 {
            return Err(AdapterError::new(AdapterErrorKind::Closed));
        }
        Ok(())
    }
}

/// Ids of the elements a selector matches, in document order.
pub fn match_ids(page: &FakePage, selector: &Selector) -> Vec<String> {
    page.lock()
        .elements
        .iter()
        .filter(|el| el.matches(selector))
        .map(|el| el.id.clone())
        .collect::<Vec<_>>()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(tag: &str, text: &str) -> Selector {
        Selector::Text {
            tag: Some(tag.into()),
            text: text.into(),
            exact: false,
        }
    }

    #[tokio::test]
    async fn text_selector_preserves_document_order() {
        let page = FakePage::with_elements([
            FakeElement::new("first", "button").with_text("Aceptar"),
            FakeElement::new("other", "button").with_text("Cancelar"),
            FakeElement::new("second", "button").with_text(" Aceptar "),
        ]);
        let matches = page.query_all(&text("button", "Aceptar")).await.unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(match_ids(&page, &text("button", "Aceptar")), vec!["first", "second"]);

        page.click(&matches[1], Duration::from_secs(1)).await.unwrap();
        assert_eq!(page.clicks(), vec!["second"]);
    }

    #[tokio::test]
    async fn attribute_selector_is_case_insensitive() {
        let page = FakePage::with_elements([
            FakeElement::input("cualificado").with_attr("placeholder", "Filtrar CUALIFICADO")
        ]);
        let selector = Selector::AttributeContains {
            tag: Some("input".into()),
            attribute: "placeholder".into(),
            needle: "cualificado".into(),
        };
        assert_eq!(page.query_all(&selector).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn dropped_fills_leave_value_untouched() {
        let page = FakePage::with_elements([FakeElement::input("field")
            .with_value("No")
            .matching("#field")
            .dropping_fills(1)]);
        let el = ElementRef::new(Selector::css("#field"), 0);

        page.fill(&el, "Sí").await.unwrap();
        assert_eq!(page.value_of("field").as_deref(), Some("No"));
        page.fill(&el, "Sí").await.unwrap();
        assert_eq!(page.value_of("field").as_deref(), Some("Sí"));
    }

    #[tokio::test]
    async fn clicking_reveals_hidden_elements() {
        let page = FakePage::with_elements([
            FakeElement::new("excel", "button").matching(".excel-icon").reveals("ok"),
            FakeElement::new("ok", "button").with_text("Aceptar").hidden(),
        ]);
        let ok = ElementRef::new(text("button", "Aceptar"), 0);
        assert!(!page.is_visible(&ok, Duration::ZERO).await.unwrap());
        assert!(page.click(&ok, Duration::ZERO).await.is_err());

        let excel = ElementRef::new(Selector::css(".excel-icon"), 0);
        page.click(&excel, Duration::ZERO).await.unwrap();
        assert!(page.is_visible(&ok, Duration::ZERO).await.unwrap());
    }

    #[tokio::test]
    async fn second_close_reports_closed() {
        let page = FakePage::new();
        page.close().await.unwrap();
        let err = page.close().await.unwrap_err();
        assert_eq!(err.kind, AdapterErrorKind::Closed);
        assert_eq!(page.close_count(), 2);
    }
}
