//! Engine-level selectors and their in-page JavaScript rendering.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A query the browser engine knows how to run against the live DOM.
///
/// Every variant renders to a JavaScript expression that evaluates to an
/// `Array` of elements in document order, so the real engine and the fake
/// agree on match ordering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Selector {
    /// Plain CSS selector.
    Css { css: String },
    /// Elements whose trimmed visible text equals (or contains) `text`.
    Text {
        tag: Option<String>,
        text: String,
        exact: bool,
    },
    /// Elements whose attribute value contains `needle`, case-insensitively.
    AttributeContains {
        tag: Option<String>,
        attribute: String,
        needle: String,
    },
    /// Arbitrary expression returning an element, a list of elements or null.
    Script { expression: String },
}

impl Selector {
    pub fn css(css: impl Into<String>) -> Self {
        Selector::Css { css: css.into() }
    }

    /// JavaScript expression yielding an `Array` of matching elements.
    pub fn to_js(&self) -> String {
        match self {
            Selector::Css { css } => {
                format!("Array.from(document.querySelectorAll({}))", js_string(css))
            }
            Selector::Text { tag, text, exact } => {
                let scope = tag.as_deref().unwrap_or("*");
                // Without a tag, ancestors of a match also contain its text; keep the deepest.
                let deepest = tag.is_none();
                format!(
                    "(() => {{ const want = {text}; const exact = {exact}; \
                     const hit = (el) => {{ const t = (el.innerText || el.textContent || '').trim(); \
                     return exact ? t === want : t.includes(want); }}; \
                     const all = Array.from(document.querySelectorAll({scope})).filter(hit); \
                     return {deepest} ? all.filter((el) => !Array.from(el.children).some(hit)) : all; }})()",
                    text = js_string(text),
                    exact = exact,
                    scope = js_string(scope),
                    deepest = deepest,
                )
            }
            Selector::AttributeContains {
                tag,
                attribute,
                needle,
            } => format!(
                "Array.from(document.querySelectorAll({scope})).filter((el) => \
                 (el.getAttribute({attr}) || '').toLowerCase().includes({needle}.toLowerCase()))",
                scope = js_string(tag.as_deref().unwrap_or("*")),
                attr = js_string(attribute),
                needle = js_string(needle),
            ),
            Selector::Script { expression } => format!(
                "(() => {{ const found = ({expression}); \
                 if (!found) return []; \
                 return (found instanceof Element) ? [found] : Array.from(found); }})()"
            ),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Css { css } => write!(f, "css={}", css),
            Selector::Text { tag, text, exact } => {
                let op = if *exact { "=" } else { "~" };
                match tag {
                    Some(tag) => write!(f, "{}:text{}\"{}\"", tag, op, text),
                    None => write!(f, "text{}\"{}\"", op, text),
                }
            }
            Selector::AttributeContains {
                tag,
                attribute,
                needle,
            } => write!(
                f,
                "{}[{}*=\"{}\" i]",
                tag.as_deref().unwrap_or(""),
                attribute,
                needle
            ),
            Selector::Script { expression } => {
                let short: String = expression.chars().take(48).collect();
                write!(f, "script={}", short)
            }
        }
    }
}

/// Render a Rust string as a JavaScript string literal.
pub fn js_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}
