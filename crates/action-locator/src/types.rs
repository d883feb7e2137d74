//! Core types for locator system

use cdp_adapter::{ElementRef, Selector};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Match kind of a selector candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CandidateKind {
    Text,
    Attribute,
    Css,
    Script,
}

impl CandidateKind {
    /// Get kind name as string
    pub fn name(&self) -> &'static str {
        match self {
            CandidateKind::Text => "text",
            CandidateKind::Attribute => "attribute",
            CandidateKind::Css => "css",
            CandidateKind::Script => "script",
        }
    }
}

/// One way of finding the element behind a [`LogicalTarget`].
///
/// Candidates are plain data and evaluate in the order they were declared;
/// there is no scoring between them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SelectorCandidate {
    /// Trimmed visible text equals `text`
    TextEquals {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tag: Option<String>,
        text: String,
    },

    /// Visible text contains `text`
    TextContains {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tag: Option<String>,
        text: String,
    },

    /// Attribute value contains `needle`, ignoring case
    AttributeContains {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tag: Option<String>,
        attribute: String,
        needle: String,
    },

    /// Raw CSS selector
    Css { css: String },

    /// JavaScript expression returning an element or a list of elements
    Script { expression: String },
}

impl SelectorCandidate {
    pub fn text(text: impl Into<String>) -> Self {
        SelectorCandidate::TextEquals {
            tag: None,
            text: text.into(),
        }
    }

    pub fn contains(text: impl Into<String>) -> Self {
        SelectorCandidate::TextContains {
            tag: None,
            text: text.into(),
        }
    }

    pub fn attribute(attribute: impl Into<String>, needle: impl Into<String>) -> Self {
        SelectorCandidate::AttributeContains {
            tag: None,
            attribute: attribute.into(),
            needle: needle.into(),
        }
    }

    pub fn css(css: impl Into<String>) -> Self {
        SelectorCandidate::Css { css: css.into() }
    }

    pub fn script(expression: impl Into<String>) -> Self {
        SelectorCandidate::Script {
            expression: expression.into(),
        }
    }

    /// Restrict a text or attribute candidate to one tag name.
    pub fn within(mut self, tag_name: impl Into<String>) -> Self {
        match &mut self {
            SelectorCandidate::TextEquals { tag, .. }
            | SelectorCandidate::TextContains { tag, .. }
            | SelectorCandidate::AttributeContains { tag, .. } => *tag = Some(tag_name.into()),
            SelectorCandidate::Css { .. } | SelectorCandidate::Script { .. } => {}
        }
        self
    }

    pub fn kind(&self) -> CandidateKind {
        match self {
            SelectorCandidate::TextEquals { .. } | SelectorCandidate::TextContains { .. } => {
                CandidateKind::Text
            }
            SelectorCandidate::AttributeContains { .. } => CandidateKind::Attribute,
            SelectorCandidate::Css { .. } => CandidateKind::Css,
            SelectorCandidate::Script { .. } => CandidateKind::Script,
        }
    }

    /// Engine selector running this candidate's query.
    pub fn to_selector(&self) -> Selector {
        match self.clone() {
            SelectorCandidate::TextEquals { tag, text } => Selector::Text {
                tag,
                text,
                exact: true,
            },
            SelectorCandidate::TextContains { tag, text } => Selector::Text {
                tag,
                text,
                exact: false,
            },
            SelectorCandidate::AttributeContains {
                tag,
                attribute,
                needle,
            } => Selector::AttributeContains {
                tag,
                attribute,
                needle,
            },
            SelectorCandidate::Css { css } => Selector::Css { css },
            SelectorCandidate::Script { expression } => Selector::Script { expression },
        }
    }
}

impl fmt::Display for SelectorCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_selector())
    }
}

/// Which match of a candidate counts as the semantic one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pick {
    #[default]
    First,
    /// Last visible, enabled match in document order; stacked dialogs render
    /// their newest button last.
    Last,
}

/// A named UI role resolved through an ordered list of candidates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalTarget {
    pub name: String,
    pub candidates: Vec<SelectorCandidate>,
    #[serde(default)]
    pub pick: Pick,
}

impl LogicalTarget {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            candidates: Vec::new(),
            pick: Pick::First,
        }
    }

    pub fn with_candidate(mut self, candidate: SelectorCandidate) -> Self {
        self.candidates.push(candidate);
        self
    }

    pub fn with_candidates(mut self, candidates: impl IntoIterator<Item = SelectorCandidate>) -> Self {
        self.candidates.extend(candidates);
        self
    }

    pub fn with_pick(mut self, pick: Pick) -> Self {
        self.pick = pick;
        self
    }

    /// Display form of every candidate, in evaluation order
    pub fn describe_candidates(&self) -> Vec<String> {
        self.candidates.iter().map(ToString::to_string).collect()
    }
}

impl fmt::Display for LogicalTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Outcome of a successful resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Logical target name
    pub target: String,

    /// Resolved element handle
    pub element: ElementRef,

    /// Position of the winning candidate in the declared list
    pub candidate_index: usize,

    pub kind: CandidateKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn within_scopes_text_and_attribute_candidates() {
        let candidate = SelectorCandidate::contains("CRM").within("a");
        assert_eq!(
            candidate.to_selector(),
            Selector::Text {
                tag: Some("a".into()),
                text: "CRM".into(),
                exact: false,
            }
        );

        let css = SelectorCandidate::css("a[href*=\"crm\"]").within("span");
        assert_eq!(css, SelectorCandidate::css("a[href*=\"crm\"]"));
    }

    #[test]
    fn candidates_deserialize_from_tagged_yaml_shape() {
        let json = serde_json::json!([
            { "kind": "text_equals", "text": "CRM" },
            { "kind": "attribute_contains", "tag": "button", "attribute": "title", "needle": "Excel" },
            { "kind": "css", "css": ".excel-icon" }
        ]);
        let parsed: Vec<SelectorCandidate> = serde_json::from_value(json).unwrap();
        assert_eq!(parsed[0], SelectorCandidate::text("CRM"));
        assert_eq!(parsed[1].kind(), CandidateKind::Attribute);
        assert_eq!(parsed[2].kind().name(), "css");
    }

    #[test]
    fn target_defaults_to_first_pick() {
        let target: LogicalTarget = serde_json::from_value(serde_json::json!({
            "name": "confirm",
            "candidates": [{ "kind": "text_equals", "tag": "button", "text": "Aceptar" }]
        }))
        .unwrap();
        assert_eq!(target.pick, Pick::First);
        assert_eq!(target.describe_candidates(), vec!["button:text=\"Aceptar\""]);
    }
}
