//! Filter specifications and timing

use action_locator::{LogicalTarget, SelectorCandidate};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One column filter to type into the table header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    /// Label matched against the input's placeholder, aria-label or title
    pub field_label: String,
    pub desired_value: String,
    /// Alternative spellings the page may normalise the value to
    #[serde(default)]
    pub accepted_equivalents: Vec<String>,
    /// Also dispatch a `blur` event after `input`/`change`
    #[serde(default)]
    pub blur: bool,
}

impl FilterSpec {
    pub fn new(field_label: impl Into<String>, desired_value: impl Into<String>) -> Self {
        Self {
            field_label: field_label.into(),
            desired_value: desired_value.into(),
            accepted_equivalents: Vec::new(),
            blur: false,
        }
    }

    pub fn with_equivalents<I, S>(mut self, equivalents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.accepted_equivalents = equivalents.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_blur(mut self, blur: bool) -> Self {
        self.blur = blur;
        self
    }

    /// `filter-input:<label>`, probing placeholder, then aria-label, then title.
    pub fn target(&self) -> LogicalTarget {
        LogicalTarget::new(format!("filter-input:{}", self.field_label)).with_candidates(
            ["placeholder", "aria-label", "title"].into_iter().map(|attribute| {
                SelectorCandidate::attribute(attribute, self.field_label.as_str()).within("input")
            }),
        )
    }
}

/// Pauses between the steps of one filter application.
///
/// The grid re-renders asynchronously with no observable "settled" event, so
/// every step is followed by a flat wait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterTiming {
    pub after_focus: Duration,
    pub after_clear: Duration,
    pub after_fill: Duration,
    pub after_events: Duration,
    pub after_enter: Duration,
    pub after_body_click: Duration,
    /// Wait before reading the value back
    pub settle: Duration,
}

impl Default for FilterTiming {
    fn default() -> Self {
        Self {
            after_focus: Duration::from_millis(300),
            after_clear: Duration::from_millis(200),
            after_fill: Duration::from_millis(500),
            after_events: Duration::from_millis(500),
            after_enter: Duration::from_secs(1),
            after_body_click: Duration::from_millis(1500),
            settle: Duration::from_secs(4),
        }
    }
}

impl FilterTiming {
    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    /// Total wall-clock time of one application pass
    pub fn pass_duration(&self) -> Duration {
        self.after_focus
            + self.after_clear
            + self.after_fill
            + self.after_events
            + self.after_enter
            + self.after_body_click
            + self.settle
    }
}

/// Successful filter application
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied {
    pub field: String,
    /// Value read back from the input
    pub value: String,
    /// 1, or 2 when the corrective re-application was needed
    pub passes: u32,
}
