//! Single-candidate probing.
//!
//! A candidate matches when its query returns at least one element and the
//! picked match is visible within the probe window and enabled.

use crate::types::{Pick, SelectorCandidate};
use cdp_adapter::{AdapterError, BrowserPage, ElementRef};
use std::time::Duration;
use tracing::debug;

/// Result of probing one candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// Candidate resolved to an interactable element
    Matched(ElementRef),

    /// Query returned nothing
    NoMatch,

    /// The picked match never became visible
    Hidden,

    /// The picked match is visible but disabled
    Disabled,
}

impl ProbeOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            ProbeOutcome::Matched(_) => "matched",
            ProbeOutcome::NoMatch => "no-match",
            ProbeOutcome::Hidden => "hidden",
            ProbeOutcome::Disabled => "disabled",
        }
    }
}

/// Evaluate a single candidate against the live page.
///
/// `Pick::Last` walks the matches from the end of the document and settles on
/// the first one that is visible and enabled. Only the final match gets the
/// full visibility window; earlier ones are checked as rendered.
pub async fn probe_candidate(
    page: &dyn BrowserPage,
    candidate: &SelectorCandidate,
    pick: Pick,
    probe_timeout: Duration,
) -> Result<ProbeOutcome, AdapterError> {
    let matches = page.query_all(&candidate.to_selector()).await?;
    let ordered: Vec<ElementRef> = match pick {
        Pick::First => matches.into_iter().take(1).collect(),
        Pick::Last => matches.into_iter().rev().collect(),
    };

    let mut outcome = ProbeOutcome::NoMatch;
    let mut window = probe_timeout;
    for element in ordered {
        debug!(candidate = %candidate, element = %element, "probing candidate match");

        let rejected = if !page.is_visible(&element, window).await? {
            ProbeOutcome::Hidden
        } else if !page.is_enabled(&element).await? {
            ProbeOutcome::Disabled
        } else {
            return Ok(ProbeOutcome::Matched(element));
        };
        if outcome == ProbeOutcome::NoMatch {
            outcome = rejected;
        }
        window = Duration::ZERO;
    }
    Ok(outcome)
}
