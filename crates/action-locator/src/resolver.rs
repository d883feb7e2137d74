//! Element resolver with fallback chain orchestration

use crate::{
    errors::LocatorError,
    strategies::{probe_candidate, ProbeOutcome},
    types::*,
};
use async_trait::async_trait;
use cdp_adapter::BrowserPage;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default time a single candidate gets to report visible
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Element resolver trait
#[async_trait]
pub trait ElementResolver: Send + Sync {
    /// Resolve a logical target to the first interactable candidate match
    async fn resolve(
        &self,
        page: &dyn BrowserPage,
        target: &LogicalTarget,
    ) -> Result<Resolution, LocatorError>;

    /// Resolve, then click the resolved element
    async fn click(
        &self,
        page: &dyn BrowserPage,
        target: &LogicalTarget,
        timeout: Duration,
    ) -> Result<Resolution, LocatorError> {
        let resolution = self.resolve(page, target).await?;
        page.click(&resolution.element, timeout)
            .await
            .map_err(|source| LocatorError::Adapter {
                target: target.name.clone(),
                source,
            })?;
        debug!(target = %target.name, element = %resolution.element, "clicked");
        Ok(resolution)
    }
}

/// Walks a target's candidates in declared order and stops at the first hit
#[derive(Debug, Clone)]
pub struct ChainResolver {
    probe_timeout: Duration,
}

impl Default for ChainResolver {
    fn default() -> Self {
        Self {
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }
}

impl ChainResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_probe_timeout(mut self, probe_timeout: Duration) -> Self {
        self.probe_timeout = probe_timeout;
        self
    }

    pub fn probe_timeout(&self) -> Duration {
        self.probe_timeout
    }
}

#[async_trait]
impl ElementResolver for ChainResolver {
    async fn resolve(
        &self,
        page: &dyn BrowserPage,
        target: &LogicalTarget,
    ) -> Result<Resolution, LocatorError> {
        debug!(target = %target.name, candidates = target.candidates.len(), "resolving");

        for (index, candidate) in target.candidates.iter().enumerate() {
            match probe_candidate(page, candidate, target.pick, self.probe_timeout).await {
                Ok(ProbeOutcome::Matched(element)) => {
                    info!(
                        target = %target.name,
                        candidate = %candidate,
                        index,
                        "resolved"
                    );
                    return Ok(Resolution {
                        target: target.name.clone(),
                        element,
                        candidate_index: index,
                        kind: candidate.kind(),
                    });
                }
                Ok(miss) => {
                    debug!(
                        target = %target.name,
                        candidate = %candidate,
                        outcome = miss.label(),
                        "candidate missed"
                    );
                }
                Err(err) => {
                    warn!(
                        target = %target.name,
                        candidate = %candidate,
                        error = %err,
                        "candidate probe failed"
                    );
                }
            }
        }

        Err(LocatorError::NotFound {
            target: target.name.clone(),
            tried: target.describe_candidates(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdp_adapter::fake::{FakeElement, FakePage};

    fn crm_target() -> LogicalTarget {
        LogicalTarget::new("nav:CRM").with_candidates([
            SelectorCandidate::text("CRM"),
            SelectorCandidate::contains("CRM").within("a"),
            SelectorCandidate::attribute("href", "crm").within("a"),
        ])
    }

    fn resolver() -> ChainResolver {
        ChainResolver::new().with_probe_timeout(Duration::from_millis(5))
    }

    #[tokio::test]
    async fn returns_first_declared_candidate_even_when_later_ones_match() {
        let page = FakePage::with_elements([
            FakeElement::new("link", "a")
                .with_text("CRM")
                .with_attr("href", "/crm/inicio"),
        ]);

        let resolution = resolver().resolve(&page, &crm_target()).await.unwrap();
        assert_eq!(resolution.candidate_index, 0);
        assert_eq!(resolution.kind, CandidateKind::Text);
    }

    #[tokio::test]
    async fn skips_hidden_candidates_and_falls_through() {
        let page = FakePage::with_elements([
            FakeElement::new("ghost", "span").with_text("CRM").hidden(),
            FakeElement::new("link", "a")
                .with_text("Menú")
                .with_attr("href", "/CRM/inicio"),
        ]);

        let resolution = resolver().resolve(&page, &crm_target()).await.unwrap();
        assert_eq!(resolution.candidate_index, 2);
        assert_eq!(resolution.kind, CandidateKind::Attribute);
    }

    #[tokio::test]
    async fn exhausted_chain_reports_every_candidate() {
        let page = FakePage::new();
        let err = resolver().resolve(&page, &crm_target()).await.unwrap_err();
        match err {
            LocatorError::NotFound { target, tried } => {
                assert_eq!(target, "nav:CRM");
                assert_eq!(tried.len(), 3);
            }
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn adapter_errors_count_as_misses() {
        let page = FakePage::new();
        page.close().await.unwrap();

        let err = resolver().resolve(&page, &crm_target()).await.unwrap_err();
        assert!(matches!(err, LocatorError::NotFound { .. }));
    }

    #[tokio::test]
    async fn click_uses_the_resolved_element() {
        let page = FakePage::with_elements([
            FakeElement::new("first", "button").with_text("Aceptar"),
            FakeElement::new("second", "button").with_text("Aceptar"),
        ]);
        let target = LogicalTarget::new("confirm")
            .with_candidate(SelectorCandidate::text("Aceptar").within("button"))
            .with_pick(Pick::Last);

        resolver()
            .click(&page, &target, Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(page.clicks(), vec!["second"]);
    }
}
