//! Filter apply-and-verify protocol.
//!
//! Each pass focuses the column input, replaces its value, fires the DOM
//! events the grid listens to, submits with Enter and clicks away. After the
//! settle window the value is read back; a mismatch earns exactly one
//! corrective pass before the filter is declared failed.

use crate::conditions::value_matches;
use crate::errors::GateError;
use crate::types::{Applied, FilterSpec, FilterTiming};
use action_locator::ElementResolver;
use cdp_adapter::{BrowserPage, DomEvent};
use l6_observe::TransitionObserver;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

const MAX_PASSES: u32 = 2;

pub struct FilterApplicator<'a> {
    resolver: &'a dyn ElementResolver,
    observer: &'a dyn TransitionObserver,
    timing: FilterTiming,
    click_timeout: Duration,
}

impl<'a> FilterApplicator<'a> {
    pub fn new(
        resolver: &'a dyn ElementResolver,
        observer: &'a dyn TransitionObserver,
        click_timeout: Duration,
    ) -> Self {
        Self {
            resolver,
            observer,
            timing: FilterTiming::default(),
            click_timeout,
        }
    }

    pub fn with_timing(mut self, timing: FilterTiming) -> Self {
        self.timing = timing;
        self
    }

    pub async fn apply(&self, page: &dyn BrowserPage, spec: &FilterSpec) -> Result<Applied, GateError> {
        let mut actual = None;
        for pass in 1..=MAX_PASSES {
            actual = self.pass(page, spec).await?;
            if value_matches(spec, actual.as_deref()) {
                info!(
                    field = %spec.field_label,
                    value = actual.as_deref().unwrap_or_default(),
                    pass,
                    "filter applied"
                );
                self.observer
                    .on_transition(page, &format!("filter_{}_applied", spec.field_label))
                    .await;
                return Ok(Applied {
                    field: spec.field_label.clone(),
                    value: actual.unwrap_or_default(),
                    passes: pass,
                });
            }
            warn!(
                field = %spec.field_label,
                expected = %spec.desired_value,
                actual = ?actual,
                pass,
                "filter value did not stick"
            );
            self.observer
                .on_transition(page, &format!("filter_{}_mismatch_{}", spec.field_label, pass))
                .await;
        }

        Err(GateError::VerificationFailed {
            field: spec.field_label.clone(),
            expected: spec.desired_value.clone(),
            actual,
        })
    }

    /// One full application; returns the value read back after settling.
    async fn pass(&self, page: &dyn BrowserPage, spec: &FilterSpec) -> Result<Option<String>, GateError> {
        let field = spec.field_label.as_str();
        let t = &self.timing;

        let resolution = self
            .resolver
            .click(page, &spec.target(), self.click_timeout)
            .await?;
        let input = resolution.element;
        sleep(t.after_focus).await;

        page.fill(&input, "").await.map_err(GateError::adapter(field))?;
        sleep(t.after_clear).await;
        page.fill(&input, &spec.desired_value)
            .await
            .map_err(GateError::adapter(field))?;
        sleep(t.after_fill).await;

        let mut events = vec![DomEvent::Input, DomEvent::Change];
        if spec.blur {
            events.push(DomEvent::Blur);
        }
        for event in events {
            page.dispatch_event(&input, event)
                .await
                .map_err(GateError::adapter(field))?;
        }
        sleep(t.after_events).await;

        page.press(&input, "Enter")
            .await
            .map_err(GateError::adapter(field))?;
        sleep(t.after_enter).await;

        page.click_body().await.map_err(GateError::adapter(field))?;
        sleep(t.after_body_click).await;

        debug!(field, settle_ms = t.settle.as_millis() as u64, "waiting for grid to settle");
        sleep(t.settle).await;

        page.input_value(&input).await.map_err(GateError::adapter(field))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use action_locator::ChainResolver;
    use cdp_adapter::fake::{FakeAction, FakeElement, FakePage};
    use l6_observe::NullObserver;
    use tokio::time::Instant;

    fn si() -> FilterSpec {
        FilterSpec::new("Cualificado", "Sí")
            .with_equivalents(["sí", "si", "yes", "s"])
            .with_blur(true)
    }

    fn resolver() -> ChainResolver {
        ChainResolver::new().with_probe_timeout(Duration::from_millis(5))
    }

    fn cualificado(value: &str) -> FakeElement {
        FakeElement::input("cualificado")
            .with_attr("placeholder", "Cualificado")
            .with_value(value)
    }

    fn expected_pass(value: &str) -> Vec<FakeAction> {
        let id = || "cualificado".to_string();
        vec![
            FakeAction::Click(id()),
            FakeAction::Fill { id: id(), value: String::new() },
            FakeAction::Fill { id: id(), value: value.to_string() },
            FakeAction::Dispatch { id: id(), event: DomEvent::Input },
            FakeAction::Dispatch { id: id(), event: DomEvent::Change },
            FakeAction::Dispatch { id: id(), event: DomEvent::Blur },
            FakeAction::Press { id: id(), key: "Enter".to_string() },
            FakeAction::ClickBody,
        ]
    }

    #[tokio::test(start_paused = true)]
    async fn applies_and_verifies_in_one_pass() {
        let page = FakePage::with_elements([cualificado("")]);
        let resolver = resolver();
        let applicator = FilterApplicator::new(&resolver, &NullObserver, Duration::from_secs(5));
        let started = Instant::now();

        let applied = applicator.apply(&page, &si()).await.unwrap();

        assert_eq!(applied.passes, 1);
        assert_eq!(applied.value, "Sí");
        assert_eq!(page.actions(), expected_pass("Sí"));
        assert_eq!(started.elapsed(), FilterTiming::default().pass_duration());
    }

    #[tokio::test(start_paused = true)]
    async fn reapplying_a_correct_filter_repeats_only_the_declared_sequence() {
        let page = FakePage::with_elements([cualificado("Sí")]);
        let resolver = resolver();
        let applicator = FilterApplicator::new(&resolver, &NullObserver, Duration::from_secs(5));

        let first = applicator.apply(&page, &si()).await.unwrap();
        let second = applicator.apply(&page, &si()).await.unwrap();

        assert_eq!(first, second);
        let mut expected = expected_pass("Sí");
        expected.extend(expected_pass("Sí"));
        assert_eq!(page.actions(), expected);
    }

    #[tokio::test(start_paused = true)]
    async fn corrective_pass_recovers_a_dropped_value() {
        let page = FakePage::with_elements([cualificado("No").dropping_fills(2)]);
        let resolver = resolver();
        let applicator = FilterApplicator::new(&resolver, &NullObserver, Duration::from_secs(5));

        let applied = applicator.apply(&page, &si()).await.unwrap();

        assert_eq!(applied.passes, 2);
        assert_eq!(page.value_of("cualificado").as_deref(), Some("Sí"));
    }

    #[tokio::test(start_paused = true)]
    async fn value_that_never_sticks_fails_after_two_passes() {
        let page = FakePage::with_elements([cualificado("No").dropping_fills(usize::MAX)]);
        let resolver = resolver();
        let applicator = FilterApplicator::new(&resolver, &NullObserver, Duration::from_secs(5));

        let err = applicator.apply(&page, &si()).await.unwrap_err();

        match err {
            GateError::VerificationFailed { field, expected, actual } => {
                assert_eq!(field, "Cualificado");
                assert_eq!(expected, "Sí");
                assert_eq!(actual.as_deref(), Some("No"));
            }
            other => panic!("expected VerificationFailed, got {:?}", other),
        }
        let presses = page
            .actions()
            .into_iter()
            .filter(|action| matches!(action, FakeAction::Press { .. }))
            .count();
        assert_eq!(presses, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn falls_back_to_aria_label_and_skips_blur_when_not_requested() {
        let page = FakePage::with_elements([FakeElement::input("tipo").with_attr("aria-label", "Filtro tipo")]);
        let resolver = resolver();
        let applicator = FilterApplicator::new(&resolver, &NullObserver, Duration::from_secs(5));

        let applied = applicator
            .apply(&page, &FilterSpec::new("Tipo", "Autónomo"))
            .await
            .unwrap();

        assert_eq!(applied.value, "Autónomo");
        assert!(!page.actions().iter().any(|action| matches!(
            action,
            FakeAction::Dispatch { event: DomEvent::Blur, .. }
        )));
    }

    #[tokio::test(start_paused = true)]
    async fn missing_input_is_a_locator_error() {
        let page = FakePage::new();
        let resolver = resolver();
        let applicator = FilterApplicator::new(&resolver, &NullObserver, Duration::from_secs(5));

        let err = applicator.apply(&page, &si()).await.unwrap_err();
        assert!(matches!(err, GateError::Locator(_)));
    }
}
