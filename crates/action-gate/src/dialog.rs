//! Modal filter forms addressed by input `name`.

use crate::conditions::text_matches;
use crate::errors::GateError;
use action_locator::{ElementResolver, LogicalTarget};
use cdp_adapter::{BrowserPage, ElementRef, Selector};
use l6_observe::TransitionObserver;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info};

/// Matches inputs whose `name` contains every `contains` fragment and none of
/// the `excludes` fragments, ignoring case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMatcher {
    pub contains: Vec<String>,
    #[serde(default)]
    pub excludes: Vec<String>,
}

impl FieldMatcher {
    pub fn containing(fragment: impl Into<String>) -> Self {
        Self {
            contains: vec![fragment.into()],
            excludes: Vec::new(),
        }
    }

    pub fn and_containing(mut self, fragment: impl Into<String>) -> Self {
        self.contains.push(fragment.into());
        self
    }

    pub fn excluding(mut self, fragment: impl Into<String>) -> Self {
        self.excludes.push(fragment.into());
        self
    }

    pub fn matches(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.contains
            .iter()
            .all(|fragment| name.contains(&fragment.to_lowercase()))
            && !self
                .excludes
                .iter()
                .any(|fragment| name.contains(&fragment.to_lowercase()))
    }
}

impl fmt::Display for FieldMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.contains.join("+"))?;
        for fragment in &self.excludes {
            write!(f, " !{}", fragment)?;
        }
        Ok(())
    }
}

/// A value typed into every input the matcher selects; at least one must match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogField {
    pub matcher: FieldMatcher,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogFilterSpec {
    pub open: LogicalTarget,
    /// Inputs emptied before any field is filled
    pub clear: Vec<FieldMatcher>,
    pub fields: Vec<DialogField>,
    pub submit: LogicalTarget,
    pub open_settle: Duration,
    pub fill_settle: Duration,
    pub submit_settle: Duration,
}

/// Counts of inputs touched by a dialog filter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DialogApplied {
    pub cleared: usize,
    pub filled: usize,
}

pub struct DialogFilterApplicator<'a> {
    resolver: &'a dyn ElementResolver,
    observer: &'a dyn TransitionObserver,
    click_timeout: Duration,
}

impl<'a> DialogFilterApplicator<'a> {
    pub fn new(
        resolver: &'a dyn ElementResolver,
        observer: &'a dyn TransitionObserver,
        click_timeout: Duration,
    ) -> Self {
        Self {
            resolver,
            observer,
            click_timeout,
        }
    }

    pub async fn apply(
        &self,
        page: &dyn BrowserPage,
        spec: &DialogFilterSpec,
    ) -> Result<DialogApplied, GateError> {
        self.observer.on_transition(page, "dialog_filter_before").await;
        self.resolver
            .click(page, &spec.open, self.click_timeout)
            .await?;
        sleep(spec.open_settle).await;

        let inputs = named_inputs(page).await?;
        let mut applied = DialogApplied::default();

        for (element, name) in &inputs {
            if spec.clear.iter().any(|matcher| matcher.matches(name)) {
                // Hidden range ends may refuse focus; the fill below is what matters.
                match page.fill(element, "").await {
                    Ok(()) => applied.cleared += 1,
                    Err(err) => debug!(name = %name, error = %err, "clearing input failed"),
                }
            }
        }
        sleep(spec.fill_settle).await;

        for field in &spec.fields {
            let targets: Vec<_> = inputs
                .iter()
                .filter(|(_, name)| field.matcher.matches(name))
                .collect();
            if targets.is_empty() {
                return Err(GateError::FieldNotFound {
                    matcher: field.matcher.to_string(),
                });
            }
            for (element, name) in targets {
                page.fill(element, &field.value)
                    .await
                    .map_err(GateError::adapter(name))?;
                let actual = page
                    .input_value(element)
                    .await
                    .map_err(GateError::adapter(name))?;
                if !text_matches(&field.value, actual.as_deref()) {
                    return Err(GateError::VerificationFailed {
                        field: name.clone(),
                        expected: field.value.clone(),
                        actual,
                    });
                }
                info!(name = %name, value = %field.value, "dialog field set");
                applied.filled += 1;
            }
        }
        self.observer.on_transition(page, "dialog_filter_filled").await;
        sleep(spec.fill_settle).await;

        self.resolver
            .click(page, &spec.submit, self.click_timeout)
            .await?;
        sleep(spec.submit_settle).await;
        info!(cleared = applied.cleared, filled = applied.filled, "dialog filter submitted");
        Ok(applied)
    }
}

async fn named_inputs(page: &dyn BrowserPage) -> Result<Vec<(ElementRef, String)>, GateError> {
    let elements = page
        .query_all(&Selector::css("input"))
        .await
        .map_err(GateError::adapter("input"))?;
    let mut named = Vec::with_capacity(elements.len());
    for element in elements {
        let name = page
            .attribute(&element, "name")
            .await
            .map_err(GateError::adapter("input"))?;
        if let Some(name) = name.filter(|name| !name.is_empty()) {
            named.push((element, name));
        }
    }
    Ok(named)
}

#[cfg(test)]
mod tests {
    use super::*;
    use action_locator::{ChainResolver, SelectorCandidate};
    use cdp_adapter::fake::{FakeAction, FakeElement, FakePage};
    use l6_observe::NullObserver;

    fn spec() -> DialogFilterSpec {
        DialogFilterSpec {
            open: LogicalTarget::new("filter-dialog")
                .with_candidate(SelectorCandidate::attribute("title", "Filtro").within("button")),
            clear: vec![FieldMatcher::containing("fecha_fin")],
            fields: vec![
                DialogField {
                    matcher: FieldMatcher::containing("fecha_inicio").excluding("fin"),
                    value: "01/07/2024".into(),
                },
                DialogField {
                    matcher: FieldMatcher::containing("fecha_inicio").and_containing("fin"),
                    value: "30/09/2024".into(),
                },
            ],
            submit: LogicalTarget::new("filter-dialog-submit").with_candidate(
                SelectorCandidate::attribute("id", "btnFiltroAceptarTareas").within("button"),
            ),
            open_settle: Duration::from_secs(2),
            fill_settle: Duration::from_secs(1),
            submit_settle: Duration::from_secs(5),
        }
    }

    fn page() -> FakePage {
        FakePage::with_elements([
            FakeElement::new("open", "button").with_attr("title", "Filtro avanzado"),
            FakeElement::input("inicio").with_attr("name", "form:fecha_inicio"),
            FakeElement::input("inicio-fin").with_attr("name", "form:fecha_inicio_fin"),
            FakeElement::input("fin")
                .with_attr("name", "form:FECHA_FIN")
                .with_value("31/12/2023"),
            FakeElement::input("search"),
            FakeElement::new("submit", "button").with_attr("id", "form:btnFiltroAceptarTareas"),
        ])
    }

    fn resolver() -> ChainResolver {
        ChainResolver::new().with_probe_timeout(Duration::from_millis(5))
    }

    #[test]
    fn matcher_requires_all_fragments_and_no_exclusions() {
        let start = FieldMatcher::containing("fecha_inicio").excluding("fin");
        assert!(start.matches("form:Fecha_Inicio"));
        assert!(!start.matches("form:fecha_inicio_fin"));

        let end = FieldMatcher::containing("fecha_inicio").and_containing("fin");
        assert!(end.matches("form:fecha_inicio_fin"));
        assert!(!end.matches("form:fecha_fin"));
    }

    #[tokio::test(start_paused = true)]
    async fn clears_fills_and_submits() {
        let page = page();
        let resolver = resolver();
        let applicator = DialogFilterApplicator::new(&resolver, &NullObserver, Duration::from_secs(5));

        let applied = applicator.apply(&page, &spec()).await.unwrap();

        assert_eq!(applied, DialogApplied { cleared: 1, filled: 2 });
        assert_eq!(page.value_of("fin").as_deref(), Some(""));
        assert_eq!(page.value_of("inicio").as_deref(), Some("01/07/2024"));
        assert_eq!(page.value_of("inicio-fin").as_deref(), Some("30/09/2024"));
        assert_eq!(page.value_of("search").as_deref(), Some(""));
        assert_eq!(page.clicks(), vec!["open", "submit"]);
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_date_fails_before_submit() {
        let page = FakePage::with_elements([
            FakeElement::new("open", "button").with_attr("title", "Filtro"),
            FakeElement::input("inicio")
                .with_attr("name", "form:fecha_inicio")
                .dropping_fills(1),
            FakeElement::new("submit", "button").with_attr("id", "btnFiltroAceptarTareas"),
        ]);
        let resolver = resolver();
        let applicator = DialogFilterApplicator::new(&resolver, &NullObserver, Duration::from_secs(5));

        let err = applicator.apply(&page, &spec()).await.unwrap_err();

        assert!(matches!(err, GateError::VerificationFailed { ref field, .. } if field == "form:fecha_inicio"));
        assert!(!page.actions().contains(&FakeAction::Click("submit".into())));
    }

    #[tokio::test(start_paused = true)]
    async fn field_without_matching_input_fails_before_submit() {
        let page = FakePage::with_elements([
            FakeElement::new("open", "button").with_attr("title", "Filtro"),
            FakeElement::input("desde").with_attr("name", "form:desde"),
            FakeElement::new("submit", "button").with_attr("id", "btnFiltroAceptarTareas"),
        ]);
        let resolver = resolver();
        let applicator = DialogFilterApplicator::new(&resolver, &NullObserver, Duration::from_secs(5));

        let err = applicator.apply(&page, &spec()).await.unwrap_err();

        match err {
            GateError::FieldNotFound { matcher } => assert_eq!(matcher, "fecha_inicio !fin"),
            other => panic!("expected FieldNotFound, got {:?}", other),
        }
        assert_eq!(page.clicks(), vec!["open"]);
        assert_eq!(page.value_of("desde").as_deref(), Some(""));
    }

    #[tokio::test(start_paused = true)]
    async fn missing_open_button_is_a_locator_error() {
        let page = FakePage::new();
        let resolver = resolver();
        let applicator = DialogFilterApplicator::new(&resolver, &NullObserver, Duration::from_secs(5));
        assert!(matches!(
            applicator.apply(&page, &spec()).await.unwrap_err(),
            GateError::Locator(_)
        ));
    }
}
