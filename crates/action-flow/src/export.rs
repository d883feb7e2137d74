//! Export confirmation state machine.
//!
//! `Done` certifies only that the export request was submitted. The CRM
//! delivers the file out-of-band, so there is no completion signal to wait on.

use crate::errors::FlowError;
use action_locator::{ElementResolver, LocatorError, LogicalTarget};
use cdp_adapter::BrowserPage;
use l6_observe::TransitionObserver;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportState {
    Idle,
    ExcelClicked,
    DialogShown,
    Confirmed,
    Done,
    Failed,
}

impl ExportState {
    pub fn name(&self) -> &'static str {
        match self {
            ExportState::Idle => "idle",
            ExportState::ExcelClicked => "excel_clicked",
            ExportState::DialogShown => "dialog_shown",
            ExportState::Confirmed => "confirmed",
            ExportState::Done => "done",
            ExportState::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ExportState::Done | ExportState::Failed)
    }
}

impl fmt::Display for ExportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Targets and waits driving one export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPlan {
    pub trigger: LogicalTarget,
    /// Primary confirmation control, usually picked last in document order
    pub confirm: LogicalTarget,
    /// Tried in order when `confirm` does not resolve
    pub confirm_fallbacks: Vec<LogicalTarget>,
    /// Flat wait for the confirmation dialog; the dialog exposes no ready signal
    pub dialog_wait: Duration,
    pub settle: Duration,
}

/// Drives one export from `Idle` to a terminal state
pub struct ExportMachine<'a> {
    resolver: &'a dyn ElementResolver,
    observer: &'a dyn TransitionObserver,
    click_timeout: Duration,
    state: ExportState,
    history: Vec<ExportState>,
}

impl<'a> ExportMachine<'a> {
    pub fn new(
        resolver: &'a dyn ElementResolver,
        observer: &'a dyn TransitionObserver,
        click_timeout: Duration,
    ) -> Self {
        Self {
            resolver,
            observer,
            click_timeout,
            state: ExportState::Idle,
            history: vec![ExportState::Idle],
        }
    }

    pub fn state(&self) -> ExportState {
        self.state
    }

    /// Every state visited so far, starting with `Idle`
    pub fn history(&self) -> &[ExportState] {
        &self.history
    }

    pub async fn run(
        &mut self,
        page: &dyn BrowserPage,
        plan: &ExportPlan,
    ) -> Result<ExportState, FlowError> {
        match self
            .resolver
            .click(page, &plan.trigger, self.click_timeout)
            .await
        {
            Ok(_) => {}
            Err(source @ LocatorError::NotFound { .. }) => {
                return Err(self.fail(FlowError::TriggerNotFound { source }));
            }
            Err(source) => return Err(self.fail(FlowError::TriggerClickFailed { source })),
        }
        self.advance(page, ExportState::ExcelClicked).await;

        tokio::time::sleep(plan.dialog_wait).await;
        self.advance(page, ExportState::DialogShown).await;

        if let Err(tried) = self.confirm(page, plan).await {
            return Err(self.fail(FlowError::ConfirmationNotFound { tried }));
        }
        self.advance(page, ExportState::Confirmed).await;

        tokio::time::sleep(plan.settle).await;
        self.advance(page, ExportState::Done).await;
        Ok(self.state)
    }

    async fn confirm(&self, page: &dyn BrowserPage, plan: &ExportPlan) -> Result<(), Vec<String>> {
        let mut tried = Vec::new();
        for target in std::iter::once(&plan.confirm).chain(plan.confirm_fallbacks.iter()) {
            match self.resolver.click(page, target, self.click_timeout).await {
                Ok(resolution) => {
                    info!(target = %target.name, element = %resolution.element, "export confirmed");
                    return Ok(());
                }
                Err(LocatorError::NotFound { tried: more, .. }) => tried.extend(more),
                Err(err) => {
                    warn!(target = %target.name, error = %err, "confirmation click failed");
                    tried.push(target.name.clone());
                }
            }
        }
        Err(tried)
    }

    async fn advance(&mut self, page: &dyn BrowserPage, next: ExportState) {
        info!(from = %self.state, to = %next, "export transition");
        self.state = next;
        self.history.push(next);
        self.observer
            .on_transition(page, &format!("export_{}", next.name()))
            .await;
    }

    fn fail(&mut self, err: FlowError) -> FlowError {
        warn!(from = %self.state, error = %err, "export failed");
        self.state = ExportState::Failed;
        self.history.push(ExportState::Failed);
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use action_locator::{ChainResolver, Pick, SelectorCandidate};
    use cdp_adapter::fake::{FakeElement, FakePage};
    use l6_observe::NullObserver;

    fn plan() -> ExportPlan {
        ExportPlan {
            trigger: LogicalTarget::new("export-trigger").with_candidates([
                SelectorCandidate::attribute("title", "Excel").within("button"),
                SelectorCandidate::css(".excel-icon"),
            ]),
            confirm: LogicalTarget::new("confirm")
                .with_candidate(SelectorCandidate::contains("Aceptar").within("button"))
                .with_pick(Pick::Last),
            confirm_fallbacks: vec![LogicalTarget::new("confirm-fallback")
                .with_candidate(SelectorCandidate::css(".ui-confirmdialog-yes"))],
            dialog_wait: Duration::from_secs(3),
            settle: Duration::from_secs(3),
        }
    }

    fn resolver() -> ChainResolver {
        ChainResolver::new().with_probe_timeout(Duration::from_millis(5))
    }

    #[tokio::test(start_paused = true)]
    async fn confirms_with_the_last_aceptar() {
        let page = FakePage::with_elements([
            FakeElement::new("stale-ok", "button").with_text("Aceptar"),
            FakeElement::new("excel", "button")
                .with_attr("title", "Exportar a Excel")
                .reveals("dialog-ok"),
            FakeElement::new("dialog-ok", "button").with_text("Aceptar").hidden(),
        ]);
        let resolver = resolver();
        let mut machine = ExportMachine::new(&resolver, &NullObserver, Duration::from_secs(5));

        let state = machine.run(&page, &plan()).await.unwrap();

        assert_eq!(state, ExportState::Done);
        assert_eq!(page.clicks(), vec!["excel", "dialog-ok"]);
        assert_eq!(
            machine.history(),
            &[
                ExportState::Idle,
                ExportState::ExcelClicked,
                ExportState::DialogShown,
                ExportState::Confirmed,
                ExportState::Done,
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn missing_trigger_fails_from_idle() {
        let page = FakePage::with_elements([FakeElement::new("ok", "button").with_text("Aceptar")]);
        let resolver = resolver();
        let mut machine = ExportMachine::new(&resolver, &NullObserver, Duration::from_secs(5));

        let err = machine.run(&page, &plan()).await.unwrap_err();

        assert!(matches!(err, FlowError::TriggerNotFound { .. }));
        assert_eq!(machine.history(), &[ExportState::Idle, ExportState::Failed]);
        assert!(page.clicks().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn hidden_trailing_aceptar_does_not_divert_to_an_older_one() {
        let page = FakePage::with_elements([
            FakeElement::new("excel", "button").with_attr("title", "Exportar a Excel"),
            FakeElement::new("stale", "button").with_text("Aceptar"),
            FakeElement::new("front", "button").with_text("Aceptar"),
            FakeElement::new("template", "button").with_text("Aceptar").hidden(),
        ]);
        let resolver = resolver();
        let mut machine = ExportMachine::new(&resolver, &NullObserver, Duration::from_secs(5));

        assert_eq!(machine.run(&page, &plan()).await.unwrap(), ExportState::Done);
        assert_eq!(page.clicks(), vec!["excel", "front"]);
    }

    #[tokio::test(start_paused = true)]
    async fn unclickable_trigger_is_not_reported_as_missing() {
        let page = FakePage::with_elements([
            FakeElement::new("excel", "button").with_attr("title", "Exportar a Excel"),
        ]);
        page.fail_clicks_on("excel");
        let resolver = resolver();
        let mut machine = ExportMachine::new(&resolver, &NullObserver, Duration::from_secs(5));

        let err = machine.run(&page, &plan()).await.unwrap_err();

        assert!(matches!(err, FlowError::TriggerClickFailed { .. }));
        assert_eq!(machine.history(), &[ExportState::Idle, ExportState::Failed]);
    }

    #[tokio::test(start_paused = true)]
    async fn falls_back_when_no_aceptar_is_visible() {
        let page = FakePage::with_elements([
            FakeElement::new("excel", "i").matching(".excel-icon"),
            FakeElement::new("yes", "button").matching(".ui-confirmdialog-yes"),
        ]);
        let resolver = resolver();
        let mut machine = ExportMachine::new(&resolver, &NullObserver, Duration::from_secs(5));

        assert_eq!(machine.run(&page, &plan()).await.unwrap(), ExportState::Done);
        assert_eq!(page.clicks(), vec!["excel", "yes"]);
    }

    #[tokio::test(start_paused = true)]
    async fn no_confirmation_control_fails_after_dialog() {
        let page = FakePage::with_elements([FakeElement::new("excel", "i").matching(".excel-icon")]);
        let resolver = resolver();
        let mut machine = ExportMachine::new(&resolver, &NullObserver, Duration::from_secs(5));

        match machine.run(&page, &plan()).await.unwrap_err() {
            FlowError::ConfirmationNotFound { tried } => {
                assert_eq!(tried, vec!["button:text~\"Aceptar\"", "css=.ui-confirmdialog-yes"]);
            }
            other => panic!("expected ConfirmationNotFound, got {:?}", other),
        }
        assert_eq!(
            machine.history(),
            &[
                ExportState::Idle,
                ExportState::ExcelClicked,
                ExportState::DialogShown,
                ExportState::Failed,
            ]
        );
        assert!(machine.state().is_terminal());
    }
}
