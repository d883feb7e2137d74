//! Navigation sequencer: click through a fixed menu path.

use crate::errors::FlowError;
use action_locator::{ElementResolver, LogicalTarget};
use cdp_adapter::BrowserPage;
use l6_observe::TransitionObserver;
use std::time::Duration;
use tracing::info;

/// One hop of a navigation path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationStep {
    pub target: LogicalTarget,
    /// Wait after the click for the next view to render
    pub settle: Duration,
}

impl NavigationStep {
    pub fn new(target: LogicalTarget, settle: Duration) -> Self {
        Self { target, settle }
    }
}

/// Proof that every step of a path was clicked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reached {
    pub steps: usize,
}

/// Walks navigation steps in order, with no backtracking
pub struct NavigationSequencer<'a> {
    resolver: &'a dyn ElementResolver,
    observer: &'a dyn TransitionObserver,
    click_timeout: Duration,
}

impl<'a> NavigationSequencer<'a> {
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

    /// Click every step; the first failing step aborts the sequence.
    pub async fn navigate(
        &self,
        page: &dyn BrowserPage,
        steps: &[NavigationStep],
    ) -> Result<Reached, FlowError> {
        for (index, step) in steps.iter().enumerate() {
            let number = index + 1;
            self.resolver
                .click(page, &step.target, self.click_timeout)
                .await
                .map_err(|source| FlowError::NavigationFailed {
                    step: number,
                    target: step.target.name.clone(),
                    source,
                })?;

            info!(step = number, target = %step.target.name, "navigation step clicked");
            tokio::time::sleep(step.settle).await;
            self.observer
                .on_transition(page, &format!("nav_{:02}_{}", number, step.target.name))
                .await;
        }
        Ok(Reached { steps: steps.len() })
    }
}
