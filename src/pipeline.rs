//! One report run: login, navigation, preparation, filters, export.

use std::fmt;
use std::time::Duration;

use action_flow::{ExportMachine, ExportState, NavigationSequencer};
use action_gate::{Applied, DialogApplied, DialogFilterApplicator, FilterApplicator};
use action_locator::ChainResolver;
use cdp_adapter::BrowserPage;
use chrono::{Local, NaiveDate};
use crm_recipes::{DialogRecipe, Quarter, Recipe, RecipeId};
use l6_observe::{run_span, stage_span, TransitionObserver};
use tokio::time::Instant;
use tracing::{error, info, Instrument};

use crate::config::RunConfig;
use crate::errors::RunError;
use crate::login::Login;
use crate::prepare::{prepare_page, TableProbe};

/// What a successful run did, printed for the operator.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub recipe: RecipeId,
    pub title: String,
    pub path: String,
    pub navigation_steps: usize,
    pub table: Option<TableProbe>,
    pub filters: Vec<Applied>,
    pub quarter: Option<Quarter>,
    pub dialog: Option<DialogApplied>,
    pub export: Vec<ExportState>,
    pub elapsed: Duration,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Report:   {} ({})", self.title, self.recipe)?;
        writeln!(f, "Path:     {} ({} steps)", self.path, self.navigation_steps)?;
        if self.filters.is_empty() {
            writeln!(f, "Filters:  none")?;
        }
        for applied in &self.filters {
            writeln!(
                f,
                "Filter:   {} = {} (pass {})",
                applied.field, applied.value, applied.passes
            )?;
        }
        if let Some(quarter) = &self.quarter {
            writeln!(f, "Range:    {}", quarter)?;
        }
        let states: Vec<&str> = self.export.iter().map(ExportState::name).collect();
        writeln!(f, "Export:   {}", states.join(" -> "))?;
        writeln!(
            f,
            "Elapsed:  {}",
            humantime::format_duration(Duration::from_secs(self.elapsed.as_secs()))
        )?;
        write!(f, "The export was requested; the CRM delivers the file by email.")
    }
}

pub struct ReportRunner<'a> {
    recipe: &'a Recipe,
    config: &'a RunConfig,
    observer: &'a dyn TransitionObserver,
    resolver: ChainResolver,
    quarter_offset: Option<i32>,
    today: NaiveDate,
}

impl<'a> ReportRunner<'a> {
    pub fn new(
        recipe: &'a Recipe,
        config: &'a RunConfig,
        observer: &'a dyn TransitionObserver,
    ) -> Self {
        Self {
            recipe,
            config,
            observer,
            resolver: ChainResolver::new(),
            quarter_offset: None,
            today: Local::now().date_naive(),
        }
    }

    pub fn with_resolver(mut self, resolver: ChainResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Override the recipe's quarter offset for date-range dialogs.
    pub fn with_quarter_offset(mut self, offset: Option<i32>) -> Self {
        self.quarter_offset = offset;
        self
    }

    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Run every stage; on failure a final screenshot is taken before returning.
    pub async fn run(&self, page: &dyn BrowserPage) -> Result<RunSummary, RunError> {
        let outcome = self
            .stages(page)
            .instrument(run_span(self.recipe.id.as_str()))
            .await;
        if let Err(err) = &outcome {
            error!(recipe = %self.recipe.id, stage = err.stage(), error = %err, "run failed");
            self.observer.on_transition(page, "error_final").await;
        }
        outcome
    }

    fn quarter_for(&self, dialog: &DialogRecipe) -> Quarter {
        let offset = self.quarter_offset.unwrap_or(dialog.quarter_offset);
        Quarter::containing(self.today).offset(offset)
    }

    async fn stages(&self, page: &dyn BrowserPage) -> Result<RunSummary, RunError> {
        let started = Instant::now();
        let recipe = self.recipe;
        let timeout = self.config.timeout;
        info!(recipe = %recipe.id, path = %recipe.path(), "run started");

        Login::new(
            &self.config.url,
            &self.config.credentials,
            self.observer,
            timeout,
        )
        .run(page, &self.config.retry_policy())
        .instrument(stage_span("login"))
        .await?;

        let reached = NavigationSequencer::new(&self.resolver, self.observer, timeout)
            .navigate(page, &recipe.navigation_steps())
            .instrument(stage_span("navigation"))
            .await?;

        let table = match &recipe.zoom {
            Some(zoom) => {
                prepare_page(page, zoom, self.observer)
                    .instrument(stage_span("prepare"))
                    .await?
            }
            None => None,
        };

        let applicator = FilterApplicator::new(&self.resolver, self.observer, timeout)
            .with_timing(recipe.filter_timing());
        let mut filters = Vec::with_capacity(recipe.filters.len());
        for spec in &recipe.filters {
            let applied = applicator
                .apply(page, spec)
                .instrument(stage_span("filter"))
                .await?;
            filters.push(applied);
        }

        let (quarter, dialog) = match &recipe.dialog_filter {
            Some(dialog) => {
                let quarter = self.quarter_for(dialog);
                info!(quarter = %quarter, "dialog filter range");
                let applied = DialogFilterApplicator::new(&self.resolver, self.observer, timeout)
                    .apply(page, &dialog.render(&quarter))
                    .instrument(stage_span("dialog_filter"))
                    .await?;
                (Some(quarter), Some(applied))
            }
            None => (None, None),
        };

        let mut machine = ExportMachine::new(&self.resolver, self.observer, timeout);
        machine
            .run(page, &recipe.export.plan())
            .instrument(stage_span("export"))
            .await?;

        let summary = RunSummary {
            recipe: recipe.id.clone(),
            title: recipe.title.clone(),
            path: recipe.path(),
            navigation_steps: reached.steps,
            table,
            filters,
            quarter,
            dialog,
            export: machine.history().to_vec(),
            elapsed: started.elapsed(),
        };
        info!(recipe = %recipe.id, elapsed_ms = summary.elapsed.as_millis() as u64, "run finished");
        Ok(summary)
    }
}
