//! Recipe data model.
//!
//! Recipes are plain data; durations are stored in milliseconds so the YAML
//! form stays readable. Conversion methods build the flow and gate types the
//! pipeline runs.

use std::fmt;
use std::time::Duration;

use action_flow::{ExportPlan, NavigationStep};
use action_gate::{DialogField, DialogFilterSpec, FieldMatcher, FilterSpec, FilterTiming};
use action_locator::LogicalTarget;
use serde::{Deserialize, Serialize};

use crate::errors::RecError;
use crate::quarter::Quarter;

/// Placeholder replaced by the first day of the selected quarter.
pub const QUARTER_START: &str = "{quarter_start}";
/// Placeholder replaced by the last day of the selected quarter.
pub const QUARTER_END: &str = "{quarter_end}";

#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecipeId(pub String);

impl RecipeId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecipeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecipeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

fn nav_settle_ms() -> u64 {
    2_000
}

fn zoom_settle_ms() -> u64 {
    2_000
}

fn dialog_wait_ms() -> u64 {
    3_000
}

fn export_settle_ms() -> u64 {
    3_000
}

fn open_settle_ms() -> u64 {
    2_000
}

fn fill_settle_ms() -> u64 {
    1_000
}

fn submit_settle_ms() -> u64 {
    5_000
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavStep {
    pub target: LogicalTarget,
    #[serde(default = "nav_settle_ms")]
    pub settle_ms: u64,
}

/// Page zoom applied before filtering so every filter column fits on screen.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ZoomSpec {
    pub factor: f64,
    /// Column header the table probe reports on
    #[serde(default)]
    pub probe_column: Option<String>,
    #[serde(default = "zoom_settle_ms")]
    pub settle_ms: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogRecipe {
    pub open: LogicalTarget,
    #[serde(default)]
    pub clear: Vec<FieldMatcher>,
    /// Values may use the quarter placeholders
    pub fields: Vec<DialogField>,
    pub submit: LogicalTarget,
    /// 0 is the current quarter, -1 the previous one
    #[serde(default)]
    pub quarter_offset: i32,
    #[serde(default = "open_settle_ms")]
    pub open_settle_ms: u64,
    #[serde(default = "fill_settle_ms")]
    pub fill_settle_ms: u64,
    #[serde(default = "submit_settle_ms")]
    pub submit_settle_ms: u64,
}

impl DialogRecipe {
    /// Concrete form values for `quarter`.
    pub fn render(&self, quarter: &Quarter) -> DialogFilterSpec {
        let fields = self
            .fields
            .iter()
            .map(|field| DialogField {
                matcher: field.matcher.clone(),
                value: field
                    .value
                    .replace(QUARTER_START, &quarter.start_text())
                    .replace(QUARTER_END, &quarter.end_text()),
            })
            .collect();
        DialogFilterSpec {
            open: self.open.clone(),
            clear: self.clear.clone(),
            fields,
            submit: self.submit.clone(),
            open_settle: Duration::from_millis(self.open_settle_ms),
            fill_settle: Duration::from_millis(self.fill_settle_ms),
            submit_settle: Duration::from_millis(self.submit_settle_ms),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRecipe {
    pub trigger: LogicalTarget,
    pub confirm: LogicalTarget,
    #[serde(default)]
    pub confirm_fallbacks: Vec<LogicalTarget>,
    #[serde(default = "dialog_wait_ms")]
    pub dialog_wait_ms: u64,
    #[serde(default = "export_settle_ms")]
    pub settle_ms: u64,
}

impl ExportRecipe {
    pub fn plan(&self) -> ExportPlan {
        ExportPlan {
            trigger: self.trigger.clone(),
            confirm: self.confirm.clone(),
            confirm_fallbacks: self.confirm_fallbacks.clone(),
            dialog_wait: Duration::from_millis(self.dialog_wait_ms),
            settle: Duration::from_millis(self.settle_ms),
        }
    }
}

/// One report variant: where it lives, how it is filtered and how it is exported.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: RecipeId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub navigation: Vec<NavStep>,
    #[serde(default)]
    pub zoom: Option<ZoomSpec>,
    #[serde(default)]
    pub filters: Vec<FilterSpec>,
    /// Overrides the default settle before a filter value is read back
    #[serde(default)]
    pub filter_settle_ms: Option<u64>,
    #[serde(default)]
    pub dialog_filter: Option<DialogRecipe>,
    pub export: ExportRecipe,
}

impl Recipe {
    pub fn navigation_steps(&self) -> Vec<NavigationStep> {
        self.navigation
            .iter()
            .map(|step| NavigationStep::new(step.target.clone(), Duration::from_millis(step.settle_ms)))
            .collect()
    }

    pub fn filter_timing(&self) -> FilterTiming {
        let timing = FilterTiming::default();
        match self.filter_settle_ms {
            Some(ms) => timing.with_settle(Duration::from_millis(ms)),
            None => timing,
        }
    }

    /// Human-readable navigation path, e.g. `CRM › Clientes › Empresas`
    pub fn path(&self) -> String {
        self.navigation
            .iter()
            .map(|step| {
                step.target
                    .name
                    .strip_prefix("nav:")
                    .unwrap_or(&step.target.name)
                    .to_string()
            })
            .collect::<Vec<_>>()
            .join(" › ")
    }

    /// Structural checks run on every recipe before it is accepted.
    pub fn validate(&self) -> Result<(), RecError> {
        let id = self.id.as_str();
        if id.trim().is_empty() {
            return Err(RecError::invalid(id, "empty id"));
        }
        if self.navigation.is_empty() {
            return Err(RecError::invalid(id, "navigation path is empty"));
        }

        let mut targets: Vec<&LogicalTarget> =
            self.navigation.iter().map(|step| &step.target).collect();
        targets.push(&self.export.trigger);
        targets.push(&self.export.confirm);
        targets.extend(self.export.confirm_fallbacks.iter());
        if let Some(dialog) = &self.dialog_filter {
            targets.push(&dialog.open);
            targets.push(&dialog.submit);
        }
        if let Some(empty) = targets.iter().find(|target| target.candidates.is_empty()) {
            return Err(RecError::invalid(
                id,
                format!("target '{}' has no candidates", empty.name),
            ));
        }

        if let Some(zoom) = &self.zoom {
            if !(zoom.factor > 0.0 && zoom.factor <= 4.0) {
                return Err(RecError::invalid(
                    id,
                    format!("zoom factor {} outside (0, 4]", zoom.factor),
                ));
            }
        }

        if let Some(filter) = self
            .filters
            .iter()
            .find(|filter| filter.field_label.trim().is_empty())
        {
            return Err(RecError::invalid(
                id,
                format!("filter for value '{}' has no field label", filter.desired_value),
            ));
        }
        Ok(())
    }
}
