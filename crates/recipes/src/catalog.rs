//! Built-in report recipes and lookup.

use std::collections::BTreeMap;

use action_gate::{DialogField, FieldMatcher, FilterSpec};
use tracing::debug;

use crate::errors::{RecError, RecErrorKind};
use crate::model::{
    DialogRecipe, ExportRecipe, NavStep, Recipe, RecipeId, ZoomSpec, QUARTER_END, QUARTER_START,
};
use crate::targets;

const YES_EQUIVALENTS: [&str; 4] = ["sí", "si", "yes", "s"];
const NO_EQUIVALENTS: [&str; 1] = ["no"];

fn step(target: action_locator::LogicalTarget, settle_ms: u64) -> NavStep {
    NavStep { target, settle_ms }
}

fn empresas_path() -> Vec<NavStep> {
    vec![
        step(targets::crm_menu(), 2_000),
        step(targets::submenu("Clientes"), 2_000),
        step(targets::submenu("Empresas"), 3_000),
    ]
}

fn tareas_path(view: &str) -> Vec<NavStep> {
    vec![
        step(targets::crm_menu(), 2_000),
        step(targets::submenu("Tareas"), 2_000),
        step(targets::submenu(view), 3_000),
    ]
}

fn standard_export() -> ExportRecipe {
    ExportRecipe {
        trigger: targets::excel_trigger(),
        confirm: targets::confirm_last(),
        confirm_fallbacks: targets::confirm_fallbacks(),
        dialog_wait_ms: 3_000,
        settle_ms: 3_000,
    }
}

fn zoom_for(column: &str) -> Option<ZoomSpec> {
    Some(ZoomSpec {
        factor: 0.8,
        probe_column: Some(column.to_string()),
        settle_ms: 2_000,
    })
}

pub fn empresas_cualificadas() -> Recipe {
    Recipe {
        id: RecipeId::from("empresas-cualificadas"),
        title: "Empresas cualificadas".to_string(),
        description: "Companies with Cualificado = Sí".to_string(),
        navigation: empresas_path(),
        zoom: zoom_for("Cualificado"),
        filters: vec![FilterSpec::new("Cualificado", "Sí")
            .with_equivalents(YES_EQUIVALENTS)
            .with_blur(true)],
        filter_settle_ms: None,
        dialog_filter: None,
        export: standard_export(),
    }
}

pub fn autonomos_no_cualificados() -> Recipe {
    Recipe {
        id: RecipeId::from("autonomos-no-cualificados"),
        title: "Autónomos no cualificados".to_string(),
        description: "Self-employed clients with Cualificado = No".to_string(),
        navigation: empresas_path(),
        zoom: zoom_for("Cualificado"),
        filters: vec![
            FilterSpec::new("Cualificado", "No").with_equivalents(NO_EQUIVALENTS),
            FilterSpec::new("Tipo", "Autónomo").with_equivalents(["autonomo"]),
        ],
        filter_settle_ms: None,
        dialog_filter: None,
        export: standard_export(),
    }
}

pub fn tareas_futuras() -> Recipe {
    Recipe {
        id: RecipeId::from("tareas-futuras"),
        title: "Tareas futuras".to_string(),
        description: "Scheduled tasks, unfiltered".to_string(),
        navigation: tareas_path("Futuras"),
        zoom: None,
        filters: Vec::new(),
        filter_settle_ms: None,
        dialog_filter: None,
        export: standard_export(),
    }
}

pub fn tareas_cerradas_q0() -> Recipe {
    Recipe {
        id: RecipeId::from("tareas-cerradas-q0"),
        title: "Tareas cerradas (trimestre actual)".to_string(),
        description: "Closed tasks whose start date falls in the current quarter".to_string(),
        navigation: tareas_path("Cerradas"),
        zoom: None,
        filters: Vec::new(),
        filter_settle_ms: None,
        dialog_filter: Some(DialogRecipe {
            open: targets::tasks_filter_button(),
            clear: vec![FieldMatcher::containing("fecha_fin")],
            fields: vec![
                DialogField {
                    matcher: FieldMatcher::containing("fecha_inicio").excluding("fin"),
                    value: QUARTER_START.to_string(),
                },
                DialogField {
                    matcher: FieldMatcher::containing("fecha_inicio").and_containing("fin"),
                    value: QUARTER_END.to_string(),
                },
            ],
            submit: targets::tasks_filter_submit(),
            quarter_offset: 0,
            open_settle_ms: 2_000,
            fill_settle_ms: 1_000,
            submit_settle_ms: 5_000,
        }),
        export: standard_export(),
    }
}

pub fn builtin() -> Vec<Recipe> {
    vec![
        empresas_cualificadas(),
        autonomos_no_cualificados(),
        tareas_futuras(),
        tareas_cerradas_q0(),
    ]
}

/// Recipes keyed by id; ids are unique across built-ins and loaded files.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    recipes: BTreeMap<RecipeId, Recipe>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtins() -> Self {
        let mut catalog = Self::new();
        for recipe in builtin() {
            catalog.recipes.insert(recipe.id.clone(), recipe);
        }
        catalog
    }

    /// Validate and add a recipe, rejecting duplicate ids.
    pub fn insert(&mut self, recipe: Recipe) -> Result<(), RecError> {
        recipe.validate()?;
        if self.recipes.contains_key(&recipe.id) {
            return Err(RecErrorKind::Duplicate(recipe.id.0.clone()).into());
        }
        debug!(recipe = %recipe.id, "recipe registered");
        self.recipes.insert(recipe.id.clone(), recipe);
        Ok(())
    }

    pub fn extend(&mut self, recipes: impl IntoIterator<Item = Recipe>) -> Result<(), RecError> {
        for recipe in recipes {
            self.insert(recipe)?;
        }
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<&Recipe, RecError> {
        self.recipes
            .get(&RecipeId::from(id))
            .ok_or_else(|| RecErrorKind::NotFound(id.to_string()).into())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Recipe> {
        self.recipes.values()
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }
}
