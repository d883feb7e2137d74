//! Report recipes.
//!
//! Report variants differ only in navigation path, filter set and export
//! targets, so each one is described as data and run by the same pipeline.

pub mod catalog;
pub mod errors;
pub mod loader;
pub mod model;
pub mod quarter;
pub mod targets;

pub use catalog::{builtin, Catalog};
pub use errors::{RecError, RecErrorKind};
pub use loader::{catalog_with_file, load_file, parse_recipes};
pub use model::{DialogRecipe, ExportRecipe, NavStep, Recipe, RecipeId, ZoomSpec};
pub use quarter::Quarter;
