//! YAML recipe files.
//!
//! A file holds either a single recipe or a `recipes:` list of them.

use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::catalog::Catalog;
use crate::errors::{RecError, RecErrorKind};
use crate::model::Recipe;

#[derive(Deserialize)]
#[serde(untagged)]
enum RecipeFile {
    Many { recipes: Vec<Recipe> },
    One(Box<Recipe>),
}

pub fn parse_recipes(source: &str, path: &Path) -> Result<Vec<Recipe>, RecError> {
    let parsed: RecipeFile = serde_yaml::from_str(source).map_err(|source| {
        RecError::new(RecErrorKind::Parse {
            path: path.to_path_buf(),
            source,
        })
    })?;
    Ok(match parsed {
        RecipeFile::Many { recipes } => recipes,
        RecipeFile::One(recipe) => vec![*recipe],
    })
}

pub fn load_file(path: &Path) -> Result<Vec<Recipe>, RecError> {
    let source = std::fs::read_to_string(path).map_err(|source| {
        RecError::new(RecErrorKind::Io {
            path: path.to_path_buf(),
            source,
        })
    })?;
    parse_recipes(&source, path)
}

/// Built-in recipes plus every recipe in `path`.
pub fn catalog_with_file(path: &Path) -> Result<Catalog, RecError> {
    let mut catalog = Catalog::with_builtins();
    let extra = load_file(path)?;
    let count = extra.len();
    catalog.extend(extra)?;
    info!(path = %path.display(), count, "loaded recipe file");
    Ok(catalog)
}
