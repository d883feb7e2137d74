use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ObserveError {
    #[error("screenshot directory {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
