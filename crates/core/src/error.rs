use std::path::PathBuf;
use thiserror::Error;

use crate::graph::GraphError;

#[derive(Debug, Error)]
pub enum NotebookError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("corpus source unavailable: {path}: {source}")]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error("config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, NotebookError>;
