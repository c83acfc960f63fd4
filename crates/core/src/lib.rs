//! Core library: normalization, similarity, the word graph, the vocabulary
//! store and ranked search.

pub mod config;
pub mod error;
pub mod expander;
pub mod graph;
pub mod ingest;
pub mod language;
pub mod linker;
pub mod models;
pub mod normalizer;
pub mod search;
pub mod similarity;
pub mod store;

pub use error::{NotebookError, Result};
