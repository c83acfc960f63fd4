//! Opened notebook state shared by every command.

use anyhow::Context;
use notebook_core::config::AppConfig;
use notebook_core::graph::WordGraph;
use notebook_core::normalizer::TextNormalizer;
use notebook_core::store::{SqliteVocabularyStore, VocabularyStore};
use tracing::debug;

pub struct Notebook {
    pub config: AppConfig,
    pub store: SqliteVocabularyStore,
    pub normalizer: TextNormalizer,
}

impl Notebook {
    /// Opens the database named by `config.database.path`, applying the schema
    /// if it is missing.
    pub async fn open(config: AppConfig) -> anyhow::Result<Self> {
        let store = SqliteVocabularyStore::open(&config.database.path)
            .await
            .with_context(|| format!("open notebook {}", config.database.path))?;
        Ok(Self {
            config,
            store,
            normalizer: TextNormalizer::new(),
        })
    }

    /// The word graph as last persisted by `build-graph`.
    pub async fn graph(&self) -> anyhow::Result<WordGraph> {
        let graph = self.store.load_graph().await.context("load word graph")?;
        debug!(
            "loaded graph: {} words, {} synonym edges",
            graph.word_count(),
            graph.synonym_edge_count()
        );
        Ok(graph)
    }
}
