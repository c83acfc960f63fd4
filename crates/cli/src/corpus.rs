//! `init` and `build-graph` commands.

use std::path::Path;

use anyhow::Context;
use notebook_core::ingest::{GraphBuilder, IngestReport};
use notebook_core::linker::{LinkReport, SynonymLinker};
use notebook_core::store::{PersistCounts, VocabularyStore};
use serde::Serialize;
use storage::InitOutcome;
use tracing::{info, warn};

use crate::notebook::Notebook;

/// Creates the schema at `db`. The seed dump is loaded only into a database
/// that did not exist before, or after `rebuild` removed it.
pub async fn run_init(db: &str, seed: Option<&Path>, rebuild: bool) -> anyhow::Result<InitOutcome> {
    if let Some(seed) = seed {
        if !seed.exists() {
            anyhow::bail!("seed dump {} not found", seed.display());
        }
    }
    let (pool, outcome) = storage::init_database(db, seed, rebuild)
        .await
        .with_context(|| format!("initialize {}", db))?;
    pool.close().await;
    info!(
        "Initialized {} (created: {}, seeded: {})",
        db, outcome.created, outcome.seeded
    );
    Ok(outcome)
}

#[derive(Debug, Clone, Serialize)]
pub struct BuildSummary {
    pub ingest: IngestReport,
    pub persisted: PersistCounts,
    pub links: LinkReport,
}

/// Ingests every configured corpus source, persists the graph, then links
/// the active entries to it.
pub async fn build_graph(nb: &Notebook) -> anyhow::Result<BuildSummary> {
    let sources = &nb.config.corpus.sources;
    if sources.is_empty() {
        warn!("No corpus sources configured; persisting an empty graph");
    }
    let (graph, ingest) = GraphBuilder::build(&nb.normalizer, sources);
    let persisted = nb
        .store
        .persist_graph(&graph, nb.config.corpus.synonym_score)
        .await
        .context("persist word graph")?;
    // Edges from earlier builds and recorded entries are linked too.
    let graph = nb.graph().await?;
    let linker = SynonymLinker::new(&graph, &nb.store, &nb.normalizer, &nb.config.linking);
    let links = linker.link_all().await.context("link entries")?;
    Ok(BuildSummary {
        ingest,
        persisted,
        links,
    })
}
