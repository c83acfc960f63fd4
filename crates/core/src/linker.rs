//! Links notebook entries to graph words so expansion can reach them.

use serde::Serialize;
use tracing::{debug, info};

use crate::config::LinkingConfig;
use crate::error::Result;
use crate::graph::WordGraph;
use crate::language::Language;
use crate::models::{LinkKind, VocabularyEntry};
use crate::normalizer::TextNormalizer;
use crate::similarity::similarity;
use crate::store::VocabularyStore;

pub const SYNONYM_LINK_SCORE: f64 = 0.9;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LinkReport {
    pub entries: usize,
    pub exact: usize,
    pub synonym: usize,
    pub fuzzy: usize,
}

impl LinkReport {
    fn absorb(&mut self, other: LinkReport) {
        self.entries += other.entries;
        self.exact += other.exact;
        self.synonym += other.synonym;
        self.fuzzy += other.fuzzy;
    }
}

pub struct SynonymLinker<'a> {
    graph: &'a WordGraph,
    store: &'a dyn VocabularyStore,
    normalizer: &'a TextNormalizer,
    config: &'a LinkingConfig,
}

impl<'a> SynonymLinker<'a> {
    pub fn new(
        graph: &'a WordGraph,
        store: &'a dyn VocabularyStore,
        normalizer: &'a TextNormalizer,
        config: &'a LinkingConfig,
    ) -> Self {
        Self {
            graph,
            store,
            normalizer,
            config,
        }
    }

    pub async fn link_all(&self) -> Result<LinkReport> {
        let mut report = LinkReport::default();
        for entry in self.store.list_active().await? {
            report.absorb(self.link_entry(&entry).await?);
        }
        info!(
            "Linked {} entries: {} exact, {} synonym, {} fuzzy",
            report.entries, report.exact, report.synonym, report.fuzzy
        );
        Ok(report)
    }

    pub async fn link_entry(&self, entry: &VocabularyEntry) -> Result<LinkReport> {
        let mut report = LinkReport {
            entries: 1,
            ..LinkReport::default()
        };
        for (field, language) in [(&entry.english, Language::En), (&entry.chinese, Language::Zh)] {
            let term = self.normalizer.normalize(field, language);
            if term.is_empty() {
                continue;
            }
            let Some(id) = self.graph.lookup(&term, language) else {
                report.fuzzy += self.link_fuzzy(entry.id, &term, language, &[]).await?;
                continue;
            };
            self.store
                .attach_link(entry.id, &term, LinkKind::Exact, 1.0)
                .await?;
            report.exact += 1;

            let neighbors: Vec<&str> = self
                .graph
                .synonyms_of(id)
                .iter()
                .filter_map(|n| self.graph.word(*n))
                .map(|w| w.text.as_str())
                .collect();
            for neighbor in &neighbors {
                self.store
                    .attach_link(entry.id, neighbor, LinkKind::Synonym, SYNONYM_LINK_SCORE)
                    .await?;
                report.synonym += 1;
            }
            report.fuzzy += self.link_fuzzy(entry.id, &term, language, &neighbors).await?;
        }
        debug!("entry {} links: {:?}", entry.id, report);
        Ok(report)
    }

    /// Same-language graph words close to `term`, best first, capped.
    pub fn fuzzy_candidates(&self, term: &str, language: Language, exclude: &[&str]) -> Vec<(String, f64)> {
        let mut candidates: Vec<(String, f64)> = self
            .graph
            .words()
            .filter(|(_, w)| w.language == language && w.text != term)
            .filter(|(_, w)| !exclude.contains(&w.text.as_str()))
            .map(|(_, w)| (w.text.clone(), similarity(term, &w.text)))
            .filter(|(_, score)| *score >= self.config.fuzzy_threshold)
            .collect();
        candidates.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        candidates.truncate(self.config.max_fuzzy_links);
        candidates
    }

    async fn link_fuzzy(
        &self,
        entry_id: i64,
        term: &str,
        language: Language,
        exclude: &[&str],
    ) -> Result<usize> {
        let candidates = self.fuzzy_candidates(term, language, exclude);
        for (text, score) in &candidates {
            self.store
                .attach_link(entry_id, text, LinkKind::Fuzzy, *score)
                .await?;
        }
        Ok(candidates.len())
    }
}
