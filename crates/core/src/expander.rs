//! One-hop query expansion over the word graph and stored links.

use std::collections::BTreeSet;

use tracing::debug;

use crate::error::Result;
use crate::graph::WordGraph;
use crate::language::{detect_language, Language, QueryLanguage};
use crate::normalizer::TextNormalizer;
use crate::store::VocabularyStore;

pub struct QueryExpander<'a> {
    graph: &'a WordGraph,
    store: &'a dyn VocabularyStore,
    normalizer: &'a TextNormalizer,
}

impl<'a> QueryExpander<'a> {
    pub fn new(
        graph: &'a WordGraph,
        store: &'a dyn VocabularyStore,
        normalizer: &'a TextNormalizer,
    ) -> Self {
        Self {
            graph,
            store,
            normalizer,
        }
    }

    /// The normalized query, its same-language graph synonyms and the terms
    /// one stored link away. Neighbors of neighbors are never followed.
    pub async fn expand(&self, query: &str, language: Language) -> Result<BTreeSet<String>> {
        let mut terms = BTreeSet::new();
        let query = self.normalizer.normalize(query, language);
        if query.is_empty() {
            return Ok(terms);
        }
        for neighbor in self.graph.neighbor_texts(&query, language) {
            terms.insert(neighbor.to_string());
        }
        for linked in self.store.linked_terms(&query, language).await? {
            if detect_language(&linked) != language {
                continue;
            }
            let linked = self.normalizer.normalize(&linked, language);
            if !linked.is_empty() {
                terms.insert(linked);
            }
        }
        debug!("expanded {:?} to {} terms", query, terms.len() + 1);
        terms.insert(query);
        Ok(terms)
    }

    /// Union of `expand` over every language of `language`.
    pub async fn expand_all(&self, query: &str, language: QueryLanguage) -> Result<BTreeSet<String>> {
        let mut terms = BTreeSet::new();
        for lang in language.languages() {
            terms.extend(self.expand(query, lang).await?);
        }
        Ok(terms)
    }
}
