//! Ranked search over notebook entries and, optionally, stored graph edges.

use std::collections::BTreeSet;

use tracing::debug;

use crate::error::Result;
use crate::expander::QueryExpander;
use crate::graph::WordGraph;
use crate::language::{Language, LanguageHint, QueryLanguage};
use crate::models::{HitSource, SearchHit, VocabularyEntry};
use crate::normalizer::TextNormalizer;
use crate::similarity::bigram_overlap_score;
use crate::store::VocabularyStore;

const DEFAULT_EXPANSION_WEIGHT: f64 = 0.9;

/// A term to score against, and the weight its matches carry.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedTerm {
    pub text: String,
    pub weight: f64,
}

pub struct SearchEngine<'a> {
    graph: &'a WordGraph,
    store: &'a dyn VocabularyStore,
    normalizer: &'a TextNormalizer,
    expansion_weight: f64,
}

impl<'a> SearchEngine<'a> {
    pub fn new(
        graph: &'a WordGraph,
        store: &'a dyn VocabularyStore,
        normalizer: &'a TextNormalizer,
    ) -> Self {
        Self {
            graph,
            store,
            normalizer,
            expansion_weight: DEFAULT_EXPANSION_WEIGHT,
        }
    }

    pub fn with_expansion_weight(mut self, weight: f64) -> Self {
        self.expansion_weight = weight;
        self
    }

    fn expander(&self) -> QueryExpander<'_> {
        QueryExpander::new(self.graph, self.store, self.normalizer)
    }

    pub async fn search(
        &self,
        query: &str,
        hint: LanguageHint,
        topk: usize,
        include_graph_sources: bool,
    ) -> Result<Vec<SearchHit>> {
        if topk == 0 {
            return Ok(Vec::new());
        }
        let language = hint.resolve(query);
        let terms = self.weighted_terms(query, language).await?;

        let mut hits = Vec::new();
        if !terms.is_empty() {
            for entry in self.store.list_active().await? {
                if let Some(hit) = self.score_entry(&entry, &terms, language) {
                    hits.push(hit);
                }
            }
        }
        let user_hits = hits.len();

        if include_graph_sources {
            for row in self
                .store
                .search_translation_edges(query, language, topk)
                .await?
            {
                hits.push(SearchHit {
                    score: row.score,
                    source: HitSource::TranslationEdge,
                    english: row.en_term,
                    chinese: row.zh_term,
                    detail: format!("source={}", row.source),
                });
            }
            for row in self.store.search_synonym_edges(query, language, topk).await? {
                hits.push(SearchHit {
                    score: row.score,
                    source: HitSource::SynonymEdge,
                    english: row.left_term,
                    chinese: row.right_term,
                    detail: format!("lang={}", row.language),
                });
            }
        }
        debug!(
            "search {:?} ({:?}): {} user hits, {} graph hits",
            query,
            language,
            user_hits,
            hits.len() - user_hits
        );
        Ok(rank(hits, topk))
    }

    /// Entries whose field exactly equals the query or one of its expansions.
    pub async fn lookup(&self, query: &str, hint: LanguageHint) -> Result<Vec<VocabularyEntry>> {
        let language = hint.resolve(query);
        let terms = self.expander().expand_all(query, language).await?;
        self.store.search_by_terms(&terms, language).await
    }

    async fn weighted_terms(&self, query: &str, language: QueryLanguage) -> Result<Vec<WeightedTerm>> {
        let originals: BTreeSet<String> = language
            .languages()
            .into_iter()
            .map(|lang| self.normalizer.normalize(query, lang))
            .filter(|q| !q.is_empty())
            .collect();
        let expanded = self.expander().expand_all(query, language).await?;
        Ok(expanded
            .into_iter()
            .map(|text| {
                let weight = if originals.contains(&text) {
                    1.0
                } else {
                    self.expansion_weight
                };
                WeightedTerm { text, weight }
            })
            .collect())
    }

    /// Best weighted bigram score of `entry` against `terms`, or None when
    /// nothing overlaps.
    pub fn score_entry(
        &self,
        entry: &VocabularyEntry,
        terms: &[WeightedTerm],
        language: QueryLanguage,
    ) -> Option<SearchHit> {
        let fields = self.fields_in_order(entry, language);
        let mut best: Option<(f64, &str, &str)> = None;
        for term in terms {
            for (name, value) in &fields {
                let score = term.weight * bigram_overlap_score(&term.text, value);
                if score > best.map_or(0.0, |b| b.0) {
                    best = Some((score, *name, term.text.as_str()));
                }
            }
        }
        let (score, field, via) = best?;
        let mut detail = format!("id={} field={}", entry.id, field);
        if terms.iter().any(|t| t.text == via && t.weight < 1.0) {
            detail.push_str(&format!(" via={via}"));
        }
        Some(SearchHit {
            score,
            source: HitSource::UserEntry,
            english: entry.english.clone(),
            chinese: entry.chinese.clone(),
            detail,
        })
    }

    /// The query language's own field first, then its meaning, then the other
    /// language's field and meaning. A mixed query sees one concatenated field.
    fn fields_in_order(
        &self,
        entry: &VocabularyEntry,
        language: QueryLanguage,
    ) -> Vec<(&'static str, String)> {
        let field = |lang: Language| match lang {
            Language::En => ("english", self.normalizer.normalize(&entry.english, lang)),
            Language::Zh => ("chinese", self.normalizer.normalize(&entry.chinese, lang)),
        };
        let meaning = |lang: Language| match lang {
            Language::En => (
                "meaning_en",
                self.normalizer
                    .normalize(entry.meaning_en.as_deref().unwrap_or_default(), lang),
            ),
            Language::Zh => (
                "meaning_zh",
                self.normalizer
                    .normalize(entry.meaning_zh.as_deref().unwrap_or_default(), lang),
            ),
        };
        let fields = match language {
            QueryLanguage::One(lang) => vec![
                field(lang),
                meaning(lang),
                field(lang.other()),
                meaning(lang.other()),
            ],
            QueryLanguage::Both => {
                let joined = [
                    field(Language::En),
                    field(Language::Zh),
                    meaning(Language::En),
                    meaning(Language::Zh),
                ]
                .into_iter()
                .map(|(_, value)| value)
                .filter(|value| !value.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
                vec![("all", joined)]
            }
        };
        fields.into_iter().filter(|(_, v)| !v.is_empty()).collect()
    }
}

/// Sorts by score, highest first, keeping merge order among equal scores,
/// then keeps at most `topk` hits.
pub fn rank(mut hits: Vec<SearchHit>, topk: usize) -> Vec<SearchHit> {
    hits.sort_by(|a, b| b.score.total_cmp(&a.score));
    hits.truncate(topk);
    hits
}
