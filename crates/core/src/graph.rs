//! In-memory word graph.
//!
//! One arena (`words`) owns every node; edges refer to nodes by `WordId`.
//! Nodes are never removed, so an id stays valid for the graph's lifetime.

use std::collections::{HashMap, HashSet};

use storage::models::{SynonymEdgeRow, TranslationEdgeRow};
use thiserror::Error;
use tracing::debug;

use crate::language::Language;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WordId(u32);

impl WordId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Word {
    pub text: String,
    pub language: Language,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TranslationEdge {
    pub en: WordId,
    pub zh: WordId,
    pub score: f64,
    pub source: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("empty word")]
    EmptyWord,
    #[error("self-loop on {0:?}")]
    SelfLoop(WordId),
    #[error("synonym edge must join words of the same language")]
    CrossLanguageSynonym,
    #[error("translation edge must join an English and a Chinese word")]
    SameLanguageTranslation,
    #[error("unknown word id {0:?}")]
    UnknownWord(WordId),
}

#[derive(Debug, Default, Clone)]
pub struct WordGraph {
    words: Vec<Word>,
    index: HashMap<(Language, String), WordId>,
    synonyms: Vec<Vec<WordId>>,
    synonym_pairs: HashSet<(WordId, WordId)>,
    translations: Vec<TranslationEdge>,
    translation_index: HashMap<(WordId, WordId, String), usize>,
    translations_by_word: Vec<Vec<usize>>,
}

impl WordGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get-or-create the node for already-normalized `text`.
    pub fn intern(&mut self, text: &str, language: Language) -> Result<WordId, GraphError> {
        if text.is_empty() {
            return Err(GraphError::EmptyWord);
        }
        if let Some(id) = self.index.get(&(language, text.to_string())) {
            return Ok(*id);
        }
        let id = WordId(self.words.len() as u32);
        self.words.push(Word {
            text: text.to_string(),
            language,
        });
        self.synonyms.push(Vec::new());
        self.translations_by_word.push(Vec::new());
        self.index.insert((language, text.to_string()), id);
        Ok(id)
    }

    pub fn lookup(&self, text: &str, language: Language) -> Option<WordId> {
        self.index.get(&(language, text.to_string())).copied()
    }

    pub fn word(&self, id: WordId) -> Option<&Word> {
        self.words.get(id.index())
    }

    fn checked(&self, id: WordId) -> Result<&Word, GraphError> {
        self.word(id).ok_or(GraphError::UnknownWord(id))
    }

    /// Inserts the directed edge `from -> to`. Returns false when it already existed.
    pub fn add_synonym(&mut self, from: WordId, to: WordId) -> Result<bool, GraphError> {
        if from == to {
            return Err(GraphError::SelfLoop(from));
        }
        if self.checked(from)?.language != self.checked(to)?.language {
            return Err(GraphError::CrossLanguageSynonym);
        }
        if !self.synonym_pairs.insert((from, to)) {
            return Ok(false);
        }
        self.synonyms[from.index()].push(to);
        Ok(true)
    }

    /// Inserts a translation edge, or refreshes the score of the existing
    /// edge with the same endpoints and source. Endpoint order does not matter.
    pub fn upsert_translation(
        &mut self,
        a: WordId,
        b: WordId,
        score: f64,
        source: &str,
    ) -> Result<bool, GraphError> {
        let (en, zh) = match (self.checked(a)?.language, self.checked(b)?.language) {
            (Language::En, Language::Zh) => (a, b),
            (Language::Zh, Language::En) => (b, a),
            _ => return Err(GraphError::SameLanguageTranslation),
        };
        let key = (en, zh, source.to_string());
        if let Some(&pos) = self.translation_index.get(&key) {
            self.translations[pos].score = score;
            return Ok(false);
        }
        let pos = self.translations.len();
        self.translations.push(TranslationEdge {
            en,
            zh,
            score,
            source: source.to_string(),
        });
        self.translation_index.insert(key, pos);
        self.translations_by_word[en.index()].push(pos);
        self.translations_by_word[zh.index()].push(pos);
        Ok(true)
    }

    /// Interns every token and links each ordered pair of distinct tokens.
    /// Returns the number of new directed edges.
    pub fn ingest_synonym_row(
        &mut self,
        tokens: &[String],
        language: Language,
    ) -> Result<usize, GraphError> {
        let mut ids = Vec::with_capacity(tokens.len());
        for token in tokens {
            let id = self.intern(token, language)?;
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        let mut added = 0;
        for &from in &ids {
            for &to in &ids {
                if from != to && self.add_synonym(from, to)? {
                    added += 1;
                }
            }
        }
        Ok(added)
    }

    pub fn synonyms_of(&self, id: WordId) -> &[WordId] {
        self.synonyms
            .get(id.index())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn translations_of(&self, id: WordId) -> impl Iterator<Item = &TranslationEdge> {
        self.translations_by_word
            .get(id.index())
            .into_iter()
            .flatten()
            .map(move |&pos| &self.translations[pos])
    }

    /// Texts of the same-language synonyms of `text`, in insertion order.
    pub fn neighbor_texts(&self, text: &str, language: Language) -> Vec<&str> {
        let Some(id) = self.lookup(text, language) else {
            return Vec::new();
        };
        self.synonyms_of(id)
            .iter()
            .filter_map(|n| self.word(*n))
            .map(|w| w.text.as_str())
            .collect()
    }

    pub fn words(&self) -> impl Iterator<Item = (WordId, &Word)> {
        self.words
            .iter()
            .enumerate()
            .map(|(i, w)| (WordId(i as u32), w))
    }

    /// Directed synonym pairs, each unordered pair appearing in both directions.
    pub fn synonym_pairs(&self) -> impl Iterator<Item = (WordId, WordId)> + '_ {
        self.synonyms
            .iter()
            .enumerate()
            .flat_map(|(i, adj)| adj.iter().map(move |to| (WordId(i as u32), *to)))
    }

    pub fn translations(&self) -> &[TranslationEdge] {
        &self.translations
    }

    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    pub fn synonym_edge_count(&self) -> usize {
        self.synonym_pairs.len()
    }

    pub fn translation_count(&self) -> usize {
        self.translations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Rebuilds a graph from persisted edge rows. Rows that would violate a
    /// graph invariant are skipped.
    pub fn from_records(synonyms: &[SynonymEdgeRow], translations: &[TranslationEdgeRow]) -> Self {
        let mut graph = Self::new();
        for row in synonyms {
            if let Err(e) = graph.add_synonym_record(row) {
                debug!("skipping synonym edge {} ~ {}: {}", row.left_term, row.right_term, e);
            }
        }
        for row in translations {
            if let Err(e) = graph.add_translation_record(row) {
                debug!("skipping translation edge {} -> {}: {}", row.en_term, row.zh_term, e);
            }
        }
        graph
    }

    fn add_synonym_record(&mut self, row: &SynonymEdgeRow) -> Result<(), String> {
        let language: Language = row.language.parse()?;
        let left = self.intern(&row.left_term, language).map_err(|e| e.to_string())?;
        let right = self.intern(&row.right_term, language).map_err(|e| e.to_string())?;
        self.add_synonym(left, right).map_err(|e| e.to_string())?;
        self.add_synonym(right, left).map_err(|e| e.to_string())?;
        Ok(())
    }

    fn add_translation_record(&mut self, row: &TranslationEdgeRow) -> Result<(), GraphError> {
        let en = self.intern(&row.en_term, Language::En)?;
        let zh = self.intern(&row.zh_term, Language::Zh)?;
        self.upsert_translation(en, zh, row.score, &row.source)?;
        Ok(())
    }
}
