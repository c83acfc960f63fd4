//! Corpus ingestion: builds a `WordGraph` from the configured sources.
//!
//! Each source is read independently. A source that cannot be opened is
//! logged and contributes nothing; the remaining sources are still read.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use csv::ReaderBuilder;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{BilingualSource, SourceConfig};
use crate::error::{NotebookError, Result};
use crate::graph::WordGraph;
use crate::language::{contains_cjk, Language};
use crate::normalizer::{canonicalize_width, TextNormalizer};

const MAX_CANDIDATE_CHARS: usize = 30;
const MAX_PUNCT_RATIO: f64 = 0.3;

#[derive(Debug, Clone, Default, Serialize)]
pub struct SourceReport {
    pub path: String,
    pub kind: &'static str,
    pub available: bool,
    pub rows: usize,
    pub skipped_rows: usize,
    pub edges_added: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestReport {
    pub sources: Vec<SourceReport>,
}

impl IngestReport {
    pub fn edges_added(&self) -> usize {
        self.sources.iter().map(|s| s.edges_added).sum()
    }

    pub fn unavailable(&self) -> impl Iterator<Item = &SourceReport> {
        self.sources.iter().filter(|s| !s.available)
    }
}

/// Row and edge counts for one reader.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowStats {
    pub rows: usize,
    pub skipped_rows: usize,
    pub edges_added: usize,
}

pub struct GraphBuilder<'a> {
    normalizer: &'a TextNormalizer,
    graph: WordGraph,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(normalizer: &'a TextNormalizer) -> Self {
        Self {
            normalizer,
            graph: WordGraph::new(),
        }
    }

    /// Ingests every source in order and returns the finished graph.
    pub fn build(
        normalizer: &'a TextNormalizer,
        sources: &[SourceConfig],
    ) -> (WordGraph, IngestReport) {
        let mut builder = Self::new(normalizer);
        let mut report = IngestReport::default();
        for source in sources {
            report.sources.push(builder.ingest_source(source));
        }
        info!(
            "Graph ready: {} words, {} synonym edges, {} translation edges",
            builder.graph.word_count(),
            builder.graph.synonym_edge_count(),
            builder.graph.translation_count()
        );
        (builder.finish(), report)
    }

    pub fn finish(self) -> WordGraph {
        self.graph
    }

    pub fn ingest_source(&mut self, source: &SourceConfig) -> SourceReport {
        let kind = match source {
            SourceConfig::Synonyms { .. } => "synonyms",
            SourceConfig::Bilingual(_) => "bilingual",
        };
        let mut report = SourceReport {
            path: source.path().to_string(),
            kind,
            ..SourceReport::default()
        };
        let file = match open_source(Path::new(source.path())) {
            Ok(file) => file,
            Err(e) => {
                warn!("Skipping corpus source: {}", e);
                return report;
            }
        };
        report.available = true;
        let mut stats = RowStats::default();
        let result = match source {
            SourceConfig::Synonyms { language, .. } => {
                self.read_synonyms(BufReader::new(file), *language, &mut stats)
            }
            SourceConfig::Bilingual(bilingual) => self.read_bilingual(file, bilingual, &mut stats),
        };
        if let Err(e) = result {
            warn!("Stopped reading {} early: {}", report.path, e);
        }
        report.rows = stats.rows;
        report.skipped_rows = stats.skipped_rows;
        report.edges_added = stats.edges_added;
        info!(
            "Ingested {} source {}: {} rows, {} new edges",
            kind, report.path, report.rows, report.edges_added
        );
        report
    }

    /// One synonym group per line, all tokens in `language`. Lines that are
    /// not valid UTF-8 are skipped.
    pub fn ingest_synonyms<R: BufRead>(&mut self, reader: R, language: Language) -> Result<RowStats> {
        let mut stats = RowStats::default();
        self.read_synonyms(reader, language, &mut stats)?;
        Ok(stats)
    }

    pub fn ingest_bilingual<R: Read>(&mut self, reader: R, bilingual: &BilingualSource) -> Result<RowStats> {
        let mut stats = RowStats::default();
        self.read_bilingual(reader, bilingual, &mut stats)?;
        Ok(stats)
    }

    fn read_synonyms<R: BufRead>(
        &mut self,
        mut reader: R,
        language: Language,
        stats: &mut RowStats,
    ) -> Result<()> {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            stats.rows += 1;
            let Ok(line) = std::str::from_utf8(&buf) else {
                debug!("synonym row {} is not valid UTF-8", stats.rows);
                stats.skipped_rows += 1;
                continue;
            };
            let tokens = self.normalizer.tokenize(line, language);
            if tokens.len() < 2 {
                stats.skipped_rows += 1;
                continue;
            }
            stats.edges_added += self.graph.ingest_synonym_row(&tokens, language)?;
        }
        Ok(())
    }

    fn read_bilingual<R: Read>(
        &mut self,
        reader: R,
        bilingual: &BilingualSource,
        stats: &mut RowStats,
    ) -> Result<()> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(bilingual.has_header)
            .flexible(true)
            .from_reader(reader);
        for record in rdr.byte_records() {
            let record = record?;
            stats.rows += 1;
            let field = |col: usize| record.get(col).and_then(|raw| std::str::from_utf8(raw).ok());
            let (Some(en_raw), Some(zh_raw)) = (field(bilingual.en_column), field(bilingual.zh_column))
            else {
                stats.skipped_rows += 1;
                continue;
            };
            let en = self.normalizer.normalize(en_raw, Language::En);
            let candidates: Vec<String> = if bilingual.split_candidates {
                clean_translation_field(zh_raw)
                    .iter()
                    .map(|c| self.normalizer.normalize(c, Language::Zh))
                    .filter(|c| !c.is_empty())
                    .collect()
            } else {
                let zh = self.normalizer.normalize(zh_raw, Language::Zh);
                if zh.is_empty() { Vec::new() } else { vec![zh] }
            };
            if en.is_empty() || candidates.is_empty() {
                stats.skipped_rows += 1;
                continue;
            }
            let score = bilingual
                .score_column
                .and_then(field)
                .and_then(|raw| raw.trim().parse::<f64>().ok())
                .unwrap_or(bilingual.default_score);

            let en_id = self.graph.intern(&en, Language::En)?;
            for zh in &candidates {
                let zh_id = self.graph.intern(zh, Language::Zh)?;
                if self.graph.upsert_translation(en_id, zh_id, score, &bilingual.source)? {
                    stats.edges_added += 1;
                }
            }
        }
        debug!("bilingual rows: {:?}", stats);
        Ok(())
    }
}

fn open_source(path: &Path) -> Result<File> {
    File::open(path).map_err(|source| NotebookError::SourceUnavailable {
        path: path.to_path_buf(),
        source,
    })
}

/// Splits a dictionary gloss field such as `n. 苹果, 苹果树 [植]` into
/// Chinese candidates. Annotations in brackets or parentheses are removed;
/// candidates with no CJK character, more than 30 chars or mostly
/// punctuation are dropped.
pub fn clean_translation_field(raw: &str) -> Vec<String> {
    let text = strip_annotations(&canonicalize_width(raw).replace("\\n", "\n"));
    text.split(|c: char| matches!(c, ';' | '/' | '\u{3001}' | ',' | '\n'))
        .map(|part| strip_pos_prefix(part.trim()).trim())
        .filter(|tok| !tok.is_empty() && contains_cjk(tok))
        .filter(|tok| {
            let len = tok.chars().count();
            let punct = tok
                .chars()
                .filter(|c| ".,;\u{FF0C}\u{3001}/()[]".contains(*c))
                .count();
            len <= MAX_CANDIDATE_CHARS && (punct as f64 / len as f64) <= MAX_PUNCT_RATIO
        })
        .map(str::to_string)
        .collect()
}

/// Removes `[...]` and `(...)` annotations. An opener with no closer after
/// it is kept as ordinary text.
fn strip_annotations(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(c) = rest.chars().next() {
        let closer = match c {
            '[' => Some(']'),
            '(' => Some(')'),
            _ => None,
        };
        if let Some(end) = closer.and_then(|closer| rest.find(closer)) {
            rest = &rest[end + 1..];
            continue;
        }
        out.push(c);
        rest = &rest[c.len_utf8()..];
    }
    out
}

/// Drops a leading part-of-speech marker like `n.` or `vt.`.
fn strip_pos_prefix(token: &str) -> &str {
    let letters = token
        .char_indices()
        .take_while(|(_, c)| c.is_ascii_alphabetic())
        .last()
        .map(|(i, c)| i + c.len_utf8());
    match letters {
        Some(end) if token[end..].starts_with('.') => &token[end + 1..],
        _ => token,
    }
}
