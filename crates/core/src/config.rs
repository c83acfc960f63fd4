use serde::{Deserialize, Serialize};

use crate::language::{Language, LanguageHint};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub corpus: CorpusConfig,
    pub search: SearchConfig,
    pub linking: LinkingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "notebook.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusConfig {
    pub sources: Vec<SourceConfig>,
    /// Stored score of thesaurus synonym edges.
    pub synonym_score: f64,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            synonym_score: 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceConfig {
    /// One synonym group per line, in a single language.
    Synonyms { language: Language, path: String },
    /// Delimited dictionary rows pairing an English column with a Chinese column.
    Bilingual(BilingualSource),
}

impl SourceConfig {
    pub fn path(&self) -> &str {
        match self {
            SourceConfig::Synonyms { path, .. } => path,
            SourceConfig::Bilingual(b) => &b.path,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BilingualSource {
    pub path: String,
    #[serde(default)]
    pub en_column: usize,
    #[serde(default = "default_zh_column")]
    pub zh_column: usize,
    #[serde(default = "default_true")]
    pub has_header: bool,
    #[serde(default)]
    pub score_column: Option<usize>,
    #[serde(default = "default_score")]
    pub default_score: f64,
    /// Treat the Chinese column as a gloss list and emit one edge per candidate.
    #[serde(default)]
    pub split_candidates: bool,
    #[serde(default = "default_source_label")]
    pub source: String,
}

impl BilingualSource {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            en_column: 0,
            zh_column: default_zh_column(),
            has_header: true,
            score_column: None,
            default_score: default_score(),
            split_candidates: false,
            source: default_source_label(),
        }
    }
}

fn default_zh_column() -> usize {
    3
}

fn default_true() -> bool {
    true
}

fn default_score() -> f64 {
    1.0
}

fn default_source_label() -> String {
    "translation".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub topk: usize,
    pub language: LanguageHint,
    /// Multiplier applied to scores reached through an expanded term rather than the query itself.
    pub expansion_weight: f64,
    pub include_graph_sources: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            topk: 10,
            language: LanguageHint::Auto,
            expansion_weight: 0.9,
            include_graph_sources: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkingConfig {
    pub fuzzy_threshold: f64,
    pub max_fuzzy_links: usize,
}

impl Default for LinkingConfig {
    fn default() -> Self {
        Self {
            fuzzy_threshold: 0.6,
            max_fuzzy_links: 5,
        }
    }
}

pub fn load(path: Option<&str>) -> anyhow::Result<AppConfig> {
    let mut settings = config::Config::builder();
    if let Some(p) = path {
        settings = settings.add_source(config::File::with_name(p));
    } else {
        settings = settings.add_source(config::File::with_name("config/default").required(false));
    }
    let cfg = settings.build()?;
    Ok(cfg.try_deserialize()?)
}
