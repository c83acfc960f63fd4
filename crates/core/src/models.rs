use serde::{Deserialize, Serialize};
use storage::models::VocabRow;

/// A user-maintained notebook entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocabularyEntry {
    pub id: i64,
    pub english: String,
    pub chinese: String,
    pub meaning_en: Option<String>,
    pub meaning_zh: Option<String>,
    pub deleted: bool,
    pub created_at: String,
    pub updated_at: String,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl From<VocabRow> for VocabularyEntry {
    fn from(row: VocabRow) -> Self {
        Self {
            id: row.id,
            english: row.english.unwrap_or_default(),
            chinese: row.chinese.unwrap_or_default(),
            meaning_en: non_empty(row.meaning_en),
            meaning_zh: non_empty(row.meaning_zh),
            deleted: row.deleted.unwrap_or(0) != 0,
            created_at: row.created_at.unwrap_or_default(),
            updated_at: row.updated_at.unwrap_or_default(),
        }
    }
}

/// Input for recording or importing an entry. Every field is optional; the
/// store rejects an entry whose english and chinese are both blank.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewEntry {
    #[serde(default)]
    pub english: Option<String>,
    #[serde(default)]
    pub chinese: Option<String>,
    #[serde(default)]
    pub meaning_en: Option<String>,
    #[serde(default)]
    pub meaning_zh: Option<String>,
}

impl NewEntry {
    pub fn pair(english: &str, chinese: &str) -> Self {
        Self {
            english: Some(english.to_string()),
            chinese: Some(chinese.to_string()),
            ..Self::default()
        }
    }
}

/// Field changes for `update`; `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryPatch {
    pub english: Option<String>,
    pub chinese: Option<String>,
    pub meaning_en: Option<String>,
    pub meaning_zh: Option<String>,
}

impl EntryPatch {
    pub fn is_empty(&self) -> bool {
        self.english.is_none()
            && self.chinese.is_none()
            && self.meaning_en.is_none()
            && self.meaning_zh.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HitSource {
    UserEntry,
    TranslationEdge,
    SynonymEdge,
}

impl HitSource {
    pub fn as_str(self) -> &'static str {
        match self {
            HitSource::UserEntry => "user_entry",
            HitSource::TranslationEdge => "translation_edge",
            HitSource::SynonymEdge => "synonym_edge",
        }
    }
}

impl std::fmt::Display for HitSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub score: f64,
    pub source: HitSource,
    pub english: String,
    pub chinese: String,
    pub detail: String,
}

/// Kind of a stored entry-to-term link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkKind {
    Exact,
    Synonym,
    Fuzzy,
}

impl LinkKind {
    pub fn as_str(self) -> &'static str {
        match self {
            LinkKind::Exact => "exact",
            LinkKind::Synonym => "synonym",
            LinkKind::Fuzzy => "fuzzy",
        }
    }
}

impl std::str::FromStr for LinkKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exact" => Ok(LinkKind::Exact),
            "synonym" => Ok(LinkKind::Synonym),
            "fuzzy" => Ok(LinkKind::Fuzzy),
            other => Err(format!("unknown link kind: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryLink {
    pub entry_id: i64,
    pub term: String,
    pub kind: LinkKind,
    pub score: f64,
}
