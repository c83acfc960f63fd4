//! Row types mirroring the SQLite tables.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct VocabRow {
    pub id: i64,
    pub english: Option<String>,
    pub chinese: Option<String>,
    pub meaning_en: Option<String>,
    pub meaning_zh: Option<String>,
    pub deleted: Option<i64>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct SynonymEdgeRow {
    pub left_term: String,
    pub right_term: String,
    pub language: String,
    pub score: f64,
    pub source: String,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TranslationEdgeRow {
    pub en_term: String,
    pub zh_term: String,
    pub score: f64,
    pub source: String,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct LinkRow {
    pub id: i64,
    pub entry_id: i64,
    pub term: String,
    pub kind: String,
    pub score: f64,
}
