//! Persisted vocabulary entries and graph edge records.

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use sqlx::sqlite::SqliteConnection;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use storage::models::{LinkRow, SynonymEdgeRow, TranslationEdgeRow, VocabRow};
use tracing::{debug, info};

use crate::error::{NotebookError, Result};
use crate::graph::WordGraph;
use crate::language::{Language, QueryLanguage};
use crate::models::{EntryLink, EntryPatch, LinkKind, NewEntry, VocabularyEntry};
use crate::normalizer::entry_key;

/// Provenance tag of translation edges written for recorded entries.
pub const USER_SOURCE: &str = "user";
/// Provenance tag of synonym edges persisted from corpus thesauri.
pub const THESAURUS_SOURCE: &str = "thesaurus";

const ENTRY_COLUMNS: &str = "id, english, chinese, meaning_en, meaning_zh, \
     COALESCE(deleted, 0) AS deleted, created_at, updated_at";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PersistCounts {
    pub terms: usize,
    pub synonym_edges: usize,
    pub translation_edges: usize,
}

#[async_trait]
pub trait VocabularyStore: Send + Sync {
    /// Inserts the entry, or refreshes meanings of the row with the same
    /// (english, chinese) key. Returns the row id.
    async fn upsert(&self, entry: &NewEntry) -> Result<i64>;
    /// Applies `patch` to an existing row. Returns false for an unknown id.
    async fn update(&self, id: i64, patch: &EntryPatch) -> Result<bool>;
    async fn soft_delete(&self, id: i64) -> Result<bool>;
    async fn restore(&self, id: i64) -> Result<bool>;
    async fn get(&self, id: i64) -> Result<Option<VocabularyEntry>>;
    async fn list_active(&self) -> Result<Vec<VocabularyEntry>>;
    async fn list_deleted(&self) -> Result<Vec<VocabularyEntry>>;
    /// Active entries whose field for one of `language`'s languages equals a term.
    async fn search_by_terms(
        &self,
        terms: &BTreeSet<String>,
        language: QueryLanguage,
    ) -> Result<Vec<VocabularyEntry>>;
    async fn attach_link(&self, entry_id: i64, term: &str, kind: LinkKind, score: f64)
        -> Result<()>;
    async fn links_for(&self, entry_id: i64) -> Result<Vec<EntryLink>>;
    /// Terms one stored link away from `term` in `language`: the link targets
    /// of entries whose field is `term`, and the field of entries linked to `term`.
    async fn linked_terms(&self, term: &str, language: Language) -> Result<Vec<String>>;
    /// Validates every entry, then writes all of them in one transaction.
    async fn import_entries(&self, entries: &[NewEntry]) -> Result<Vec<i64>>;
    async fn persist_graph(&self, graph: &WordGraph, synonym_score: f64) -> Result<PersistCounts>;
    async fn load_graph(&self) -> Result<WordGraph>;
    async fn search_translation_edges(
        &self,
        query: &str,
        language: QueryLanguage,
        limit: usize,
    ) -> Result<Vec<TranslationEdgeRow>>;
    async fn search_synonym_edges(
        &self,
        query: &str,
        language: QueryLanguage,
        limit: usize,
    ) -> Result<Vec<SynonymEdgeRow>>;
}

pub struct SqliteVocabularyStore {
    pool: SqlitePool,
}

impl SqliteVocabularyStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connects to `database` and applies the schema.
    pub async fn open(database: &str) -> anyhow::Result<Self> {
        let pool = storage::connect(database).await?;
        storage::migrate(&pool).await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn list_by_deleted(&self, deleted: bool) -> Result<Vec<VocabularyEntry>> {
        let sql = format!(
            "SELECT {ENTRY_COLUMNS} FROM user_vocab WHERE COALESCE(deleted, 0) = ?1 ORDER BY id"
        );
        let rows: Vec<VocabRow> = sqlx::query_as(&sql)
            .bind(i64::from(deleted))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(VocabularyEntry::from).collect())
    }

    async fn set_deleted(&self, id: i64, deleted: bool) -> Result<bool> {
        let mut tx = self.pool.begin().await?;
        let current: Option<i64> =
            sqlx::query_scalar("SELECT COALESCE(deleted, 0) FROM user_vocab WHERE id = ?1")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(current) = current else {
            return Ok(false);
        };
        if (current != 0) != deleted {
            sqlx::query("UPDATE user_vocab SET deleted = ?2, updated_at = ?3 WHERE id = ?1")
                .bind(id)
                .bind(i64::from(deleted))
                .bind(now())
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(true)
    }
}

/// A `NewEntry` in stored key form.
#[derive(Debug, Clone, PartialEq)]
struct CleanEntry {
    english: String,
    chinese: String,
    meaning_en: Option<String>,
    meaning_zh: Option<String>,
}

fn clean_meaning(value: Option<&String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn validate(entry: &NewEntry) -> Result<CleanEntry> {
    let english = entry
        .english
        .as_deref()
        .map(|e| entry_key(e, Language::En))
        .unwrap_or_default();
    let chinese = entry
        .chinese
        .as_deref()
        .map(|c| entry_key(c, Language::Zh))
        .unwrap_or_default();
    if english.is_empty() && chinese.is_empty() {
        return Err(NotebookError::Validation(
            "an entry needs english or chinese text".to_string(),
        ));
    }
    Ok(CleanEntry {
        english,
        chinese,
        meaning_en: clean_meaning(entry.meaning_en.as_ref()),
        meaning_zh: clean_meaning(entry.meaning_zh.as_ref()),
    })
}

fn now() -> String {
    Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

fn field_column(language: Language) -> &'static str {
    match language {
        Language::En => "english",
        Language::Zh => "chinese",
    }
}

/// Escapes `%`, `_` and `\` so the query matches as a literal substring.
fn like_pattern(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len() + 2);
    escaped.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

async fn write_entry(conn: &mut SqliteConnection, entry: &CleanEntry, now: &str) -> Result<i64> {
    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO user_vocab (english, chinese, meaning_en, meaning_zh, deleted, created_at, updated_at)
        VALUES (?1, ?2, COALESCE(?3, ''), COALESCE(?4, ''), 0, ?5, ?5)
        ON CONFLICT(english, chinese) DO UPDATE SET
            meaning_en = COALESCE(?3, user_vocab.meaning_en),
            meaning_zh = COALESCE(?4, user_vocab.meaning_zh),
            updated_at = ?5
        RETURNING id
        "#,
    )
    .bind(&entry.english)
    .bind(&entry.chinese)
    .bind(&entry.meaning_en)
    .bind(&entry.meaning_zh)
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;
    register_terms(conn, &entry.english, &entry.chinese).await?;
    Ok(id)
}

/// Registers the entry's terms and, for a full pair, a user translation edge.
async fn register_terms(conn: &mut SqliteConnection, english: &str, chinese: &str) -> Result<()> {
    for (term, language) in [(english, Language::En), (chinese, Language::Zh)] {
        if !term.is_empty() {
            sqlx::query("INSERT OR IGNORE INTO terms (term, language) VALUES (?1, ?2)")
                .bind(term)
                .bind(language.code())
                .execute(&mut *conn)
                .await?;
        }
    }
    if !english.is_empty() && !chinese.is_empty() {
        upsert_translation_row(conn, english, chinese, 1.0, USER_SOURCE).await?;
    }
    Ok(())
}

async fn upsert_translation_row(
    conn: &mut SqliteConnection,
    en: &str,
    zh: &str,
    score: f64,
    source: &str,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO translation_edge (en_term, zh_term, score, source)
        VALUES (?1, ?2, ?3, ?4)
        ON CONFLICT(en_term, zh_term, source) DO UPDATE SET score = excluded.score
        "#,
    )
    .bind(en)
    .bind(zh)
    .bind(score)
    .bind(source)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

#[async_trait]
impl VocabularyStore for SqliteVocabularyStore {
    async fn upsert(&self, entry: &NewEntry) -> Result<i64> {
        let entry = validate(entry)?;
        let mut tx = self.pool.begin().await?;
        let id = write_entry(&mut tx, &entry, &now()).await?;
        tx.commit().await?;
        debug!("recorded entry {} ({} / {})", id, entry.english, entry.chinese);
        Ok(id)
    }

    async fn update(&self, id: i64, patch: &EntryPatch) -> Result<bool> {
        let mut tx = self.pool.begin().await?;
        let sql = format!("SELECT {ENTRY_COLUMNS} FROM user_vocab WHERE id = ?1");
        let row: Option<VocabRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(row) = row else {
            return Ok(false);
        };
        let current = VocabularyEntry::from(row);
        let english = patch
            .english
            .as_deref()
            .map(|e| entry_key(e, Language::En))
            .unwrap_or(current.english);
        let chinese = patch
            .chinese
            .as_deref()
            .map(|c| entry_key(c, Language::Zh))
            .unwrap_or(current.chinese);
        if english.is_empty() && chinese.is_empty() {
            return Err(NotebookError::Validation(
                "an entry needs english or chinese text".to_string(),
            ));
        }
        let meaning_en = match &patch.meaning_en {
            Some(m) => m.trim().to_string(),
            None => current.meaning_en.unwrap_or_default(),
        };
        let meaning_zh = match &patch.meaning_zh {
            Some(m) => m.trim().to_string(),
            None => current.meaning_zh.unwrap_or_default(),
        };
        sqlx::query(
            r#"
            UPDATE user_vocab
            SET english = ?2, chinese = ?3, meaning_en = ?4, meaning_zh = ?5, updated_at = ?6
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&english)
        .bind(&chinese)
        .bind(&meaning_en)
        .bind(&meaning_zh)
        .bind(now())
        .execute(&mut *tx)
        .await?;
        register_terms(&mut tx, &english, &chinese).await?;
        tx.commit().await?;
        Ok(true)
    }

    async fn soft_delete(&self, id: i64) -> Result<bool> {
        self.set_deleted(id, true).await
    }

    async fn restore(&self, id: i64) -> Result<bool> {
        self.set_deleted(id, false).await
    }

    async fn get(&self, id: i64) -> Result<Option<VocabularyEntry>> {
        let sql = format!("SELECT {ENTRY_COLUMNS} FROM user_vocab WHERE id = ?1");
        let row: Option<VocabRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(VocabularyEntry::from))
    }

    async fn list_active(&self) -> Result<Vec<VocabularyEntry>> {
        self.list_by_deleted(false).await
    }

    async fn list_deleted(&self) -> Result<Vec<VocabularyEntry>> {
        self.list_by_deleted(true).await
    }

    async fn search_by_terms(
        &self,
        terms: &BTreeSet<String>,
        language: QueryLanguage,
    ) -> Result<Vec<VocabularyEntry>> {
        if terms.is_empty() {
            return Ok(Vec::new());
        }
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {ENTRY_COLUMNS} FROM user_vocab WHERE COALESCE(deleted, 0) = 0 AND ("
        ));
        for (i, lang) in language.languages().into_iter().enumerate() {
            if i > 0 {
                qb.push(" OR ");
            }
            qb.push(field_column(lang));
            qb.push(" IN (");
            let mut separated = qb.separated(", ");
            for term in terms {
                separated.push_bind(term.clone());
            }
            separated.push_unseparated(")");
        }
        qb.push(") ORDER BY id");
        let rows: Vec<VocabRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(VocabularyEntry::from).collect())
    }

    async fn attach_link(
        &self,
        entry_id: i64,
        term: &str,
        kind: LinkKind,
        score: f64,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO vocab_link (entry_id, term, kind, score, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(entry_id, term, kind) DO UPDATE SET score = excluded.score
            "#,
        )
        .bind(entry_id)
        .bind(term)
        .bind(kind.as_str())
        .bind(score)
        .bind(now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn links_for(&self, entry_id: i64) -> Result<Vec<EntryLink>> {
        let rows: Vec<LinkRow> = sqlx::query_as(
            "SELECT id, entry_id, term, kind, score FROM vocab_link WHERE entry_id = ?1 ORDER BY id",
        )
        .bind(entry_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .filter_map(|r| {
                let kind = r.kind.parse().ok()?;
                Some(EntryLink {
                    entry_id: r.entry_id,
                    term: r.term,
                    kind,
                    score: r.score,
                })
            })
            .collect())
    }

    async fn linked_terms(&self, term: &str, language: Language) -> Result<Vec<String>> {
        let column = field_column(language);
        let sql = format!(
            r#"
            SELECT l.term AS term FROM vocab_link l
            JOIN user_vocab v ON v.id = l.entry_id
            WHERE COALESCE(v.deleted, 0) = 0 AND v.{column} = ?1
            UNION
            SELECT v.{column} AS term FROM vocab_link l
            JOIN user_vocab v ON v.id = l.entry_id
            WHERE COALESCE(v.deleted, 0) = 0 AND l.term = ?1 AND COALESCE(v.{column}, '') != ''
            "#
        );
        let terms: Vec<String> = sqlx::query_scalar(&sql)
            .bind(term)
            .fetch_all(&self.pool)
            .await?;
        Ok(terms)
    }

    async fn import_entries(&self, entries: &[NewEntry]) -> Result<Vec<i64>> {
        let cleaned = entries
            .iter()
            .enumerate()
            .map(|(i, e)| {
                validate(e).map_err(|err| match err {
                    NotebookError::Validation(msg) => {
                        NotebookError::Validation(format!("row {}: {}", i + 1, msg))
                    }
                    other => other,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let stamp = now();
        let mut tx = self.pool.begin().await?;
        let mut ids = Vec::with_capacity(cleaned.len());
        for entry in &cleaned {
            ids.push(write_entry(&mut tx, entry, &stamp).await?);
        }
        tx.commit().await?;
        info!("Imported {} entries", ids.len());
        Ok(ids)
    }

    async fn persist_graph(&self, graph: &WordGraph, synonym_score: f64) -> Result<PersistCounts> {
        let mut counts = PersistCounts::default();
        let mut tx = self.pool.begin().await?;
        for (_, word) in graph.words() {
            sqlx::query("INSERT OR IGNORE INTO terms (term, language) VALUES (?1, ?2)")
                .bind(&word.text)
                .bind(word.language.code())
                .execute(&mut *tx)
                .await?;
            counts.terms += 1;
        }
        for (from, to) in graph.synonym_pairs() {
            let (Some(left), Some(right)) = (graph.word(from), graph.word(to)) else {
                continue;
            };
            // Each unordered pair is stored once, smaller text on the left.
            if left.text >= right.text {
                continue;
            }
            sqlx::query(
                r#"
                INSERT INTO synonym_edge (left_term, right_term, language, score, source)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ON CONFLICT(left_term, right_term, language, source) DO UPDATE SET score = excluded.score
                "#,
            )
            .bind(&left.text)
            .bind(&right.text)
            .bind(left.language.code())
            .bind(synonym_score)
            .bind(THESAURUS_SOURCE)
            .execute(&mut *tx)
            .await?;
            counts.synonym_edges += 1;
        }
        for edge in graph.translations() {
            let (Some(en), Some(zh)) = (graph.word(edge.en), graph.word(edge.zh)) else {
                continue;
            };
            upsert_translation_row(&mut tx, &en.text, &zh.text, edge.score, &edge.source).await?;
            counts.translation_edges += 1;
        }
        tx.commit().await?;
        info!(
            "Persisted graph: {} terms, {} synonym pairs, {} translation edges",
            counts.terms, counts.synonym_edges, counts.translation_edges
        );
        Ok(counts)
    }

    async fn load_graph(&self) -> Result<WordGraph> {
        let synonyms: Vec<SynonymEdgeRow> = sqlx::query_as(
            r#"
            SELECT left_term, right_term, COALESCE(language, '') AS language,
                   CAST(COALESCE(score, 0) AS REAL) AS score, COALESCE(source, '') AS source
            FROM synonym_edge
            WHERE left_term IS NOT NULL AND right_term IS NOT NULL
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        let translations: Vec<TranslationEdgeRow> = sqlx::query_as(
            r#"
            SELECT en_term, zh_term, CAST(COALESCE(score, 0) AS REAL) AS score,
                   COALESCE(source, '') AS source
            FROM translation_edge
            WHERE en_term IS NOT NULL AND zh_term IS NOT NULL
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(WordGraph::from_records(&synonyms, &translations))
    }

    async fn search_translation_edges(
        &self,
        query: &str,
        language: QueryLanguage,
        limit: usize,
    ) -> Result<Vec<TranslationEdgeRow>> {
        let query = query.trim();
        if query.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }
        let filter = match language {
            QueryLanguage::One(Language::En) => r"en_term LIKE ?1 ESCAPE '\'",
            QueryLanguage::One(Language::Zh) => r"zh_term LIKE ?1 ESCAPE '\'",
            QueryLanguage::Both => r"(en_term LIKE ?1 ESCAPE '\' OR zh_term LIKE ?1 ESCAPE '\')",
        };
        let sql = format!(
            "SELECT en_term, zh_term, CAST(COALESCE(score, 0) AS REAL) AS score, \
             COALESCE(source, '') AS source FROM translation_edge \
             WHERE {filter} ORDER BY score DESC, id LIMIT ?2"
        );
        let rows = sqlx::query_as(&sql)
            .bind(like_pattern(query))
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn search_synonym_edges(
        &self,
        query: &str,
        language: QueryLanguage,
        limit: usize,
    ) -> Result<Vec<SynonymEdgeRow>> {
        let query = query.trim();
        if query.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT left_term, right_term, COALESCE(language, '') AS language, \
             CAST(COALESCE(score, 0) AS REAL) AS score, COALESCE(source, '') AS source \
             FROM synonym_edge WHERE (left_term LIKE ",
        );
        let pattern = like_pattern(query);
        qb.push_bind(pattern.clone());
        qb.push(r" ESCAPE '\' OR right_term LIKE ");
        qb.push_bind(pattern);
        qb.push(r" ESCAPE '\')");
        if let QueryLanguage::One(lang) = language {
            qb.push(" AND language = ");
            qb.push_bind(lang.code());
        }
        qb.push(" ORDER BY score DESC, id LIMIT ");
        qb.push_bind(limit as i64);
        let rows = qb.build_query_as().fetch_all(&self.pool).await?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store(name: &str) -> SqliteVocabularyStore {
        let url = format!("sqlite://file:{name}?mode=memory&cache=shared");
        SqliteVocabularyStore::open(&url).await.unwrap()
    }

    #[tokio::test]
    async fn upsert_folds_english_and_trims_chinese() {
        let store = store("store_upsert_fold").await;
        let id = store.upsert(&NewEntry::pair("  Hello ", " 你好 ")).await.unwrap();
        let entry = store.get(id).await.unwrap().unwrap();
        assert_eq!(entry.english, "hello");
        assert_eq!(entry.chinese, "你好");
        assert!(!entry.deleted);
        assert!(entry.meaning_en.is_none());

        let user_edges: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM translation_edge WHERE en_term = 'hello' AND zh_term = '你好' AND source = 'user'",
        )
        .fetch_one(store.pool())
        .await
        .unwrap();
        assert_eq!(user_edges, 1);
    }

    #[tokio::test]
    async fn second_upsert_refreshes_meanings_in_place() {
        let store = store("store_upsert_twice").await;
        let mut entry = NewEntry::pair("Apple", "苹果");
        entry.meaning_en = Some("a fruit".into());
        let first = store.upsert(&entry).await.unwrap();
        entry.english = Some("APPLE".into());
        entry.meaning_en = Some("a round fruit".into());
        entry.meaning_zh = Some("水果".into());
        let second = store.upsert(&entry).await.unwrap();
        assert_eq!(first, second);
        let active = store.list_active().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].meaning_en.as_deref(), Some("a round fruit"));
        assert_eq!(active[0].meaning_zh.as_deref(), Some("水果"));

        // Omitted meanings keep their stored value.
        let third = store.upsert(&NewEntry::pair("apple", "苹果")).await.unwrap();
        assert_eq!(third, first);
        let entry = store.get(first).await.unwrap().unwrap();
        assert_eq!(entry.meaning_en.as_deref(), Some("a round fruit"));
    }

    #[tokio::test]
    async fn non_ascii_english_shares_one_key() {
        let store = store("store_non_ascii_key").await;
        let upper = store
            .upsert(&NewEntry {
                english: Some("CAFÉ".into()),
                ..NewEntry::default()
            })
            .await
            .unwrap();
        let lower = store
            .upsert(&NewEntry {
                english: Some("café".into()),
                meaning_en: Some("coffee house".into()),
                ..NewEntry::default()
            })
            .await
            .unwrap();
        assert_eq!(upper, lower);
        let active = store.list_active().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].english, "café");
        assert_eq!(active[0].meaning_en.as_deref(), Some("coffee house"));
    }

    #[tokio::test]
    async fn blank_entry_is_rejected_before_storage() {
        let store = store("store_blank").await;
        let err = store
            .upsert(&NewEntry {
                english: Some("   ".into()),
                meaning_en: Some("nothing".into()),
                ..NewEntry::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, NotebookError::Validation(_)));
        assert!(store.list_active().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn soft_delete_and_restore_round_trip() {
        let store = store("store_delete_restore").await;
        let id = store.upsert(&NewEntry::pair("run", "跑")).await.unwrap();
        let before = store.get(id).await.unwrap().unwrap();

        assert!(store.soft_delete(id).await.unwrap());
        assert!(store.soft_delete(id).await.unwrap());
        assert!(store.list_active().await.unwrap().is_empty());
        let deleted = store.list_deleted().await.unwrap();
        assert_eq!(deleted.len(), 1);
        assert_eq!(deleted[0].id, id);

        assert!(store.restore(id).await.unwrap());
        assert!(store.restore(id).await.unwrap());
        assert!(store.list_deleted().await.unwrap().is_empty());
        let after = store.get(id).await.unwrap().unwrap();
        assert_eq!(
            (after.english, after.chinese, after.meaning_en, after.meaning_zh),
            (before.english, before.chinese, before.meaning_en, before.meaning_zh)
        );

        assert!(!store.soft_delete(9999).await.unwrap());
        assert!(!store.restore(9999).await.unwrap());
        assert!(store.get(9999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_keeps_absent_fields_and_deleted_flag() {
        let store = store("store_update").await;
        let mut entry = NewEntry::pair("glad", "高兴");
        entry.meaning_en = Some("pleased".into());
        let id = store.upsert(&entry).await.unwrap();
        store.soft_delete(id).await.unwrap();

        let patch = EntryPatch {
            meaning_zh: Some("开心".into()),
            ..EntryPatch::default()
        };
        assert!(store.update(id, &patch).await.unwrap());
        let updated = store.get(id).await.unwrap().unwrap();
        assert_eq!(updated.english, "glad");
        assert_eq!(updated.meaning_en.as_deref(), Some("pleased"));
        assert_eq!(updated.meaning_zh.as_deref(), Some("开心"));
        assert!(updated.deleted);

        assert!(!store.update(4242, &patch).await.unwrap());
    }

    #[tokio::test]
    async fn import_is_all_or_nothing() {
        let store = store("store_import").await;
        let bad = vec![
            NewEntry::pair("one", "一"),
            NewEntry::default(),
            NewEntry::pair("three", "三"),
        ];
        let err = store.import_entries(&bad).await.unwrap_err();
        assert!(err.to_string().contains("row 2"));
        assert!(store.list_active().await.unwrap().is_empty());

        let ids = store
            .import_entries(&[NewEntry::pair("one", "一"), NewEntry::pair("two", "二")])
            .await
            .unwrap();
        assert_eq!(ids.len(), 2);
        assert_eq!(store.list_active().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn search_by_terms_matches_fields_exactly() {
        let store = store("store_terms").await;
        let apple = store.upsert(&NewEntry::pair("apple", "苹果")).await.unwrap();
        let pear = store.upsert(&NewEntry::pair("pear", "梨")).await.unwrap();
        store.upsert(&NewEntry::pair("pineapple", "菠萝")).await.unwrap();
        store.soft_delete(pear).await.unwrap();

        let terms: BTreeSet<String> = ["apple", "pear", "梨"].iter().map(|s| s.to_string()).collect();
        let hits = store
            .search_by_terms(&terms, QueryLanguage::One(Language::En))
            .await
            .unwrap();
        assert_eq!(hits.iter().map(|e| e.id).collect::<Vec<_>>(), vec![apple]);

        let zh: BTreeSet<String> = ["菠萝".to_string()].into_iter().collect();
        assert!(store
            .search_by_terms(&zh, QueryLanguage::One(Language::En))
            .await
            .unwrap()
            .is_empty());
        assert_eq!(store.search_by_terms(&zh, QueryLanguage::Both).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn links_are_idempotent_and_feed_linked_terms() {
        let store = store("store_links").await;
        let id = store.upsert(&NewEntry::pair("run", "跑")).await.unwrap();
        store.attach_link(id, "jog", LinkKind::Synonym, 0.9).await.unwrap();
        store.attach_link(id, "jog", LinkKind::Synonym, 0.8).await.unwrap();
        let links = store.links_for(id).await.unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].score, 0.8);

        assert_eq!(store.linked_terms("run", Language::En).await.unwrap(), vec!["jog"]);
        assert_eq!(store.linked_terms("jog", Language::En).await.unwrap(), vec!["run"]);
        store.soft_delete(id).await.unwrap();
        assert!(store.linked_terms("run", Language::En).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn graph_persists_and_reloads() {
        let store = store("store_graph").await;
        let mut graph = WordGraph::new();
        let tokens: Vec<String> = ["run", "jog", "sprint"].iter().map(|s| s.to_string()).collect();
        graph.ingest_synonym_row(&tokens, Language::En).unwrap();
        let run = graph.lookup("run", Language::En).unwrap();
        let pao = graph.intern("跑", Language::Zh).unwrap();
        graph.upsert_translation(run, pao, 0.7, "translation").unwrap();

        let counts = store.persist_graph(&graph, 1.0).await.unwrap();
        assert_eq!(counts.terms, 4);
        assert_eq!(counts.synonym_edges, 3);
        assert_eq!(counts.translation_edges, 1);

        let reloaded = store.load_graph().await.unwrap();
        assert_eq!(reloaded.synonym_edge_count(), 6);
        assert_eq!(reloaded.translation_count(), 1);
        let mut neighbors = reloaded.neighbor_texts("run", Language::En);
        neighbors.sort();
        assert_eq!(neighbors, vec!["jog", "sprint"]);
    }

    #[tokio::test]
    async fn edge_search_is_a_literal_substring_match() {
        let store = store("store_edge_search").await;
        let mut graph = WordGraph::new();
        for (en, zh, score) in [("apple", "苹果", 0.5), ("pineapple", "菠萝", 0.9), ("a_b", "乙", 0.1)] {
            let e = graph.intern(en, Language::En).unwrap();
            let z = graph.intern(zh, Language::Zh).unwrap();
            graph.upsert_translation(e, z, score, "translation").unwrap();
        }
        store.persist_graph(&graph, 1.0).await.unwrap();

        let rows = store
            .search_translation_edges("APPLE", QueryLanguage::One(Language::En), 10)
            .await
            .unwrap();
        let terms: Vec<&str> = rows.iter().map(|r| r.en_term.as_str()).collect();
        assert_eq!(terms, vec!["pineapple", "apple"]);

        let rows = store
            .search_translation_edges("apple", QueryLanguage::One(Language::En), 1)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);

        let rows = store
            .search_translation_edges("_", QueryLanguage::Both, 10)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert!(store
            .search_translation_edges("  ", QueryLanguage::Both, 10)
            .await
            .unwrap()
            .is_empty());
    }
}
