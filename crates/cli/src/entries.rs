//! Notebook entry commands: record, update, delete, restore, list, import.

use std::path::Path;

use anyhow::Context;
use csv::ReaderBuilder;
use notebook_core::models::{EntryPatch, NewEntry, VocabularyEntry};
use notebook_core::store::VocabularyStore;
use tracing::info;

use crate::notebook::Notebook;

pub async fn record(nb: &Notebook, entry: NewEntry) -> anyhow::Result<i64> {
    let id = nb.store.upsert(&entry).await?;
    info!("Recorded entry {}", id);
    Ok(id)
}

pub async fn update(nb: &Notebook, id: i64, patch: EntryPatch) -> anyhow::Result<bool> {
    if patch.is_empty() {
        anyhow::bail!("update needs at least one field to change");
    }
    Ok(nb.store.update(id, &patch).await?)
}

pub async fn delete(nb: &Notebook, id: i64) -> anyhow::Result<bool> {
    Ok(nb.store.soft_delete(id).await?)
}

pub async fn restore(nb: &Notebook, id: i64) -> anyhow::Result<bool> {
    Ok(nb.store.restore(id).await?)
}

pub async fn list(nb: &Notebook, deleted: bool) -> anyhow::Result<Vec<VocabularyEntry>> {
    let entries = if deleted {
        nb.store.list_deleted().await?
    } else {
        nb.store.list_active().await?
    };
    Ok(entries)
}

/// Reads `english,chinese,meaning_en,meaning_zh` rows; the header row names
/// the columns, so their order and presence may vary.
pub fn read_import_file(path: &Path) -> anyhow::Result<Vec<NewEntry>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("open {}", path.display()))?;
    let mut entries = Vec::new();
    for (i, row) in rdr.deserialize::<NewEntry>().enumerate() {
        let entry = row.with_context(|| format!("{}: row {}", path.display(), i + 1))?;
        entries.push(entry);
    }
    Ok(entries)
}

/// Imports every row of `path` in one transaction; nothing is written when
/// any row is invalid.
pub async fn import(nb: &Notebook, path: &Path) -> anyhow::Result<Vec<i64>> {
    let entries = read_import_file(path)?;
    let ids = nb
        .store
        .import_entries(&entries)
        .await
        .with_context(|| format!("import {}", path.display()))?;
    Ok(ids)
}

/// Blank fields print as `-` so tab-separated columns stay aligned.
pub(crate) fn or_dash(value: &str) -> &str {
    if value.is_empty() {
        "-"
    } else {
        value
    }
}

pub fn format_entry(entry: &VocabularyEntry) -> String {
    format!(
        "{}\t{}\t{}\t{}\t{}\t{}",
        entry.id,
        or_dash(&entry.english),
        or_dash(&entry.chinese),
        or_dash(entry.meaning_en.as_deref().unwrap_or_default()),
        or_dash(entry.meaning_zh.as_deref().unwrap_or_default()),
        entry.updated_at
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn import_file_columns_follow_the_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("words.csv");
        std::fs::write(&path, "chinese,english,meaning_en\n苹果, Apple ,fruit\n,pear,\n").unwrap();
        let entries = read_import_file(&path).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].english.as_deref(), Some("Apple"));
        assert_eq!(entries[0].chinese.as_deref(), Some("苹果"));
        assert_eq!(entries[0].meaning_zh, None);
        assert_eq!(entries[1].chinese, None);
        assert_eq!(entries[1].meaning_en, None);
    }

    #[test]
    fn entries_print_dashes_for_blanks() {
        let entry = VocabularyEntry {
            id: 7,
            english: "hello".into(),
            chinese: String::new(),
            meaning_en: None,
            meaning_zh: Some("问候".into()),
            deleted: false,
            created_at: "2024-01-01 00:00:00".into(),
            updated_at: "2024-01-02 00:00:00".into(),
        };
        assert_eq!(
            format_entry(&entry),
            "7\thello\t-\t-\t问候\t2024-01-02 00:00:00"
        );
    }
}
