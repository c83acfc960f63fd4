//! `search` and `lookup` commands.

use notebook_core::language::LanguageHint;
use notebook_core::models::{HitSource, SearchHit, VocabularyEntry};
use notebook_core::search::SearchEngine;

use crate::entries::or_dash;
use crate::notebook::Notebook;

#[derive(Debug, Clone)]
pub struct SearchArgs {
    pub query: String,
    pub language: LanguageHint,
    pub topk: usize,
    pub include_graph_sources: bool,
}

pub async fn run_search(nb: &Notebook, args: &SearchArgs) -> anyhow::Result<Vec<SearchHit>> {
    let graph = nb.graph().await?;
    let engine = SearchEngine::new(&graph, &nb.store, &nb.normalizer)
        .with_expansion_weight(nb.config.search.expansion_weight);
    let hits = engine
        .search(
            &args.query,
            args.language,
            args.topk,
            args.include_graph_sources,
        )
        .await?;
    Ok(hits)
}

pub async fn run_lookup(
    nb: &Notebook,
    query: &str,
    language: LanguageHint,
) -> anyhow::Result<Vec<VocabularyEntry>> {
    let graph = nb.graph().await?;
    let engine = SearchEngine::new(&graph, &nb.store, &nb.normalizer);
    Ok(engine.lookup(query, language).await?)
}

/// One tab-separated line: score, source, English, Chinese. Synonym hits
/// name their language and show the pair joined by `~`.
pub fn format_hit(hit: &SearchHit) -> String {
    match hit.source {
        HitSource::SynonymEdge => {
            let lang = hit.detail.strip_prefix("lang=").unwrap_or(&hit.detail);
            format!(
                "{:.3}\t{}({})\t{} ~ {}",
                hit.score, hit.source, lang, hit.english, hit.chinese
            )
        }
        _ => format!(
            "{:.3}\t{}\t{}\t{}",
            hit.score,
            hit.source,
            or_dash(&hit.english),
            or_dash(&hit.chinese)
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hits_are_tab_separated() {
        let user = SearchHit {
            score: 0.857142,
            source: HitSource::UserEntry,
            english: "apple".into(),
            chinese: String::new(),
            detail: "id=1 field=english".into(),
        };
        assert_eq!(format_hit(&user), "0.857\tuser_entry\tapple\t-");
        let synonym = SearchHit {
            score: 1.0,
            source: HitSource::SynonymEdge,
            english: "jog".into(),
            chinese: "run".into(),
            detail: "lang=en".into(),
        };
        assert_eq!(format_hit(&synonym), "1.000\tsynonym_edge(en)\tjog ~ run");
    }
}
