use cli::corpus;
use cli::entries;
use cli::notebook::Notebook;
use cli::search::{run_lookup, run_search, SearchArgs};
use notebook_core::config::{AppConfig, BilingualSource, SourceConfig};
use notebook_core::language::{Language, LanguageHint};
use notebook_core::models::{EntryPatch, HitSource, NewEntry};
use std::fs;

fn config_for(db: &std::path::Path) -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.database.path = db.to_string_lossy().into_owned();
    cfg
}

fn search_args(query: &str, language: LanguageHint, topk: usize, graph: bool) -> SearchArgs {
    SearchArgs {
        query: query.to_string(),
        language,
        topk,
        include_graph_sources: graph,
    }
}

#[tokio::test]
async fn record_search_delete_restore_cycle() {
    let temp = tempfile::tempdir().unwrap();
    let db = temp.path().join("notebook.db");
    let outcome = corpus::run_init(&db.to_string_lossy(), None, false)
        .await
        .unwrap();
    assert!(outcome.created);
    let nb = Notebook::open(config_for(&db)).await.unwrap();

    let hello = entries::record(&nb, NewEntry::pair("Hello", "你好")).await.unwrap();
    let mut again = NewEntry::pair("hello", " 你好");
    again.meaning_en = Some("a greeting".into());
    assert_eq!(entries::record(&nb, again).await.unwrap(), hello);
    let apple = entries::record(&nb, NewEntry::pair("apple", "苹果")).await.unwrap();

    let active = entries::list(&nb, false).await.unwrap();
    assert_eq!(active.len(), 2);
    assert_eq!(active[0].english, "hello");
    assert_eq!(active[0].chinese, "你好");
    assert_eq!(active[0].meaning_en.as_deref(), Some("a greeting"));

    let hits = run_search(&nb, &search_args("aple", LanguageHint::En, 5, false))
        .await
        .unwrap();
    assert!(hits.iter().any(|h| h.english == "apple" && h.score > 0.0));

    assert!(entries::delete(&nb, apple).await.unwrap());
    assert_eq!(entries::list(&nb, false).await.unwrap().len(), 1);
    assert_eq!(entries::list(&nb, true).await.unwrap()[0].id, apple);
    let hits = run_search(&nb, &search_args("aple", LanguageHint::En, 5, false))
        .await
        .unwrap();
    assert!(hits.iter().all(|h| h.english != "apple"));

    assert!(entries::restore(&nb, apple).await.unwrap());
    assert!(entries::list(&nb, true).await.unwrap().is_empty());
    assert_eq!(entries::list(&nb, false).await.unwrap().len(), 2);

    let patch = EntryPatch {
        meaning_zh: Some("水果".into()),
        ..EntryPatch::default()
    };
    assert!(entries::update(&nb, apple, patch.clone()).await.unwrap());
    assert!(!entries::update(&nb, 999, patch).await.unwrap());
    assert!(entries::update(&nb, apple, EntryPatch::default()).await.is_err());
    assert!(!entries::delete(&nb, 999).await.unwrap());
}

#[tokio::test]
async fn record_rejects_blank_entries() {
    let temp = tempfile::tempdir().unwrap();
    let nb = Notebook::open(config_for(&temp.path().join("blank.db")))
        .await
        .unwrap();
    let err = entries::record(&nb, NewEntry::default()).await.unwrap_err();
    assert!(err.to_string().contains("validation"));
    assert!(entries::list(&nb, false).await.unwrap().is_empty());
}

#[tokio::test]
async fn build_graph_links_entries_and_expands_queries() {
    let temp = tempfile::tempdir().unwrap();
    let en = temp.path().join("en_synonyms.csv");
    let zh = temp.path().join("zh_synonyms.txt");
    let dict = temp.path().join("ecdict.csv");
    fs::write(&en, "run, jog, sprint\n").unwrap();
    fs::write(&zh, "跑，奔跑\n").unwrap();
    fs::write(
        &dict,
        "word,phonetic,definition,translation\nrun,rʌn,move fast,\"n. 跑步, 奔跑 [体]\"\n",
    )
    .unwrap();
    let mut bilingual = BilingualSource::new(dict.to_string_lossy());
    bilingual.split_candidates = true;

    let mut cfg = config_for(&temp.path().join("graph.db"));
    cfg.corpus.sources = vec![
        SourceConfig::Synonyms {
            language: Language::En,
            path: en.to_string_lossy().into_owned(),
        },
        SourceConfig::Synonyms {
            language: Language::Zh,
            path: zh.to_string_lossy().into_owned(),
        },
        SourceConfig::Bilingual(bilingual),
        SourceConfig::Synonyms {
            language: Language::En,
            path: temp.path().join("missing.csv").to_string_lossy().into_owned(),
        },
    ];
    let nb = Notebook::open(cfg).await.unwrap();
    entries::record(&nb, NewEntry::pair("sprint", "冲刺")).await.unwrap();

    let summary = corpus::build_graph(&nb).await.unwrap();
    assert_eq!(summary.ingest.sources.len(), 4);
    assert!(!summary.ingest.sources[3].available);
    assert_eq!(summary.ingest.sources[0].edges_added, 6);
    assert_eq!(summary.persisted.synonym_edges, 4);
    assert_eq!(summary.persisted.translation_edges, 2);
    assert_eq!(summary.links.entries, 1);
    // "sprint" from the thesaurus, "冲刺" from the entry's own translation edge.
    assert_eq!(summary.links.exact, 2);
    assert_eq!(summary.links.synonym, 2);

    let hits = run_search(&nb, &search_args("jog", LanguageHint::Auto, 5, false))
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].english, "sprint");
    assert!((hits[0].score - 0.9).abs() < 1e-9);

    let graph_hits = run_search(&nb, &search_args("跑", LanguageHint::Auto, 10, true))
        .await
        .unwrap();
    let translations: Vec<&str> = graph_hits
        .iter()
        .filter(|h| h.source == HitSource::TranslationEdge)
        .map(|h| h.chinese.as_str())
        .collect();
    assert_eq!(translations, vec!["跑步", "奔跑"]);
    assert!(graph_hits
        .iter()
        .any(|h| h.source == HitSource::SynonymEdge && h.detail == "lang=zh"));

    let capped = run_search(&nb, &search_args("跑", LanguageHint::Auto, 1, true))
        .await
        .unwrap();
    assert_eq!(capped.len(), 1);

    let found = run_lookup(&nb, "jog", LanguageHint::En).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].chinese, "冲刺");
}

#[tokio::test]
async fn import_is_all_or_nothing() {
    let temp = tempfile::tempdir().unwrap();
    let nb = Notebook::open(config_for(&temp.path().join("import.db")))
        .await
        .unwrap();
    let bad = temp.path().join("bad.csv");
    fs::write(&bad, "english,chinese,meaning_en,meaning_zh\none,一,,\n,,orphan meaning,\n").unwrap();
    let err = entries::import(&nb, &bad).await.unwrap_err();
    assert!(format!("{err:#}").contains("row 2"));
    assert!(entries::list(&nb, false).await.unwrap().is_empty());

    let good = temp.path().join("good.csv");
    fs::write(&good, "english,chinese\none,一\ntwo,二\nONE,一\n").unwrap();
    let ids = entries::import(&nb, &good).await.unwrap();
    assert_eq!(ids.len(), 3);
    assert_eq!(ids[0], ids[2]);
    assert_eq!(entries::list(&nb, false).await.unwrap().len(), 2);
}

#[tokio::test]
async fn init_loads_legacy_seed_once() {
    let temp = tempfile::tempdir().unwrap();
    let db = temp.path().join("seeded.db");
    let seed = temp.path().join("dump.sql");
    fs::write(
        &seed,
        "CREATE TABLE user_vocab(id INTEGER PRIMARY KEY AUTOINCREMENT, english TEXT, chinese TEXT, \
         meaning_en TEXT, meaning_zh TEXT, created_at TEXT, updated_at TEXT, UNIQUE(english, chinese));\n\
         INSERT INTO user_vocab(english, chinese, meaning_en, meaning_zh, created_at, updated_at) \
         VALUES ('tea', '茶', '', '', '2024-01-01 00:00:00', '2024-01-01 00:00:00');\n",
    )
    .unwrap();
    let db_str = db.to_string_lossy().into_owned();

    let first = corpus::run_init(&db_str, Some(&seed), false).await.unwrap();
    assert!(first.seeded);
    let second = corpus::run_init(&db_str, Some(&seed), false).await.unwrap();
    assert!(!second.seeded);

    let nb = Notebook::open(config_for(&db)).await.unwrap();
    let active = entries::list(&nb, false).await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].english, "tea");
    assert!(!active[0].deleted);

    let missing = temp.path().join("nope.sql");
    assert!(corpus::run_init(&db_str, Some(&missing), false).await.is_err());
}
