use anyhow::Result;
use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use cli::corpus;
use cli::entries;
use cli::notebook::Notebook;
use cli::search::{self, SearchArgs};
use notebook_core::config;
use notebook_core::config::AppConfig;
use notebook_core::language::LanguageHint;
use notebook_core::models::{EntryPatch, NewEntry};
use std::path::PathBuf;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 1,
            };
            let _ = e.print();
            std::process::exit(code);
        }
    };
    let mut cfg = config::load(cli.config.as_deref())?;
    if let Some(db) = cli.db {
        cfg.database.path = db;
    }

    match cli.command {
        Commands::Init { seed_dump, rebuild } => run_init(cfg, seed_dump, rebuild).await,
        Commands::Record {
            english,
            chinese,
            meaning_en,
            meaning_zh,
        } => {
            let entry = NewEntry {
                english,
                chinese,
                meaning_en,
                meaning_zh,
            };
            let nb = Notebook::open(cfg).await?;
            let id = entries::record(&nb, entry).await?;
            println!("{id}");
            Ok(())
        }
        Commands::Update {
            id,
            english,
            chinese,
            meaning_en,
            meaning_zh,
        } => {
            let patch = EntryPatch {
                english,
                chinese,
                meaning_en,
                meaning_zh,
            };
            let nb = Notebook::open(cfg).await?;
            report_found(id, entries::update(&nb, id, patch).await?, "updated")
        }
        Commands::Delete { id } => {
            let nb = Notebook::open(cfg).await?;
            report_found(id, entries::delete(&nb, id).await?, "deleted")
        }
        Commands::Restore { id } => {
            let nb = Notebook::open(cfg).await?;
            report_found(id, entries::restore(&nb, id).await?, "restored")
        }
        Commands::List { deleted, json } => run_list(cfg, deleted, json).await,
        Commands::Import { file } => {
            let nb = Notebook::open(cfg).await?;
            let ids = entries::import(&nb, &file).await?;
            println!("imported {} entries", ids.len());
            Ok(())
        }
        Commands::Search {
            query,
            language,
            topk,
            include_graph_sources,
            json,
        } => {
            let args = SearchArgs {
                query,
                language: language.unwrap_or(cfg.search.language),
                topk: topk.unwrap_or(cfg.search.topk),
                include_graph_sources: include_graph_sources || cfg.search.include_graph_sources,
            };
            run_search(cfg, args, json).await
        }
        Commands::Lookup { query, language } => {
            let language = language.unwrap_or(cfg.search.language);
            let nb = Notebook::open(cfg).await?;
            for entry in search::run_lookup(&nb, &query, language).await? {
                println!("{}", entries::format_entry(&entry));
            }
            Ok(())
        }
        Commands::BuildGraph { json } => run_build_graph(cfg, json).await,
    }
}

#[derive(Parser)]
#[command(name = "vocab-notebook")]
#[command(about = "Bilingual vocabulary notebook with a synonym/translation graph", long_about = None)]
struct Cli {
    /// Path to config TOML
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Database path; overrides database.path from the config
    #[arg(long, global = true)]
    db: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the schema, loading a seed dump into a new database
    Init {
        /// SQL dump executed verbatim when the database is created
        #[arg(long)]
        seed_dump: Option<PathBuf>,
        /// Delete an existing database first
        #[arg(long, default_value_t = false)]
        rebuild: bool,
    },
    /// Record (or refresh) one entry and print its id
    Record {
        #[arg(long)]
        english: Option<String>,
        #[arg(long)]
        chinese: Option<String>,
        #[arg(long)]
        meaning_en: Option<String>,
        #[arg(long)]
        meaning_zh: Option<String>,
    },
    /// Change fields of an entry; omitted fields are kept
    Update {
        id: i64,
        #[arg(long)]
        english: Option<String>,
        #[arg(long)]
        chinese: Option<String>,
        #[arg(long)]
        meaning_en: Option<String>,
        #[arg(long)]
        meaning_zh: Option<String>,
    },
    /// Soft-delete an entry
    Delete { id: i64 },
    /// Restore a soft-deleted entry
    Restore { id: i64 },
    /// List active entries, or deleted ones with --deleted
    List {
        #[arg(long, default_value_t = false)]
        deleted: bool,
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
    /// Import entries from a CSV file with an english,chinese,meaning_en,meaning_zh header
    Import { file: PathBuf },
    /// Fuzzy search over entries and, optionally, the word graph
    Search {
        #[arg(short, long)]
        query: String,
        /// auto|en|zh|both
        #[arg(short, long)]
        language: Option<LanguageHint>,
        /// Number of results
        #[arg(short, long)]
        topk: Option<usize>,
        /// Also return substring matches from stored graph edges
        #[arg(long, default_value_t = false)]
        include_graph_sources: bool,
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
    /// Entries whose text equals the query or one of its synonyms
    Lookup {
        #[arg(short, long)]
        query: String,
        #[arg(short, long)]
        language: Option<LanguageHint>,
    },
    /// Ingest corpus sources, persist the graph and link entries to it
    BuildGraph {
        /// Output JSON summary
        #[arg(long)]
        json: bool,
    },
}

fn report_found(id: i64, found: bool, verb: &str) -> Result<()> {
    if !found {
        anyhow::bail!("entry {} not found", id);
    }
    println!("{verb} {id}");
    Ok(())
}

async fn run_init(cfg: AppConfig, seed_dump: Option<PathBuf>, rebuild: bool) -> Result<()> {
    let outcome = corpus::run_init(&cfg.database.path, seed_dump.as_deref(), rebuild).await?;
    println!(
        "initialized {} (created: {}, seeded: {})",
        cfg.database.path, outcome.created, outcome.seeded
    );
    Ok(())
}

async fn run_list(cfg: AppConfig, deleted: bool, json: bool) -> Result<()> {
    let nb = Notebook::open(cfg).await?;
    let list = entries::list(&nb, deleted).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&list)?);
    } else {
        for entry in &list {
            println!("{}", entries::format_entry(entry));
        }
    }
    Ok(())
}

async fn run_search(cfg: AppConfig, args: SearchArgs, json: bool) -> Result<()> {
    let nb = Notebook::open(cfg).await?;
    let hits = search::run_search(&nb, &args).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&hits)?);
    } else {
        for hit in &hits {
            println!("{}", search::format_hit(hit));
        }
    }
    Ok(())
}

async fn run_build_graph(cfg: AppConfig, json: bool) -> Result<()> {
    let nb = Notebook::open(cfg).await?;
    let summary = corpus::build_graph(&nb).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        for source in &summary.ingest.sources {
            let status = if source.available { "ok" } else { "unavailable" };
            println!(
                "{}\t{}\t{}\trows={}\tedges={}",
                source.kind, source.path, status, source.rows, source.edges_added
            );
        }
        println!(
            "persisted {} terms, {} synonym pairs, {} translation edges",
            summary.persisted.terms, summary.persisted.synonym_edges, summary.persisted.translation_edges
        );
        println!(
            "linked {} entries: {} exact, {} synonym, {} fuzzy",
            summary.links.entries, summary.links.exact, summary.links.synonym, summary.links.fuzzy
        );
    }
    Ok(())
}
