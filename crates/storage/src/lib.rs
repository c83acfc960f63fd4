//! Storage layer: SQLite schema and helpers.
//!
//! Holds DB pool setup, the migration runner and seed-dump loading.

pub mod models;

use anyhow::Context;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Executor, Row, SqlitePool};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, warn};

/// Builds connect options from either a `sqlite:` URL or a plain file path.
pub fn connect_options(database: &str) -> anyhow::Result<SqliteConnectOptions> {
    let opts = if database.starts_with("sqlite:") {
        SqliteConnectOptions::from_str(database)?
    } else {
        let path = PathBuf::from(database);
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                let _ = std::fs::create_dir_all(parent);
            }
        }
        SqliteConnectOptions::new().filename(path)
    };
    Ok(opts.create_if_missing(true))
}

pub async fn connect(database: &str) -> anyhow::Result<SqlitePool> {
    let opts = connect_options(database)?;
    let mut pool_opts = SqlitePoolOptions::new();
    if database.contains("memory") {
        pool_opts = pool_opts.max_connections(1);
    } else {
        pool_opts = pool_opts.max_connections(5);
    }
    let pool = pool_opts.connect_with(opts).await?;
    Ok(pool)
}

pub async fn migrate(pool: &SqlitePool) -> anyhow::Result<()> {
    // Applies SQLx migrations located in crates/storage/migrations.
    // Safe to run multiple times (idempotent).
    sqlx::migrate!("./migrations").run(pool).await?;
    ensure_columns(pool).await?;
    Ok(())
}

/// Older dumps predate soft deletion; add the flag when it is missing.
async fn ensure_columns(pool: &SqlitePool) -> anyhow::Result<()> {
    let rows = sqlx::query("PRAGMA table_info(user_vocab)")
        .fetch_all(pool)
        .await?;
    let has_deleted = rows
        .iter()
        .any(|r| r.try_get::<String, _>("name").map(|n| n == "deleted").unwrap_or(false));
    if !has_deleted {
        warn!("user_vocab has no deleted column; adding it");
        sqlx::query("ALTER TABLE user_vocab ADD COLUMN deleted INTEGER DEFAULT 0")
            .execute(pool)
            .await?;
    }
    Ok(())
}

/// Executes a SQL dump as-is against the pool.
pub async fn load_seed(pool: &SqlitePool, dump: &Path) -> anyhow::Result<()> {
    let sql = std::fs::read_to_string(dump)
        .with_context(|| format!("read seed dump {}", dump.display()))?;
    pool.execute(sql.as_str())
        .await
        .with_context(|| format!("execute seed dump {}", dump.display()))?;
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitOutcome {
    pub created: bool,
    pub seeded: bool,
}

/// Opens (creating if needed) the database at `path`, loads `seed` when the
/// file did not exist before or `rebuild` is set, then applies the schema.
pub async fn init_database(
    path: &str,
    seed: Option<&Path>,
    rebuild: bool,
) -> anyhow::Result<(SqlitePool, InitOutcome)> {
    let on_disk = !path.starts_with("sqlite:");
    let existed = on_disk && Path::new(path).exists();
    if rebuild && existed {
        info!("Rebuilding database at {}", path);
        std::fs::remove_file(path).with_context(|| format!("remove {}", path))?;
    }
    let fresh = !existed || rebuild;

    let pool = connect(path).await.context("db connect")?;
    let mut seeded = false;
    if let Some(dump) = seed {
        if fresh {
            info!("Loading seed dump {}", dump.display());
            load_seed(&pool, dump).await?;
            seeded = true;
        }
    }
    migrate(&pool).await.context("db migrate")?;
    Ok((
        pool,
        InitOutcome {
            created: fresh,
            seeded,
        },
    ))
}
