use std::path::Path;

use anyhow::{Context, Result, bail};
use rusqlite::{Connection, OpenFlags, Statement, params};

use crate::model::{BenchmarkRecord, TestType};
use crate::util::{ensure_directory, now_utc_string};

/// Open (creating if needed) the benchmark database for writing, with WAL
/// journaling and the current schema applied.
pub fn open(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        ensure_directory(parent)?;
    }

    let connection = Connection::open(path)
        .with_context(|| format!("failed to open database: {}", path.display()))?;
    configure_connection(&connection)?;
    initialize(&connection)?;

    Ok(connection)
}

/// Open an existing database read-only for query commands.
pub fn open_read_only(path: &Path) -> Result<Connection> {
    Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .with_context(|| {
        format!(
            "failed to open database read-only: {} (submit records first)",
            path.display()
        )
    })
}

fn configure_connection(connection: &Connection) -> Result<()> {
    for (pragma, value) in [("journal_mode", "WAL"), ("synchronous", "NORMAL")] {
        connection
            .pragma_update(None, pragma, value)
            .with_context(|| format!("failed to apply pragma {pragma}={value}"))?;
    }
    Ok(())
}

/// Reconcile the benchmarks table against the target column set. Evolution
/// is forward-only and additive: missing columns are appended with null (or
/// zero) defaults, nothing is dropped, renamed, or retyped, and existing
/// rows are never touched.
pub fn initialize(connection: &Connection) -> Result<()> {
    connection.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS benchmarks (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          created_at TEXT NOT NULL,
          build_commit TEXT,
          build_number INTEGER,
          test_time TEXT,
          cpu_info TEXT,
          gpu_info TEXT,
          backend TEXT,
          model_filename TEXT,
          model_type TEXT,
          model_size INTEGER,
          model_n_params INTEGER,
          test_type TEXT,
          n_prompt INTEGER,
          n_gen INTEGER,
          n_depth INTEGER,
          n_batch INTEGER,
          n_ubatch INTEGER,
          n_threads INTEGER,
          n_gpu_layers INTEGER,
          n_ctx INTEGER,
          flash_attn INTEGER NOT NULL DEFAULT 0,
          cache_type_k TEXT,
          cache_type_v TEXT,
          embeddings INTEGER NOT NULL DEFAULT 0,
          split_mode TEXT,
          main_gpu INTEGER,
          tokens_per_second REAL,
          stddev REAL,
          samples TEXT
        );
        ",
    )?;

    // Columns added after the first released schema; tables created by an
    // older binary gain them here.
    ensure_column_exists(connection, "benchmarks", "n_depth INTEGER")?;
    ensure_column_exists(connection, "benchmarks", "n_ubatch INTEGER")?;
    ensure_column_exists(connection, "benchmarks", "n_ctx INTEGER")?;
    ensure_column_exists(connection, "benchmarks", "cache_type_k TEXT")?;
    ensure_column_exists(connection, "benchmarks", "cache_type_v TEXT")?;
    ensure_column_exists(connection, "benchmarks", "embeddings INTEGER NOT NULL DEFAULT 0")?;
    ensure_column_exists(connection, "benchmarks", "split_mode TEXT")?;
    ensure_column_exists(connection, "benchmarks", "main_gpu INTEGER")?;

    connection.execute_batch(
        "
        CREATE INDEX IF NOT EXISTS idx_benchmarks_build_commit ON benchmarks(build_commit);
        CREATE INDEX IF NOT EXISTS idx_benchmarks_model_filename ON benchmarks(model_filename);
        CREATE INDEX IF NOT EXISTS idx_benchmarks_test_time ON benchmarks(test_time);
        CREATE INDEX IF NOT EXISTS idx_benchmarks_test_type ON benchmarks(test_type);
        CREATE INDEX IF NOT EXISTS idx_benchmarks_gpu_info ON benchmarks(gpu_info);
        ",
    )?;

    Ok(())
}

fn ensure_column_exists(connection: &Connection, table: &str, definition: &str) -> Result<()> {
    let Some(column) = definition.split_whitespace().next() else {
        bail!("column definition {definition:?} has no name");
    };

    let mut statement = connection
        .prepare(&format!("PRAGMA table_info({table})"))
        .with_context(|| format!("failed to read column list for {table}"))?;
    let existing = statement
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    if existing.iter().any(|name| name == column) {
        return Ok(());
    }

    connection
        .execute(&format!("ALTER TABLE {table} ADD COLUMN {definition}"), [])
        .with_context(|| format!("failed to append column {column} to {table}"))?;

    Ok(())
}

const INSERT_SQL: &str = "
    INSERT INTO benchmarks(
      created_at, build_commit, build_number, test_time, cpu_info, gpu_info,
      backend, model_filename, model_type, model_size, model_n_params,
      test_type, n_prompt, n_gen, n_depth, n_batch, n_ubatch, n_threads,
      n_gpu_layers, n_ctx, flash_attn, cache_type_k, cache_type_v, embeddings,
      split_mode, main_gpu, tokens_per_second, stddev, samples
    ) VALUES (
      ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16,
      ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27, ?28, ?29
    )
    ";

fn execute_insert(
    statement: &mut Statement<'_>,
    record: &BenchmarkRecord,
    created_at: &str,
) -> rusqlite::Result<usize> {
    statement.execute(params![
        created_at,
        record.build_commit,
        record.build_number,
        record.test_time,
        record.cpu_info,
        record.gpu_info,
        record.backend,
        record.model_filename,
        record.model_type,
        record.model_size,
        record.model_n_params,
        record.test_type.map(TestType::as_str),
        record.n_prompt,
        record.n_gen,
        record.n_depth,
        record.n_batch,
        record.n_ubatch,
        record.n_threads,
        record.n_gpu_layers,
        record.n_ctx,
        record.flash_attn,
        record.cache_type_k,
        record.cache_type_v,
        record.embeddings,
        record.split_mode,
        record.main_gpu,
        record.tokens_per_second,
        record.stddev,
        record.samples,
    ])
}

pub fn insert_one(connection: &Connection, record: &BenchmarkRecord) -> Result<i64> {
    let created_at = now_utc_string();
    let mut statement = connection
        .prepare(INSERT_SQL)
        .context("failed to prepare benchmark insert")?;
    execute_insert(&mut statement, record, &created_at)
        .context("failed to insert benchmark record")?;
    Ok(connection.last_insert_rowid())
}

/// Insert a batch atomically: either every record commits or none do.
pub fn insert_many(connection: &mut Connection, records: &[BenchmarkRecord]) -> Result<usize> {
    let created_at = now_utc_string();
    let tx = connection.transaction()?;

    {
        let mut statement = tx
            .prepare(INSERT_SQL)
            .context("failed to prepare benchmark insert")?;
        for record in records {
            execute_insert(&mut statement, record, &created_at)
                .context("failed to insert benchmark record")?;
        }
    }

    tx.commit().context("failed to commit benchmark batch")?;
    Ok(records.len())
}

/// Delete rows by id. Ids that are not present are ignored; an empty id set
/// is a no-op returning 0.
pub fn delete_by_ids(connection: &Connection, ids: &[i64]) -> Result<usize> {
    if ids.is_empty() {
        return Ok(0);
    }

    let placeholders = vec!["?"; ids.len()].join(", ");
    let sql = format!("DELETE FROM benchmarks WHERE id IN ({placeholders})");
    let deleted = connection
        .execute(&sql, rusqlite::params_from_iter(ids.iter()))
        .context("failed to delete benchmark records")?;

    Ok(deleted)
}
