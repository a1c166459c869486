use anyhow::{Context, Result};
use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, params_from_iter};
use serde::Serialize;

use crate::model::{BenchmarkRecord, TestType};

use super::{RECORD_COLUMNS, placeholders, record_from_row};

#[derive(Debug, Clone, Serialize)]
pub struct CompareRow {
    pub model_filename: Option<String>,
    pub build_commit: Option<String>,
    pub test_type: TestType,
    pub avg_tps: f64,
    pub avg_stddev: Option<f64>,
    pub runs: i64,
}

/// Average throughput per (model, commit) pair for one test type,
/// optionally restricted to exact model/commit sets.
pub fn compare(
    connection: &Connection,
    models: &[String],
    commits: &[String],
    test_type: TestType,
) -> Result<Vec<CompareRow>> {
    let mut sql = String::from(
        "SELECT model_filename, build_commit, AVG(tokens_per_second), AVG(stddev), COUNT(*) \
         FROM benchmarks WHERE test_type = ? AND tokens_per_second IS NOT NULL",
    );
    let mut values = vec![SqlValue::Text(test_type.as_str().to_string())];

    if !models.is_empty() {
        sql.push_str(&format!(
            " AND model_filename IN ({})",
            placeholders(models.len())
        ));
        values.extend(models.iter().cloned().map(SqlValue::Text));
    }

    if !commits.is_empty() {
        sql.push_str(&format!(
            " AND build_commit IN ({})",
            placeholders(commits.len())
        ));
        values.extend(commits.iter().cloned().map(SqlValue::Text));
    }

    sql.push_str(
        " GROUP BY model_filename, build_commit ORDER BY model_filename ASC, build_commit ASC",
    );

    let mut statement = connection
        .prepare(&sql)
        .context("failed to prepare compare query")?;
    let rows = statement
        .query_map(params_from_iter(values.iter()), |row| {
            Ok(CompareRow {
                model_filename: row.get(0)?,
                build_commit: row.get(1)?,
                test_type,
                avg_tps: row.get(2)?,
                avg_stddev: row.get(3)?,
                runs: row.get(4)?,
            })
        })
        .context("failed to run compare query")?;

    rows.collect::<rusqlite::Result<Vec<_>>>()
        .context("failed to read compare rows")
}

#[derive(Debug, Serialize)]
pub struct StoreStats {
    pub total_benchmarks: i64,
    pub unique_models: i64,
    pub unique_builds: i64,
    pub avg_tg_tps: Option<f64>,
    pub avg_pp_tps: Option<f64>,
    pub latest_test: Option<String>,
    /// The 10 most recently inserted records, insertion order.
    pub recent: Vec<BenchmarkRecord>,
}

pub fn stats(connection: &Connection) -> Result<StoreStats> {
    let mut stats = connection
        .query_row(
            "
            SELECT
              COUNT(*),
              COUNT(DISTINCT model_filename),
              COUNT(DISTINCT build_commit),
              AVG(CASE WHEN test_type = 'tg' THEN tokens_per_second END),
              AVG(CASE WHEN test_type = 'pp' THEN tokens_per_second END),
              MAX(test_time)
            FROM benchmarks
            ",
            [],
            |row| {
                Ok(StoreStats {
                    total_benchmarks: row.get(0)?,
                    unique_models: row.get(1)?,
                    unique_builds: row.get(2)?,
                    avg_tg_tps: row.get(3)?,
                    avg_pp_tps: row.get(4)?,
                    latest_test: row.get(5)?,
                    recent: Vec::new(),
                })
            },
        )
        .context("failed to run stats query")?;

    let sql = format!(
        "SELECT {RECORD_COLUMNS} FROM benchmarks ORDER BY created_at DESC, id DESC LIMIT 10"
    );
    let mut statement = connection
        .prepare(&sql)
        .context("failed to prepare recent records query")?;
    let rows = statement
        .query_map([], record_from_row)
        .context("failed to run recent records query")?;
    stats.recent = rows
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("failed to read recent records")?;

    Ok(stats)
}
