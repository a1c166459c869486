use std::collections::BTreeSet;

use anyhow::{Context, Result};
use rusqlite::Connection;
use rusqlite::types::Value as SqlValue;
use serde::Serialize;
use serde_json::Value;

use crate::dimensions::{self, Dimension};

use super::sql_value_to_json;

#[derive(Debug, Clone, Serialize)]
pub struct ModelEntry {
    pub model_filename: String,
    pub model_type: Option<String>,
    pub model_size: Option<i64>,
    pub model_n_params: Option<i64>,
}

pub fn models(connection: &Connection) -> Result<Vec<ModelEntry>> {
    let mut statement = connection
        .prepare(
            "
            SELECT DISTINCT model_filename, model_type, model_size, model_n_params
            FROM benchmarks
            WHERE model_filename IS NOT NULL
            ORDER BY model_filename ASC
            ",
        )
        .context("failed to prepare models query")?;

    let rows = statement
        .query_map([], |row| {
            Ok(ModelEntry {
                model_filename: row.get(0)?,
                model_type: row.get(1)?,
                model_size: row.get(2)?,
                model_n_params: row.get(3)?,
            })
        })
        .context("failed to run models query")?;

    rows.collect::<rusqlite::Result<Vec<_>>>()
        .context("failed to read model rows")
}

#[derive(Debug, Clone, Serialize)]
pub struct BuildEntry {
    pub build_commit: String,
    pub build_number: Option<i64>,
    pub latest_test_time: Option<String>,
}

/// One row per commit, most recently tested first.
pub fn builds(connection: &Connection) -> Result<Vec<BuildEntry>> {
    let mut statement = connection
        .prepare(
            "
            SELECT build_commit, MAX(build_number), MAX(test_time)
            FROM benchmarks
            WHERE build_commit IS NOT NULL
            GROUP BY build_commit
            ORDER BY MAX(test_time) DESC
            ",
        )
        .context("failed to prepare builds query")?;

    let rows = statement
        .query_map([], |row| {
            Ok(BuildEntry {
                build_commit: row.get(0)?,
                build_number: row.get(1)?,
                latest_test_time: row.get(2)?,
            })
        })
        .context("failed to run builds query")?;

    rows.collect::<rusqlite::Result<Vec<_>>>()
        .context("failed to read build rows")
}

/// Individual GPU names, alphabetically. Multi-GPU hosts store a single
/// ", "-joined string; that encoding is split here before deduplication.
pub fn gpus(connection: &Connection) -> Result<Vec<String>> {
    let mut statement = connection
        .prepare("SELECT DISTINCT gpu_info FROM benchmarks WHERE gpu_info IS NOT NULL")
        .context("failed to prepare gpus query")?;

    let rows = statement
        .query_map([], |row| row.get::<_, String>(0))
        .context("failed to run gpus query")?;

    let mut names = BTreeSet::new();
    for stored in rows {
        let stored = stored.context("failed to read gpu row")?;
        for name in stored.split(", ") {
            let name = name.trim();
            if !name.is_empty() {
                names.insert(name.to_string());
            }
        }
    }

    Ok(names.into_iter().collect())
}

pub fn main_gpus(connection: &Connection) -> Result<Vec<i64>> {
    let mut statement = connection
        .prepare(
            "SELECT DISTINCT main_gpu FROM benchmarks WHERE main_gpu IS NOT NULL \
             ORDER BY main_gpu ASC",
        )
        .context("failed to prepare main gpus query")?;

    let rows = statement
        .query_map([], |row| row.get(0))
        .context("failed to run main gpus query")?;

    rows.collect::<rusqlite::Result<Vec<_>>>()
        .context("failed to read main gpu rows")
}

pub fn split_modes(connection: &Connection) -> Result<Vec<String>> {
    let mut statement = connection
        .prepare(
            "SELECT DISTINCT split_mode FROM benchmarks WHERE split_mode IS NOT NULL \
             ORDER BY split_mode ASC",
        )
        .context("failed to prepare split modes query")?;

    let rows = statement
        .query_map([], |row| row.get(0))
        .context("failed to run split modes query")?;

    rows.collect::<rusqlite::Result<Vec<_>>>()
        .context("failed to read split mode rows")
}

#[derive(Debug, Clone, Serialize)]
pub struct DimensionValue {
    pub value: Value,
    pub count: i64,
}

/// Distinct stored values with occurrence counts for one dimension.
pub fn dimension_values(
    connection: &Connection,
    dimension: Dimension,
) -> Result<Vec<DimensionValue>> {
    let column = dimension.key();
    let sql = format!(
        "SELECT {column}, COUNT(*) FROM benchmarks WHERE {column} IS NOT NULL \
         GROUP BY {column} ORDER BY {column} ASC"
    );

    let mut statement = connection
        .prepare(&sql)
        .with_context(|| format!("failed to prepare value query for {column}"))?;
    let rows = statement
        .query_map([], |row| {
            Ok((row.get::<_, SqlValue>(0)?, row.get::<_, i64>(1)?))
        })
        .with_context(|| format!("failed to run value query for {column}"))?;

    let mut out = Vec::new();
    for row in rows {
        let (value, count) = row.with_context(|| format!("failed to read {column} value row"))?;
        out.push(DimensionValue {
            value: sql_value_to_json(value),
            count,
        });
    }

    Ok(out)
}

/// Filter-population convenience: every dimension's stored values in one
/// pass over the registry. Re-scans the table per dimension on every call.
pub fn all_dimension_values(
    connection: &Connection,
) -> Result<Vec<(Dimension, Vec<DimensionValue>)>> {
    let mut out = Vec::with_capacity(dimensions::ALL.len());
    for dimension in dimensions::ALL {
        out.push((dimension, dimension_values(connection, dimension)?));
    }
    Ok(out)
}
