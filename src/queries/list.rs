use anyhow::{Context, Result};
use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, params, params_from_iter};

use crate::dimensions::Dimension;
use crate::model::{BenchmarkRecord, TestType};

use super::{RECORD_COLUMNS, placeholders, record_from_row};

pub(crate) const DEFAULT_LIMIT: i64 = 100;

/// Simple single-valued filters for the listing view.
#[derive(Debug, Clone)]
pub struct ListFilters {
    /// Exact match.
    pub build_commit: Option<String>,
    /// Substring match on model filename.
    pub model: Option<String>,
    pub test_type: Option<TestType>,
    /// Inclusive test_time range bounds.
    pub test_time_from: Option<String>,
    pub test_time_to: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

impl Default for ListFilters {
    fn default() -> Self {
        Self {
            build_commit: None,
            model: None,
            test_type: None,
            test_time_from: None,
            test_time_to: None,
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

/// Newest-inserted first; `created_at` has second resolution, so id breaks
/// ties exactly along insertion order.
pub fn list(connection: &Connection, filters: &ListFilters) -> Result<Vec<BenchmarkRecord>> {
    let sql = format!(
        "
        SELECT {RECORD_COLUMNS}
        FROM benchmarks
        WHERE
          (?1 IS NULL OR build_commit = ?1)
          AND (?2 IS NULL OR model_filename LIKE '%' || ?2 || '%')
          AND (?3 IS NULL OR test_type = ?3)
          AND (?4 IS NULL OR test_time >= ?4)
          AND (?5 IS NULL OR test_time <= ?5)
        ORDER BY created_at DESC, id DESC
        LIMIT ?6 OFFSET ?7
        "
    );

    let limit = if filters.limit > 0 {
        filters.limit
    } else {
        DEFAULT_LIMIT
    };
    let offset = filters.offset.max(0);

    let mut statement = connection
        .prepare(&sql)
        .context("failed to prepare list query")?;
    let rows = statement
        .query_map(
            params![
                filters.build_commit,
                filters.model,
                filters.test_type.map(TestType::as_str),
                filters.test_time_from,
                filters.test_time_to,
                limit,
                offset,
            ],
            record_from_row,
        )
        .context("failed to run list query")?;

    rows.collect::<rusqlite::Result<Vec<_>>>()
        .context("failed to read list rows")
}

/// Multi-valued filters shared by `list_filtered` and the series trend.
#[derive(Debug, Clone, Default)]
pub struct MultiFilters {
    /// Exact filename set.
    pub models: Vec<String>,
    /// Substring set; a row matches when any entry appears in `gpu_info`.
    pub gpus: Vec<String>,
    pub test_types: Vec<TestType>,
    pub main_gpus: Vec<i64>,
    pub split_modes: Vec<String>,
    /// Registry-validated value-set filters.
    pub dimensions: Vec<(Dimension, Vec<String>)>,
    /// 0 means the default of 100.
    pub limit: i64,
}

pub(crate) fn append_multi_filters(
    sql: &mut String,
    values: &mut Vec<SqlValue>,
    filters: &MultiFilters,
) {
    if !filters.models.is_empty() {
        sql.push_str(&format!(
            " AND model_filename IN ({})",
            placeholders(filters.models.len())
        ));
        values.extend(filters.models.iter().cloned().map(SqlValue::Text));
    }

    if !filters.gpus.is_empty() {
        // gpu_info encodes multi-GPU hosts as a ", "-joined list; a substring
        // match against the whole field hits any listed GPU.
        let clauses = vec!["gpu_info LIKE '%' || ? || '%'"; filters.gpus.len()].join(" OR ");
        sql.push_str(&format!(" AND ({clauses})"));
        values.extend(filters.gpus.iter().cloned().map(SqlValue::Text));
    }

    if !filters.test_types.is_empty() {
        sql.push_str(&format!(
            " AND test_type IN ({})",
            placeholders(filters.test_types.len())
        ));
        values.extend(
            filters
                .test_types
                .iter()
                .map(|test_type| SqlValue::Text(test_type.as_str().to_string())),
        );
    }

    if !filters.main_gpus.is_empty() {
        sql.push_str(&format!(
            " AND main_gpu IN ({})",
            placeholders(filters.main_gpus.len())
        ));
        values.extend(filters.main_gpus.iter().copied().map(SqlValue::Integer));
    }

    if !filters.split_modes.is_empty() {
        sql.push_str(&format!(
            " AND split_mode IN ({})",
            placeholders(filters.split_modes.len())
        ));
        values.extend(filters.split_modes.iter().cloned().map(SqlValue::Text));
    }

    for (dimension, dim_values) in &filters.dimensions {
        if dim_values.is_empty() {
            continue;
        }
        sql.push_str(&format!(
            " AND {} IN ({})",
            dimension.key(),
            placeholders(dim_values.len())
        ));
        values.extend(dim_values.iter().map(|raw| dimension.bind_value(raw)));
    }
}

pub fn list_filtered(
    connection: &Connection,
    filters: &MultiFilters,
) -> Result<Vec<BenchmarkRecord>> {
    let mut sql = format!("SELECT {RECORD_COLUMNS} FROM benchmarks WHERE 1=1");
    let mut values = Vec::new();
    append_multi_filters(&mut sql, &mut values, filters);

    sql.push_str(" ORDER BY test_time DESC LIMIT ?");
    let limit = if filters.limit > 0 {
        filters.limit
    } else {
        DEFAULT_LIMIT
    };
    values.push(SqlValue::Integer(limit));

    let mut statement = connection
        .prepare(&sql)
        .context("failed to prepare filtered list query")?;
    let rows = statement
        .query_map(params_from_iter(values.iter()), record_from_row)
        .context("failed to run filtered list query")?;

    rows.collect::<rusqlite::Result<Vec<_>>>()
        .context("failed to read filtered list rows")
}
