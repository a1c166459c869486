use anyhow::{Context, Result};
use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, params, params_from_iter};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::dimensions::Dimension;
use crate::model::TestType;

use super::list::{DEFAULT_LIMIT, MultiFilters, append_multi_filters};
use super::{placeholders, sql_value_to_json};

/// Columns a single-column trend may group by: a fixed base set plus any
/// registry dimension. Unrecognized names degrade to `BuildCommit` rather
/// than erroring, so loosely-typed callers always get a valid result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendColumn {
    BuildCommit,
    ModelFilename,
    ModelType,
    GpuInfo,
    TestType,
    Backend,
    Dim(Dimension),
}

impl TrendColumn {
    pub fn parse(key: &str) -> Self {
        match key {
            "build_commit" => Self::BuildCommit,
            "model_filename" => Self::ModelFilename,
            "model_type" => Self::ModelType,
            "gpu_info" => Self::GpuInfo,
            "test_type" => Self::TestType,
            "backend" => Self::Backend,
            other => match Dimension::from_key(other) {
                Some(dimension) => Self::Dim(dimension),
                None => Self::BuildCommit,
            },
        }
    }

    pub fn column(self) -> &'static str {
        match self {
            Self::BuildCommit => "build_commit",
            Self::ModelFilename => "model_filename",
            Self::ModelType => "model_type",
            Self::GpuInfo => "gpu_info",
            Self::TestType => "test_type",
            Self::Backend => "backend",
            Self::Dim(dimension) => dimension.key(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TrendFilters {
    pub test_type: TestType,
    /// Substring match on model filename.
    pub model: Option<String>,
}

impl Default for TrendFilters {
    fn default() -> Self {
        Self {
            test_type: TestType::Tg,
            model: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TrendPoint {
    pub group_value: Value,
    pub test_time: Option<String>,
    pub avg_tps: f64,
    pub min_tps: f64,
    pub max_tps: f64,
    pub sample_count: i64,
}

/// Throughput per (group value, test_time), ascending by test_time.
pub fn trend(
    connection: &Connection,
    filters: &TrendFilters,
    column: TrendColumn,
) -> Result<Vec<TrendPoint>> {
    let column = column.column();
    let sql = format!(
        "
        SELECT
          {column},
          test_time,
          AVG(tokens_per_second),
          MIN(tokens_per_second),
          MAX(tokens_per_second),
          COUNT(*)
        FROM benchmarks
        WHERE
          test_type = ?1
          AND (?2 IS NULL OR model_filename LIKE '%' || ?2 || '%')
          AND tokens_per_second IS NOT NULL
        GROUP BY {column}, test_time
        ORDER BY test_time ASC
        "
    );

    let mut statement = connection
        .prepare(&sql)
        .context("failed to prepare trend query")?;
    let rows = statement
        .query_map(
            params![filters.test_type.as_str(), filters.model],
            |row| {
                Ok(TrendPoint {
                    group_value: sql_value_to_json(row.get(0)?),
                    test_time: row.get(1)?,
                    avg_tps: row.get(2)?,
                    min_tps: row.get(3)?,
                    max_tps: row.get(4)?,
                    sample_count: row.get(5)?,
                })
            },
        )
        .context("failed to run trend query")?;

    rows.collect::<rusqlite::Result<Vec<_>>>()
        .context("failed to read trend rows")
}

/// Value-set filters for the dimensional trend.
#[derive(Debug, Clone, Default)]
pub struct DimensionalFilters {
    pub models: Vec<String>,
    pub test_types: Vec<TestType>,
    pub dimensions: Vec<(Dimension, Vec<String>)>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DimensionalTrendRow {
    /// Grouping column -> value, in grouping order.
    pub group: Map<String, Value>,
    pub avg_tps: f64,
    pub min_tps: f64,
    pub max_tps: f64,
    pub avg_stddev: Option<f64>,
    pub sample_count: i64,
    /// Latest test_time within the group.
    pub test_time: Option<String>,
}

/// Pivot-style trend: always grouped by (build_commit, model_filename,
/// test_type), plus any caller-selected dimensions with duplicates
/// collapsed.
pub fn dimensional_trend(
    connection: &Connection,
    extra_dimensions: &[Dimension],
    filters: &DimensionalFilters,
) -> Result<Vec<DimensionalTrendRow>> {
    let mut columns: Vec<&'static str> = vec!["build_commit", "model_filename", "test_type"];
    for dimension in extra_dimensions {
        if !columns.contains(&dimension.key()) {
            columns.push(dimension.key());
        }
    }
    let group_columns = columns.join(", ");

    let mut sql = format!(
        "SELECT {group_columns}, AVG(tokens_per_second), MIN(tokens_per_second), \
         MAX(tokens_per_second), AVG(stddev), COUNT(*), MAX(test_time) \
         FROM benchmarks WHERE tokens_per_second IS NOT NULL"
    );
    let mut values = Vec::new();

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

    if !filters.models.is_empty() {
        sql.push_str(&format!(
            " AND model_filename IN ({})",
            placeholders(filters.models.len())
        ));
        values.extend(filters.models.iter().cloned().map(SqlValue::Text));
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

    sql.push_str(&format!(
        " GROUP BY {group_columns} ORDER BY MAX(test_time) ASC"
    ));

    let column_count = columns.len();
    let mut statement = connection
        .prepare(&sql)
        .context("failed to prepare dimensional trend query")?;
    let rows = statement
        .query_map(params_from_iter(values.iter()), |row| {
            let mut group = Map::new();
            for (index, column) in columns.iter().enumerate() {
                group.insert(
                    (*column).to_string(),
                    sql_value_to_json(row.get(index)?),
                );
            }
            Ok(DimensionalTrendRow {
                group,
                avg_tps: row.get(column_count)?,
                min_tps: row.get(column_count + 1)?,
                max_tps: row.get(column_count + 2)?,
                avg_stddev: row.get(column_count + 3)?,
                sample_count: row.get(column_count + 4)?,
                test_time: row.get(column_count + 5)?,
            })
        })
        .context("failed to run dimensional trend query")?;

    rows.collect::<rusqlite::Result<Vec<_>>>()
        .context("failed to read dimensional trend rows")
}

#[derive(Debug, Clone, Serialize)]
pub struct SeriesPoint {
    pub build_commit: Option<String>,
    pub model_filename: Option<String>,
    pub gpu_info: Option<String>,
    pub test_type: Option<String>,
    pub avg_tps: f64,
    pub min_tps: f64,
    pub max_tps: f64,
    pub avg_stddev: Option<f64>,
    pub sample_count: i64,
    pub test_time: Option<String>,
}

/// Fixed (commit, model, gpu, test type) series with the `list_filtered`
/// filter vocabulary and row bound; secondary ordering keeps series
/// rendering stable.
pub fn multi_series_trend(
    connection: &Connection,
    filters: &MultiFilters,
) -> Result<Vec<SeriesPoint>> {
    let mut sql = String::from(
        "SELECT build_commit, model_filename, gpu_info, test_type, \
         AVG(tokens_per_second), MIN(tokens_per_second), MAX(tokens_per_second), \
         AVG(stddev), COUNT(*), MAX(test_time) \
         FROM benchmarks WHERE tokens_per_second IS NOT NULL",
    );
    let mut values = Vec::new();
    append_multi_filters(&mut sql, &mut values, filters);

    sql.push_str(
        " GROUP BY build_commit, model_filename, gpu_info, test_type \
         ORDER BY MAX(test_time) ASC, model_filename ASC, gpu_info ASC, test_type ASC \
         LIMIT ?",
    );
    let limit = if filters.limit > 0 {
        filters.limit
    } else {
        DEFAULT_LIMIT
    };
    values.push(SqlValue::Integer(limit));

    let mut statement = connection
        .prepare(&sql)
        .context("failed to prepare series trend query")?;
    let rows = statement
        .query_map(params_from_iter(values.iter()), |row| {
            Ok(SeriesPoint {
                build_commit: row.get(0)?,
                model_filename: row.get(1)?,
                gpu_info: row.get(2)?,
                test_type: row.get(3)?,
                avg_tps: row.get(4)?,
                min_tps: row.get(5)?,
                max_tps: row.get(6)?,
                avg_stddev: row.get(7)?,
                sample_count: row.get(8)?,
                test_time: row.get(9)?,
            })
        })
        .context("failed to run series trend query")?;

    rows.collect::<rusqlite::Result<Vec<_>>>()
        .context("failed to read series trend rows")
}
