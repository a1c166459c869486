//! Aggregation and lookup queries over the benchmarks table.
//!
//! Column and table identifiers interpolated into SQL here come only from
//! closed enums ([`crate::dimensions::Dimension`], [`trend::TrendColumn`])
//! or from fixed literals; every caller-supplied value is bound.

mod catalog;
mod compare;
mod list;
#[cfg(test)]
mod tests;
mod trend;

pub use catalog::{
    BuildEntry, DimensionValue, ModelEntry, all_dimension_values, builds, dimension_values, gpus,
    main_gpus, models, split_modes,
};
pub use compare::{CompareRow, StoreStats, compare, stats};
pub use list::{ListFilters, MultiFilters, list, list_filtered};
pub use trend::{
    DimensionalFilters, DimensionalTrendRow, SeriesPoint, TrendColumn, TrendFilters, TrendPoint,
    dimensional_trend, multi_series_trend, trend,
};

use rusqlite::Row;
use rusqlite::types::Value as SqlValue;
use serde_json::Value;

use crate::model::{BenchmarkRecord, TestType};

pub(crate) const RECORD_COLUMNS: &str = "id, created_at, build_commit, build_number, test_time, \
     cpu_info, gpu_info, backend, model_filename, model_type, model_size, model_n_params, \
     test_type, n_prompt, n_gen, n_depth, n_batch, n_ubatch, n_threads, n_gpu_layers, n_ctx, \
     flash_attn, cache_type_k, cache_type_v, embeddings, split_mode, main_gpu, \
     tokens_per_second, stddev, samples";

pub(crate) fn record_from_row(row: &Row) -> rusqlite::Result<BenchmarkRecord> {
    let test_type: Option<String> = row.get(12)?;

    Ok(BenchmarkRecord {
        id: row.get(0)?,
        created_at: row.get(1)?,
        build_commit: row.get(2)?,
        build_number: row.get(3)?,
        test_time: row.get(4)?,
        cpu_info: row.get(5)?,
        gpu_info: row.get(6)?,
        backend: row.get(7)?,
        model_filename: row.get(8)?,
        model_type: row.get(9)?,
        model_size: row.get(10)?,
        model_n_params: row.get(11)?,
        test_type: test_type.as_deref().and_then(TestType::parse),
        n_prompt: row.get(13)?,
        n_gen: row.get(14)?,
        n_depth: row.get(15)?,
        n_batch: row.get(16)?,
        n_ubatch: row.get(17)?,
        n_threads: row.get(18)?,
        n_gpu_layers: row.get(19)?,
        n_ctx: row.get(20)?,
        flash_attn: row.get(21)?,
        cache_type_k: row.get(22)?,
        cache_type_v: row.get(23)?,
        embeddings: row.get(24)?,
        split_mode: row.get(25)?,
        main_gpu: row.get(26)?,
        tokens_per_second: row.get(27)?,
        stddev: row.get(28)?,
        samples: row.get(29)?,
    })
}

pub(crate) fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

/// SQLite values keep their storage class when surfaced, so numeric
/// dimensions stay numbers in JSON output.
pub(crate) fn sql_value_to_json(value: SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::Null,
        SqlValue::Integer(number) => Value::from(number),
        SqlValue::Real(number) => serde_json::Number::from_f64(number)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        SqlValue::Text(text) => Value::String(text),
        SqlValue::Blob(_) => Value::Null,
    }
}
