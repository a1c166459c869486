use rusqlite::Connection;
use serde_json::{Map, Value, json};

use crate::dimensions::Dimension;
use crate::model::{TestType, parse_jsonl, transform};
use crate::store;

use super::*;

fn memory_store() -> Connection {
    let connection = Connection::open_in_memory().expect("in-memory DB should open");
    store::initialize(&connection).expect("schema should apply");
    connection
}

fn seed(connection: &Connection, json: &str) -> i64 {
    let raw: Map<String, Value> = match serde_json::from_str(json).expect("payload parses") {
        Value::Object(object) => object,
        other => panic!("payload is not an object: {other}"),
    };
    store::insert_one(connection, &transform(&raw)).expect("insert")
}

#[test]
fn submitted_jsonl_round_trips_through_list() {
    let mut connection = memory_store();

    let payload = concat!(
        "{\"n_prompt\":512,\"n_gen\":0,\"avg_ts\":120.5,",
        "\"model_filename\":\"a.gguf\",\"build_commit\":\"abc123\"}\n",
        "{\"n_prompt\":0,\"n_gen\":128,\"avg_ts\":45.2,",
        "\"model_filename\":\"a.gguf\",\"build_commit\":\"abc123\"}\n",
    );
    let raws = parse_jsonl(payload).expect("valid jsonl");
    let records: Vec<_> = raws.iter().map(transform).collect();
    let inserted = store::insert_many(&mut connection, &records).expect("batch insert");
    assert_eq!(inserted, 2);

    let filters = ListFilters {
        model: Some("a.gguf".to_string()),
        ..ListFilters::default()
    };
    let rows = list(&connection, &filters).expect("list");
    assert_eq!(rows.len(), 2);

    // newest-inserted first: the tg row was inserted second
    assert_eq!(rows[0].test_type, Some(TestType::Tg));
    assert_eq!(rows[0].tokens_per_second, Some(45.2));
    assert_eq!(rows[1].test_type, Some(TestType::Pp));
    assert_eq!(rows[1].tokens_per_second, Some(120.5));
}

#[test]
fn compare_aggregates_model_commit_pairs() {
    let connection = memory_store();
    seed(
        &connection,
        r#"{"n_prompt":512,"n_gen":0,"avg_ts":120.5,"model_filename":"a.gguf","build_commit":"abc123"}"#,
    );
    seed(
        &connection,
        r#"{"n_prompt":0,"n_gen":128,"avg_ts":45.2,"model_filename":"a.gguf","build_commit":"abc123"}"#,
    );

    let rows = compare(
        &connection,
        &["a.gguf".to_string()],
        &["abc123".to_string()],
        TestType::Tg,
    )
    .expect("compare");

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].model_filename.as_deref(), Some("a.gguf"));
    assert_eq!(rows[0].build_commit.as_deref(), Some("abc123"));
    assert_eq!(rows[0].test_type, TestType::Tg);
    assert_eq!(rows[0].avg_tps, 45.2);
    assert_eq!(rows[0].runs, 1);
}

#[test]
fn gpus_splits_multi_gpu_strings_before_deduplication() {
    let connection = memory_store();
    seed(&connection, r#"{"n_gen":1,"gpu_info":"RTX 4090"}"#);
    seed(&connection, r#"{"n_gen":1,"gpu_info":"RTX 4090, RTX 3090"}"#);

    let names = gpus(&connection).expect("gpus");
    assert_eq!(names, vec!["RTX 3090".to_string(), "RTX 4090".to_string()]);
}

#[test]
fn builds_returns_one_row_per_commit_newest_first() {
    let connection = memory_store();
    seed(
        &connection,
        r#"{"n_gen":1,"build_commit":"old","build_number":10,"test_time":"2026-01-01T00:00:00Z"}"#,
    );
    seed(
        &connection,
        r#"{"n_gen":1,"build_commit":"old","build_number":10,"test_time":"2026-01-02T00:00:00Z"}"#,
    );
    seed(
        &connection,
        r#"{"n_gen":1,"build_commit":"new","build_number":11,"test_time":"2026-02-01T00:00:00Z"}"#,
    );

    let entries = builds(&connection).expect("builds");
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].build_commit, "new");
    assert_eq!(entries[1].build_commit, "old");
    assert_eq!(
        entries[1].latest_test_time.as_deref(),
        Some("2026-01-02T00:00:00Z")
    );
}

#[test]
fn trend_parse_falls_back_to_build_commit() {
    assert_eq!(
        TrendColumn::parse("nonexistent_column"),
        TrendColumn::BuildCommit
    );
    assert_eq!(
        TrendColumn::parse("n_gpu_layers"),
        TrendColumn::Dim(Dimension::NGpuLayers)
    );
    assert_eq!(TrendColumn::parse("gpu_info"), TrendColumn::GpuInfo);

    let connection = memory_store();
    seed(
        &connection,
        r#"{"n_gen":128,"avg_ts":40.0,"build_commit":"abc","test_time":"2026-01-01T00:00:00Z"}"#,
    );

    let points = trend(
        &connection,
        &TrendFilters::default(),
        TrendColumn::parse("nonexistent_column"),
    )
    .expect("trend must not raise on unknown columns");
    assert_eq!(points.len(), 1);
    assert_eq!(points[0].group_value, json!("abc"));
    assert_eq!(points[0].avg_tps, 40.0);
    assert_eq!(points[0].sample_count, 1);
}

#[test]
fn trend_filters_by_test_type_and_model_substring() {
    let connection = memory_store();
    seed(
        &connection,
        r#"{"n_gen":128,"avg_ts":40.0,"model_filename":"llama-7b.gguf","build_commit":"abc","test_time":"2026-01-01T00:00:00Z"}"#,
    );
    seed(
        &connection,
        r#"{"n_prompt":512,"avg_ts":120.0,"model_filename":"llama-7b.gguf","build_commit":"abc","test_time":"2026-01-01T00:00:00Z"}"#,
    );
    seed(
        &connection,
        r#"{"n_gen":128,"avg_ts":90.0,"model_filename":"mistral.gguf","build_commit":"abc","test_time":"2026-01-02T00:00:00Z"}"#,
    );

    let filters = TrendFilters {
        test_type: TestType::Tg,
        model: Some("llama".to_string()),
    };
    let points = trend(&connection, &filters, TrendColumn::BuildCommit).expect("trend");
    assert_eq!(points.len(), 1);
    assert_eq!(points[0].avg_tps, 40.0);
}

#[test]
fn list_filtered_matches_any_gpu_substring_and_dimension_sets() {
    let connection = memory_store();
    seed(
        &connection,
        r#"{"n_gen":1,"gpu_info":"RTX 4090, RTX 3090","n_batch":512,"test_time":"2026-01-01T00:00:00Z"}"#,
    );
    seed(
        &connection,
        r#"{"n_gen":1,"gpu_info":"A100","n_batch":1024,"test_time":"2026-01-02T00:00:00Z"}"#,
    );

    let filters = MultiFilters {
        gpus: vec!["RTX 3090".to_string()],
        ..MultiFilters::default()
    };
    let rows = list_filtered(&connection, &filters).expect("gpu filter");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].n_batch, Some(512));

    let filters = MultiFilters {
        dimensions: vec![(Dimension::NBatch, vec!["1024".to_string()])],
        ..MultiFilters::default()
    };
    let rows = list_filtered(&connection, &filters).expect("dimension filter");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].gpu_info.as_deref(), Some("A100"));

    // newest test_time first when nothing filters
    let rows = list_filtered(&connection, &MultiFilters::default()).expect("unfiltered");
    assert_eq!(rows[0].n_batch, Some(1024));
}

#[test]
fn dimensional_trend_groups_by_base_identity_plus_extras() {
    let connection = memory_store();
    seed(
        &connection,
        r#"{"n_gen":128,"avg_ts":40.0,"stddev_ts":0.5,"model_filename":"a.gguf","build_commit":"abc","n_gpu_layers":99,"test_time":"2026-01-01T00:00:00Z"}"#,
    );
    seed(
        &connection,
        r#"{"n_gen":128,"avg_ts":44.0,"stddev_ts":0.7,"model_filename":"a.gguf","build_commit":"abc","n_gpu_layers":99,"test_time":"2026-01-02T00:00:00Z"}"#,
    );
    seed(
        &connection,
        r#"{"n_gen":128,"avg_ts":10.0,"model_filename":"a.gguf","build_commit":"abc","n_gpu_layers":0,"test_time":"2026-01-03T00:00:00Z"}"#,
    );

    // duplicate selection collapses to one grouping column
    let rows = dimensional_trend(
        &connection,
        &[Dimension::NGpuLayers, Dimension::NGpuLayers],
        &DimensionalFilters::default(),
    )
    .expect("dimensional trend");

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].group["n_gpu_layers"], json!(99));
    assert_eq!(rows[0].avg_tps, 42.0);
    assert_eq!(rows[0].sample_count, 2);
    assert_eq!(rows[0].test_time.as_deref(), Some("2026-01-02T00:00:00Z"));
    assert_eq!(rows[1].group["n_gpu_layers"], json!(0));
    assert_eq!(rows[1].group["build_commit"], json!("abc"));

    let filters = DimensionalFilters {
        dimensions: vec![(Dimension::NGpuLayers, vec!["99".to_string()])],
        ..DimensionalFilters::default()
    };
    let rows = dimensional_trend(&connection, &[Dimension::NGpuLayers], &filters)
        .expect("filtered dimensional trend");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].sample_count, 2);
}

#[test]
fn multi_series_trend_orders_series_stably() {
    let connection = memory_store();
    seed(
        &connection,
        r#"{"n_gen":128,"avg_ts":40.0,"model_filename":"a.gguf","build_commit":"abc","gpu_info":"A100","test_time":"2026-01-01T00:00:00Z"}"#,
    );
    seed(
        &connection,
        r#"{"n_gen":128,"avg_ts":50.0,"model_filename":"a.gguf","build_commit":"abc","gpu_info":"RTX 4090","test_time":"2026-01-01T00:00:00Z"}"#,
    );
    seed(
        &connection,
        r#"{"n_prompt":512,"avg_ts":300.0,"model_filename":"a.gguf","build_commit":"abc","gpu_info":"A100","test_time":"2026-01-02T00:00:00Z"}"#,
    );

    let points =
        multi_series_trend(&connection, &MultiFilters::default()).expect("series trend");
    assert_eq!(points.len(), 3);
    assert_eq!(points[0].gpu_info.as_deref(), Some("A100"));
    assert_eq!(points[0].test_type.as_deref(), Some("tg"));
    assert_eq!(points[1].gpu_info.as_deref(), Some("RTX 4090"));
    assert_eq!(points[2].test_type.as_deref(), Some("pp"));

    let filters = MultiFilters {
        test_types: vec![TestType::Pp],
        ..MultiFilters::default()
    };
    let points = multi_series_trend(&connection, &filters).expect("filtered series");
    assert_eq!(points.len(), 1);
    assert_eq!(points[0].avg_tps, 300.0);
}

#[test]
fn multi_series_trend_bounds_series_count() {
    let connection = memory_store();
    for index in 0..5 {
        seed(
            &connection,
            &format!(
                r#"{{"n_gen":128,"avg_ts":40.0,"model_filename":"m{index}.gguf","build_commit":"abc","test_time":"2026-01-0{}T00:00:00Z"}}"#,
                index + 1
            ),
        );
    }

    let filters = MultiFilters {
        limit: 2,
        ..MultiFilters::default()
    };
    let points = multi_series_trend(&connection, &filters).expect("bounded series");
    assert_eq!(points.len(), 2);

    // non-positive limit means the default, not an empty result
    let points =
        multi_series_trend(&connection, &MultiFilters::default()).expect("default limit");
    assert_eq!(points.len(), 5);
}

#[test]
fn dimension_values_counts_distinct_non_null_values() {
    let connection = memory_store();
    seed(&connection, r#"{"n_gen":1,"n_batch":512}"#);
    seed(&connection, r#"{"n_gen":1,"n_batch":512}"#);
    seed(&connection, r#"{"n_gen":1,"n_batch":0}"#);
    seed(&connection, r#"{"n_gen":1}"#);

    let values = dimension_values(&connection, Dimension::NBatch).expect("values");
    assert_eq!(values.len(), 2, "null/absent must not produce a bucket");
    assert_eq!(values[0].value, json!(0));
    assert_eq!(values[0].count, 1);
    assert_eq!(values[1].value, json!(512));
    assert_eq!(values[1].count, 2);

    let all = all_dimension_values(&connection).expect("all values");
    assert_eq!(all.len(), crate::dimensions::ALL.len());
    let (_, batch_values) = all
        .iter()
        .find(|(dimension, _)| *dimension == Dimension::NBatch)
        .expect("n_batch entry");
    assert_eq!(batch_values.len(), 2);
}

#[test]
fn list_applies_defaults_and_pagination() {
    let connection = memory_store();
    for index in 0..5 {
        seed(
            &connection,
            &format!(r#"{{"n_gen":1,"build_commit":"c{index}"}}"#),
        );
    }

    let filters = ListFilters {
        limit: 2,
        offset: 1,
        ..ListFilters::default()
    };
    let rows = list(&connection, &filters).expect("paginated list");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].build_commit.as_deref(), Some("c3"));

    // non-positive limit means the default, not an empty page
    let filters = ListFilters {
        limit: 0,
        ..ListFilters::default()
    };
    let rows = list(&connection, &filters).expect("default limit");
    assert_eq!(rows.len(), 5);
}

#[test]
fn stats_summarizes_store_contents() {
    let connection = memory_store();
    seed(
        &connection,
        r#"{"n_gen":128,"avg_ts":40.0,"model_filename":"a.gguf","build_commit":"abc","test_time":"2026-01-01T00:00:00Z"}"#,
    );
    seed(
        &connection,
        r#"{"n_prompt":512,"avg_ts":120.0,"model_filename":"b.gguf","build_commit":"abc","test_time":"2026-01-02T00:00:00Z"}"#,
    );

    let summary = stats(&connection).expect("stats");
    assert_eq!(summary.total_benchmarks, 2);
    assert_eq!(summary.unique_models, 2);
    assert_eq!(summary.unique_builds, 1);
    assert_eq!(summary.avg_tg_tps, Some(40.0));
    assert_eq!(summary.avg_pp_tps, Some(120.0));
    assert_eq!(summary.latest_test.as_deref(), Some("2026-01-02T00:00:00Z"));
    assert_eq!(summary.recent.len(), 2);
    assert_eq!(summary.recent[0].model_filename.as_deref(), Some("b.gguf"));
}
