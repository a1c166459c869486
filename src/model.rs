use anyhow::{Context, Result, bail};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::util::now_utc_string;

/// Benchmark run classification derived from prompt/generation token counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestType {
    Pp,
    Tg,
    PpTg,
}

impl TestType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pp => "pp",
            Self::Tg => "tg",
            Self::PpTg => "pp+tg",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pp" => Some(Self::Pp),
            "tg" => Some(Self::Tg),
            "pp+tg" => Some(Self::PpTg),
            _ => None,
        }
    }
}

impl Serialize for TestType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One benchmark invocation. `id` and `created_at` are store-assigned and
/// remain `None` until the record has been inserted and read back.
#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkRecord {
    pub id: Option<i64>,
    pub created_at: Option<String>,
    pub build_commit: Option<String>,
    pub build_number: Option<i64>,
    pub test_time: Option<String>,
    pub cpu_info: Option<String>,
    pub gpu_info: Option<String>,
    pub backend: Option<String>,
    pub model_filename: Option<String>,
    pub model_type: Option<String>,
    pub model_size: Option<i64>,
    pub model_n_params: Option<i64>,
    pub test_type: Option<TestType>,
    pub n_prompt: Option<i64>,
    pub n_gen: Option<i64>,
    pub n_depth: Option<i64>,
    pub n_batch: Option<i64>,
    pub n_ubatch: Option<i64>,
    pub n_threads: Option<i64>,
    pub n_gpu_layers: Option<i64>,
    pub n_ctx: Option<i64>,
    pub flash_attn: i64,
    pub cache_type_k: Option<String>,
    pub cache_type_v: Option<String>,
    pub embeddings: i64,
    pub split_mode: Option<String>,
    pub main_gpu: Option<i64>,
    pub tokens_per_second: Option<f64>,
    pub stddev: Option<f64>,
    /// JSON-encoded array, stored verbatim as text.
    pub samples: Option<String>,
}

/// Classify a run from its token counts. An explicit 0 and an absent value
/// are treated identically here, unlike everywhere else in `transform`.
pub fn classify_test_type(n_prompt: Option<i64>, n_gen: Option<i64>) -> Option<TestType> {
    let prompt = n_prompt.unwrap_or(0);
    let generated = n_gen.unwrap_or(0);

    match (prompt > 0, generated > 0) {
        (true, false) => Some(TestType::Pp),
        (false, true) => Some(TestType::Tg),
        (true, true) => Some(TestType::PpTg),
        (false, false) => None,
    }
}

/// Coerce one inbound payload object into the canonical row shape.
///
/// String fields fall back to null when absent or empty; numeric fields only
/// when absent (an explicit 0 is preserved). Producers disagree on a few key
/// names, so `backend`, `tokens_per_second`, and `stddev` each read an
/// alternate source key as fallback.
pub fn transform(raw: &Map<String, Value>) -> BenchmarkRecord {
    let n_prompt = opt_i64(raw, "n_prompt");
    let n_gen = opt_i64(raw, "n_gen");

    BenchmarkRecord {
        id: None,
        created_at: None,
        build_commit: opt_string(raw, "build_commit"),
        build_number: opt_i64(raw, "build_number"),
        test_time: opt_string(raw, "test_time").or_else(|| Some(now_utc_string())),
        cpu_info: opt_string(raw, "cpu_info"),
        gpu_info: opt_string(raw, "gpu_info"),
        backend: opt_string(raw, "backend").or_else(|| opt_string(raw, "backends")),
        model_filename: opt_string(raw, "model_filename"),
        model_type: opt_string(raw, "model_type"),
        model_size: opt_i64(raw, "model_size"),
        model_n_params: opt_i64(raw, "model_n_params"),
        test_type: classify_test_type(n_prompt, n_gen),
        n_prompt,
        n_gen,
        n_depth: opt_i64(raw, "n_depth"),
        n_batch: opt_i64(raw, "n_batch"),
        n_ubatch: opt_i64(raw, "n_ubatch"),
        n_threads: opt_i64(raw, "n_threads"),
        n_gpu_layers: opt_i64(raw, "n_gpu_layers"),
        n_ctx: opt_i64(raw, "n_ctx"),
        flash_attn: flag01(raw, "flash_attn"),
        cache_type_k: opt_string(raw, "cache_type_k"),
        cache_type_v: opt_string(raw, "cache_type_v"),
        embeddings: flag01(raw, "embeddings"),
        split_mode: opt_string(raw, "split_mode"),
        main_gpu: opt_i64(raw, "main_gpu"),
        tokens_per_second: opt_f64(raw, "avg_ts").or_else(|| opt_f64(raw, "tokens_per_second")),
        stddev: opt_f64(raw, "stddev_ts").or_else(|| opt_f64(raw, "stddev")),
        samples: raw
            .get("samples")
            .filter(|value| !value.is_null())
            .map(Value::to_string),
    }
}

/// Parse newline-delimited JSON into raw payload objects. Blank lines are
/// skipped; any line that is not a JSON object fails the whole batch.
pub fn parse_jsonl(text: &str) -> Result<Vec<Map<String, Value>>> {
    let mut records = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let value: Value = serde_json::from_str(line)
            .with_context(|| format!("invalid JSON line: {line}"))?;
        records.push(into_object(value)?);
    }

    Ok(records)
}

/// Parse a single JSON document: one object or an array of objects.
pub fn parse_json(text: &str) -> Result<Vec<Map<String, Value>>> {
    let value: Value = serde_json::from_str(text).context("invalid JSON payload")?;

    match value {
        Value::Array(items) => items.into_iter().map(into_object).collect(),
        other => Ok(vec![into_object(other)?]),
    }
}

/// Format dispatch for submissions: a leading `[` or a parseable single
/// object selects JSON, anything else is treated as JSONL.
pub fn parse_payload(text: &str) -> Result<Vec<Map<String, Value>>> {
    let trimmed = text.trim_start();

    if trimmed.starts_with('[') {
        return parse_json(text);
    }
    if trimmed.starts_with('{') {
        // a single object parses as one document; multi-line JSONL does not
        if let Ok(Value::Object(object)) = serde_json::from_str::<Value>(text) {
            return Ok(vec![object]);
        }
    }

    parse_jsonl(text)
}

fn into_object(value: Value) -> Result<Map<String, Value>> {
    match value {
        Value::Object(object) => Ok(object),
        other => bail!("expected a JSON object, got: {other}"),
    }
}

/// Presentation projection: `samples` parsed back into an array (empty when
/// absent) plus two-decimal GB/B-params renderings of the model scale fields.
/// Query code never goes through this.
pub fn format_for_display(record: &BenchmarkRecord) -> Result<Value> {
    let mut display = match serde_json::to_value(record)? {
        Value::Object(map) => map,
        other => bail!("record serialized to a non-object value: {other}"),
    };

    let samples = match &record.samples {
        Some(text) => serde_json::from_str(text)
            .with_context(|| format!("stored samples are not valid JSON: {text}"))?,
        None => Value::Array(Vec::new()),
    };
    display.insert("samples".to_string(), samples);
    display.insert(
        "model_size_gb".to_string(),
        scaled_to_billions(record.model_size),
    );
    display.insert(
        "model_params_b".to_string(),
        scaled_to_billions(record.model_n_params),
    );

    Ok(Value::Object(display))
}

fn scaled_to_billions(value: Option<i64>) -> Value {
    match value {
        Some(value) => Value::String(format!("{:.2}", value as f64 / 1e9)),
        None => Value::Null,
    }
}

fn opt_string(raw: &Map<String, Value>, key: &str) -> Option<String> {
    match raw.get(key) {
        Some(Value::String(text)) if !text.is_empty() => Some(text.clone()),
        _ => None,
    }
}

fn opt_i64(raw: &Map<String, Value>, key: &str) -> Option<i64> {
    match raw.get(key) {
        Some(Value::Number(number)) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|value| value as i64)),
        Some(Value::String(text)) => text.parse().ok(),
        _ => None,
    }
}

fn opt_f64(raw: &Map<String, Value>, key: &str) -> Option<f64> {
    match raw.get(key) {
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(text)) => text.parse().ok(),
        _ => None,
    }
}

fn flag01(raw: &Map<String, Value>, key: &str) -> i64 {
    let truthy = match raw.get(key) {
        Some(Value::Bool(flag)) => *flag,
        Some(Value::Number(number)) => number.as_f64().is_some_and(|value| value != 0.0),
        Some(Value::String(text)) => !text.is_empty(),
        _ => false,
    };
    i64::from(truthy)
}
