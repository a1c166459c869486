use std::io::{self, Write};

use anyhow::Result;
use serde_json::Value;
use tracing::info;

use crate::cli::StatsArgs;
use crate::model::format_for_display;
use crate::queries;
use crate::store;

use super::write_json;

pub fn run(args: StatsArgs) -> Result<()> {
    let connection = store::open_read_only(&args.db_path)?;
    let summary = queries::stats(&connection)?;

    info!(
        total = summary.total_benchmarks,
        models = summary.unique_models,
        builds = summary.unique_builds,
        "stats completed"
    );

    if args.json {
        let recent: Vec<Value> = summary
            .recent
            .iter()
            .map(format_for_display)
            .collect::<Result<_>>()?;
        let response = serde_json::json!({
            "total_benchmarks": summary.total_benchmarks,
            "unique_models": summary.unique_models,
            "unique_builds": summary.unique_builds,
            "avg_tg_tps": summary.avg_tg_tps,
            "avg_pp_tps": summary.avg_pp_tps,
            "latest_test": summary.latest_test,
            "recent": recent,
        });
        return write_json(&response);
    }

    let mut output = io::BufWriter::new(io::stdout().lock());
    writeln!(output, "benchmarks: {}", summary.total_benchmarks)?;
    writeln!(output, "models: {}", summary.unique_models)?;
    writeln!(output, "builds: {}", summary.unique_builds)?;
    writeln!(
        output,
        "avg tg t/s: {}",
        summary
            .avg_tg_tps
            .map(|tps| format!("{tps:.2}"))
            .unwrap_or_else(|| "-".to_string()),
    )?;
    writeln!(
        output,
        "avg pp t/s: {}",
        summary
            .avg_pp_tps
            .map(|tps| format!("{tps:.2}"))
            .unwrap_or_else(|| "-".to_string()),
    )?;
    writeln!(
        output,
        "latest test: {}",
        summary.latest_test.as_deref().unwrap_or("-"),
    )?;
    writeln!(output, "recent:")?;
    for record in &summary.recent {
        let display = format_for_display(record)?;
        writeln!(output, "{}", recent_line(&display))?;
    }
    output.flush()?;

    Ok(())
}

/// Recent rows render from the display projection, so the text and JSON
/// views agree on scaled model fields.
fn recent_line(display: &Value) -> String {
    let text = |key: &str| display[key].as_str().unwrap_or("-").to_string();

    format!(
        "{}\t{}\t{}\t{}\t{} GB\t{}",
        display["id"].as_i64().unwrap_or(0),
        text("test_time"),
        text("model_filename"),
        text("test_type"),
        text("model_size_gb"),
        display["tokens_per_second"]
            .as_f64()
            .map(|tps| format!("{tps:.2}"))
            .unwrap_or_else(|| "-".to_string()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::transform;
    use serde_json::Map;

    #[test]
    fn recent_line_uses_scaled_model_size() {
        let raw: Map<String, Value> = match serde_json::from_str(
            r#"{"model_filename":"a.gguf","model_size":4500000000,"n_gen":128,"avg_ts":45.25,"test_time":"2026-01-01T00:00:00Z"}"#,
        )
        .expect("payload parses")
        {
            Value::Object(object) => object,
            other => panic!("payload is not an object: {other}"),
        };
        let display = format_for_display(&transform(&raw)).expect("display projection");

        assert_eq!(
            recent_line(&display),
            "0\t2026-01-01T00:00:00Z\ta.gguf\ttg\t4.50 GB\t45.25"
        );
    }
}
