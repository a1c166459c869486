pub mod catalog;
pub mod compare;
pub mod delete;
pub mod dimensions;
pub mod list;
pub mod pivot;
pub mod runs;
pub mod series;
pub mod stats;
pub mod submit;
pub mod trend;

use std::io::{self, Write};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::warn;

use crate::dimensions::Dimension;

pub(crate) fn write_json<T: Serialize>(value: &T) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());
    serde_json::to_writer_pretty(&mut output, value).context("failed to serialize json output")?;
    writeln!(output)?;
    output.flush()?;
    Ok(())
}

/// Parse repeated `key=value` arguments into per-dimension value sets.
/// Malformed pairs and unknown keys are logged and skipped, never fatal.
pub(crate) fn parse_dimension_filters(pairs: &[String]) -> Vec<(Dimension, Vec<String>)> {
    let mut filters: Vec<(Dimension, Vec<String>)> = Vec::new();

    for pair in pairs {
        let Some((key, value)) = pair.split_once('=') else {
            warn!(filter = %pair, "ignoring malformed dimension filter (expected key=value)");
            continue;
        };
        let Some(dimension) = Dimension::from_key(key) else {
            warn!(key, "ignoring unknown dimension filter");
            continue;
        };

        match filters.iter_mut().find(|(existing, _)| *existing == dimension) {
            Some((_, values)) => values.push(value.to_string()),
            None => filters.push((dimension, vec![value.to_string()])),
        }
    }

    filters
}

pub(crate) fn display_or_dash(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimension_filters_merge_repeated_keys_and_drop_garbage() {
        let filters = parse_dimension_filters(&[
            "n_batch=512".to_string(),
            "bogus_key=1".to_string(),
            "n_batch=1024".to_string(),
            "no-equals-sign".to_string(),
            "backend=CUDA".to_string(),
        ]);

        assert_eq!(filters.len(), 2);
        assert_eq!(filters[0].0, Dimension::NBatch);
        assert_eq!(filters[0].1, vec!["512".to_string(), "1024".to_string()]);
        assert_eq!(filters[1].0, Dimension::Backend);
    }
}
