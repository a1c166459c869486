use std::io::{self, Write};

use anyhow::Result;
use serde::Serialize;
use tracing::info;

use crate::cli::DimensionsArgs;
use crate::dimensions::{self, Dimension, DimensionKind};
use crate::queries::{self, DimensionValue};
use crate::store;

use super::write_json;

#[derive(Debug, Serialize)]
struct DimensionListing {
    key: &'static str,
    label: &'static str,
    group: &'static str,
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    values: Option<Vec<DimensionValue>>,
}

fn kind_label(kind: DimensionKind) -> &'static str {
    match kind {
        DimensionKind::Numeric => "numeric",
        DimensionKind::Text => "text",
        DimensionKind::Boolean => "boolean",
    }
}

pub fn run(args: DimensionsArgs) -> Result<()> {
    let stored_values = if args.values {
        let connection = store::open_read_only(&args.db_path)?;
        Some(queries::all_dimension_values(&connection)?)
    } else {
        None
    };

    let lookup = |dimension: Dimension| -> Option<Vec<DimensionValue>> {
        stored_values.as_ref().and_then(|all| {
            all.iter()
                .find(|(candidate, _)| *candidate == dimension)
                .map(|(_, values)| values.clone())
        })
    };

    info!(
        dimensions = dimensions::ALL.len(),
        with_values = args.values,
        "dimension catalog requested"
    );

    if args.json {
        let listings: Vec<DimensionListing> = dimensions::ALL
            .into_iter()
            .map(|dimension| DimensionListing {
                key: dimension.key(),
                label: dimension.label(),
                group: dimension.group(),
                kind: kind_label(dimension.kind()),
                values: lookup(dimension),
            })
            .collect();
        return write_json(&listings);
    }

    let mut output = io::BufWriter::new(io::stdout().lock());
    for (group, members) in dimensions::by_group() {
        writeln!(output, "{group}:")?;
        for dimension in members {
            writeln!(
                output,
                "  {}\t{} ({})",
                dimension.key(),
                dimension.label(),
                kind_label(dimension.kind()),
            )?;
            if let Some(values) = lookup(dimension) {
                for entry in values {
                    writeln!(output, "    {} ({} runs)", entry.value, entry.count)?;
                }
            }
        }
    }
    output.flush()?;

    Ok(())
}
