use std::io::{self, Write};

use anyhow::Result;
use tracing::{info, warn};

use crate::cli::PivotArgs;
use crate::dimensions::{self, Dimension};
use crate::queries::{self, DimensionalFilters};
use crate::store;

use super::{parse_dimension_filters, write_json};

pub fn run(args: PivotArgs) -> Result<()> {
    let connection = store::open_read_only(&args.db_path)?;

    let group_dimensions = dimensions::filter_valid(&args.dims);
    for key in &args.dims {
        if !Dimension::is_valid(key) {
            warn!(key = %key, "ignoring unknown grouping dimension");
        }
    }

    let filters = DimensionalFilters {
        models: args.models.clone(),
        test_types: args
            .test_types
            .iter()
            .map(|test_type| test_type.as_test_type())
            .collect(),
        dimensions: parse_dimension_filters(&args.filters),
    };
    let rows = queries::dimensional_trend(&connection, &group_dimensions, &filters)?;

    info!(
        dimensions = group_dimensions.len(),
        count = rows.len(),
        "dimensional trend completed"
    );

    if args.json {
        return write_json(&rows);
    }

    let mut output = io::BufWriter::new(io::stdout().lock());
    for row in rows {
        let group = row
            .group
            .iter()
            .map(|(column, value)| format!("{column}={value}"))
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(
            output,
            "{group}\tavg={:.2}\tmin={:.2}\tmax={:.2}\tn={}\t{}",
            row.avg_tps,
            row.min_tps,
            row.max_tps,
            row.sample_count,
            row.test_time.as_deref().unwrap_or("-"),
        )?;
    }
    output.flush()?;

    Ok(())
}
