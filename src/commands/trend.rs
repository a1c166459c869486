use std::io::{self, Write};

use anyhow::Result;
use tracing::{info, warn};

use crate::cli::TrendArgs;
use crate::queries::{self, TrendColumn, TrendFilters};
use crate::store;

use super::write_json;

pub fn run(args: TrendArgs) -> Result<()> {
    let connection = store::open_read_only(&args.db_path)?;

    let column = TrendColumn::parse(&args.group_by);
    if column.column() != args.group_by {
        warn!(
            requested = %args.group_by,
            effective = column.column(),
            "unknown trend group-by column; using fallback"
        );
    }

    let filters = TrendFilters {
        test_type: args.test_type.as_test_type(),
        model: args.model,
    };
    let points = queries::trend(&connection, &filters, column)?;

    info!(
        group_by = column.column(),
        test_type = filters.test_type.as_str(),
        count = points.len(),
        "trend completed"
    );

    if args.json {
        return write_json(&points);
    }

    let mut output = io::BufWriter::new(io::stdout().lock());
    for point in points {
        writeln!(
            output,
            "{}\t{}\t{:.2}\t{:.2}\t{:.2}\t{}",
            point.group_value,
            point.test_time.as_deref().unwrap_or("-"),
            point.avg_tps,
            point.min_tps,
            point.max_tps,
            point.sample_count,
        )?;
    }
    output.flush()?;

    Ok(())
}
