use std::io::{self, Write};

use anyhow::Result;
use tracing::info;

use crate::cli::RunsArgs;
use crate::queries;
use crate::store;

use super::runs::multi_filters;
use super::{display_or_dash, write_json};

pub fn run(args: RunsArgs) -> Result<()> {
    let connection = store::open_read_only(&args.db_path)?;
    let filters = multi_filters(&args);
    let points = queries::multi_series_trend(&connection, &filters)?;

    info!(count = points.len(), "series trend completed");

    if args.json {
        return write_json(&points);
    }

    let mut output = io::BufWriter::new(io::stdout().lock());
    for point in points {
        writeln!(
            output,
            "{}\t{}\t{}\t{}\tavg={:.2}\tn={}\t{}",
            display_or_dash(point.build_commit.as_deref()),
            display_or_dash(point.model_filename.as_deref()),
            display_or_dash(point.gpu_info.as_deref()),
            display_or_dash(point.test_type.as_deref()),
            point.avg_tps,
            point.sample_count,
            point.test_time.as_deref().unwrap_or("-"),
        )?;
    }
    output.flush()?;

    Ok(())
}
