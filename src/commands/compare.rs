use std::io::{self, Write};

use anyhow::Result;
use tracing::info;

use crate::cli::CompareArgs;
use crate::queries;
use crate::store;

use super::{display_or_dash, write_json};

pub fn run(args: CompareArgs) -> Result<()> {
    let connection = store::open_read_only(&args.db_path)?;

    let test_type = args.test_type.as_test_type();
    let rows = queries::compare(&connection, &args.models, &args.commits, test_type)?;

    info!(
        test_type = test_type.as_str(),
        count = rows.len(),
        "comparison completed"
    );

    if args.json {
        return write_json(&rows);
    }

    let mut output = io::BufWriter::new(io::stdout().lock());
    for row in rows {
        writeln!(
            output,
            "{}\t{}\t{}\tavg={:.2}\truns={}",
            display_or_dash(row.model_filename.as_deref()),
            display_or_dash(row.build_commit.as_deref()),
            row.test_type.as_str(),
            row.avg_tps,
            row.runs,
        )?;
    }
    output.flush()?;

    Ok(())
}
