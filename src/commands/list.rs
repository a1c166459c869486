use std::io::{self, Write};

use anyhow::Result;
use tracing::info;

use crate::cli::{ListArgs, TestTypeArg};
use crate::model::{BenchmarkRecord, TestType};
use crate::queries::{self, ListFilters};
use crate::store;

use super::{display_or_dash, write_json};

pub fn run(args: ListArgs) -> Result<()> {
    let connection = store::open_read_only(&args.db_path)?;

    let filters = ListFilters {
        build_commit: args.commit,
        model: args.model,
        test_type: args.test_type.map(TestTypeArg::as_test_type),
        test_time_from: args.since,
        test_time_to: args.until,
        limit: args.limit,
        offset: args.offset,
    };
    let records = queries::list(&connection, &filters)?;

    info!(count = records.len(), "list completed");

    if args.json {
        write_json(&records)
    } else {
        write_text(&records)
    }
}

pub(crate) fn write_text(records: &[BenchmarkRecord]) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());

    for record in records {
        writeln!(
            output,
            "{}\t{}\t{}\t{}\t{}\t{}",
            record.id.unwrap_or(0),
            display_or_dash(record.test_time.as_deref()),
            display_or_dash(record.build_commit.as_deref()),
            display_or_dash(record.model_filename.as_deref()),
            display_or_dash(record.test_type.map(TestType::as_str)),
            record
                .tokens_per_second
                .map(|tps| format!("{tps:.2}"))
                .unwrap_or_else(|| "-".to_string()),
        )?;
    }

    output.flush()?;
    Ok(())
}
