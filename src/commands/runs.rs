use anyhow::Result;
use tracing::info;

use crate::cli::RunsArgs;
use crate::queries::{self, MultiFilters};
use crate::store;

use super::{parse_dimension_filters, write_json};

pub(crate) fn multi_filters(args: &RunsArgs) -> MultiFilters {
    MultiFilters {
        models: args.models.clone(),
        gpus: args.gpus.clone(),
        test_types: args
            .test_types
            .iter()
            .map(|test_type| test_type.as_test_type())
            .collect(),
        main_gpus: args.main_gpus.clone(),
        split_modes: args.split_modes.clone(),
        dimensions: parse_dimension_filters(&args.dims),
        limit: args.limit,
    }
}

pub fn run(args: RunsArgs) -> Result<()> {
    let connection = store::open_read_only(&args.db_path)?;
    let filters = multi_filters(&args);
    let records = queries::list_filtered(&connection, &filters)?;

    info!(count = records.len(), "filtered list completed");

    if args.json {
        write_json(&records)
    } else {
        super::list::write_text(&records)
    }
}
