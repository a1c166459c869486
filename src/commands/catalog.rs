use std::io::{self, Write};

use anyhow::Result;
use tracing::info;

use crate::cli::{CatalogArgs, CatalogKind};
use crate::queries;
use crate::store;

use super::{display_or_dash, write_json};

pub fn run(args: CatalogArgs) -> Result<()> {
    let connection = store::open_read_only(&args.db_path)?;
    let mut output = io::BufWriter::new(io::stdout().lock());

    match args.kind {
        CatalogKind::Models => {
            let entries = queries::models(&connection)?;
            info!(count = entries.len(), "model catalog completed");
            if args.json {
                return write_json(&entries);
            }
            for entry in entries {
                writeln!(
                    output,
                    "{}\t{}\t{}\t{}",
                    entry.model_filename,
                    display_or_dash(entry.model_type.as_deref()),
                    entry
                        .model_size
                        .map(|size| size.to_string())
                        .unwrap_or_else(|| "-".to_string()),
                    entry
                        .model_n_params
                        .map(|params| params.to_string())
                        .unwrap_or_else(|| "-".to_string()),
                )?;
            }
        }
        CatalogKind::Builds => {
            let entries = queries::builds(&connection)?;
            info!(count = entries.len(), "build catalog completed");
            if args.json {
                return write_json(&entries);
            }
            for entry in entries {
                writeln!(
                    output,
                    "{}\t{}\t{}",
                    entry.build_commit,
                    entry
                        .build_number
                        .map(|number| number.to_string())
                        .unwrap_or_else(|| "-".to_string()),
                    display_or_dash(entry.latest_test_time.as_deref()),
                )?;
            }
        }
        CatalogKind::Gpus => {
            let names = queries::gpus(&connection)?;
            info!(count = names.len(), "gpu catalog completed");
            if args.json {
                return write_json(&names);
            }
            for name in names {
                writeln!(output, "{name}")?;
            }
        }
        CatalogKind::MainGpus => {
            let ids = queries::main_gpus(&connection)?;
            info!(count = ids.len(), "main gpu catalog completed");
            if args.json {
                return write_json(&ids);
            }
            for id in ids {
                writeln!(output, "{id}")?;
            }
        }
        CatalogKind::SplitModes => {
            let modes = queries::split_modes(&connection)?;
            info!(count = modes.len(), "split mode catalog completed");
            if args.json {
                return write_json(&modes);
            }
            for mode in modes {
                writeln!(output, "{mode}")?;
            }
        }
    }

    output.flush()?;
    Ok(())
}
