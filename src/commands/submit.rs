use std::fs;
use std::io::Read;

use anyhow::{Context, Result};
use tracing::info;

use crate::cli::{SubmitArgs, SubmitFormat};
use crate::model::{self, BenchmarkRecord};
use crate::store;

pub fn run(args: SubmitArgs) -> Result<()> {
    let text = match &args.input {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read stdin")?;
            buffer
        }
    };

    let raws = match args.format {
        SubmitFormat::Auto => model::parse_payload(&text)?,
        SubmitFormat::Json => model::parse_json(&text)?,
        SubmitFormat::Jsonl => model::parse_jsonl(&text)?,
    };
    let records: Vec<BenchmarkRecord> = raws.iter().map(model::transform).collect();

    let mut connection = store::open(&args.db_path)?;
    let inserted = match records.as_slice() {
        [record] => {
            store::insert_one(&connection, record)?;
            1
        }
        batch => store::insert_many(&mut connection, batch)?,
    };

    info!(
        inserted,
        db_path = %args.db_path.display(),
        "submission stored"
    );
    println!("inserted {inserted}");

    Ok(())
}
