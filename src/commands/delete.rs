use anyhow::Result;
use tracing::info;

use crate::cli::DeleteArgs;
use crate::store;

pub fn run(args: DeleteArgs) -> Result<()> {
    let connection = store::open(&args.db_path)?;
    let deleted = store::delete_by_ids(&connection, &args.ids)?;

    info!(
        requested = args.ids.len(),
        deleted,
        db_path = %args.db_path.display(),
        "deletion completed"
    );
    println!("deleted {deleted}");

    Ok(())
}
