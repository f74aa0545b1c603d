//! Purge command handler: remove this account's annotations from a group.

use anyhow::Result;
use traxiv_core::{Pipeline, PipelineError};
use tracing::warn;

use super::{open_store, pipeline_config};
use crate::cli::{Cli, PurgeArgs};

pub async fn run_purge_command(cli: &Cli, args: &PurgeArgs) -> Result<()> {
    let config = pipeline_config(cli, &args.credentials, 0)?;
    let store = open_store(&cli.db).await?;
    let mut pipeline = Pipeline::new(&config, store)?;

    match pipeline.purge(&args.group, args.limit, args.drop).await {
        Ok(summary) => {
            println!("Purged {} records from {}", summary.deleted, args.group);
            println!("{} remaining", summary.remaining());
            if let Some(dropped) = summary.dropped {
                println!("Dropped {dropped} stored entries");
            }
            Ok(())
        }
        Err(error @ PipelineError::GroupNotFound(_)) => {
            warn!("{error}");
            Ok(())
        }
        Err(error) => Err(error.into()),
    }
}
