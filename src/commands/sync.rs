//! Sync command handler: draft and post review process file annotations.

use anyhow::Result;
use traxiv_core::{Pipeline, PipelineError, RunSummary, SyncRequest};
use tracing::warn;

use super::{open_store, pipeline_config};
use crate::cli::{Cli, SyncArgs};

pub async fn run_sync_command(cli: &Cli, args: &SyncArgs) -> Result<()> {
    let config = pipeline_config(cli, &args.credentials, args.delay_ms)?;
    let store = open_store(&cli.db).await?;
    let mut pipeline = Pipeline::new(&config, store)?;

    let request = SyncRequest {
        group_name: args.group.clone(),
        prefixes: args.prefixes.clone(),
        journals: args.journals.clone(),
        start: args.range.start,
        end: args.range.end_or_today(),
    };

    match pipeline.run(&request).await {
        Ok(summary) => {
            print_summary(&summary);
            Ok(())
        }
        Err(error @ PipelineError::GroupNotFound(_)) => {
            warn!("{error}");
            Ok(())
        }
        Err(error) => Err(error.into()),
    }
}

fn print_summary(summary: &RunSummary) {
    let skipped = summary.update.skipped();
    let failed = summary.update.failed();

    if !skipped.is_empty() {
        println!("{} records were NOT drafted:", skipped.len());
        for (doi, reason) in &skipped {
            println!("  {doi}: {reason}");
        }
    }
    if !failed.is_empty() {
        println!("{} records failed:", failed.len());
        for (doi, message) in &failed {
            println!("  {doi}: {message}");
        }
    }

    println!(
        "Discovered {} preprints, drafted {}, posted {} of {} pending to group {}",
        summary.discovered,
        summary.update.drafted(),
        summary.post.published,
        summary.post.pending,
        summary.group_id
    );
    if summary.post.unconfirmed > 0 {
        println!(
            "{} annotations were created without a readable id; they will not be posted again",
            summary.post.unconfirmed
        );
    }
    if summary.post.rejected + summary.post.failed > 0 {
        println!(
            "{} annotations rejected, {} not sent; they stay pending",
            summary.post.rejected, summary.post.failed
        );
    }
}
