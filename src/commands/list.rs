//! List command handler: print the preprints a publisher prefix yields.

use anyhow::Result;
use traxiv_core::{PreprintClient, build_http_client};
use tracing::info;

use super::{endpoints, http_settings};
use crate::cli::{Cli, ListArgs};

pub async fn run_list_command(cli: &Cli, args: &ListArgs) -> Result<()> {
    let settings = http_settings(args.delay_ms);
    let http = build_http_client(&settings)?;
    let client = PreprintClient::new(http, &endpoints(cli), &settings);

    let end = args.range.end_or_today();
    let mut preprints = client.discover(&args.prefix, args.range.start, end).await;
    if args.details {
        let enriched = client.enrich_details(&mut preprints).await;
        info!(enriched, "Corresponding authors retrieved");
    }

    for preprint in &preprints {
        if args.details {
            println!(
                "{}\t{}\t{}\t{}\t{}",
                preprint.preprint_doi,
                preprint.published_doi,
                preprint.category,
                preprint.corresponding_author,
                preprint.corresponding_institution
            );
        } else {
            println!(
                "{}\t{}\t{}",
                preprint.preprint_doi, preprint.published_doi, preprint.category
            );
        }
    }

    info!(
        count = preprints.len(),
        prefix = %args.prefix,
        start = %args.range.start,
        %end,
        "Listing complete"
    );
    Ok(())
}
