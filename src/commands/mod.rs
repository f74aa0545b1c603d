//! CLI command handlers.

mod list;
mod purge;
mod sync;

pub use list::run_list_command;
pub use purge::run_purge_command;
pub use sync::run_sync_command;

use std::io::{self, IsTerminal};
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, warn};
use traxiv_core::{
    Credentials, Database, Endpoints, HttpSettings, PipelineConfig, ReconciliationStore,
};

use crate::cli::{Cli, CredentialArgs};

fn endpoints(cli: &Cli) -> Endpoints {
    cli.api_root
        .as_deref()
        .map_or_else(Endpoints::default, Endpoints::with_mock_root)
}

fn http_settings(delay_ms: u64) -> HttpSettings {
    let delay = Duration::from_millis(delay_ms);
    HttpSettings {
        page_delay: delay,
        publish_delay: delay,
        ..HttpSettings::default()
    }
}

fn show_progress(cli: &Cli) -> bool {
    !cli.quiet && io::stderr().is_terminal()
}

/// Builds the pipeline configuration; blank credentials are fatal.
fn pipeline_config(cli: &Cli, credentials: &CredentialArgs, delay_ms: u64) -> Result<PipelineConfig> {
    let credentials = Credentials::new(
        credentials.user.clone().unwrap_or_default(),
        credentials.api_key.clone().unwrap_or_default(),
    )?;
    Ok(PipelineConfig {
        endpoints: endpoints(cli),
        http: http_settings(delay_ms),
        credentials,
        progress: show_progress(cli),
    })
}

async fn open_store(path: &Path) -> Result<ReconciliationStore> {
    let db = Database::new(path)
        .await
        .with_context(|| format!("cannot open database {}", path.display()))?;
    match db.journal_mode().await {
        Ok(mode) if mode == "wal" => debug!(path = %path.display(), "Database opened"),
        Ok(mode) => warn!(path = %path.display(), %mode, "Database not in WAL mode; concurrent runs may block"),
        Err(error) => warn!(path = %path.display(), error = %error, "Cannot read database journal mode"),
    }
    Ok(ReconciliationStore::new(db))
}
