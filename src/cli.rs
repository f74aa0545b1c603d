//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

/// Publisher DOI prefixes scanned by default (EMBO Press, Life Science Alliance).
pub const DEFAULT_PREFIXES: [&str; 2] = ["10.15252", "10.26508"];

/// Journals whose preprints are annotated by default.
pub const DEFAULT_JOURNALS: [&str; 5] = [
    "The EMBO Journal",
    "EMBO reports",
    "EMBO Molecular Medicine",
    "Molecular Systems Biology",
    "Life Science Alliance",
];

/// Link bioRxiv preprints to the review process files of their published papers.
///
/// Traxiv discovers preprints published in EMBO Press journals, derives the
/// link to each paper's review process file and posts it as a Hypothesis
/// annotation on the preprint.
#[derive(Parser, Debug)]
#[command(name = "traxiv")]
#[command(author, version, about)]
pub struct Cli {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// SQLite database holding drafted and posted annotations
    #[arg(long, env = "TRAXIV_DB", default_value = "traxiv.db", global = true)]
    pub db: PathBuf,

    /// Serve every external API from one root URL (local testing)
    #[arg(long, env = "TRAXIV_API_ROOT", hide = true, global = true)]
    pub api_root: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List preprints whose published version carries a publisher prefix
    List(ListArgs),
    /// Draft and post review process file annotations to a group
    Sync(SyncArgs),
    /// Delete this account's annotations from a group
    Purge(PurgeArgs),
}

/// Date range shared by listing and syncing.
#[derive(Args, Debug, Clone)]
pub struct DateRange {
    /// Start of the posting interval (YYYY-MM-DD)
    #[arg(long, default_value = "2019-01-01")]
    pub start: NaiveDate,

    /// End of the posting interval (YYYY-MM-DD, default today)
    #[arg(long)]
    pub end: Option<NaiveDate>,
}

impl DateRange {
    #[must_use]
    pub fn end_or_today(&self) -> NaiveDate {
        self.end
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }
}

/// Hypothesis account credentials, read from flags or the environment.
#[derive(Args, Clone)]
pub struct CredentialArgs {
    /// Hypothesis user name
    #[arg(long = "hypothesis-user", env = "HYPOTHESIS_USER", hide_env_values = true)]
    pub user: Option<String>,

    /// Hypothesis developer API key
    #[arg(long = "hypothesis-api-key", env = "HYPOTHESIS_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
}

impl std::fmt::Debug for CredentialArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialArgs")
            .field("user", &self.user)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Publisher DOI prefix
    #[arg(long, default_value = "10.15252")]
    pub prefix: String,

    #[command(flatten)]
    pub range: DateRange,

    /// Also fetch corresponding author and institution for each preprint
    #[arg(long)]
    pub details: bool,

    /// Pause after each listing page, in milliseconds (max 60000)
    #[arg(long, default_value_t = 100, value_parser = clap::value_parser!(u64).range(0..=60000))]
    pub delay_ms: u64,
}

#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Name of the Hypothesis group (__world__ for the public group)
    pub group: String,

    /// Publisher DOI prefixes (comma separated)
    #[arg(long, value_delimiter = ',', default_values = DEFAULT_PREFIXES)]
    pub prefixes: Vec<String>,

    /// Journals to annotate (comma separated)
    #[arg(long, value_delimiter = ',', default_values = DEFAULT_JOURNALS)]
    pub journals: Vec<String>,

    #[command(flatten)]
    pub range: DateRange,

    /// Pause after each listing page and each posted annotation, in milliseconds (max 60000)
    #[arg(long, default_value_t = 100, value_parser = clap::value_parser!(u64).range(0..=60000))]
    pub delay_ms: u64,

    #[command(flatten)]
    pub credentials: CredentialArgs,
}

#[derive(Args, Debug)]
pub struct PurgeArgs {
    /// Name of the Hypothesis group
    pub group: String,

    /// Maximum number of annotations deleted
    #[arg(long, default_value_t = 200, value_parser = clap::value_parser!(u32).range(1..))]
    pub limit: u32,

    /// Also remove every stored entry of the group
    #[arg(long)]
    pub drop: bool,

    #[command(flatten)]
    pub credentials: CredentialArgs,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_list_defaults() {
        let cli = Cli::try_parse_from(["traxiv", "list"]).unwrap();
        assert_eq!(cli.verbose, 0);
        assert!(!cli.quiet);
        let Command::List(args) = cli.command else {
            panic!("expected list");
        };
        assert_eq!(args.prefix, "10.15252");
        assert_eq!(args.range.start, NaiveDate::from_ymd_opt(2019, 1, 1).unwrap());
        assert_eq!(args.range.end, None);
        assert!(!args.details);
        assert_eq!(args.delay_ms, 100);
    }

    #[test]
    fn test_cli_sync_defaults() {
        let cli = Cli::try_parse_from(["traxiv", "sync", "Review Commons"]).unwrap();
        let Command::Sync(args) = cli.command else {
            panic!("expected sync");
        };
        assert_eq!(args.group, "Review Commons");
        assert_eq!(args.prefixes, DEFAULT_PREFIXES);
        assert_eq!(args.journals, DEFAULT_JOURNALS);
    }

    #[test]
    fn test_cli_sync_comma_separated_lists() {
        let cli = Cli::try_parse_from([
            "traxiv",
            "sync",
            "__world__",
            "--prefixes",
            "10.15252",
            "--journals",
            "EMBO reports,Molecular Systems Biology",
            "--start",
            "2020-02-01",
            "--end",
            "2020-03-01",
        ])
        .unwrap();
        let Command::Sync(args) = cli.command else {
            panic!("expected sync");
        };
        assert_eq!(args.prefixes, vec!["10.15252"]);
        assert_eq!(args.journals, vec!["EMBO reports", "Molecular Systems Biology"]);
        assert_eq!(
            args.range.end_or_today(),
            NaiveDate::from_ymd_opt(2020, 3, 1).unwrap()
        );
    }

    #[test]
    fn test_cli_sync_requires_group() {
        let err = Cli::try_parse_from(["traxiv", "sync"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_cli_invalid_date_rejected() {
        let err = Cli::try_parse_from(["traxiv", "list", "--start", "2019-13-01"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_purge_defaults_and_flags() {
        let cli = Cli::try_parse_from(["traxiv", "purge", "grp"]).unwrap();
        let Command::Purge(args) = cli.command else {
            panic!("expected purge");
        };
        assert_eq!(args.limit, 200);
        assert!(!args.drop);

        let cli = Cli::try_parse_from(["traxiv", "purge", "grp", "--limit", "5", "--drop"]).unwrap();
        let Command::Purge(args) = cli.command else {
            panic!("expected purge");
        };
        assert_eq!(args.limit, 5);
        assert!(args.drop);
    }

    #[test]
    fn test_cli_purge_zero_limit_rejected() {
        let err = Cli::try_parse_from(["traxiv", "purge", "grp", "--limit", "0"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["traxiv", "list", "-vv", "--db", "/tmp/x.db"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.db, PathBuf::from("/tmp/x.db"));
    }

    #[test]
    fn test_cli_requires_subcommand() {
        let err = Cli::try_parse_from(["traxiv"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingSubcommand);
    }

    #[test]
    fn test_cli_debug_redacts_api_key() {
        let cli = Cli::try_parse_from([
            "traxiv",
            "purge",
            "grp",
            "--hypothesis-user",
            "alice",
            "--hypothesis-api-key",
            "secret-token",
        ])
        .unwrap();
        let debug = format!("{cli:?}");
        assert!(debug.contains("alice"));
        assert!(!debug.contains("secret-token"));
    }

    #[test]
    fn test_cli_version_flag_shows_version() {
        let err = Cli::try_parse_from(["traxiv", "--version"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }
}
