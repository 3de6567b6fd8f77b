use std::io;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use directories::ProjectDirs;
use flexi_logger::{Logger, LoggerHandle};
use log::{debug, info};

use crate::bootstrap::{self, BootstrapOutcome, SuperuserConfig};
use crate::config::Config;
use crate::database::Database;
use crate::duplicates::{parse_id_list, Duplicates, IdList, MergeOutcome, MergeRequest, OwnerSelector};
use crate::error::AdminError;

#[derive(Parser)]
#[command(
    name = "homestay-admin",
    version,
    about = "Administrative commands for the homestay booking backend"
)]
pub struct Cli {
    /// Database file (overrides `database.path` from the config)
    #[arg(long = "db-path", global = true)]
    pub db_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Report owners with duplicate homestays and optionally merge them into one
    #[command(name = "cleanup-duplicates")]
    CleanupDuplicates(CleanupArgs),

    /// Create a superuser from the DJANGO_SUPERUSER_* environment variables
    #[command(name = "create-admin")]
    CreateAdmin,
}

#[derive(Args, Debug)]
pub struct CleanupArgs {
    /// List owners that have more than one homestay (JSON)
    #[arg(long, conflicts_with_all = ["owner_id", "owner_username", "keep_id", "delete_ids", "dry_run", "confirm"])]
    pub list: bool,

    /// Owner id to operate on
    #[arg(long = "owner-id", conflicts_with = "owner_username")]
    pub owner_id: Option<i64>,

    /// Owner username to operate on
    #[arg(long = "owner-username")]
    pub owner_username: Option<String>,

    /// Homestay id to keep (default: the owner's lowest id)
    #[arg(long = "keep-id")]
    pub keep_id: Option<i64>,

    /// Comma-separated homestay ids to delete (default: all except the kept one)
    #[arg(long = "delete-ids", value_parser = parse_id_list)]
    pub delete_ids: Option<IdList>,

    /// Don't perform database changes, just print the planned actions
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// Confirm destructive actions (must be set to actually merge)
    #[arg(long)]
    pub confirm: bool,
}

impl CleanupArgs {
    fn merge_request(&self) -> MergeRequest {
        let owner = match (self.owner_id, &self.owner_username) {
            (Some(id), _) => Some(OwnerSelector::Id(id)),
            (None, Some(username)) => Some(OwnerSelector::Username(username.clone())),
            (None, None) => None,
        };

        MergeRequest {
            owner,
            keep_id: self.keep_id,
            delete_ids: self.delete_ids.clone().unwrap_or_default().0,
            dry_run: self.dry_run,
            confirm: self.confirm,
        }
    }
}

impl Cli {
    pub fn handle_command_line() -> Result<(), AdminError> {
        let args = Cli::parse();

        let project_dirs = ProjectDirs::from("", "", "homestay-admin").ok_or_else(|| {
            AdminError::Error("Could not determine the application data directory".into())
        })?;
        let config = Config::load_config(&project_dirs);

        let _logger = Self::start_logger(&config)?;
        debug!("Command-line args: {:?}", std::env::args_os().collect::<Vec<_>>());

        let db_path = args
            .db_path
            .clone()
            .unwrap_or_else(|| config.database.db_path(project_dirs.data_local_dir()));
        let mut db = Database::open(&db_path, config.database.busy_timeout())?;

        match args.command {
            Command::CleanupDuplicates(cleanup) => Self::cleanup_duplicates(&mut db, &cleanup),
            Command::CreateAdmin => Self::create_admin(&db, &config),
        }
    }

    fn start_logger(config: &Config) -> Result<LoggerHandle, AdminError> {
        Logger::try_with_str(config.logging.log_spec())
            .and_then(|logger| logger.start())
            .map_err(|e| AdminError::Error(format!("Failed to start logger: {}", e)))
    }

    fn cleanup_duplicates(db: &mut Database, args: &CleanupArgs) -> Result<(), AdminError> {
        let mut out = io::stdout().lock();

        if args.list {
            Duplicates::list(db.conn(), &mut out)?;
            return Ok(());
        }

        let outcome = Duplicates::merge(db, &args.merge_request(), &mut out)?;
        match &outcome {
            MergeOutcome::DryRun(plan) => debug!(
                "Dry run: would merge {:?} into homestay {}",
                plan.delete_ids(),
                plan.keep_id()
            ),
            MergeOutcome::Merged(plan, summary) => info!(
                "Kept homestay {}; deleted {} rows",
                plan.keep_id(),
                summary.rows_deleted
            ),
            MergeOutcome::NothingToMerge | MergeOutcome::NothingSelected => {}
        }

        Ok(())
    }

    fn create_admin(db: &Database, config: &Config) -> Result<(), AdminError> {
        let superuser = SuperuserConfig::from_env();
        debug!("Superuser config: {:?}", superuser);

        let outcome = bootstrap::ensure_superuser(db, &superuser, config.auth.bcrypt_cost());
        match &outcome {
            BootstrapOutcome::Skipped(_) | BootstrapOutcome::Failed(_) => {
                eprintln!("{}", outcome.message())
            }
            BootstrapOutcome::Created(_) | BootstrapOutcome::AlreadyExists(_) => {
                println!("{}", outcome.message())
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cleanup(args: &[&str]) -> Result<CleanupArgs, clap::Error> {
        let mut argv = vec!["homestay-admin", "cleanup-duplicates"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).map(|cli| match cli.command {
            Command::CleanupDuplicates(args) => args,
            Command::CreateAdmin => panic!("parsed the wrong subcommand"),
        })
    }

    #[test]
    fn test_cli_parsing_requires_a_command() {
        assert!(Cli::try_parse_from(["homestay-admin"]).is_err());
        assert!(Cli::try_parse_from(["homestay-admin", "nonexistent-command"]).is_err());
    }

    #[test]
    fn test_cli_parsing_create_admin_with_global_db_path() {
        let cli = Cli::try_parse_from(["homestay-admin", "create-admin", "--db-path", "/tmp/x.db"])
            .unwrap();
        assert!(matches!(cli.command, Command::CreateAdmin));
        assert_eq!(cli.db_path, Some(PathBuf::from("/tmp/x.db")));
    }

    #[test]
    fn test_cli_parsing_merge_flags() {
        let args = cleanup(&[
            "--owner-username",
            "alice",
            "--keep-id",
            "4",
            "--delete-ids",
            "5, 6",
            "--confirm",
        ])
        .unwrap();

        let request = args.merge_request();
        assert_eq!(request.owner, Some(OwnerSelector::Username("alice".into())));
        assert_eq!(request.keep_id, Some(4));
        assert_eq!(request.delete_ids, vec![5, 6]);
        assert!(request.confirm);
        assert!(!request.dry_run);
    }

    #[test]
    fn test_cli_parsing_without_owner_leaves_owner_unset() {
        let request = cleanup(&["--dry-run"]).unwrap().merge_request();
        assert_eq!(request.owner, None);
        assert!(request.delete_ids.is_empty());
    }

    #[test]
    fn test_cli_parsing_rejects_conflicts_and_bad_ids() {
        assert!(cleanup(&["--list", "--owner-id", "1"]).is_err());
        assert!(cleanup(&["--owner-id", "1", "--owner-username", "a"]).is_err());
        assert!(cleanup(&["--owner-id", "1", "--delete-ids", "1,x"]).is_err());
        assert!(cleanup(&["--owner-id", "one"]).is_err());
        assert!(cleanup(&["--list"]).unwrap().list);
    }
}
