//! CLI commands for taskmill
//!
//! Each command executes against an open [`Database`] on behalf of one
//! tenant and returns the text to print.

pub mod tag;
pub mod task;
pub mod view;
pub mod workbench;

pub use tag::TagCommand;
pub use task::{AddTask, ListTasks, TaskCommand, UpdateTask};
pub use view::ViewCommand;
pub use workbench::WorkbenchCommand;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use clap::Subcommand;
use taskmill_db::{AssociationDelta, Database, DbError, Tenant};

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create, inspect and change tasks
    #[command(subcommand)]
    Task(TaskCommand),

    /// Manage tags
    #[command(subcommand)]
    Tag(TagCommand),

    /// Manage workbenches and their columns
    #[command(subcommand)]
    Workbench(WorkbenchCommand),

    /// Manage saved views
    #[command(subcommand)]
    View(ViewCommand),
}

impl Command {
    /// Execute the command for `tenant`.
    pub async fn execute(&self, db: &Database, tenant: &Tenant) -> Result<String, DbError> {
        match self {
            Command::Task(cmd) => cmd.execute(db, tenant).await,
            Command::Tag(cmd) => cmd.execute(db, tenant).await,
            Command::Workbench(cmd) => cmd.execute(db, tenant).await,
            Command::View(cmd) => cmd.execute(db, tenant).await,
        }
    }
}

/// Build a membership delta from `--add-*` / `--remove-*` flags.
pub(crate) fn delta(add: &[String], remove: &[String]) -> AssociationDelta<String> {
    AssociationDelta::new()
        .add(add.iter().cloned())
        .remove(remove.iter().cloned())
}

pub(crate) fn invalid(message: impl Into<String>) -> DbError {
    DbError::ValidationError {
        message: message.into(),
    }
}

/// Parse a timestamp given as RFC 3339, `YYYY-MM-DD HH:MM` or `YYYY-MM-DD`.
///
/// Timestamps without an offset are taken as UTC.
pub(crate) fn parse_datetime(s: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M") {
        return Ok(naive.and_utc());
    }
    if let Some(naive) = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return Ok(naive.and_utc());
    }
    Err(format!(
        "invalid timestamp '{}'. Use RFC 3339, 'YYYY-MM-DD HH:MM' or 'YYYY-MM-DD'",
        s
    ))
}
