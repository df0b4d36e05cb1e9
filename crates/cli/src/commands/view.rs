//! View commands
//!
//! Filters are given as JSON objects with the task filter's fields, e.g.
//! `{"tags": ["work"], "done": false, "priority": [null, 10]}`.

use crate::commands::invalid;
use crate::output::{format_view_detail, format_view_results, format_view_table};
use clap::Subcommand;
use taskmill_db::{Database, DbError, TaskFilter, Tenant};

/// View subcommands
#[derive(Debug, Subcommand)]
pub enum ViewCommand {
    /// Save a view
    Add {
        /// View name
        name: String,

        /// Task filter as JSON (can be specified multiple times)
        #[arg(short, long = "filter")]
        filters: Vec<String>,
    },

    /// List all views
    List,

    /// Show a view's filters
    Show {
        /// View ID
        id: String,
    },

    /// Run every filter of a view
    Apply {
        /// View ID
        id: String,
    },

    /// Delete a view
    Delete {
        /// View ID
        id: String,
    },
}

/// Parse one `--filter` argument.
fn parse_filter(json: &str) -> Result<TaskFilter, DbError> {
    serde_json::from_str(json).map_err(|e| invalid(format!("invalid filter '{}': {}", json, e)))
}

impl ViewCommand {
    pub async fn execute(&self, db: &Database, tenant: &Tenant) -> Result<String, DbError> {
        match self {
            ViewCommand::Add { name, filters } => {
                let filters = filters
                    .iter()
                    .map(|f| parse_filter(f))
                    .collect::<Result<Vec<_>, _>>()?;
                let view = db.views().create(tenant, name, &filters).await?;
                Ok(view.id)
            }
            ViewCommand::List => {
                let views = db.views().list(tenant).await?;
                Ok(format_view_table(&views))
            }
            ViewCommand::Show { id } => {
                let view = db.views().get(tenant, id).await?;
                Ok(format_view_detail(&view))
            }
            ViewCommand::Apply { id } => {
                let view = db.views().get(tenant, id).await?;
                let results = db.views().apply(tenant, id).await?;
                Ok(format_view_results(&view, &results))
            }
            ViewCommand::Delete { id } => {
                db.views().delete(tenant, id).await?;
                Ok(format!("Deleted view {}", id))
            }
        }
    }
}
