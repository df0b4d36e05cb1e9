//! Workbench commands

use crate::commands::delta;
use crate::output::{format_workbench_detail, format_workbench_table};
use clap::Subcommand;
use taskmill_db::{Database, DbError, Tenant, WorkbenchUpdate};

/// Workbench subcommands
#[derive(Debug, Subcommand)]
pub enum WorkbenchCommand {
    /// Create a workbench
    Add {
        /// Workbench name
        name: String,

        /// Column names (can be specified multiple times)
        #[arg(short, long = "column")]
        columns: Vec<String>,
    },

    /// List all workbenches
    List,

    /// Show a workbench and the tasks placed on it
    Show {
        /// Workbench ID
        id: String,
    },

    /// Rename a workbench or change its columns
    Update {
        /// Workbench ID
        id: String,

        /// New name
        #[arg(long)]
        name: Option<String>,

        /// Column to add (can be specified multiple times)
        #[arg(long = "add-column")]
        add_columns: Vec<String>,

        /// Column to remove (can be specified multiple times)
        #[arg(long = "remove-column")]
        remove_columns: Vec<String>,
    },

    /// Delete a workbench and take every task off it
    Delete {
        /// Workbench ID
        id: String,
    },
}

impl WorkbenchCommand {
    pub async fn execute(&self, db: &Database, tenant: &Tenant) -> Result<String, DbError> {
        match self {
            WorkbenchCommand::Add { name, columns } => {
                let workbench = db.workbenches().create(tenant, name, columns).await?;
                Ok(workbench.id)
            }
            WorkbenchCommand::List => {
                let workbenches = db.workbenches().list(tenant).await?;
                Ok(format_workbench_table(&workbenches))
            }
            WorkbenchCommand::Show { id } => {
                let board = db.workbenches().tasks_of(tenant, id).await?;
                Ok(format_workbench_detail(&board))
            }
            WorkbenchCommand::Update {
                id,
                name,
                add_columns,
                remove_columns,
            } => {
                let update = WorkbenchUpdate {
                    name: name.clone(),
                    columns: delta(add_columns, remove_columns),
                };
                let workbench = db.workbenches().update(tenant, id, &update).await?;
                Ok(format_workbench_table(&[workbench]))
            }
            WorkbenchCommand::Delete { id } => {
                db.workbenches().delete(tenant, id).await?;
                Ok(format!("Deleted workbench {}", id))
            }
        }
    }
}
