//! Tag commands
//!
//! Tags are usually created implicitly by `tm task add -t`; these commands
//! manage them directly.

use crate::output::format_tag_table;
use clap::Subcommand;
use taskmill_db::{Database, DbError, Tenant};

/// Tag subcommands
#[derive(Debug, Subcommand)]
pub enum TagCommand {
    /// Create tags, reusing any that exist already
    Add {
        /// Tag names
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// List all tags
    List,

    /// Rename a tag; every task keeps it under the new name
    Rename {
        /// Tag ID
        id: String,
        /// New name
        name: String,
    },

    /// Delete a tag and remove it from every task
    Delete {
        /// Tag ID
        id: String,
    },
}

impl TagCommand {
    pub async fn execute(&self, db: &Database, tenant: &Tenant) -> Result<String, DbError> {
        match self {
            TagCommand::Add { names } => {
                let tags = db.tags().create_many(tenant, names).await?;
                Ok(format_tag_table(&tags))
            }
            TagCommand::List => {
                let tags = db.tags().list(tenant).await?;
                Ok(format_tag_table(&tags))
            }
            TagCommand::Rename { id, name } => {
                let tag = db.tags().rename(tenant, id, name).await?;
                Ok(format!("Renamed tag {} to '{}'", tag.id, tag.name))
            }
            TagCommand::Delete { id } => {
                db.tags().delete(tenant, id).await?;
                Ok(format!("Deleted tag {}", id))
            }
        }
    }
}
