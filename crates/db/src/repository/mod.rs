//! Repository modules for database operations
//!
//! Provides repository pattern implementations for tasks, tags,
//! workbenches and views, encapsulating database queries. Every operation
//! takes the acting [`Tenant`](crate::models::Tenant) and never touches
//! another tenant's records.

mod collector;
mod rows;
mod tag;
mod task;
mod view;
mod workbench;

pub use collector::TaskCollector;
pub use tag::TagRepository;
pub use task::TaskRepository;
pub use view::ViewRepository;
pub use workbench::WorkbenchRepository;

use crate::error::{DbError, DbResult};
use crate::id::IdGenerator;
use rows::IdOnly;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use tracing::trace;

/// Generate an id that no record of `table` uses yet.
async fn unique_id(client: &Surreal<Db>, table: &str, seed: &str) -> DbResult<String> {
    let mut generator = IdGenerator::new(seed);

    while let Some(id) = generator.next_id() {
        let existing: Option<IdOnly> = client.select((table, id.as_str())).await?;
        if existing.is_none() {
            return Ok(id);
        }
        trace!("{} id {} taken, retrying", table, id);
    }

    Err(DbError::Conflict {
        message: format!("failed to allocate a unique {} id", table),
    })
}

/// Reject blank names before they reach the store.
fn require_name(kind: &str, name: &str) -> DbResult<()> {
    if name.trim().is_empty() {
        return Err(DbError::validation(format!("{} name must not be empty", kind)));
    }
    Ok(())
}
