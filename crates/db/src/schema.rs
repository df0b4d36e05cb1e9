//! Database schema initialization for taskmill
//!
//! Defines the SurrealDB schema for tasks, tags, workbenches and views.
//! Every record carries its `owner`; names are unique per owner.

use crate::error::DbError;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

/// SQL statements for schema initialization
mod sql {
    /// Define the tag table
    pub const DEFINE_TAG_TABLE: &str = r#"
        DEFINE TABLE IF NOT EXISTS tag SCHEMAFULL;

        DEFINE FIELD IF NOT EXISTS owner ON tag TYPE string;

        DEFINE FIELD IF NOT EXISTS name ON tag TYPE string
            ASSERT string::len(string::trim($value)) > 0;

        DEFINE FIELD IF NOT EXISTS created_at ON tag TYPE datetime DEFAULT time::now();

        DEFINE FIELD IF NOT EXISTS updated_at ON tag TYPE datetime DEFAULT time::now();

        DEFINE INDEX IF NOT EXISTS tag_owner_name ON tag FIELDS owner, name UNIQUE;
    "#;

    /// Define the workbench table
    pub const DEFINE_WORKBENCH_TABLE: &str = r#"
        DEFINE TABLE IF NOT EXISTS workbench SCHEMAFULL;

        DEFINE FIELD IF NOT EXISTS owner ON workbench TYPE string;

        DEFINE FIELD IF NOT EXISTS name ON workbench TYPE string
            ASSERT string::len(string::trim($value)) > 0;

        DEFINE FIELD IF NOT EXISTS columns ON workbench TYPE array<string> DEFAULT [];

        DEFINE FIELD IF NOT EXISTS created_at ON workbench TYPE datetime DEFAULT time::now();

        DEFINE FIELD IF NOT EXISTS updated_at ON workbench TYPE datetime DEFAULT time::now();

        DEFINE INDEX IF NOT EXISTS workbench_owner_name ON workbench FIELDS owner, name UNIQUE;
    "#;

    /// Define the task table with its association links
    pub const DEFINE_TASK_TABLE: &str = r#"
        DEFINE TABLE IF NOT EXISTS task SCHEMAFULL;

        DEFINE FIELD IF NOT EXISTS owner ON task TYPE string;

        DEFINE FIELD IF NOT EXISTS title ON task TYPE string
            ASSERT string::len(string::trim($value)) > 0;

        DEFINE FIELD IF NOT EXISTS description ON task TYPE option<string>;

        DEFINE FIELD IF NOT EXISTS done ON task TYPE bool DEFAULT false;

        DEFINE FIELD IF NOT EXISTS reminder ON task TYPE option<datetime>;

        DEFINE FIELD IF NOT EXISTS repetition ON task TYPE option<string>;

        DEFINE FIELD IF NOT EXISTS state ON task TYPE option<string>;

        DEFINE FIELD IF NOT EXISTS priority ON task TYPE int DEFAULT 100;

        DEFINE FIELD IF NOT EXISTS tags ON task TYPE array<record<tag>> DEFAULT [];

        DEFINE FIELD IF NOT EXISTS workbenches ON task TYPE array<record<workbench>> DEFAULT [];

        DEFINE FIELD IF NOT EXISTS created_at ON task TYPE datetime DEFAULT time::now();

        DEFINE FIELD IF NOT EXISTS updated_at ON task TYPE datetime DEFAULT time::now();

        DEFINE INDEX IF NOT EXISTS task_owner ON task FIELDS owner;
    "#;

    /// Define the view table; filters are stored as a JSON array of task filters
    pub const DEFINE_VIEW_TABLE: &str = r#"
        DEFINE TABLE IF NOT EXISTS view SCHEMAFULL;

        DEFINE FIELD IF NOT EXISTS owner ON view TYPE string;

        DEFINE FIELD IF NOT EXISTS name ON view TYPE string
            ASSERT string::len(string::trim($value)) > 0;

        DEFINE FIELD IF NOT EXISTS filters ON view TYPE string DEFAULT "[]";

        DEFINE FIELD IF NOT EXISTS created_at ON view TYPE datetime DEFAULT time::now();

        DEFINE FIELD IF NOT EXISTS updated_at ON view TYPE datetime DEFAULT time::now();

        DEFINE INDEX IF NOT EXISTS view_owner_name ON view FIELDS owner, name UNIQUE;
    "#;
}

/// Initialize the database schema.
///
/// Tags and workbenches are defined before tasks so the task link fields
/// refer to existing tables.
///
/// # Errors
///
/// Returns `DbError::Schema` if any definition fails.
pub async fn init_schema(client: &Surreal<Db>) -> Result<(), DbError> {
    for definition in [
        sql::DEFINE_TAG_TABLE,
        sql::DEFINE_WORKBENCH_TABLE,
        sql::DEFINE_TASK_TABLE,
        sql::DEFINE_VIEW_TABLE,
    ] {
        client
            .query(definition)
            .await
            .map_err(|e| DbError::Schema(Box::new(e)))?
            .check()
            .map_err(|e| DbError::Schema(Box::new(e)))?;
    }

    Ok(())
}
