//! Database module for taskmill
//!
//! Provides SurrealDB connection management with an embedded SurrealKV
//! backend, schema initialization, filter compilation and the repositories
//! for tasks, tags, workbenches and views.

pub mod error;
pub mod filter;
mod id;
pub mod models;
pub mod reconcile;
pub mod repository;
pub mod schema;
pub mod unit_of_work;

pub use error::{DbError, DbResult, EntityKind};
pub use filter::{
    DynamicField, DynamicFilter, FilterCompiler, FilterSpecification, Page, Semantics,
    StrategyRegistry, TaskFilter, TaskQuery,
};
pub use models::{
    NewTask, Tag, Task, TaskPatch, TaskUpdate, Tenant, View, ViewResult, Workbench,
    WorkbenchTasks, WorkbenchUpdate,
};
pub use reconcile::AssociationDelta;
pub use repository::{
    TagRepository, TaskCollector, TaskRepository, ViewRepository, WorkbenchRepository,
};

use std::path::{Path, PathBuf};
use std::process::Command;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem, SurrealKv};
use tracing::debug;

/// Default database path relative to project root or current working directory
pub const DEFAULT_DB_PATH: &str = ".taskmill/data";

const NAMESPACE: &str = "taskmill";
const DATABASE: &str = "main";

/// Database wrapper providing connection management for SurrealDB
pub struct Database {
    client: Surreal<Db>,
    /// Where the data lives; `:memory:` for in-memory stores
    path: PathBuf,
}

impl Database {
    /// Connect to a SurrealDB database at the specified path.
    ///
    /// Creates the database directory if it doesn't exist. Call
    /// [`Database::init`] before use.
    ///
    /// # Errors
    ///
    /// Returns `DbError::CreateDirectory` if directory creation fails.
    /// Returns `DbError::Connection` if database connection fails.
    pub async fn connect(path: &Path) -> DbResult<Self> {
        let path = Self::prepare_path(path)?;

        let client =
            Surreal::new::<SurrealKv>(path.clone())
                .await
                .map_err(|e| DbError::Connection {
                    path: path.clone(),
                    source: Box::new(e),
                })?;
        debug!("connected to {}", path.display());

        Ok(Self { client, path })
    }

    /// Open a fresh in-memory database with the schema in place.
    ///
    /// Every call yields an independent store.
    pub async fn connect_in_memory() -> DbResult<Self> {
        let path = PathBuf::from(":memory:");
        let client = Surreal::new::<Mem>(()).await.map_err(|e| DbError::Connection {
            path: path.clone(),
            source: Box::new(e),
        })?;

        let db = Self { client, path };
        db.init().await?;
        Ok(db)
    }

    /// Initialize the database schema.
    ///
    /// Selects the taskmill namespace and database, then defines the
    /// tables. Safe to run on every start.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Schema` if schema initialization fails.
    pub async fn init(&self) -> DbResult<()> {
        self.client
            .use_ns(NAMESPACE)
            .use_db(DATABASE)
            .await
            .map_err(|e| DbError::Schema(Box::new(e)))?;

        schema::init_schema(&self.client).await
    }

    /// Get a reference to the underlying SurrealDB client.
    pub fn client(&self) -> &Surreal<Db> {
        &self.client
    }

    /// Get the path where the database is stored.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn tasks(&self) -> TaskRepository<'_> {
        TaskRepository::new(&self.client)
    }

    pub fn tags(&self) -> TagRepository<'_> {
        TagRepository::new(&self.client)
    }

    pub fn workbenches(&self) -> WorkbenchRepository<'_> {
        WorkbenchRepository::new(&self.client)
    }

    pub fn views(&self) -> ViewRepository<'_> {
        ViewRepository::new(&self.client)
    }

    pub fn collector(&self) -> TaskCollector<'_> {
        TaskCollector::new(&self.client)
    }

    /// Get the default database path based on project root.
    ///
    /// Uses `git rev-parse --show-toplevel` to find the project root and
    /// returns `<project_root>/.taskmill/data`. Outside a git repository it
    /// falls back to `.taskmill/data` under the current working directory.
    pub fn default_path() -> PathBuf {
        find_project_root()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(DEFAULT_DB_PATH)
    }

    /// Create the database directory and its parents if missing.
    fn prepare_path(path: &Path) -> DbResult<PathBuf> {
        let path = path.to_path_buf();
        if path.as_os_str().is_empty() {
            return Err(DbError::InvalidPath {
                path,
                reason: "path is empty".to_string(),
            });
        }

        if !path.exists() {
            std::fs::create_dir_all(&path).map_err(|e| DbError::CreateDirectory {
                path: path.clone(),
                source: e,
            })?;
        } else if !path.is_dir() {
            return Err(DbError::InvalidPath {
                path,
                reason: "not a directory".to_string(),
            });
        }

        Ok(path)
    }
}

// Ensure Database is Send + Sync for async compatibility
static_assertions::assert_impl_all!(Database: Send, Sync);

/// Find the project root by running `git rev-parse --show-toplevel`.
///
/// Returns `None` if not in a git repository or the command fails.
pub fn find_project_root() -> Option<PathBuf> {
    let output = Command::new("git")
        .args(["rev-parse", "--show-toplevel"])
        .output()
        .ok()?;

    if output.status.success() {
        let path_str = String::from_utf8(output.stdout).ok()?;
        Some(PathBuf::from(path_str.trim()))
    } else {
        None
    }
}
