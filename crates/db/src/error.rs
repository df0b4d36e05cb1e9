use std::path::PathBuf;
use thiserror::Error;

/// Kind of record named by a [`DbError::NotFound`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Task,
    Tag,
    Workbench,
    View,
}

impl EntityKind {
    /// Returns the lowercase name used in messages and table names
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Task => "task",
            EntityKind::Tag => "tag",
            EntityKind::Workbench => "workbench",
            EntityKind::View => "view",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Database error types for taskmill
#[derive(Error, Debug)]
pub enum DbError {
    /// Error establishing connection to the database
    #[error("Failed to connect to database at {path}: {source}")]
    Connection {
        path: PathBuf,
        #[source]
        source: Box<surrealdb::Error>,
    },

    /// Error during schema initialization
    #[error("Failed to initialize database schema: {0}")]
    Schema(#[source] Box<surrealdb::Error>),

    /// Error executing a query
    #[error("Query execution failed")]
    Query(#[source] Box<surrealdb::Error>),

    /// Error with database path (invalid or inaccessible)
    #[error("Invalid database path: {path} - {reason}")]
    InvalidPath { path: PathBuf, reason: String },

    /// Error creating database directory
    #[error("Failed to create database directory at {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error encoding a value for the store
    #[error("Failed to serialize value: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A requested record does not exist for the acting tenant
    #[error("{kind} with id '{id}' not found")]
    NotFound { kind: EntityKind, id: String },

    /// A uniqueness constraint was violated within the tenant scope
    #[error("{message}")]
    Conflict { message: String },

    /// A filter value or semantics tag had the wrong type
    ///
    /// Indicates a mismatch between declared filter metadata and the value
    /// handed to a strategy. Never caused by ordinary user input.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: String,
    },

    /// A semantics tag outside the fixed enumeration
    #[error("unknown filter semantics '{tag}'")]
    UnknownSemantics { tag: String },

    /// Error for invalid input or validation failure
    #[error("{message}")]
    ValidationError { message: String },
}

impl From<surrealdb::Error> for DbError {
    fn from(err: surrealdb::Error) -> Self {
        classify(err)
    }
}

/// Marker text SurrealDB uses when a unique index rejects a record
pub(crate) const UNIQUE_INDEX_VIOLATION: &str = "already contains";

/// Convert a store error, turning unique-index violations into `Conflict`.
pub(crate) fn classify(err: surrealdb::Error) -> DbError {
    let message = err.to_string();
    if message.contains(UNIQUE_INDEX_VIOLATION) {
        DbError::Conflict {
            message: format!("name already in use ({})", message),
        }
    } else {
        DbError::Query(Box::new(err))
    }
}

impl DbError {
    /// Get the full error message including nested SurrealDB error details.
    pub fn full_message(&self) -> String {
        match self {
            DbError::Query(err) => format!("Query execution failed: {}", err),
            DbError::Schema(err) => format!("Failed to initialize database schema: {}", err),
            other => other.to_string(),
        }
    }

    /// Whether this error is an expected outcome that callers should report
    /// to the user as-is (missing record, conflict, bad input).
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            DbError::NotFound { .. } | DbError::Conflict { .. } | DbError::ValidationError { .. }
        )
    }

    pub(crate) fn not_found(kind: EntityKind, id: impl Into<String>) -> Self {
        DbError::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        DbError::ValidationError {
            message: message.into(),
        }
    }
}

/// Result type alias for database operations
pub type DbResult<T> = Result<T, DbError>;
