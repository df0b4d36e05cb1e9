//! Test infrastructure for integration tests
//!
//! Provides isolated database setup/teardown and CLI command builders.
//! Each test gets its own database instance to ensure no shared state.

use std::path::PathBuf;
use taskmill_cli::commands::{AddTask, ListTasks, UpdateTask};
use taskmill_db::{Database, Tenant};

/// Test context containing an isolated database and temp directory
pub struct TestContext {
    pub db: Database,
    pub temp_dir: PathBuf,
}

impl TestContext {
    /// Create a new test context with an isolated on-disk database.
    ///
    /// Each call creates a uniquely named temp directory using process ID,
    /// thread ID, and nanosecond timestamp to guarantee isolation.
    pub async fn new() -> Self {
        let temp_dir = std::env::temp_dir().join(format!(
            "taskmill-integration-test-{}-{:?}-{}",
            std::process::id(),
            std::thread::current().id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));

        let db = Database::connect(&temp_dir).await.unwrap();
        db.init().await.unwrap();

        Self { db, temp_dir }
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        // Auto-cleanup on drop
        let _ = std::fs::remove_dir_all(&self.temp_dir);
    }
}

pub fn alice() -> Tenant {
    Tenant::new("alice@example.com").unwrap()
}

pub fn bob() -> Tenant {
    Tenant::new("bob@example.com").unwrap()
}

pub fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

// =============================================================================
// Command Builder Helpers
// =============================================================================

/// Create an AddTask with default optional fields.
pub fn add_cmd(title: &str) -> AddTask {
    AddTask {
        title: title.to_string(),
        ..Default::default()
    }
}

/// Create an AddTask with tags.
pub fn add_cmd_with_tags(title: &str, tags: &[&str]) -> AddTask {
    AddTask {
        tags: strings(tags),
        ..add_cmd(title)
    }
}

/// Create an unfiltered ListTasks.
pub fn list_cmd() -> ListTasks {
    ListTasks::default()
}

/// Create an UpdateTask that changes nothing yet.
pub fn update_cmd(id: &str) -> UpdateTask {
    UpdateTask {
        id: id.to_string(),
        ..Default::default()
    }
}

/// Titles in the data rows of a task table, in order.
///
/// Assumes single-word titles.
#[allow(dead_code)]
pub fn table_titles(table: &str) -> Vec<String> {
    table
        .lines()
        .skip(2)
        .filter_map(|line| line.split_whitespace().nth(4))
        .map(String::from)
        .collect()
}
