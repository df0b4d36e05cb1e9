//! End-to-end integration tests for the taskmill CLI
//!
//! This test suite executes commands through the CLI command interface
//! using isolated database instances for each test to ensure no shared state.
//!
//! - `tasks` - task add, show, update and delete
//! - `queries` - list filters from flags and from `--spec`
//! - `tags` / `workbenches` / `views` - the other record kinds
//! - `tenancy` - one user never sees another's records
//! - `error_cases` - error handling

mod common;

use common::*;
use taskmill_cli::commands::{TagCommand, TaskCommand, ViewCommand, WorkbenchCommand};
use taskmill_db::DbError;

// =============================================================================
// TASK TESTS
// =============================================================================

mod tasks {
    use super::*;

    #[tokio::test]
    async fn test_add_creates_task_with_defaults() {
        let ctx = TestContext::new().await;

        let id = add_cmd("Groceries").execute(&ctx.db, &alice()).await.unwrap();

        let task = ctx.db.tasks().get(&alice(), &id).await.unwrap();
        assert_eq!(task.title, "Groceries");
        assert!(!task.done);
        assert_eq!(task.priority, 100);
        assert!(task.tags.is_empty());
    }

    #[tokio::test]
    async fn test_add_creates_tags_once() {
        let ctx = TestContext::new().await;

        add_cmd_with_tags("one", &["home", "weekly"])
            .execute(&ctx.db, &alice())
            .await
            .unwrap();
        let id = add_cmd_with_tags("two", &["weekly"])
            .execute(&ctx.db, &alice())
            .await
            .unwrap();

        let tags = ctx.db.tags().list(&alice()).await.unwrap();
        assert_eq!(tags.len(), 2);
        let task = ctx.db.tasks().get(&alice(), &id).await.unwrap();
        assert_eq!(task.tag_names(), ["weekly"]);
    }

    #[tokio::test]
    async fn test_add_with_workbench() {
        let ctx = TestContext::new().await;
        let wb = WorkbenchCommand::Add {
            name: "Home".to_string(),
            columns: strings(&["todo", "done"]),
        }
        .execute(&ctx.db, &alice())
        .await
        .unwrap();

        let cmd = AddTaskBuilder::new("Laundry").workbench(&wb).state("todo");
        let id = cmd.execute(&ctx.db, &alice()).await.unwrap();

        let task = ctx.db.tasks().get(&alice(), &id).await.unwrap();
        assert_eq!(task.workbench_ids(), [wb.as_str()]);
        assert_eq!(task.state.as_deref(), Some("todo"));
    }

    #[tokio::test]
    async fn test_show_prints_details() {
        let ctx = TestContext::new().await;
        let id = add_cmd_with_tags("Taxes", &["finance"])
            .execute(&ctx.db, &alice())
            .await
            .unwrap();

        let out = TaskCommand::Show { id: id.clone() }
            .execute(&ctx.db, &alice())
            .await
            .unwrap();
        assert!(out.starts_with(&format!("Task: {}", id)));
        assert!(out.contains("Title: Taxes"));
        assert!(out.contains("Tags: finance"));
    }

    #[tokio::test]
    async fn test_update_fields_and_tags() {
        let ctx = TestContext::new().await;
        let id = add_cmd_with_tags("Draft", &["a", "b"])
            .execute(&ctx.db, &alice())
            .await
            .unwrap();

        let mut cmd = update_cmd(&id);
        cmd.title = Some("Final".to_string());
        cmd.done = Some(true);
        cmd.add_tags = strings(&["c"]);
        cmd.remove_tags = strings(&["a"]);
        let out = cmd.execute(&ctx.db, &alice()).await.unwrap();
        assert!(out.contains("Title: Final"));

        let task = ctx.db.tasks().get(&alice(), &id).await.unwrap();
        assert!(task.done);
        assert_eq!(task.tag_names(), ["b", "c"]);
    }

    #[tokio::test]
    async fn test_update_clears_description() {
        let ctx = TestContext::new().await;
        let mut add = add_cmd("Described");
        add.description = Some("details".to_string());
        let id = add.execute(&ctx.db, &alice()).await.unwrap();

        let mut cmd = update_cmd(&id);
        cmd.clear_description = true;
        cmd.execute(&ctx.db, &alice()).await.unwrap();

        let task = ctx.db.tasks().get(&alice(), &id).await.unwrap();
        assert!(task.description.is_none());
    }

    #[tokio::test]
    async fn test_update_with_unknown_workbench_leaves_task_unchanged() {
        let ctx = TestContext::new().await;
        let id = add_cmd("Stable").execute(&ctx.db, &alice()).await.unwrap();

        let mut cmd = update_cmd(&id);
        cmd.title = Some("Changed".to_string());
        cmd.add_tags = strings(&["new"]);
        cmd.add_workbenches = strings(&["nosuchwb"]);
        let err = cmd.execute(&ctx.db, &alice()).await.unwrap_err();
        assert_eq!(err.to_string(), "workbench with id 'nosuchwb' not found");

        let task = ctx.db.tasks().get(&alice(), &id).await.unwrap();
        assert_eq!(task.title, "Stable");
        assert!(task.tags.is_empty());
        assert!(ctx.db.tags().list(&alice()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_task() {
        let ctx = TestContext::new().await;
        let id = add_cmd("Gone").execute(&ctx.db, &alice()).await.unwrap();

        let out = TaskCommand::Delete { id: id.clone() }
            .execute(&ctx.db, &alice())
            .await
            .unwrap();
        assert_eq!(out, format!("Deleted task {}", id));

        let err = ctx.db.tasks().get(&alice(), &id).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    /// Small builder for add commands that need several options
    struct AddTaskBuilder(taskmill_cli::commands::AddTask);

    impl AddTaskBuilder {
        fn new(title: &str) -> Self {
            Self(add_cmd(title))
        }

        fn workbench(mut self, id: &str) -> Self {
            self.0.workbenches.push(id.to_string());
            self
        }

        fn state(mut self, state: &str) -> Self {
            self.0.state = Some(state.to_string());
            self
        }

        async fn execute(
            self,
            db: &taskmill_db::Database,
            tenant: &taskmill_db::Tenant,
        ) -> Result<String, DbError> {
            self.0.execute(db, tenant).await
        }
    }
}

// =============================================================================
// QUERY TESTS
// =============================================================================

mod queries {
    use super::*;

    async fn seed(ctx: &TestContext) {
        for (title, priority, tags, done) in [
            ("alpha", 10, vec!["work"], false),
            ("beta", 50, vec!["work", "urgent"], true),
            ("gamma", 200, vec![], false),
        ] {
            let mut cmd = add_cmd_with_tags(title, &tags);
            cmd.priority = Some(priority);
            cmd.done = done;
            cmd.execute(&ctx.db, &alice()).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_list_empty_database() {
        let ctx = TestContext::new().await;
        let out = list_cmd().execute(&ctx.db, &alice()).await.unwrap();
        assert_eq!(out, "No tasks found.");
    }

    #[tokio::test]
    async fn test_list_all_in_creation_order() {
        let ctx = TestContext::new().await;
        seed(&ctx).await;

        let out = list_cmd().execute(&ctx.db, &alice()).await.unwrap();
        assert_eq!(table_titles(&out), ["alpha", "beta", "gamma"]);
    }

    #[tokio::test]
    async fn test_list_by_flags() {
        let ctx = TestContext::new().await;
        seed(&ctx).await;

        let mut cmd = list_cmd();
        cmd.tags = strings(&["work"]);
        cmd.done = Some(false);
        let out = cmd.execute(&ctx.db, &alice()).await.unwrap();
        assert_eq!(table_titles(&out), ["alpha"]);

        let mut cmd = list_cmd();
        cmd.min_priority = Some(50);
        let out = cmd.execute(&ctx.db, &alice()).await.unwrap();
        assert_eq!(table_titles(&out), ["beta", "gamma"]);

        let mut cmd = list_cmd();
        cmd.title = Some("%AM%".to_string());
        let out = cmd.execute(&ctx.db, &alice()).await.unwrap();
        assert_eq!(table_titles(&out), ["gamma"]);
    }

    #[tokio::test]
    async fn test_list_paging() {
        let ctx = TestContext::new().await;
        seed(&ctx).await;

        let mut cmd = list_cmd();
        cmd.offset = 1;
        cmd.limit = 1;
        let out = cmd.execute(&ctx.db, &alice()).await.unwrap();
        assert_eq!(table_titles(&out), ["beta"]);
    }

    #[tokio::test]
    async fn test_list_by_spec() {
        let ctx = TestContext::new().await;
        seed(&ctx).await;

        let mut cmd = list_cmd();
        cmd.spec = Some(
            r#"[{"field": "tags", "semantics": "with_tags", "value": ["urgent", "work"]}]"#
                .to_string(),
        );
        let out = cmd.execute(&ctx.db, &alice()).await.unwrap();
        assert_eq!(table_titles(&out), ["beta"]);
    }

    #[tokio::test]
    async fn test_list_spec_with_wrong_semantics_fails() {
        let ctx = TestContext::new().await;

        let mut cmd = list_cmd();
        cmd.spec =
            Some(r#"[{"field": "title", "semantics": "exact", "value": "alpha"}]"#.to_string());
        let err = cmd.execute(&ctx.db, &alice()).await.unwrap_err();
        assert!(matches!(err, DbError::ValidationError { .. }));

        cmd.spec =
            Some(r#"[{"field": "title", "semantics": "fuzzy", "value": "alpha"}]"#.to_string());
        let err = cmd.execute(&ctx.db, &alice()).await.unwrap_err();
        assert!(matches!(err, DbError::UnknownSemantics { .. }));
    }
}

// =============================================================================
// TAG TESTS
// =============================================================================

mod tags {
    use super::*;

    #[tokio::test]
    async fn test_add_list_rename_delete() {
        let ctx = TestContext::new().await;

        let out = TagCommand::Add {
            names: strings(&["b", "a", "b"]),
        }
        .execute(&ctx.db, &alice())
        .await
        .unwrap();
        assert_eq!(out.lines().count(), 4, "header, separator and two tags");

        let tags = ctx.db.tags().list(&alice()).await.unwrap();
        let a = tags[0].id.clone();

        let out = TagCommand::Rename {
            id: a.clone(),
            name: "c".to_string(),
        }
        .execute(&ctx.db, &alice())
        .await
        .unwrap();
        assert_eq!(out, format!("Renamed tag {} to 'c'", a));

        let err = TagCommand::Rename {
            id: a.clone(),
            name: "b".to_string(),
        }
        .execute(&ctx.db, &alice())
        .await
        .unwrap_err();
        assert!(matches!(err, DbError::Conflict { .. }));

        TagCommand::Delete { id: a }
            .execute(&ctx.db, &alice())
            .await
            .unwrap();
        let out = TagCommand::List.execute(&ctx.db, &alice()).await.unwrap();
        assert_eq!(out.lines().count(), 3);
    }

    #[tokio::test]
    async fn test_deleted_tag_disappears_from_tasks() {
        let ctx = TestContext::new().await;
        let id = add_cmd_with_tags("tagged", &["old", "kept"])
            .execute(&ctx.db, &alice())
            .await
            .unwrap();
        let old = ctx
            .db
            .tags()
            .list(&alice())
            .await
            .unwrap()
            .into_iter()
            .find(|t| t.name == "old")
            .unwrap();

        TagCommand::Delete { id: old.id }
            .execute(&ctx.db, &alice())
            .await
            .unwrap();

        let task = ctx.db.tasks().get(&alice(), &id).await.unwrap();
        assert_eq!(task.tag_names(), ["kept"]);
    }
}

// =============================================================================
// WORKBENCH TESTS
// =============================================================================

mod workbenches {
    use super::*;

    #[tokio::test]
    async fn test_show_lists_placed_tasks() {
        let ctx = TestContext::new().await;
        let wb = WorkbenchCommand::Add {
            name: "Sprint".to_string(),
            columns: vec![],
        }
        .execute(&ctx.db, &alice())
        .await
        .unwrap();

        let mut on = add_cmd("placed");
        on.workbenches = vec![wb.clone()];
        on.execute(&ctx.db, &alice()).await.unwrap();
        add_cmd("elsewhere").execute(&ctx.db, &alice()).await.unwrap();

        let out = WorkbenchCommand::Show { id: wb.clone() }
            .execute(&ctx.db, &alice())
            .await
            .unwrap();
        assert!(out.starts_with(&format!("Workbench: {} - Sprint", wb)));
        assert!(out.contains("placed"));
        assert!(!out.contains("elsewhere"));
    }

    #[tokio::test]
    async fn test_update_columns_and_duplicate_name() {
        let ctx = TestContext::new().await;
        let wb = WorkbenchCommand::Add {
            name: "Board".to_string(),
            columns: strings(&["todo", "doing"]),
        }
        .execute(&ctx.db, &alice())
        .await
        .unwrap();

        WorkbenchCommand::Update {
            id: wb.clone(),
            name: None,
            add_columns: strings(&["done"]),
            remove_columns: strings(&["doing"]),
        }
        .execute(&ctx.db, &alice())
        .await
        .unwrap();
        let updated = ctx.db.workbenches().get(&alice(), &wb).await.unwrap();
        assert_eq!(updated.columns, ["done", "todo"]);

        let err = WorkbenchCommand::Add {
            name: "Board".to_string(),
            columns: vec![],
        }
        .execute(&ctx.db, &alice())
        .await
        .unwrap_err();
        assert!(matches!(err, DbError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_delete_takes_tasks_off() {
        let ctx = TestContext::new().await;
        let wb = WorkbenchCommand::Add {
            name: "Temp".to_string(),
            columns: vec![],
        }
        .execute(&ctx.db, &alice())
        .await
        .unwrap();
        let mut add = add_cmd("resident");
        add.workbenches = vec![wb.clone()];
        let id = add.execute(&ctx.db, &alice()).await.unwrap();

        WorkbenchCommand::Delete { id: wb }
            .execute(&ctx.db, &alice())
            .await
            .unwrap();

        let task = ctx.db.tasks().get(&alice(), &id).await.unwrap();
        assert!(task.workbenches.is_empty());
    }
}

// =============================================================================
// VIEW TESTS
// =============================================================================

mod views {
    use super::*;

    #[tokio::test]
    async fn test_add_and_apply_view() {
        let ctx = TestContext::new().await;
        add_cmd_with_tags("tagged", &["work"])
            .execute(&ctx.db, &alice())
            .await
            .unwrap();
        add_cmd("plain").execute(&ctx.db, &alice()).await.unwrap();

        let id = ViewCommand::Add {
            name: "Work".to_string(),
            filters: strings(&[r#"{"tags": ["work"]}"#, r#"{"title": "pl%"}"#]),
        }
        .execute(&ctx.db, &alice())
        .await
        .unwrap();

        let out = ViewCommand::Apply { id: id.clone() }
            .execute(&ctx.db, &alice())
            .await
            .unwrap();
        let blocks: Vec<&str> = out.split("\n\n").collect();
        assert_eq!(blocks.len(), 2);
        assert!(blocks[0].starts_with("Filter 1:"));
        assert!(blocks[0].contains("tagged") && !blocks[0].contains("plain"));
        assert!(blocks[1].contains("plain") && !blocks[1].contains("tagged"));

        let out = ViewCommand::Show { id }
            .execute(&ctx.db, &alice())
            .await
            .unwrap();
        assert!(out.contains(r#"1. {"tags":["work"]"#));
    }

    #[tokio::test]
    async fn test_invalid_filter_json_is_rejected() {
        let ctx = TestContext::new().await;
        let err = ViewCommand::Add {
            name: "Broken".to_string(),
            filters: strings(&["not json"]),
        }
        .execute(&ctx.db, &alice())
        .await
        .unwrap_err();
        assert!(matches!(err, DbError::ValidationError { .. }));
        assert!(ctx.db.views().list(&alice()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_and_delete_views() {
        let ctx = TestContext::new().await;
        let id = ViewCommand::Add {
            name: "Empty".to_string(),
            filters: vec![],
        }
        .execute(&ctx.db, &alice())
        .await
        .unwrap();

        let out = ViewCommand::List.execute(&ctx.db, &alice()).await.unwrap();
        assert!(out.contains("Empty"));

        ViewCommand::Delete { id }
            .execute(&ctx.db, &alice())
            .await
            .unwrap();
        let out = ViewCommand::List.execute(&ctx.db, &alice()).await.unwrap();
        assert_eq!(out, "No views found.");
    }
}

// =============================================================================
// TENANCY TESTS
// =============================================================================

mod tenancy {
    use super::*;

    #[tokio::test]
    async fn test_users_see_only_their_tasks() {
        let ctx = TestContext::new().await;
        add_cmd("mine").execute(&ctx.db, &alice()).await.unwrap();
        let theirs = add_cmd("theirs").execute(&ctx.db, &bob()).await.unwrap();

        let out = list_cmd().execute(&ctx.db, &alice()).await.unwrap();
        assert_eq!(table_titles(&out), ["mine"]);

        let err = TaskCommand::Show { id: theirs.clone() }
            .execute(&ctx.db, &alice())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));

        let err = TaskCommand::Delete { id: theirs }
            .execute(&ctx.db, &alice())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_tag_names_are_per_user() {
        let ctx = TestContext::new().await;
        add_cmd_with_tags("a", &["shared"])
            .execute(&ctx.db, &alice())
            .await
            .unwrap();
        add_cmd_with_tags("b", &["shared"])
            .execute(&ctx.db, &bob())
            .await
            .unwrap();

        let alice_tags = ctx.db.tags().list(&alice()).await.unwrap();
        let bob_tags = ctx.db.tags().list(&bob()).await.unwrap();
        assert_eq!(alice_tags.len(), 1);
        assert_eq!(bob_tags.len(), 1);
        assert_ne!(alice_tags[0].id, bob_tags[0].id);
    }

    #[tokio::test]
    async fn test_cannot_use_another_users_workbench() {
        let ctx = TestContext::new().await;
        let wb = WorkbenchCommand::Add {
            name: "Bob's".to_string(),
            columns: vec![],
        }
        .execute(&ctx.db, &bob())
        .await
        .unwrap();

        let mut add = add_cmd("intruder");
        add.workbenches = vec![wb];
        let err = add.execute(&ctx.db, &alice()).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}

// =============================================================================
// ERROR CASES
// =============================================================================

mod error_cases {
    use super::*;

    #[tokio::test]
    async fn test_add_blank_title() {
        let ctx = TestContext::new().await;
        let err = add_cmd("   ").execute(&ctx.db, &alice()).await.unwrap_err();
        assert!(matches!(err, DbError::ValidationError { .. }));
    }

    #[tokio::test]
    async fn test_add_blank_tag() {
        let ctx = TestContext::new().await;
        let err = add_cmd_with_tags("ok", &[""])
            .execute(&ctx.db, &alice())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ValidationError { .. }));
    }

    #[tokio::test]
    async fn test_update_without_changes() {
        let ctx = TestContext::new().await;
        let id = add_cmd("idle").execute(&ctx.db, &alice()).await.unwrap();
        let err = update_cmd(&id).execute(&ctx.db, &alice()).await.unwrap_err();
        assert!(err.to_string().starts_with("nothing to update"));
    }

    #[tokio::test]
    async fn test_show_nonexistent_task() {
        let ctx = TestContext::new().await;
        let err = TaskCommand::Show {
            id: "nosuch1".to_string(),
        }
        .execute(&ctx.db, &alice())
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "task with id 'nosuch1' not found");
    }

    #[tokio::test]
    async fn test_list_zero_limit() {
        let ctx = TestContext::new().await;
        let mut cmd = list_cmd();
        cmd.limit = 0;
        let err = cmd.execute(&ctx.db, &alice()).await.unwrap_err();
        assert!(matches!(err, DbError::ValidationError { .. }));
    }
}
