//! Output formatting module for taskmill
//!
//! Provides table formatting and display utilities for CLI output.

use chrono::{DateTime, Utc};
use std::fmt::Write;
use taskmill_db::{Tag, Task, View, ViewResult, Workbench, WorkbenchTasks};

/// Maximum width for the title column before truncation
const MAX_TITLE_WIDTH: usize = 30;

/// Maximum width for the tags column before truncation
const MAX_TAGS_WIDTH: usize = 20;

/// Truncate a string to the specified maximum width, adding ellipsis if needed.
///
/// Widths count characters, so multi-byte titles are never split.
fn truncate(s: &str, max_width: usize) -> String {
    if s.chars().count() <= max_width {
        s.to_string()
    } else if max_width <= 3 {
        s.chars().take(max_width).collect()
    } else {
        let head: String = s.chars().take(max_width - 3).collect();
        format!("{}...", head)
    }
}

/// Render rows under headers, columns separated by two spaces.
///
/// Produces output in the format:
/// ```text
/// ID        Name
/// --------  -------
/// kq3v9d0a  backend
/// ```
fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, header)| {
            rows.iter()
                .map(|row| row[i].chars().count())
                .max()
                .unwrap_or(0)
                .max(header.len())
        })
        .collect();

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(render_row(headers.iter().copied(), &widths));
    lines.push(render_row(widths.iter().map(|w| "-".repeat(*w)), &widths));
    for row in rows {
        lines.push(render_row(row.iter().map(String::as_str), &widths));
    }
    lines.join("\n")
}

fn render_row<S: AsRef<str>>(cells: impl Iterator<Item = S>, widths: &[usize]) -> String {
    let cells: Vec<String> = cells
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell.as_ref(), width = width))
        .collect();
    cells.join("  ").trim_end().to_string()
}

/// Format a timestamp for readable display
fn format_timestamp(ts: Option<&DateTime<Utc>>) -> String {
    match ts {
        Some(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        None => "-".to_string(),
    }
}

/// Format tags as a comma-separated string.
fn format_tags(tags: &[&str]) -> String {
    if tags.is_empty() {
        "-".to_string()
    } else {
        tags.join(", ")
    }
}

fn checkbox(done: bool) -> &'static str {
    if done { "[x]" } else { "[ ]" }
}

/// Format tasks into an aligned table string.
///
/// ```text
/// ID        Done  Priority  State  Title          Tags        Reminder
/// --------  ----  --------  -----  -------------  ----------  ----------------
/// kq3v9d0a  [ ]   100       todo   Write report   work        2024-05-01 09:30
/// ```
pub fn format_task_table(tasks: &[Task]) -> String {
    if tasks.is_empty() {
        return "No tasks found.".to_string();
    }

    let rows: Vec<Vec<String>> = tasks
        .iter()
        .map(|task| {
            vec![
                task.id.clone(),
                checkbox(task.done).to_string(),
                task.priority.to_string(),
                task.state.clone().unwrap_or_else(|| "-".to_string()),
                truncate(&task.title, MAX_TITLE_WIDTH),
                truncate(&format_tags(&task.tag_names()), MAX_TAGS_WIDTH),
                format_timestamp(task.reminder.as_ref()),
            ]
        })
        .collect();

    render_table(
        &["ID", "Done", "Priority", "State", "Title", "Tags", "Reminder"],
        &rows,
    )
}

/// Format one task with all of its fields and memberships.
pub fn format_task_detail(task: &Task) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Task: {}", task.id);
    let _ = writeln!(out, "{}", "=".repeat(40));
    let _ = writeln!(out, "Title: {}", task.title);
    if let Some(description) = &task.description {
        let _ = writeln!(out, "Description: {}", description);
    }
    let _ = writeln!(out, "Done: {}", checkbox(task.done));
    let _ = writeln!(out, "Priority: {}", task.priority);
    if let Some(state) = &task.state {
        let _ = writeln!(out, "State: {}", state);
    }
    if let Some(reminder) = &task.reminder {
        let _ = writeln!(out, "Reminder: {}", format_timestamp(Some(reminder)));
    }
    if let Some(repetition) = &task.repetition {
        let _ = writeln!(out, "Repetition: {}", repetition);
    }
    let _ = writeln!(out, "Tags: {}", format_tags(&task.tag_names()));

    if !task.workbenches.is_empty() {
        let _ = writeln!(out, "Workbenches:");
        for workbench in &task.workbenches {
            let _ = writeln!(out, "  - {} - {}", workbench.id, workbench.name);
        }
    }

    let _ = writeln!(out, "Created: {}", format_timestamp(Some(&task.created_at)));
    let _ = write!(out, "Updated: {}", format_timestamp(Some(&task.updated_at)));
    out
}

/// Format tags into an aligned table string.
pub fn format_tag_table(tags: &[Tag]) -> String {
    if tags.is_empty() {
        return "No tags found.".to_string();
    }

    let rows: Vec<Vec<String>> = tags
        .iter()
        .map(|tag| vec![tag.id.clone(), tag.name.clone()])
        .collect();
    render_table(&["ID", "Name"], &rows)
}

/// Format workbenches into an aligned table string.
pub fn format_workbench_table(workbenches: &[Workbench]) -> String {
    if workbenches.is_empty() {
        return "No workbenches found.".to_string();
    }

    let rows: Vec<Vec<String>> = workbenches
        .iter()
        .map(|wb| {
            vec![
                wb.id.clone(),
                wb.name.clone(),
                format_tags(&wb.columns.iter().map(String::as_str).collect::<Vec<_>>()),
            ]
        })
        .collect();
    render_table(&["ID", "Name", "Columns"], &rows)
}

/// Format a workbench with the tasks placed on it.
pub fn format_workbench_detail(board: &WorkbenchTasks) -> String {
    let workbench = &board.workbench;
    let mut out = String::new();
    let _ = writeln!(out, "Workbench: {} - {}", workbench.id, workbench.name);
    let _ = writeln!(out, "{}", "=".repeat(40));
    let columns: Vec<&str> = workbench.columns.iter().map(String::as_str).collect();
    let _ = writeln!(out, "Columns: {}", format_tags(&columns));
    let _ = writeln!(out);
    out.push_str(&format_task_table(&board.tasks));
    out
}

/// Format views into an aligned table string.
pub fn format_view_table(views: &[View]) -> String {
    if views.is_empty() {
        return "No views found.".to_string();
    }

    let rows: Vec<Vec<String>> = views
        .iter()
        .map(|view| {
            vec![
                view.id.clone(),
                view.name.clone(),
                view.filters.len().to_string(),
            ]
        })
        .collect();
    render_table(&["ID", "Name", "Filters"], &rows)
}

/// Format a view with its saved filters as JSON.
pub fn format_view_detail(view: &View) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "View: {} - {}", view.id, view.name);
    let _ = write!(out, "{}", "=".repeat(40));
    if view.filters.is_empty() {
        let _ = write!(out, "\nNo filters.");
    }
    for (i, filter) in view.filters.iter().enumerate() {
        let json = serde_json::to_string(filter).unwrap_or_else(|_| "{}".to_string());
        let _ = write!(out, "\n  {}. {}", i + 1, json);
    }
    out
}

/// Format the results of applying a view, one block per filter.
pub fn format_view_results(view: &View, results: &[ViewResult]) -> String {
    if results.is_empty() {
        return format!("View '{}' has no filters.", view.name);
    }

    let blocks: Vec<String> = results
        .iter()
        .enumerate()
        .map(|(i, result)| {
            let json = serde_json::to_string(&result.filter).unwrap_or_else(|_| "{}".to_string());
            format!(
                "Filter {}: {}\n{}",
                i + 1,
                json,
                format_task_table(&result.tasks)
            )
        })
        .collect();
    blocks.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn tag(id: &str, name: &str) -> Tag {
        Tag {
            id: id.to_string(),
            owner: "alice@example.com".to_string(),
            name: name.to_string(),
            created_at: at("2024-01-01T00:00:00Z"),
            updated_at: at("2024-01-01T00:00:00Z"),
        }
    }

    fn task(id: &str, title: &str) -> Task {
        Task {
            id: id.to_string(),
            owner: "alice@example.com".to_string(),
            title: title.to_string(),
            description: None,
            done: false,
            reminder: None,
            repetition: None,
            state: None,
            priority: 100,
            tags: vec![],
            workbenches: vec![],
            created_at: at("2024-01-01T00:00:00Z"),
            updated_at: at("2024-01-02T00:00:00Z"),
        }
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("exactly10!", 10), "exactly10!");
        assert_eq!(truncate("this is too long", 10), "this is...");
        assert_eq!(truncate("abcdef", 3), "abc");
        assert_eq!(truncate("ééééééé", 5), "éé...");
    }

    #[test]
    fn test_format_empty_tables() {
        assert_eq!(format_task_table(&[]), "No tasks found.");
        assert_eq!(format_tag_table(&[]), "No tags found.");
        assert_eq!(format_workbench_table(&[]), "No workbenches found.");
        assert_eq!(format_view_table(&[]), "No views found.");
    }

    #[test]
    fn test_format_single_task() {
        let mut t = task("kq3v9d0a", "Write report");
        t.done = true;
        t.state = Some("todo".to_string());
        t.tags = vec![tag("b1", "work")];
        t.reminder = Some(at("2024-05-01T09:30:00Z"));

        let result = format_task_table(&[t]);
        let lines: Vec<&str> = result.lines().collect();
        assert_eq!(lines.len(), 3, "Expected 3 lines: header, separator, data");

        let header_parts: Vec<&str> = lines[0].split_whitespace().collect();
        assert_eq!(
            header_parts,
            vec!["ID", "Done", "Priority", "State", "Title", "Tags", "Reminder"]
        );
        assert!(lines[1].chars().all(|c| c == '-' || c == ' '));

        let data_parts: Vec<&str> = lines[2].split_whitespace().collect();
        assert_eq!(
            data_parts,
            vec!["kq3v9d0a", "[x]", "100", "todo", "Write", "report", "work", "2024-05-01", "09:30"]
        );
    }

    #[test]
    fn test_columns_align() {
        let result = format_task_table(&[task("a1", "Short"), task("b2", "A much longer title")]);
        let lines: Vec<&str> = result.lines().collect();
        let tags_at = lines[0].find("Tags").unwrap();
        assert_eq!(&lines[2][tags_at..tags_at + 1], "-");
        assert_eq!(&lines[3][tags_at..tags_at + 1], "-");
    }

    #[test]
    fn test_long_title_is_truncated() {
        let title = "x".repeat(50);
        let result = format_task_table(&[task("a1", &title)]);
        assert!(result.contains(&format!("{}...", "x".repeat(MAX_TITLE_WIDTH - 3))));
        assert!(!result.contains(&title));
    }

    #[test]
    fn test_task_detail_shows_set_fields_only() {
        let mut t = task("kq3v9d0a", "Write report");
        t.description = Some("quarterly".to_string());
        let detail = format_task_detail(&t);

        assert!(detail.starts_with("Task: kq3v9d0a"));
        assert!(detail.contains("Description: quarterly"));
        assert!(detail.contains("Tags: -"));
        assert!(!detail.contains("Reminder:"));
        assert!(!detail.contains("Workbenches:"));
        assert!(detail.ends_with("Updated: 2024-01-02 00:00"));
    }

    #[test]
    fn test_tag_table() {
        let result = format_tag_table(&[tag("aaaa1111", "backend"), tag("bbbb2222", "ui")]);
        let lines: Vec<&str> = result.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[2], "aaaa1111  backend");
        assert_eq!(lines[3], "bbbb2222  ui");
    }
}
