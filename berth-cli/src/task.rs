//! Task table shared by `stack ps` and `service ps`.

use crate::idresolver::{IdResolver, ResolveKind};
use anyhow::Result;
use berth_core::{Task, TaskState};
use std::io::Write;
use std::time::{Duration, SystemTime};
use tabled::settings::object::Segment;
use tabled::settings::{Modify, Padding, Style};
use tabled::{Table, Tabled};

const MAX_ERR_LENGTH: usize = 30;

#[derive(Tabled)]
struct TaskRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "IMAGE")]
    image: String,
    #[tabled(rename = "NODE")]
    node: String,
    #[tabled(rename = "DESIRED STATE")]
    desired_state: String,
    #[tabled(rename = "CURRENT STATE")]
    current_state: String,
    #[tabled(rename = "ERROR")]
    error: String,
}

/// Write the task table to `out`.
pub async fn print(
    out: &mut dyn Write,
    tasks: Vec<Task>,
    resolver: &mut IdResolver<'_>,
) -> Result<()> {
    print_at(out, tasks, resolver, SystemTime::now()).await
}

async fn print_at(
    out: &mut dyn Write,
    mut tasks: Vec<Task>,
    resolver: &mut IdResolver<'_>,
    now: SystemTime,
) -> Result<()> {
    // Slot order; within a slot the newest task comes first.
    tasks.sort_by(|a, b| a.slot.cmp(&b.slot).then_with(|| b.created_at.cmp(&a.created_at)));

    let mut rows = Vec::with_capacity(tasks.len());
    let mut prev_name = String::new();

    for task in tasks {
        let service_name = resolver.resolve(ResolveKind::Service, &task.service_id).await;
        let node_name = resolver.resolve(ResolveKind::Node, &task.node_id).await;

        let name = if task.slot > 0 {
            format!("{}.{}", service_name, task.slot)
        } else {
            service_name
        };

        let indented = if name == prev_name { format!(" \\_ {}", name) } else { name.clone() };
        prev_name = name;

        let since = now.duration_since(task.status.timestamp).unwrap_or_default();

        rows.push(TaskRow {
            id: task.id,
            name: indented,
            image: task.image,
            node: node_name,
            desired_state: pretty_state(task.desired_state),
            current_state: format!(
                "{} {} ago",
                pretty_state(task.status.state),
                human_duration(since).to_lowercase()
            ),
            error: format_error(&task.status.err),
        });
    }

    let mut table = Table::new(rows);
    table.with(Style::empty()).with(Modify::new(Segment::all()).with(Padding::new(0, 2, 0, 0)));

    for line in table.to_string().lines() {
        writeln!(out, "{}", line.trim_end())?;
    }

    Ok(())
}

/// `running` -> `Running`
fn pretty_state(state: TaskState) -> String {
    let s = state.as_str();
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn format_error(err: &str) -> String {
    if err.is_empty() {
        return String::new();
    }

    if err.chars().count() > MAX_ERR_LENGTH {
        let truncated: String = err.chars().take(MAX_ERR_LENGTH - 1).collect();
        format!("\"{}…\"", truncated)
    } else {
        format!("\"{}\"", err)
    }
}

/// Approximate, human readable duration ("About a minute", "3 hours").
pub fn human_duration(d: Duration) -> String {
    let seconds = d.as_secs();
    let minutes = seconds / 60;
    let hours = (d.as_secs_f64() / 3600.0 + 0.5) as u64;

    if seconds < 1 {
        "Less than a second".to_string()
    } else if seconds == 1 {
        "1 second".to_string()
    } else if seconds < 60 {
        format!("{} seconds", seconds)
    } else if minutes == 1 {
        "About a minute".to_string()
    } else if minutes < 46 {
        format!("{} minutes", minutes)
    } else if hours == 1 {
        "About an hour".to_string()
    } else if hours < 48 {
        format!("{} hours", hours)
    } else if hours < 24 * 7 * 2 {
        format!("{} days", hours / 24)
    } else if hours < 24 * 30 * 2 {
        format!("{} weeks", hours / 24 / 7)
    } else if hours < 24 * 365 * 2 {
        format!("{} months", hours / 24 / 30)
    } else {
        format!("{} years", seconds / 3600 / 24 / 365)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::fake::{service, FakeManager};
    use berth_core::{Node, ServiceSpec, TaskStatus};

    fn at(secs: u64) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
    }

    fn task(id: &str, slot: u64, created: u64, state: TaskState, err: &str) -> Task {
        Task {
            id: id.to_string(),
            service_id: "s1".to_string(),
            slot,
            node_id: "n1".to_string(),
            image: "nginx:1.11".to_string(),
            desired_state: TaskState::Running,
            status: TaskStatus { state, timestamp: at(created), err: err.to_string() },
            created_at: at(created),
        }
    }

    fn fake() -> FakeManager {
        let spec = ServiceSpec { name: "shop_web".to_string(), ..Default::default() };
        FakeManager::new().with_service(service("s1", spec)).with_node(Node {
            id: "n1".to_string(),
            name: String::new(),
            hostname: "worker1".to_string(),
        })
    }

    async fn render(tasks: Vec<Task>, no_resolve: bool) -> Vec<String> {
        let fake = fake();
        let mut resolver = IdResolver::new(&fake, no_resolve);
        let mut out = Vec::new();
        print_at(&mut out, tasks, &mut resolver, at(1000)).await.unwrap();
        String::from_utf8(out).unwrap().lines().map(str::to_string).collect()
    }

    #[tokio::test]
    async fn test_header_and_alignment() {
        let lines = render(vec![task("t1", 1, 990, TaskState::Running, "")], false).await;

        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("ID  NAME"));
        assert!(lines[0].ends_with("ERROR"));
        assert_eq!(lines[0].find("CURRENT STATE"), lines[1].find("Running 10 seconds ago"));
        assert!(lines[1].starts_with("t1  shop_web.1  nginx:1.11  worker1  Running"));
        assert!(lines[1].ends_with("Running 10 seconds ago"));
    }

    #[tokio::test]
    async fn test_sorted_by_slot_then_newest_first() {
        let tasks = vec![
            task("old", 1, 100, TaskState::Shutdown, ""),
            task("two", 2, 500, TaskState::Running, ""),
            task("new", 1, 900, TaskState::Running, ""),
        ];
        let lines = render(tasks, false).await;

        assert!(lines[1].starts_with("new  shop_web.1"));
        assert!(lines[2].starts_with("old   \\_ shop_web.1"));
        assert!(lines[3].starts_with("two  shop_web.2"));
    }

    #[tokio::test]
    async fn test_slot_zero_has_no_suffix() {
        let lines = render(vec![task("t1", 0, 990, TaskState::Running, "")], false).await;
        assert!(lines[1].starts_with("t1  shop_web  "));
    }

    #[tokio::test]
    async fn test_no_resolve_shows_ids() {
        let lines = render(vec![task("t1", 3, 990, TaskState::Running, "")], true).await;
        assert!(lines[1].starts_with("t1  s1.3  nginx:1.11  n1  "));
    }

    #[tokio::test]
    async fn test_error_is_quoted_and_truncated() {
        let long = "task: non-zero exit (1): no such file or directory";
        let lines = render(
            vec![
                task("t1", 1, 990, TaskState::Failed, long),
                task("t2", 2, 990, TaskState::Failed, "exit 1"),
            ],
            false,
        )
        .await;

        assert!(lines[1].ends_with("\"task: non-zero exit (1): no s…\""));
        assert!(lines[2].ends_with("\"exit 1\""));
        assert!(lines[2].contains("Failed 10 seconds ago"));
    }

    #[test]
    fn test_format_error_boundary() {
        let exact = "a".repeat(30);
        assert_eq!(format_error(&exact), format!("\"{}\"", exact));

        let over = "a".repeat(31);
        assert_eq!(format_error(&over), format!("\"{}…\"", "a".repeat(29)));
        assert_eq!(format_error(""), "");
    }

    #[test]
    fn test_pretty_state() {
        assert_eq!(pretty_state(TaskState::Running), "Running");
        assert_eq!(pretty_state(TaskState::New), "New");
    }

    #[test]
    fn test_human_duration() {
        let secs = Duration::from_secs;
        assert_eq!(human_duration(Duration::from_millis(400)), "Less than a second");
        assert_eq!(human_duration(secs(1)), "1 second");
        assert_eq!(human_duration(secs(45)), "45 seconds");
        assert_eq!(human_duration(secs(90)), "About a minute");
        assert_eq!(human_duration(secs(30 * 60)), "30 minutes");
        assert_eq!(human_duration(secs(50 * 60)), "About an hour");
        assert_eq!(human_duration(secs(5 * 3600)), "5 hours");
        assert_eq!(human_duration(secs(3 * 24 * 3600)), "3 days");
        assert_eq!(human_duration(secs(21 * 24 * 3600)), "3 weeks");
        assert_eq!(human_duration(secs(90 * 24 * 3600)), "3 months");
        assert_eq!(human_duration(secs(3 * 365 * 24 * 3600)), "3 years");
    }
}
