//! `berth service ps`

use crate::client::ManagerApi;
use crate::idresolver::IdResolver;
use crate::task;
use anyhow::Result;
use berth_core::Filters;
use std::io::Write;

pub struct PsOptions {
    pub service: String,
    pub no_resolve: bool,
    pub filters: Filters,
}

/// List the tasks of one service.
pub async fn ps(client: &dyn ManagerApi, opts: &PsOptions, out: &mut dyn Write) -> Result<()> {
    let service = client.service_inspect(&opts.service).await?;

    let mut filters = opts.filters.clone();
    filters.add("service", service.id);

    let tasks = client.task_list(&filters).await?;

    let mut resolver = IdResolver::new(client, opts.no_resolve);
    task::print(out, tasks, &mut resolver).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::fake::{service, FakeManager};
    use berth_core::{Node, ServiceSpec, Task, TaskState, TaskStatus};
    use std::time::SystemTime;

    fn task(id: &str, service_id: &str, slot: u64) -> Task {
        let now = SystemTime::now();
        Task {
            id: id.to_string(),
            service_id: service_id.to_string(),
            slot,
            node_id: "n1".to_string(),
            image: "nginx".to_string(),
            desired_state: TaskState::Running,
            status: TaskStatus { state: TaskState::Running, timestamp: now, err: String::new() },
            created_at: now,
        }
    }

    fn fake() -> FakeManager {
        let web = ServiceSpec { name: "shop_web".to_string(), ..Default::default() };
        let api = ServiceSpec { name: "shop_api".to_string(), ..Default::default() };
        FakeManager::new()
            .with_service(service("s1", web))
            .with_service(service("s2", api))
            .with_node(Node {
                id: "n1".to_string(),
                name: "edge".to_string(),
                hostname: "host1".to_string(),
            })
            .with_task(task("t2", "s1", 2))
            .with_task(task("t1", "s1", 1))
            .with_task(task("t3", "s2", 1))
    }

    #[tokio::test]
    async fn test_ps_by_service_name() {
        let fake = fake();
        let opts = PsOptions {
            service: "shop_web".to_string(),
            no_resolve: false,
            filters: Filters::new(),
        };
        let mut out = Vec::new();

        ps(&fake, &opts, &mut out).await.unwrap();

        let out = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("t1  shop_web.1  nginx  edge  Running"));
        assert!(lines[2].starts_with("t2  shop_web.2  nginx  edge  Running"));
    }

    #[tokio::test]
    async fn test_ps_no_resolve() {
        let fake = fake();
        let opts =
            PsOptions { service: "s2".to_string(), no_resolve: true, filters: Filters::new() };
        let mut out = Vec::new();

        ps(&fake, &opts, &mut out).await.unwrap();

        let out = String::from_utf8(out).unwrap();
        assert!(out.lines().nth(1).unwrap().starts_with("t3  s2.1  nginx  n1  "));
        assert_eq!(fake.count("node_inspect"), 0);
    }

    #[tokio::test]
    async fn test_unknown_service() {
        let fake = fake();
        let opts =
            PsOptions { service: "ghost".to_string(), no_resolve: false, filters: Filters::new() };
        let mut out = Vec::new();

        let err = ps(&fake, &opts, &mut out).await.unwrap_err();
        assert_eq!(err.to_string(), "service ghost not found");
    }
}
