//! `berth stack ps`

use crate::client::ManagerApi;
use crate::idresolver::IdResolver;
use crate::task;
use anyhow::Result;
use berth_core::stack::LABEL_NAMESPACE;
use berth_core::Filters;
use std::io::Write;

pub struct PsOptions {
    pub namespace: String,
    pub no_resolve: bool,
    pub all: bool,
    pub filters: Filters,
}

/// List the tasks of a stack.
pub async fn run_ps(client: &dyn ManagerApi, opts: &PsOptions, out: &mut dyn Write) -> Result<()> {
    let mut filters = opts.filters.clone();
    filters.add("label", format!("{}={}", LABEL_NAMESPACE, opts.namespace));
    if !opts.all {
        filters.add("desired-state", "running");
    }

    let tasks = client.task_list(&filters).await?;
    if tasks.is_empty() {
        writeln!(out, "Nothing found in stack: {}", opts.namespace)?;
        return Ok(());
    }

    let mut resolver = IdResolver::new(client, opts.no_resolve);
    task::print(out, tasks, &mut resolver).await
}
