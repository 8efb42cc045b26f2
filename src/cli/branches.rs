//
//  pampu
//  cli/branches.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! `pampu branches <plan>`
//!
//! The `MATCH` marker shows which branch `pampu status` would pick for the
//! current git branch.

use anyhow::Result;
use clap::Args;
use console::style;
use serde::Serialize;

use crate::api::bamboo::PlanBranch;
use crate::context::{find_match, BranchRecord, GitContext, PlanResolver};
use crate::output::{OutputWriter, TableOutput};

use super::{bamboo_client, get_format, GlobalOptions};

/// List the branches of a plan
#[derive(Args, Debug)]
pub struct BranchesCommand {
    /// Plan key, e.g. MYPROJECT-BUILD (defaults to the repository's plan)
    pub plan: Option<String>,
}

#[derive(Debug, Serialize)]
struct BranchItem {
    key: String,
    name: String,
    enabled: Option<bool>,
    current: bool,
}

impl TableOutput for BranchItem {
    fn print_table(&self, color: bool) {
        let marker = if self.current { "  <- current" } else { "" };
        if color {
            println!(
                "{}\t{}{}",
                style(&self.key).cyan(),
                self.name,
                style(marker).green()
            );
        } else {
            println!("{}\t{}{}", self.key, self.name, marker);
        }
    }
}

impl BranchesCommand {
    pub async fn run(&self, global: &GlobalOptions) -> Result<()> {
        let plan_key = PlanResolver::discover().plan_key(self.plan.as_deref())?;
        let client = bamboo_client()?;
        let branches = client.list_branches(&plan_key).await?;

        let writer = OutputWriter::new(get_format(global));
        if branches.is_empty() && !writer.is_json() {
            println!("No branches found.");
            return Ok(());
        }

        let current_key = current_branch_key(&branches);
        let items: Vec<BranchItem> = branches
            .into_iter()
            .map(|b| BranchItem {
                current: current_key.as_deref() == Some(b.key.as_str()),
                key: b.key,
                name: b.short_name,
                enabled: b.enabled,
            })
            .collect();

        writer.write_list(&items)
    }
}

/// Key of the branch matching the checked-out git branch, if any.
fn current_branch_key(branches: &[PlanBranch]) -> Option<String> {
    let git_branch = GitContext::open().ok()?.current_branch().ok()?;
    let records: Vec<BranchRecord> = branches.iter().map(BranchRecord::from).collect();
    find_match(&git_branch, &records).map(|r| r.key.clone())
}
