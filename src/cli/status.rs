//
//  pampu
//  cli/status.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! `pampu status [build]`
//!
//! Without a build key the latest build of the current git branch is shown:
//! `main`/`master` build on the plan itself, other branches are matched to a
//! plan branch by their ticket number.
//!
//! Fails with `BuildFailed` (exit status 1) when the build failed, so it can
//! gate scripts.
//!
//! ## Examples
//!
//! ```bash
//! pampu status
//! pampu status MYPROJECT-BUILD-42
//! ```

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use crate::api::bamboo::BuildResult;
use crate::context::PlanResolver;
use crate::output::{format_status, print_field, OutputWriter, TableOutput};
use crate::util::strip_html;

use super::{bamboo_client, current_branch_build, get_format, GlobalOptions};

/// Show build details (defaults to the current git branch)
#[derive(Args, Debug)]
pub struct StatusCommand {
    /// Build key, e.g. MYPROJECT-BUILD-42
    pub build: Option<String>,

    /// Plan used to find the current branch's build
    #[arg(long, short = 'p')]
    pub plan: Option<String>,
}

#[derive(Debug, Serialize)]
struct BuildStatus {
    key: String,
    state: String,
    life_cycle_state: Option<String>,
    duration: Option<String>,
    reason: Option<String>,
    tests: Option<TestCounts>,
    vcs_revision: Option<String>,
    failed: bool,
}

#[derive(Debug, Serialize)]
struct TestCounts {
    passed: u64,
    failed: u64,
    skipped: u64,
}

impl From<&BuildResult> for BuildStatus {
    fn from(result: &BuildResult) -> Self {
        Self {
            key: result.display_key().to_string(),
            state: result.verdict().to_string(),
            life_cycle_state: result.life_cycle_state.clone(),
            duration: result.build_duration_description.clone(),
            reason: result.reason_summary.as_deref().map(strip_html),
            tests: result.has_tests().then(|| TestCounts {
                passed: result.successful_test_count.unwrap_or(0),
                failed: result.failed_test_count.unwrap_or(0),
                skipped: result.skipped_test_count.unwrap_or(0),
            }),
            vcs_revision: result.vcs_revision_key.clone(),
            failed: result.is_failed(),
        }
    }
}

impl TableOutput for BuildStatus {
    fn print_table(&self, color: bool) {
        print_field("Build   ", &self.key, color);
        print_field("State   ", &format_status(&self.state, color), color);
        print_field("Duration", self.duration.as_deref().unwrap_or(""), color);
        print_field("Reason  ", self.reason.as_deref().unwrap_or(""), color);

        if let Some(tests) = &self.tests {
            print_field(
                "Tests   ",
                &format!(
                    "{} passed, {} failed, {} skipped",
                    tests.passed, tests.failed, tests.skipped
                ),
                color,
            );
        }
    }
}

impl StatusCommand {
    pub async fn run(&self, global: &GlobalOptions) -> Result<()> {
        let client = bamboo_client()?;

        let build_key = match &self.build {
            Some(key) => key.clone(),
            None => {
                let plan_key = PlanResolver::discover().plan_key(self.plan.as_deref())?;
                let (_, latest) = current_branch_build(&client, &plan_key).await?;
                latest.key
            }
        };

        let result = client.build_status(&build_key).await?;
        let status = BuildStatus::from(&result);

        OutputWriter::new(get_format(global)).write(&status)?;

        result.ensure_passed()?;
        Ok(())
    }
}
