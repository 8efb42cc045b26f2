//
//  pampu
//  cli/versions.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Deployment version commands
//!
//! ## Examples
//!
//! ```bash
//! # Newest versions of the plan's deployment project
//! pampu versions -n 5
//!
//! # Commit and subject of each version's build
//! pampu versions --sha
//!
//! # Version from the latest build of the current git branch
//! pampu version-create
//!
//! # Version from a specific build
//! pampu version-create MYPROJECT-BUILD-42
//! ```

use anyhow::{anyhow, Result};
use clap::Args;
use console::style;
use serde::Serialize;
use tracing::debug;

use crate::api::bamboo::{BuildResult, DeploymentProject, DeploymentVersion};
use crate::api::BambooClient;
use crate::context::{GitContext, PlanResolver};
use crate::output::{truncate, OutputWriter, TableOutput};
use crate::util::relative_time;

use super::{
    bamboo_client, current_branch_build, get_format, short_sha, GlobalOptions, RevisionCache,
};

/// List deployment versions
#[derive(Args, Debug)]
pub struct VersionsCommand {
    /// Plan key, e.g. MYPROJECT-BUILD
    pub plan: Option<String>,

    /// Number of versions to show
    #[arg(long, short = 'n', default_value = "20")]
    pub limit: u32,

    /// Show the git commit of each version
    #[arg(long)]
    pub sha: bool,
}

/// Create a deployment version from a build
#[derive(Args, Debug)]
pub struct VersionCreateCommand {
    /// Build key (defaults to the latest build of the current git branch)
    pub build: Option<String>,

    /// Plan whose deployment project receives the version
    #[arg(long, short = 'p')]
    pub plan: Option<String>,
}

impl TableOutput for DeploymentVersion {
    fn print_table(&self, color: bool) {
        let who = self.creator_display_name.as_deref().unwrap_or("");
        let build = self.build_key().unwrap_or("");
        let name = truncate(&self.name, 50);
        if color {
            println!(
                "{:<50} {:<8} {:<20} {}",
                name,
                relative_time(self.creation_date),
                who,
                style(build).dim()
            );
        } else {
            println!(
                "{:<50} {:<8} {:<20} {}",
                name,
                relative_time(self.creation_date),
                who,
                build
            );
        }
    }
}

/// A version with the commit of its build.
#[derive(Debug, Serialize)]
struct VersionRevision {
    #[serde(flatten)]
    version: DeploymentVersion,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<String>,
}

impl VersionRevision {
    /// `--sha` line: commit and subject when the commit is in the local
    /// clone.
    fn line(&self, git: Option<&GitContext>) -> String {
        let commit = self
            .sha
            .as_deref()
            .zip(git)
            .and_then(|(sha, git)| git.commit_info(sha));
        match commit {
            Some(commit) => format!(
                "{:<30} {:<10} {}",
                self.version.name,
                commit.short_sha,
                truncate(&commit.subject, 60)
            ),
            None => format!(
                "{:<30} {:<10} (not in local repo)",
                self.version.name,
                self.sha.as_deref().map(short_sha).unwrap_or("?")
            ),
        }
    }
}

/// Finds the deployment project linked to a plan.
pub(crate) async fn deployment_project(
    client: &BambooClient,
    plan_key: &str,
) -> Result<DeploymentProject> {
    client
        .deployment_project_for_plan(plan_key)
        .await?
        .ok_or_else(|| anyhow!("No deployment project found for {}", plan_key))
}

/// Version name for an explicit build: the build key without the plan
/// prefix, so `PROJ-API-12` of plan `PROJ-API` becomes `12`.
fn version_name_for_build(build_key: &str, plan_key: &str) -> String {
    build_key
        .strip_prefix(&format!("{}-", plan_key))
        .unwrap_or(build_key)
        .to_string()
}

/// Version name for a branch build: `{branch}-{build number}`.
fn version_name_for_branch(branch: &str, build: &BuildResult) -> String {
    let number = build
        .build_number
        .map(|n| n.to_string())
        .or_else(|| build.key.rsplit('-').next().map(str::to_string))
        .unwrap_or_default();
    format!("{}-{}", branch, number)
}

impl VersionsCommand {
    pub async fn run(&self, global: &GlobalOptions) -> Result<()> {
        let plan_key = PlanResolver::discover().plan_key(self.plan.as_deref())?;
        let client = bamboo_client()?;

        let project = deployment_project(&client, &plan_key).await?;
        let versions = client.list_deploy_versions(project.id, self.limit).await?;

        let writer = OutputWriter::new(get_format(global));
        if versions.is_empty() && !writer.is_json() {
            println!("No versions found.");
            return Ok(());
        }
        if !self.sha {
            return writer.write_list(&versions);
        }

        let mut cache = RevisionCache::default();
        let mut rows = Vec::with_capacity(versions.len());
        for version in versions {
            let sha = match version.build_key() {
                Some(build_key) => cache.get(&client, build_key).await,
                None => None,
            };
            rows.push(VersionRevision { version, sha });
        }

        if writer.is_json() {
            return writer.write_json(&rows);
        }
        let git = GitContext::open()
            .map_err(|e| debug!("No local repository for commit lookups: {:#}", e))
            .ok();
        for row in &rows {
            if row.version.build_key().is_some() {
                println!("{}", row.line(git.as_ref()));
            } else {
                row.version.print_table(writer.color_enabled());
            }
        }
        Ok(())
    }
}

impl VersionCreateCommand {
    pub async fn run(&self, global: &GlobalOptions) -> Result<()> {
        let plan_key = PlanResolver::discover().plan_key(self.plan.as_deref())?;
        let client = bamboo_client()?;

        let (build_key, name) = match &self.build {
            Some(build) => (build.clone(), version_name_for_build(build, &plan_key)),
            None => {
                let (branch, build) = current_branch_build(&client, &plan_key).await?;
                let name = version_name_for_branch(&branch.name, &build);
                (build.key, name)
            }
        };

        let project = deployment_project(&client, &plan_key).await?;
        let version = client.create_version(project.id, &build_key, &name).await?;

        let writer = OutputWriter::new(get_format(global));
        if writer.is_json() {
            return writer.write_json(&version);
        }
        writer.write_success(&format!("Created version: {}", version.name));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_name_for_build_strips_plan() {
        assert_eq!(version_name_for_build("PROJ-API-12", "PROJ-API"), "12");
        assert_eq!(version_name_for_build("PROJ-API3-4", "PROJ-API"), "PROJ-API3-4");
    }

    #[test]
    fn test_version_revision_line() {
        use crate::context::fixtures;

        let dir = tempfile::tempdir().unwrap();
        let repo = git2::Repository::init(dir.path()).unwrap();
        let id = fixtures::commit(&repo, &[], "Add login form");
        let git = GitContext::open_at(dir.path()).unwrap();

        let version: DeploymentVersion =
            serde_json::from_str(r#"{"id": 9, "name": "master-31"}"#).unwrap();
        let mut row = VersionRevision {
            version,
            sha: Some(id.to_string()),
        };
        let line = row.line(Some(&git));
        assert!(line.starts_with(&format!("{:<30} ", "master-31")));
        assert!(line.ends_with(" Add login form"));

        row.sha = Some("0123456789abcdef".to_string());
        assert_eq!(
            row.line(Some(&git)),
            format!("{:<30} {:<10} (not in local repo)", "master-31", "01234567")
        );

        row.sha = None;
        assert_eq!(
            row.line(None),
            format!("{:<30} {:<10} (not in local repo)", "master-31", "?")
        );
    }

    #[test]
    fn test_version_name_for_branch() {
        let build = BuildResult {
            key: "PROJ-API12-7".to_string(),
            build_number: Some(7),
            ..Default::default()
        };
        assert_eq!(version_name_for_branch("feature-PROJ-1", &build), "feature-PROJ-1-7");

        let build = BuildResult {
            key: "PROJ-API-31".to_string(),
            ..Default::default()
        };
        assert_eq!(version_name_for_branch("master", &build), "master-31");
    }
}
