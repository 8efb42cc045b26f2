//
//  pampu
//  cli/deploys.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! `pampu deploys [plan]`
//!
//! Shows the latest deployment of every environment of the deployment
//! projects linked to a plan, or to every plan of a project when a project
//! key (no dash) is given.
//!
//! ## Markers
//!
//! | Marker | Meaning |
//! |--------|---------|
//! | ❌ | Last deployment failed |
//! | ⏳ | Deployment queued or running |
//! | 🐢 | Runs an older `master-` version than another environment |
//! | 🏎️ | The only environment on the newest `master-` version |
//!
//! With `--sha` each environment shows the commit its build was made from,
//! looked up in the local clone.

use anyhow::Result;
use clap::Args;
use console::{pad_str, style, Alignment};
use serde::Serialize;

use tracing::debug;

use crate::api::bamboo::{DashboardEntry, EnvironmentStatus};
use crate::context::{GitContext, PlanResolver};
use crate::output::{format_status, print_header, truncate, OutputWriter};
use crate::util::{manual_runner, relative_time};

use super::{bamboo_client, get_format, short_sha, GlobalOptions, RevisionCache};

const MASTER_PREFIX: &str = "master-";

/// Show what is deployed to each environment
#[derive(Args, Debug)]
pub struct DeploysCommand {
    /// Plan key (PROJ-PLAN) or project key (PROJ)
    pub plan: Option<String>,

    /// Show the git commit of each deployment
    #[arg(long)]
    pub sha: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum Marker {
    Failed,
    InProgress,
    Stale,
    Leader,
}

impl Marker {
    fn symbol(self) -> &'static str {
        match self {
            Marker::Failed => "❌",
            Marker::InProgress => "⏳",
            Marker::Stale => "🐢",
            Marker::Leader => "🏎️",
        }
    }
}

#[derive(Debug, Serialize)]
struct ProjectDeploys {
    project: String,
    plan_key: String,
    environments: Vec<EnvironmentRow>,
}

#[derive(Debug, Serialize)]
struct EnvironmentRow {
    environment: String,
    version: Option<String>,
    state: Option<String>,
    finished_date: Option<i64>,
    who: Option<String>,
    build_key: Option<String>,
    marker: Option<Marker>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<String>,
}

/// Newest `master-` version id across environments and whether exactly
/// one environment runs it while others run older ones.
#[derive(Debug, Default, PartialEq, Eq)]
struct MasterProgress {
    newest_id: Option<u64>,
    show_leader: bool,
}

fn master_progress(statuses: &[EnvironmentStatus]) -> MasterProgress {
    let ids: Vec<u64> = statuses
        .iter()
        .filter_map(|s| s.deployment_result.as_ref()?.deployment_version.as_ref())
        .filter(|v| v.name.starts_with(MASTER_PREFIX))
        .map(|v| v.id)
        .collect();

    let Some(newest) = ids.iter().copied().max() else {
        return MasterProgress::default();
    };
    let on_newest = ids.iter().filter(|id| **id == newest).count();
    let has_older = ids.iter().any(|id| *id < newest);

    MasterProgress {
        newest_id: Some(newest),
        show_leader: on_newest == 1 && has_older,
    }
}

fn environment_row(status: &EnvironmentStatus, progress: &MasterProgress) -> EnvironmentRow {
    let environment = status.environment.name.clone();
    let Some(result) = &status.deployment_result else {
        return EnvironmentRow {
            environment,
            version: None,
            state: None,
            finished_date: None,
            who: None,
            build_key: None,
            marker: None,
            sha: None,
        };
    };

    let version = result.deployment_version.as_ref();
    let state = result.deployment_state.clone();
    let life_cycle = result.life_cycle_state.as_deref();

    let who = version
        .and_then(|v| v.creator_display_name.clone())
        .filter(|w| !w.is_empty())
        .or_else(|| result.reason_summary.as_deref().and_then(manual_runner));

    let is_master = version.is_some_and(|v| v.name.starts_with(MASTER_PREFIX));
    let version_id = version.map(|v| v.id);

    let in_progress = |s: Option<&str>| matches!(s, Some("IN_PROGRESS") | Some("QUEUED"));
    let marker = if state.as_deref() == Some("FAILED") {
        Some(Marker::Failed)
    } else if in_progress(state.as_deref()) || in_progress(life_cycle) {
        Some(Marker::InProgress)
    } else if is_master && progress.newest_id.is_some() && version_id != progress.newest_id {
        Some(Marker::Stale)
    } else if is_master && progress.show_leader && version_id == progress.newest_id {
        Some(Marker::Leader)
    } else {
        None
    };

    EnvironmentRow {
        environment,
        version: version.map(|v| v.name.clone()),
        state,
        finished_date: result.finished_date,
        who,
        build_key: version.and_then(|v| v.build_key()).map(str::to_string),
        marker,
        sha: None,
    }
}

fn project_deploys(entry: &DashboardEntry) -> ProjectDeploys {
    let progress = master_progress(&entry.environment_statuses);
    ProjectDeploys {
        project: entry.deployment_project.name.clone(),
        plan_key: entry.plan_key().to_string(),
        environments: entry
            .environment_statuses
            .iter()
            .map(|s| environment_row(s, &progress))
            .collect(),
    }
}

/// `--sha` line: commit and subject, or the raw revision and version when
/// the commit is not in the local clone.
fn revision_line(row: &EnvironmentRow, version: &str, git: Option<&GitContext>) -> String {
    let commit = row
        .sha
        .as_deref()
        .zip(git)
        .and_then(|(sha, git)| git.commit_info(sha));
    match commit {
        Some(commit) => format!(
            "  {:<20} {:<10} {}",
            row.environment,
            commit.short_sha,
            truncate(&commit.subject, 50)
        ),
        None => format!(
            "  {:<20} {:<10} {}{}",
            row.environment,
            row.sha.as_deref().map(short_sha).unwrap_or("?"),
            version,
            row.marker.map(Marker::symbol).unwrap_or("")
        ),
    }
}

fn print_project(project: &ProjectDeploys, color: bool, revisions: Option<Option<&GitContext>>) {
    println!();
    print_header(&project.project);
    for row in &project.environments {
        let Some(version) = &row.version else {
            println!("  {:<20} (no deployments)", row.environment);
            continue;
        };
        if let (Some(git), Some(_)) = (revisions, &row.build_key) {
            println!("{}", revision_line(row, version, git));
            continue;
        }
        let marker = row.marker.map(Marker::symbol).unwrap_or("");
        let state = format_status(row.state.as_deref().unwrap_or("?"), color);
        println!(
            "  {:<20} {:<40} {} {} {:<8} {}",
            row.environment,
            version,
            pad_str(marker, 2, Alignment::Left, None),
            pad_str(&state, 10, Alignment::Left, None),
            relative_time(row.finished_date),
            if color {
                style(row.who.as_deref().unwrap_or("")).dim().to_string()
            } else {
                row.who.clone().unwrap_or_default()
            }
        );
    }
}

impl DeploysCommand {
    pub async fn run(&self, global: &GlobalOptions) -> Result<()> {
        let key = PlanResolver::discover().dashboard_key(self.plan.as_deref())?;
        let client = bamboo_client()?;
        let dashboard = client.deployment_dashboard().await?;

        let mut projects: Vec<ProjectDeploys> = dashboard
            .iter()
            .filter(|entry| entry.matches(&key))
            .map(project_deploys)
            .collect();

        if self.sha {
            let mut cache = RevisionCache::default();
            for row in projects.iter_mut().flat_map(|p| p.environments.iter_mut()) {
                if let Some(build_key) = &row.build_key {
                    row.sha = cache.get(&client, build_key).await;
                }
            }
        }

        let writer = OutputWriter::new(get_format(global));
        if writer.is_json() {
            return writer.write_json(&projects);
        }

        if projects.is_empty() {
            println!("No deployment projects found for {}", key);
            return Ok(());
        }
        let git = if self.sha {
            GitContext::open()
                .map_err(|e| debug!("No local repository for commit lookups: {:#}", e))
                .ok()
        } else {
            None
        };
        let revisions = self.sha.then_some(git.as_ref());
        for project in &projects {
            print_project(project, writer.color_enabled(), revisions);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dashboard(json: &str) -> DashboardEntry {
        serde_json::from_str(json).unwrap()
    }

    fn env(name: &str, version: Option<(u64, &str)>, state: &str) -> String {
        match version {
            Some((id, version)) => format!(
                r#"{{"environment": {{"id": 1, "name": "{name}"}},
                    "deploymentResult": {{"deploymentState": "{state}", "lifeCycleState": "FINISHED",
                        "deploymentVersion": {{"id": {id}, "name": "{version}"}}}}}}"#
            ),
            None => format!(r#"{{"environment": {{"id": 1, "name": "{name}"}}}}"#),
        }
    }

    fn entry(envs: &[String]) -> DashboardEntry {
        dashboard(&format!(
            r#"{{"deploymentProject": {{"id": 5, "name": "API", "planKey": {{"key": "PROJ-API"}}}},
                "environmentStatuses": [{}]}}"#,
            envs.join(",")
        ))
    }

    #[test]
    fn test_leader_and_stale_markers() {
        let entry = entry(&[
            env("DEV", Some((30, "master-30")), "SUCCESS"),
            env("QA", Some((20, "master-20")), "SUCCESS"),
            env("UAT", Some((20, "master-20")), "SUCCESS"),
        ]);
        let project = project_deploys(&entry);

        let markers: Vec<_> = project.environments.iter().map(|e| e.marker).collect();
        assert_eq!(
            markers,
            vec![Some(Marker::Leader), Some(Marker::Stale), Some(Marker::Stale)]
        );
    }

    #[test]
    fn test_no_leader_when_newest_is_shared() {
        let entry = entry(&[
            env("DEV", Some((30, "master-30")), "SUCCESS"),
            env("QA", Some((30, "master-30")), "SUCCESS"),
        ]);
        let project = project_deploys(&entry);
        assert!(project.environments.iter().all(|e| e.marker.is_none()));
    }

    #[test]
    fn test_failed_and_branch_versions() {
        let entry = entry(&[
            env("DEV", Some((40, "feature-PROJ-1-3")), "FAILED"),
            env("QA", Some((30, "master-30")), "SUCCESS"),
            env("UAT", None, ""),
        ]);
        let project = project_deploys(&entry);

        assert_eq!(project.environments[0].marker, Some(Marker::Failed));
        assert_eq!(project.environments[1].marker, None);
        assert_eq!(project.environments[2].version, None);
        assert_eq!(project.environments[2].marker, None);
    }

    #[test]
    fn test_revision_line() {
        use crate::context::fixtures;

        let dir = tempfile::tempdir().unwrap();
        let repo = git2::Repository::init(dir.path()).unwrap();
        let id = fixtures::commit(
            &repo,
            &[],
            "Merge pull request #40 from acme/feature/PROJ-40-a-rather-long-branch-name",
        );
        let git = GitContext::open_at(dir.path()).unwrap();

        let entry = entry(&[env("DEV", Some((30, "master-30")), "FAILED")]);
        let mut row = project_deploys(&entry).environments.remove(0);
        row.sha = Some(id.to_string());

        let line = revision_line(&row, "master-30", Some(&git));
        assert!(line.starts_with(&format!("  {:<20} ", "DEV")));
        assert!(line.ends_with(" Merge pull request #40 from acme/feature/PROJ-4..."));

        row.sha = Some("0123456789abcdef".to_string());
        let line = revision_line(&row, "master-30", Some(&git));
        assert_eq!(line, format!("  {:<20} {:<10} master-30❌", "DEV", "01234567"));

        row.sha = None;
        assert_eq!(
            revision_line(&row, "master-30", None),
            format!("  {:<20} {:<10} master-30❌", "DEV", "?")
        );
    }

    #[test]
    fn test_who_falls_back_to_manual_runner() {
        let entry = dashboard(
            r#"{"deploymentProject": {"id": 5, "name": "API"},
                "environmentStatuses": [{
                    "environment": {"id": 1, "name": "DEV"},
                    "deploymentResult": {
                        "deploymentState": "SUCCESS",
                        "reasonSummary": "Manual run by <a href=\"/u/ada\">Ada</a>",
                        "deploymentVersion": {"id": 3, "name": "release-3"}
                    }
                }]}"#,
        );
        let project = project_deploys(&entry);
        assert_eq!(project.environments[0].who.as_deref(), Some("Ada"));
    }
}
