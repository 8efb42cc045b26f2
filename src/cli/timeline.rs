//
//  pampu
//  cli/timeline.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! `pampu timeline [plan]`
//!
//! Walks the first-parent history of `origin/main` from the oldest deployed
//! commit to the tip and marks the commits environments currently run.
//! Deployments of commits that are not on `origin/main` are listed under
//! "On feature branches".
//!
//! Environments named `SERVICE_STAGE` are grouped per stage: `all DEV` when
//! every service of the stage runs the commit, `DEV(API,WEB❌)` otherwise.
//!
//! ## Examples
//!
//! ```bash
//! # Every plan of the project from .pampu.toml
//! pampu timeline
//!
//! pampu timeline MYPROJECT-BUILD
//! ```

use std::collections::{BTreeMap, BTreeSet, HashMap};

use anyhow::{bail, Context, Result};
use clap::Args;
use console::style;
use git2::Oid;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::warn;

use crate::api::BambooClient;
use crate::context::{GitContext, PlanResolver};
use crate::output::{truncate, OutputWriter};
use crate::util::relative_time;

use super::{bamboo_client, get_format, GlobalOptions, RevisionCache};

const MAIN_REF: &str = "origin/main";

static MERGE_PR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Merge pull request #(\d+) from [^/]+/(.+)").unwrap());

static BRANCH_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(bugfix|bugfixes|feature|features|tmp)/").unwrap());

/// Show git history with environment markers
#[derive(Args, Debug)]
pub struct TimelineCommand {
    /// Plan key (PROJ-PLAN) or project key (PROJ)
    pub plan: Option<String>,
}

/// The commit deployed to one environment.
#[derive(Debug, Clone)]
struct DeployedRevision {
    environment: String,
    sha: String,
    state: Option<String>,
}

#[derive(Debug, Serialize)]
struct TimelineCommit {
    sha: String,
    author: String,
    timestamp: i64,
    subject: String,
    environments: Vec<String>,
}

#[derive(Debug, Serialize)]
struct BranchDeployment {
    sha: String,
    branch: String,
    author: String,
    timestamp: i64,
    environments: Vec<String>,
}

#[derive(Debug, Serialize)]
struct Timeline {
    commits: Vec<TimelineCommit>,
    branches: Vec<BranchDeployment>,
}

fn split_environment(name: &str) -> Option<(&str, &str)> {
    name.rsplit_once('_')
}

fn strip_branch_prefix(branch: &str) -> String {
    BRANCH_PREFIX.replace(branch, "").into_owned()
}

/// Shortens `Merge pull request #123 from org/feature/x` to `#123 x`, then
/// truncates to `max_len`.
fn abbreviate_subject(subject: &str, max_len: usize) -> String {
    let subject = match MERGE_PR.captures(subject) {
        Some(caps) => format!("#{} {}", &caps[1], strip_branch_prefix(&caps[2])),
        None => subject.to_string(),
    };
    truncate(&subject, max_len)
}

fn short_name(author: &str) -> &str {
    author.split_whitespace().next().unwrap_or("")
}

/// Builds environment labels from the `SERVICE_STAGE` naming scheme.
struct EnvLabeler {
    services: BTreeSet<String>,
    stages: BTreeSet<String>,
    states: HashMap<String, String>,
}

impl EnvLabeler {
    fn new(deployed: &[DeployedRevision]) -> Self {
        let mut services = BTreeSet::new();
        let mut stages = BTreeSet::new();
        let mut states = HashMap::new();
        for revision in deployed {
            if let Some((service, stage)) = split_environment(&revision.environment) {
                services.insert(service.to_string());
                stages.insert(stage.to_string());
            }
            if let Some(state) = &revision.state {
                states.insert(revision.environment.clone(), state.clone());
            }
        }
        Self {
            services,
            stages,
            states,
        }
    }

    fn marker(&self, environment: &str) -> &'static str {
        match self.states.get(environment).map(String::as_str) {
            Some("FAILED") => "❌",
            Some("IN_PROGRESS") | Some("QUEUED") => "⏳",
            _ => "",
        }
    }

    /// Returns the short label (`all DEV, LEGACY`) and the detail label for
    /// stages only some services run (`QA(API❌)`).
    fn label(&self, environments: &[String]) -> (String, String) {
        let mut by_stage: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        let mut ungrouped: Vec<&str> = Vec::new();
        for environment in environments {
            match split_environment(environment) {
                Some((service, stage)) => {
                    by_stage.entry(stage).or_default().insert(service);
                }
                None => ungrouped.push(environment),
            }
        }

        let mut short = Vec::new();
        let mut detail = Vec::new();
        for stage in &self.stages {
            let Some(services) = by_stage.get(stage.as_str()) else {
                continue;
            };
            let markers: Vec<&str> = services
                .iter()
                .map(|service| self.marker(&format!("{}_{}", service, stage)))
                .collect();

            if services.len() == self.services.len() {
                // A stage marker only when every service shares it
                let shared = markers
                    .first()
                    .copied()
                    .filter(|m| !m.is_empty() && markers.iter().all(|other| other == m))
                    .unwrap_or("");
                short.push(format!("all {}{}", stage, shared));
            } else {
                let list: Vec<String> = services
                    .iter()
                    .zip(&markers)
                    .map(|(service, marker)| format!("{}{}", service, marker))
                    .collect();
                detail.push(format!("{}({})", stage, list.join(",")));
            }
        }

        ungrouped.sort_unstable();
        short.extend(ungrouped.into_iter().map(str::to_string));
        (short.join(", "), detail.join(", "))
    }
}

/// Collects the commit of every environment of the deployment projects
/// matching `key`. Environments whose build has no recorded commit are left
/// out.
async fn deployed_revisions(client: &BambooClient, key: &str) -> Result<Vec<DeployedRevision>> {
    let dashboard = client.deployment_dashboard().await?;
    let mut cache = RevisionCache::default();
    let mut deployed = Vec::new();

    let statuses = dashboard
        .iter()
        .filter(|entry| entry.matches(key))
        .flat_map(|entry| entry.environment_statuses.iter());
    for status in statuses {
        let Some(result) = &status.deployment_result else {
            continue;
        };
        let Some(build_key) = result
            .deployment_version
            .as_ref()
            .and_then(|version| version.build_key())
        else {
            continue;
        };
        if let Some(sha) = cache.get(client, build_key).await {
            deployed.push(DeployedRevision {
                environment: status.environment.name.clone(),
                sha,
                state: result.deployment_state.clone(),
            });
        }
    }
    Ok(deployed)
}

impl Timeline {
    fn build(git: &GitContext, deployed: &[DeployedRevision]) -> Result<Self> {
        let mut by_commit: Vec<(Oid, Vec<String>)> = Vec::new();
        for revision in deployed {
            let Some(id) = git.resolve(&revision.sha) else {
                warn!(
                    environment = %revision.environment,
                    sha = %revision.sha,
                    "Deployed commit is not in the local repository"
                );
                continue;
            };
            match by_commit.iter_mut().find(|(commit, _)| *commit == id) {
                Some((_, environments)) => environments.push(revision.environment.clone()),
                None => by_commit.push((id, vec![revision.environment.clone()])),
            }
        }

        let main = git
            .resolve(MAIN_REF)
            .with_context(|| format!("Unknown revision '{}'", MAIN_REF))?;
        let (on_main, on_branches): (Vec<_>, Vec<_>) = by_commit
            .into_iter()
            .partition(|(id, _)| git.is_ancestor(*id, main));
        if on_main.is_empty() {
            bail!("No deployments found on main branch");
        }

        let main_ids: Vec<Oid> = on_main.iter().map(|(id, _)| *id).collect();
        let oldest = git
            .merge_base(&main_ids)
            .or_else(|| main_ids.first().copied())
            .context("Could not determine oldest deployment")?;

        let commits = git
            .first_parent_log(oldest, MAIN_REF)?
            .into_iter()
            .map(|commit| {
                let environments = on_main
                    .iter()
                    .find(|(id, _)| *id == commit.id)
                    .map(|(_, environments)| environments.clone())
                    .unwrap_or_default();
                TimelineCommit {
                    sha: commit.short_sha,
                    author: commit.author,
                    timestamp: commit.timestamp_ms,
                    subject: commit.subject,
                    environments,
                }
            })
            .collect();

        let mut branches = Vec::new();
        for (id, environments) in on_branches {
            let Some(commit) = git.commit_info(&id.to_string()) else {
                continue;
            };
            let branch = git
                .remote_branches_containing(id)?
                .into_iter()
                .find(|name| !name.contains("main"))
                .map(|name| strip_branch_prefix(&name))
                .unwrap_or_else(|| "unknown".to_string());
            branches.push(BranchDeployment {
                sha: commit.short_sha,
                branch,
                author: commit.author,
                timestamp: commit.timestamp_ms,
                environments,
            });
        }

        Ok(Self { commits, branches })
    }

    fn render(&self, labeler: &EnvLabeler, color: bool) -> Vec<String> {
        let sha = |sha: &str| {
            if color {
                style(sha).yellow().to_string()
            } else {
                sha.to_string()
            }
        };
        let pointer = |label: String| {
            if label.is_empty() {
                label
            } else {
                format!("<- {}", label)
            }
        };

        let mut lines = Vec::new();
        for commit in &self.commits {
            let (short, detail) = labeler.label(&commit.environments);
            let line = format!(
                "{}  {:<3} {:<10} {:<50} {}",
                sha(&commit.sha),
                relative_time(Some(commit.timestamp)),
                short_name(&commit.author),
                abbreviate_subject(&commit.subject, 48),
                pointer(short)
            );
            lines.push(line.trim_end().to_string());
            if !detail.is_empty() {
                lines.push(format!("          {}", detail));
            }
        }

        if !self.branches.is_empty() {
            lines.push(String::new());
            lines.push("On feature branches:".to_string());
            for deployment in &self.branches {
                let (short, detail) = labeler.label(&deployment.environments);
                let line = format!(
                    "  {}  {:<3} {:<10} {:<42} {}",
                    sha(&deployment.sha),
                    relative_time(Some(deployment.timestamp)),
                    short_name(&deployment.author),
                    truncate(&deployment.branch, 40),
                    pointer(short)
                );
                lines.push(line.trim_end().to_string());
                if !detail.is_empty() {
                    lines.push(format!("            {}", detail));
                }
            }
        }
        lines
    }
}

impl TimelineCommand {
    pub async fn run(&self, global: &GlobalOptions) -> Result<()> {
        let key = PlanResolver::discover().dashboard_key(self.plan.as_deref())?;
        let git = GitContext::open()?;
        let client = bamboo_client()?;

        let deployed = deployed_revisions(&client, &key).await?;
        if deployed.is_empty() {
            bail!("No deployments found or could not fetch SHAs");
        }
        let timeline = Timeline::build(&git, &deployed)?;

        let writer = OutputWriter::new(get_format(global));
        if writer.is_json() {
            return writer.write_json(&timeline);
        }
        let labeler = EnvLabeler::new(&deployed);
        for line in timeline.render(&labeler, writer.color_enabled()) {
            println!("{}", line);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::fixtures;
    use git2::Repository;
    use mockito::Matcher;

    fn deployed(environment: &str, sha: &str, state: &str) -> DeployedRevision {
        DeployedRevision {
            environment: environment.to_string(),
            sha: sha.to_string(),
            state: Some(state.to_string()),
        }
    }

    fn names(environments: &[&str]) -> Vec<String> {
        environments.iter().map(|e| e.to_string()).collect()
    }

    #[test]
    fn test_abbreviate_subject() {
        assert_eq!(
            abbreviate_subject("Merge pull request #123 from acme/feature/PROJ-1-login", 48),
            "#123 PROJ-1-login"
        );
        assert_eq!(
            abbreviate_subject("Merge pull request #7 from acme/release-2", 48),
            "#7 release-2"
        );
        assert_eq!(abbreviate_subject("Bump version", 48), "Bump version");
        assert_eq!(
            abbreviate_subject("Rework the login form so it validates on blur", 20),
            "Rework the login ..."
        );
    }

    #[test]
    fn test_short_name() {
        assert_eq!(short_name("Ada Lovelace"), "Ada");
        assert_eq!(short_name(""), "");
    }

    #[test]
    fn test_labels_group_by_stage() {
        let labeler = EnvLabeler::new(&[
            deployed("ADMIN_DEV", "a", "SUCCESS"),
            deployed("API_DEV", "a", "SUCCESS"),
            deployed("ADMIN_QA", "b", "FAILED"),
            deployed("API_QA", "c", "SUCCESS"),
            deployed("ADMIN_UAT", "c", "FAILED"),
            deployed("API_UAT", "c", "FAILED"),
            deployed("LEGACY", "a", "SUCCESS"),
        ]);

        assert_eq!(
            labeler.label(&names(&["API_DEV", "LEGACY", "ADMIN_DEV"])),
            ("all DEV, LEGACY".to_string(), String::new())
        );
        assert_eq!(
            labeler.label(&names(&["ADMIN_QA"])),
            (String::new(), "QA(ADMIN❌)".to_string())
        );
        assert_eq!(
            labeler.label(&names(&["API_QA", "ADMIN_UAT", "API_UAT"])),
            ("all UAT❌".to_string(), "QA(API)".to_string())
        );
        assert_eq!(labeler.label(&[]), (String::new(), String::new()));
    }

    #[test]
    fn test_stage_marker_needs_every_service() {
        let labeler = EnvLabeler::new(&[
            deployed("ADMIN_DEV", "a", "FAILED"),
            deployed("API_DEV", "a", "IN_PROGRESS"),
        ]);
        assert_eq!(
            labeler.label(&names(&["ADMIN_DEV", "API_DEV"])).0,
            "all DEV"
        );
    }

    /// main: c1 - c2 - merge(c2, side) - c4; a feature branch off c2.
    fn repository() -> (tempfile::TempDir, Vec<Oid>) {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        let c1 = fixtures::commit(&repo, &[], "Initial commit");
        let c2 = fixtures::commit(&repo, &[c1], "Add login form");
        let side = fixtures::commit(&repo, &[c2], "Fix typo");
        let merge = fixtures::commit(
            &repo,
            &[c2, side],
            "Merge pull request #12 from acme/bugfix/typo",
        );
        let c4 = fixtures::commit(&repo, &[merge], "Bump version");
        let feature = fixtures::commit(&repo, &[c2], "Try new layout");
        fixtures::remote_branch(&repo, "main", c4);
        fixtures::remote_branch(&repo, "feature/PROJ-9-layout", feature);
        (dir, vec![c1, c2, side, merge, c4, feature])
    }

    fn sample(ids: &[Oid]) -> Vec<DeployedRevision> {
        vec![
            deployed("API_DEV", &ids[4].to_string(), "SUCCESS"),
            deployed("API_QA", &ids[1].to_string()[..8], "SUCCESS"),
            deployed("ADMIN_QA", &ids[1].to_string(), "SUCCESS"),
            deployed("ADMIN_DEV", &ids[5].to_string(), "FAILED"),
            deployed("API_UAT", "0123456789abcdef", "SUCCESS"),
        ]
    }

    #[test]
    fn test_build_timeline() {
        let (dir, ids) = repository();
        let git = GitContext::open_at(dir.path()).unwrap();

        let timeline = Timeline::build(&git, &sample(&ids)).unwrap();

        let shas: Vec<&str> = timeline.commits.iter().map(|c| c.sha.as_str()).collect();
        assert_eq!(shas.len(), 3);
        assert!(ids[1].to_string().starts_with(shas[0]));
        assert!(ids[3].to_string().starts_with(shas[1]));
        assert!(ids[4].to_string().starts_with(shas[2]));

        assert_eq!(timeline.commits[0].environments, names(&["API_QA", "ADMIN_QA"]));
        assert!(timeline.commits[1].environments.is_empty());
        assert_eq!(timeline.commits[2].environments, names(&["API_DEV"]));

        assert_eq!(timeline.branches.len(), 1);
        assert_eq!(timeline.branches[0].branch, "PROJ-9-layout");
        assert_eq!(timeline.branches[0].environments, names(&["ADMIN_DEV"]));
    }

    #[test]
    fn test_render_timeline() {
        let (dir, ids) = repository();
        let git = GitContext::open_at(dir.path()).unwrap();
        let deployed = sample(&ids);
        let timeline = Timeline::build(&git, &deployed).unwrap();

        let lines = timeline.render(&EnvLabeler::new(&deployed), false);

        assert!(lines[0].ends_with("<- all QA"));
        assert!(lines[0].contains(" Ada "));
        assert!(lines[1].contains("#12 typo"));
        assert!(!lines[1].contains("<-"));
        assert!(lines[2].ends_with("Bump version"));
        assert_eq!(lines[3], "          DEV(API)");
        assert_eq!(lines[4], "");
        assert_eq!(lines[5], "On feature branches:");
        assert!(lines[6].trim_end().ends_with("PROJ-9-layout"));
        assert_eq!(lines[7], "            DEV(ADMIN❌)");
        assert_eq!(lines.len(), 8);
    }

    #[test]
    fn test_timeline_needs_deployment_on_main() {
        let (dir, ids) = repository();
        let git = GitContext::open_at(dir.path()).unwrap();

        let err = Timeline::build(&git, &[deployed("API_DEV", &ids[5].to_string(), "SUCCESS")])
            .unwrap_err();
        assert_eq!(err.to_string(), "No deployments found on main branch");
    }

    #[tokio::test]
    async fn test_deployed_revisions_from_dashboard() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/rest/api/latest/deploy/dashboard")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(
                r#"[{"deploymentProject": {"id": 5, "name": "API", "planKey": {"key": "PROJ-API"}},
                     "environmentStatuses": [
                        {"environment": {"id": 1, "name": "API_DEV"},
                         "deploymentResult": {"deploymentState": "SUCCESS",
                            "deploymentVersion": {"id": 30, "name": "master-30",
                                "items": [{"planResultKey": {"key": "PROJ-API-30"}}]}}},
                        {"environment": {"id": 2, "name": "API_QA"}}
                     ]},
                    {"deploymentProject": {"id": 6, "name": "Other", "planKey": {"key": "OTHER-WEB"}},
                     "environmentStatuses": []}]"#,
            )
            .create_async()
            .await;
        server
            .mock("GET", "/rest/api/latest/result/PROJ-API-30")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"key":"PROJ-API-30","vcsRevisionKey":"3f2a9c1d0b8e"}"#)
            .create_async()
            .await;

        let client = BambooClient::new(&server.url()).unwrap();
        let deployed = deployed_revisions(&client, "PROJ").await.unwrap();

        assert_eq!(deployed.len(), 1);
        assert_eq!(deployed[0].environment, "API_DEV");
        assert_eq!(deployed[0].sha, "3f2a9c1d0b8e");
        assert_eq!(deployed[0].state.as_deref(), Some("SUCCESS"));
    }
}
