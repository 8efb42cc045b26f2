//
//  pampu
//  cli/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! CLI command definitions using clap derive macros

mod branches;
mod builds;
mod completion;
mod config;
mod deploy;
mod deploys;
mod init;
mod logs;
mod plans;
mod projects;
mod status;
mod timeline;
mod versions;

pub use branches::BranchesCommand;
pub use builds::BuildsCommand;
pub use completion::CompletionCommand;
pub use config::ConfigCommand;
pub use deploy::DeployCommand;
pub use deploys::DeploysCommand;
pub use init::InitCommand;
pub use logs::LogsCommand;
pub use plans::PlansCommand;
pub use projects::ProjectsCommand;
pub use status::StatusCommand;
pub use timeline::TimelineCommand;
pub use versions::{VersionCreateCommand, VersionsCommand};

use std::collections::HashMap;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, warn};

use crate::api::bamboo::BuildResult;
use crate::api::BambooClient;
use crate::auth::Credentials;
use crate::config::Config;
use crate::context::{is_main_branch, resolve_branch_key, GitContext, ResolvedBranch};
use crate::output::OutputFormat;

/// Pampu - Work with Atlassian Bamboo from the command line
#[derive(Parser, Debug)]
#[command(
    name = "pampu",
    version,
    about = "Work with Atlassian Bamboo from the command line",
    long_about = "pampu is a CLI for Atlassian Bamboo.\n\n\
                  It brings plans, builds, logs and deployments to your terminal, and \
                  finds the build of your current git branch on its own.",
    propagate_version = true,
    after_help = "Use 'pampu <command> --help' for more information about a command."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOptions,
}

/// Global options available to all commands
#[derive(Parser, Debug, Clone, Default)]
pub struct GlobalOptions {
    /// Output format as JSON
    #[arg(long, global = true, env = "PAMPU_JSON")]
    pub json: bool,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Save the Bamboo URL and personal access token
    Init(InitCommand),

    /// List projects
    Projects(ProjectsCommand),

    /// List the plans of a project
    Plans(PlansCommand),

    /// List the branches of a plan
    Branches(BranchesCommand),

    /// List recent builds of a plan or branch
    Builds(BuildsCommand),

    /// Show build details (defaults to the current git branch)
    Status(StatusCommand),

    /// Print the job logs of a build
    Logs(LogsCommand),

    /// Show what is deployed to each environment
    Deploys(DeploysCommand),

    /// Show git history with environment markers
    Timeline(TimelineCommand),

    /// List deployment versions
    Versions(VersionsCommand),

    /// Create a deployment version from a build
    #[command(name = "version-create")]
    VersionCreate(VersionCreateCommand),

    /// Deploy a version to one or more environments
    Deploy(DeployCommand),

    /// Manage CLI configuration
    Config(ConfigCommand),

    /// Generate shell completion scripts
    Completion(CompletionCommand),
}

/// Returns the output format for a command.
///
/// `--json` wins; otherwise `output.json` from the settings file decides.
pub(crate) fn get_format(global: &GlobalOptions) -> OutputFormat {
    let json = global.json || Config::load().map(|c| c.output.json).unwrap_or(false);
    if json {
        OutputFormat::Json
    } else {
        OutputFormat::Table
    }
}

/// Builds an authenticated client from the resolved credentials.
pub(crate) fn bamboo_client() -> Result<BambooClient> {
    let credentials = Credentials::resolve()?;
    BambooClient::from_credentials(&credentials).context("Failed to create Bamboo client")
}

/// Finds the latest build of the plan branch the checked-out git branch
/// builds on.
///
/// # Returns
///
/// The resolved plan or branch together with its newest build.
pub(crate) async fn current_branch_build(
    client: &BambooClient,
    plan_key: &str,
) -> Result<(ResolvedBranch, BuildResult)> {
    let git_branch = GitContext::open()?.current_branch()?;
    debug!(%git_branch, plan = %plan_key, "Resolving plan branch");

    let resolved = if is_main_branch(&git_branch) {
        resolve_branch_key(&git_branch, plan_key, &[])?
    } else {
        let candidates = client.branch_records(plan_key).await?;
        resolve_branch_key(&git_branch, plan_key, &candidates)?
    };

    let build = client
        .latest_build(&resolved.key)
        .await?
        .ok_or_else(|| anyhow!("No builds found for {}", resolved.key))?;
    Ok((resolved, build))
}

/// Commits of builds, fetched once per build key.
#[derive(Debug, Default)]
pub(crate) struct RevisionCache {
    revisions: HashMap<String, Option<String>>,
}

impl RevisionCache {
    /// Returns the commit `build_key` was built from.
    ///
    /// A failed lookup is logged and cached as unknown.
    pub(crate) async fn get(&mut self, client: &BambooClient, build_key: &str) -> Option<String> {
        if let Some(sha) = self.revisions.get(build_key) {
            return sha.clone();
        }
        let sha = match client.vcs_revision(build_key).await {
            Ok(sha) => sha,
            Err(e) => {
                warn!(build = %build_key, "Failed to fetch revision: {}", e);
                None
            }
        };
        self.revisions.insert(build_key.to_string(), sha.clone());
        sha
    }
}

/// Abbreviates a commit id to eight characters.
pub(crate) fn short_sha(sha: &str) -> &str {
    sha.get(..8).unwrap_or(sha)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_global_json_after_subcommand() {
        let cli = Cli::try_parse_from(["pampu", "projects", "--json"]).unwrap();
        assert!(cli.global.json);
        assert!(matches!(cli.command, Commands::Projects(_)));
    }

    #[test]
    fn test_short_sha() {
        assert_eq!(short_sha("3f2a9c1d0b8e7f6a"), "3f2a9c1d");
        assert_eq!(short_sha("3f2a"), "3f2a");
    }

    #[tokio::test]
    async fn test_revision_cache_fetches_once() {
        let mut server = mockito::Server::new_async().await;
        let found = server
            .mock("GET", "/rest/api/latest/result/PROJ-API-7")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(r#"{"key":"PROJ-API-7","vcsRevisionKey":"3f2a9c1d0b8e"}"#)
            .expect(1)
            .create_async()
            .await;
        let missing = server
            .mock("GET", "/rest/api/latest/result/PROJ-API-6")
            .match_query(mockito::Matcher::Any)
            .with_status(404)
            .with_body(r#"{"message":"Result PROJ-API-6 not found"}"#)
            .expect(1)
            .create_async()
            .await;

        let client = BambooClient::new(&server.url()).unwrap();
        let mut cache = RevisionCache::default();
        for _ in 0..2 {
            assert_eq!(
                cache.get(&client, "PROJ-API-7").await.as_deref(),
                Some("3f2a9c1d0b8e")
            );
            assert_eq!(cache.get(&client, "PROJ-API-6").await, None);
        }

        found.assert_async().await;
        missing.assert_async().await;
    }

    #[test]
    fn test_timeline_takes_optional_plan() {
        let cli = Cli::try_parse_from(["pampu", "timeline"]).unwrap();
        assert!(matches!(cli.command, Commands::Timeline(_)));
    }

    #[test]
    fn test_version_create_name() {
        let cli = Cli::try_parse_from(["pampu", "version-create", "PROJ-API-12"]).unwrap();
        assert!(matches!(cli.command, Commands::VersionCreate(_)));
    }
}
