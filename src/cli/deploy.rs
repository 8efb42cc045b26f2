//
//  pampu
//  cli/deploy.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! `pampu deploy <version> <env>...`
//!
//! Deploys a version to one or more environments of the plan's deployment
//! project and waits for every deployment to finish. Production environments
//! are always refused.
//!
//! ## Examples
//!
//! ```bash
//! # One environment after another
//! pampu deploy master-42 DEV QA
//!
//! # All environments at once
//! pampu deploy master-42 DEV QA UAT --parallel
//!
//! # Stop the chain at the first failure
//! pampu deploy master-42 DEV QA --chain --fail-fast
//! ```
//!
//! Exits with 17 when any environment did not deploy and with 16 when
//! interrupted with Ctrl-C.

use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::{ArgGroup, Args};
use tracing::debug;

use crate::api::bamboo::Environment;
use crate::config::Config;
use crate::context::PlanResolver;
use crate::deploy::{
    ensure_all_succeeded, DeployMode, DeployOrchestrator, DeployOutcome, DeployTarget,
    OrchestratorOptions, VersionRef,
};
use crate::output::{OutputWriter, TableBuilder};
use crate::util::format_duration;

use super::versions::deployment_project;
use super::{bamboo_client, get_format, GlobalOptions};

/// Deploy a version to one or more environments
#[derive(Args, Debug)]
#[command(group(ArgGroup::new("mode").args(["chain", "parallel"])))]
pub struct DeployCommand {
    /// Version name, e.g. master-42
    #[arg(value_name = "VERSION")]
    pub version_name: String,

    /// Environment names, deployed in the given order
    #[arg(required = true)]
    pub environments: Vec<String>,

    /// Deploy one environment after another
    #[arg(long)]
    pub chain: bool,

    /// Deploy to all environments at once
    #[arg(long)]
    pub parallel: bool,

    /// Plan whose deployment project holds the version
    #[arg(long, short = 'p')]
    pub plan: Option<String>,

    /// Skip the remaining environments after a failed chained deployment
    #[arg(long)]
    pub fail_fast: bool,

    /// Seconds between status checks
    #[arg(long, value_name = "SECS")]
    pub poll_interval: Option<u64>,

    /// Seconds to wait for each deployment
    #[arg(long, value_name = "SECS")]
    pub max_wait: Option<u64>,
}

impl DeployCommand {
    fn mode(&self, default: DeployMode) -> DeployMode {
        if self.parallel {
            DeployMode::Parallel
        } else if self.chain {
            DeployMode::Sequential
        } else {
            default
        }
    }

    fn options(&self, config: &Config) -> OrchestratorOptions {
        OrchestratorOptions {
            poll_interval: self
                .poll_interval
                .map(|secs| Duration::from_secs(secs.max(1)))
                .unwrap_or_else(|| config.deploy.poll_interval()),
            max_wait: self
                .max_wait
                .map(Duration::from_secs)
                .unwrap_or_else(|| config.deploy.max_wait()),
            abort_on_failure: self.fail_fast,
        }
    }

    pub async fn run(&self, global: &GlobalOptions) -> Result<()> {
        let config = Config::load()?;
        let mode = self.mode(config.deploy.default_mode);
        let plan_key = PlanResolver::discover().plan_key(self.plan.as_deref())?;
        let writer = OutputWriter::new(get_format(global));

        let client = bamboo_client()?;
        let project = deployment_project(&client, &plan_key).await?;
        let environments = client.deployment_project(project.id).await?.environments;

        let version = client
            .find_version(project.id, &self.version_name)
            .await?
            .ok_or_else(|| anyhow!("Version '{}' not found", self.version_name))?;

        let targets = resolve_targets(&self.environments, &environments);
        if targets.iter().any(|t| t.environment_id.is_none()) {
            let available: Vec<&str> = environments.iter().map(|e| e.name.as_str()).collect();
            writer.write_warning(&format!(
                "Unknown environment(s); available: {}",
                available.join(", ")
            ));
        }

        let orchestrator = DeployOrchestrator::new(client, self.options(&config));
        let cancel = orchestrator.cancel_token();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                debug!("Interrupted, cancelling deployments");
                cancel.cancel();
            }
        });

        writer.write_info(&format!(
            "Deploying {} to {} ({})",
            version.name,
            self.environments.join(", "),
            mode
        ));

        let version = VersionRef::new(version.id, version.name);
        let outcomes = orchestrator.deploy(&version, &targets, mode).await?;

        if writer.is_json() {
            writer.write_json(&outcomes)?;
        } else {
            print_summary(&outcomes, writer.color_enabled());
        }

        ensure_all_succeeded(&outcomes)?;
        writer.write_success(&format!(
            "Deployed {} to {} environment(s)",
            version.name,
            outcomes.len()
        ));
        Ok(())
    }
}

/// Pairs requested environment names with the project's environments.
///
/// Names must match exactly; unknown names keep no environment id and are
/// reported by the orchestrator.
fn resolve_targets(names: &[String], environments: &[Environment]) -> Vec<DeployTarget> {
    names
        .iter()
        .map(|name| {
            let id = environments.iter().find(|e| &e.name == name).map(|e| e.id);
            DeployTarget::new(name.clone(), id)
        })
        .collect()
}

fn print_summary(outcomes: &[DeployOutcome], color: bool) {
    let mut table = TableBuilder::new()
        .color(color)
        .headers(["Environment", "Result", "Duration", "Deployment"]);
    for outcome in outcomes {
        let duration = outcome.duration().to_std().unwrap_or_default();
        table = table.row([
            outcome.target.name.clone(),
            outcome.status.to_string(),
            format_duration(duration),
            outcome
                .result_id
                .map(|id| id.to_string())
                .unwrap_or_default(),
        ]);
    }
    table.print();
}
