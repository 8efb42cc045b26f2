//
//  pampu
//  deploy/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Deployments
//!
//! Deploys one version to several environments and reports an outcome per
//! environment.
//!
//! ## Overview
//!
//! - [`DeployMode`]: one environment after another (`chain`) or all at once
//!   (`parallel`)
//! - [`DeployOrchestrator`]: runs the fan-out, polls each deployment until it
//!   finishes and collects [`DeployOutcome`]s in input order
//! - [`DeployApi`]: the two Bamboo calls the orchestrator needs, implemented
//!   by [`BambooClient`]
//!
//! ## Production Safety
//!
//! Environments whose name contains `PROD` (any case) are never deployed to.
//! They are reported as refused before any request is made for them, and the
//! rest of the batch continues.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use pampu::api::BambooClient;
//! use pampu::deploy::{DeployMode, DeployOrchestrator, DeployTarget, OrchestratorOptions, VersionRef};
//!
//! # async fn example(client: BambooClient) -> anyhow::Result<()> {
//! let orchestrator = DeployOrchestrator::new(client, OrchestratorOptions::default());
//! let targets = vec![DeployTarget::new("DEV", Some(11)), DeployTarget::new("QA", Some(12))];
//! let version = VersionRef::new(42, "master-17");
//! let outcomes = orchestrator.deploy(&version, &targets, DeployMode::Sequential).await?;
//! for outcome in &outcomes {
//!     println!("{}: {}", outcome.target.name, outcome.status);
//! }
//! # Ok(())
//! # }
//! ```

mod orchestrator;

pub use orchestrator::*;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

use crate::api::{ApiError, BambooClient};

/// How a version is fanned out to its environments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeployMode {
    /// One environment at a time, in the given order
    #[default]
    #[serde(rename = "chain", alias = "sequential")]
    Sequential,

    /// All environments concurrently
    #[serde(rename = "parallel")]
    Parallel,
}

impl fmt::Display for DeployMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeployMode::Sequential => write!(f, "chain"),
            DeployMode::Parallel => write!(f, "parallel"),
        }
    }
}

impl FromStr for DeployMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "chain" | "sequential" => Ok(DeployMode::Sequential),
            "parallel" => Ok(DeployMode::Parallel),
            other => Err(format!("unknown deploy mode '{}' (expected chain or parallel)", other)),
        }
    }
}

/// The version being deployed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionRef {
    pub id: u64,
    pub name: String,
}

impl VersionRef {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// One environment to deploy to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeployTarget {
    /// Environment name as given on the command line
    pub name: String,

    /// Bamboo environment id, `None` if no environment has this name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment_id: Option<u64>,
}

impl DeployTarget {
    pub fn new(name: impl Into<String>, environment_id: Option<u64>) -> Self {
        Self {
            name: name.into(),
            environment_id,
        }
    }

    /// Returns `true` if this target must never be deployed to.
    pub fn is_refused(&self) -> bool {
        is_production_environment(&self.name)
    }
}

/// Returns `true` for environment names containing `PROD`, in any case.
///
/// # Example
///
/// ```rust
/// use pampu::deploy::is_production_environment;
///
/// assert!(is_production_environment("PROD"));
/// assert!(is_production_environment("staging-prod"));
/// assert!(!is_production_environment("QA"));
/// ```
pub fn is_production_environment(name: &str) -> bool {
    name.to_ascii_uppercase().contains("PROD")
}

/// Why a target did not deploy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// Production environment, never attempted
    Refused,

    /// No environment with the target's name exists
    UnknownEnvironment,

    /// A Bamboo request for this target failed
    Api(String),

    /// Bamboo finished the deployment with a non-successful state
    DeploymentFailed { state: String },

    /// The deployment did not finish within the maximum wait
    TimedOut,

    /// Interrupted before the deployment finished
    Cancelled,

    /// Not attempted because an earlier target failed
    Skipped,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Refused => write!(f, "refused: production environment"),
            FailureReason::UnknownEnvironment => write!(f, "environment not found"),
            FailureReason::Api(message) => write!(f, "{}", message),
            FailureReason::DeploymentFailed { state } => write!(f, "deployment {}", state),
            FailureReason::TimedOut => write!(f, "timed out waiting for deployment"),
            FailureReason::Cancelled => write!(f, "cancelled"),
            FailureReason::Skipped => write!(f, "skipped after earlier failure"),
        }
    }
}

impl Serialize for FailureReason {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Result of one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum DeployStatus {
    Succeeded,
    Failed(FailureReason),
}

impl fmt::Display for DeployStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeployStatus::Succeeded => write!(f, "succeeded"),
            DeployStatus::Failed(reason) => write!(f, "failed ({})", reason),
        }
    }
}

/// What happened to one target. Created once the target is done.
#[derive(Debug, Clone, Serialize)]
pub struct DeployOutcome {
    pub target: DeployTarget,

    #[serde(flatten)]
    pub status: DeployStatus,

    pub started_at: DateTime<Utc>,

    pub finished_at: DateTime<Utc>,

    /// Bamboo deployment result id, if a deployment was queued
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_id: Option<u64>,
}

impl DeployOutcome {
    pub fn is_success(&self) -> bool {
        self.status == DeployStatus::Succeeded
    }

    pub fn failure(&self) -> Option<&FailureReason> {
        match &self.status {
            DeployStatus::Failed(reason) => Some(reason),
            DeployStatus::Succeeded => None,
        }
    }

    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

/// Contract errors of a deploy batch.
///
/// Per-target problems are never errors; they become [`DeployOutcome`]s.
/// [`DeployError::Failed`] and [`DeployError::Cancelled`] summarize a
/// finished batch for the exit code.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeployError {
    #[error("No deployment environments given")]
    EmptyTargets,

    #[error("Version name must not be empty")]
    EmptyVersion,

    #[error("{failed} of {total} deployments did not succeed")]
    Failed { failed: usize, total: usize },

    #[error("Deployment cancelled")]
    Cancelled,
}

/// Checks a finished batch.
///
/// # Returns
///
/// [`DeployError::Cancelled`] if any target was interrupted,
/// [`DeployError::Failed`] if any other target failed, `Ok` otherwise.
pub fn ensure_all_succeeded(outcomes: &[DeployOutcome]) -> Result<(), DeployError> {
    if outcomes
        .iter()
        .any(|o| o.failure() == Some(&FailureReason::Cancelled))
    {
        return Err(DeployError::Cancelled);
    }

    let failed = outcomes.iter().filter(|o| !o.is_success()).count();
    if failed > 0 {
        return Err(DeployError::Failed {
            failed,
            total: outcomes.len(),
        });
    }
    Ok(())
}

/// A queued deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeployJobHandle {
    pub result_id: u64,
}

/// Progress of a queued deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployJobStatus {
    Pending,
    Finished { succeeded: bool, state: String },
}

/// Bamboo calls used by the orchestrator.
#[async_trait]
pub trait DeployApi: Send + Sync {
    /// Queues a deployment of a version to an environment.
    async fn trigger_deploy(
        &self,
        version_id: u64,
        environment_id: u64,
    ) -> Result<DeployJobHandle, ApiError>;

    /// Reports whether a queued deployment has finished.
    async fn deploy_job_status(&self, handle: DeployJobHandle) -> Result<DeployJobStatus, ApiError>;
}

#[async_trait]
impl DeployApi for BambooClient {
    async fn trigger_deploy(
        &self,
        version_id: u64,
        environment_id: u64,
    ) -> Result<DeployJobHandle, ApiError> {
        let queued = self.queue_deployment(version_id, environment_id).await?;
        Ok(DeployJobHandle {
            result_id: queued.deployment_result_id,
        })
    }

    async fn deploy_job_status(&self, handle: DeployJobHandle) -> Result<DeployJobStatus, ApiError> {
        let result = self.deployment_result(handle.result_id).await?;
        if result.is_finished() {
            Ok(DeployJobStatus::Finished {
                succeeded: result.is_successful(),
                state: result.state().to_string(),
            })
        } else {
            Ok(DeployJobStatus::Pending)
        }
    }
}
