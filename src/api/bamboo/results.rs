//
//  pampu
//  api/bamboo/results.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Build results, job results and build logs.
//!
//! # Result Lifecycle
//!
//! ```text
//! Queued -> Pending -> InProgress -> Finished (Successful / Failed)
//!                                \-> NotBuilt
//! ```
//!
//! `lifeCycleState` tracks progress, `buildState` the verdict. A build is
//! made of stages, each stage of jobs; logs are stored per job.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::api::common::{ApiError, ListPage};
use crate::api::BambooClient;

/// One build or job result.
///
/// The same document shape is returned for listings, build details and job
/// details, with different subsets filled in, so every field besides `key`
/// is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildResult {
    /// Result key, e.g. `PROJ-PLAN-42`
    pub key: String,

    /// Result key as reported in details (identical to `key` for builds,
    /// the job result key for jobs)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_result_key: Option<String>,

    /// Short state in listings (`Successful`, `Failed`, `Unknown`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    /// Verdict in details
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_state: Option<String>,

    /// Progress state (`Queued`, `InProgress`, `Finished`, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub life_cycle_state: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_number: Option<u64>,

    /// Human duration, e.g. `3 minutes`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_duration_description: Option<String>,

    /// Human age, e.g. `2 hours ago`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_relative_time: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_completed_time: Option<String>,

    /// Trigger description; Bamboo embeds HTML links here
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason_summary: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub successful_test_count: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_test_count: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skipped_test_count: Option<u64>,

    /// Commit the build ran against
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vcs_revision_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_name: Option<String>,

    /// Present when requested with `expand=stages.stage.results.result`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stages: Option<ListPage<Stage>>,

    /// Present when requested with `expand=logEntries`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_entries: Option<ListPage<LogEntry>>,
}

/// A stage of a build and its job results.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Stage {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub results: Option<ListPage<BuildResult>>,
}

/// One line of a job log.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    #[serde(default)]
    pub log: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatted_date: Option<String>,
}

/// Where a job log was obtained from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogSource {
    /// `result/{job}?expand=logEntries`
    Api,
    /// `download/{job}/build_logs/{job}.log`
    Download,
}

/// The log of one job of a build.
#[derive(Debug, Clone, Serialize)]
pub struct JobLog {
    /// Job result key, e.g. `PROJ-PLAN-JOB1-42`
    pub job_key: String,

    /// Log text, `None` if neither source had it
    pub text: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<LogSource>,
}

/// A build whose verdict is `Failed`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Build {key} failed")]
pub struct BuildFailed {
    pub key: String,
}

#[derive(Debug, Deserialize)]
struct ResultsResponse {
    #[serde(default)]
    results: ListPage<BuildResult>,
}

impl BuildResult {
    /// Returns the verdict, preferring the detailed `buildState`.
    pub fn verdict(&self) -> &str {
        self.build_state
            .as_deref()
            .or(self.state.as_deref())
            .unwrap_or("Unknown")
    }

    /// Returns `true` if Bamboo reports the build as failed.
    pub fn is_failed(&self) -> bool {
        self.verdict() == "Failed"
    }

    /// Turns a failed verdict into an error.
    pub fn ensure_passed(&self) -> Result<(), BuildFailed> {
        if self.is_failed() {
            return Err(BuildFailed {
                key: self.display_key().to_string(),
            });
        }
        Ok(())
    }

    /// Returns the result key shown to users.
    pub fn display_key(&self) -> &str {
        self.build_result_key.as_deref().unwrap_or(&self.key)
    }

    /// Returns `true` if any test counter is non-zero.
    pub fn has_tests(&self) -> bool {
        self.successful_test_count.unwrap_or(0) > 0
            || self.failed_test_count.unwrap_or(0) > 0
            || self.skipped_test_count.unwrap_or(0) > 0
    }

    /// Collects job result keys from expanded stages, in stage order.
    pub fn job_keys(&self) -> Vec<String> {
        self.stages
            .iter()
            .flat_map(|stages| stages.items.iter())
            .filter_map(|stage| stage.results.as_ref())
            .flat_map(|results| results.items.iter())
            .filter_map(|job| job.build_result_key.clone())
            .collect()
    }
}

impl BambooClient {
    /// Lists recent results of a plan or plan branch, newest first.
    ///
    /// Requests `GET result/{key}?max-results={count}`.
    pub async fn list_builds(&self, key: &str, count: u32) -> Result<Vec<BuildResult>, ApiError> {
        let response: ResultsResponse = self
            .get(
                &format!("result/{}", key),
                &[("max-results", count.to_string())],
            )
            .await?;
        Ok(response.results.into_items())
    }

    /// Returns the most recent result of a plan or branch, if any.
    pub async fn latest_build(&self, key: &str) -> Result<Option<BuildResult>, ApiError> {
        Ok(self.list_builds(key, 1).await?.into_iter().next())
    }

    /// Fetches the details of one build.
    ///
    /// Requests `GET result/{buildKey}`.
    pub async fn build_status(&self, build_key: &str) -> Result<BuildResult, ApiError> {
        self.get(&format!("result/{}", build_key), &[]).await
    }

    /// Returns the commit a build was made from, if Bamboo recorded one.
    pub async fn vcs_revision(&self, build_key: &str) -> Result<Option<String>, ApiError> {
        let result = self.build_status(build_key).await?;
        Ok(result.vcs_revision_key.filter(|sha| !sha.is_empty()))
    }

    /// Returns the job result keys of a build.
    ///
    /// Falls back to the build key itself when Bamboo lists no jobs, which is
    /// how single-job results and job keys passed directly behave.
    pub async fn build_job_keys(&self, build_key: &str) -> Result<Vec<String>, ApiError> {
        let result: BuildResult = self
            .get(
                &format!("result/{}", build_key),
                &[("expand", "stages.stage.results.result".to_string())],
            )
            .await?;

        let keys = result.job_keys();
        if keys.is_empty() {
            Ok(vec![build_key.to_string()])
        } else {
            Ok(keys)
        }
    }

    /// Fetches a job log through the REST API.
    ///
    /// Returns `None` when Bamboo has no log entries for the job.
    pub async fn job_log_entries(&self, job_key: &str) -> Result<Option<String>, ApiError> {
        let result: BuildResult = self
            .get(
                &format!("result/{}", job_key),
                &[
                    ("expand", "logEntries".to_string()),
                    ("max-results", "99999".to_string()),
                ],
            )
            .await?;

        let entries = result.log_entries.map(ListPage::into_items).unwrap_or_default();
        if entries.is_empty() {
            return Ok(None);
        }

        let lines: Vec<String> = entries.into_iter().map(|e| e.log).collect();
        Ok(Some(lines.join("\n")))
    }

    /// Downloads a raw job log from the artifact store.
    pub async fn download_job_log(&self, job_key: &str) -> Result<Option<String>, ApiError> {
        self.get_text(&format!(
            "download/{}/build_logs/{}.log",
            job_key, job_key
        ))
        .await
    }

    /// Fetches the logs of every job of a build.
    ///
    /// Each job is tried through the REST API first, then through the raw
    /// download. Failures for a single job are logged and never abort the
    /// other jobs; a job neither source can serve is returned with
    /// `text: None`.
    pub async fn build_logs(&self, build_key: &str) -> Result<Vec<JobLog>, ApiError> {
        let job_keys = self.build_job_keys(build_key).await?;
        let mut logs = Vec::with_capacity(job_keys.len());

        for job_key in job_keys {
            match self.job_log_entries(&job_key).await {
                Ok(Some(text)) => {
                    logs.push(JobLog {
                        job_key,
                        text: Some(text),
                        source: Some(LogSource::Api),
                    });
                    continue;
                }
                Ok(None) => debug!(job = %job_key, "No log entries via API"),
                Err(e) => warn!(job = %job_key, "Failed to fetch log entries: {}", e),
            }

            let text = match self.download_job_log(&job_key).await {
                Ok(text) => text,
                Err(e) => {
                    warn!(job = %job_key, "Failed to download log: {}", e);
                    None
                }
            };
            let source = text.as_ref().map(|_| LogSource::Download);
            logs.push(JobLog {
                job_key,
                text,
                source,
            });
        }

        Ok(logs)
    }
}
