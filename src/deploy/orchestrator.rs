//
//  pampu
//  deploy/orchestrator.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Deployment fan-out.
//!
//! ## Sequential
//!
//! Targets run strictly in input order. The next target is not triggered
//! before the previous deployment reached a finished lifecycle state. With
//! `abort_on_failure` the targets after a failed one are skipped.
//!
//! ## Parallel
//!
//! One task per target that needs a request, all joined before returning.
//! Each task writes only its own slot, so outcomes keep the input order.
//!
//! ## Cancellation
//!
//! [`CancelToken::cancel`] stops further triggers and polling. Deployments
//! Bamboo already queued keep running on the server.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Notify;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::{
    DeployApi, DeployError, DeployJobHandle, DeployJobStatus, DeployMode, DeployOutcome,
    DeployStatus, DeployTarget, FailureReason, VersionRef,
};

/// Polling and failure behaviour of a deploy batch.
#[derive(Debug, Clone)]
pub struct OrchestratorOptions {
    /// Time between deployment status requests
    pub poll_interval: Duration,

    /// Longest time to wait for one deployment to finish
    pub max_wait: Duration,

    /// Skip the remaining sequential targets after a failed deployment
    pub abort_on_failure: bool,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            max_wait: Duration::from_secs(3600),
            abort_on_failure: false,
        }
    }
}

/// Shared cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Sleeps for `duration`, waking early on cancellation.
    async fn sleep(&self, duration: Duration) {
        let notified = self.notify.notified();
        if self.is_cancelled() {
            return;
        }
        tokio::select! {
            _ = tokio::time::sleep(duration) => {}
            _ = notified => {}
        }
    }
}

pub struct DeployOrchestrator<A: DeployApi + 'static> {
    api: Arc<A>,
    options: OrchestratorOptions,
    cancel: CancelToken,
}

impl<A: DeployApi + 'static> DeployOrchestrator<A> {
    pub fn new(api: A, options: OrchestratorOptions) -> Self {
        Self::from_shared(Arc::new(api), options)
    }

    pub fn from_shared(api: Arc<A>, options: OrchestratorOptions) -> Self {
        Self {
            api,
            options,
            cancel: CancelToken::new(),
        }
    }

    /// Returns the token that cancels this orchestrator's batches.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Deploys `version` to every target.
    ///
    /// # Parameters
    ///
    /// * `version` - The version to deploy; its name must not be empty
    /// * `targets` - Environments in the order given by the user
    /// * `mode` - Sequential or parallel fan-out
    ///
    /// # Returns
    ///
    /// One outcome per target, in input order. Only an empty target list or
    /// version name is an error.
    pub async fn deploy(
        &self,
        version: &VersionRef,
        targets: &[DeployTarget],
        mode: DeployMode,
    ) -> Result<Vec<DeployOutcome>, DeployError> {
        if targets.is_empty() {
            return Err(DeployError::EmptyTargets);
        }
        if version.name.trim().is_empty() {
            return Err(DeployError::EmptyVersion);
        }

        info!(
            version = %version.name,
            targets = targets.len(),
            mode = %mode,
            "Starting deployment"
        );

        let outcomes = match mode {
            DeployMode::Sequential => self.deploy_sequential(version.id, targets).await,
            DeployMode::Parallel => self.deploy_parallel(version.id, targets).await,
        };
        Ok(outcomes)
    }

    async fn deploy_sequential(&self, version_id: u64, targets: &[DeployTarget]) -> Vec<DeployOutcome> {
        let mut outcomes = Vec::with_capacity(targets.len());
        let mut aborted = false;

        for target in targets {
            if let Some(outcome) = preflight(target) {
                outcomes.push(outcome);
                continue;
            }
            if aborted {
                outcomes.push(immediate(target, FailureReason::Skipped));
                continue;
            }

            let outcome = run_target(
                self.api.as_ref(),
                version_id,
                target.clone(),
                &self.options,
                &self.cancel,
            )
            .await;

            if !outcome.is_success() && self.options.abort_on_failure {
                warn!(environment = %target.name, "Deployment failed, skipping remaining environments");
                aborted = true;
            }
            outcomes.push(outcome);
        }

        outcomes
    }

    async fn deploy_parallel(&self, version_id: u64, targets: &[DeployTarget]) -> Vec<DeployOutcome> {
        let mut slots: Vec<Option<DeployOutcome>> = vec![None; targets.len()];
        let mut tasks = JoinSet::new();

        for (index, target) in targets.iter().enumerate() {
            if let Some(outcome) = preflight(target) {
                slots[index] = Some(outcome);
                continue;
            }

            let api = Arc::clone(&self.api);
            let options = self.options.clone();
            let cancel = self.cancel.clone();
            let target = target.clone();
            tasks.spawn(async move {
                let outcome = run_target(api.as_ref(), version_id, target, &options, &cancel).await;
                (index, outcome)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => slots[index] = Some(outcome),
                Err(e) => warn!("Deployment task failed: {}", e),
            }
        }

        slots
            .into_iter()
            .zip(targets)
            .map(|(slot, target)| {
                slot.unwrap_or_else(|| {
                    immediate(target, FailureReason::Api("deployment task aborted".to_string()))
                })
            })
            .collect()
    }
}

/// Outcome for targets that must not reach the API.
fn preflight(target: &DeployTarget) -> Option<DeployOutcome> {
    if target.is_refused() {
        warn!(environment = %target.name, "Refusing to deploy to production environment");
        return Some(immediate(target, FailureReason::Refused));
    }
    if target.environment_id.is_none() {
        return Some(immediate(target, FailureReason::UnknownEnvironment));
    }
    None
}

fn immediate(target: &DeployTarget, reason: FailureReason) -> DeployOutcome {
    let now = Utc::now();
    DeployOutcome {
        target: target.clone(),
        status: DeployStatus::Failed(reason),
        started_at: now,
        finished_at: now,
        result_id: None,
    }
}

/// Triggers one deployment and waits for it to finish.
async fn run_target<A: DeployApi + ?Sized>(
    api: &A,
    version_id: u64,
    target: DeployTarget,
    options: &OrchestratorOptions,
    cancel: &CancelToken,
) -> DeployOutcome {
    let started_at = Utc::now();
    let (status, result_id) = match target.environment_id {
        Some(environment_id) => {
            trigger_and_wait(api, version_id, environment_id, &target, options, cancel).await
        }
        None => (DeployStatus::Failed(FailureReason::UnknownEnvironment), None),
    };

    match &status {
        DeployStatus::Succeeded => info!(environment = %target.name, "Deployment succeeded"),
        DeployStatus::Failed(reason) => warn!(environment = %target.name, %reason, "Deployment failed"),
    }

    DeployOutcome {
        target,
        status,
        started_at,
        finished_at: Utc::now(),
        result_id,
    }
}

async fn trigger_and_wait<A: DeployApi + ?Sized>(
    api: &A,
    version_id: u64,
    environment_id: u64,
    target: &DeployTarget,
    options: &OrchestratorOptions,
    cancel: &CancelToken,
) -> (DeployStatus, Option<u64>) {
    if cancel.is_cancelled() {
        return (DeployStatus::Failed(FailureReason::Cancelled), None);
    }

    let handle = match api.trigger_deploy(version_id, environment_id).await {
        Ok(handle) => handle,
        Err(e) => return (DeployStatus::Failed(FailureReason::Api(e.to_string())), None),
    };
    info!(environment = %target.name, result_id = handle.result_id, "Deployment queued");

    let status = wait_for(api, handle, options, cancel).await;
    (status, Some(handle.result_id))
}

async fn wait_for<A: DeployApi + ?Sized>(
    api: &A,
    handle: DeployJobHandle,
    options: &OrchestratorOptions,
    cancel: &CancelToken,
) -> DeployStatus {
    let deadline = Instant::now() + options.max_wait;

    loop {
        cancel.sleep(options.poll_interval).await;
        if cancel.is_cancelled() {
            return DeployStatus::Failed(FailureReason::Cancelled);
        }

        match api.deploy_job_status(handle).await {
            Ok(DeployJobStatus::Finished { succeeded: true, .. }) => return DeployStatus::Succeeded,
            Ok(DeployJobStatus::Finished { state, .. }) => {
                return DeployStatus::Failed(FailureReason::DeploymentFailed { state })
            }
            Ok(DeployJobStatus::Pending) => {
                debug!(result_id = handle.result_id, "Deployment still running");
            }
            Err(e) => return DeployStatus::Failed(FailureReason::Api(e.to_string())),
        }

        if Instant::now() >= deadline {
            return DeployStatus::Failed(FailureReason::TimedOut);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use async_trait::async_trait;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    /// Records every call; result ids are the environment id.
    #[derive(Default)]
    struct FakeApi {
        events: Mutex<Vec<String>>,
        delays: HashMap<u64, Duration>,
        reject: HashSet<u64>,
        fail: HashSet<u64>,
        never_finish: HashSet<u64>,
    }

    impl FakeApi {
        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }

        fn record(&self, event: String) {
            self.events.lock().unwrap().push(event);
        }
    }

    #[async_trait]
    impl DeployApi for FakeApi {
        async fn trigger_deploy(
            &self,
            _version_id: u64,
            environment_id: u64,
        ) -> Result<DeployJobHandle, ApiError> {
            self.record(format!("trigger:{}", environment_id));
            if self.reject.contains(&environment_id) {
                return Err(ApiError::Status {
                    status: 400,
                    message: "Environment is disabled".to_string(),
                    body: String::new(),
                });
            }
            Ok(DeployJobHandle {
                result_id: environment_id,
            })
        }

        async fn deploy_job_status(&self, handle: DeployJobHandle) -> Result<DeployJobStatus, ApiError> {
            let env = handle.result_id;
            if self.never_finish.contains(&env) {
                return Ok(DeployJobStatus::Pending);
            }
            if let Some(delay) = self.delays.get(&env) {
                tokio::time::sleep(*delay).await;
            }
            self.record(format!("finish:{}", env));
            let succeeded = !self.fail.contains(&env);
            Ok(DeployJobStatus::Finished {
                succeeded,
                state: if succeeded { "SUCCESS" } else { "FAILED" }.to_string(),
            })
        }
    }

    fn fast_options() -> OrchestratorOptions {
        OrchestratorOptions {
            poll_interval: Duration::from_millis(1),
            max_wait: Duration::from_secs(5),
            abort_on_failure: false,
        }
    }

    fn targets(names: &[(&str, u64)]) -> Vec<DeployTarget> {
        names
            .iter()
            .map(|(name, id)| DeployTarget::new(*name, Some(*id)))
            .collect()
    }

    fn version() -> VersionRef {
        VersionRef::new(42, "v1")
    }

    #[tokio::test]
    async fn test_production_target_refused_without_call() {
        for mode in [DeployMode::Sequential, DeployMode::Parallel] {
            let orchestrator = DeployOrchestrator::new(FakeApi::default(), fast_options());
            let targets = targets(&[("DEV", 1), ("STAGING-PROD", 2), ("QA", 3)]);

            let outcomes = orchestrator.deploy(&version(), &targets, mode).await.unwrap();

            assert_eq!(outcomes.len(), 3);
            assert!(outcomes[0].is_success());
            assert_eq!(outcomes[1].failure(), Some(&FailureReason::Refused));
            assert!(outcomes[2].is_success());

            let events = orchestrator.api.events();
            assert!(events.iter().all(|e| !e.ends_with(":2")), "{:?}", events);
            assert!(events.contains(&"trigger:1".to_string()));
            assert!(events.contains(&"trigger:3".to_string()));
        }
    }

    #[tokio::test]
    async fn test_sequential_waits_for_previous_target() {
        let api = FakeApi {
            delays: HashMap::from([(1, Duration::from_millis(30))]),
            ..Default::default()
        };
        let orchestrator = DeployOrchestrator::new(api, fast_options());
        let targets = targets(&[("A", 1), ("B", 2)]);

        orchestrator
            .deploy(&version(), &targets, DeployMode::Sequential)
            .await
            .unwrap();

        assert_eq!(
            orchestrator.api.events(),
            vec!["trigger:1", "finish:1", "trigger:2", "finish:2"]
        );
    }

    #[tokio::test]
    async fn test_parallel_keeps_input_order() {
        let api = FakeApi {
            delays: HashMap::from([
                (1, Duration::from_millis(80)),
                (2, Duration::from_millis(5)),
            ]),
            ..Default::default()
        };
        let orchestrator = DeployOrchestrator::new(api, fast_options());
        let targets = targets(&[("A", 1), ("B", 2)]);

        let outcomes = orchestrator
            .deploy(&version(), &targets, DeployMode::Parallel)
            .await
            .unwrap();

        let names: Vec<_> = outcomes.iter().map(|o| o.target.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);

        let events = orchestrator.api.events();
        let finish_a = events.iter().position(|e| e == "finish:1").unwrap();
        let finish_b = events.iter().position(|e| e == "finish:2").unwrap();
        assert!(finish_b < finish_a, "{:?}", events);
    }

    #[tokio::test]
    async fn test_failures_stay_per_target() {
        let api = FakeApi {
            reject: HashSet::from([1]),
            fail: HashSet::from([2]),
            ..Default::default()
        };
        let orchestrator = DeployOrchestrator::new(api, fast_options());
        let targets = targets(&[("DEV", 1), ("QA", 2), ("UAT", 3)]);

        let outcomes = orchestrator
            .deploy(&version(), &targets, DeployMode::Sequential)
            .await
            .unwrap();

        assert!(matches!(outcomes[0].failure(), Some(FailureReason::Api(m)) if m.contains("disabled")));
        assert_eq!(
            outcomes[1].failure(),
            Some(&FailureReason::DeploymentFailed {
                state: "FAILED".to_string()
            })
        );
        assert_eq!(outcomes[1].result_id, Some(2));
        assert!(outcomes[2].is_success());
    }

    #[tokio::test]
    async fn test_abort_on_failure_skips_remaining() {
        let api = FakeApi {
            fail: HashSet::from([1]),
            ..Default::default()
        };
        let options = OrchestratorOptions {
            abort_on_failure: true,
            ..fast_options()
        };
        let orchestrator = DeployOrchestrator::new(api, options);
        let targets = targets(&[("DEV", 1), ("QA", 2), ("UAT", 3)]);

        let outcomes = orchestrator
            .deploy(&version(), &targets, DeployMode::Sequential)
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[1].failure(), Some(&FailureReason::Skipped));
        assert_eq!(outcomes[2].failure(), Some(&FailureReason::Skipped));
        assert_eq!(orchestrator.api.events(), vec!["trigger:1", "finish:1"]);
    }

    #[tokio::test]
    async fn test_unknown_environment_not_attempted() {
        let orchestrator = DeployOrchestrator::new(FakeApi::default(), fast_options());
        let targets = vec![DeployTarget::new("NOPE", None), DeployTarget::new("DEV", Some(1))];

        let outcomes = orchestrator
            .deploy(&version(), &targets, DeployMode::Parallel)
            .await
            .unwrap();

        assert_eq!(outcomes[0].failure(), Some(&FailureReason::UnknownEnvironment));
        assert!(outcomes[1].is_success());
        assert_eq!(orchestrator.api.events(), vec!["trigger:1", "finish:1"]);
    }

    #[tokio::test]
    async fn test_times_out() {
        let api = FakeApi {
            never_finish: HashSet::from([1]),
            ..Default::default()
        };
        let options = OrchestratorOptions {
            poll_interval: Duration::from_millis(2),
            max_wait: Duration::from_millis(20),
            abort_on_failure: false,
        };
        let orchestrator = DeployOrchestrator::new(api, options);

        let outcomes = orchestrator
            .deploy(&version(), &targets(&[("DEV", 1)]), DeployMode::Sequential)
            .await
            .unwrap();

        assert_eq!(outcomes[0].failure(), Some(&FailureReason::TimedOut));
        assert_eq!(outcomes[0].result_id, Some(1));
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let orchestrator = DeployOrchestrator::new(FakeApi::default(), fast_options());
        orchestrator.cancel_token().cancel();
        let targets = targets(&[("DEV", 1), ("PROD", 2)]);

        let outcomes = orchestrator
            .deploy(&version(), &targets, DeployMode::Parallel)
            .await
            .unwrap();

        assert_eq!(outcomes[0].failure(), Some(&FailureReason::Cancelled));
        assert_eq!(outcomes[1].failure(), Some(&FailureReason::Refused));
        assert!(orchestrator.api.events().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_interrupts_polling() {
        let api = FakeApi {
            never_finish: HashSet::from([1]),
            ..Default::default()
        };
        let options = OrchestratorOptions {
            poll_interval: Duration::from_secs(60),
            ..fast_options()
        };
        let orchestrator = DeployOrchestrator::new(api, options);
        let token = orchestrator.cancel_token();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            token.cancel();
        });

        let outcomes = tokio::time::timeout(
            Duration::from_secs(5),
            orchestrator.deploy(&version(), &targets(&[("DEV", 1)]), DeployMode::Sequential),
        )
        .await
        .unwrap()
        .unwrap();

        assert_eq!(outcomes[0].failure(), Some(&FailureReason::Cancelled));
    }

    #[tokio::test]
    async fn test_output_length_matches_input() {
        let orchestrator = DeployOrchestrator::new(FakeApi::default(), fast_options());
        for count in 1..=5u64 {
            let targets: Vec<_> = (1..=count)
                .map(|i| DeployTarget::new(format!("ENV{}", i), Some(i)))
                .collect();
            for mode in [DeployMode::Sequential, DeployMode::Parallel] {
                let outcomes = orchestrator.deploy(&version(), &targets, mode).await.unwrap();
                assert_eq!(outcomes.len(), targets.len());
            }
        }
    }

    #[tokio::test]
    async fn test_contract_errors() {
        let orchestrator = DeployOrchestrator::new(FakeApi::default(), fast_options());
        assert_eq!(
            orchestrator
                .deploy(&version(), &[], DeployMode::Sequential)
                .await
                .unwrap_err(),
            DeployError::EmptyTargets
        );
        assert_eq!(
            orchestrator
                .deploy(&VersionRef::new(1, " "), &targets(&[("DEV", 1)]), DeployMode::Sequential)
                .await
                .unwrap_err(),
            DeployError::EmptyVersion
        );
    }
}
