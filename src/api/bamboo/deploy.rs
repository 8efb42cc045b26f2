//
//  pampu
//  api/bamboo/deploy.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Deployment projects, versions, environments and deployment results.
//!
//! # Overview
//!
//! A deployment project is linked to one build plan. Versions are created
//! from build results of that plan and deployed to the project's
//! environments. Each deployment produces a deployment result that moves
//! through its lifecycle:
//!
//! ```text
//! QUEUED -> PENDING -> IN_PROGRESS -> FINISHED (SUCCESS / FAILED / ...)
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use pampu::api::BambooClient;
//!
//! # async fn example(client: BambooClient) -> anyhow::Result<()> {
//! if let Some(project) = client.deployment_project_for_plan("PROJ-API").await? {
//!     for version in client.list_deploy_versions(project.id, 5).await? {
//!         println!("{}", version.name);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};

use crate::api::common::ApiError;
use crate::api::BambooClient;

/// Lifecycle state of a deployment result that will not change anymore.
pub const LIFECYCLE_FINISHED: &str = "FINISHED";

/// Deployment state of a successful deployment.
pub const DEPLOYMENT_SUCCESS: &str = "SUCCESS";

/// A `{"key": "..."}` reference.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeyRef {
    pub key: String,
}

/// A deployment project.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentProject {
    pub id: u64,

    pub name: String,

    /// The build plan this project deploys
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_key: Option<KeyRef>,

    /// Environments, in the order configured in Bamboo
    #[serde(default)]
    pub environments: Vec<Environment>,
}

/// A deployment environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Environment {
    pub id: u64,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A deployable version created from a build result.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentVersion {
    pub id: u64,

    pub name: String,

    /// Creation time in epoch milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator_display_name: Option<String>,

    /// Build results packaged in this version
    #[serde(default)]
    pub items: Vec<VersionItem>,
}

/// One packaged build result of a version.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_result_key: Option<KeyRef>,
}

impl DeploymentVersion {
    /// Returns the build result key the version was created from.
    pub fn build_key(&self) -> Option<&str> {
        self.items
            .first()
            .and_then(|item| item.plan_result_key.as_ref())
            .map(|k| k.key.as_str())
    }
}

#[derive(Debug, Deserialize)]
struct VersionsResponse {
    #[serde(default)]
    versions: Vec<DeploymentVersion>,
}

/// Request body for `POST deploy/project/{id}/version`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVersionRequest {
    /// Build result key, e.g. `PROJ-API12-7`
    pub plan_result_key: String,

    /// Version name, unique within the deployment project
    pub name: String,
}

/// Response of `POST queue/deployment`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedDeployment {
    pub deployment_result_id: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<serde_json::Value>,
}

/// A deployment result.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentResult {
    #[serde(default)]
    pub id: u64,

    /// Verdict (`SUCCESS`, `FAILED`, `UNKNOWN`, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment_state: Option<String>,

    /// Progress (`QUEUED`, `IN_PROGRESS`, `FINISHED`, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub life_cycle_state: Option<String>,

    /// Finish time in epoch milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_date: Option<i64>,

    /// Trigger description; may contain HTML
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason_summary: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment_version: Option<DeploymentVersion>,
}

impl DeploymentResult {
    /// Returns `true` once the lifecycle reached `FINISHED`.
    pub fn is_finished(&self) -> bool {
        self.life_cycle_state.as_deref() == Some(LIFECYCLE_FINISHED)
    }

    /// Returns `true` if the deployment finished with `SUCCESS`.
    pub fn is_successful(&self) -> bool {
        self.is_finished() && self.deployment_state.as_deref() == Some(DEPLOYMENT_SUCCESS)
    }

    /// Returns the deployment state, or `?` if Bamboo did not send one.
    pub fn state(&self) -> &str {
        self.deployment_state.as_deref().unwrap_or("?")
    }
}

/// One deployment project on the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardEntry {
    pub deployment_project: DeploymentProject,

    #[serde(default)]
    pub environment_statuses: Vec<EnvironmentStatus>,
}

/// Latest deployment of one environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentStatus {
    pub environment: Environment,

    /// `None` if nothing was ever deployed to the environment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment_result: Option<DeploymentResult>,
}

impl DashboardEntry {
    /// Returns the key of the plan the deployment project is linked to.
    pub fn plan_key(&self) -> &str {
        self.deployment_project
            .plan_key
            .as_ref()
            .map(|k| k.key.as_str())
            .unwrap_or("")
    }

    /// Returns `true` if this entry belongs to `key`.
    ///
    /// A plan key (`PROJ-API`) must match exactly; a project key (`PROJ`, no
    /// dash) matches every plan of that project.
    pub fn matches(&self, key: &str) -> bool {
        let plan_key = self.plan_key();
        if key.contains('-') {
            plan_key == key
        } else {
            plan_key.starts_with(&format!("{}-", key))
        }
    }
}

impl BambooClient {
    /// Lists the deployment projects linked to a plan.
    ///
    /// Requests `GET deploy/project/forPlan?planKey={key}`.
    pub async fn deployment_projects_for_plan(
        &self,
        plan_key: &str,
    ) -> Result<Vec<DeploymentProject>, ApiError> {
        self.get(
            "deploy/project/forPlan",
            &[("planKey", plan_key.to_string())],
        )
        .await
    }

    /// Returns the first deployment project linked to a plan.
    pub async fn deployment_project_for_plan(
        &self,
        plan_key: &str,
    ) -> Result<Option<DeploymentProject>, ApiError> {
        Ok(self
            .deployment_projects_for_plan(plan_key)
            .await?
            .into_iter()
            .next())
    }

    /// Fetches a deployment project including its environments.
    pub async fn deployment_project(&self, project_id: u64) -> Result<DeploymentProject, ApiError> {
        self.get(&format!("deploy/project/{}", project_id), &[])
            .await
    }

    /// Lists versions of a deployment project, newest first.
    ///
    /// Requests `GET deploy/project/{id}/versions?max-result={count}`.
    pub async fn list_deploy_versions(
        &self,
        project_id: u64,
        count: u32,
    ) -> Result<Vec<DeploymentVersion>, ApiError> {
        let response: VersionsResponse = self
            .get(
                &format!("deploy/project/{}/versions", project_id),
                &[("max-result", count.to_string())],
            )
            .await?;
        Ok(response.versions)
    }

    /// Looks a version up by exact name among the 100 newest versions.
    pub async fn find_version(
        &self,
        project_id: u64,
        name: &str,
    ) -> Result<Option<DeploymentVersion>, ApiError> {
        let versions = self.list_deploy_versions(project_id, 100).await?;
        Ok(versions.into_iter().find(|v| v.name == name))
    }

    /// Creates a version from a build result.
    pub async fn create_version(
        &self,
        project_id: u64,
        build_key: &str,
        name: &str,
    ) -> Result<DeploymentVersion, ApiError> {
        let body = CreateVersionRequest {
            plan_result_key: build_key.to_string(),
            name: name.to_string(),
        };
        self.post(&format!("deploy/project/{}/version", project_id), &body)
            .await
    }

    /// Queues a deployment of a version to an environment.
    ///
    /// Requests `POST queue/deployment?environmentId={env}&versionId={version}`.
    pub async fn queue_deployment(
        &self,
        version_id: u64,
        environment_id: u64,
    ) -> Result<QueuedDeployment, ApiError> {
        self.post_query(
            "queue/deployment",
            &[
                ("environmentId", environment_id.to_string()),
                ("versionId", version_id.to_string()),
            ],
        )
        .await
    }

    /// Fetches a deployment result.
    pub async fn deployment_result(&self, result_id: u64) -> Result<DeploymentResult, ApiError> {
        self.get(&format!("deploy/result/{}", result_id), &[])
            .await
    }

    /// Fetches the deployment dashboard: every deployment project with the
    /// latest result per environment.
    pub async fn deployment_dashboard(&self) -> Result<Vec<DashboardEntry>, ApiError> {
        self.get("deploy/dashboard", &[]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    const DASHBOARD: &str = r#"[
        {
            "deploymentProject": {"id": 11, "name": "API", "planKey": {"key": "PROJ-API"}},
            "environmentStatuses": [
                {
                    "environment": {"id": 101, "name": "DEV"},
                    "deploymentResult": {
                        "id": 9001,
                        "deploymentState": "SUCCESS",
                        "lifeCycleState": "FINISHED",
                        "finishedDate": 1700000000000,
                        "deploymentVersion": {
                            "id": 55, "name": "master-42", "creatorDisplayName": "Jane",
                            "items": [{"planResultKey": {"key": "PROJ-API-42"}}]
                        }
                    }
                },
                {"environment": {"id": 102, "name": "PROD"}}
            ]
        },
        {
            "deploymentProject": {"id": 12, "name": "Web", "planKey": {"key": "PROJ-WEB"}},
            "environmentStatuses": []
        },
        {
            "deploymentProject": {"id": 13, "name": "Ops", "planKey": {"key": "OPS-TOOLS"}},
            "environmentStatuses": []
        }
    ]"#;

    #[test]
    fn test_dashboard_matches_plan_and_project() {
        let entries: Vec<DashboardEntry> = serde_json::from_str(DASHBOARD).unwrap();

        let by_plan: Vec<_> = entries.iter().filter(|e| e.matches("PROJ-API")).collect();
        assert_eq!(by_plan.len(), 1);

        let by_project: Vec<_> = entries.iter().filter(|e| e.matches("PROJ")).collect();
        assert_eq!(by_project.len(), 2);

        assert!(!entries[2].matches("OP"));
    }

    #[test]
    fn test_dashboard_result_fields() {
        let entries: Vec<DashboardEntry> = serde_json::from_str(DASHBOARD).unwrap();
        let dev = &entries[0].environment_statuses[0];
        let result = dev.deployment_result.as_ref().unwrap();

        assert!(result.is_successful());
        let version = result.deployment_version.as_ref().unwrap();
        assert_eq!(version.build_key(), Some("PROJ-API-42"));
        assert!(entries[0].environment_statuses[1].deployment_result.is_none());
    }

    #[test]
    fn test_finished_but_failed() {
        let result: DeploymentResult = serde_json::from_str(
            r#"{"id": 1, "lifeCycleState": "FINISHED", "deploymentState": "FAILED"}"#,
        )
        .unwrap();
        assert!(result.is_finished());
        assert!(!result.is_successful());
        assert_eq!(result.state(), "FAILED");
    }

    #[tokio::test]
    async fn test_create_version_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/rest/api/latest/deploy/project/11/version")
            .match_body(Matcher::Json(serde_json::json!({
                "planResultKey": "PROJ-API3-7",
                "name": "feature-PROJ-12-7"
            })))
            .with_status(200)
            .with_body(r#"{"id": 77, "name": "feature-PROJ-12-7", "items": []}"#)
            .create_async()
            .await;

        let client = BambooClient::new(&server.url()).unwrap();
        let version = client
            .create_version(11, "PROJ-API3-7", "feature-PROJ-12-7")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(version.id, 77);
        assert_eq!(version.name, "feature-PROJ-12-7");
    }

    #[tokio::test]
    async fn test_queue_deployment_query() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/rest/api/latest/queue/deployment")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("environmentId".into(), "101".into()),
                Matcher::UrlEncoded("versionId".into(), "55".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"deploymentResultId": 9002}"#)
            .create_async()
            .await;

        let client = BambooClient::new(&server.url()).unwrap();
        let queued = client.queue_deployment(55, 101).await.unwrap();

        mock.assert_async().await;
        assert_eq!(queued.deployment_result_id, 9002);
    }

    #[tokio::test]
    async fn test_find_version_by_name() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/rest/api/latest/deploy/project/11/versions")
            .match_query(Matcher::UrlEncoded("max-result".into(), "100".into()))
            .with_status(200)
            .with_body(
                r#"{"size": 2, "versions": [
                    {"id": 56, "name": "master-43"},
                    {"id": 55, "name": "master-42"}
                ]}"#,
            )
            .create_async()
            .await;

        let client = BambooClient::new(&server.url()).unwrap();
        let found = client.find_version(11, "master-42").await.unwrap();
        assert_eq!(found.map(|v| v.id), Some(55));

        let missing = client.find_version(11, "master-1").await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_deployment_project_for_plan_takes_first() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/rest/api/latest/deploy/project/forPlan")
            .match_query(Matcher::UrlEncoded("planKey".into(), "PROJ-API".into()))
            .with_status(200)
            .with_body(
                r#"[
                    {"id": 11, "name": "API", "planKey": {"key": "PROJ-API"}},
                    {"id": 14, "name": "API (legacy)", "planKey": {"key": "PROJ-API"}}
                ]"#,
            )
            .create_async()
            .await;

        let client = BambooClient::new(&server.url()).unwrap();
        let project = client.deployment_project_for_plan("PROJ-API").await.unwrap();
        assert_eq!(project.map(|p| p.id), Some(11));
    }
}
