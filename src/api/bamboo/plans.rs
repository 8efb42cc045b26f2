//
//  pampu
//  api/bamboo/plans.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Bamboo plans and plan branches.
//!
//! # Keys
//!
//! ```text
//! PROJ            project
//! PROJ-PLAN       plan (master branch)
//! PROJ-PLAN12     plan branch (Bamboo appends a branch number)
//! PROJ-PLAN12-7   build 7 of that branch
//! ```

use serde::{Deserialize, Serialize};

use crate::api::common::{ApiError, ListPage};
use crate::api::BambooClient;
use crate::context::BranchRecord;

/// A build plan within a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    /// Full plan key, e.g. `PROJ-PLAN`
    pub key: String,

    /// Display name, usually `Project - Plan`
    pub name: String,

    /// Plan name without the project prefix
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,

    /// Whether the plan is enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

/// A plan branch tracking one VCS branch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanBranch {
    /// Branch plan key, e.g. `PROJ-PLAN12`
    pub key: String,

    /// VCS branch name as Bamboo shows it (slashes may be replaced by dashes)
    pub short_name: String,

    /// Whether the branch plan is enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

impl From<&PlanBranch> for BranchRecord {
    fn from(branch: &PlanBranch) -> Self {
        BranchRecord {
            name: branch.short_name.clone(),
            key: branch.key.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProjectPlansResponse {
    #[serde(default)]
    plans: ListPage<Plan>,
}

#[derive(Debug, Deserialize)]
struct BranchesResponse {
    #[serde(default)]
    branches: ListPage<PlanBranch>,
}

impl BambooClient {
    /// Lists the plans of a project.
    ///
    /// Requests `GET project/{key}?expand=plans&max-result=1000`.
    pub async fn list_plans(&self, project_key: &str) -> Result<Vec<Plan>, ApiError> {
        let response: ProjectPlansResponse = self
            .get(
                &format!("project/{}", project_key),
                &[
                    ("expand", "plans".to_string()),
                    ("max-result", "1000".to_string()),
                ],
            )
            .await?;
        Ok(response.plans.into_items())
    }

    /// Lists the branches of a plan.
    ///
    /// Requests `GET plan/{key}/branch?max-result=1000`. The plan's own
    /// master branch is not part of the list.
    pub async fn list_branches(&self, plan_key: &str) -> Result<Vec<PlanBranch>, ApiError> {
        let response: BranchesResponse = self
            .get(
                &format!("plan/{}/branch", plan_key),
                &[("max-result", "1000".to_string())],
            )
            .await?;
        Ok(response.branches.into_items())
    }

    /// Lists plan branches as matcher candidates, in Bamboo's order.
    pub async fn branch_records(&self, plan_key: &str) -> Result<Vec<BranchRecord>, ApiError> {
        let branches = self.list_branches(plan_key).await?;
        Ok(branches.iter().map(BranchRecord::from).collect())
    }
}
