//
//  pampu
//  api/bamboo/projects.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Bamboo build projects.
//!
//! A project groups plans under a short upper-case key (`PROJ`). Plan keys are
//! always prefixed with their project key (`PROJ-PLAN`).

use serde::{Deserialize, Serialize};

use crate::api::common::{ApiError, ListPage};
use crate::api::BambooClient;

/// A Bamboo build project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    /// Project key, e.g. `PROJ`
    pub key: String,

    /// Display name
    pub name: String,

    /// Optional description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProjectsResponse {
    #[serde(default)]
    projects: ListPage<Project>,
}

impl BambooClient {
    /// Lists every project visible to the token.
    ///
    /// Requests `GET project?max-result=1000`.
    pub async fn list_projects(&self) -> Result<Vec<Project>, ApiError> {
        let response: ProjectsResponse = self
            .get("project", &[("max-result", "1000".to_string())])
            .await?;
        Ok(response.projects.into_items())
    }
}
