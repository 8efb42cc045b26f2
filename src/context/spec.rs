//
//  pampu
//  context/spec.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Project Spec Discovery
//!
//! Finds the default plan of the working repository so commands can be run
//! without a plan argument.
//!
//! ## Sources
//!
//! Both are searched from the current directory upward:
//!
//! 1. `.pampu.toml`
//!
//!    ```toml
//!    plan = "MYPROJECT-BUILD"
//!    project = "MYPROJECT"   # optional, used by `pampu deploys`
//!    ```
//!
//! 2. Bamboo YAML specs in `bamboo-specs/bamboo.yml` (or `.yaml`)
//!
//!    ```yaml
//!    version: 2
//!    plan:
//!      project-key: MYPROJECT
//!      key: BUILD
//!      name: Build
//!    ```
//!
//! A plan from `.pampu.toml` takes precedence over the YAML specs.
//!
//! ## Notes
//!
//! - YAML spec files may contain several documents (`---`); the first one
//!   declaring `plan.project-key` and `plan.key` is used
//! - Reading stops at the first document that does not parse
//! - Unreadable or malformed files count as absent

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Name of the repository-local settings file.
pub const LOCAL_CONFIG_FILE: &str = ".pampu.toml";

/// Bamboo YAML spec locations, relative to a directory on the upward walk.
pub const SPEC_FILES: &[&str] = &["bamboo-specs/bamboo.yml", "bamboo-specs/bamboo.yaml"];

/// Default plan and project of a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectKeys {
    /// Full plan key, e.g. `MYPROJECT-BUILD`
    pub plan_key: String,

    /// Project key, e.g. `MYPROJECT`
    pub project_key: String,
}

#[derive(Debug, Deserialize)]
struct SpecDocument {
    #[serde(default)]
    plan: Option<SpecPlan>,
}

#[derive(Debug, Deserialize)]
struct SpecPlan {
    #[serde(rename = "project-key", default)]
    project_key: Option<String>,

    #[serde(default)]
    key: Option<String>,
}

/// Parses Bamboo YAML spec contents into project keys.
///
/// # Example
///
/// ```rust
/// use pampu::context::resolve;
///
/// let keys = resolve("plan:\n  project-key: MYPROJECT\n  key: BUILD\n").unwrap();
/// assert_eq!(keys.plan_key, "MYPROJECT-BUILD");
/// assert_eq!(keys.project_key, "MYPROJECT");
///
/// assert!(resolve("version: 2\n").is_none());
/// ```
pub fn resolve(contents: &str) -> Option<ProjectKeys> {
    for document in serde_yaml::Deserializer::from_str(contents) {
        let parsed = match SpecDocument::deserialize(document) {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!("Stopping at unparsable spec document: {}", e);
                break;
            }
        };

        let Some(plan) = parsed.plan else { continue };
        match (plan.project_key, plan.key) {
            (Some(project), Some(key)) if !project.is_empty() && !key.is_empty() => {
                return Some(ProjectKeys {
                    plan_key: format!("{}-{}", project, key),
                    project_key: project,
                });
            }
            _ => continue,
        }
    }
    None
}

/// Contents of `.pampu.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LocalConfig {
    #[serde(default)]
    pub plan: Option<String>,

    #[serde(default)]
    pub project: Option<String>,
}

impl LocalConfig {
    /// Parses `.pampu.toml` contents; malformed TOML yields `None`.
    pub fn parse(contents: &str) -> Option<Self> {
        match toml::from_str(contents) {
            Ok(config) => Some(config),
            Err(e) => {
                debug!("Ignoring malformed {}: {}", LOCAL_CONFIG_FILE, e);
                None
            }
        }
    }

    /// Returns the keys this file declares, if it names a plan.
    ///
    /// The project key defaults to the plan key's prefix.
    pub fn keys(&self) -> Option<ProjectKeys> {
        let plan_key = self.plan.as_deref().filter(|p| !p.is_empty())?;
        let project_key = self
            .project
            .clone()
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| project_prefix(plan_key).to_string());
        Some(ProjectKeys {
            plan_key: plan_key.to_string(),
            project_key,
        })
    }
}

/// Returns the project part of a plan key (`PROJ` for `PROJ-PLAN`).
pub fn project_prefix(plan_key: &str) -> &str {
    plan_key.split('-').next().unwrap_or(plan_key)
}

/// Everything discovered about the working repository.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveredProject {
    /// Default plan and project
    pub keys: Option<ProjectKeys>,

    /// `project` explicitly set in `.pampu.toml`
    pub project: Option<String>,

    /// File the plan was read from
    pub source: Option<PathBuf>,
}

impl DiscoveredProject {
    /// Discovers from the current directory.
    pub fn discover() -> Self {
        match std::env::current_dir() {
            Ok(dir) => Self::discover_from(&dir),
            Err(_) => Self::default(),
        }
    }

    /// Discovers from `start`, walking upward.
    pub fn discover_from(start: &Path) -> Self {
        let local = find_upward(start, &[LOCAL_CONFIG_FILE]).and_then(|path| {
            let config = LocalConfig::parse(&std::fs::read_to_string(&path).ok()?)?;
            Some((path, config))
        });

        let project = local
            .as_ref()
            .and_then(|(_, config)| config.project.clone())
            .filter(|p| !p.is_empty());

        if let Some((path, keys)) = local
            .as_ref()
            .and_then(|(path, config)| config.keys().map(|keys| (path.clone(), keys)))
        {
            debug!(source = %path.display(), plan = %keys.plan_key, "Discovered plan");
            return Self {
                keys: Some(keys),
                project,
                source: Some(path),
            };
        }

        let spec = find_upward(start, SPEC_FILES).and_then(|path| {
            let keys = resolve(&std::fs::read_to_string(&path).ok()?)?;
            Some((path, keys))
        });

        match spec {
            Some((path, keys)) => {
                debug!(source = %path.display(), plan = %keys.plan_key, "Discovered plan");
                Self {
                    keys: Some(keys),
                    project,
                    source: Some(path),
                }
            }
            None => Self {
                keys: None,
                project,
                source: None,
            },
        }
    }
}

impl ProjectKeys {
    /// Discovers the default keys from the current directory.
    pub fn discover() -> Option<Self> {
        DiscoveredProject::discover().keys
    }
}

/// Returns the first existing `dir/name` for `dir` in `start` and its
/// ancestors, trying `names` in order at each level.
fn find_upward(start: &Path, names: &[&str]) -> Option<PathBuf> {
    start
        .ancestors()
        .flat_map(|dir| names.iter().map(move |name| dir.join(name)))
        .find(|path| path.is_file())
}
