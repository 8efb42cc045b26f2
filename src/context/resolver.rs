//
//  pampu
//  context/resolver.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Plan Resolver
//!
//! Decides which plan a command works on.
//!
//! ## Resolution Priority
//!
//! 1. Plan key given on the command line
//! 2. Plan discovered from `.pampu.toml` or `bamboo-specs/bamboo.yml`
//! 3. [`ConfigError::PlanMissing`]
//!
//! The deployment dashboard may be scoped to a whole project; for it the
//! `project` set in `.pampu.toml` is tried before the discovered plan.
//!
//! ## Example
//!
//! ```rust,no_run
//! use pampu::context::PlanResolver;
//!
//! let resolver = PlanResolver::discover();
//! let plan = resolver.plan_key(None)?;
//! println!("Working on {}", plan);
//! # Ok::<(), anyhow::Error>(())
//! ```

use super::{DiscoveredProject, ProjectKeys};
use crate::config::ConfigError;

#[derive(Debug, Clone, Default)]
pub struct PlanResolver {
    discovered: DiscoveredProject,
}

impl PlanResolver {
    pub fn new(discovered: DiscoveredProject) -> Self {
        Self { discovered }
    }

    /// Creates a resolver from the current directory's project files.
    pub fn discover() -> Self {
        Self::new(DiscoveredProject::discover())
    }

    /// Returns the discovered default keys, if any.
    pub fn keys(&self) -> Option<&ProjectKeys> {
        self.discovered.keys.as_ref()
    }

    /// Resolves the plan key for a command that requires one.
    pub fn plan_key(&self, explicit: Option<&str>) -> Result<String, ConfigError> {
        if let Some(plan) = explicit.filter(|p| !p.is_empty()) {
            return Ok(plan.to_string());
        }
        self.keys()
            .map(|keys| keys.plan_key.clone())
            .ok_or(ConfigError::PlanMissing)
    }

    /// Resolves the plan or project key the deployment dashboard is scoped to.
    pub fn dashboard_key(&self, explicit: Option<&str>) -> Result<String, ConfigError> {
        if let Some(key) = explicit.filter(|k| !k.is_empty()) {
            return Ok(key.to_string());
        }
        if let Some(project) = &self.discovered.project {
            return Ok(project.clone());
        }
        self.plan_key(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn discovered(plan: Option<&str>, project: Option<&str>) -> DiscoveredProject {
        DiscoveredProject {
            keys: plan.map(|p| ProjectKeys {
                plan_key: p.to_string(),
                project_key: p.split('-').next().unwrap().to_string(),
            }),
            project: project.map(str::to_string),
            source: None,
        }
    }

    #[test]
    fn test_explicit_wins() {
        let resolver = PlanResolver::new(discovered(Some("PROJ-API"), None));
        assert_eq!(resolver.plan_key(Some("OTHER-PLAN")).unwrap(), "OTHER-PLAN");
    }

    #[test]
    fn test_discovered_fallback() {
        let resolver = PlanResolver::new(discovered(Some("PROJ-API"), None));
        assert_eq!(resolver.plan_key(None).unwrap(), "PROJ-API");
        assert_eq!(resolver.plan_key(Some("")).unwrap(), "PROJ-API");
    }

    #[test]
    fn test_missing_plan() {
        let resolver = PlanResolver::default();
        assert!(matches!(resolver.plan_key(None), Err(ConfigError::PlanMissing)));
    }

    #[test]
    fn test_dashboard_prefers_project() {
        let resolver = PlanResolver::new(discovered(Some("PROJ-API"), Some("PROJ")));
        assert_eq!(resolver.dashboard_key(None).unwrap(), "PROJ");
        assert_eq!(resolver.dashboard_key(Some("PROJ-WEB")).unwrap(), "PROJ-WEB");

        let resolver = PlanResolver::new(discovered(Some("PROJ-API"), None));
        assert_eq!(resolver.dashboard_key(None).unwrap(), "PROJ-API");

        let resolver = PlanResolver::new(discovered(None, Some("OPS")));
        assert_eq!(resolver.dashboard_key(None).unwrap(), "OPS");
    }
}
