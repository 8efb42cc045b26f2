//
//  pampu
//  lib.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Pampu Library
//!
//! A command-line interface library for working with Atlassian Bamboo builds
//! and deployments from the terminal.
//!
//! ## Overview
//!
//! This library provides the core functionality for the `pampu` CLI tool. Every
//! command follows the same shape: resolve credentials and the project context,
//! call one or more Bamboo REST endpoints, and render the typed response.
//!
//! ## Features
//!
//! - **Browsing**: Projects, plans, plan branches and recent builds
//! - **Build Status**: Detailed build results, detected from the current git branch
//! - **Deployments**: Dashboard per environment, version listing and creation
//! - **Safe Deploys**: Sequential or parallel deployment fan-out that never
//!   touches production environments
//! - **Scriptable**: JSON output for every listing command
//!
//! ## Module Structure
//!
//! - [`cli`]: Command-line interface definitions using clap
//! - [`api`]: HTTP client and typed Bamboo REST resources
//! - [`auth`]: Personal access token credentials
//! - [`config`]: User settings file
//! - [`context`]: Repository context (git branch, spec file, branch matching)
//! - [`deploy`]: Deployment orchestration and the production safety gate
//! - [`output`]: Output formatting (Table, JSON)
//! - [`interactive`]: Interactive prompts
//! - [`util`]: Utility functions
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use pampu::context::{extract_ticket, ProjectKeys};
//!
//! let ticket = extract_ticket("feature/PROJ-42-fix-login");
//! assert_eq!(ticket.as_deref(), Some("PROJ-42"));
//!
//! if let Some(keys) = ProjectKeys::discover() {
//!     println!("Default plan: {}", keys.plan_key);
//! }
//! ```

/// Command-line interface definitions.
///
/// Contains all CLI commands and arguments defined using the clap derive API.
/// Each command module handles parsing and execution of its own functionality.
pub mod cli;

/// API client implementation for Bamboo.
///
/// The client handles authentication, request building, error mapping and
/// typed deserialization of the Bamboo REST API (`rest/api/latest`).
pub mod api;

/// Credential management.
///
/// Bamboo authenticates with personal access tokens. Credentials come from
/// the `BAMBOO_URL` / `BAMBOO_TOKEN` environment variables or from the
/// credentials file written by `pampu init`.
pub mod auth;

/// Configuration file management.
///
/// Manages the CLI's settings stored in platform-specific locations:
/// - Linux: `~/.config/pampu/config.toml`
/// - macOS: `~/Library/Application Support/pampu/config.toml`
/// - Windows: `%APPDATA%\pampu\config.toml`
pub mod config;

/// Repository context detection.
///
/// Reads the current git branch, discovers the project spec file that names
/// the default plan, and correlates git branches with Bamboo plan branches.
pub mod context;

/// Deployment orchestration.
///
/// Fans a version out to several environments, sequentially or in parallel,
/// and refuses production environments before any request is made.
pub mod deploy;

/// Output formatting for different modes.
///
/// Provides formatters for:
/// - Table format: Human-readable tables for interactive use
/// - JSON format: Structured output for scripting and automation
pub mod output;

/// Interactive terminal prompts used by `pampu init`.
pub mod interactive;

/// Utility functions and helpers.
///
/// Relative time formatting, HTML stripping for Bamboo reason summaries and
/// string truncation.
pub mod util;

/// Re-export of the main CLI struct for convenient access.
pub use cli::Cli;

/// Re-export of the configuration struct.
pub use config::Config;

/// Application name constant.
///
/// The name of the CLI binary, used for display purposes and configuration paths.
pub const APP_NAME: &str = "pampu";

/// Application version constant.
///
/// The current version of the CLI, derived from Cargo.toml at compile time.
///
/// # Example
///
/// ```rust
/// use pampu::VERSION;
///
/// println!("pampu version {}", VERSION);
/// ```
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Exit codes for the CLI.
///
/// Standardized exit codes following Unix conventions, allowing scripts
/// to programmatically detect the outcome of CLI operations.
///
/// # Exit Code Ranges
///
/// - `0`: Success
/// - `1-3`: General errors, usage and configuration issues
/// - `4-7`: Authentication-related issues
/// - `8-15`: Resource-related issues
/// - `16-31`: Operation-related issues
pub mod exit_codes {
    use crate::api::bamboo::BuildFailed;
    use crate::api::ApiError;
    use crate::config::ConfigError;
    use crate::deploy::DeployError;

    /// Successful execution.
    pub const SUCCESS: i32 = 0;

    /// General error.
    ///
    /// An unspecified error occurred during execution, or `pampu status`
    /// reported a failed build. Check stderr for details.
    pub const ERROR: i32 = 1;

    /// Invalid usage or arguments.
    pub const USAGE: i32 = 2;

    /// Required configuration is missing.
    ///
    /// No plan key could be resolved for a command that needs one, or
    /// no credentials are configured. Run `pampu init` or add a
    /// `.pampu.toml` / `bamboo-specs/bamboo.yml` to the repository.
    pub const CONFIG_MISSING: i32 = 3;

    /// Authentication failed.
    ///
    /// Bamboo rejected the personal access token (HTTP 401/403).
    pub const AUTH_ERROR: i32 = 4;

    /// Resource not found.
    ///
    /// The requested plan, build, version or environment does not exist
    /// or the token does not grant access to it.
    pub const NOT_FOUND: i32 = 8;

    /// Operation cancelled by user (Ctrl+C).
    pub const CANCELLED: i32 = 16;

    /// One or more deployment targets did not succeed.
    ///
    /// Includes targets refused by the production safety gate.
    pub const DEPLOY_FAILED: i32 = 17;

    /// Maps an error chain to the most specific exit code.
    ///
    /// Walks the `anyhow` chain looking for the library's typed errors;
    /// anything unrecognised maps to [`ERROR`].
    pub fn for_error(err: &anyhow::Error) -> i32 {
        for cause in err.chain() {
            if let Some(api) = cause.downcast_ref::<ApiError>() {
                return match api.status_code() {
                    Some(401) | Some(403) => AUTH_ERROR,
                    Some(404) => NOT_FOUND,
                    _ => ERROR,
                };
            }
            if cause.downcast_ref::<ConfigError>().is_some() {
                return CONFIG_MISSING;
            }
            if cause.downcast_ref::<BuildFailed>().is_some() {
                return ERROR;
            }
            if let Some(deploy) = cause.downcast_ref::<DeployError>() {
                return match deploy {
                    DeployError::Failed { .. } => DEPLOY_FAILED,
                    DeployError::Cancelled => CANCELLED,
                    _ => USAGE,
                };
            }
        }
        ERROR
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Context;
    use chrono::Utc;

    use super::exit_codes::*;
    use crate::api::bamboo::BuildFailed;
    use crate::api::ApiError;
    use crate::config::ConfigError;
    use crate::deploy::{
        ensure_all_succeeded, DeployError, DeployOutcome, DeployStatus, DeployTarget,
        FailureReason,
    };

    fn status_error(status: u16) -> anyhow::Error {
        let err: Result<(), ApiError> = Err(ApiError::Status {
            status,
            message: "nope".to_string(),
            body: String::new(),
        });
        err.context("Failed to list projects").unwrap_err()
    }

    fn outcome(name: &str, status: DeployStatus) -> DeployOutcome {
        let now = Utc::now();
        DeployOutcome {
            target: DeployTarget::new(name, Some(1)),
            status,
            started_at: now,
            finished_at: now,
            result_id: None,
        }
    }

    fn batch_error(outcomes: &[DeployOutcome]) -> anyhow::Error {
        ensure_all_succeeded(outcomes)
            .context("deploy master-3")
            .unwrap_err()
    }

    #[test]
    fn test_api_status_codes() {
        assert_eq!(for_error(&status_error(401)), AUTH_ERROR);
        assert_eq!(for_error(&status_error(403)), AUTH_ERROR);
        assert_eq!(for_error(&status_error(404)), NOT_FOUND);
        assert_eq!(for_error(&status_error(500)), ERROR);
        assert_eq!(
            for_error(&anyhow::Error::new(ApiError::Decode("bad json".to_string()))),
            ERROR
        );
    }

    #[test]
    fn test_missing_configuration() {
        let err: Result<(), ConfigError> = Err(ConfigError::PlanMissing);
        let err = err.context("Resolving plan").unwrap_err();
        assert_eq!(for_error(&err), CONFIG_MISSING);

        let err = anyhow::Error::new(ConfigError::CredentialsMissing {
            path: "/tmp/credentials.toml".to_string(),
        });
        assert_eq!(for_error(&err), CONFIG_MISSING);
    }

    #[test]
    fn test_refused_target_fails_the_batch() {
        let outcomes = vec![
            outcome("DEV", DeployStatus::Succeeded),
            outcome("PROD", DeployStatus::Failed(FailureReason::Refused)),
        ];
        assert_eq!(for_error(&batch_error(&outcomes)), DEPLOY_FAILED);
    }

    #[test]
    fn test_cancelled_batch() {
        let outcomes = vec![
            outcome("DEV", DeployStatus::Failed(FailureReason::TimedOut)),
            outcome("QA", DeployStatus::Failed(FailureReason::Cancelled)),
        ];
        assert_eq!(for_error(&batch_error(&outcomes)), CANCELLED);
    }

    #[test]
    fn test_contract_errors_are_usage() {
        assert_eq!(for_error(&anyhow::Error::new(DeployError::EmptyTargets)), USAGE);
        assert_eq!(for_error(&anyhow::Error::new(DeployError::EmptyVersion)), USAGE);
    }

    #[test]
    fn test_failed_build_and_plain_errors() {
        let err: Result<(), BuildFailed> = Err(BuildFailed {
            key: "PROJ-API-7".to_string(),
        });
        let err = err.context("status").unwrap_err();
        assert_eq!(for_error(&err), ERROR);
        assert!(format!("{:#}", err).contains("Build PROJ-API-7 failed"));

        assert_eq!(for_error(&anyhow::anyhow!("something else")), ERROR);
    }
}
