//
//  pampu
//  config/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Configuration Module
//!
//! This module provides settings management for pampu. Settings are loaded
//! from a TOML file stored in the platform-specific config directory, next to
//! the credentials file written by `pampu init`.
//!
//! ## Configuration File Location
//!
//! - **Linux**: `~/.config/pampu/config.toml`
//! - **macOS**: `~/Library/Application Support/pampu/config.toml`
//! - **Windows**: `C:\Users\<User>\AppData\Roaming\pampu\config\config.toml`
//!
//! ## Example Configuration File
//!
//! ```toml
//! [deploy]
//! default_mode = "parallel"
//! poll_interval_secs = 10
//! max_wait_secs = 1800
//!
//! [output]
//! json = false
//! ```
//!
//! Every field is optional; a missing file is the same as an empty one.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use pampu::config::Config;
//!
//! let mut config = Config::load()?;
//! config.set("deploy.default_mode", "parallel")?;
//! config.save()?;
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ## Submodules
//!
//! - [`file`]: Low-level configuration file I/O operations

mod file;

pub use file::*;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::deploy::DeployMode;

/// Settings keys understood by `pampu config get/set`.
pub const KEYS: &[&str] = &[
    "deploy.default_mode",
    "deploy.poll_interval_secs",
    "deploy.max_wait_secs",
    "output.json",
];

/// Required configuration that could not be found.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A command needs a plan key and none was given or discovered.
    #[error(
        "No plan specified and none found in .pampu.toml or bamboo-specs/bamboo.yml\n\
         Pass a plan key or create .pampu.toml with: plan = \"MYPROJECT-BUILD\""
    )]
    PlanMissing,

    /// Neither environment variables nor the credentials file provide both
    /// the Bamboo URL and token.
    #[error(
        "Credentials not configured\n\n\
         Either set environment variables:\n  \
         export BAMBOO_URL='https://bamboo.yourcompany.com'\n  \
         export BAMBOO_TOKEN='your-personal-access-token'\n\n\
         Or run 'pampu init' to save credentials to {path}"
    )]
    CredentialsMissing {
        /// Location of the credentials file
        path: String,
    },
}

/// User settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub deploy: DeployConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

/// `[deploy]` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeployConfig {
    /// Mode used when neither `--chain` nor `--parallel` is given
    #[serde(default)]
    pub default_mode: DeployMode,

    /// Seconds between deployment status polls
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Seconds to wait for one deployment before reporting a timeout
    #[serde(default = "default_max_wait_secs")]
    pub max_wait_secs: u64,
}

fn default_poll_interval_secs() -> u64 {
    5
}

fn default_max_wait_secs() -> u64 {
    3600
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            default_mode: DeployMode::default(),
            poll_interval_secs: default_poll_interval_secs(),
            max_wait_secs: default_max_wait_secs(),
        }
    }
}

impl DeployConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn max_wait(&self) -> Duration {
        Duration::from_secs(self.max_wait_secs)
    }
}

/// `[output]` section.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct OutputConfig {
    /// Emit JSON even without `--json`
    #[serde(default)]
    pub json: bool,
}

impl Config {
    /// Loads settings from the default location.
    ///
    /// A missing file yields the defaults.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Loads settings from `path`.
    pub fn load_from(path: &Path) -> Result<Self> {
        if config_exists(path) {
            let content = read_config_file(path)?;
            Ok(toml::from_str(&content)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        write_config_file(path, &content)
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(config_dir()?.join("config.toml"))
    }

    /// Returns the value of a dotted settings key.
    ///
    /// # Returns
    ///
    /// `None` for unknown keys.
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "deploy.default_mode" => Some(self.deploy.default_mode.to_string()),
            "deploy.poll_interval_secs" => Some(self.deploy.poll_interval_secs.to_string()),
            "deploy.max_wait_secs" => Some(self.deploy.max_wait_secs.to_string()),
            "output.json" => Some(self.output.json.to_string()),
            _ => None,
        }
    }

    /// Sets a dotted settings key.
    ///
    /// # Returns
    ///
    /// `Ok(false)` for unknown keys, an error for values that do not parse.
    pub fn set(&mut self, key: &str, value: &str) -> Result<bool> {
        let invalid = || anyhow::anyhow!("Invalid value '{}' for {}", value, key);

        match key {
            "deploy.default_mode" => {
                self.deploy.default_mode = value.parse().map_err(|_| invalid())?;
            }
            "deploy.poll_interval_secs" => {
                self.deploy.poll_interval_secs = value.parse().map_err(|_| invalid())?;
            }
            "deploy.max_wait_secs" => {
                self.deploy.max_wait_secs = value.parse().map_err(|_| invalid())?;
            }
            "output.json" => {
                self.output.json = value.parse().map_err(|_| invalid())?;
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    /// Returns every key with its current value, in [`KEYS`] order.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        KEYS.iter()
            .filter_map(|key| self.get(key).map(|value| (*key, value)))
            .collect()
    }
}
