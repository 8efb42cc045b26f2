//
//  pampu
//  auth/credentials.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Credential Resolution
//!
//! pampu needs the Bamboo base URL and a personal access token. Each value is
//! looked up independently:
//!
//! 1. `BAMBOO_URL` / `BAMBOO_TOKEN` environment variables
//! 2. `credentials.toml` in the config directory, written by `pampu init`
//!
//! ```toml
//! url = "https://bamboo.yourcompany.com"
//! token = "your-personal-access-token"
//! ```
//!
//! The file is written with mode `0600`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::AuthCredential;
use crate::config::{config_dir, config_exists, read_config_file, write_private_file, ConfigError};

/// Environment variable holding the Bamboo base URL.
pub const URL_ENV: &str = "BAMBOO_URL";

/// Environment variable holding the personal access token.
pub const TOKEN_ENV: &str = "BAMBOO_TOKEN";

/// Resolved Bamboo credentials.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Credentials {
    /// Bamboo base URL, e.g. `https://bamboo.yourcompany.com`
    pub url: String,

    /// Personal access token
    pub token: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("url", &self.url)
            .field("token", &"***")
            .finish()
    }
}

/// On-disk shape; either field may be absent.
#[derive(Debug, Default, Deserialize)]
struct CredentialsFile {
    #[serde(default)]
    url: Option<String>,

    #[serde(default)]
    token: Option<String>,
}

impl Credentials {
    pub fn new(url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            token: token.into(),
        }
    }

    /// Returns the location of the credentials file.
    pub fn path() -> Result<PathBuf> {
        Ok(config_dir()?.join("credentials.toml"))
    }

    /// Resolves credentials from the process environment and the default
    /// credentials file.
    ///
    /// # Errors
    ///
    /// [`ConfigError::CredentialsMissing`] if the URL or the token is missing
    /// from both sources.
    pub fn resolve() -> Result<Self> {
        Self::resolve_with(|name| std::env::var(name).ok(), &Self::path()?)
    }

    /// Resolves credentials with an explicit environment lookup and file path.
    ///
    /// Environment values win over file values; empty values count as unset.
    pub fn resolve_with<F>(env: F, path: &Path) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |value: Option<String>| {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut url = non_empty(env(URL_ENV));
        let mut token = non_empty(env(TOKEN_ENV));

        if url.is_none() || token.is_none() {
            let file = Self::read_file(path)?;
            url = url.or_else(|| non_empty(file.url));
            token = token.or_else(|| non_empty(file.token));
        }

        match (url, token) {
            (Some(url), Some(token)) => {
                debug!(%url, "Resolved Bamboo credentials");
                Ok(Self { url, token })
            }
            _ => Err(ConfigError::CredentialsMissing {
                path: path.display().to_string(),
            }
            .into()),
        }
    }

    fn read_file(path: &Path) -> Result<CredentialsFile> {
        if !config_exists(path) {
            return Ok(CredentialsFile::default());
        }
        let content = read_config_file(path)?;
        toml::from_str(&content).with_context(|| format!("Invalid credentials file {}", path.display()))
    }

    /// Saves the credentials to the default location.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Saves the credentials to `path` with owner-only permissions.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string(self)?;
        write_private_file(path, &content)
    }

    /// Returns the request authentication for these credentials.
    pub fn auth(&self) -> AuthCredential {
        AuthCredential::PersonalAccessToken {
            token: self.token.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_env_wins_over_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.toml");
        Credentials::new("https://file.example.com", "file-token")
            .save_to(&path)
            .unwrap();

        let env = env_from(&[(URL_ENV, "https://env.example.com"), (TOKEN_ENV, "env-token")]);
        let creds = Credentials::resolve_with(env, &path).unwrap();

        assert_eq!(creds, Credentials::new("https://env.example.com", "env-token"));
    }

    #[test]
    fn test_fields_resolve_independently() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.toml");
        Credentials::new("https://file.example.com", "file-token")
            .save_to(&path)
            .unwrap();

        let env = env_from(&[(TOKEN_ENV, "env-token")]);
        let creds = Credentials::resolve_with(env, &path).unwrap();

        assert_eq!(creds.url, "https://file.example.com");
        assert_eq!(creds.token, "env-token");
    }

    #[test]
    fn test_file_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.toml");
        std::fs::write(&path, "url = \"https://bamboo.example.com\"\ntoken = \"abc\"\n").unwrap();

        let creds = Credentials::resolve_with(env_from(&[]), &path).unwrap();
        assert_eq!(creds.url, "https://bamboo.example.com");
        assert_eq!(creds.token, "abc");
    }

    #[test]
    fn test_missing_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.toml");

        let err = Credentials::resolve_with(env_from(&[(URL_ENV, "https://x")]), &path).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::CredentialsMissing { .. })
        ));
    }

    #[test]
    fn test_empty_env_counts_as_unset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.toml");
        Credentials::new("https://file.example.com", "file-token")
            .save_to(&path)
            .unwrap();

        let env = env_from(&[(URL_ENV, ""), (TOKEN_ENV, "  ")]);
        let creds = Credentials::resolve_with(env, &path).unwrap();
        assert_eq!(creds.token, "file-token");
    }

    #[test]
    fn test_debug_hides_token() {
        let creds = Credentials::new("https://bamboo.example.com", "super-secret");
        assert!(!format!("{:?}", creds).contains("super-secret"));
    }
}
