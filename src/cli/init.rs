//
//  pampu
//  cli/init.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Credential setup
//!
//! Asks for the Bamboo URL and a personal access token and writes them to
//! `credentials.toml` in the config directory, readable only by the owner.
//!
//! ## Examples
//!
//! ```bash
//! # Interactive
//! pampu init
//!
//! # Non-interactive
//! pampu init --url https://bamboo.example.com --token "$TOKEN"
//! ```

use anyhow::{bail, Result};
use clap::Args;
use console::style;

use crate::api::client::normalize_base_url;
use crate::auth::Credentials;
use crate::interactive::{prompt_confirm_with_default, prompt_input_validated, prompt_password};
use crate::output::OutputWriter;

use super::{get_format, GlobalOptions};

/// Save the Bamboo URL and personal access token
#[derive(Args, Debug)]
pub struct InitCommand {
    /// Bamboo base URL, e.g. https://bamboo.example.com
    #[arg(long)]
    pub url: Option<String>,

    /// Personal access token
    #[arg(long)]
    pub token: Option<String>,
}

impl InitCommand {
    pub async fn run(&self, global: &GlobalOptions) -> Result<()> {
        let interactive = self.url.is_none() || self.token.is_none();
        if interactive {
            let existing = Credentials::path()?;
            if existing.exists()
                && !prompt_confirm_with_default(
                    &format!("Credentials already saved in {}. Overwrite?", existing.display()),
                    false,
                )?
            {
                return Ok(());
            }
            print_instructions();
        }

        let url = match &self.url {
            Some(url) => normalize_base_url(url)?,
            None => {
                let raw = prompt_input_validated(
                    "Bamboo URL (e.g., https://bamboo.yourcompany.com)",
                    None,
                    |value| normalize_base_url(value).map(|_| ()).map_err(|e| e.to_string()),
                )?;
                normalize_base_url(&raw)?
            }
        };

        let token = match &self.token {
            Some(token) => token.trim().to_string(),
            None => prompt_password("Personal Access Token")?,
        };
        if token.is_empty() {
            bail!("Token is required");
        }

        let credentials = Credentials::new(url.as_str().trim_end_matches('/'), token);
        let path = credentials.save()?;

        let writer = OutputWriter::new(get_format(global));
        if writer.is_json() {
            writer.write_json(&serde_json::json!({
                "url": credentials.url,
                "path": path.display().to_string(),
            }))?;
        } else {
            println!();
            writer.write_success(&format!("Credentials saved to {}", path.display()));
        }
        Ok(())
    }
}

fn print_instructions() {
    println!("{}", style("Pampu Setup").bold());
    println!("===========");
    println!();
    println!("To get a Personal Access Token:");
    println!("1. Go to your Bamboo instance");
    println!("2. Click your avatar (top-right) → Profile");
    println!("3. Select 'Personal access tokens' tab");
    println!("4. Click 'Create token'");
    println!();
}
