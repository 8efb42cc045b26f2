//
//  pampu
//  cli/config.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! CLI configuration commands
//!
//! Reads and writes the settings file. Credentials are managed by
//! `pampu init` and never shown here.

use anyhow::Result;
use clap::{Args, Subcommand};
use console::style;

use crate::config::{Config, KEYS};
use crate::output::{OutputWriter, TableBuilder};

use super::{get_format, GlobalOptions};

/// Manage CLI configuration
#[derive(Args, Debug)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigSubcommand {
    /// Get a configuration value
    Get(GetArgs),

    /// Set a configuration value
    Set(SetArgs),

    /// List all configuration values
    #[command(visible_alias = "ls")]
    List,

    /// Show configuration file path
    Path,
}

#[derive(Args, Debug)]
pub struct GetArgs {
    /// Configuration key, e.g. deploy.default_mode
    pub key: String,
}

#[derive(Args, Debug)]
pub struct SetArgs {
    /// Configuration key, e.g. deploy.default_mode
    pub key: String,

    /// Configuration value
    pub value: String,
}

fn unknown_key(key: &str) -> anyhow::Error {
    anyhow::anyhow!(
        "Unknown configuration key '{}'. Valid keys: {}",
        key,
        KEYS.join(", ")
    )
}

impl ConfigCommand {
    pub async fn run(&self, global: &GlobalOptions) -> Result<()> {
        let writer = OutputWriter::new(get_format(global));
        match &self.command {
            ConfigSubcommand::Get(args) => self.get(args, &writer),
            ConfigSubcommand::Set(args) => self.set(args, &writer),
            ConfigSubcommand::List => self.list(&writer),
            ConfigSubcommand::Path => self.path(&writer),
        }
    }

    fn get(&self, args: &GetArgs, writer: &OutputWriter) -> Result<()> {
        let config = Config::load()?;
        let value = config.get(&args.key).ok_or_else(|| unknown_key(&args.key))?;

        if writer.is_json() {
            return writer.write_json(&serde_json::json!({
                "key": args.key,
                "value": value,
            }));
        }
        println!("{}", value);
        Ok(())
    }

    fn set(&self, args: &SetArgs, writer: &OutputWriter) -> Result<()> {
        let mut config = Config::load()?;
        if !config.set(&args.key, &args.value)? {
            return Err(unknown_key(&args.key));
        }
        config.save()?;

        if writer.is_json() {
            return writer.write_json(&serde_json::json!({
                "success": true,
                "key": args.key,
                "value": args.value,
            }));
        }

        if writer.color_enabled() {
            println!(
                "{} Set {} = {}",
                style("✓").green(),
                style(&args.key).cyan(),
                args.value
            );
        } else {
            println!("✓ Set {} = {}", args.key, args.value);
        }
        Ok(())
    }

    fn list(&self, writer: &OutputWriter) -> Result<()> {
        let config = Config::load()?;

        if writer.is_json() {
            return writer.write_json(&config);
        }

        let mut table = TableBuilder::new()
            .color(writer.color_enabled())
            .headers(["Key", "Value"]);
        for (key, value) in config.entries() {
            table = table.row([key.to_string(), value]);
        }
        table.print();
        Ok(())
    }

    fn path(&self, writer: &OutputWriter) -> Result<()> {
        let path = Config::config_path()?;

        if writer.is_json() {
            return writer.write_json(&serde_json::json!({
                "path": path.display().to_string(),
                "exists": path.exists(),
            }));
        }
        println!("{}", path.display());
        Ok(())
    }
}
