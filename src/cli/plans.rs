//
//  pampu
//  cli/plans.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! `pampu plans <project>`

use anyhow::Result;
use clap::Args;
use console::style;

use crate::api::bamboo::Plan;
use crate::output::{OutputWriter, TableOutput};

use super::{bamboo_client, get_format, GlobalOptions};

/// List the plans of a project
#[derive(Args, Debug)]
pub struct PlansCommand {
    /// Project key, e.g. MYPROJECT
    pub project: String,
}

impl TableOutput for Plan {
    fn print_table(&self, color: bool) {
        let name = self.short_name.as_deref().unwrap_or(&self.name);
        let disabled = if self.enabled == Some(false) {
            " (disabled)"
        } else {
            ""
        };
        if color {
            println!("{}\t{}{}", style(&self.key).cyan(), name, style(disabled).dim());
        } else {
            println!("{}\t{}{}", self.key, name, disabled);
        }
    }
}

impl PlansCommand {
    pub async fn run(&self, global: &GlobalOptions) -> Result<()> {
        let client = bamboo_client()?;
        let plans = client.list_plans(&self.project).await?;

        let writer = OutputWriter::new(get_format(global));
        if plans.is_empty() && !writer.is_json() {
            println!("No plans found.");
            return Ok(());
        }

        writer.write_list(&plans)
    }
}
