//
//  pampu
//  cli/builds.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! `pampu builds <plan> [-n N]`
//!
//! Works for plans and plan branches alike.

use anyhow::{bail, Result};
use clap::Args;

use crate::api::bamboo::BuildResult;
use crate::output::{format_status, OutputWriter, TableOutput};

use super::{bamboo_client, get_format, GlobalOptions};

/// List recent builds of a plan or branch
#[derive(Args, Debug)]
pub struct BuildsCommand {
    /// Plan or branch key, e.g. MYPROJECT-BUILD
    pub plan: String,

    /// Number of builds to show
    #[arg(long, short = 'n', default_value = "10")]
    pub limit: u32,
}

impl TableOutput for BuildResult {
    fn print_table(&self, color: bool) {
        println!("{}\t{}", self.key, format_status(self.verdict(), color));
    }
}

impl BuildsCommand {
    pub async fn run(&self, global: &GlobalOptions) -> Result<()> {
        if !self.plan.contains('-') {
            bail!("Key must be in PROJECT-PLAN format (e.g., MYPROJECT-BUILD)");
        }

        let client = bamboo_client()?;
        let builds = client.list_builds(&self.plan, self.limit).await?;

        let writer = OutputWriter::new(get_format(global));
        if builds.is_empty() && !writer.is_json() {
            println!("No builds found.");
            return Ok(());
        }

        writer.write_list(&builds)
    }
}
