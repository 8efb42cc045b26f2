//
//  pampu
//  cli/projects.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! `pampu projects`

use anyhow::Result;
use clap::Args;
use console::style;

use crate::api::bamboo::Project;
use crate::output::{OutputWriter, TableOutput};

use super::{bamboo_client, get_format, GlobalOptions};

/// List projects
#[derive(Args, Debug)]
pub struct ProjectsCommand {}

impl TableOutput for Project {
    fn print_table(&self, color: bool) {
        if color {
            println!("{}\t{}", style(&self.key).cyan(), self.name);
        } else {
            println!("{}\t{}", self.key, self.name);
        }
    }
}

impl ProjectsCommand {
    pub async fn run(&self, global: &GlobalOptions) -> Result<()> {
        let client = bamboo_client()?;
        let projects = client.list_projects().await?;

        let writer = OutputWriter::new(get_format(global));
        if projects.is_empty() && !writer.is_json() {
            println!("No projects found.");
            return Ok(());
        }

        writer.write_list(&projects)
    }
}
