//
//  pampu
//  cli/logs.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! `pampu logs <build>`
//!
//! Prints the log of every job of a build. Logs come from the REST API's
//! log entries, falling back to the raw log download.

use anyhow::Result;
use clap::Args;
use console::style;

use crate::api::bamboo::JobLog;
use crate::output::OutputWriter;

use super::{bamboo_client, get_format, GlobalOptions};

/// Print the job logs of a build
#[derive(Args, Debug)]
pub struct LogsCommand {
    /// Build key, e.g. MYPROJECT-BUILD-42
    pub build: String,

    /// Only print jobs whose key contains this text
    #[arg(long, short = 'j')]
    pub job: Option<String>,
}

impl LogsCommand {
    pub async fn run(&self, global: &GlobalOptions) -> Result<()> {
        let client = bamboo_client()?;
        let logs: Vec<JobLog> = client
            .build_logs(&self.build)
            .await?
            .into_iter()
            .filter(|log| {
                self.job
                    .as_deref()
                    .is_none_or(|job| log.job_key.contains(job))
            })
            .collect();

        let writer = OutputWriter::new(get_format(global));
        if writer.is_json() {
            return writer.write_json(&logs);
        }

        let several = logs.len() > 1;
        for log in &logs {
            if several {
                let header = format!("=== {} ===", log.job_key);
                if writer.color_enabled() {
                    println!("\n{}\n", style(header).bold());
                } else {
                    println!("\n{}\n", header);
                }
            }
            match &log.text {
                Some(text) => println!("{}", text),
                None => writer.write_warning(&format!("Could not retrieve logs for {}", log.job_key)),
            }
        }
        Ok(())
    }
}
