//
//  pampu
//  main.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use pampu::cli::{Cli, Commands};
use pampu::exit_codes;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    init_logging();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Execute command
    let result = run(cli).await;

    // Handle result and exit
    match result {
        Ok(()) => std::process::exit(exit_codes::SUCCESS),
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(exit_codes::for_error(&e));
        }
    }
}

/// Initialize logging based on environment
fn init_logging() {
    let filter = EnvFilter::try_from_env("PAMPU_DEBUG").unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Main command dispatcher
async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Init(cmd) => cmd.run(&cli.global).await,
        Commands::Projects(cmd) => cmd.run(&cli.global).await,
        Commands::Plans(cmd) => cmd.run(&cli.global).await,
        Commands::Branches(cmd) => cmd.run(&cli.global).await,
        Commands::Builds(cmd) => cmd.run(&cli.global).await,
        Commands::Status(cmd) => cmd.run(&cli.global).await,
        Commands::Logs(cmd) => cmd.run(&cli.global).await,
        Commands::Deploys(cmd) => cmd.run(&cli.global).await,
        Commands::Timeline(cmd) => cmd.run(&cli.global).await,
        Commands::Versions(cmd) => cmd.run(&cli.global).await,
        Commands::VersionCreate(cmd) => cmd.run(&cli.global).await,
        Commands::Deploy(cmd) => cmd.run(&cli.global).await,
        Commands::Config(cmd) => cmd.run(&cli.global).await,
        Commands::Completion(cmd) => cmd.run(&cli.global).await,
    }
}
