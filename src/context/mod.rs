//
//  pampu
//  context/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Repository Context
//!
//! Detects what the working repository tells us about Bamboo.
//!
//! ## Overview
//!
//! - [`git`]: the checked-out branch and commit history (via `git2`)
//! - [`spec`]: the default plan from `.pampu.toml` or Bamboo YAML specs
//! - [`branch`]: matching a git branch to a Bamboo plan branch by ticket
//! - [`resolver`]: choosing between an explicit plan argument and the
//!   discovered default
//!
//! ## Usage
//!
//! ```rust,no_run
//! use pampu::context::{find_match, BranchRecord, GitContext, PlanResolver};
//!
//! let plan = PlanResolver::discover().plan_key(None)?;
//! let branch = GitContext::open()?.current_branch()?;
//! let candidates = vec![BranchRecord::new("feature-PROJ-1-login", "PROJ-API1")];
//! if let Some(record) = find_match(&branch, &candidates) {
//!     println!("{} builds as {}", branch, record.key);
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```

mod branch;
mod git;
mod resolver;
mod spec;

pub use branch::*;
pub use git::*;
#[cfg(test)]
pub(crate) use git::fixtures;
pub use resolver::*;
pub use spec::*;
