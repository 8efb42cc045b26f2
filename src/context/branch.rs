//
//  pampu
//  context/branch.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Branch Matching
//!
//! Correlates a git branch with a Bamboo plan branch through the ticket
//! number both names carry.
//!
//! ## Overview
//!
//! Bamboo creates plan branches from VCS branches, but their short names do not
//! always equal the git branch name (slashes are rewritten, names truncated).
//! What survives is the ticket identifier:
//!
//! ```text
//! git:    feature/PROJ-12345-fix-login
//! bamboo: feature-PROJ-12345-fix-lo...
//! ticket: PROJ-12345
//! ```
//!
//! ## Rules
//!
//! - The ticket is the leftmost match of `[A-Z]+-[0-9]+` in the git branch
//! - A candidate matches when its name contains the ticket as a substring,
//!   ignoring ASCII case (so `PROJ-1` also matches `PROJ-12`)
//! - The first matching candidate in input order wins
//! - `main` and `master` build on the plan itself
//!
//! Everything here is pure; absence is `None`, never an error.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

static TICKET_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Z]+-[0-9]+").unwrap());

/// Git branches that build on the plan itself rather than a plan branch.
pub const MAIN_BRANCHES: &[&str] = &["main", "master"];

/// One Bamboo plan branch, as used for matching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchRecord {
    /// Branch short name (`shortName`)
    pub name: String,

    /// Branch plan key, e.g. `PROJ-PLAN12`
    pub key: String,
}

impl BranchRecord {
    pub fn new(name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key: key.into(),
        }
    }
}

/// The plan or plan branch a git branch builds on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedBranch {
    /// Plan key or branch plan key
    pub key: String,

    /// Branch name used for version names (`master` for the plan itself)
    pub name: String,
}

/// Why a git branch could not be correlated with a plan branch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BranchLookupError {
    #[error("Could not extract ticket from branch '{branch}'")]
    NoTicket { branch: String },

    #[error("No Bamboo branch found matching '{ticket}'")]
    NoMatch { ticket: String },
}

/// Extracts the ticket identifier from a branch name.
///
/// # Example
///
/// ```rust
/// use pampu::context::extract_ticket;
///
/// assert_eq!(extract_ticket("feature/PROJ-12345-fix-x").as_deref(), Some("PROJ-12345"));
/// assert_eq!(extract_ticket("chore/bump-deps"), None);
/// ```
pub fn extract_ticket(branch_name: &str) -> Option<String> {
    TICKET_PATTERN
        .find(branch_name)
        .map(|m| m.as_str().to_string())
}

/// Returns `true` if `name` contains `ticket`, ignoring ASCII case.
pub fn contains_ticket(name: &str, ticket: &str) -> bool {
    if ticket.is_empty() {
        return false;
    }
    name.to_ascii_uppercase()
        .contains(&ticket.to_ascii_uppercase())
}

/// Returns the first candidate whose name carries `ticket`.
pub fn find_by_ticket<'a>(ticket: &str, candidates: &'a [BranchRecord]) -> Option<&'a BranchRecord> {
    candidates.iter().find(|c| contains_ticket(&c.name, ticket))
}

/// Finds the plan branch matching the ticket in `current_branch`.
///
/// # Returns
///
/// `None` when the branch carries no ticket or no candidate matches.
///
/// # Example
///
/// ```rust
/// use pampu::context::{find_match, BranchRecord};
///
/// let candidates = vec![
///     BranchRecord::new("release/PROJ-1-x", "PROJ-PLAN1"),
///     BranchRecord::new("release/PROJ-2-y", "PROJ-PLAN2"),
/// ];
/// let found = find_match("feature/PROJ-2-fix", &candidates);
/// assert_eq!(found.map(|b| b.key.as_str()), Some("PROJ-PLAN2"));
/// ```
pub fn find_match<'a>(current_branch: &str, candidates: &'a [BranchRecord]) -> Option<&'a BranchRecord> {
    let ticket = extract_ticket(current_branch)?;
    find_by_ticket(&ticket, candidates)
}

/// Returns `true` for branches that build on the plan itself.
pub fn is_main_branch(branch: &str) -> bool {
    MAIN_BRANCHES.contains(&branch)
}

/// Resolves the plan or plan branch key for a git branch.
///
/// `main`/`master` resolve to `plan_key` with the name `master`; any other
/// branch goes through ticket matching against `candidates`.
pub fn resolve_branch_key(
    current_branch: &str,
    plan_key: &str,
    candidates: &[BranchRecord],
) -> Result<ResolvedBranch, BranchLookupError> {
    if is_main_branch(current_branch) {
        return Ok(ResolvedBranch {
            key: plan_key.to_string(),
            name: "master".to_string(),
        });
    }

    let ticket = extract_ticket(current_branch).ok_or_else(|| BranchLookupError::NoTicket {
        branch: current_branch.to_string(),
    })?;

    find_by_ticket(&ticket, candidates)
        .map(|record| ResolvedBranch {
            key: record.key.clone(),
            name: record.name.clone(),
        })
        .ok_or(BranchLookupError::NoMatch { ticket })
}
