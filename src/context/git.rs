//
//  pampu
//  context/git.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Git Repository Operations
//!
//! Reads the checked-out branch of the working repository with `git2`, so
//! commands like `pampu status` can find the matching Bamboo plan branch.
//! The history helpers place deployed revisions on the local commit graph
//! for `pampu timeline` and the `--sha` listings.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use pampu::context::GitContext;
//!
//! if let Ok(git) = GitContext::open() {
//!     println!("Current branch: {}", git.current_branch()?);
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ## Notes
//!
//! - `open` walks up from the current directory to find the repository
//! - A detached HEAD reports the branch name `HEAD`
//! - Revisions missing from the local clone resolve to `None`; nothing is
//!   fetched

use std::path::Path;

use anyhow::{Context, Result};
use git2::{BranchType, Commit, Oid, Repository, Sort};

/// A commit as listed by `timeline` and the `--sha` views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    pub id: Oid,
    pub short_sha: String,
    pub author: String,
    /// Committer time in epoch milliseconds
    pub timestamp_ms: i64,
    pub subject: String,
}

impl CommitInfo {
    fn from_commit(commit: &Commit<'_>) -> Self {
        let short_sha = commit
            .as_object()
            .short_id()
            .ok()
            .and_then(|buf| buf.as_str().map(str::to_string))
            .unwrap_or_else(|| commit.id().to_string().chars().take(7).collect());
        Self {
            id: commit.id(),
            short_sha,
            author: commit.author().name().unwrap_or("").to_string(),
            timestamp_ms: commit.time().seconds() * 1000,
            subject: commit.summary().unwrap_or("").to_string(),
        }
    }
}

pub struct GitContext {
    repo: Repository,
}

impl GitContext {
    /// Opens the repository containing the current directory.
    pub fn open() -> Result<Self> {
        let repo = Repository::discover(".").context("Not in a git repository")?;
        Ok(Self { repo })
    }

    /// Opens the repository containing `path`.
    pub fn open_at(path: &Path) -> Result<Self> {
        let repo = Repository::discover(path).context("Not in a git repository")?;
        Ok(Self { repo })
    }

    /// Returns the short name of the checked-out branch.
    pub fn current_branch(&self) -> Result<String> {
        let head = self
            .repo
            .head()
            .context("Could not read HEAD (repository has no commits?)")?;
        let name = head.shorthand().unwrap_or("HEAD");
        Ok(name.to_string())
    }

    /// Resolves a revision (full or abbreviated SHA, `origin/main`, ...) to
    /// a commit id.
    pub fn resolve(&self, rev: &str) -> Option<Oid> {
        let object = self.repo.revparse_single(rev).ok()?;
        object.peel_to_commit().ok().map(|commit| commit.id())
    }

    /// Looks up a commit, or `None` if it is not in the local clone.
    pub fn commit_info(&self, rev: &str) -> Option<CommitInfo> {
        let object = self.repo.revparse_single(rev).ok()?;
        let commit = object.peel_to_commit().ok()?;
        Some(CommitInfo::from_commit(&commit))
    }

    /// Returns `true` if `ancestor` is `descendant` or reachable from it.
    pub fn is_ancestor(&self, ancestor: Oid, descendant: Oid) -> bool {
        ancestor == descendant
            || self
                .repo
                .graph_descendant_of(descendant, ancestor)
                .unwrap_or(false)
    }

    /// Returns the common ancestor of `ids`.
    ///
    /// For commits on one line of history this is the oldest of them.
    pub fn merge_base(&self, ids: &[Oid]) -> Option<Oid> {
        match ids {
            [] => None,
            [only] => Some(*only),
            _ => self.repo.merge_base_many(ids).ok(),
        }
    }

    /// Lists the first-parent history from `from` (inclusive) to `to`,
    /// oldest first.
    pub fn first_parent_log(&self, from: Oid, to: &str) -> Result<Vec<CommitInfo>> {
        let tip = self
            .resolve(to)
            .with_context(|| format!("Unknown revision '{}'", to))?;
        let start = self.repo.find_commit(from)?;

        let mut walk = self.repo.revwalk()?;
        walk.push(tip)?;
        for parent in start.parent_ids() {
            walk.hide(parent)?;
        }
        walk.simplify_first_parent()?;
        walk.set_sorting(Sort::TOPOLOGICAL | Sort::REVERSE)?;

        walk.map(|id| -> Result<CommitInfo> {
            let commit = self.repo.find_commit(id?)?;
            Ok(CommitInfo::from_commit(&commit))
        })
        .collect()
    }

    /// Names of the remote-tracking branches containing `id`, without the
    /// remote prefix (`origin/feature/x` becomes `feature/x`).
    pub fn remote_branches_containing(&self, id: Oid) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for branch in self.repo.branches(Some(BranchType::Remote))? {
            let (branch, _) = branch?;
            // Symbolic refs such as origin/HEAD have no direct target
            let Some(tip) = branch.get().target() else {
                continue;
            };
            if !self.is_ancestor(id, tip) {
                continue;
            }
            if let Some(name) = branch.name()? {
                let short = name.split_once('/').map(|(_, rest)| rest).unwrap_or(name);
                names.push(short.to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}

/// Commit graph builders shared by the history tests.
#[cfg(test)]
pub(crate) mod fixtures {
    use git2::{Commit, Oid, Repository, Signature};

    /// Writes an empty-tree commit with the given parents, without moving
    /// any ref.
    pub(crate) fn commit(repo: &Repository, parents: &[Oid], message: &str) -> Oid {
        let sig = Signature::now("Ada Lovelace", "ada@example.com").unwrap();
        let tree_id = repo.index().unwrap().write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let parents: Vec<Commit<'_>> = parents
            .iter()
            .map(|id| repo.find_commit(*id).unwrap())
            .collect();
        let parent_refs: Vec<&Commit<'_>> = parents.iter().collect();
        repo.commit(None, &sig, &sig, message, &tree, &parent_refs)
            .unwrap()
    }

    /// Points `refs/remotes/origin/{name}` at `id`.
    pub(crate) fn remote_branch(repo: &Repository, name: &str, id: Oid) {
        repo.reference(&format!("refs/remotes/origin/{}", name), id, true, "test")
            .unwrap();
    }
}
