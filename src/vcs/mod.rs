//! Version control abstraction layer
//!
//! Committing and tagging go through the [Vcs] trait so the bump flow does
//! not care which system manages the working directory. The concrete
//! implementations are:
//!
//! - [git::GitVcs]: Git repositories, driven through the `git2` crate
//! - [mercurial::MercurialVcs]: Mercurial repositories, driven through the `hg` binary
//! - [mock::MockVcs]: A recording implementation for testing
//!
//! [discover] picks the first usable implementation, trying Git before
//! Mercurial.

pub mod git;
pub mod mercurial;
pub mod mock;

pub use git::GitVcs;
pub use mercurial::MercurialVcs;
pub use mock::MockVcs;

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::Result;
use crate::template::Context;

/// What the most recent `v*` tag says about the working directory.
///
/// Every field is empty when the VCS has no such tag or cannot describe it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TagInfo {
    /// Version named by the latest tag, without its `v` prefix
    pub current_version: Option<String>,
    /// Commits made since the latest tag
    pub distance_to_latest_tag: Option<u32>,
    pub commit_sha: Option<String>,
    /// Whether the working directory has uncommitted changes
    pub dirty: bool,
}

impl TagInfo {
    /// Parses long-format describe output such as `v1.2.3-4-gdeadbeef-dirty`.
    ///
    /// # Returns
    /// * `Some(TagInfo)` - If the output has the tag, distance and sha fields
    /// * `None` - If the output is not in long format
    pub fn parse_describe(output: &str) -> Option<TagInfo> {
        let mut fields: Vec<&str> = output.trim().split('-').collect();

        let dirty = fields.last() == Some(&"dirty");
        if dirty {
            fields.pop();
        }

        let sha = fields.pop()?;
        let distance = fields.pop()?.parse::<u32>().ok()?;
        if fields.is_empty() {
            return None;
        }

        let tag = fields.join("-");
        Some(TagInfo {
            current_version: Some(tag.trim_start_matches('v').to_string()),
            distance_to_latest_tag: Some(distance),
            commit_sha: Some(sha.strip_prefix('g').unwrap_or(sha).to_string()),
            dirty,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.current_version.is_none()
            && self.distance_to_latest_tag.is_none()
            && self.commit_sha.is_none()
            && !self.dirty
    }

    /// Makes `distance_to_latest_tag`, `commit_sha` and `dirty` available to templates.
    pub fn extend_context(&self, context: &mut Context) {
        if let Some(distance) = self.distance_to_latest_tag {
            context.insert("distance_to_latest_tag", distance.to_string());
        }
        if let Some(sha) = &self.commit_sha {
            context.insert("commit_sha", sha.as_str());
        }
        context.insert("dirty", self.dirty.to_string());
    }
}

/// Operations a bump needs from a version control system.
///
/// ## Error Handling
///
/// Failing commands surface as [crate::error::BumpvError::VcsCommand] carrying
/// the command and its output. A dirty tree is reported as
/// [crate::error::BumpvError::WorkingDirectoryIsDirty].
pub trait Vcs: Send + Sync {
    /// Short name used in log messages, e.g. "Git"
    fn name(&self) -> &'static str;

    /// Whether the working directory is managed by this VCS
    fn is_usable(&self) -> bool;

    /// Fails when tracked files have uncommitted changes.
    ///
    /// Untracked files are ignored.
    fn assert_nondirty(&self) -> Result<()>;

    /// Stages `paths` for the next commit. Untracked paths are skipped.
    fn add_path(&self, paths: &[PathBuf]) -> Result<()>;

    /// Commits staged changes with `message`; only logs when `dry_run` is set.
    fn commit(&self, message: &str, dry_run: bool) -> Result<()>;

    /// Tags the current revision as `name`.
    fn tag(&self, name: &str) -> Result<()>;

    /// Describes the latest `v*` tag; empty when there is none.
    fn latest_tag_info(&self) -> Result<TagInfo>;
}

/// Returns the first usable VCS for `dir`, trying Git then Mercurial.
pub fn discover(dir: &Path) -> Option<Box<dyn Vcs>> {
    let candidates: Vec<Box<dyn Vcs>> = vec![
        Box::new(GitVcs::new(dir)),
        Box::new(MercurialVcs::new(dir)),
    ];

    let found = candidates.into_iter().find(|vcs| vcs.is_usable());
    match &found {
        Some(vcs) => tracing::debug!("Using {} for {}", vcs.name(), dir.display()),
        None => tracing::debug!("No version control found for {}", dir.display()),
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_describe_clean() {
        let info = TagInfo::parse_describe("v1.2.3-4-gdeadbeef").unwrap();
        assert_eq!(info.current_version.as_deref(), Some("1.2.3"));
        assert_eq!(info.distance_to_latest_tag, Some(4));
        assert_eq!(info.commit_sha.as_deref(), Some("deadbeef"));
        assert!(!info.dirty);
    }

    #[test]
    fn test_parse_describe_dirty() {
        let info = TagInfo::parse_describe("v0.9.0-0-g0123abc-dirty\n").unwrap();
        assert_eq!(info.current_version.as_deref(), Some("0.9.0"));
        assert_eq!(info.distance_to_latest_tag, Some(0));
        assert!(info.dirty);
    }

    #[test]
    fn test_parse_describe_tag_with_dashes() {
        let info = TagInfo::parse_describe("v1.0.0-rc-1-12-gabc").unwrap();
        assert_eq!(info.current_version.as_deref(), Some("1.0.0-rc-1"));
        assert_eq!(info.distance_to_latest_tag, Some(12));
    }

    #[test]
    fn test_parse_describe_rejects_short_output() {
        assert_eq!(TagInfo::parse_describe("deadbeef"), None);
        assert_eq!(TagInfo::parse_describe(""), None);
    }

    #[test]
    fn test_extend_context() {
        let info = TagInfo::parse_describe("v1.2.3-4-gdeadbeef").unwrap();
        let mut ctx = Context::new();
        info.extend_context(&mut ctx);
        assert!(ctx.contains_key("distance_to_latest_tag"));
        assert!(ctx.contains_key("commit_sha"));
        assert!(ctx.contains_key("dirty"));
    }

    #[test]
    fn test_empty_tag_info() {
        assert!(TagInfo::default().is_empty());
        assert!(!TagInfo::parse_describe("v1-1-gabc").unwrap().is_empty());
    }

    #[test]
    fn test_discover_prefers_git() {
        let dir = tempfile::TempDir::new().unwrap();
        git2::Repository::init(dir.path()).unwrap();

        let vcs = discover(dir.path()).unwrap();
        assert_eq!(vcs.name(), "Git");
    }
}
