use crate::error::{BumpvError, Result};
use crate::vcs::{TagInfo, Vcs};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// A call recorded by [MockVcs]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VcsCall {
    AddPath(Vec<PathBuf>),
    Commit { message: String, dry_run: bool },
    Tag(String),
}

/// Mock VCS for testing without a real repository
///
/// Clones share the call log, so a test can keep one handle while the
/// client owns another.
#[derive(Debug, Clone, Default)]
pub struct MockVcs {
    calls: Arc<Mutex<Vec<VcsCall>>>,
    dirty: bool,
    tag_info: TagInfo,
    commit_failure: Option<String>,
}

impl MockVcs {
    /// Create a clean mock with no tags
    pub fn new() -> Self {
        Self::default()
    }

    /// Report uncommitted changes from `assert_nondirty`
    pub fn dirty(mut self) -> Self {
        self.dirty = true;
        self
    }

    /// Return `info` from `latest_tag_info`
    pub fn with_tag_info(mut self, info: TagInfo) -> Self {
        self.tag_info = info;
        self
    }

    /// Make `commit` fail with `output`
    pub fn failing_commit(mut self, output: impl Into<String>) -> Self {
        self.commit_failure = Some(output.into());
        self
    }

    /// Calls recorded so far, oldest first
    pub fn calls(&self) -> Vec<VcsCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, call: VcsCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

impl Vcs for MockVcs {
    fn name(&self) -> &'static str {
        "Mock"
    }

    fn is_usable(&self) -> bool {
        true
    }

    fn assert_nondirty(&self) -> Result<()> {
        if self.dirty {
            return Err(BumpvError::WorkingDirectoryIsDirty(
                "Mock working directory is not clean:\nM VERSION".to_string(),
            ));
        }
        Ok(())
    }

    fn add_path(&self, paths: &[PathBuf]) -> Result<()> {
        self.record(VcsCall::AddPath(paths.to_vec()));
        Ok(())
    }

    fn commit(&self, message: &str, dry_run: bool) -> Result<()> {
        if let Some(output) = &self.commit_failure {
            return Err(BumpvError::vcs("mock commit", output.clone()));
        }
        self.record(VcsCall::Commit {
            message: message.to_string(),
            dry_run,
        });
        Ok(())
    }

    fn tag(&self, name: &str) -> Result<()> {
        self.record(VcsCall::Tag(name.to_string()));
        Ok(())
    }

    fn latest_tag_info(&self) -> Result<TagInfo> {
        Ok(self.tag_info.clone())
    }
}
