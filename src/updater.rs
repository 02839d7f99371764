//! Rewriting the version inside target files.
//!
//! Every target is checked before anything is written, so a run that fails
//! validation leaves the whole tree untouched.

use std::fs;
use std::path::{Path, PathBuf};

use similar::TextDiff;

use crate::domain::{Version, VersionConfig};
use crate::error::{BumpvError, Result};
use crate::template::{self, Context};

/// Outcome of rewriting one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    pub path: PathBuf,
    pub changed: bool,
    /// Unified diff of the change, empty when nothing changed
    pub diff: String,
}

/// A target file together with the version config that applies to it.
#[derive(Debug, Clone)]
pub struct ConfiguredFile {
    path: PathBuf,
    version_config: VersionConfig,
}

impl ConfiguredFile {
    pub fn new(path: impl Into<PathBuf>, version_config: VersionConfig) -> Self {
        ConfiguredFile {
            path: path.into(),
            version_config,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn version_config(&self) -> &VersionConfig {
        &self.version_config
    }

    /// Checks that the file mentions `current`.
    ///
    /// The rendered search template is tried first, then the string the
    /// version was parsed from.
    ///
    /// # Returns
    /// * `Ok(())` - The version was found
    /// * `Err(BumpvError::InvalidTargetFile)` - If the file is missing or
    ///   mentions neither
    pub fn should_contain_version(&self, current: &Version, context: &Context) -> Result<()> {
        self.check_round_trip(current, context)?;
        let search = self.render_search(current, context)?;
        if self.contains(&search)? {
            return Ok(());
        }

        if let Some(original) = current.original() {
            if original != search && self.contains(original)? {
                return Ok(());
            }
        }

        Err(BumpvError::invalid_target(
            &self.path,
            format!("did not find '{}'", search),
        ))
    }

    /// Checks that this file's parse pattern reads its own serialization of
    /// `version` back into the same part values. Logs a warning otherwise.
    pub fn check_round_trip(&self, version: &Version, context: &Context) -> Result<bool> {
        let serialized = self.version_config.serialize(version, context)?;
        let ok = self.version_config.round_trips(&serialized, version);
        if !ok {
            tracing::warn!(
                "'{}' as written to {} does not parse back with '{}', set 'parse' for this file",
                serialized,
                self.path.display(),
                self.version_config.parse_pattern()
            );
        }
        Ok(ok)
    }

    /// Looks for `search` in the file, one window of lines at a time.
    ///
    /// The window is as tall as `search`. It matches when its first line
    /// contains the first search line, its last line contains the last
    /// search line and the lines in between are equal.
    pub fn contains(&self, search: &str) -> Result<bool> {
        let content = self.read()?;
        let needle: Vec<&str> = search.lines().collect();
        let Some((first, last)) = needle.first().zip(needle.last()) else {
            return Ok(true);
        };

        let lines: Vec<&str> = content.lines().collect();
        for (start, window) in lines.windows(needle.len()).enumerate() {
            let inner = needle.len().saturating_sub(1);
            let matched = window[0].contains(first)
                && window[window.len() - 1].contains(last)
                && (needle.len() < 3 || window[1..inner] == needle[1..inner]);

            if matched {
                tracing::info!(
                    "Found '{}' in {} at line {}: {}",
                    search,
                    self.path.display(),
                    start,
                    window[0]
                );
                return Ok(true);
            }
        }

        Ok(false)
    }

    /// Replaces the current version with the new one.
    ///
    /// The rendered search text is replaced literally. If that leaves the
    /// file unchanged, the string `current` was parsed from is replaced
    /// instead.
    pub fn replace(
        &self,
        current: &Version,
        new: &Version,
        context: &Context,
        dry_run: bool,
    ) -> Result<FileChange> {
        let content = self.read()?;

        let mut values = context.clone();
        values.insert("current_version", self.version_config.serialize(current, context)?);
        values.insert("new_version", self.version_config.serialize(new, context)?);

        let search_for = template::render(self.version_config.search(), &values)?;
        let replace_with = template::render(self.version_config.replace(), &values)?;

        let mut updated = content.replace(&search_for, &replace_with);
        if updated == content {
            if let Some(original) = current.original() {
                updated = content.replace(original, &replace_with);
            }
        }

        let changed = updated != content;
        let diff = if changed {
            unified_diff(&self.path, &content, &updated)
        } else {
            String::new()
        };

        if changed {
            tracing::info!(
                "{} file {}:",
                if dry_run { "Would change" } else { "Changing" },
                self.path.display()
            );
            tracing::info!("\n{}", diff);
            if !dry_run {
                fs::write(&self.path, &updated)?;
            }
        } else {
            tracing::info!(
                "{} file {}",
                if dry_run { "Would not change" } else { "Not changing" },
                self.path.display()
            );
        }

        Ok(FileChange {
            path: self.path.clone(),
            changed,
            diff,
        })
    }

    fn render_search(&self, current: &Version, context: &Context) -> Result<String> {
        let mut values = context.clone();
        values.insert("current_version", self.version_config.serialize(current, context)?);
        template::render(self.version_config.search(), &values)
    }

    fn read(&self) -> Result<String> {
        if !self.path.is_file() {
            return Err(BumpvError::invalid_target(&self.path, "file does not exist"));
        }
        Ok(fs::read_to_string(&self.path)?)
    }
}

fn unified_diff(path: &Path, old: &str, new: &str) -> String {
    let name = path.display().to_string();
    let diff = TextDiff::from_lines(old, new);
    let mut unified = diff.unified_diff();
    unified.header(&format!("a/{}", name), &format!("b/{}", name));
    unified.to_string()
}

/// The set of files a bump rewrites.
#[derive(Debug, Clone, Default)]
pub struct FileUpdater {
    files: Vec<ConfiguredFile>,
}

impl FileUpdater {
    pub fn new(files: Vec<ConfiguredFile>) -> Self {
        FileUpdater { files }
    }

    pub fn files(&self) -> &[ConfiguredFile] {
        &self.files
    }

    /// Checks every file; stops at the first one missing the version.
    pub fn validate(&self, current: &Version, context: &Context) -> Result<()> {
        for file in &self.files {
            file.should_contain_version(current, context)?;
        }
        Ok(())
    }

    /// Rewrites every file.
    ///
    /// Callers run [`FileUpdater::validate`] first; this pass assumes every
    /// file already contains the version.
    pub fn replace(
        &self,
        current: &Version,
        new: &Version,
        context: &Context,
        dry_run: bool,
    ) -> Result<Vec<FileChange>> {
        self.files
            .iter()
            .map(|file| file.replace(current, new, context, dry_run))
            .collect()
    }
}
