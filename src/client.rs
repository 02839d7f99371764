//! Bump workflow orchestration
//!
//! [BumpClient] ties the pieces together: it reads the current version,
//! bumps it, rewrites every target file, records the new version in the
//! configuration and optionally commits and tags the result.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::config::{Configuration, GLOBAL_SECTION};
use crate::domain::{Version, VersionConfig};
use crate::error::{BumpvError, Result};
use crate::template::{self, Context};
use crate::updater::{ConfiguredFile, FileChange, FileUpdater};
use crate::vcs::{self, TagInfo, Vcs};

/// Options for a single bump
///
/// Mirrors the CLI flags; `None` means "use the configuration file".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BumpOptions {
    /// Compute and report everything without touching files or the VCS
    pub dry_run: bool,

    /// Skip the clean working directory check
    pub allow_dirty: bool,

    pub commit: Option<bool>,

    pub tag: Option<bool>,

    /// Version to bump from instead of the configured one
    pub current_version: Option<String>,

    /// Version to write instead of bumping a part
    pub new_version: Option<String>,

    pub tag_name: Option<String>,

    pub message: Option<String>,
}

/// Progress of a bump, advanced as each step completes.
///
/// After a failure the client stays at the last stage it reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BumpStage {
    Idle,
    VersionParsed,
    VersionBumped,
    FilesValidated,
    FilesWritten,
    VcsStaged,
    VcsCommitted,
    VcsTagged,
    Done,
}

impl fmt::Display for BumpStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BumpStage::Idle => "idle",
            BumpStage::VersionParsed => "version parsed",
            BumpStage::VersionBumped => "version bumped",
            BumpStage::FilesValidated => "files validated",
            BumpStage::FilesWritten => "files written",
            BumpStage::VcsStaged => "changes staged",
            BumpStage::VcsCommitted => "changes committed",
            BumpStage::VcsTagged => "revision tagged",
            BumpStage::Done => "done",
        };
        write!(f, "{}", name)
    }
}

/// How a [BumpResult] is printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

/// Result of a successful bump
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BumpResult {
    pub old_version: String,

    pub new_version: String,

    /// Tag created, or that would be created on a dry run
    pub tag: Option<String>,
}

impl BumpResult {
    pub fn render(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Json => serde_json::to_string_pretty(self)
                .map_err(|e| BumpvError::output(format!("cannot render JSON: {}", e))),
            OutputFormat::Yaml => serde_yaml::to_string(self)
                .map_err(|e| BumpvError::output(format!("cannot render YAML: {}", e))),
        }
    }
}

/// Runs bumps against one configuration file and, when present, the VCS
/// managing its directory.
pub struct BumpClient {
    config: Configuration,
    options: BumpOptions,
    vcs: Option<Box<dyn Vcs>>,
    stage: BumpStage,
}

fn advance(stage: &mut BumpStage, next: BumpStage) {
    tracing::debug!("Bump stage: {} -> {}", stage, next);
    *stage = next;
}

impl BumpClient {
    /// Creates a client, using whichever VCS manages the configuration
    /// file's directory.
    ///
    /// # Returns
    /// * `Err(BumpvError::WorkingDirectoryIsDirty)` - If the working directory
    ///   has uncommitted changes and dirty trees are not allowed
    pub fn new(config: Configuration, options: BumpOptions) -> Result<Self> {
        let vcs = vcs::discover(config.dir());
        Self::with_vcs(config, options, vcs)
    }

    /// Creates a client with an explicit VCS, or none.
    pub fn with_vcs(
        config: Configuration,
        options: BumpOptions,
        vcs: Option<Box<dyn Vcs>>,
    ) -> Result<Self> {
        let allow_dirty = options.allow_dirty || config.allow_dirty();
        if let Some(vcs) = &vcs {
            if allow_dirty {
                tracing::debug!("Skipping {} working directory check", vcs.name());
            } else {
                vcs.assert_nondirty()?;
            }
        }

        Ok(BumpClient {
            config,
            options,
            vcs,
            stage: BumpStage::Idle,
        })
    }

    pub fn stage(&self) -> BumpStage {
        self.stage
    }

    pub fn configuration(&self) -> &Configuration {
        &self.config
    }

    /// Bumps `part` and applies the new version everywhere.
    ///
    /// Every target file is checked before any is written. Files that were
    /// written stay written if a later VCS step fails.
    ///
    /// # Arguments
    /// * `part` - Name of the part to bump; ignored when an explicit new
    ///   version is set in the options
    ///
    /// # Returns
    /// * `Ok(BumpResult)` - Old and new version and the tag name, if tagging
    /// * `Err` - The first failing step's error
    pub fn bump(&mut self, part: &str) -> Result<BumpResult> {
        self.stage = BumpStage::Idle;
        let dry_run = self.options.dry_run;
        if dry_run {
            tracing::info!("Dry run active, won't touch any files.");
        }

        let tag_info = match &self.vcs {
            Some(vcs) => vcs.latest_tag_info()?,
            None => TagInfo::default(),
        };
        let mut context = Context::new().with_time().with_environment();
        tag_info.extend_context(&mut context);

        let version_config = self.config.version_config()?;
        let current_string = self.current_version_string(&tag_info)?;
        let current = version_config.parse(&current_string)?;
        advance(&mut self.stage, BumpStage::VersionParsed);

        let new = match &self.options.new_version {
            Some(explicit) => version_config.parse(explicit)?,
            None => {
                tracing::info!("Attempting to increment part '{}'", part);
                current.bump(part, &version_config.order())?
            }
        };
        let new_string = version_config.serialize(&new, &context)?;
        if !version_config.round_trips(&new_string, &new) {
            tracing::warn!(
                "New version '{}' does not parse back to {} with '{}'",
                new_string,
                new,
                version_config.parse_pattern()
            );
        }
        tracing::info!("New version will be '{}'", new_string);
        advance(&mut self.stage, BumpStage::VersionBumped);

        let updater = self.file_updater(&version_config)?;
        updater.validate(&current, &context)?;
        advance(&mut self.stage, BumpStage::FilesValidated);

        let changes = updater.replace(&current, &new, &context, dry_run)?;
        self.persist(&new_string)?;
        advance(&mut self.stage, BumpStage::FilesWritten);

        let vcs_context = vcs_context(&context, &current, &new, &current_string, &new_string);
        let tag_name = self.vcs_steps(&changes, &vcs_context)?;
        advance(&mut self.stage, BumpStage::Done);

        Ok(BumpResult {
            old_version: current_string,
            new_version: new_string,
            tag: tag_name,
        })
    }

    fn current_version_string(&self, tag_info: &TagInfo) -> Result<String> {
        if let Some(explicit) = &self.options.current_version {
            return Ok(explicit.clone());
        }
        if let Some(configured) = self.config.current_version() {
            return Ok(configured.to_string());
        }
        if let Some(tagged) = &tag_info.current_version {
            tracing::info!("Using current version '{}' from the latest tag", tagged);
            return Ok(tagged.clone());
        }
        Err(BumpvError::config(format!(
            "no current version: set current_version in [{}] of {}, pass --current-version or tag a release",
            GLOBAL_SECTION,
            self.config.path().display()
        )))
    }

    fn file_updater(&self, version_config: &VersionConfig) -> Result<FileUpdater> {
        let files = self
            .config
            .files()
            .into_iter()
            .map(|path| {
                let file_config = self.config.file_version_config(&path, version_config)?;
                Ok(ConfiguredFile::new(path, file_config))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(FileUpdater::new(files))
    }

    fn persist(&mut self, new_version: &str) -> Result<()> {
        if self.options.dry_run {
            tracing::info!(
                "Would write new version '{}' to {}",
                new_version,
                self.config.path().display()
            );
            return Ok(());
        }
        self.config
            .set_value(GLOBAL_SECTION, "current_version", new_version)?;
        self.config.write()
    }

    /// Commits and tags as configured; returns the tag name when tagging.
    fn vcs_steps(
        &mut self,
        changes: &[FileChange],
        context: &Context,
    ) -> Result<Option<String>> {
        let dry_run = self.options.dry_run;
        let commit = self.options.commit.unwrap_or(self.config.commit());
        let tag = self.options.tag.unwrap_or(self.config.tag());

        let Some(vcs) = &self.vcs else {
            if commit || tag {
                tracing::warn!("No version control system found, skipping commit and tag");
            }
            return Ok(None);
        };

        if commit {
            let mut paths: Vec<PathBuf> = changes
                .iter()
                .filter(|c| c.changed)
                .map(|c| c.path.clone())
                .collect();
            paths.push(self.config.path().to_path_buf());

            if dry_run {
                tracing::info!("Would add {} changed file(s) to {}", paths.len() - 1, vcs.name());
            } else {
                vcs.add_path(&paths)?;
                advance(&mut self.stage, BumpStage::VcsStaged);
            }

            let message_template = self
                .options
                .message
                .as_deref()
                .unwrap_or(self.config.message());
            let message = template::render(message_template, context)?;
            vcs.commit(&message, dry_run)?;
            if !dry_run {
                advance(&mut self.stage, BumpStage::VcsCommitted);
            }
        }

        if !tag {
            return Ok(None);
        }

        let tag_template = self
            .options
            .tag_name
            .as_deref()
            .unwrap_or(self.config.tag_name());
        let name = template::render(tag_template, context)?;
        if dry_run {
            tracing::info!("Would tag '{}' in {}", name, vcs.name());
        } else {
            vcs.tag(&name)?;
            advance(&mut self.stage, BumpStage::VcsTagged);
        }
        Ok(Some(name))
    }
}

/// Context for commit messages and tag names: the shared context plus both
/// versions and their parts as `current_<part>` and `new_<part>`.
fn vcs_context(
    context: &Context,
    current: &Version,
    new: &Version,
    current_string: &str,
    new_string: &str,
) -> Context {
    let mut values = context.clone();
    for part in current.iter() {
        values.insert(format!("current_{}", part.name()), part.value());
    }
    for part in new.iter() {
        values.insert(format!("new_{}", part.name()), part.value());
    }
    values.insert("current_version", current_string);
    values.insert("new_version", new_string);
    values
}
