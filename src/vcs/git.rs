use crate::error::{BumpvError, Result};
use crate::vcs::{TagInfo, Vcs};
use git2::{
    DescribeFormatOptions, DescribeOptions, Repository, Status, StatusOptions,
};
use std::path::{Path, PathBuf};

/// Git support through `git2`.
///
/// The repository is discovered from `dir` on every call, so the value can
/// be created before the directory is a repository.
pub struct GitVcs {
    dir: PathBuf,
}

impl GitVcs {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        GitVcs {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn repo(&self, command: &str) -> Result<Repository> {
        Repository::discover(&self.dir).map_err(|e| git_error(command, e))
    }
}

fn git_error(command: &str, err: git2::Error) -> BumpvError {
    BumpvError::vcs(command, err.message())
}

fn status_marker(status: Status) -> &'static str {
    if status.intersects(Status::INDEX_NEW) {
        "A"
    } else if status.intersects(Status::INDEX_DELETED | Status::WT_DELETED) {
        "D"
    } else if status.intersects(Status::INDEX_RENAMED | Status::WT_RENAMED) {
        "R"
    } else {
        "M"
    }
}

impl Vcs for GitVcs {
    fn name(&self) -> &'static str {
        "Git"
    }

    fn is_usable(&self) -> bool {
        Repository::discover(&self.dir).is_ok()
    }

    fn assert_nondirty(&self) -> Result<()> {
        let command = "git status --porcelain --untracked-files=no";
        let repo = self.repo(command)?;

        let mut options = StatusOptions::new();
        options.include_untracked(false).include_ignored(false);
        let statuses = repo
            .statuses(Some(&mut options))
            .map_err(|e| git_error(command, e))?;

        let changes: Vec<String> = statuses
            .iter()
            .filter(|entry| entry.status() != Status::CURRENT && !entry.status().is_ignored())
            .map(|entry| {
                format!(
                    "{} {}",
                    status_marker(entry.status()),
                    entry.path().unwrap_or("<non-utf8 path>")
                )
            })
            .collect();

        if changes.is_empty() {
            Ok(())
        } else {
            Err(BumpvError::WorkingDirectoryIsDirty(format!(
                "Git working directory is not clean:\n{}",
                changes.join("\n")
            )))
        }
    }

    fn add_path(&self, paths: &[PathBuf]) -> Result<()> {
        let command = "git add --update";
        let repo = self.repo(command)?;
        let workdir = repo
            .workdir()
            .ok_or_else(|| BumpvError::vcs(command, "repository has no working directory"))?
            .canonicalize()?;

        let mut index = repo.index().map_err(|e| git_error(command, e))?;
        for path in paths {
            let absolute = path.canonicalize()?;
            let relative = absolute.strip_prefix(&workdir).map_err(|_| {
                BumpvError::vcs(
                    command,
                    format!("{} is outside the repository", path.display()),
                )
            })?;

            // --update semantics: only files git already tracks
            if index.get_path(relative, 0).is_none() {
                tracing::debug!("Not staging untracked file {}", relative.display());
                continue;
            }
            index.add_path(relative).map_err(|e| git_error(command, e))?;
        }
        index.write().map_err(|e| git_error(command, e))?;
        Ok(())
    }

    fn commit(&self, message: &str, dry_run: bool) -> Result<()> {
        if dry_run {
            tracing::info!("Would commit to Git with message '{}'", message);
            return Ok(());
        }

        let command = "git commit";
        let repo = self.repo(command)?;
        let mut index = repo.index().map_err(|e| git_error(command, e))?;
        let tree_id = index.write_tree().map_err(|e| git_error(command, e))?;
        let parent = repo.head().ok().and_then(|head| head.peel_to_commit().ok());
        if parent.as_ref().map(|p| p.tree_id()) == Some(tree_id) {
            return Err(BumpvError::vcs(command, "nothing to commit, working tree clean"));
        }

        let tree = repo.find_tree(tree_id).map_err(|e| git_error(command, e))?;
        let signature = repo.signature().map_err(|e| git_error(command, e))?;
        let parents: Vec<&git2::Commit> = parent.iter().collect();

        let oid = repo
            .commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)
            .map_err(|e| git_error(command, e))?;
        tracing::info!("Committed {} to Git with message '{}'", oid, message);
        Ok(())
    }

    fn tag(&self, name: &str) -> Result<()> {
        let command = format!("git tag {}", name);
        let repo = self.repo(&command)?;
        let head = repo
            .head()
            .and_then(|head| head.peel_to_commit())
            .map_err(|e| git_error(&command, e))?;

        repo.tag_lightweight(name, head.as_object(), false)
            .map_err(|e| git_error(&command, e))?;
        tracing::info!("Tagged {} as '{}'", head.id(), name);
        Ok(())
    }

    fn latest_tag_info(&self) -> Result<TagInfo> {
        let command = "git describe --tags --long --abbrev=40 --match=v* --dirty";
        let repo = self.repo(command)?;

        let mut options = DescribeOptions::new();
        options.describe_tags().pattern("v*");
        let describe = match repo.describe(&options) {
            Ok(describe) => describe,
            Err(e) => {
                tracing::debug!("No tag information: {}", e.message());
                return Ok(TagInfo::default());
            }
        };

        let mut format = DescribeFormatOptions::new();
        format
            .always_use_long_format(true)
            .abbreviated_size(40)
            .dirty_suffix("-dirty");
        let output = describe
            .format(Some(&format))
            .map_err(|e| git_error(command, e))?;

        Ok(TagInfo::parse_describe(&output).unwrap_or_default())
    }
}
