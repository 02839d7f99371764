use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use toml_edit::{value, DocumentMut, Item};

use crate::domain::{PartConfig, VersionConfig};
use crate::error::{BumpvError, Result};

/// File looked up in the working directory when no `--config-file` is given.
pub const DEFAULT_CONFIG_FILE: &str = ".bumpv.toml";

/// Name of the table holding the global settings.
pub const GLOBAL_SECTION: &str = "bumpv";

pub const DEFAULT_PARSE: &str = r"(?P<major>\d+)\.(?P<minor>\d+)\.(?P<patch>\d+)";
pub const DEFAULT_SERIALIZE: &str = "{major}.{minor}.{patch}";
pub const DEFAULT_SEARCH: &str = "{current_version}";
pub const DEFAULT_REPLACE: &str = "{new_version}";
pub const DEFAULT_TAG_NAME: &str = "v{new_version}";
pub const DEFAULT_MESSAGE: &str = "Bump version: {current_version} → {new_version}";

/// A setting that accepts either a single string or a list of strings.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::One(s) => vec![s],
            OneOrMany::Many(v) => v,
        }
    }
}

/// Global settings from the `[bumpv]` table.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct GlobalSection {
    #[serde(default)]
    pub current_version: Option<String>,

    #[serde(default)]
    pub parse: Option<String>,

    #[serde(default)]
    pub serialize: Option<OneOrMany>,

    #[serde(default)]
    pub search: Option<String>,

    #[serde(default)]
    pub replace: Option<String>,

    #[serde(default)]
    pub tag_name: Option<String>,

    #[serde(default)]
    pub message: Option<String>,

    #[serde(default)]
    pub commit: bool,

    #[serde(default)]
    pub tag: bool,

    #[serde(default)]
    pub allow_dirty: bool,

    #[serde(default)]
    pub files: Vec<String>,
}

/// Per-file overrides from a `[file."<path>"]` table.
///
/// Unset fields fall back to the global settings. The current version is
/// always parsed with the global pattern; a file's own `parse` is used to
/// check that the file's serialization reads back to the same parts.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FileSection {
    #[serde(default)]
    pub parse: Option<String>,

    #[serde(default)]
    pub serialize: Option<OneOrMany>,

    #[serde(default)]
    pub search: Option<String>,

    #[serde(default)]
    pub replace: Option<String>,
}

/// Per-part bump rules from a `[part.<name>]` table.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PartSection {
    #[serde(default)]
    pub first_value: Option<String>,

    #[serde(default)]
    pub optional_value: Option<String>,

    #[serde(default)]
    pub values: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    bumpv: GlobalSection,

    // kept as a table so sections stay in file order
    #[serde(default)]
    file: toml::Table,

    #[serde(default)]
    part: HashMap<String, PartSection>,
}

/// A loaded configuration file.
///
/// Holds both the typed view used for bumping and the editable document
/// used for writing values back without disturbing formatting or comments.
#[derive(Debug, Clone)]
pub struct Configuration {
    path: PathBuf,
    global: GlobalSection,
    files: Vec<(String, FileSection)>,
    parts: HashMap<String, PartSection>,
    document: DocumentMut,
}

impl Configuration {
    /// Loads the configuration file at `path`.
    ///
    /// # Returns
    /// * `Ok(Configuration)` - Parsed configuration
    /// * `Err(BumpvError::Configuration)` - If the file is missing or malformed
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(BumpvError::config(format!(
                "no configuration file found at: {}",
                path.display()
            )));
        }

        let content = fs::read_to_string(path)?;
        let configuration = Self::from_content(path, &content)?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(configuration)
    }

    /// Loads `.bumpv.toml` from `dir`.
    pub fn discover(dir: impl AsRef<Path>) -> Result<Self> {
        Self::load(dir.as_ref().join(DEFAULT_CONFIG_FILE))
    }

    /// Writes a starter configuration to `path` and loads it.
    ///
    /// # Returns
    /// * `Err(BumpvError::Configuration)` - If a file already exists at `path`
    pub fn init(path: impl AsRef<Path>, current_version: &str) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            return Err(BumpvError::config(format!(
                "refusing to overwrite existing configuration at: {}",
                path.display()
            )));
        }

        let mut global = toml_edit::Table::new();
        global["current_version"] = value(current_version);
        global["commit"] = value(false);
        global["tag"] = value(false);
        global["files"] = value(toml_edit::Array::new());

        let mut document = DocumentMut::new();
        document[GLOBAL_SECTION] = Item::Table(global);

        fs::write(path, document.to_string())?;
        tracing::info!("Created configuration at {}", path.display());
        Self::load(path)
    }

    fn from_content(path: &Path, content: &str) -> Result<Self> {
        let raw: RawConfig = toml::from_str(content).map_err(|e| {
            BumpvError::config(format!("failed to parse {}: {}", path.display(), e))
        })?;
        let document: DocumentMut = content.parse().map_err(|e: toml_edit::TomlError| {
            BumpvError::config(format!("failed to parse {}: {}", path.display(), e))
        })?;

        let mut files = Vec::with_capacity(raw.file.len());
        for (name, section) in raw.file {
            let section: FileSection = section.try_into().map_err(|e| {
                BumpvError::config(format!("invalid section [file.\"{}\"]: {}", name, e))
            })?;
            files.push((name, section));
        }

        Ok(Configuration {
            path: path.to_path_buf(),
            global: raw.bumpv,
            files,
            parts: raw.part,
            document,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory target paths are resolved against.
    pub fn dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    pub fn current_version(&self) -> Option<&str> {
        self.global.current_version.as_deref()
    }

    pub fn parse(&self) -> &str {
        self.global.parse.as_deref().unwrap_or(DEFAULT_PARSE)
    }

    pub fn serialize(&self) -> Vec<String> {
        self.global
            .serialize
            .clone()
            .map(OneOrMany::into_vec)
            .unwrap_or_else(|| vec![DEFAULT_SERIALIZE.to_string()])
    }

    pub fn search(&self) -> &str {
        self.global.search.as_deref().unwrap_or(DEFAULT_SEARCH)
    }

    pub fn replace(&self) -> &str {
        self.global.replace.as_deref().unwrap_or(DEFAULT_REPLACE)
    }

    pub fn tag_name(&self) -> &str {
        self.global.tag_name.as_deref().unwrap_or(DEFAULT_TAG_NAME)
    }

    pub fn message(&self) -> &str {
        self.global.message.as_deref().unwrap_or(DEFAULT_MESSAGE)
    }

    pub fn commit(&self) -> bool {
        self.global.commit
    }

    pub fn tag(&self) -> bool {
        self.global.tag
    }

    pub fn allow_dirty(&self) -> bool {
        self.global.allow_dirty
    }

    /// Target files, resolved against [`Configuration::dir`].
    ///
    /// Entries of the global `files` list come first, followed by every
    /// `[file.*]` section in file order. Duplicates are dropped.
    pub fn files(&self) -> Vec<PathBuf> {
        let mut resolved: Vec<PathBuf> = Vec::new();
        let names = self
            .global
            .files
            .iter()
            .chain(self.files.iter().map(|(name, _)| name));

        for name in names {
            let path = self.dir().join(name);
            if !resolved.contains(&path) {
                resolved.push(path);
            }
        }
        resolved
    }

    /// Overrides configured for the target at `path`, if any.
    pub fn file_section(&self, path: &Path) -> Option<&FileSection> {
        self.files
            .iter()
            .find(|(name, _)| self.dir().join(name) == path)
            .map(|(_, section)| section)
    }

    /// Bump rules for every `[part.*]` table.
    pub fn part_configs(&self) -> Result<HashMap<String, PartConfig>> {
        self.parts
            .iter()
            .map(|(name, section)| {
                let config = match &section.values {
                    Some(values) => PartConfig::values(
                        values.clone(),
                        section.first_value.clone(),
                        section.optional_value.clone(),
                    )
                    .map_err(|e| {
                        BumpvError::config(format!("invalid section [part.{}]: {}", name, e))
                    })?,
                    None => PartConfig::numeric(
                        section.first_value.clone(),
                        section.optional_value.clone(),
                    ),
                };
                Ok((name.clone(), config))
            })
            .collect()
    }

    /// Version config built from the global settings.
    pub fn version_config(&self) -> Result<VersionConfig> {
        VersionConfig::new(
            self.parse(),
            self.serialize(),
            self.search(),
            self.replace(),
            self.part_configs()?,
        )
    }

    /// Version config for the target at `path`, with its overrides applied.
    pub fn file_version_config(&self, path: &Path, global: &VersionConfig) -> Result<VersionConfig> {
        match self.file_section(path) {
            Some(section) => global.with_overrides(
                section.parse.as_deref(),
                section.serialize.clone().map(OneOrMany::into_vec),
                section.search.as_deref(),
                section.replace.as_deref(),
            ),
            None => Ok(global.clone()),
        }
    }

    /// Sets `key` in table `section` of the editable document.
    ///
    /// Takes effect on disk after [`Configuration::write`].
    pub fn set_value(&mut self, section: &str, key: &str, new_value: &str) -> Result<()> {
        let table = self
            .document
            .entry(section)
            .or_insert(toml_edit::table())
            .as_table_mut()
            .ok_or_else(|| {
                BumpvError::config(format!("'{}' is not a table in {}", section, self.path.display()))
            })?;
        table[key] = value(new_value);

        if section == GLOBAL_SECTION && key == "current_version" {
            self.global.current_version = Some(new_value.to_string());
        }
        Ok(())
    }

    /// Writes the document back to [`Configuration::path`].
    pub fn write(&self) -> Result<()> {
        fs::write(&self.path, self.document.to_string())?;
        tracing::info!("Wrote configuration to {}", self.path.display());
        Ok(())
    }
}
