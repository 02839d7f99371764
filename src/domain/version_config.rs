use std::collections::HashMap;

use regex::{Regex, RegexBuilder};

use crate::domain::part::{PartConfig, VersionPart};
use crate::domain::version::Version;
use crate::error::{BumpvError, Result};
use crate::template::{self, Context};

/// Parse pattern, serialization formats, search/replace templates and part
/// rules that together describe how a version is read and written.
#[derive(Debug, Clone)]
pub struct VersionConfig {
    parse_regex: Regex,
    serialize_formats: Vec<String>,
    search: String,
    replace: String,
    part_configs: HashMap<String, PartConfig>,
}

impl VersionConfig {
    /// Builds a version config.
    ///
    /// The parse pattern is compiled in extended mode, so whitespace and
    /// `#` comments inside it are ignored.
    ///
    /// # Returns
    /// * `Err(BumpvError::Configuration)` - If the pattern does not compile
    ///   or no serialization format is given
    /// * `Err(BumpvError::Template)` - If a serialization format is malformed
    pub fn new(
        parse: &str,
        serialize_formats: Vec<String>,
        search: impl Into<String>,
        replace: impl Into<String>,
        part_configs: HashMap<String, PartConfig>,
    ) -> Result<Self> {
        let parse_regex = compile(parse)?;

        if serialize_formats.is_empty() {
            return Err(BumpvError::config(
                "at least one serialization format is required",
            ));
        }
        for format in &serialize_formats {
            template::labels(format)?;
        }

        Ok(VersionConfig {
            parse_regex,
            serialize_formats,
            search: search.into(),
            replace: replace.into(),
            part_configs,
        })
    }

    /// Derives a config for a single file, replacing whichever settings the
    /// file overrides and keeping the rest.
    pub fn with_overrides(
        &self,
        parse: Option<&str>,
        serialize_formats: Option<Vec<String>>,
        search: Option<&str>,
        replace: Option<&str>,
    ) -> Result<Self> {
        VersionConfig::new(
            parse.unwrap_or(self.parse_regex.as_str()),
            serialize_formats.unwrap_or_else(|| self.serialize_formats.clone()),
            search.unwrap_or(&self.search),
            replace.unwrap_or(&self.replace),
            self.part_configs.clone(),
        )
    }

    pub fn parse_pattern(&self) -> &str {
        self.parse_regex.as_str()
    }

    pub fn serialize_formats(&self) -> &[String] {
        &self.serialize_formats
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn replace(&self) -> &str {
        &self.replace
    }

    /// Part significance order, taken from the first serialization format.
    pub fn order(&self) -> Vec<String> {
        template::labels(&self.serialize_formats[0]).unwrap_or_default()
    }

    /// Parses `version_string` into a [`Version`].
    ///
    /// Every named group of the parse pattern becomes a part; groups that
    /// did not participate in the match are left without a raw value.
    ///
    /// # Returns
    /// * `Ok(Version)` - Parsed version, remembering `version_string` as its original
    /// * `Err(BumpvError::Parse)` - If the pattern does not match
    pub fn parse(&self, version_string: &str) -> Result<Version> {
        tracing::info!(
            "Parsing version '{}' using regexp '{}'",
            version_string,
            one_line(self.parse_regex.as_str())
        );

        let captures = self.parse_regex.captures(version_string).ok_or_else(|| {
            tracing::warn!(
                "Evaluating 'parse' option: '{}' does not parse current version '{}'",
                self.parse_regex.as_str(),
                version_string
            );
            BumpvError::Parse {
                version: version_string.to_string(),
                pattern: self.parse_regex.as_str().to_string(),
            }
        })?;

        let parts = self
            .parse_regex
            .capture_names()
            .flatten()
            .map(|name| {
                let value = captures.name(name).map(|m| m.as_str().to_string());
                VersionPart::new(name, value, self.part_config(name))
            })
            .collect();

        let version = Version::new(parts, Some(version_string.to_string()));
        tracing::info!("Parsed the following values: {}", version);
        Ok(version)
    }

    /// Serializes `version` with the best fitting format.
    ///
    /// Formats are tried in listed order and each one is rendered before it
    /// is judged, so a label with no value in either the version or `context`
    /// fails the whole call. The first format that completely represents the
    /// version wins. A format referencing a part whose group did not match is
    /// never complete. If no format is complete, the first format is used.
    ///
    /// # Returns
    /// * `Ok(String)` - The serialized version
    /// * `Err(BumpvError::MissingValue)` - If a referenced label has no value
    pub fn serialize(&self, version: &Version, context: &Context) -> Result<String> {
        let format = self.choose_format(version, context)?;
        let serialized = self.render(version, format, context)?;
        tracing::debug!("Serialized to '{}' using '{}'", serialized, format);
        Ok(serialized)
    }

    /// Checks that `serialized` parses back into the values of `version`.
    pub fn round_trips(&self, serialized: &str, version: &Version) -> bool {
        let Some(captures) = self.parse_regex.captures(serialized) else {
            return false;
        };

        self.parse_regex.capture_names().flatten().all(|name| {
            let Some(expected) = version.get(name) else {
                return true;
            };
            let reparsed = VersionPart::new(
                name,
                captures.name(name).map(|m| m.as_str().to_string()),
                self.part_config(name),
            );
            reparsed.value() == expected.value()
        })
    }

    fn part_config(&self, name: &str) -> PartConfig {
        self.part_configs.get(name).cloned().unwrap_or_default()
    }

    fn render(&self, version: &Version, format: &str, context: &Context) -> Result<String> {
        let mut values = context.clone();
        for part in version.iter() {
            values.insert(part.name(), part.value());
        }
        template::render(format, &values)
    }

    /// A format is complete when it references every required part and no
    /// part left unset by the parse.
    ///
    /// Required parts are the non-optional ones plus any optional part that
    /// precedes the first non-optional one, in significance order.
    fn is_complete(&self, version: &Version, format: &str) -> Result<bool> {
        let labels = template::labels(format)?;

        let references_unset = labels
            .iter()
            .filter_map(|label| version.get(label))
            .any(|part| part.raw_value().is_none());
        if references_unset {
            return Ok(false);
        }

        let mut required = Vec::new();
        let mut found_required = false;
        for label in self.order() {
            let Some(part) = version.get(&label) else {
                continue;
            };
            if !part.is_optional() {
                found_required = true;
                required.push(label);
            } else if !found_required {
                required.push(label);
            }
        }

        Ok(required.iter().all(|r| labels.contains(r)))
    }

    fn choose_format(&self, version: &Version, context: &Context) -> Result<&str> {
        for format in &self.serialize_formats {
            self.render(version, format, context)?;
            if self.is_complete(version, format)? {
                return Ok(format.as_str());
            }
            tracing::debug!("Format '{}' does not represent every required part", format);
        }

        self.serialize_formats
            .first()
            .map(String::as_str)
            .ok_or_else(|| BumpvError::config("did not find a suitable serialization format"))
    }
}

fn compile(parse: &str) -> Result<Regex> {
    RegexBuilder::new(parse)
        .ignore_whitespace(true)
        .build()
        .map_err(|e| {
            tracing::error!("--parse '{}' is not a valid regex", parse);
            BumpvError::config(format!("parse pattern '{}' is not a valid regex: {}", parse, e))
        })
}

/// Collapses an extended-mode pattern onto one line for logging.
fn one_line(pattern: &str) -> String {
    pattern
        .lines()
        .map(|line| line.split('#').next().unwrap_or("").trim())
        .collect()
}
