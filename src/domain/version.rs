use std::fmt;

use crate::domain::part::VersionPart;
use crate::error::{BumpvError, Result};

/// A parsed version: named parts in configured order.
///
/// Versions are immutable; [`Version::bump`] returns a new one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    parts: Vec<VersionPart>,
    original: Option<String>,
}

impl Version {
    /// Create a version from its parts. `original` is the exact string the
    /// parts were parsed from, `None` for computed versions.
    pub fn new(parts: Vec<VersionPart>, original: Option<String>) -> Self {
        Version { parts, original }
    }

    pub fn original(&self) -> Option<&str> {
        self.original.as_deref()
    }

    /// Look up a part by name
    pub fn get(&self, name: &str) -> Option<&VersionPart> {
        self.parts.iter().find(|p| p.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &VersionPart> {
        self.parts.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|p| p.name())
    }

    /// Bump version part `part_name`
    ///
    /// `order` is the significance order of the parts, most significant
    /// first. The named part is bumped, every part after it in `order` is
    /// reset to its first value, and everything else is carried over.
    ///
    /// # Arguments
    /// * `part_name` - Name of the part to bump (e.g. "minor")
    /// * `order` - Part names from most to least significant
    ///
    /// # Returns
    /// * `Ok(Version)` - The bumped version
    /// * `Err(BumpvError::UnknownVersionPart)` - If `part_name` is not an
    ///   ordered part of this version
    /// * `Err` - If the part itself cannot be bumped
    ///
    /// # Example
    /// ```ignore
    /// let bumped = version.bump("minor", &order)?; // 1.2.3 -> 1.3.0
    /// ```
    pub fn bump(&self, part_name: &str, order: &[String]) -> Result<Version> {
        let position = order
            .iter()
            .position(|label| label == part_name)
            .filter(|_| self.get(part_name).is_some())
            .ok_or_else(|| BumpvError::UnknownVersionPart {
                part: part_name.to_string(),
                known: order
                    .iter()
                    .filter(|label| self.get(label).is_some())
                    .cloned()
                    .collect(),
            })?;

        let mut parts = Vec::with_capacity(self.parts.len());
        for part in &self.parts {
            let rank = order.iter().position(|label| label == part.name());
            let next = match rank {
                Some(r) if r == position => part.bump()?,
                Some(r) if r > position => part.reset(),
                _ => part.clone(),
            };
            parts.push(next);
        }

        Ok(Version::new(parts, None))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pairs: Vec<String> = self
            .parts
            .iter()
            .map(|p| format!("{}={}", p.name(), p.value()))
            .collect();
        write!(f, "{}", pairs.join(", "))
    }
}
