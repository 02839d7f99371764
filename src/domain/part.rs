use std::fmt;

use crate::error::{BumpvError, Result};

/// Byte range of the first run of ASCII digits in `value`.
fn first_number(value: &str) -> Option<(usize, usize)> {
    let start = value.find(|c: char| c.is_ascii_digit())?;
    let len = value[start..]
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len() - start);
    Some((start, start + len))
}

/// How a part advances when bumped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartKind {
    /// Increment the first integer found in the value
    Numeric,
    /// Step through an ordered list of labels
    Values(Vec<String>),
}

/// Bump rules for one named part: its kind plus first and optional values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartConfig {
    kind: PartKind,
    first_value: String,
    optional_value: String,
}

impl PartConfig {
    /// Numeric part. `first_value` defaults to "0" and `optional_value` to
    /// the first value.
    pub fn numeric(first_value: Option<String>, optional_value: Option<String>) -> Self {
        let first_value = first_value.unwrap_or_else(|| "0".to_string());
        let optional_value = optional_value.unwrap_or_else(|| first_value.clone());
        PartConfig {
            kind: PartKind::Numeric,
            first_value,
            optional_value,
        }
    }

    /// Enumerated part. Both `first_value` and `optional_value` default to
    /// the first entry of `values`.
    ///
    /// # Returns
    /// * `Err(BumpvError::Configuration)` - If `values` is empty or
    ///   `first_value` is not one of them
    pub fn values(
        values: Vec<String>,
        first_value: Option<String>,
        optional_value: Option<String>,
    ) -> Result<Self> {
        let head = values
            .first()
            .cloned()
            .ok_or_else(|| BumpvError::config("part 'values' must not be empty"))?;

        let first_value = first_value.unwrap_or_else(|| head.clone());
        if !values.contains(&first_value) {
            return Err(BumpvError::config(format!(
                "first_value '{}' is not one of [{}]",
                first_value,
                values.join(", ")
            )));
        }

        Ok(PartConfig {
            kind: PartKind::Values(values),
            first_value,
            optional_value: optional_value.unwrap_or(head),
        })
    }

    pub fn kind(&self) -> &PartKind {
        &self.kind
    }

    pub fn first_value(&self) -> &str {
        &self.first_value
    }

    pub fn optional_value(&self) -> &str {
        &self.optional_value
    }

    /// Computes the value following `value` for the part named `part`.
    pub fn bump(&self, part: &str, value: &str) -> Result<String> {
        match &self.kind {
            PartKind::Numeric => {
                let (start, end) = first_number(value).ok_or_else(|| {
                    BumpvError::InvalidPartValue {
                        part: part.to_string(),
                        reason: format!("'{}' does not contain any digit", value),
                    }
                })?;
                let digits = &value[start..end];
                let number: u64 = digits.parse().map_err(|_| BumpvError::InvalidPartValue {
                    part: part.to_string(),
                    reason: format!("'{}' is not a valid number", digits),
                })?;
                let bumped = number.checked_add(1).ok_or_else(|| BumpvError::InvalidPartValue {
                    part: part.to_string(),
                    reason: format!("'{}' cannot be incremented", number),
                })?;
                Ok(format!(
                    "{}{}{}",
                    &value[..start],
                    bumped,
                    &value[end..]
                ))
            }
            PartKind::Values(values) => {
                let idx = values.iter().position(|v| v == value).ok_or_else(|| {
                    BumpvError::InvalidPartValue {
                        part: part.to_string(),
                        reason: format!("'{}' must be one of [{}]", value, values.join(", ")),
                    }
                })?;
                values
                    .get(idx + 1)
                    .cloned()
                    .ok_or_else(|| BumpvError::ExhaustedValues {
                        part: part.to_string(),
                        value: value.to_string(),
                        values: values.clone(),
                    })
            }
        }
    }
}

impl Default for PartConfig {
    fn default() -> Self {
        PartConfig::numeric(None, None)
    }
}

/// One named component of a version.
///
/// A part whose capture group did not participate in the match has no raw
/// value; its effective value is then the configured optional value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionPart {
    name: String,
    value: Option<String>,
    config: PartConfig,
}

impl VersionPart {
    /// Creates a part. An empty value is treated as absent.
    pub fn new(name: impl Into<String>, value: Option<String>, config: PartConfig) -> Self {
        VersionPart {
            name: name.into(),
            value: value.filter(|v| !v.is_empty()),
            config,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Effective value, falling back to the optional value when absent.
    pub fn value(&self) -> &str {
        self.value
            .as_deref()
            .unwrap_or_else(|| self.config.optional_value())
    }

    /// Value as matched, `None` if the group did not participate.
    pub fn raw_value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn config(&self) -> &PartConfig {
        &self.config
    }

    /// True when the effective value equals the optional value, meaning a
    /// serialization format may leave this part out.
    pub fn is_optional(&self) -> bool {
        self.value() == self.config.optional_value()
    }

    /// Returns the next part according to the part's bump rules.
    pub fn bump(&self) -> Result<VersionPart> {
        let value = self.config.bump(&self.name, self.value())?;
        Ok(VersionPart::new(&*self.name, Some(value), self.config.clone()))
    }

    /// Returns this part reset to its first value.
    pub fn reset(&self) -> VersionPart {
        VersionPart::new(
            &*self.name,
            Some(self.config.first_value().to_string()),
            self.config.clone(),
        )
    }
}

impl fmt::Display for VersionPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}
