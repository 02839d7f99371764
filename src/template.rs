//! Template rendering for serialize formats, search/replace text, tag names
//! and commit messages.
//!
//! Templates use brace-delimited labels: `{major}.{minor}.{patch}`,
//! `v{new_version}`, `{now:%Y-%m-%d}` or `{$BUILD_NUMBER}`. Literal braces are
//! written as `{{` and `}}`. Everything a template can reference lives in a
//! [`Context`], an explicit map from label to value built once per operation.

use std::collections::HashMap;
use std::fmt::Write as _;

use chrono::{Local, NaiveDateTime, Utc};

use crate::error::{BumpvError, Result};

/// Python's `str(datetime)` layout, used when a timestamp has no format spec.
const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// A value that can be substituted into a template.
#[derive(Debug, Clone, PartialEq)]
pub enum ContextValue {
    Text(String),
    Timestamp(NaiveDateTime),
}

impl From<String> for ContextValue {
    fn from(value: String) -> Self {
        ContextValue::Text(value)
    }
}

impl From<&str> for ContextValue {
    fn from(value: &str) -> Self {
        ContextValue::Text(value.to_string())
    }
}

impl From<NaiveDateTime> for ContextValue {
    fn from(value: NaiveDateTime) -> Self {
        ContextValue::Timestamp(value)
    }
}

/// Label → value map that templates are rendered against.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    values: HashMap<String, ContextValue>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `now` (local time) and `utcnow`.
    pub fn with_time(mut self) -> Self {
        self.insert("now", Local::now().naive_local());
        self.insert("utcnow", Utc::now().naive_utc());
        self
    }

    /// Adds every environment variable as `$NAME`.
    pub fn with_environment(mut self) -> Self {
        for (key, value) in std::env::vars() {
            self.insert(format!("${}", key), value);
        }
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ContextValue>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&ContextValue> {
        self.values.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }
}

#[derive(Debug, PartialEq)]
enum Segment<'a> {
    Literal(String),
    Field { name: &'a str, spec: &'a str },
}

fn parse(template: &str) -> Result<Vec<Segment<'_>>> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut chars = template.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        match c {
            '{' => {
                if matches!(chars.peek(), Some((_, '{'))) {
                    chars.next();
                    literal.push('{');
                    continue;
                }

                let rest = &template[i + 1..];
                let end = rest.find('}').ok_or_else(|| {
                    BumpvError::template(format!("unmatched '{{' in '{}'", template))
                })?;
                let field = &rest[..end];
                if field.contains('{') {
                    return Err(BumpvError::template(format!(
                        "nested fields are not supported in '{}'",
                        template
                    )));
                }

                let close = i + 1 + end;
                while matches!(chars.peek(), Some(&(j, _)) if j <= close) {
                    chars.next();
                }

                let (head, spec) = field.split_once(':').unwrap_or((field, ""));
                // `{name!r}` conversions are accepted and ignored
                let name = head.split('!').next().unwrap_or(head).trim();
                if name.is_empty() {
                    return Err(BumpvError::template(format!(
                        "empty field name in '{}'",
                        template
                    )));
                }

                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Field { name, spec });
            }
            '}' => {
                if matches!(chars.peek(), Some((_, '}'))) {
                    chars.next();
                    literal.push('}');
                } else {
                    return Err(BumpvError::template(format!(
                        "single '}}' encountered in '{}'",
                        template
                    )));
                }
            }
            _ => literal.push(c),
        }
    }

    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }

    Ok(segments)
}

/// Returns the labels a template references, in order of first appearance.
///
/// # Example
/// ```
/// let labels = bumpv::template::labels("{major}.{minor}-{$USER}").unwrap();
/// assert_eq!(labels, vec!["major", "minor", "$USER"]);
/// ```
pub fn labels(template: &str) -> Result<Vec<String>> {
    let mut labels: Vec<String> = Vec::new();
    for segment in parse(template)? {
        if let Segment::Field { name, .. } = segment {
            if !labels.iter().any(|l| l == name) {
                labels.push(name.to_string());
            }
        }
    }
    Ok(labels)
}

/// Renders `template` against `context`.
///
/// # Returns
/// * `Ok(String)` - The rendered text
/// * `Err(BumpvError::MissingValue)` - If a label has no value in the context
/// * `Err(BumpvError::Template)` - If the template or a format spec is malformed
pub fn render(template: &str, context: &Context) -> Result<String> {
    let mut out = String::with_capacity(template.len());

    for segment in parse(template)? {
        match segment {
            Segment::Literal(text) => out.push_str(&text),
            Segment::Field { name, spec } => {
                let value = context.get(name).ok_or_else(|| BumpvError::MissingValue {
                    label: name.to_string(),
                    format: template.to_string(),
                })?;
                match value {
                    ContextValue::Text(text) => out.push_str(&pad(text, spec)?),
                    ContextValue::Timestamp(ts) => {
                        let format = if spec.is_empty() {
                            DEFAULT_TIMESTAMP_FORMAT
                        } else {
                            spec
                        };
                        write!(out, "{}", ts.format(format)).map_err(|_| {
                            BumpvError::template(format!(
                                "invalid date format '{}' for '{}'",
                                spec, name
                            ))
                        })?;
                    }
                }
            }
        }
    }

    Ok(out)
}

/// Applies a `[[fill]align][0][width]` spec to a plain value.
fn pad(value: &str, spec: &str) -> Result<String> {
    if spec.is_empty() {
        return Ok(value.to_string());
    }

    let chars: Vec<char> = spec.chars().collect();
    let is_align = |c: char| matches!(c, '<' | '>' | '^');
    let mut fill = ' ';
    let mut align = '<';
    let mut idx = 0;

    if chars.len() >= 2 && is_align(chars[1]) {
        fill = chars[0];
        align = chars[1];
        idx = 2;
    } else if is_align(chars[0]) {
        align = chars[0];
        idx = 1;
    } else if chars[0] == '0' {
        fill = '0';
        align = '>';
        idx = 1;
    }

    let width_spec: String = chars[idx..].iter().collect();
    let width = if width_spec.is_empty() {
        0
    } else {
        width_spec.parse::<usize>().map_err(|_| {
            BumpvError::template(format!("unsupported format spec '{}'", spec))
        })?
    };

    let len = value.chars().count();
    if len >= width {
        return Ok(value.to_string());
    }

    let padding = width - len;
    let repeat = |n: usize| fill.to_string().repeat(n);
    Ok(match align {
        '>' => format!("{}{}", repeat(padding), value),
        '^' => format!(
            "{}{}{}",
            repeat(padding / 2),
            value,
            repeat(padding - padding / 2)
        ),
        _ => format!("{}{}", value, repeat(padding)),
    })
}
