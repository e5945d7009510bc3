//! Declarative per-kind schemas and value coercion.
//!
//! All three document kinds share one schema definition, parameterized by
//! [`SchemaOptions`]. A schema is a list of [`FieldSpec`]s; validating a
//! header against it yields [`ValidatedFields`] holding only coerced values.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use super::error::ContentError;
use super::frontmatter::{describe, Frontmatter};
use super::kind::DocumentKind;

/// How the `published` field is typed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishedPolicy {
    /// Only YAML booleans are accepted
    Strict,

    /// Booleans, plus strings compared after trimming whitespace and control characters
    #[default]
    Tolerant,
}

/// Whether a post must declare its category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryPolicy {
    /// Missing category is a validation error
    Required,

    /// Missing category falls back to the parent directory, then `uncategorized`
    #[default]
    Fallback,
}

/// Named configuration of the shared schema
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaOptions {
    #[serde(default)]
    pub published: PublishedPolicy,

    #[serde(default)]
    pub category: CategoryPolicy,
}

/// Semantic type of a header field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Date,
    Boolean,
    StringList,
    /// The raw `published` flag, typed by [`PublishedPolicy`]
    Published(PublishedPolicy),
}

impl FieldType {
    fn expected(self) -> &'static str {
        match self {
            FieldType::String => "a string",
            FieldType::Date => "a date (YYYY-MM-DD)",
            FieldType::Boolean => "a boolean",
            FieldType::StringList => "a list of strings",
            FieldType::Published(PublishedPolicy::Strict) => "a boolean",
            FieldType::Published(PublishedPolicy::Tolerant) => "a boolean or string",
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FieldType::String => "string",
            FieldType::Date => "date",
            FieldType::Boolean => "boolean",
            FieldType::StringList => "list<string>",
            FieldType::Published(PublishedPolicy::Strict) => "published(strict)",
            FieldType::Published(PublishedPolicy::Tolerant) => "published(tolerant)",
        };
        f.pad(name)
    }
}

/// One declared header field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub field_type: FieldType,
    pub required: bool,
    pub default: Option<FieldValue>,
}

impl FieldSpec {
    fn required(name: &'static str, field_type: FieldType) -> Self {
        Self {
            name,
            field_type,
            required: true,
            default: None,
        }
    }

    fn optional(name: &'static str, field_type: FieldType) -> Self {
        Self {
            name,
            field_type,
            required: false,
            default: None,
        }
    }

    fn with_default(mut self, value: FieldValue) -> Self {
        self.default = Some(value);
        self
    }
}

/// The raw published indicator as authored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PublishedFlag {
    Bool(bool),
    Text(String),
}

impl PublishedFlag {
    /// Derived publication state; an absent flag means published
    pub fn resolve(flag: Option<&PublishedFlag>) -> bool {
        match flag {
            None => true,
            Some(PublishedFlag::Bool(b)) => *b,
            Some(PublishedFlag::Text(s)) => trim_control(s) == "true",
        }
    }
}

/// A coerced header value
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    String(String),
    Date(NaiveDate),
    Boolean(bool),
    StringList(Vec<String>),
    Published(PublishedFlag),
}

/// Trim surrounding whitespace and control characters
pub fn trim_control(s: &str) -> &str {
    s.trim_matches(|c: char| c.is_whitespace() || c.is_control())
}

/// Schema for one document kind
#[derive(Debug, Clone)]
pub struct DocumentSchema {
    pub kind: DocumentKind,
    pub fields: Vec<FieldSpec>,
}

impl DocumentSchema {
    /// Build the schema for a kind under the given options
    pub fn for_kind(kind: DocumentKind, options: SchemaOptions) -> Self {
        let published = FieldSpec::optional("published", FieldType::Published(options.published));

        let fields = match kind {
            DocumentKind::Post => vec![
                FieldSpec::required("title", FieldType::String),
                FieldSpec::required("date", FieldType::Date),
                FieldSpec::optional("description", FieldType::String),
                FieldSpec::optional("image", FieldType::String),
                FieldSpec {
                    required: options.category == CategoryPolicy::Required,
                    ..FieldSpec::optional("category", FieldType::String)
                },
                published,
                FieldSpec::optional("company", FieldType::String),
                FieldSpec::optional("location", FieldType::String),
                FieldSpec::optional("startDate", FieldType::Date),
                FieldSpec::optional("endDate", FieldType::Date),
                FieldSpec::optional("techs", FieldType::StringList)
                    .with_default(FieldValue::StringList(Vec::new())),
                FieldSpec::optional("github", FieldType::String),
                FieldSpec::optional("demo", FieldType::String),
            ],
            DocumentKind::Project => vec![
                FieldSpec::required("title", FieldType::String),
                FieldSpec::required("date", FieldType::Date),
                FieldSpec::required("description", FieldType::String),
                FieldSpec::optional("image", FieldType::String),
                FieldSpec::optional("github", FieldType::String),
                FieldSpec::optional("demo", FieldType::String),
                FieldSpec::optional("techs", FieldType::StringList)
                    .with_default(FieldValue::StringList(Vec::new())),
                published,
                FieldSpec::optional("featured", FieldType::Boolean)
                    .with_default(FieldValue::Boolean(false)),
            ],
            DocumentKind::Experience => vec![
                FieldSpec::required("title", FieldType::String),
                FieldSpec::required("company", FieldType::String),
                FieldSpec::optional("location", FieldType::String),
                FieldSpec::required("startDate", FieldType::Date),
                FieldSpec::optional("endDate", FieldType::Date),
                FieldSpec::optional("current", FieldType::Boolean)
                    .with_default(FieldValue::Boolean(false)),
                FieldSpec::optional("techs", FieldType::StringList)
                    .with_default(FieldValue::StringList(Vec::new())),
                published,
            ],
        };

        Self { kind, fields }
    }

    /// Validate and coerce a header. Reports the first problem in field order.
    pub fn validate(
        &self,
        header: &Frontmatter,
        path: &Path,
    ) -> Result<ValidatedFields, ContentError> {
        let mut values = BTreeMap::new();

        for spec in &self.fields {
            // blank strings count as missing, except the published flag where
            // any non-"true" string means unpublished
            let raw = header.get(spec.name).filter(|raw| {
                matches!(spec.field_type, FieldType::Published(_)) || !is_blank(raw)
            });

            match raw {
                Some(raw) => {
                    let value = coerce(raw, spec.field_type).map_err(|found| {
                        ContentError::FieldType {
                            path: path.to_path_buf(),
                            field: spec.name.to_string(),
                            expected: spec.field_type.expected(),
                            found,
                        }
                    })?;
                    values.insert(spec.name, value);
                }
                None if spec.required => return Err(ContentError::missing(path, spec.name)),
                None => {
                    if let Some(default) = &spec.default {
                        values.insert(spec.name, default.clone());
                    }
                }
            }
        }

        for key in header.keys() {
            if !self.fields.iter().any(|f| f.name == key) {
                tracing::debug!(
                    "{}: ignoring undeclared {} field `{}`",
                    path.display(),
                    self.kind,
                    key
                );
            }
        }

        Ok(ValidatedFields {
            path: path.to_path_buf(),
            values,
        })
    }
}

fn is_blank(raw: &Value) -> bool {
    matches!(raw, Value::String(s) if trim_control(s).is_empty())
}

/// Coerce a raw value; on failure returns a description of what was found
fn coerce(raw: &Value, field_type: FieldType) -> Result<FieldValue, String> {
    match field_type {
        FieldType::String => scalar_string(raw).map(FieldValue::String),
        FieldType::Date => coerce_date(raw).map(FieldValue::Date),
        FieldType::Boolean => coerce_bool(raw).map(FieldValue::Boolean),
        FieldType::StringList => match raw {
            Value::Sequence(items) => items
                .iter()
                .map(scalar_string)
                .collect::<Result<Vec<_>, _>>()
                .map(FieldValue::StringList),
            other => scalar_string(other).map(|s| FieldValue::StringList(vec![s])),
        },
        FieldType::Published(policy) => match (raw, policy) {
            (Value::Bool(b), _) => Ok(FieldValue::Published(PublishedFlag::Bool(*b))),
            (Value::String(s), PublishedPolicy::Tolerant) => {
                Ok(FieldValue::Published(PublishedFlag::Text(s.clone())))
            }
            (other, _) => Err(describe(other)),
        },
    }
}

fn scalar_string(raw: &Value) -> Result<String, String> {
    match raw {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(describe(other)),
    }
}

fn coerce_date(raw: &Value) -> Result<NaiveDate, String> {
    let Value::String(s) = raw else {
        return Err(describe(raw));
    };
    parse_date(s).ok_or_else(|| describe(raw))
}

/// Accepts `YYYY-MM-DD`, RFC 3339, or a naive date-time with `T` or a space
/// between date and time (YAML timestamps are often written with a space)
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

    let s = trim_control(s);
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
        .or_else(|| {
            NAIVE_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
                .map(|dt| dt.date())
        })
}

fn coerce_bool(raw: &Value) -> Result<bool, String> {
    match raw {
        Value::Bool(b) => Ok(*b),
        Value::String(s) => match trim_control(s).to_lowercase().as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(describe(raw)),
        },
        other => Err(describe(other)),
    }
}

/// Coerced values for one document
#[derive(Debug, Clone)]
pub struct ValidatedFields {
    path: std::path::PathBuf,
    values: BTreeMap<&'static str, FieldValue>,
}

impl ValidatedFields {
    pub fn string(&mut self, name: &str) -> Option<String> {
        match self.values.remove(name) {
            Some(FieldValue::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn require_string(&mut self, name: &str) -> Result<String, ContentError> {
        self.string(name)
            .ok_or_else(|| ContentError::missing(&self.path, name))
    }

    pub fn date(&mut self, name: &str) -> Option<NaiveDate> {
        match self.values.remove(name) {
            Some(FieldValue::Date(d)) => Some(d),
            _ => None,
        }
    }

    pub fn require_date(&mut self, name: &str) -> Result<NaiveDate, ContentError> {
        self.date(name)
            .ok_or_else(|| ContentError::missing(&self.path, name))
    }

    pub fn boolean(&mut self, name: &str) -> bool {
        matches!(self.values.remove(name), Some(FieldValue::Boolean(true)))
    }

    pub fn list(&mut self, name: &str) -> Vec<String> {
        match self.values.remove(name) {
            Some(FieldValue::StringList(items)) => items,
            _ => Vec::new(),
        }
    }

    pub fn published(&mut self) -> Option<PublishedFlag> {
        match self.values.remove("published") {
            Some(FieldValue::Published(flag)) => Some(flag),
            _ => None,
        }
    }
}
