//! Header block extraction.
//!
//! A document starts with a `---` line, a YAML mapping, and a closing `---`
//! line; everything after that is the body. Files authored on Windows keep
//! their `\r\n` line endings, so delimiters are compared after trimming.

use std::collections::BTreeMap;

use serde_yaml::Value;

/// Parsed header block plus the untouched body
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frontmatter {
    /// Raw header values by field name
    pub fields: BTreeMap<String, Value>,

    /// Everything after the closing delimiter
    pub body: String,
}

const DELIMITER: &str = "---";

impl Frontmatter {
    /// Split and parse a document. Errors are plain messages; the caller
    /// attaches the document path.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);
        let mut lines = raw.split_inclusive('\n');

        // byte offset of the body, so it can be sliced out as-is
        let mut consumed = match lines.next() {
            Some(first) if first.trim_end() == DELIMITER => first.len(),
            _ => return Err("document does not start with `---`".to_string()),
        };

        let mut header = String::new();
        let mut closed = false;

        for line in lines {
            consumed += line.len();
            if line.trim_end() == DELIMITER {
                closed = true;
                break;
            }
            header.push_str(line);
        }

        if !closed {
            return Err("header block is not closed with `---`".to_string());
        }

        let body = raw.get(consumed..).unwrap_or_default().to_string();
        let fields = parse_fields(&header)?;

        Ok(Self { fields, body })
    }

    /// Raw value of a field; YAML `null` counts as absent
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name).filter(|v| !v.is_null())
    }

    /// Field names present in the header
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}

fn parse_fields(header: &str) -> Result<BTreeMap<String, Value>, String> {
    let value: Value = serde_yaml::from_str(header).map_err(|e| e.to_string())?;

    let mapping = match value {
        Value::Null => return Ok(BTreeMap::new()),
        Value::Mapping(mapping) => mapping,
        other => return Err(format!("expected a mapping, found {}", describe(&other))),
    };

    mapping
        .into_iter()
        .map(|(key, value)| match key {
            Value::String(key) => Ok((key, value)),
            other => Err(format!("non-string key {}", describe(&other))),
        })
        .collect()
}

/// Short rendering of a raw value for error messages
pub fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => format!("boolean {b}"),
        Value::Number(n) => format!("number {n}"),
        Value::String(s) => format!("{s:?}"),
        Value::Sequence(_) => "a list".to_string(),
        Value::Mapping(_) => "a mapping".to_string(),
        Value::Tagged(tagged) => format!("tagged value {}", tagged.tag),
    }
}
