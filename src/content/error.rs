//! Per-document errors raised while building the catalog.

use std::path::PathBuf;

use thiserror::Error;

use super::kind::DocumentKind;

/// Something wrong with a single content document.
///
/// Every variant carries the document path so an operator can go straight
/// to the offending file.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("{}: missing required field `{field}`", path.display())]
    SchemaValidation { path: PathBuf, field: String },

    #[error("{}: field `{field}` expected {expected}, found {found}", path.display())]
    FieldType {
        path: PathBuf,
        field: String,
        expected: &'static str,
        found: String,
    },

    #[error("{}: category could not be resolved", path.display())]
    AmbiguousCategory { path: PathBuf },

    #[error("{}: {kind} slug `{slug}` already used by {}", path.display(), existing.display())]
    DuplicateSlug {
        kind: DocumentKind,
        slug: String,
        path: PathBuf,
        existing: PathBuf,
    },

    #[error("{}: invalid header block: {message}", path.display())]
    Frontmatter { path: PathBuf, message: String },

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ContentError {
    /// Path of the document this error belongs to
    pub fn path(&self) -> &PathBuf {
        match self {
            ContentError::SchemaValidation { path, .. }
            | ContentError::FieldType { path, .. }
            | ContentError::AmbiguousCategory { path }
            | ContentError::DuplicateSlug { path, .. }
            | ContentError::Frontmatter { path, .. }
            | ContentError::Io { path, .. } => path,
        }
    }

    /// Name of the offending field, when the error is about one
    pub fn field(&self) -> Option<&str> {
        match self {
            ContentError::SchemaValidation { field, .. }
            | ContentError::FieldType { field, .. } => Some(field),
            ContentError::AmbiguousCategory { .. } => Some("category"),
            _ => None,
        }
    }

    pub(crate) fn missing(path: &std::path::Path, field: &str) -> Self {
        ContentError::SchemaValidation {
            path: path.to_path_buf(),
            field: field.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_path_and_field() {
        let err = ContentError::missing(std::path::Path::new("projects/demo.mdx"), "description");
        assert_eq!(
            err.to_string(),
            "projects/demo.mdx: missing required field `description`"
        );
        assert_eq!(err.field(), Some("description"));

        let err = ContentError::FieldType {
            path: PathBuf::from("experiences/acme.mdx"),
            field: "startDate".to_string(),
            expected: "a date",
            found: "\"not-a-date\"".to_string(),
        };
        assert!(err.to_string().contains("startDate"));
        assert_eq!(err.path(), &PathBuf::from("experiences/acme.mdx"));
    }
}
