//! Document kinds and the path patterns that select them.

use std::path::Path;

use anyhow::{Context, Result};
use glob::{MatchOptions, Pattern};
use serde::{Deserialize, Serialize};

/// The three kinds of content document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// Blog post
    Post,

    /// Project showcase
    Project,

    /// Experience timeline entry
    Experience,
}

impl DocumentKind {
    /// Classification order: narrow subtrees before the catch-all post pattern
    pub const MATCH_ORDER: [DocumentKind; 3] = [
        DocumentKind::Project,
        DocumentKind::Experience,
        DocumentKind::Post,
    ];

    /// Route root prepended to `slug_as_params`
    pub fn route_root(self) -> &'static str {
        match self {
            DocumentKind::Post => "/blog",
            DocumentKind::Project => "/projects",
            DocumentKind::Experience => "/experience",
        }
    }

    /// Default glob patterns, relative to the content root
    pub fn default_patterns(self) -> Vec<String> {
        let prefix = match self {
            DocumentKind::Post => "",
            DocumentKind::Project => "projects/",
            DocumentKind::Experience => "experiences/",
        };
        ["mdx", "md"]
            .iter()
            .map(|ext| format!("{prefix}**/*.{ext}"))
            .collect()
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentKind::Post => write!(f, "post"),
            DocumentKind::Project => write!(f, "project"),
            DocumentKind::Experience => write!(f, "experience"),
        }
    }
}

/// Compiled path patterns for every kind
#[derive(Debug, Clone)]
pub struct KindMatcher {
    rules: Vec<(DocumentKind, Vec<Pattern>)>,
}

impl Default for KindMatcher {
    fn default() -> Self {
        Self::from_patterns(|kind| kind.default_patterns())
            .unwrap_or(Self { rules: Vec::new() })
    }
}

impl KindMatcher {
    /// Build a matcher from a pattern source, compiling every glob
    pub fn from_patterns<F>(mut patterns_for: F) -> Result<Self>
    where
        F: FnMut(DocumentKind) -> Vec<String>,
    {
        let mut rules = Vec::new();
        for kind in DocumentKind::MATCH_ORDER {
            let patterns = patterns_for(kind)
                .iter()
                .map(|p| {
                    Pattern::new(p).with_context(|| format!("Invalid {kind} pattern: {p}"))
                })
                .collect::<Result<Vec<_>>>()?;
            rules.push((kind, patterns));
        }
        Ok(Self { rules })
    }

    /// Kind of the document at `relative_path`, or `None` if no pattern claims it
    pub fn classify(&self, relative_path: &Path) -> Option<DocumentKind> {
        let options = MatchOptions {
            case_sensitive: true,
            require_literal_separator: true,
            require_literal_leading_dot: true,
        };
        let normalized = relative_path.to_string_lossy().replace('\\', "/");

        self.rules
            .iter()
            .find(|(_, patterns)| {
                patterns
                    .iter()
                    .any(|p| p.matches_with(&normalized, options))
            })
            .map(|(kind, _)| *kind)
    }

    /// Patterns for a kind, as written
    pub fn patterns(&self, kind: DocumentKind) -> Vec<&str> {
        self.rules
            .iter()
            .filter(|(k, _)| *k == kind)
            .flat_map(|(_, patterns)| patterns.iter().map(Pattern::as_str))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_classification() {
        let matcher = KindMatcher::default();

        assert_eq!(
            matcher.classify(Path::new("projects/neural-style.mdx")),
            Some(DocumentKind::Project)
        );
        assert_eq!(
            matcher.classify(Path::new("experiences/acme.mdx")),
            Some(DocumentKind::Experience)
        );
        assert_eq!(
            matcher.classify(Path::new("posts/intro.mdx")),
            Some(DocumentKind::Post)
        );
        assert_eq!(
            matcher.classify(Path::new("intro.md")),
            Some(DocumentKind::Post)
        );
        assert_eq!(matcher.classify(Path::new("images/cover.png")), None);
    }

    #[test]
    fn test_custom_patterns() {
        let matcher = KindMatcher::from_patterns(|kind| match kind {
            DocumentKind::Post => vec!["blog/**/*.mdx".to_string()],
            DocumentKind::Project => vec!["work/*.mdx".to_string()],
            DocumentKind::Experience => Vec::new(),
        })
        .unwrap();

        assert_eq!(
            matcher.classify(Path::new("work/demo.mdx")),
            Some(DocumentKind::Project)
        );
        assert_eq!(
            matcher.classify(Path::new("blog/life/rest.mdx")),
            Some(DocumentKind::Post)
        );
        assert_eq!(matcher.classify(Path::new("experiences/acme.mdx")), None);
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        let result = KindMatcher::from_patterns(|_| vec!["[".to_string()]);
        assert!(result.is_err());
    }
}
