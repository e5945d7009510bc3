//! Catalog builder: one batch pass over a content tree.
//!
//! Every document is classified by path, validated against its kind's
//! schema and derived into a record. Bad documents are collected as
//! [`ContentError`]s and the scan carries on, so a single typo never takes
//! the whole site down.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::catalog::Catalog;
use super::error::ContentError;
use super::kind::{DocumentKind, KindMatcher};
use super::record::{build_experience, build_post, build_project, Record, SourceDocument};
use super::schema::SchemaOptions;

/// What to do when two documents of one kind derive the same `slug_as_params`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Keep the first document in scan order and report the later one
    #[default]
    Reject,

    /// Keep the first document silently
    FirstWins,

    /// The later document replaces the earlier one in place
    LastWins,
}

/// Builder settings
#[derive(Debug, Clone, Default)]
pub struct BuilderOptions {
    pub schema: SchemaOptions,
    pub duplicates: DuplicatePolicy,
    pub matcher: KindMatcher,
}

/// Outcome of one build: the catalog plus everything that went wrong
#[derive(Debug)]
pub struct CatalogBuild {
    pub catalog: Catalog,

    /// Per-document errors; none of these documents are in the catalog
    pub errors: Vec<ContentError>,

    /// Files no kind pattern claimed
    pub skipped: Vec<PathBuf>,
}

impl CatalogBuild {
    /// True when every classified document made it into the catalog
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// One line per offending document
    pub fn error_report(&self) -> String {
        self.errors
            .iter()
            .map(|e| format!("  {e}"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Builds a [`Catalog`] from a content root
#[derive(Debug, Clone)]
pub struct CatalogBuilder {
    root: PathBuf,
    options: BuilderOptions,
}

impl CatalogBuilder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            options: BuilderOptions::default(),
        }
    }

    pub fn with_options(mut self, options: BuilderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn options(&self) -> &BuilderOptions {
        &self.options
    }

    /// Relative paths of every non-hidden file under the root, sorted
    pub fn list_files(&self) -> Result<Vec<PathBuf>> {
        if !self.root.is_dir() {
            anyhow::bail!("Content directory does not exist: {}", self.root.display());
        }

        let pattern = format!(
            "{}/**/*",
            glob::Pattern::escape(&self.root.to_string_lossy())
        );

        let mut files = Vec::new();
        for entry in glob::glob(&pattern).context("Failed to scan content directory")? {
            let path = match entry {
                Ok(path) => path,
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };

            if !path.is_file() {
                continue;
            }

            let Ok(rel) = path.strip_prefix(&self.root) else {
                continue;
            };

            if rel
                .components()
                .any(|c| c.as_os_str().to_str().is_some_and(|s| s.starts_with('.')))
            {
                continue;
            }

            files.push(rel.to_path_buf());
        }

        files.sort();
        Ok(files)
    }

    /// Scan the root and build the catalog
    pub fn build(&self) -> Result<CatalogBuild> {
        let files = self.list_files()?;

        let mut documents = Vec::new();
        let mut skipped = Vec::new();
        let mut errors = Vec::new();

        for rel in files {
            if self.options.matcher.classify(&rel).is_none() {
                tracing::debug!("Not a content document: {}", rel.display());
                skipped.push(rel);
                continue;
            }

            match std::fs::read_to_string(self.root.join(&rel)) {
                Ok(raw) => documents.push(SourceDocument::new(rel, raw)),
                Err(source) => errors.push(ContentError::Io { path: rel, source }),
            }
        }

        let mut build = self.build_documents(documents);
        errors.append(&mut build.errors);
        build.errors = errors;
        build.skipped = skipped;

        tracing::info!(
            "Built catalog from {}: {} posts, {} projects, {} experiences, {} errors",
            self.root.display(),
            build.catalog.posts.len(),
            build.catalog.projects.len(),
            build.catalog.experiences.len(),
            build.errors.len()
        );

        Ok(build)
    }

    /// Build from documents already in memory, in the given order
    pub fn build_documents(&self, documents: Vec<SourceDocument>) -> CatalogBuild {
        let schema = self.options.schema;
        let policy = self.options.duplicates;

        let mut posts = Collection::new(DocumentKind::Post, policy);
        let mut projects = Collection::new(DocumentKind::Project, policy);
        let mut experiences = Collection::new(DocumentKind::Experience, policy);
        let mut errors = Vec::new();
        let mut skipped = Vec::new();

        for doc in documents {
            let Some(kind) = self.options.matcher.classify(&doc.path) else {
                skipped.push(doc.path);
                continue;
            };

            let result = match kind {
                DocumentKind::Post => build_post(&doc, schema).and_then(|r| posts.insert(r)),
                DocumentKind::Project => {
                    build_project(&doc, schema).and_then(|r| projects.insert(r))
                }
                DocumentKind::Experience => {
                    build_experience(&doc, schema).and_then(|r| experiences.insert(r))
                }
            };

            if let Err(e) = result {
                tracing::warn!("{}", e);
                errors.push(e);
            }
        }

        CatalogBuild {
            catalog: Catalog::new(posts.records, projects.records, experiences.records),
            errors,
            skipped,
        }
    }
}

/// One kind's records, indexed by slug for the duplicate policy
struct Collection<F> {
    kind: DocumentKind,
    policy: DuplicatePolicy,
    records: Vec<Record<F>>,
    by_slug: HashMap<String, usize>,
}

impl<F> Collection<F> {
    fn new(kind: DocumentKind, policy: DuplicatePolicy) -> Self {
        Self {
            kind,
            policy,
            records: Vec::new(),
            by_slug: HashMap::new(),
        }
    }

    fn insert(&mut self, record: Record<F>) -> Result<(), ContentError> {
        let Some(&index) = self.by_slug.get(&record.slug_as_params) else {
            self.by_slug
                .insert(record.slug_as_params.clone(), self.records.len());
            self.records.push(record);
            return Ok(());
        };

        let existing = &self.records[index];
        match self.policy {
            DuplicatePolicy::Reject => Err(ContentError::DuplicateSlug {
                kind: self.kind,
                slug: record.slug_as_params,
                path: record.source_path,
                existing: existing.source_path.clone(),
            }),
            DuplicatePolicy::FirstWins => {
                tracing::debug!(
                    "Dropping {}: {} slug `{}` already taken by {}",
                    record.source_path.display(),
                    self.kind,
                    record.slug_as_params,
                    existing.source_path.display()
                );
                Ok(())
            }
            DuplicatePolicy::LastWins => {
                tracing::debug!(
                    "{} replaces {} for {} slug `{}`",
                    record.source_path.display(),
                    existing.source_path.display(),
                    self.kind,
                    record.slug_as_params
                );
                self.records[index] = record;
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(path: &str, title: &str) -> SourceDocument {
        SourceDocument::new(
            path,
            format!("---\ntitle: {title}\ndate: 2024-01-01\ncategory: technical\n---\n"),
        )
    }

    fn builder(duplicates: DuplicatePolicy) -> CatalogBuilder {
        CatalogBuilder::new("content").with_options(BuilderOptions {
            duplicates,
            ..Default::default()
        })
    }

    #[test]
    fn test_duplicate_reject_keeps_first() {
        let build = builder(DuplicatePolicy::Reject)
            .build_documents(vec![post("a/intro.mdx", "First"), post("b/intro.mdx", "Second")]);

        assert_eq!(build.catalog.posts.len(), 1);
        assert_eq!(build.catalog.posts[0].title, "First");
        assert_eq!(build.errors.len(), 1);
        assert!(matches!(
            &build.errors[0],
            ContentError::DuplicateSlug { slug, .. } if slug == "technical/intro"
        ));
    }

    #[test]
    fn test_duplicate_first_wins() {
        let build = builder(DuplicatePolicy::FirstWins)
            .build_documents(vec![post("a/intro.mdx", "First"), post("b/intro.mdx", "Second")]);

        assert!(build.is_clean());
        assert_eq!(build.catalog.posts.len(), 1);
        assert_eq!(build.catalog.posts[0].title, "First");
    }

    #[test]
    fn test_duplicate_last_wins() {
        let build = builder(DuplicatePolicy::LastWins).build_documents(vec![
            post("a/intro.mdx", "First"),
            post("a/other.mdx", "Other"),
            post("b/intro.mdx", "Second"),
        ]);

        assert!(build.is_clean());
        let titles: Vec<_> = build.catalog.posts.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["Second", "Other"]);
    }

    #[test]
    fn test_bad_document_does_not_stop_build() {
        let build = builder(DuplicatePolicy::Reject).build_documents(vec![
            SourceDocument::new(
                "projects/broken.mdx",
                "---\ntitle: Broken\ndate: 2024-01-01\n---\n",
            ),
            SourceDocument::new(
                "projects/ok.mdx",
                "---\ntitle: Ok\ndate: 2024-01-01\ndescription: fine\n---\n",
            ),
            post("life/rest.mdx", "Rest"),
        ]);

        assert_eq!(build.errors.len(), 1);
        assert_eq!(build.errors[0].field(), Some("description"));
        assert_eq!(build.catalog.projects.len(), 1);
        assert_eq!(build.catalog.projects[0].slug_as_params, "ok");
        assert_eq!(build.catalog.posts.len(), 1);
        assert!(build.error_report().contains("projects/broken.mdx"));
    }

    #[test]
    fn test_unclassified_documents_are_skipped() {
        let build = builder(DuplicatePolicy::Reject)
            .build_documents(vec![SourceDocument::new("notes.txt", "plain text")]);

        assert!(build.is_clean());
        assert!(build.catalog.is_empty());
        assert_eq!(build.skipped, vec![PathBuf::from("notes.txt")]);
    }

    #[test]
    fn test_missing_root() {
        let result = CatalogBuilder::new("/definitely/not/here").build();
        assert!(result.is_err());
    }
}
