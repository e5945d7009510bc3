//! The built catalog: three immutable record collections.
//!
//! Persisted as pretty JSON so the rendering layer can read it without
//! re-validating anything.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::fs;

use super::kind::DocumentKind;
use super::query::{normalize_category, RecordQuery};
use super::record::{Experience, ExperienceFields, Post, PostFields, Project, ProjectFields};

/// Catalog of every validated record, grouped by kind
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    /// Catalog format version
    pub version: u32,

    /// When the catalog was built
    pub generated_at: DateTime<Utc>,

    pub posts: Vec<Post>,

    pub projects: Vec<Project>,

    pub experiences: Vec<Experience>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new(Vec::new(), Vec::new(), Vec::new())
    }
}

impl Catalog {
    /// Create a catalog from collections in scan order
    pub fn new(posts: Vec<Post>, projects: Vec<Project>, experiences: Vec<Experience>) -> Self {
        Self {
            version: 1,
            generated_at: Utc::now(),
            posts,
            projects,
            experiences,
        }
    }

    /// Load a catalog written by [`Catalog::save`]
    pub async fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read catalog: {}", path.display()))?;

        serde_json::from_str(&content).context("Failed to parse catalog JSON")
    }

    /// Save the catalog as pretty JSON
    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)
            .await
            .with_context(|| format!("Failed to write catalog: {}", path.display()))?;

        Ok(())
    }

    /// Query over posts
    pub fn posts(&self) -> RecordQuery<'_, PostFields> {
        RecordQuery::new(&self.posts)
    }

    /// Query over projects
    pub fn projects(&self) -> RecordQuery<'_, ProjectFields> {
        RecordQuery::new(&self.projects)
    }

    /// Query over experiences
    pub fn experiences(&self) -> RecordQuery<'_, ExperienceFields> {
        RecordQuery::new(&self.experiences)
    }

    /// Every record of one kind, in scan order
    pub fn records(&self, kind: DocumentKind) -> Vec<RecordRef<'_>> {
        match kind {
            DocumentKind::Post => self.posts.iter().map(RecordRef::Post).collect(),
            DocumentKind::Project => self.projects.iter().map(RecordRef::Project).collect(),
            DocumentKind::Experience => {
                self.experiences.iter().map(RecordRef::Experience).collect()
            }
        }
    }

    /// Look up a post by `slug_as_params` (`technical/intro`)
    pub fn find_post(&self, slug_as_params: &str) -> Option<&Post> {
        self.posts.iter().find(|p| p.slug_as_params == slug_as_params)
    }

    /// Look up a project by `slug_as_params`
    pub fn find_project(&self, slug_as_params: &str) -> Option<&Project> {
        self.projects
            .iter()
            .find(|p| p.slug_as_params == slug_as_params)
    }

    /// Find any record by full slug (`/blog/technical/intro`) or slug params
    pub fn find(&self, slug: &str) -> Option<RecordRef<'_>> {
        let matches = |full: &str, params: &str| full == slug || params == slug;

        self.posts
            .iter()
            .find(|r| matches(&r.slug, &r.slug_as_params))
            .map(RecordRef::Post)
            .or_else(|| {
                self.projects
                    .iter()
                    .find(|r| matches(&r.slug, &r.slug_as_params))
                    .map(RecordRef::Project)
            })
            .or_else(|| {
                self.experiences
                    .iter()
                    .find(|r| matches(&r.slug, &r.slug_as_params))
                    .map(RecordRef::Experience)
            })
    }

    /// Unique categories of published posts, sorted.
    ///
    /// Categories that differ only in case or surrounding whitespace are one
    /// category, the same way [`RecordQuery::in_category`] matches them; the
    /// first spelling in scan order is kept.
    pub fn categories(&self) -> Vec<&str> {
        let mut unique: BTreeMap<String, &str> = BTreeMap::new();
        for post in self.posts.iter().filter(|p| p.is_published) {
            let category = post.fields.category.as_str();
            unique.entry(normalize_category(category)).or_insert(category);
        }
        unique.into_values().collect()
    }

    /// Published experiences: current roles first, then newest start date
    pub fn timeline(&self) -> Vec<&Experience> {
        let mut items: Vec<_> = self.experiences.iter().filter(|e| e.is_published).collect();
        items.sort_by(|a, b| {
            b.fields
                .current
                .cmp(&a.fields.current)
                .then_with(|| b.date.cmp(&a.date))
        });
        items
    }

    /// Digest over every record's identity and content; stable across rebuilds
    /// of unchanged content
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for kind in DocumentKind::MATCH_ORDER {
            hasher.update(kind.to_string().as_bytes());
            for record in self.records(kind) {
                hasher.update(record.slug().as_bytes());
                hasher.update(record.content_digest().as_bytes());
            }
        }
        hex::encode(hasher.finalize())
    }

    /// Total number of records
    pub fn len(&self) -> usize {
        self.posts.len() + self.projects.len() + self.experiences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Borrowed record of any kind
#[derive(Debug, Clone, Copy)]
pub enum RecordRef<'a> {
    Post(&'a Post),
    Project(&'a Project),
    Experience(&'a Experience),
}

impl<'a> RecordRef<'a> {
    pub fn kind(&self) -> DocumentKind {
        match self {
            RecordRef::Post(_) => DocumentKind::Post,
            RecordRef::Project(_) => DocumentKind::Project,
            RecordRef::Experience(_) => DocumentKind::Experience,
        }
    }

    pub fn title(&self) -> &'a str {
        match self {
            RecordRef::Post(r) => &r.title,
            RecordRef::Project(r) => &r.title,
            RecordRef::Experience(r) => &r.title,
        }
    }

    pub fn slug(&self) -> &'a str {
        match self {
            RecordRef::Post(r) => &r.slug,
            RecordRef::Project(r) => &r.slug,
            RecordRef::Experience(r) => &r.slug,
        }
    }

    pub fn date(&self) -> NaiveDate {
        match self {
            RecordRef::Post(r) => r.date,
            RecordRef::Project(r) => r.date,
            RecordRef::Experience(r) => r.date,
        }
    }

    pub fn is_published(&self) -> bool {
        match self {
            RecordRef::Post(r) => r.is_published,
            RecordRef::Project(r) => r.is_published,
            RecordRef::Experience(r) => r.is_published,
        }
    }

    pub fn source_path(&self) -> &'a PathBuf {
        match self {
            RecordRef::Post(r) => &r.source_path,
            RecordRef::Project(r) => &r.source_path,
            RecordRef::Experience(r) => &r.source_path,
        }
    }

    pub fn content_digest(&self) -> &'a str {
        match self {
            RecordRef::Post(r) => &r.content_digest,
            RecordRef::Project(r) => &r.content_digest,
            RecordRef::Experience(r) => &r.content_digest,
        }
    }

    /// JSON rendering of the record
    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        match self {
            RecordRef::Post(r) => serde_json::to_value(r),
            RecordRef::Project(r) => serde_json::to_value(r),
            RecordRef::Experience(r) => serde_json::to_value(r),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::record::{build_experience, build_post, SourceDocument};
    use crate::content::schema::SchemaOptions;

    fn post(path: &str, date: &str, extra: &str) -> Post {
        build_post(
            &SourceDocument::new(
                path,
                format!("---\ntitle: {path}\ndate: {date}\n{extra}\n---\nbody\n"),
            ),
            SchemaOptions::default(),
        )
        .unwrap()
    }

    fn experience(path: &str, start: &str, current: bool) -> Experience {
        build_experience(
            &SourceDocument::new(
                path,
                format!(
                    "---\ntitle: Role\ncompany: Co\nstartDate: {start}\ncurrent: {current}\n---\n"
                ),
            ),
            SchemaOptions::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_categories_are_unique_and_published_only() {
        let catalog = Catalog::new(
            vec![
                post("technical/a.mdx", "2024-01-01", ""),
                post("life/b.mdx", "2024-01-02", ""),
                post("technical/c.mdx", "2024-01-03", ""),
                post("drafts/d.mdx", "2024-01-04", "published: false"),
            ],
            Vec::new(),
            Vec::new(),
        );

        assert_eq!(catalog.categories(), vec!["life", "technical"]);
    }

    #[test]
    fn test_categories_ignore_case_and_whitespace() {
        let catalog = Catalog::new(
            vec![
                post("misc/a.mdx", "2024-01-01", "category: Technical"),
                post("technical/b.mdx", "2024-01-02", ""),
                post("notes/c.mdx", "2024-01-03", "category: \" technical \""),
                post("life/d.mdx", "2024-01-04", ""),
            ],
            Vec::new(),
            Vec::new(),
        );

        let categories = catalog.categories();
        assert_eq!(categories, vec!["life", "Technical"]);

        // every listed category selects exactly the posts filed under it
        let total: usize = categories
            .iter()
            .map(|c| catalog.posts().published().in_category(c).len())
            .sum();
        assert_eq!(total, catalog.posts.len());
    }

    #[test]
    fn test_find_by_slug() {
        let catalog = Catalog::new(
            vec![post("technical/intro.mdx", "2024-01-01", "")],
            Vec::new(),
            vec![experience("experiences/acme.mdx", "2020-01-01", false)],
        );

        assert!(catalog.find_post("technical/intro").is_some());
        assert!(catalog.find_post("intro").is_none());

        let found = catalog.find("/blog/technical/intro").unwrap();
        assert_eq!(found.kind(), DocumentKind::Post);

        let found = catalog.find("acme").unwrap();
        assert_eq!(found.kind(), DocumentKind::Experience);
        assert!(catalog.find("/projects/nothing").is_none());
    }

    #[test]
    fn test_timeline_current_first() {
        let catalog = Catalog::new(
            Vec::new(),
            Vec::new(),
            vec![
                experience("experiences/old.mdx", "2018-01-01", false),
                experience("experiences/now.mdx", "2021-06-01", true),
                experience("experiences/recent.mdx", "2022-01-01", false),
            ],
        );

        let ids: Vec<_> = catalog
            .timeline()
            .iter()
            .map(|e| e.fields.id.as_str())
            .collect();
        assert_eq!(ids, vec!["now", "recent", "old"]);
    }

    #[test]
    fn test_fingerprint_tracks_content() {
        let a = Catalog::new(vec![post("t/a.mdx", "2024-01-01", "")], Vec::new(), Vec::new());
        let b = Catalog::new(vec![post("t/a.mdx", "2024-01-01", "")], Vec::new(), Vec::new());
        let c = Catalog::new(vec![post("t/a.mdx", "2024-01-02", "")], Vec::new(), Vec::new());

        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("out").join("catalog.json");

        let catalog = Catalog::new(
            vec![post("technical/intro.mdx", "2024-01-01", "published: \"true\\r\"")],
            Vec::new(),
            vec![experience("experiences/acme.mdx", "2020-01-01", true)],
        );
        catalog.save(&path).await.unwrap();

        let loaded = Catalog::load(&path).await.unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.posts[0].slug, "/blog/technical/intro");
        assert_eq!(loaded.posts[0].raw_published_flag, catalog.posts[0].raw_published_flag);
        assert!(loaded.experiences[0].fields.current);
        assert_eq!(loaded.fingerprint(), catalog.fingerprint());
    }
}
