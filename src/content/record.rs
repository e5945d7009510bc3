//! Typed content records and their computed fields.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::error::ContentError;
use super::frontmatter::Frontmatter;
use super::kind::DocumentKind;
use super::schema::{DocumentSchema, PublishedFlag, SchemaOptions, ValidatedFields};

/// Category used when neither the header nor the path provides one
pub const UNCATEGORIZED: &str = "uncategorized";

/// Words per minute for reading-time estimates
const WORDS_PER_MINUTE: usize = 200;

/// A validated document with its kind-specific fields
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record<F> {
    /// Path relative to the content root
    pub source_path: PathBuf,

    pub title: String,

    /// Publication date; `startDate` for experiences
    pub date: NaiveDate,

    pub description: Option<String>,

    /// Published indicator as authored
    pub raw_published_flag: Option<PublishedFlag>,

    pub is_published: bool,

    pub slug_as_params: String,

    pub slug: String,

    /// Opaque document body
    pub body: String,

    /// SHA-256 of the raw document (hex)
    pub content_digest: String,

    pub word_count: usize,

    #[serde(flatten)]
    pub fields: F,
}

impl<F> Record<F> {
    /// Filename without extension
    pub fn stem(&self) -> &str {
        file_stem(&self.source_path)
    }

    /// Estimated minutes to read the body (at least one)
    pub fn reading_time_minutes(&self) -> usize {
        self.word_count.div_ceil(WORDS_PER_MINUTE).max(1)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostFields {
    /// Never empty
    pub category: String,
    pub image: Option<String>,
    #[serde(default)]
    pub techs: Vec<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub github: Option<String>,
    pub demo: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFields {
    pub image: Option<String>,
    pub github: Option<String>,
    pub demo: Option<String>,
    #[serde(default)]
    pub techs: Vec<String>,
    #[serde(default)]
    pub featured: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceFields {
    /// Filename stem
    pub id: String,
    pub company: String,
    pub location: Option<String>,
    /// `None` means ongoing
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub current: bool,
    #[serde(default)]
    pub techs: Vec<String>,
}

pub type Post = Record<PostFields>;
pub type Project = Record<ProjectFields>;
pub type Experience = Record<ExperienceFields>;

/// A document read from disk, before validation
#[derive(Debug, Clone)]
pub struct SourceDocument {
    /// Path relative to the content root
    pub path: PathBuf,
    pub raw: String,
}

impl SourceDocument {
    pub fn new(path: impl Into<PathBuf>, raw: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            raw: raw.into(),
        }
    }

    fn header(&self) -> Result<Frontmatter, ContentError> {
        Frontmatter::parse(&self.raw).map_err(|message| ContentError::Frontmatter {
            path: self.path.clone(),
            message,
        })
    }

    fn digest(&self) -> String {
        hex::encode(Sha256::digest(self.raw.as_bytes()))
    }
}

/// Fields every kind shares, gathered before the kind-specific part
struct Common {
    title: String,
    description: Option<String>,
    raw_published_flag: Option<PublishedFlag>,
    body: String,
    content_digest: String,
    word_count: usize,
}

impl Common {
    fn take(
        doc: &SourceDocument,
        header: Frontmatter,
        fields: &mut ValidatedFields,
    ) -> Result<Self, ContentError> {
        Ok(Self {
            title: fields.require_string("title")?,
            description: fields.string("description"),
            raw_published_flag: fields.published(),
            word_count: header.body.split_whitespace().count(),
            body: header.body,
            content_digest: doc.digest(),
        })
    }

    fn into_record<F>(
        self,
        doc: &SourceDocument,
        kind: DocumentKind,
        date: NaiveDate,
        slug_as_params: String,
        fields: F,
    ) -> Record<F> {
        Record {
            source_path: doc.path.clone(),
            title: self.title,
            date,
            description: self.description,
            is_published: PublishedFlag::resolve(self.raw_published_flag.as_ref()),
            raw_published_flag: self.raw_published_flag,
            slug: route(kind, &slug_as_params),
            slug_as_params,
            body: self.body,
            content_digest: self.content_digest,
            word_count: self.word_count,
            fields,
        }
    }
}

/// Parse, validate and derive a post
pub fn build_post(doc: &SourceDocument, options: SchemaOptions) -> Result<Post, ContentError> {
    let header = doc.header()?;
    let mut fields =
        DocumentSchema::for_kind(DocumentKind::Post, options).validate(&header, &doc.path)?;

    let date = fields.require_date("date")?;
    let common = Common::take(doc, header, &mut fields)?;

    // category, then slug parts, then slug; publication is resolved last
    let category = resolve_category(fields.string("category").as_deref(), &doc.path)?;
    let slug_as_params = post_slug_params(&category, &doc.path);

    let post_fields = PostFields {
        category,
        image: fields.string("image"),
        techs: fields.list("techs"),
        company: fields.string("company"),
        location: fields.string("location"),
        start_date: fields.date("startDate"),
        end_date: fields.date("endDate"),
        github: fields.string("github"),
        demo: fields.string("demo"),
    };

    Ok(common.into_record(doc, DocumentKind::Post, date, slug_as_params, post_fields))
}

/// Parse, validate and derive a project
pub fn build_project(
    doc: &SourceDocument,
    options: SchemaOptions,
) -> Result<Project, ContentError> {
    let header = doc.header()?;
    let mut fields =
        DocumentSchema::for_kind(DocumentKind::Project, options).validate(&header, &doc.path)?;

    let date = fields.require_date("date")?;
    let common = Common::take(doc, header, &mut fields)?;
    let slug_as_params = file_stem(&doc.path).to_string();

    let project_fields = ProjectFields {
        image: fields.string("image"),
        github: fields.string("github"),
        demo: fields.string("demo"),
        techs: fields.list("techs"),
        featured: fields.boolean("featured"),
    };

    Ok(common.into_record(doc, DocumentKind::Project, date, slug_as_params, project_fields))
}

/// Parse, validate and derive an experience entry
pub fn build_experience(
    doc: &SourceDocument,
    options: SchemaOptions,
) -> Result<Experience, ContentError> {
    let header = doc.header()?;
    let mut fields =
        DocumentSchema::for_kind(DocumentKind::Experience, options).validate(&header, &doc.path)?;

    let start_date = fields.require_date("startDate")?;
    let company = fields.require_string("company")?;
    let common = Common::take(doc, header, &mut fields)?;
    let id = file_stem(&doc.path).to_string();

    let experience_fields = ExperienceFields {
        id: id.clone(),
        company,
        location: fields.string("location"),
        end_date: fields.date("endDate"),
        current: fields.boolean("current"),
        techs: fields.list("techs"),
    };

    Ok(common.into_record(doc, DocumentKind::Experience, start_date, id, experience_fields))
}

/// Explicit category, else the parent directory name, else `uncategorized`
pub fn resolve_category(
    explicit: Option<&str>,
    source_path: &Path,
) -> Result<String, ContentError> {
    let category = match explicit.map(str::trim).filter(|c| !c.is_empty()) {
        Some(category) => category.to_string(),
        None => match source_path.parent().and_then(|p| p.file_name()) {
            Some(dir) => dir.to_string_lossy().trim().to_string(),
            None => UNCATEGORIZED.to_string(),
        },
    };

    if category.is_empty() {
        return Err(ContentError::AmbiguousCategory {
            path: source_path.to_path_buf(),
        });
    }
    Ok(category)
}

/// `<category>/<stem>`
pub fn post_slug_params(category: &str, source_path: &Path) -> String {
    format!("{}/{}", category, file_stem(source_path))
}

/// Prefix slug params with the kind's route root
pub fn route(kind: DocumentKind, slug_as_params: &str) -> String {
    format!("{}/{}", kind.route_root(), slug_as_params)
}

fn file_stem(path: &Path) -> &str {
    path.file_stem().and_then(|s| s.to_str()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(path: &str, raw: &str) -> SourceDocument {
        SourceDocument::new(path, raw)
    }

    #[test]
    fn test_post_end_to_end() {
        let post = build_post(
            &doc(
                "posts/intro.mdx",
                "---\ntitle: Intro\ndate: 2024-01-01\ncategory: technical\npublished: \"true\\r\"\n---\nHello there\n",
            ),
            SchemaOptions::default(),
        )
        .unwrap();

        assert_eq!(post.fields.category, "technical");
        assert_eq!(post.slug_as_params, "technical/intro");
        assert_eq!(post.slug, "/blog/technical/intro");
        assert!(post.is_published);
        assert_eq!(
            post.raw_published_flag,
            Some(PublishedFlag::Text("true\r".to_string()))
        );
        assert_eq!(post.word_count, 2);
        assert_eq!(post.reading_time_minutes(), 1);
        assert_eq!(post.content_digest.len(), 64);
    }

    #[test]
    fn test_category_fallback() {
        let path = Path::new("life/rest.mdx");
        assert_eq!(resolve_category(None, path).unwrap(), "life");
        assert_eq!(resolve_category(Some("  "), path).unwrap(), "life");
        assert_eq!(resolve_category(Some("travel"), path).unwrap(), "travel");
        assert_eq!(
            resolve_category(None, Path::new("rest.mdx")).unwrap(),
            UNCATEGORIZED
        );
        assert_eq!(
            resolve_category(None, Path::new("a/b/c/deep.mdx")).unwrap(),
            "c"
        );
    }

    #[test]
    fn test_blank_directory_category_is_ambiguous() {
        let path = Path::new("  /stray.mdx");
        match resolve_category(None, path) {
            Err(ContentError::AmbiguousCategory { path: reported }) => {
                assert_eq!(reported, PathBuf::from("  /stray.mdx"));
            }
            other => panic!("Expected AmbiguousCategory, got {:?}", other),
        }

        // an explicit category still wins over a blank directory
        assert_eq!(resolve_category(Some("life"), path).unwrap(), "life");

        let result = build_post(
            &doc("\t/stray.mdx", "---\ntitle: Stray\ndate: 2024-01-01\n---\n"),
            SchemaOptions::default(),
        );
        let err = result.unwrap_err();
        assert!(matches!(err, ContentError::AmbiguousCategory { .. }));
        assert_eq!(err.field(), Some("category"));
    }

    #[test]
    fn test_slug_params_are_deterministic() {
        let path = Path::new("technical/transformers.mdx");
        let first = post_slug_params("technical", path);
        let second = post_slug_params("technical", path);
        assert_eq!(first, second);
        assert_eq!(first, "technical/transformers");
        assert_eq!(route(DocumentKind::Post, &first), "/blog/technical/transformers");
    }

    #[test]
    fn test_project_missing_description() {
        let result = build_project(
            &doc("projects/demo.mdx", "---\ntitle: Demo\ndate: 2024-01-01\n---\n"),
            SchemaOptions::default(),
        );

        match result {
            Err(ContentError::SchemaValidation { field, path }) => {
                assert_eq!(field, "description");
                assert_eq!(path, PathBuf::from("projects/demo.mdx"));
            }
            other => panic!("Expected SchemaValidation, got {:?}", other),
        }
    }

    #[test]
    fn test_project_slug_uses_stem() {
        let project = build_project(
            &doc(
                "projects/ml/style-transfer.mdx",
                "---\ntitle: Style\ndate: 2023-12-01\ndescription: NST\nfeatured: true\ntechs: [Python, Keras]\n---\n",
            ),
            SchemaOptions::default(),
        )
        .unwrap();

        assert_eq!(project.slug_as_params, "style-transfer");
        assert_eq!(project.slug, "/projects/style-transfer");
        assert!(project.fields.featured);
        assert_eq!(project.fields.techs, vec!["Python", "Keras"]);
    }

    #[test]
    fn test_experience_malformed_start_date() {
        let result = build_experience(
            &doc(
                "experiences/acme.mdx",
                "---\ntitle: Engineer\ncompany: Acme\nstartDate: \"not-a-date\"\n---\n",
            ),
            SchemaOptions::default(),
        );

        match result {
            Err(ContentError::FieldType { field, .. }) => assert_eq!(field, "startDate"),
            other => panic!("Expected FieldType, got {:?}", other),
        }
    }

    #[test]
    fn test_experience_fields() {
        let exp = build_experience(
            &doc(
                "experiences/acme.mdx",
                "---\ntitle: Engineer\ncompany: Acme\nstartDate: 2022-05-01\ncurrent: true\npublished: false\n---\n",
            ),
            SchemaOptions::default(),
        )
        .unwrap();

        assert_eq!(exp.fields.id, "acme");
        assert_eq!(exp.slug, "/experience/acme");
        assert_eq!(exp.date, NaiveDate::from_ymd_opt(2022, 5, 1).unwrap());
        assert!(exp.fields.current);
        assert!(exp.fields.end_date.is_none());
        assert!(!exp.is_published);
    }

    #[test]
    fn test_record_json_uses_camel_case() {
        let post = build_post(
            &doc("life/rest.mdx", "---\ntitle: Rest\ndate: 2024-02-02\n---\n"),
            SchemaOptions::default(),
        )
        .unwrap();

        let json = serde_json::to_value(&post).unwrap();
        assert_eq!(json["slugAsParams"], "life/rest");
        assert_eq!(json["isPublished"], true);
        assert_eq!(json["category"], "life");
        assert_eq!(json["sourcePath"], "life/rest.mdx");
    }
}
