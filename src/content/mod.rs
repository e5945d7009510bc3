//! Content typing and derivation.
//!
//! Turns a tree of header-block documents into validated, queryable records.
//!
//! # Content Layout
//!
//! ```text
//! content/
//! ├── technical/
//! │   └── intro.mdx          # Post, category "technical"
//! ├── hello.mdx              # Post, category "uncategorized"
//! ├── projects/
//! │   └── style-transfer.mdx # Project
//! └── experiences/
//!     └── acme.mdx           # Experience
//! ```

pub mod builder;
pub mod catalog;
pub mod error;
pub mod frontmatter;
pub mod kind;
pub mod query;
pub mod record;
pub mod schema;

pub use builder::{BuilderOptions, CatalogBuild, CatalogBuilder, DuplicatePolicy};
pub use catalog::{Catalog, RecordRef};
pub use error::ContentError;
pub use frontmatter::Frontmatter;
pub use kind::{DocumentKind, KindMatcher};
pub use query::RecordQuery;
pub use record::{
    Experience, ExperienceFields, Post, PostFields, Project, ProjectFields, Record,
    SourceDocument,
};
pub use schema::{
    CategoryPolicy, DocumentSchema, FieldSpec, FieldType, PublishedFlag, PublishedPolicy,
    SchemaOptions,
};
