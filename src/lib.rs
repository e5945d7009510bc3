//! folio - content catalog builder for a portfolio site
//!
//! Scans a tree of markdown documents with YAML header blocks and produces
//! an immutable catalog of typed records: blog posts, project showcases and
//! experience timeline entries.
//!
//! # Pipeline
//!
//! - Documents are classified by path pattern into a kind
//! - Headers are validated against one parameterized schema
//! - Derived fields (category, slugs, publication state) are computed
//! - Bad documents are reported, good ones still make it into the catalog
//!
//! # Modules
//!
//! - `content`: Schemas, records, builder and queries
//! - `config`: Configuration discovery and resolution
//! - `watch`: Rebuild-on-change watcher
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Validate every document
//! folio check
//!
//! # Write the catalog for the site
//! folio build --output public/catalog.json
//!
//! # Newest published posts in a category
//! folio list --kind post --category technical
//! ```

pub mod cli;
pub mod config;
pub mod content;
pub mod watch;

// Re-export main types at crate root for convenience
pub use content::{
    Catalog, CatalogBuild, CatalogBuilder, ContentError, DocumentKind, Experience, Post, Project,
    RecordQuery,
};
pub use watch::{CatalogWatcher, WatchHandle};
