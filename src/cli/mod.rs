//! Command-line interface for folio.
//!
//! Provides commands for building and checking the catalog, listing and
//! inspecting records, and rebuilding on change.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use crate::config::{self, ResolvedConfig};
use crate::content::{CatalogBuild, DocumentKind, DocumentSchema, RecordRef};
use crate::watch::{load_previous, CatalogWatcher};

/// folio - content catalog builder for a portfolio site
#[derive(Parser, Debug)]
#[command(name = "folio")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Content root (overrides config and FOLIO_CONTENT_DIR)
    #[arg(long, global = true)]
    pub content_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the catalog and write it as JSON
    Build {
        /// Output file (defaults to the configured output)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate every document and list problems
    Check,

    /// List records
    List {
        /// Kind of record to list
        #[arg(short, long, value_enum, default_value = "post")]
        kind: KindArg,

        /// Only posts in this category
        #[arg(short, long)]
        category: Option<String>,

        /// Include unpublished records
        #[arg(long)]
        all: bool,

        /// Maximum number of records to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Show a record by slug (`/blog/technical/intro` or `technical/intro`)
    Show {
        slug: String,

        /// Print the body as well
        #[arg(short, long)]
        full: bool,
    },

    /// List categories of published posts
    Categories,

    /// Print the schema for each document kind
    Schema,

    /// Rebuild the catalog whenever content changes
    Watch {
        /// Output file (defaults to the configured output)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Quiet period before a rebuild, in milliseconds
        #[arg(long, default_value = "500")]
        debounce_ms: u64,
    },

    /// Show resolved configuration (debug)
    Config,
}

/// Document kind for CLI (maps to DocumentKind)
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum KindArg {
    Post,
    Project,
    Experience,
}

impl From<KindArg> for DocumentKind {
    fn from(k: KindArg) -> Self {
        match k {
            KindArg::Post => DocumentKind::Post,
            KindArg::Project => DocumentKind::Project,
            KindArg::Experience => DocumentKind::Experience,
        }
    }
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        let mut config = config::config()?.clone();
        if let Some(dir) = self.content_dir {
            config.content_dir = dir;
        }

        match self.command {
            Commands::Build { output } => build(&config, output).await,
            Commands::Check => check(&config),
            Commands::List {
                kind,
                category,
                all,
                limit,
            } => list(&config, kind.into(), category, all, limit),
            Commands::Show { slug, full } => show(&config, &slug, full),
            Commands::Categories => categories(&config),
            Commands::Schema => show_schema(&config),
            Commands::Watch {
                output,
                debounce_ms,
            } => watch(&config, output, Duration::from_millis(debounce_ms)).await,
            Commands::Config => show_config(&config),
        }
    }
}

/// Build the catalog from the configured content root
fn build_catalog(config: &ResolvedConfig) -> Result<CatalogBuild> {
    config
        .builder()?
        .build()
        .with_context(|| format!("Failed to build catalog from {}", config.content_dir.display()))
}

fn print_errors(build: &CatalogBuild) {
    if build.is_clean() {
        return;
    }
    eprintln!("{} document(s) rejected:", build.errors.len());
    eprintln!("{}", build.error_report());
}

/// Build and write the catalog
async fn build(config: &ResolvedConfig, output: Option<PathBuf>) -> Result<()> {
    let output = output.unwrap_or_else(|| config.output.clone());
    let build = build_catalog(config)?;

    let unchanged = load_previous(&output)
        .await
        .is_some_and(|previous| previous.fingerprint() == build.catalog.fingerprint());

    if unchanged {
        println!("Catalog unchanged ({} records)", build.catalog.len());
    } else {
        build.catalog.save(&output).await?;
        println!(
            "Wrote {} posts, {} projects, {} experiences to {}",
            build.catalog.posts.len(),
            build.catalog.projects.len(),
            build.catalog.experiences.len(),
            output.display()
        );
    }

    print_errors(&build);
    Ok(())
}

/// Validate everything; fails when any document was rejected
fn check(config: &ResolvedConfig) -> Result<()> {
    let build = build_catalog(config)?;

    println!(
        "Checked {} documents ({} skipped)",
        build.catalog.len() + build.errors.len(),
        build.skipped.len()
    );

    if build.is_clean() {
        println!("All documents valid");
        return Ok(());
    }

    println!("{:<48} {:<14} PROBLEM", "DOCUMENT", "FIELD");
    println!("{}", "-".repeat(90));
    for error in &build.errors {
        println!(
            "{:<48} {:<14} {}",
            error.path().display(),
            error.field().unwrap_or("-"),
            error
        );
    }

    anyhow::bail!("{} document(s) failed validation", build.errors.len())
}

/// List records of one kind
fn list(
    config: &ResolvedConfig,
    kind: DocumentKind,
    category: Option<String>,
    all: bool,
    limit: usize,
) -> Result<()> {
    let build = build_catalog(config)?;
    let catalog = &build.catalog;

    if category.is_some() && kind != DocumentKind::Post {
        anyhow::bail!("--category only applies to posts");
    }

    let rows: Vec<RecordRef<'_>> = match kind {
        DocumentKind::Post => {
            let mut query = catalog.posts();
            if !all {
                query = query.published();
            }
            if let Some(category) = &category {
                query = query.in_category(category);
            }
            query
                .sorted_by_date_desc()
                .limit(limit)
                .collect()
                .into_iter()
                .map(RecordRef::Post)
                .collect()
        }
        DocumentKind::Project => {
            let mut query = catalog.projects();
            if !all {
                query = query.published();
            }
            query
                .sorted_by_date_desc()
                .limit(limit)
                .collect()
                .into_iter()
                .map(RecordRef::Project)
                .collect()
        }
        DocumentKind::Experience => {
            let items = if all {
                catalog.experiences().sorted_by_date_desc().collect()
            } else {
                catalog.timeline()
            };
            items
                .into_iter()
                .take(limit)
                .map(RecordRef::Experience)
                .collect()
        }
    };

    if rows.is_empty() {
        println!("No {}s found", kind);
        print_errors(&build);
        return Ok(());
    }

    println!("{:<12} {:<44} {:<40}", "DATE", "SLUG", "TITLE");
    println!("{}", "-".repeat(96));

    for row in rows {
        let marker = if row.is_published() { "" } else { " (draft)" };
        println!(
            "{:<12} {:<44} {}{}",
            row.date().to_string(),
            row.slug(),
            row.title(),
            marker
        );
    }

    print_errors(&build);
    Ok(())
}

/// Show one record
fn show(config: &ResolvedConfig, slug: &str, full: bool) -> Result<()> {
    let build = build_catalog(config)?;
    let record = build
        .catalog
        .find(slug)
        .with_context(|| format!("No record with slug: {}", slug))?;

    let mut json = record.to_json()?;
    if !full {
        if let Some(map) = json.as_object_mut() {
            map.remove("body");
        }
    }

    println!("Kind: {}", record.kind());
    println!("Source: {}", record.source_path().display());
    println!("{}", serde_json::to_string_pretty(&json)?);

    Ok(())
}

/// List published post categories
fn categories(config: &ResolvedConfig) -> Result<()> {
    let build = build_catalog(config)?;

    for category in build.catalog.categories() {
        let count = build.catalog.posts().published().in_category(category).len();
        println!("{:<24} {:>4}  /blog/{}", category, count, category);
    }

    Ok(())
}

/// Print the schema in effect
fn show_schema(config: &ResolvedConfig) -> Result<()> {
    let options = config.builder_options()?;

    for kind in DocumentKind::MATCH_ORDER {
        let schema = DocumentSchema::for_kind(kind, options.schema);
        println!("{} ({})", kind, options.matcher.patterns(kind).join(", "));
        for field in &schema.fields {
            let required = if field.required { "required" } else { "optional" };
            println!("  {:<14} {:<22} {}", field.name, field.field_type, required);
        }
        println!();
    }

    Ok(())
}

/// Rebuild on change until interrupted
async fn watch(config: &ResolvedConfig, output: Option<PathBuf>, debounce: Duration) -> Result<()> {
    let output = output.unwrap_or_else(|| config.output.clone());
    let watcher = CatalogWatcher::new(config.builder()?)
        .with_output(&output)
        .with_debounce(debounce);

    let (mut events, handle) = watcher.watch().await?;
    println!("Watching {} (Ctrl-C to stop)", config.content_dir.display());

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(event) => println!(
                    "Catalog rebuilt: {} records, {} errors",
                    event.records, event.errors
                ),
                None => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    handle.stop().await
}

/// Show resolved configuration
fn show_config(config: &ResolvedConfig) -> Result<()> {
    println!("Content: {}", config.content_dir.display());
    println!("Output: {}", config.output.display());
    match &config.config_file {
        Some(path) => println!("Config file: {}", path.display()),
        None => println!("Config file: (none, using defaults)"),
    }
    println!("{}", serde_yaml::to_string(config)?);
    Ok(())
}
