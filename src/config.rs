//! Configuration for folio.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (FOLIO_CONTENT_DIR, FOLIO_OUTPUT)
//! 2. Project config file (.folio/config.yaml)
//! 3. User config file (~/.config/folio/config.yaml)
//! 4. Defaults (./content, ./.folio/catalog.json)
//!
//! Config file discovery:
//! - Searches current directory and parents for .folio/config.yaml
//! - Paths in a project config are relative to the project root (the
//!   directory holding `.folio/`)

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::content::{
    BuilderOptions, CatalogBuilder, DocumentKind, DuplicatePolicy, KindMatcher, SchemaOptions,
};

pub const ENV_CONTENT_DIR: &str = "FOLIO_CONTENT_DIR";
pub const ENV_OUTPUT: &str = "FOLIO_OUTPUT";

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub schema: SchemaOptions,
    #[serde(default)]
    pub duplicates: DuplicatePolicy,
    #[serde(default)]
    pub kinds: KindsConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// Content root (relative to project root)
    pub content: Option<String>,
    /// Catalog JSON output (relative to project root)
    pub output: Option<String>,
}

/// Per-kind path patterns; unset kinds keep their defaults
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KindsConfig {
    pub post: Option<Vec<String>>,
    pub project: Option<Vec<String>>,
    pub experience: Option<Vec<String>>,
}

impl KindsConfig {
    fn get(&self, kind: DocumentKind) -> Option<&Vec<String>> {
        match kind {
            DocumentKind::Post => self.post.as_ref(),
            DocumentKind::Project => self.project.as_ref(),
            DocumentKind::Experience => self.experience.as_ref(),
        }
    }
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedConfig {
    /// Content root
    pub content_dir: PathBuf,
    /// Where `build` writes the catalog
    pub output: PathBuf,
    pub schema: SchemaOptions,
    pub duplicates: DuplicatePolicy,
    /// Path patterns per kind
    pub kinds: BTreeMap<DocumentKind, Vec<String>>,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

impl ResolvedConfig {
    /// Builder options for this configuration
    pub fn builder_options(&self) -> Result<BuilderOptions> {
        let matcher = KindMatcher::from_patterns(|kind| {
            self.kinds
                .get(&kind)
                .cloned()
                .unwrap_or_else(|| kind.default_patterns())
        })?;

        Ok(BuilderOptions {
            schema: self.schema,
            duplicates: self.duplicates,
            matcher,
        })
    }

    /// A builder over the configured content root
    pub fn builder(&self) -> Result<CatalogBuilder> {
        Ok(CatalogBuilder::new(&self.content_dir).with_options(self.builder_options()?))
    }
}

/// Find config file by searching `start` and its parents
fn find_config_file(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        let config_path = current.join(".folio").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// User-level config, if present
fn user_config_file() -> Option<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join("folio").join("config.yaml"))
        .filter(|path| path.exists())
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to `base`
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
            .canonicalize()
            .unwrap_or_else(|_| base.join(path_str))
    }
}

/// Combine a config file (if any), environment and defaults
fn resolve<E>(cwd: &Path, config_file: Option<PathBuf>, env: E) -> Result<ResolvedConfig>
where
    E: Fn(&str) -> Option<String>,
{
    let config = config_file
        .as_deref()
        .map(load_config_file)
        .transpose()?;

    // Project configs live in <root>/.folio/config.yaml; anything else resolves from cwd
    let base_dir = config_file
        .as_deref()
        .filter(|p| p.parent().and_then(|d| d.file_name()) == Some(std::ffi::OsStr::new(".folio")))
        .and_then(|p| p.parent())
        .and_then(|p| p.parent())
        .unwrap_or(cwd);

    let paths = config.as_ref().map(|c| c.paths.clone()).unwrap_or_default();

    let content_dir = match env(ENV_CONTENT_DIR) {
        Some(dir) => PathBuf::from(dir),
        None => resolve_path(base_dir, paths.content.as_deref().unwrap_or("content")),
    };

    let output = match env(ENV_OUTPUT) {
        Some(out) => PathBuf::from(out),
        None => match paths.output {
            Some(out) => resolve_path(base_dir, &out),
            None => base_dir.join(".folio").join("catalog.json"),
        },
    };

    let kinds = DocumentKind::MATCH_ORDER
        .into_iter()
        .map(|kind| {
            let patterns = config
                .as_ref()
                .and_then(|c| c.kinds.get(kind).cloned())
                .unwrap_or_else(|| kind.default_patterns());
            (kind, patterns)
        })
        .collect();

    Ok(ResolvedConfig {
        content_dir,
        output,
        schema: config.as_ref().map(|c| c.schema).unwrap_or_default(),
        duplicates: config.as_ref().map(|c| c.duplicates).unwrap_or_default(),
        kinds,
        config_file,
    })
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let cwd = std::env::current_dir().context("Failed to determine current directory")?;
    let config_file = find_config_file(&cwd).or_else(user_config_file);

    resolve(&cwd, config_file, |key| std::env::var(key).ok())
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| format!("{:#}", e)));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{CategoryPolicy, PublishedPolicy};
    use std::io::Write;
    use tempfile::TempDir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn write_config(root: &Path, body: &str) -> PathBuf {
        let folio_dir = root.join(".folio");
        std::fs::create_dir_all(&folio_dir).unwrap();

        let config_path = folio_dir.join("config.yaml");
        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "{}", body).unwrap();
        config_path
    }

    #[test]
    fn test_defaults_without_file() {
        let cwd = PathBuf::from("/site");
        let config = resolve(&cwd, None, no_env).unwrap();

        assert_eq!(config.content_dir, PathBuf::from("/site/content"));
        assert_eq!(config.output, PathBuf::from("/site/.folio/catalog.json"));
        assert_eq!(config.schema, SchemaOptions::default());
        assert_eq!(config.duplicates, DuplicatePolicy::Reject);
        assert_eq!(
            config.kinds[&DocumentKind::Project],
            DocumentKind::Project.default_patterns()
        );
        assert!(config.config_file.is_none());
    }

    #[test]
    fn test_config_file_parsing() {
        let temp = TempDir::new().unwrap();
        let config_path = write_config(
            temp.path(),
            r#"
version: "1.0"
paths:
  content: site/content
  output: public/catalog.json
schema:
  published: strict
  category: required
duplicates: last_wins
kinds:
  project:
    - "work/**/*.mdx"
"#,
        );

        let file = load_config_file(&config_path).unwrap();
        assert_eq!(file.version, "1.0");
        assert_eq!(file.paths.content, Some("site/content".to_string()));
        assert_eq!(file.schema.published, PublishedPolicy::Strict);
        assert_eq!(file.schema.category, CategoryPolicy::Required);
        assert_eq!(file.duplicates, DuplicatePolicy::LastWins);
        assert_eq!(file.kinds.project, Some(vec!["work/**/*.mdx".to_string()]));
        assert!(file.kinds.post.is_none());

        let config = resolve(temp.path(), Some(config_path), no_env).unwrap();
        assert_eq!(config.content_dir, temp.path().join("site/content"));
        assert_eq!(config.output, temp.path().join("public/catalog.json"));
        assert_eq!(config.kinds[&DocumentKind::Project], vec!["work/**/*.mdx"]);
        assert_eq!(
            config.kinds[&DocumentKind::Post],
            DocumentKind::Post.default_patterns()
        );

        let options = config.builder_options().unwrap();
        assert_eq!(
            options.matcher.classify(Path::new("work/demo.mdx")),
            Some(DocumentKind::Project)
        );
    }

    #[test]
    fn test_env_overrides_file() {
        let temp = TempDir::new().unwrap();
        let config_path = write_config(temp.path(), "version: \"1.0\"\npaths:\n  content: docs\n");

        let config = resolve(temp.path(), Some(config_path), |key| match key {
            ENV_CONTENT_DIR => Some("/elsewhere/content".to_string()),
            _ => None,
        })
        .unwrap();

        assert_eq!(config.content_dir, PathBuf::from("/elsewhere/content"));
        assert_eq!(config.output, temp.path().join(".folio/catalog.json"));
    }

    #[test]
    fn test_find_config_in_parent() {
        let temp = TempDir::new().unwrap();
        let config_path = write_config(temp.path(), "version: \"1.0\"");
        let nested = temp.path().join("content").join("technical");
        std::fs::create_dir_all(&nested).unwrap();

        assert_eq!(find_config_file(&nested), Some(config_path));
    }

    #[test]
    fn test_resolve_relative_path() {
        let base = PathBuf::from("/home/user/site");

        assert_eq!(
            resolve_path(&base, "./content"),
            PathBuf::from("/home/user/site/./content")
        );
        assert_eq!(
            resolve_path(&base, "/absolute/path"),
            PathBuf::from("/absolute/path")
        );
    }
}
