//! Content watcher.
//!
//! Watches the content root and rebuilds the whole catalog after changes
//! settle. Rebuilds are full batch passes; the catalog is never patched in
//! place.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use notify::RecursiveMode;
use notify_debouncer_mini::new_debouncer;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::content::{Catalog, CatalogBuild, CatalogBuilder};

/// Errors that can occur with the watcher
#[derive(Debug, Error)]
pub enum WatcherError {
    #[error("Content directory does not exist: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("Notify error: {0}")]
    Notify(#[from] notify::Error),
}

/// Summary of one rebuild, sent to the watch consumer
#[derive(Debug, Clone)]
pub struct RebuildEvent {
    /// Catalog fingerprint after the rebuild
    pub fingerprint: String,

    /// Whether the fingerprint differs from the previous build
    pub changed: bool,

    pub records: usize,

    pub errors: usize,
}

/// Rebuilds a catalog whenever its content root changes
pub struct CatalogWatcher {
    builder: CatalogBuilder,
    output: Option<PathBuf>,
    debounce: Duration,
}

impl CatalogWatcher {
    pub fn new(builder: CatalogBuilder) -> Self {
        Self {
            builder,
            output: None,
            debounce: Duration::from_millis(500),
        }
    }

    /// Save the catalog here after every changed rebuild
    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = Some(output.into());
        self
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Check that the content root exists
    pub fn validate(&self) -> Result<(), WatcherError> {
        let root = self.builder.root();
        if !root.is_dir() {
            return Err(WatcherError::DirectoryNotFound(root.to_path_buf()));
        }
        Ok(())
    }

    /// Build once and save if the fingerprint moved
    pub async fn rebuild(&self, previous: Option<&str>) -> Result<(CatalogBuild, RebuildEvent)> {
        let build = self.builder.build()?;
        let fingerprint = build.catalog.fingerprint();
        let changed = previous != Some(fingerprint.as_str());

        if changed {
            if let Some(output) = &self.output {
                build.catalog.save(output).await?;
                tracing::info!("Catalog written to {}", output.display());
            }
        }

        for error in &build.errors {
            tracing::warn!("{}", error);
        }

        let event = RebuildEvent {
            fingerprint,
            changed,
            records: build.catalog.len(),
            errors: build.errors.len(),
        };
        Ok((build, event))
    }

    /// Watch the content root and emit an event per rebuild.
    /// Runs until stopped via the returned handle.
    pub async fn watch(self) -> Result<(mpsc::Receiver<RebuildEvent>, WatchHandle)> {
        self.validate()?;

        let (event_tx, event_rx) = mpsc::channel::<RebuildEvent>(16);
        let (stop_tx, mut stop_rx) = mpsc::channel::<()>(1);

        // Spawn watcher task
        let handle = tokio::spawn(async move {
            if let Err(e) = run_watcher(self, event_tx, &mut stop_rx).await {
                tracing::error!("Watcher error: {}", e);
            }
        });

        Ok((
            event_rx,
            WatchHandle {
                stop_tx,
                task: handle,
            },
        ))
    }

    /// Whether a changed path is one the builder would classify.
    /// `root` is the canonical content root; event paths are absolute.
    fn is_content_file(&self, root: &Path, path: &Path) -> bool {
        let relative = path
            .strip_prefix(root)
            .or_else(|_| path.strip_prefix(self.builder.root()));

        match relative {
            Ok(rel) => self.builder.options().matcher.classify(rel).is_some(),
            Err(_) => false,
        }
    }
}

/// Handle to control the watcher
pub struct WatchHandle {
    stop_tx: mpsc::Sender<()>,
    task: tokio::task::JoinHandle<()>,
}

impl WatchHandle {
    /// Stop the watcher
    pub async fn stop(self) -> Result<()> {
        let _ = self.stop_tx.send(()).await;
        self.task.await?;
        Ok(())
    }
}

/// Internal watcher loop
async fn run_watcher(
    watcher: CatalogWatcher,
    event_tx: mpsc::Sender<RebuildEvent>,
    stop_rx: &mut mpsc::Receiver<()>,
) -> Result<()> {
    let (tx, rx) = std::sync::mpsc::channel();

    let root = watcher.builder.root();
    let canonical_root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());

    let mut debouncer = new_debouncer(watcher.debounce, tx).map_err(WatcherError::Notify)?;
    debouncer
        .watcher()
        .watch(root, RecursiveMode::Recursive)
        .map_err(WatcherError::Notify)?;

    tracing::info!(
        "Watching {} for content changes (debounce {:?})",
        root.display(),
        watcher.debounce
    );

    // Initial build so the consumer starts from a known catalog
    let (_, event) = watcher.rebuild(None).await?;
    let mut fingerprint = event.fingerprint.clone();
    let _ = event_tx.send(event).await;

    loop {
        if stop_rx.try_recv().is_ok() {
            tracing::info!("Watcher stopping...");
            break;
        }

        match rx.recv_timeout(Duration::from_millis(250)) {
            Ok(Ok(events)) => {
                let relevant = events
                    .iter()
                    .any(|e| watcher.is_content_file(&canonical_root, &e.path));
                if !relevant {
                    continue;
                }

                match watcher.rebuild(Some(&fingerprint)).await {
                    Ok((_, event)) => {
                        if event.changed {
                            tracing::info!(
                                "Rebuilt catalog: {} records, {} errors",
                                event.records,
                                event.errors
                            );
                            fingerprint = event.fingerprint.clone();
                            let _ = event_tx.send(event).await;
                        } else {
                            tracing::debug!("Content touched but catalog unchanged");
                        }
                    }
                    Err(e) => tracing::warn!("Rebuild failed: {:#}", e),
                }
            }
            Ok(Err(e)) => {
                tracing::warn!("Watcher error: {:?}", e);
            }
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) => {}
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => {
                tracing::error!("Watcher channel disconnected");
                break;
            }
        }

        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    Ok(())
}

/// Load a previously written catalog, if there is one
pub async fn load_previous(output: &Path) -> Option<Catalog> {
    if !output.exists() {
        return None;
    }
    match Catalog::load(output).await {
        Ok(catalog) => Some(catalog),
        Err(e) => {
            tracing::debug!("Ignoring unreadable previous catalog: {:#}", e);
            None
        }
    }
}
