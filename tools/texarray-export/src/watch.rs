//! File watching for automatic rebuilds
//!
//! Watches an asset's configuration file and every source texture the last
//! build depended on. Watch paths are re-collected after every rebuild, since
//! editing the configuration can change the dependency set.

use anyhow::{Context, Result};
use notify::RecursiveMode;
use notify_debouncer_mini::{DebouncedEventKind, new_debouncer};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;

use crate::disk::sidecar_path;

/// Debounce duration for file changes (batches rapid saves)
const DEBOUNCE_DURATION: Duration = Duration::from_millis(100);

/// Collected paths to watch
#[derive(Debug, Default)]
pub struct WatchPaths {
    /// The .tex2darray configuration file
    pub config: PathBuf,
    /// Source textures and their import settings sidecars
    pub dependencies: Vec<PathBuf>,
}

impl WatchPaths {
    /// Watch the config plus each dependency and its sidecar
    pub fn new(config: &Path, dependencies: &[PathBuf]) -> Self {
        let mut files = Vec::with_capacity(dependencies.len() * 2);
        for dependency in dependencies {
            files.push(dependency.clone());
            files.push(sidecar_path(dependency));
        }

        Self {
            config: config.to_path_buf(),
            dependencies: files,
        }
    }

    /// Get total number of watch targets
    pub fn count(&self) -> usize {
        1 + self.dependencies.len()
    }

    /// Distinct parent directories of all watched files
    fn directories(&self) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = Vec::new();
        for file in std::iter::once(&self.config).chain(&self.dependencies) {
            let dir = match file.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                _ => PathBuf::from("."),
            };
            if !dirs.contains(&dir) {
                dirs.push(dir);
            }
        }
        dirs
    }
}

/// Event received from the file watcher
#[derive(Debug)]
pub enum WatchEvent {
    /// Source textures changed - rebuild needed
    FilesChanged(Vec<PathBuf>),
    /// Configuration changed - rebuild and re-collect watch paths
    ConfigChanged,
    /// Watch error occurred
    Error(String),
}

/// File watcher for watch mode
pub struct FileWatcher {
    /// Receiver for debounced events
    rx: mpsc::Receiver<Result<Vec<notify_debouncer_mini::DebouncedEvent>, notify::Error>>,
    /// The debouncer (holds the watcher)
    _debouncer: notify_debouncer_mini::Debouncer<notify::RecommendedWatcher>,
    /// Config path for detecting config changes
    config_path: PathBuf,
    /// Dependency paths for quick lookup
    dependency_paths: HashSet<PathBuf>,
}

impl FileWatcher {
    /// Create a new file watcher for the given paths
    pub fn new(paths: &WatchPaths) -> Result<Self> {
        let (tx, rx) = mpsc::channel();

        let mut debouncer =
            new_debouncer(DEBOUNCE_DURATION, tx).context("Failed to create file watcher")?;

        // Watch parent directories (notify doesn't watch individual files well,
        // and editors often replace files instead of writing them in place)
        for dir in paths.directories() {
            if dir.exists() {
                debouncer
                    .watcher()
                    .watch(&dir, RecursiveMode::NonRecursive)
                    .with_context(|| format!("Failed to watch directory: {}", dir.display()))?;
            }
        }

        Ok(Self {
            rx,
            _debouncer: debouncer,
            config_path: normalize(&paths.config),
            dependency_paths: paths.dependencies.iter().map(|p| normalize(p)).collect(),
        })
    }

    /// Wait for the next relevant change
    ///
    /// Blocks until a watched file changes or an error occurs.
    pub fn wait_for_changes(&self) -> WatchEvent {
        loop {
            match self.rx.recv() {
                Ok(Ok(events)) => {
                    let paths = events
                        .into_iter()
                        .filter(|event| matches!(event.kind, DebouncedEventKind::Any))
                        .map(|event| event.path);
                    if let Some(event) = self.classify(paths) {
                        return event;
                    }
                    // Spurious event, wait for next one
                }
                Ok(Err(e)) => return WatchEvent::Error(format!("Watch error: {}", e)),
                Err(e) => return WatchEvent::Error(format!("Channel error: {}", e)),
            }
        }
    }

    fn classify(&self, paths: impl IntoIterator<Item = PathBuf>) -> Option<WatchEvent> {
        classify_changes(&self.config_path, &self.dependency_paths, paths)
    }
}

/// Canonical form for comparisons; files that were just deleted keep their path
fn normalize(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// Sort changed paths into a watch event, ignoring unrelated files
fn classify_changes(
    config: &Path,
    dependencies: &HashSet<PathBuf>,
    paths: impl IntoIterator<Item = PathBuf>,
) -> Option<WatchEvent> {
    let mut changed_files = Vec::new();
    let mut config_changed = false;

    for path in paths {
        let canonical = normalize(&path);
        if canonical == config {
            config_changed = true;
        } else if dependencies.contains(&canonical) {
            changed_files.push(path);
        }
    }

    if config_changed {
        Some(WatchEvent::ConfigChanged)
    } else if !changed_files.is_empty() {
        Some(WatchEvent::FilesChanged(changed_files))
    } else {
        None
    }
}
