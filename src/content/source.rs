//! Content sources - where entry files live and how their text is fetched
//!
//! Every class of content is loaded eagerly, once, from an ordered list of
//! sources. When two sources provide the same logical path the later one
//! wins.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::watch;
use walkdir::WalkDir;

use super::{ContentClass, ContentError, ContentSet, Format, RawFiles};
use crate::content::html::HtmlOptions;

/// A place content files can be listed and read from
pub trait ContentSource: Send + Sync {
    /// Human-readable name used in logs and errors
    fn name(&self) -> &str;

    /// Logical paths (relative, `/` separated) available for a class
    fn list_paths(&self, class: ContentClass) -> Result<Vec<String>, ContentError>;

    /// Raw text of one logical path
    fn read_raw(&self, class: ContentClass, path: &str) -> Result<String, ContentError>;
}

/// A directory on disk holding entries of a single class
#[derive(Debug, Clone)]
pub struct DirectorySource {
    name: String,
    class: ContentClass,
    root: PathBuf,
}

impl DirectorySource {
    pub fn new<P: AsRef<Path>>(class: ContentClass, root: P) -> Self {
        let root = root.as_ref().to_path_buf();
        Self {
            name: root.display().to_string(),
            class,
            root,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ContentSource for DirectorySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_paths(&self, class: ContentClass) -> Result<Vec<String>, ContentError> {
        if class != self.class || !self.root.exists() {
            return Ok(Vec::new());
        }
        if !self.root.is_dir() {
            return Err(ContentError::resource(&self.name, "not a directory"));
        }

        let mut paths = Vec::new();
        for entry in WalkDir::new(&self.root).follow_links(true) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry in {}: {}", self.name, e);
                    continue;
                }
            };

            let hidden = entry.file_name().to_string_lossy().starts_with('.');
            if !entry.file_type().is_file() || hidden {
                continue;
            }

            if let Ok(relative) = entry.path().strip_prefix(&self.root) {
                let logical = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                paths.push(logical);
            }
        }

        Ok(paths)
    }

    fn read_raw(&self, _class: ContentClass, path: &str) -> Result<String, ContentError> {
        fs::read_to_string(self.root.join(path)).map_err(|source| ContentError::Io {
            path: format!("{}/{}", self.name, path),
            source,
        })
    }
}

/// In-memory source, used by tests and for fixed content snapshots
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    name: String,
    files: HashMap<ContentClass, BTreeMap<String, String>>,
}

impl MemorySource {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            files: HashMap::new(),
        }
    }

    /// Add a file, replacing any previous content at the same path
    pub fn with_file(mut self, class: ContentClass, path: &str, content: &str) -> Self {
        self.files
            .entry(class)
            .or_default()
            .insert(path.to_string(), content.to_string());
        self
    }
}

impl ContentSource for MemorySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_paths(&self, class: ContentClass) -> Result<Vec<String>, ContentError> {
        Ok(self
            .files
            .get(&class)
            .map(|files| files.keys().cloned().collect())
            .unwrap_or_default())
    }

    fn read_raw(&self, class: ContentClass, path: &str) -> Result<String, ContentError> {
        self.files
            .get(&class)
            .and_then(|files| files.get(path))
            .cloned()
            .ok_or_else(|| ContentError::resource(&self.name, format!("no such file: {path}")))
    }
}

/// Load every file of one class and format, merging sources in order.
///
/// Later sources override earlier ones on path collision. A source that
/// cannot be listed fails the load; a single unreadable file is skipped.
pub fn load_raw_files(
    sources: &[Arc<dyn ContentSource>],
    class: ContentClass,
    format: Format,
) -> Result<RawFiles, ContentError> {
    let mut files = RawFiles::new();

    for source in sources {
        let mut paths = source.list_paths(class)?;
        paths.sort();

        for path in paths.into_iter().filter(|p| format.matches(p)) {
            match source.read_raw(class, &path) {
                Ok(raw) => {
                    if files.insert(path.clone(), raw).is_some() {
                        tracing::debug!("{} overrides {:?} from an earlier source", source.name(), path);
                    }
                }
                Err(e) => {
                    tracing::warn!("Skipping {:?}: {}", path, e);
                }
            }
        }
    }

    tracing::debug!("Loaded {} {} files", files.len(), class);
    Ok(files)
}

/// Progress of the one-time bulk load
#[derive(Debug, Clone)]
pub enum LoadState {
    Loading,
    Ready(Arc<ContentSet>),
    Failed(String),
}

impl LoadState {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::Loading)
    }
}

/// Run the bulk load off the async executor
pub async fn load_all(
    sources: Vec<Arc<dyn ContentSource>>,
    classes: Vec<(ContentClass, Format)>,
    options: HtmlOptions,
) -> Result<ContentSet, ContentError> {
    tokio::task::spawn_blocking(move || ContentSet::load(&sources, &classes, options))
        .await
        .map_err(|e| ContentError::resource("bulk load", e.to_string()))?
}

/// Start the bulk load in the background.
///
/// The receiver observes `Loading` until the load settles. Dropping every
/// receiver before then discards the result.
pub fn spawn_load(
    sources: Vec<Arc<dyn ContentSource>>,
    classes: Vec<(ContentClass, Format)>,
    options: HtmlOptions,
) -> watch::Receiver<LoadState> {
    let (tx, rx) = watch::channel(LoadState::Loading);

    tokio::spawn(async move {
        let state = match load_all(sources, classes, options).await {
            Ok(set) => LoadState::Ready(Arc::new(set)),
            Err(e) => {
                tracing::error!("Content load failed: {}", e);
                LoadState::Failed(e.to_string())
            }
        };
        if tx.send(state).is_err() {
            tracing::debug!("Content load finished after all consumers went away");
        }
    });

    rx
}
