/// Storage Module
///
/// A local directory standing in for the blob container files are dropped
/// into, plus a poller that turns newly completed files into trigger events.
use crate::models::BlobEvent;
use anyhow::{Context, Result};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// A directory of uploaded objects
#[derive(Debug, Clone)]
pub struct LocalContainer {
    root: PathBuf,
}

/// Name plus the size and modification time an object had when listed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
    pub name: String,
    pub len: u64,
    pub modified: Option<SystemTime>,
}

impl LocalContainer {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Non-hidden files in the container, sorted by name
    ///
    /// Symlinks are followed; a link whose target is gone is left out.
    pub async fn list(&self) -> Result<Vec<ObjectInfo>> {
        let mut entries = tokio::fs::read_dir(&self.root)
            .await
            .context(format!("Failed to read container directory {}", self.root.display()))?;

        let mut objects = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }

            let metadata = match tokio::fs::metadata(entry.path()).await {
                Ok(metadata) if metadata.is_file() => metadata,
                Ok(_) => continue,
                Err(e) => {
                    tracing::debug!("Ignoring {}: {}", name, e);
                    continue;
                }
            };

            objects.push(ObjectInfo { name, len: metadata.len(), modified: metadata.modified().ok() });
        }

        objects.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(objects)
    }

    /// Read one object as a trigger event
    pub async fn read(&self, name: &str) -> Result<BlobEvent> {
        read_blob(&self.root.join(name)).await
    }
}

/// Read a file as a trigger event named after its file name
pub async fn read_blob(path: &Path) -> Result<BlobEvent> {
    let content = tokio::fs::read(path).await.context(format!("Failed to read {}", path.display()))?;
    let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_else(|| path.display().to_string());

    Ok(BlobEvent::new(name, content))
}

/// Yields each object in a container once, after its upload has settled
///
/// An object is yielded on the first poll that finds its size and
/// modification time unchanged from the poll before, so a file still being
/// written is held back until writing stops.
pub struct BlobWatcher {
    container: LocalContainer,
    seen: HashSet<String>,
    pending: HashMap<String, ObjectInfo>,
}

impl BlobWatcher {
    pub fn new(container: LocalContainer) -> Self {
        Self { container, seen: HashSet::new(), pending: HashMap::new() }
    }

    /// Mark every object currently in the container as already seen
    pub async fn skip_existing(&mut self) -> Result<usize> {
        let objects = self.container.list().await?;
        let count = objects.len();
        self.seen.extend(objects.into_iter().map(|o| o.name));
        Ok(count)
    }

    /// Objects that settled since the previous poll, in name order
    ///
    /// An object that cannot be read is skipped with a warning and
    /// considered again on later polls.
    pub async fn poll(&mut self) -> Result<Vec<BlobEvent>> {
        let objects = self.container.list().await?;
        let listed: HashSet<&str> = objects.iter().map(|o| o.name.as_str()).collect();
        self.pending.retain(|name, _| listed.contains(name.as_str()));

        let mut events = Vec::new();
        for object in objects {
            if self.seen.contains(&object.name) {
                continue;
            }

            if self.pending.get(&object.name) != Some(&object) {
                tracing::debug!("Waiting for {} to settle ({} bytes)", object.name, object.len);
                self.pending.insert(object.name.clone(), object);
                continue;
            }

            self.pending.remove(&object.name);
            match self.container.read(&object.name).await {
                Ok(event) => {
                    self.seen.insert(object.name);
                    events.push(event);
                }
                Err(e) => tracing::warn!("Skipping {}: {:#}", object.name, e),
            }
        }

        Ok(events)
    }
}
