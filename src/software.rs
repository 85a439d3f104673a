//! Manually maintained software versions
//!
//! A plain list addressed by index. The file backed store rewrites the whole
//! file through a temporary file and a rename on every change.

use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoftwareVersion {
    pub name: String,
    pub current_version: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub last_updated: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug)]
pub enum StoreError {
    /// No entry at this index
    NotFound(usize),

    Io(std::io::Error),

    Serialization(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NotFound(index) => write!(f, "no software version at index {}", index),
            StoreError::Io(err) => write!(f, "I/O error: {}", err),
            StoreError::Serialization(msg) => write!(f, "serialization error: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait SoftwareStore: Send + Sync {
    async fn list(&self) -> StoreResult<Vec<SoftwareVersion>>;

    /// Append an entry, returns its index
    async fn create(&self, entry: SoftwareVersion) -> StoreResult<usize>;

    async fn replace(&self, index: usize, entry: SoftwareVersion) -> StoreResult<()>;

    /// Remove and return the entry, later entries move up by one
    async fn remove(&self, index: usize) -> StoreResult<SoftwareVersion>;
}

fn replace_at(
    entries: &mut [SoftwareVersion],
    index: usize,
    entry: SoftwareVersion,
) -> StoreResult<()> {
    let slot = entries.get_mut(index).ok_or(StoreError::NotFound(index))?;
    *slot = entry;
    Ok(())
}

fn remove_at(entries: &mut Vec<SoftwareVersion>, index: usize) -> StoreResult<SoftwareVersion> {
    if index >= entries.len() {
        return Err(StoreError::NotFound(index));
    }
    Ok(entries.remove(index))
}

#[derive(Default)]
pub struct MemorySoftwareStore {
    entries: RwLock<Vec<SoftwareVersion>>,
}

impl MemorySoftwareStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SoftwareStore for MemorySoftwareStore {
    async fn list(&self) -> StoreResult<Vec<SoftwareVersion>> {
        Ok(self.entries.read().await.clone())
    }

    async fn create(&self, entry: SoftwareVersion) -> StoreResult<usize> {
        let mut entries = self.entries.write().await;
        entries.push(entry);
        Ok(entries.len() - 1)
    }

    async fn replace(&self, index: usize, entry: SoftwareVersion) -> StoreResult<()> {
        replace_at(&mut self.entries.write().await, index, entry)
    }

    async fn remove(&self, index: usize) -> StoreResult<SoftwareVersion> {
        remove_at(&mut *self.entries.write().await, index)
    }
}

/// JSON file backed store
pub struct FileSoftwareStore {
    path: PathBuf,
    entries: RwLock<Vec<SoftwareVersion>>,
}

impl FileSoftwareStore {
    /// Open the store at `path`.
    ///
    /// A missing file starts an empty list. A malformed file is logged and
    /// also starts an empty list; it is only overwritten by the next change.
    pub async fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();

        let entries = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                warn!("ignoring malformed software versions in {}: {e}", path.display());
                Vec::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("no software versions at {} yet", path.display());
                Vec::new()
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, entries: &[SoftwareVersion]) -> StoreResult<()> {
        let bytes = serde_json::to_vec_pretty(entries)?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl SoftwareStore for FileSoftwareStore {
    async fn list(&self) -> StoreResult<Vec<SoftwareVersion>> {
        Ok(self.entries.read().await.clone())
    }

    async fn create(&self, entry: SoftwareVersion) -> StoreResult<usize> {
        let mut entries = self.entries.write().await;
        let mut updated = entries.clone();
        updated.push(entry);
        self.persist(&updated).await?;
        *entries = updated;
        Ok(entries.len() - 1)
    }

    async fn replace(&self, index: usize, entry: SoftwareVersion) -> StoreResult<()> {
        let mut entries = self.entries.write().await;
        let mut updated = entries.clone();
        replace_at(&mut updated, index, entry)?;
        self.persist(&updated).await?;
        *entries = updated;
        Ok(())
    }

    async fn remove(&self, index: usize) -> StoreResult<SoftwareVersion> {
        let mut entries = self.entries.write().await;
        let mut updated = entries.clone();
        let removed = remove_at(&mut updated, index)?;
        self.persist(&updated).await?;
        *entries = updated;
        Ok(removed)
    }
}
