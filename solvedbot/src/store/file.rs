//! One-file-per-handle snapshot store.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use super::SnapshotStore;
use crate::domain::{Handle, Snapshot};
use crate::utils::fs::{ensure_dir_all_with_op, io_error, write_atomic};
use crate::{Error, Result};

/// Suffix shared by every snapshot file name.
pub const SNAPSHOT_SUFFIX: &str = "_info.json";

/// File name of the snapshot of `handle`.
pub fn snapshot_file_name(handle: &Handle) -> String {
    format!("{}{}", handle, SNAPSHOT_SUFFIX)
}

/// Snapshot store keeping `{handle}_info.json` files in one directory.
///
/// Writes go through a single lock and are atomic (temp file + rename).
#[derive(Debug)]
pub struct FileSnapshotStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl FileSnapshotStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        ensure_dir_all_with_op("creating snapshot directory", &dir).await?;
        info!(dir = %dir.display(), "Snapshot store ready");
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the snapshot file of `handle`.
    pub fn path_for(&self, handle: &Handle) -> PathBuf {
        self.dir.join(snapshot_file_name(handle))
    }

    fn encode(snapshot: &Snapshot) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        let formatter = PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        snapshot.serialize(&mut serializer)?;
        Ok(buf)
    }
}

#[async_trait]
impl SnapshotStore for FileSnapshotStore {
    async fn exists(&self, handle: &Handle) -> Result<bool> {
        let path = self.path_for(handle);
        tokio::fs::try_exists(&path)
            .await
            .map_err(|e| io_error("checking snapshot file", &path, e))
    }

    async fn save(&self, snapshot: &Snapshot) -> Result<()> {
        let handle = Handle::new(snapshot.handle.clone())?;
        let path = self.path_for(&handle);
        let contents = Self::encode(snapshot)?;

        let _guard = self.write_lock.lock().await;
        write_atomic(&path, &contents).await?;

        info!(handle = %handle, path = %path.display(), "Saved snapshot");
        Ok(())
    }

    async fn load(&self, handle: &Handle) -> Result<Option<Snapshot>> {
        let path = self.path_for(handle);

        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                error!(path = %path.display(), "Snapshot file does not exist");
                return Ok(None);
            }
            Err(e) => return Err(io_error("reading snapshot file", &path, e)),
        };

        let snapshot: Snapshot = serde_json::from_str(&raw).map_err(|e| {
            warn!(path = %path.display(), raw_len = raw.len(), error = %e, "Malformed snapshot file");
            Error::Serialization(e)
        })?;

        debug!(handle = %handle, path = %path.display(), "Loaded snapshot");
        Ok(Some(snapshot))
    }

    async fn list_all(&self) -> Result<Vec<Handle>> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_error("listing snapshot directory", &self.dir, e)),
        };

        let mut handles = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| io_error("listing snapshot directory", &self.dir, e))?
        {
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            let Some(handle) = name.strip_suffix(SNAPSHOT_SUFFIX) else {
                continue;
            };

            match Handle::new(handle) {
                Ok(handle) => handles.push(handle),
                Err(e) => warn!(file = name, error = %e, "Skipping snapshot with invalid handle"),
            }
        }

        handles.sort();
        Ok(handles)
    }
}
