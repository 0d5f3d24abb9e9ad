//! Snapshot persistence.
//!
//! [`SnapshotStore`] is the only seam through which the bot touches stored
//! snapshots. [`FileSnapshotStore`] keeps one JSON document per handle in a
//! directory.

mod file;

pub use file::{FileSnapshotStore, SNAPSHOT_SUFFIX, snapshot_file_name};

use async_trait::async_trait;

use crate::Result;
use crate::domain::{Handle, Snapshot};

/// Storage for per-handle snapshots.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Whether a snapshot for `handle` is stored.
    async fn exists(&self, handle: &Handle) -> Result<bool>;

    /// Store `snapshot`, replacing any previous snapshot of the same handle.
    async fn save(&self, snapshot: &Snapshot) -> Result<()>;

    /// Load the snapshot of `handle`, or `None` if there is none.
    async fn load(&self, handle: &Handle) -> Result<Option<Snapshot>>;

    /// All handles with a stored snapshot, sorted.
    async fn list_all(&self) -> Result<Vec<Handle>>;
}
