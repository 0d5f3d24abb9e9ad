//! Command execution against the stats source and the snapshot store.

use std::collections::BTreeMap;
use std::sync::Arc;

use solvedac::{StatsSource, UserStats};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use super::{Command, render};
use crate::Result;
use crate::domain::{Handle, Snapshot, StatsDelta};
use crate::store::SnapshotStore;

/// Maps one inbound message to at most one reply.
pub struct CommandRouter {
    stats: Arc<dyn StatsSource>,
    store: Arc<dyn SnapshotStore>,
    /// Held for the whole body of `!r` and `!update`.
    write_lock: Mutex<()>,
}

impl CommandRouter {
    pub fn new(stats: Arc<dyn StatsSource>, store: Arc<dyn SnapshotStore>) -> Self {
        Self {
            stats,
            store,
            write_lock: Mutex::new(()),
        }
    }

    /// Handle message text and return the reply, if any.
    ///
    /// Ordinary chat yields `None`. Parse and execution failures are turned
    /// into a diagnostic reply.
    pub async fn handle(&self, content: &str) -> Option<String> {
        let command = match Command::parse(content)? {
            Ok(command) => command,
            Err(e) => {
                warn!(content, error = %e, "Rejected command");
                return Some(render::parse_error(&e));
            }
        };

        match self.execute(&command).await {
            Ok(reply) => Some(reply),
            Err(e) => {
                error!(command = command.name(), error = %e, "Command failed");
                Some(render::command_failed(&command, &e))
            }
        }
    }

    /// Run a parsed command.
    pub async fn execute(&self, command: &Command) -> Result<String> {
        match command {
            Command::Lookup(handle) => self.lookup(handle).await,
            Command::Register(handle) => self.register(handle).await,
            Command::UpdateAll => self.update_all().await,
            Command::Compare(handle) => self.compare(handle).await,
        }
    }

    async fn fetch(&self, handle: &Handle) -> Result<UserStats> {
        Ok(self.stats.fetch_user_stats(handle.as_str()).await?)
    }

    async fn lookup(&self, handle: &Handle) -> Result<String> {
        info!(handle = %handle, "Processing lookup");
        let stats = self.fetch(handle).await?;
        Ok(render::lookup(handle, stats))
    }

    async fn register(&self, handle: &Handle) -> Result<String> {
        info!(handle = %handle, "Processing registration");
        let _guard = self.write_lock.lock().await;

        if self.store.exists(handle).await? {
            info!(handle = %handle, "Handle already registered");
            return Ok(render::already_registered(handle));
        }

        let stats = self.fetch(handle).await?;
        self.store.save(&Snapshot::new(handle, stats)).await?;
        info!(handle = %handle, "Registered handle");
        Ok(render::registered(handle, stats))
    }

    async fn update_all(&self) -> Result<String> {
        info!("Updating all registered handles");
        let _guard = self.write_lock.lock().await;

        let mut updated = BTreeMap::new();
        for handle in self.store.list_all().await? {
            let stats = self.fetch(&handle).await?;
            self.store.save(&Snapshot::new(&handle, stats)).await?;
            updated.insert(handle, stats);
        }

        info!(count = updated.len(), "Updated all registered handles");
        Ok(render::update_report(&updated))
    }

    async fn compare(&self, handle: &Handle) -> Result<String> {
        info!(handle = %handle, "Comparing against stored snapshot");

        if !self.store.exists(handle).await? {
            info!(handle = %handle, "Handle is not registered");
            return Ok(render::not_registered(handle));
        }

        let current = self.fetch(handle).await?;
        let Some(stored) = self.store.load(handle).await? else {
            error!(handle = %handle, "Failed to load registered snapshot");
            return Ok(render::load_failed(handle));
        };

        let delta = StatsDelta::between(&stored, current);
        Ok(render::comparison(handle, current, &delta))
    }
}

impl std::fmt::Debug for CommandRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRouter").finish_non_exhaustive()
    }
}
