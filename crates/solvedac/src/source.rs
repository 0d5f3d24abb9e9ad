//! Stats source abstraction.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::UserStats;

/// Anything that can resolve a handle to its current statistics.
///
/// [`crate::SolvedAcClient`] is the production implementation; tests plug in
/// in-memory sources.
#[async_trait]
pub trait StatsSource: Send + Sync {
    /// Look up the live statistics of `handle`.
    async fn fetch_user_stats(&self, handle: &str) -> Result<UserStats>;
}
