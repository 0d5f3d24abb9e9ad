//! Handle snapshot entity and delta computation.

use serde::{Deserialize, Serialize};
use solvedac::UserStats;

use super::Handle;

/// Persisted statistics of a handle as of the last register/update.
///
/// Field names match the on-disk JSON document (`boj_id`, `solvedCount`, `rating`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(rename = "boj_id")]
    pub handle: String,
    #[serde(rename = "solvedCount")]
    pub solved_count: u64,
    pub rating: i64,
}

impl Snapshot {
    pub fn new(handle: &Handle, stats: UserStats) -> Self {
        Self {
            handle: handle.to_string(),
            solved_count: stats.solved_count,
            rating: stats.rating,
        }
    }

    pub fn stats(&self) -> UserStats {
        UserStats::new(self.solved_count, self.rating)
    }
}

/// Difference between live stats and a stored snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatsDelta {
    pub solved: i64,
    pub rating: i64,
    /// Rating change relative to the stored rating, in percent, rounded to
    /// two decimals. `None` when the stored rating is zero.
    pub rating_percent: Option<f64>,
}

impl StatsDelta {
    pub fn between(stored: &Snapshot, current: UserStats) -> Self {
        let solved = current.solved_count as i64 - stored.solved_count as i64;
        let rating = current.rating - stored.rating;
        let rating_percent = (stored.rating != 0)
            .then(|| round2(rating as f64 / stored.rating as f64 * 100.0));

        Self {
            solved,
            rating,
            rating_percent,
        }
    }
}

fn round2(value: f64) -> f64 {
    // Ties go to even, so 0.125 becomes 0.12. `+ 0.0` turns -0.0 into 0.0
    (value * 100.0).round_ties_even() / 100.0 + 0.0
}
