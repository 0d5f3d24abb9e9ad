//! Response models for the solved.ac API.

use serde::Deserialize;

/// Statistics of a single handle as reported by solved.ac.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserStats {
    /// Total number of solved problems.
    pub solved_count: u64,
    /// Current rating. Zero when the user has none.
    pub rating: i64,
}

impl UserStats {
    pub fn new(solved_count: u64, rating: i64) -> Self {
        Self {
            solved_count,
            rating,
        }
    }
}

/// Subset of the `user/show` response the bot cares about.
///
/// Every other field of the document is ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UserShowResponse {
    #[serde(default)]
    pub solved_count: Option<u64>,
    #[serde(default)]
    pub rating: Option<i64>,
}

impl From<UserShowResponse> for UserStats {
    fn from(response: UserShowResponse) -> Self {
        Self {
            solved_count: response.solved_count.unwrap_or(0),
            rating: response.rating.unwrap_or(0),
        }
    }
}
