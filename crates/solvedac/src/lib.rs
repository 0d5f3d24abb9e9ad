//! solvedac: a small client for the [solved.ac](https://solved.ac) statistics API.
//!
//! The crate covers the one lookup the bot needs: a user's total solved
//! problem count and current rating, read from the `user/show` endpoint.
//!
//! ## Core Types
//!
//! - [`SolvedAcClient`] - HTTP client for the solved.ac API
//! - [`SolvedAcConfig`] - Base URL, timeout and user agent
//! - [`UserStats`] - Solved count and rating of a single handle
//! - [`StatsSource`] - Trait implemented by anything that can look up [`UserStats`]

pub mod client;
pub mod error;
pub mod models;
pub mod source;

pub use client::{DEFAULT_API_URL, SolvedAcClient, SolvedAcConfig};
pub use error::{Error, Result};
pub use models::UserStats;
pub use source::StatsSource;
