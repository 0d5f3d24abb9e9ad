//! solvedbot library crate.
//!
//! This module exposes the core functionality for integration testing.

pub mod commands;
pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod session;
pub mod store;
pub mod utils;

pub use error::{Error, Result};
