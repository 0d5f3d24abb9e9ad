//! Domain layer for solvedbot.
//!
//! Value objects and entities shared by the command router and the snapshot store.

pub mod handle;
pub mod snapshot;

pub use handle::Handle;
pub use snapshot::{Snapshot, StatsDelta};
