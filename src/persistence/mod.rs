//! Persistence Layer for State Snapshots
//!
//! Best-effort durable snapshots of registry + metrics state, written once
//! per supervision cycle when a store connection exists and skipped
//! entirely when it does not.

pub mod snapshot;
pub mod store;

pub use snapshot::StateSnapshot;
pub use store::{StateStore, DEFAULT_CREDENTIALS_FILE};
