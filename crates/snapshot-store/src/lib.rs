//! Snapshot sources: JSON files on disk and an in-memory map.

mod json_store;
mod memory;

pub use json_store::{JsonSnapshotStore, SNAPSHOT_FILE_SUFFIX};
pub use memory::InMemorySnapshotStore;
