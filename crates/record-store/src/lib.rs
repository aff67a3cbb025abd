//! Record store trait with in-memory and SQLite implementations.

mod memory;

#[cfg(feature = "sqlite")]
mod sqlite;

pub use memory::InMemoryRecordStore;
pub use record_types::{Record, RecordFilter, RecordStore, StoreError};

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteRecordStore;

/// Oldest first; ties broken by id so listings are stable.
pub(crate) fn sort_records(records: &mut [Record]) {
    records.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
}
