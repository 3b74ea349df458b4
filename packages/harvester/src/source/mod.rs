//! Source adapters: the backends records are harvested from.
//!
//! Each adapter fetches one page of raw records at a time and hands them to
//! the [`builder`](crate::builder) untouched. Raw shapes are backend-specific
//! and are wrapped in [`RawRecord`] so nothing outside the builder needs to
//! know backend field names.

pub mod registry;
pub mod repository;

pub use registry::{RegistryAdapter, RegistryRecord};
pub use repository::{PostgresStore, RecordStore, RepositoryAdapter, RepositoryRecord};

use crate::cursor::PageCursor;
use crate::error::Result;
use crate::types::{RecordFilter, SetInfo};

/// A record as fetched from its backend, before normalization.
#[derive(Debug, Clone)]
pub enum RawRecord {
    /// JSON:API resource from the registry.
    Registry(Box<RegistryRecord>),
    /// Joined relational row with its side lookups.
    Repository(Box<RepositoryRecord>),
}

/// One page of raw records.
#[derive(Debug, Clone)]
pub struct RawPage<C> {
    pub records: Vec<RawRecord>,
    pub next_cursor: C,
    /// Total matches reported by the backend.
    pub total: Option<u64>,
}

impl<C: PageCursor> RawPage<C> {
    /// The page returned for a cursor that is already exhausted.
    #[must_use]
    pub fn exhausted() -> Self {
        Self {
            records: Vec::new(),
            next_cursor: C::exhausted(),
            total: None,
        }
    }
}

/// A backend that records can be harvested from.
pub trait SourceAdapter {
    /// Pagination cursor understood by this adapter.
    type Cursor: PageCursor;

    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Fetch one page of records.
    ///
    /// Returns `Ok(None)` when the query matches nothing at all, which is
    /// different from reaching the end of a non-empty listing.
    fn list(&self, filter: &RecordFilter, cursor: &Self::Cursor) -> Result<Option<RawPage<Self::Cursor>>>;

    /// Fetch a single record by its native identifier.
    fn fetch(&self, identifier: &str) -> Result<Option<RawRecord>>;

    /// List the sets records can be filtered by.
    fn sets(&self) -> Result<Vec<SetInfo>>;
}
