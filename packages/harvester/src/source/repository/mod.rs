//! Repository adapter over the relational research-data store.
//!
//! Pages are plain `LIMIT`/`OFFSET` windows ordered by `record_id`. Rows are
//! screened after the page is fetched: deleted rows, rows with an empty title
//! and rows whose identifier resolves to no URL are dropped, so a page may
//! hold fewer records than the page size without ending the listing.

pub mod query;
pub mod store;
pub mod types;

pub use query::{RecordQuery, SqlParam};
pub use store::{PostgresStore, RecordStore};
pub use types::{GeoRow, RecordDetails, RecordRow, RepositoryRecord, RowPage};

use chrono::Utc;

use crate::config::{RepositoryConfig, RESERVED_SET_NAME, RESERVED_SET_SPEC};
use crate::cursor::RepositoryCursor;
use crate::error::Result;
use crate::identifier::resolve_local_url;
use crate::source::{RawPage, RawRecord, SourceAdapter};
use crate::types::{RecordFilter, SetInfo};

/// Adapter for the repository database.
#[derive(Debug, Clone)]
pub struct RepositoryAdapter<S = PostgresStore> {
    store: S,
    page_size: usize,
}

impl RepositoryAdapter<PostgresStore> {
    /// Adapter over Postgres. No connection is opened until the first call.
    #[must_use]
    pub fn connect(config: RepositoryConfig, page_size: usize) -> Self {
        Self::with_store(PostgresStore::new(config), page_size)
    }
}

impl<S: RecordStore> RepositoryAdapter<S> {
    pub fn with_store(store: S, page_size: usize) -> Self {
        Self { store, page_size }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Resolve, screen and enrich one row; `None` when the row is excluded.
    fn assemble(&self, row: RecordRow) -> Result<Option<RepositoryRecord>> {
        let Some(resolved_url) = resolve_local_url(&row.identifier_input()) else {
            tracing::debug!(record_id = row.record_id, identifier = %row.local_identifier, "Excluding record: unresolvable identifier");
            return Ok(None);
        };
        if row.deleted {
            tracing::debug!(record_id = row.record_id, "Excluding record: deleted");
            return Ok(None);
        }
        if row.title.trim().is_empty() {
            tracing::debug!(record_id = row.record_id, "Excluding record: empty title");
            return Ok(None);
        }

        let details = self.store.fetch_details(row.record_id)?;
        Ok(Some(RepositoryRecord {
            row,
            resolved_url,
            details,
        }))
    }
}

impl<S: RecordStore> SourceAdapter for RepositoryAdapter<S> {
    type Cursor = RepositoryCursor;

    fn name(&self) -> &'static str {
        "repository"
    }

    fn list(&self, filter: &RecordFilter, cursor: &RepositoryCursor) -> Result<Option<RawPage<RepositoryCursor>>> {
        let Some(offset) = cursor.offset() else {
            return Ok(Some(RawPage::exhausted()));
        };

        let query = RecordQuery::new(filter, offset, self.page_size, Utc::now().naive_utc());
        let page = self.store.fetch_page(&query)?;
        if page.total == 0 {
            tracing::debug!(offset, "Repository query matched nothing");
            return Ok(None);
        }

        let fetched = page.rows.len();
        let next_cursor = if fetched > 0 && fetched >= self.page_size {
            RepositoryCursor::Offset(offset + fetched as u64)
        } else {
            RepositoryCursor::Exhausted
        };

        let mut records = Vec::with_capacity(fetched);
        for row in page.rows {
            if let Some(record) = self.assemble(row)? {
                records.push(RawRecord::Repository(Box::new(record)));
            }
        }
        tracing::debug!(offset, fetched, kept = records.len(), "Fetched repository page");

        Ok(Some(RawPage {
            records,
            next_cursor,
            total: Some(page.total),
        }))
    }

    fn fetch(&self, identifier: &str) -> Result<Option<RawRecord>> {
        let Ok(record_id) = identifier.trim().parse::<i64>() else {
            tracing::debug!(identifier, "Not a repository record id");
            return Ok(None);
        };

        let Some(row) = self.store.fetch_record(record_id)? else {
            return Ok(None);
        };
        Ok(self
            .assemble(row)?
            .map(|record| RawRecord::Repository(Box::new(record))))
    }

    fn sets(&self) -> Result<Vec<SetInfo>> {
        let mut sets: Vec<SetInfo> = self
            .store
            .fetch_repositories()?
            .into_iter()
            .map(|(url, name)| SetInfo::new(url, name))
            .collect();
        sets.push(SetInfo::new(RESERVED_SET_SPEC, RESERVED_SET_NAME));
        Ok(sets)
    }
}
