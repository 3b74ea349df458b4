//! Main harvester service that ties an adapter to the record builder.
//!
//! This is the surface the protocol front end calls: `list_records`,
//! `get_record` and `list_sets`.

use crate::builder::build_metadata;
use crate::config::{HarvesterConfig, RepositoryConfig};
use crate::cursor::PageCursor;
use crate::error::{HarvesterError, Result};
use crate::source::{RegistryAdapter, RepositoryAdapter, SourceAdapter};
use crate::types::{Metadata, RecordFilter, RecordPage, SetInfo};

/// Harvests canonical records from one backend.
#[derive(Debug, Clone)]
pub struct Harvester<A> {
    adapter: A,
}

impl Harvester<RegistryAdapter> {
    /// Harvester over the registry REST API.
    pub fn registry(config: &HarvesterConfig) -> Result<Self> {
        config.validate()?;
        let adapter = RegistryAdapter::new(&config.registry, config.page_size)?;
        Ok(Self::new(adapter))
    }
}

impl Harvester<RepositoryAdapter> {
    /// Harvester over the repository database.
    pub fn repository(config: &HarvesterConfig) -> Result<Self> {
        config.validate()?;
        let repository: RepositoryConfig = config
            .repository
            .clone()
            .ok_or_else(|| HarvesterError::Config("repository database is not configured".into()))?;
        Ok(Self::new(RepositoryAdapter::connect(repository, config.page_size)))
    }
}

impl<A: SourceAdapter> Harvester<A> {
    pub fn new(adapter: A) -> Self {
        Self { adapter }
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    /// List one page of records.
    ///
    /// A query that matches nothing yields an empty page with no next
    /// cursor; the end of a non-empty listing yields the adapter's
    /// exhausted cursor instead.
    pub fn list_records(&self, filter: &RecordFilter, cursor: &A::Cursor) -> Result<RecordPage<A::Cursor>> {
        if cursor.is_exhausted() {
            return Ok(RecordPage {
                records: Vec::new(),
                next_cursor: Some(A::Cursor::exhausted()),
                total: None,
            });
        }

        let Some(page) = self.adapter.list(filter, cursor)? else {
            tracing::info!(source = self.adapter.name(), cursor = %cursor, "No records match query");
            return Ok(RecordPage::no_match());
        };

        let records = page
            .records
            .into_iter()
            .map(build_metadata)
            .collect::<Result<Vec<_>>>()?;

        tracing::info!(
            source = self.adapter.name(),
            cursor = %cursor,
            next = %page.next_cursor,
            records = records.len(),
            total = ?page.total,
            "Harvested page"
        );

        Ok(RecordPage {
            records,
            next_cursor: Some(page.next_cursor),
            total: page.total,
        })
    }

    /// Fetch one record by its native identifier.
    pub fn get_record(&self, identifier: &str) -> Result<Option<Metadata>> {
        match self.adapter.fetch(identifier)? {
            Some(raw) => Ok(Some(build_metadata(raw)?)),
            None => {
                tracing::debug!(source = self.adapter.name(), identifier, "Record not found");
                Ok(None)
            }
        }
    }

    /// List the sets records can be filtered by.
    pub fn list_sets(&self) -> Result<Vec<SetInfo>> {
        self.adapter.sets()
    }
}
