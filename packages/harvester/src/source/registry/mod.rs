//! Registry adapter over the DataCite-style REST API.
//!
//! Listing uses cursor pagination: the first request sends `page[cursor]=1`
//! and every following cursor is lifted out of the `links.next` URL of the
//! previous response. A response without a next link ends the listing.

pub mod types;

pub use types::RegistryRecord;

use chrono::{NaiveDateTime, Utc};
use reqwest::blocking::Client;
use url::Url;

use crate::config::{RegistryConfig, SETS_PAGE_SIZE};
use crate::cursor::{PageCursor, RegistryCursor};
use crate::error::{HarvesterError, Result};
use crate::http::{create_client, get_json, get_json_optional};
use crate::source::{RawPage, RawRecord, SourceAdapter};
use crate::temporal::format_query_instant;
use crate::types::{RecordFilter, SetInfo};
use types::{ClientsResponse, ListResponse, SingleResponse};

/// Adapter for the registry REST API.
#[derive(Debug, Clone)]
pub struct RegistryAdapter {
    client: Client,
    api_url: String,
    page_size: usize,
}

impl RegistryAdapter {
    /// Create an adapter with its own HTTP client.
    pub fn new(config: &RegistryConfig, page_size: usize) -> Result<Self> {
        let client = create_client(config.timeout_secs)?;
        Ok(Self::with_client(client, config, page_size))
    }

    /// Create an adapter around an existing HTTP client.
    #[must_use]
    pub fn with_client(client: Client, config: &RegistryConfig, page_size: usize) -> Self {
        Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            page_size,
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        let raw = format!("{}/{path}", self.api_url);
        Url::parse(&raw).map_err(|e| HarvesterError::Config(format!("invalid registry URL {raw}: {e}")))
    }

    /// `GET /dois/{id}` with each `/`-separated part of the DOI percent-encoded.
    pub fn record_url(&self, identifier: &str) -> Result<Url> {
        let mut url = self.endpoint("dois")?;
        url.path_segments_mut()
            .map_err(|()| HarvesterError::Config(format!("registry URL cannot take a path: {}", self.api_url)))?
            .extend(identifier.trim().split('/'));
        Ok(url)
    }

    /// Build the `GET /dois` URL for one page.
    ///
    /// `now` closes an open-ended date range.
    pub fn list_url(&self, filter: &RecordFilter, cursor: &RegistryCursor, now: NaiveDateTime) -> Result<Url> {
        let mut url = self.endpoint("dois")?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("detail", "true");

            if let Some(set) = filter.set.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
                let set = set.to_lowercase();
                if set.contains('.') {
                    pairs.append_pair("client_id", &set);
                } else {
                    pairs.append_pair("provider_id", &set);
                }
            }

            pairs.append_pair("page[size]", &self.page_size.to_string());
            if let Some(value) = cursor.as_query_value() {
                pairs.append_pair("page[cursor]", value);
            }

            if let Some(query) = build_query(filter, now) {
                pairs.append_pair("query", &query);
            }
        }
        Ok(url)
    }
}

/// Combine the free-text query with the `updated:[from TO until]` range.
fn build_query(filter: &RecordFilter, now: NaiveDateTime) -> Option<String> {
    let range = filter.date_range(now).map(|(from, until)| {
        format!(
            "updated:[{} TO {}]",
            format_query_instant(&from),
            format_query_instant(&until)
        )
    });
    let text = filter.query.as_deref().map(str::trim).filter(|q| !q.is_empty());

    match (text, range) {
        (Some(text), Some(range)) => Some(format!("{text} AND {range}")),
        (Some(text), None) => Some(text.to_string()),
        (None, range) => range,
    }
}

/// Pull the `page[cursor]` value out of a `links.next` URL.
fn cursor_from_next_link(next: Option<&str>) -> RegistryCursor {
    let Some(link) = next else {
        return RegistryCursor::Exhausted;
    };

    match Url::parse(link) {
        Ok(url) => url
            .query_pairs()
            .find(|(key, _)| key == "page[cursor]")
            .map(|(_, value)| RegistryCursor::Next(value.into_owned()))
            .unwrap_or(RegistryCursor::Exhausted),
        Err(e) => {
            tracing::warn!(link, error = %e, "Unparseable next link, ending listing");
            RegistryCursor::Exhausted
        }
    }
}

impl SourceAdapter for RegistryAdapter {
    type Cursor = RegistryCursor;

    fn name(&self) -> &'static str {
        "registry"
    }

    fn list(&self, filter: &RecordFilter, cursor: &RegistryCursor) -> Result<Option<RawPage<RegistryCursor>>> {
        if cursor.is_exhausted() {
            return Ok(Some(RawPage::exhausted()));
        }

        let url = self.list_url(filter, cursor, Utc::now().naive_utc())?;
        let response: ListResponse = get_json(&self.client, &url)?;

        if response.meta.total == Some(0) {
            tracing::debug!(url = %url, "Registry query matched nothing");
            return Ok(None);
        }

        let records = response
            .data
            .into_iter()
            .filter_map(|value| match serde_json::from_value::<RegistryRecord>(value) {
                Ok(record) => Some(RawRecord::Registry(Box::new(record))),
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping malformed registry record");
                    None
                }
            })
            .collect();

        Ok(Some(RawPage {
            records,
            next_cursor: cursor_from_next_link(response.links.next.as_deref()),
            total: response.meta.total,
        }))
    }

    fn fetch(&self, identifier: &str) -> Result<Option<RawRecord>> {
        let url = self.record_url(identifier)?;
        let response: Option<SingleResponse> = get_json_optional(&self.client, &url)?;
        Ok(response.map(|r| RawRecord::Registry(Box::new(r.data))))
    }

    fn sets(&self) -> Result<Vec<SetInfo>> {
        let mut url = self.endpoint("clients")?;
        url.query_pairs_mut()
            .append_pair("page[size]", &SETS_PAGE_SIZE.to_string());

        let response: ClientsResponse = get_json(&self.client, &url)?;
        if response.meta.total == Some(0) {
            return Ok(Vec::new());
        }

        let mut sets: Vec<SetInfo> = Vec::new();
        for entry in response.data.into_iter().chain(response.included) {
            if sets.iter().any(|s| s.spec == entry.id) {
                continue;
            }
            let name = entry.attributes.name.unwrap_or_default();
            sets.push(SetInfo::new(entry.id, name));
        }
        sets.sort_by(|a, b| a.spec.cmp(&b.spec));
        Ok(sets)
    }
}
