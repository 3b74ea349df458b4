//! Access to the repository database.
//!
//! [`RecordStore`] is the seam between the adapter and Postgres so paging and
//! exclusion can be exercised against an in-memory store.

use postgres::types::ToSql;
use postgres::{Client, NoTls, Row};

use crate::config::RepositoryConfig;
use crate::error::Result;

use super::query::{self, RecordQuery, SqlParam};
use super::types::{GeoRow, RecordDetails, RecordRow, RowPage};

/// Read-only access to records, repositories and side lookups.
pub trait RecordStore {
    /// Rows for one page and the total number of matching rows.
    fn fetch_page(&self, query: &RecordQuery) -> Result<RowPage>;

    fn fetch_record(&self, record_id: i64) -> Result<Option<RecordRow>>;

    /// All side lookups for one record.
    fn fetch_details(&self, record_id: i64) -> Result<RecordDetails>;

    /// `(homepage_url, repository_name)` for every repository, ordered by URL.
    fn fetch_repositories(&self) -> Result<Vec<(String, String)>>;
}

/// Postgres-backed store.
///
/// Opens one connection per call; it is dropped on every exit path.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    config: RepositoryConfig,
}

impl PostgresStore {
    #[must_use]
    pub fn new(config: RepositoryConfig) -> Self {
        Self { config }
    }

    fn connect(&self) -> Result<Client> {
        tracing::trace!(host = %self.config.host, dbname = %self.config.dbname, "Connecting to repository database");
        Ok(self.config.pg_config().connect(NoTls)?)
    }
}

fn bind(params: &[SqlParam]) -> Vec<&(dyn ToSql + Sync)> {
    params
        .iter()
        .map(|param| match param {
            SqlParam::Text(value) => value as &(dyn ToSql + Sync),
            SqlParam::Int(value) => value as &(dyn ToSql + Sync),
        })
        .collect()
}

fn record_row(row: &Row) -> Result<RecordRow> {
    let deleted: i32 = row.try_get(5)?;
    Ok(RecordRow {
        record_id: row.try_get(0)?,
        title: row.try_get(1)?,
        pub_date: row.try_get(2)?,
        series: row.try_get(3)?,
        source_url: row.try_get(4)?,
        deleted: deleted != 0,
        local_identifier: row.try_get(6)?,
        repository_name: row.try_get(7)?,
        item_url_pattern: row.try_get(8)?,
        homepage_url: row.try_get(9)?,
    })
}

/// First column of every row, skipping nulls.
fn strings(conn: &mut Client, sql: &str, params: &[&(dyn ToSql + Sync)]) -> Result<Vec<String>> {
    let rows = conn.query(sql, params)?;
    let mut values = Vec::with_capacity(rows.len());
    for row in &rows {
        if let Some(value) = row.try_get::<_, Option<String>>(0)? {
            values.push(value);
        }
    }
    Ok(values)
}

impl RecordStore for PostgresStore {
    fn fetch_page(&self, query: &RecordQuery) -> Result<RowPage> {
        let mut conn = self.connect()?;

        let (count_sql, count_params) = query.count_sql();
        let total: i64 = conn.query_one(count_sql.as_str(), &bind(&count_params))?.try_get(0)?;

        let (page_sql, page_params) = query.page_sql();
        let rows = conn
            .query(page_sql.as_str(), &bind(&page_params))?
            .iter()
            .map(record_row)
            .collect::<Result<Vec<_>>>()?;

        Ok(RowPage {
            rows,
            total: u64::try_from(total).unwrap_or_default(),
        })
    }

    fn fetch_record(&self, record_id: i64) -> Result<Option<RecordRow>> {
        let mut conn = self.connect()?;
        conn.query_opt(query::record_by_id_sql().as_str(), &[&record_id])?
            .as_ref()
            .map(record_row)
            .transpose()
    }

    fn fetch_details(&self, record_id: i64) -> Result<RecordDetails> {
        let mut conn = self.connect()?;
        let id = &record_id as &(dyn ToSql + Sync);
        let (author, contributor): (i32, i32) = (0, 1);
        let (en, fr) = ("en", "fr");

        let geospatial = conn
            .query(query::GEOSPATIAL, &[id])?
            .iter()
            .map(|row| -> Result<GeoRow> {
                Ok(GeoRow {
                    coordinate_type: row.try_get(0)?,
                    lat: row.try_get(1)?,
                    lon: row.try_get(2)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(RecordDetails {
            authors: strings(&mut conn, query::CREATORS, &[id, &author])?,
            affiliations: strings(&mut conn, query::AFFILIATIONS, &[id])?,
            contributors: strings(&mut conn, query::CREATORS, &[id, &contributor])?,
            subjects: strings(&mut conn, query::SUBJECTS, &[id])?,
            publishers: strings(&mut conn, query::PUBLISHERS, &[id])?,
            rights: strings(&mut conn, query::RIGHTS, &[id])?,
            descriptions_en: strings(&mut conn, query::DESCRIPTIONS, &[id, &en])?,
            descriptions_fr: strings(&mut conn, query::DESCRIPTIONS, &[id, &fr])?,
            tags_en: strings(&mut conn, query::TAGS, &[id, &en])?,
            tags_fr: strings(&mut conn, query::TAGS, &[id, &fr])?,
            access: strings(&mut conn, query::ACCESS, &[id])?,
            geospatial,
        })
    }

    fn fetch_repositories(&self) -> Result<Vec<(String, String)>> {
        let mut conn = self.connect()?;
        conn.query(query::REPOSITORIES, &[])?
            .iter()
            .map(|row| -> Result<(String, String)> { Ok((row.try_get(0)?, row.try_get(1)?)) })
            .collect()
    }
}
