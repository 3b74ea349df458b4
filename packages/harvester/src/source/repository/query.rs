//! SQL for the repository database.
//!
//! Listing filters are composed here as parameterized statements so they can
//! be checked without a database. Placeholders are numbered in the order the
//! parameters are pushed.

use chrono::{NaiveDateTime, NaiveTime};

use crate::config::RESERVED_SET_SPEC;
use crate::types::RecordFilter;

/// Columns selected for every record row, in [`RecordRow`](super::RecordRow) order.
const RECORD_COLUMNS: &str = "recs.record_id::bigint, \
    COALESCE(recs.title, ''), \
    COALESCE(recs.pub_date::text, ''), \
    COALESCE(recs.series, ''), \
    COALESCE(recs.source_url, ''), \
    COALESCE(recs.deleted, 0)::int, \
    COALESCE(recs.local_identifier, ''), \
    COALESCE(repos.repository_name, ''), \
    COALESCE(repos.item_url_pattern, ''), \
    COALESCE(repos.homepage_url, '')";

const RECORD_JOIN: &str = "FROM records recs \
    JOIN repositories repos ON recs.repository_id = repos.repository_id";

pub const REPOSITORIES: &str = "SELECT COALESCE(homepage_url, ''), COALESCE(repository_name, '') \
    FROM repositories ORDER BY homepage_url";

pub const GEOSPATIAL: &str = "SELECT COALESCE(coordinate_type, ''), COALESCE(lat::text, ''), COALESCE(lon::text, '') \
    FROM geospatial WHERE record_id = $1::bigint";

/// Creators by role; `$2` is `is_contributor` (0 for authors, 1 for contributors).
pub const CREATORS: &str = "SELECT creators.creator FROM creators \
    JOIN records_x_creators ON records_x_creators.creator_id = creators.creator_id \
    WHERE records_x_creators.record_id = $1::bigint AND records_x_creators.is_contributor = $2::int \
    ORDER BY records_x_creators.records_x_creators_id ASC";

pub const AFFILIATIONS: &str = "SELECT affiliations.affiliation FROM affiliations \
    JOIN records_x_affiliations ON records_x_affiliations.affiliation_id = affiliations.affiliation_id \
    WHERE records_x_affiliations.record_id = $1::bigint";

pub const SUBJECTS: &str = "SELECT subjects.subject FROM subjects \
    JOIN records_x_subjects ON records_x_subjects.subject_id = subjects.subject_id \
    WHERE records_x_subjects.record_id = $1::bigint";

pub const PUBLISHERS: &str = "SELECT publishers.publisher FROM publishers \
    JOIN records_x_publishers ON records_x_publishers.publisher_id = publishers.publisher_id \
    WHERE records_x_publishers.record_id = $1::bigint";

pub const RIGHTS: &str = "SELECT rights.rights FROM rights \
    JOIN records_x_rights ON records_x_rights.rights_id = rights.rights_id \
    WHERE records_x_rights.record_id = $1::bigint";

/// `$2` is a two-letter language code.
pub const DESCRIPTIONS: &str = "SELECT description FROM descriptions \
    WHERE record_id = $1::bigint AND language = $2";

/// `$2` is a two-letter language code.
pub const TAGS: &str = "SELECT tags.tag FROM tags \
    JOIN records_x_tags ON records_x_tags.tag_id = tags.tag_id \
    WHERE records_x_tags.record_id = $1::bigint AND tags.language = $2";

pub const ACCESS: &str = "SELECT access.access FROM access \
    JOIN records_x_access ON records_x_access.access_id = access.access_id \
    WHERE records_x_access.record_id = $1::bigint";

/// Single record by id; `$1` is the record id.
#[must_use]
pub fn record_by_id_sql() -> String {
    format!("SELECT {RECORD_COLUMNS} {RECORD_JOIN} WHERE recs.record_id = $1::bigint")
}

/// A bound parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlParam {
    Text(String),
    Int(i64),
}

/// Listing restrictions resolved against a fixed `now`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordQuery {
    /// Repository `homepage_url`; `None` lists every repository.
    pub set: Option<String>,
    /// Inclusive lower bound on `pub_date`.
    pub from: Option<String>,
    /// Exclusive upper bound on `pub_date`.
    pub until: Option<String>,
    pub offset: u64,
    pub limit: usize,
}

impl RecordQuery {
    /// Resolve a filter into bound values.
    ///
    /// The reserved set lists everything. Date bounds are rendered as text
    /// comparable with stored `pub_date` values.
    pub fn new(filter: &RecordFilter, offset: u64, limit: usize, now: NaiveDateTime) -> Self {
        let set = filter
            .set
            .as_deref()
            .map(str::trim)
            .filter(|set| !set.is_empty() && *set != RESERVED_SET_SPEC)
            .map(str::to_string);
        let (from, until) = filter.bounds(now);

        Self {
            set,
            from: from.as_ref().map(bound_text),
            until: until.as_ref().map(bound_text),
            offset,
            limit,
        }
    }

    fn where_clause(&self, params: &mut Vec<SqlParam>) -> String {
        let mut clause = String::new();
        if let Some(set) = &self.set {
            params.push(SqlParam::Text(set.clone()));
            clause.push_str(&format!(" AND repos.homepage_url = ${}", params.len()));
        }
        if let Some(from) = &self.from {
            params.push(SqlParam::Text(from.clone()));
            clause.push_str(&format!(" AND recs.pub_date::text >= ${}", params.len()));
        }
        if let Some(until) = &self.until {
            params.push(SqlParam::Text(until.clone()));
            clause.push_str(&format!(" AND recs.pub_date::text < ${}", params.len()));
        }
        clause
    }

    /// `SELECT COUNT(*)` over the filtered rows.
    #[must_use]
    pub fn count_sql(&self) -> (String, Vec<SqlParam>) {
        let mut params = Vec::new();
        let filters = self.where_clause(&mut params);
        (
            format!("SELECT COUNT(*) {RECORD_JOIN} WHERE TRUE{filters}"),
            params,
        )
    }

    /// One page of filtered rows ordered by `record_id`.
    #[must_use]
    pub fn page_sql(&self) -> (String, Vec<SqlParam>) {
        let mut params = Vec::new();
        let filters = self.where_clause(&mut params);

        params.push(SqlParam::Int(i64::try_from(self.limit).unwrap_or(i64::MAX)));
        let limit = params.len();
        params.push(SqlParam::Int(i64::try_from(self.offset).unwrap_or(i64::MAX)));
        let offset = params.len();

        (
            format!(
                "SELECT {RECORD_COLUMNS} {RECORD_JOIN} WHERE TRUE{filters} \
                 ORDER BY recs.record_id LIMIT ${limit} OFFSET ${offset}"
            ),
            params,
        )
    }
}

/// Date-only at midnight, otherwise a space-separated timestamp as Postgres
/// renders `timestamp::text`.
fn bound_text(instant: &NaiveDateTime) -> String {
    if instant.time() == NaiveTime::MIN {
        instant.format("%Y-%m-%d").to_string()
    } else {
        instant.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(0, 0, 0).unwrap()
    }

    #[test]
    fn test_record_by_id_sql() {
        let sql = record_by_id_sql();
        assert!(sql.starts_with("SELECT recs.record_id::bigint"));
        assert!(sql.ends_with("WHERE recs.record_id = $1::bigint"));
    }

    #[test]
    fn test_unfiltered_page() {
        let query = RecordQuery::new(&RecordFilter::default(), 100, 50, at(2024, 1, 1));
        let (sql, params) = query.page_sql();

        assert!(sql.ends_with("WHERE TRUE ORDER BY recs.record_id LIMIT $1 OFFSET $2"));
        assert_eq!(params, vec![SqlParam::Int(50), SqlParam::Int(100)]);
    }

    #[test]
    fn test_set_and_range() {
        let filter = RecordFilter::default()
            .with_set("https://example.org")
            .with_range(Some(at(2019, 1, 1)), Some(at(2020, 1, 1)));
        let query = RecordQuery::new(&filter, 0, 50, at(2024, 1, 1));
        let (sql, params) = query.page_sql();

        assert!(sql.contains(
            "WHERE TRUE AND repos.homepage_url = $1 AND recs.pub_date::text >= $2 AND recs.pub_date::text < $3"
        ));
        assert!(sql.contains("LIMIT $4 OFFSET $5"));
        assert_eq!(
            params,
            vec![
                SqlParam::Text("https://example.org".to_string()),
                SqlParam::Text("2019-01-01".to_string()),
                SqlParam::Text("2020-01-01".to_string()),
                SqlParam::Int(50),
                SqlParam::Int(0),
            ]
        );
    }

    #[test]
    fn test_reserved_set_is_unrestricted() {
        let filter = RecordFilter::default().with_set(RESERVED_SET_SPEC);
        let query = RecordQuery::new(&filter, 0, 50, at(2024, 1, 1));
        assert_eq!(query.set, None);

        let (sql, params) = query.count_sql();
        assert!(!sql.contains("homepage_url"));
        assert!(params.is_empty());
    }

    #[test]
    fn test_from_only_closes_at_now() {
        let now = NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(12, 30, 0)
            .unwrap();
        let filter = RecordFilter::default().with_range(Some(at(2024, 1, 1)), None);
        let query = RecordQuery::new(&filter, 0, 50, now);

        assert_eq!(query.from.as_deref(), Some("2024-01-01"));
        assert_eq!(query.until.as_deref(), Some("2024-06-01 12:30:00"));
    }

    #[test]
    fn test_time_bound_orders_against_stored_timestamps() {
        let until = NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(12, 30, 0)
            .unwrap();
        let filter = RecordFilter::default().with_range(None, Some(until));
        let query = RecordQuery::new(&filter, 0, 50, until);
        let bound = query.until.unwrap();

        assert!("2024-06-01 13:00:00" >= bound.as_str());
        assert!("2024-06-01 12:00:00" < bound.as_str());
        assert!("2024-06-01" < bound.as_str());
    }

    #[test]
    fn test_until_only_applies_upper_bound() {
        let filter = RecordFilter::default().with_range(None, Some(at(2020, 1, 1)));
        let query = RecordQuery::new(&filter, 0, 50, at(2024, 1, 1));
        let (sql, params) = query.count_sql();

        assert!(sql.starts_with("SELECT COUNT(*) FROM records recs"));
        assert!(sql.ends_with("WHERE TRUE AND recs.pub_date::text < $1"));
        assert_eq!(params, vec![SqlParam::Text("2020-01-01".to_string())]);
    }
}
