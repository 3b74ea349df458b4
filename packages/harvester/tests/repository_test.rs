//! Repository adapter and harvester service tests over an in-memory store.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use metaharvest_harvester::config::{HOSTING_INSTITUTION, RESERVED_SET_NAME, RESERVED_SET_SPEC};
use metaharvest_harvester::source::repository::{
    GeoRow, RecordDetails, RecordQuery, RecordRow, RecordStore, RowPage,
};
use metaharvest_harvester::types::{Identifier, SetInfo};
use metaharvest_harvester::{
    Harvester, HarvesterError, PageCursor, RecordFilter, RepositoryAdapter, RepositoryCursor,
    Result,
};
use pretty_assertions::assert_eq;

const POLAR: &str = "https://polar.example.org";
const OCEAN: &str = "https://ocean.example.org";

/// In-memory stand-in for the repository database.
#[derive(Default)]
struct MemoryStore {
    rows: Vec<RecordRow>,
    details: HashMap<i64, RecordDetails>,
    repositories: Vec<(String, String)>,
    page_calls: Cell<usize>,
    detail_calls: RefCell<Vec<i64>>,
    fail: bool,
}

impl MemoryStore {
    fn with_rows(rows: Vec<RecordRow>) -> Self {
        Self {
            rows,
            ..Self::default()
        }
    }

    fn matches(query: &RecordQuery, row: &RecordRow) -> bool {
        if let Some(set) = &query.set {
            if &row.homepage_url != set {
                return false;
            }
        }
        if let Some(from) = &query.from {
            if row.pub_date.as_str() < from.as_str() {
                return false;
            }
        }
        if let Some(until) = &query.until {
            if row.pub_date.as_str() >= until.as_str() {
                return false;
            }
        }
        true
    }
}

impl RecordStore for MemoryStore {
    fn fetch_page(&self, query: &RecordQuery) -> Result<RowPage> {
        self.page_calls.set(self.page_calls.get() + 1);
        if self.fail {
            return Err(HarvesterError::Config("connection refused".to_string()));
        }

        let mut matching: Vec<&RecordRow> = self
            .rows
            .iter()
            .filter(|row| Self::matches(query, row))
            .collect();
        matching.sort_by_key(|row| row.record_id);

        let total = matching.len() as u64;
        let rows = matching
            .into_iter()
            .skip(query.offset as usize)
            .take(query.limit)
            .cloned()
            .collect();
        Ok(RowPage { rows, total })
    }

    fn fetch_record(&self, record_id: i64) -> Result<Option<RecordRow>> {
        Ok(self.rows.iter().find(|row| row.record_id == record_id).cloned())
    }

    fn fetch_details(&self, record_id: i64) -> Result<RecordDetails> {
        self.detail_calls.borrow_mut().push(record_id);
        Ok(self.details.get(&record_id).cloned().unwrap_or_default())
    }

    fn fetch_repositories(&self) -> Result<Vec<(String, String)>> {
        Ok(self.repositories.clone())
    }
}

fn row(record_id: i64, title: &str, pub_date: &str, homepage_url: &str) -> RecordRow {
    RecordRow {
        record_id,
        title: title.to_string(),
        pub_date: pub_date.to_string(),
        local_identifier: format!("oai:repo.example.org:item_{record_id}"),
        repository_name: "Example Repository".to_string(),
        item_url_pattern: format!("{homepage_url}/item/%id%"),
        homepage_url: homepage_url.to_string(),
        ..RecordRow::default()
    }
}

fn harvester(store: MemoryStore, page_size: usize) -> Harvester<RepositoryAdapter<MemoryStore>> {
    Harvester::new(RepositoryAdapter::with_store(store, page_size))
}

fn ids(records: &[metaharvest_harvester::Metadata]) -> Vec<&str> {
    records.iter().map(|r| r.identifier.as_str()).collect()
}

#[test]
fn test_pagination_walks_every_page() {
    let rows = (1..=5)
        .map(|id| row(id, &format!("Record {id}"), "2020-01-01", POLAR))
        .collect();
    let harvester = harvester(MemoryStore::with_rows(rows), 2);
    let filter = RecordFilter::default();

    let first = harvester
        .list_records(&filter, &RepositoryCursor::start())
        .unwrap();
    assert_eq!(ids(&first.records), vec!["1", "2"]);
    assert_eq!(first.next_cursor, Some(RepositoryCursor::Offset(2)));
    assert_eq!(first.total, Some(5));

    let second = harvester
        .list_records(&filter, &first.next_cursor.unwrap())
        .unwrap();
    assert_eq!(ids(&second.records), vec!["3", "4"]);
    assert_eq!(second.next_cursor, Some(RepositoryCursor::Offset(4)));

    let third = harvester
        .list_records(&filter, &second.next_cursor.unwrap())
        .unwrap();
    assert_eq!(ids(&third.records), vec!["5"]);
    assert_eq!(third.next_cursor, Some(RepositoryCursor::Exhausted));
}

#[test]
fn test_full_page_is_never_terminal() {
    let rows = vec![
        row(1, "One", "2020-01-01", POLAR),
        row(2, "Two", "2020-01-01", POLAR),
    ];
    let harvester = harvester(MemoryStore::with_rows(rows), 2);
    let filter = RecordFilter::default();

    let first = harvester
        .list_records(&filter, &RepositoryCursor::start())
        .unwrap();
    assert_eq!(first.records.len(), 2);
    let next = first.next_cursor.unwrap();
    assert!(!next.is_exhausted());

    let second = harvester.list_records(&filter, &next).unwrap();
    assert!(second.records.is_empty());
    assert_eq!(second.next_cursor, Some(RepositoryCursor::Exhausted));
    assert!(!second.is_no_match());
}

#[test]
fn test_excluded_rows_are_silently_dropped() {
    let mut deleted = row(2, "Deleted", "2020-01-01", POLAR);
    deleted.deleted = true;
    let untitled = row(3, "   ", "2020-01-01", POLAR);
    let unresolvable = RecordRow {
        record_id: 4,
        title: "No URL".to_string(),
        pub_date: "2020-01-01".to_string(),
        local_identifier: "4444".to_string(),
        homepage_url: POLAR.to_string(),
        ..RecordRow::default()
    };
    let rows = vec![
        row(1, "Kept", "2020-01-01", POLAR),
        deleted,
        untitled,
        unresolvable,
    ];
    let harvester = harvester(MemoryStore::with_rows(rows), 4);

    let page = harvester
        .list_records(&RecordFilter::default(), &RepositoryCursor::start())
        .unwrap();

    assert_eq!(ids(&page.records), vec!["1"]);
    // A short page after exclusion still continues the listing
    assert_eq!(page.next_cursor, Some(RepositoryCursor::Offset(4)));
    // Side lookups only run for rows that survive screening
    assert_eq!(*harvester.adapter().store().detail_calls.borrow(), vec![1]);
}

#[test]
fn test_no_match_is_distinct_from_end() {
    let harvester = harvester(MemoryStore::default(), 50);
    let page = harvester
        .list_records(&RecordFilter::default(), &RepositoryCursor::start())
        .unwrap();

    assert!(page.is_no_match());
    assert_eq!(page.next_cursor, None);
}

#[test]
fn test_exhausted_cursor_skips_store() {
    let harvester = harvester(MemoryStore::with_rows(vec![row(1, "A", "2020-01-01", POLAR)]), 50);
    let page = harvester
        .list_records(&RecordFilter::default(), &RepositoryCursor::Exhausted)
        .unwrap();

    assert!(page.records.is_empty());
    assert_eq!(page.next_cursor, Some(RepositoryCursor::Exhausted));
    assert_eq!(harvester.adapter().store().page_calls.get(), 0);
}

#[test]
fn test_set_and_reserved_set() {
    let rows = vec![
        row(1, "Polar", "2020-01-01", POLAR),
        row(2, "Ocean", "2020-01-01", OCEAN),
    ];
    let harvester = harvester(MemoryStore::with_rows(rows), 50);

    let polar = harvester
        .list_records(&RecordFilter::default().with_set(POLAR), &RepositoryCursor::start())
        .unwrap();
    assert_eq!(ids(&polar.records), vec!["1"]);
    assert_eq!(polar.records[0].client, POLAR);

    let everything = harvester
        .list_records(
            &RecordFilter::default().with_set(RESERVED_SET_SPEC),
            &RepositoryCursor::start(),
        )
        .unwrap();
    assert_eq!(ids(&everything.records), vec!["1", "2"]);
}

#[test]
fn test_date_range_is_half_open() {
    let rows = vec![
        row(1, "Before", "2018-12-31", POLAR),
        row(2, "Start", "2019-01-01", POLAR),
        row(3, "Inside", "2019-06-15", POLAR),
        row(4, "End", "2020-01-01", POLAR),
    ];
    let harvester = harvester(MemoryStore::with_rows(rows), 50);
    let from = metaharvest_harvester::temporal::parse_utc("2019-01-01").unwrap();
    let until = metaharvest_harvester::temporal::parse_utc("2020-01-01").unwrap();

    let page = harvester
        .list_records(
            &RecordFilter::default().with_range(Some(from), Some(until)),
            &RepositoryCursor::start(),
        )
        .unwrap();
    assert_eq!(ids(&page.records), vec!["2", "3"]);
}

#[test]
fn test_store_failure_propagates() {
    let store = MemoryStore {
        fail: true,
        ..MemoryStore::default()
    };
    let result = harvester(store, 50).list_records(&RecordFilter::default(), &RepositoryCursor::start());
    assert!(result.is_err());
}

#[test]
fn test_listed_record_is_fully_mapped() {
    let mut store = MemoryStore::with_rows(vec![row(7, "Sea ice extent", "2019-05-03", POLAR)]);
    store.details.insert(
        7,
        RecordDetails {
            authors: vec!["Doe, Jane".to_string()],
            subjects: vec!["sea ice".to_string()],
            tags_fr: vec!["glace de mer".to_string(), "sea ice".to_string()],
            descriptions_en: vec!["Daily extent.".to_string()],
            descriptions_fr: vec![String::new()],
            geospatial: vec![GeoRow::new("Point", "75.0", "-40.0")],
            ..RecordDetails::default()
        },
    );
    let harvester = harvester(store, 50);

    let page = harvester
        .list_records(&RecordFilter::default(), &RepositoryCursor::start())
        .unwrap();
    let record = &page.records[0];

    assert_eq!(record.titles, vec!["Sea ice extent"]);
    assert_eq!(record.creators, vec!["Doe, Jane"]);
    assert_eq!(record.subjects, vec!["sea ice", "glace de mer"]);
    assert_eq!(record.descriptions, vec!["Daily extent."]);
    assert_eq!(record.publisher, "Example Repository");
    assert_eq!(record.publication_year, "2019");
    assert_eq!(
        record.identifiers,
        vec![Identifier::new("URL", format!("{POLAR}/item/item:7"))]
    );
    assert_eq!(record.geo_locations.len(), 1);
    assert!(record.active);

    let xml = record.xml_str().unwrap();
    assert!(xml.contains(HOSTING_INSTITUTION));
    assert!(xml.contains("<title>Sea ice extent</title>"));
}

#[test]
fn test_bad_coordinates_keep_the_record() {
    let mut store = MemoryStore::with_rows(vec![row(8, "Transect", "2019-05-03", POLAR)]);
    store.details.insert(
        8,
        RecordDetails {
            geospatial: vec![
                GeoRow::new("Polygon", "1.0", "2.0"),
                GeoRow::new("Polygon", "north", "2.0"),
            ],
            ..RecordDetails::default()
        },
    );
    let page = harvester(store, 50)
        .list_records(&RecordFilter::default(), &RepositoryCursor::start())
        .unwrap();

    assert_eq!(ids(&page.records), vec!["8"]);
    assert!(page.records[0].geo_locations.is_empty());
}

#[test]
fn test_get_record() {
    let mut deleted = row(2, "Deleted", "2020-01-01", POLAR);
    deleted.deleted = true;
    let harvester = harvester(
        MemoryStore::with_rows(vec![row(1, "Found", "2020-01-01", POLAR), deleted]),
        50,
    );

    let found = harvester.get_record("1").unwrap().expect("record 1 exists");
    assert_eq!(found.titles, vec!["Found"]);

    assert!(harvester.get_record("2").unwrap().is_none());
    assert!(harvester.get_record("99").unwrap().is_none());
    assert!(harvester.get_record("10.5072/abc").unwrap().is_none());
}

#[test]
fn test_list_sets_appends_reserved_set() {
    let store = MemoryStore {
        repositories: vec![
            (OCEAN.to_string(), "Ocean Data".to_string()),
            (POLAR.to_string(), "Polar Data".to_string()),
        ],
        ..MemoryStore::default()
    };
    let sets = harvester(store, 50).list_sets().unwrap();

    assert_eq!(
        sets,
        vec![
            SetInfo::new(OCEAN, "Ocean Data"),
            SetInfo::new(POLAR, "Polar Data"),
            SetInfo::new(RESERVED_SET_SPEC, RESERVED_SET_NAME),
        ]
    );
}
