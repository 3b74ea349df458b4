//! Core data types for the harvester.
//!
//! [`Metadata`] is the canonical record shape handed to the OAI-PMH front
//! end, whichever backend it came from. Every list defaults to empty and
//! every scalar string to `""`; nothing here is ever null.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize, Serializer};

use crate::temporal::zero_instant;

/// A `{type, identifier}` pair with the DOI resolver prefix already stripped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identifier {
    #[serde(rename = "type")]
    pub identifier_type: String,
    pub identifier: String,
}

impl Identifier {
    #[must_use]
    pub fn new(identifier_type: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self {
            identifier_type: identifier_type.into(),
            identifier: identifier.into(),
        }
    }
}

/// A related resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    #[serde(rename = "type")]
    pub relation_type: String,
    pub identifier: String,
}

/// A rights statement with an optional licence URI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rights {
    pub statement: Option<String>,
    pub uri: Option<String>,
}

/// A typed date (`Issued`, `Created`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateEntry {
    #[serde(rename = "type")]
    pub date_type: Option<String>,
    pub date: String,
}

/// A contributor; repository contributors only carry a name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contributor {
    pub name: String,
    pub contributor_type: Option<String>,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub affiliations: Vec<String>,
}

impl Contributor {
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// A funding source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingReference {
    pub funder_name: String,
    pub funder_identifier: Option<String>,
    pub funder_identifier_type: Option<String>,
    pub award_number: Option<String>,
    pub award_title: Option<String>,
}

/// A WGS84 point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// A WGS84 bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBox {
    pub west: f64,
    pub east: f64,
    pub south: f64,
    pub north: f64,
}

/// A spatial coverage entry.
///
/// Registry records may combine a place name, point, box and polygon in one
/// entry; repository records produce either a point or a polygon.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    /// Source geometry type when the backend states one (`Point`, `Polygon`, ...).
    pub geometry_type: Option<String>,
    pub place: Option<String>,
    pub point: Option<GeoPoint>,
    pub bounding_box: Option<GeoBox>,
    pub polygon: Vec<GeoPoint>,
}

/// Canonical harvested record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metadata {
    /// Source-native key, unique within one backend.
    pub identifier: String,

    /// Naive UTC.
    pub created_datetime: NaiveDateTime,

    /// Naive UTC.
    pub updated_datetime: NaiveDateTime,

    /// Full DataCite document: verbatim from the registry, synthesized for
    /// the repository.
    #[serde(serialize_with = "serialize_xml")]
    pub xml: Option<Vec<u8>>,

    pub titles: Vec<String>,
    pub creators: Vec<String>,
    pub subjects: Vec<String>,
    pub descriptions: Vec<String>,
    pub publisher: String,
    pub publication_year: String,
    pub dates: Vec<DateEntry>,
    pub contributors: Vec<Contributor>,
    pub resource_types: Vec<String>,
    pub funding_references: Vec<FundingReference>,
    pub geo_locations: Vec<GeoLocation>,
    pub formats: Vec<String>,
    pub identifiers: Vec<Identifier>,
    pub language: String,
    pub relations: Vec<Relation>,
    pub rights: Vec<Rights>,
    pub sizes: Vec<String>,
    pub client: String,
    pub active: bool,
}

impl Metadata {
    /// An empty record with the given identifier and zero timestamps.
    #[must_use]
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            created_datetime: zero_instant(),
            updated_datetime: zero_instant(),
            xml: None,
            titles: Vec::new(),
            creators: Vec::new(),
            subjects: Vec::new(),
            descriptions: Vec::new(),
            publisher: String::new(),
            publication_year: String::new(),
            dates: Vec::new(),
            contributors: Vec::new(),
            resource_types: Vec::new(),
            funding_references: Vec::new(),
            geo_locations: Vec::new(),
            formats: Vec::new(),
            identifiers: Vec::new(),
            language: String::new(),
            relations: Vec::new(),
            rights: Vec::new(),
            sizes: Vec::new(),
            client: String::new(),
            active: true,
        }
    }

    /// The XML document as UTF-8 text, if present.
    #[must_use]
    pub fn xml_str(&self) -> Option<&str> {
        self.xml.as_deref().and_then(|bytes| std::str::from_utf8(bytes).ok())
    }

    /// Whether the record carries a non-empty XML document.
    #[must_use]
    pub fn has_xml(&self) -> bool {
        self.xml.as_ref().is_some_and(|xml| !xml.is_empty())
    }
}

fn serialize_xml<S: Serializer>(xml: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error> {
    match xml {
        Some(bytes) => serializer.serialize_some(&String::from_utf8_lossy(bytes)),
        None => serializer.serialize_none(),
    }
}

/// Query restrictions for a listing.
///
/// The date range applies to the *updated* timestamp and is `[from, until)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    /// Free-text query in the backend's query language.
    pub query: Option<String>,

    /// Set spec restricting the listing to one partition.
    pub set: Option<String>,

    pub from: Option<NaiveDateTime>,
    pub until: Option<NaiveDateTime>,
}

impl RecordFilter {
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_set(mut self, set: impl Into<String>) -> Self {
        self.set = Some(set.into());
        self
    }

    pub fn with_range(mut self, from: Option<NaiveDateTime>, until: Option<NaiveDateTime>) -> Self {
        self.from = from;
        self.until = until;
        self
    }

    /// The effective date range, with `until` defaulting to `now` when only
    /// `from` is given.
    #[must_use]
    pub fn date_range(&self, now: NaiveDateTime) -> Option<(NaiveDateTime, NaiveDateTime)> {
        match (self.from, self.until) {
            (Some(from), Some(until)) => Some((from, until)),
            (Some(from), None) => Some((from, now)),
            _ => None,
        }
    }

    /// Lower and upper bound applied independently, `until` again defaulting
    /// to `now` when only `from` is given.
    #[must_use]
    pub fn bounds(&self, now: NaiveDateTime) -> (Option<NaiveDateTime>, Option<NaiveDateTime>) {
        let until = self.until.or(self.from.map(|_| now));
        (self.from, until)
    }
}

/// A set (partition) that records can be listed by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetInfo {
    pub spec: String,
    pub name: String,
}

impl SetInfo {
    #[must_use]
    pub fn new(spec: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            spec: spec.into(),
            name: name.into(),
        }
    }
}

/// One page of canonical records.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordPage<C> {
    pub records: Vec<Metadata>,

    /// `None` when the query matched nothing at all.
    pub next_cursor: Option<C>,

    /// Total number of matches reported by the backend, when known.
    pub total: Option<u64>,
}

impl<C> RecordPage<C> {
    /// The page returned when a query matches nothing.
    #[must_use]
    pub fn no_match() -> Self {
        Self {
            records: Vec::new(),
            next_cursor: None,
            total: Some(0),
        }
    }

    #[must_use]
    pub fn is_no_match(&self) -> bool {
        self.records.is_empty() && self.next_cursor.is_none()
    }
}
