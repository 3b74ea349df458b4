//! Row shapes read from the repository database.

use crate::identifier::IdentifierInput;

/// One `records ⋈ repositories` row.
///
/// Text columns are read through `COALESCE(..., '')` so they are never null.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordRow {
    pub record_id: i64,
    pub title: String,
    /// Publication date as stored, usually `YYYY-MM-DD`.
    pub pub_date: String,
    pub series: String,
    pub source_url: String,
    pub deleted: bool,
    pub local_identifier: String,
    pub repository_name: String,
    pub item_url_pattern: String,
    pub homepage_url: String,
}

impl RecordRow {
    /// The fields URL resolution looks at.
    #[must_use]
    pub fn identifier_input(&self) -> IdentifierInput<'_> {
        let mut input = IdentifierInput::new(&self.local_identifier);
        if !self.item_url_pattern.is_empty() {
            input = input.with_pattern(&self.item_url_pattern);
        }
        if !self.source_url.is_empty() {
            input = input.with_source_url(&self.source_url);
        }
        input
    }
}

/// A `geospatial` row; coordinates are kept as text until the builder parses them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeoRow {
    pub coordinate_type: String,
    pub lat: String,
    pub lon: String,
}

impl GeoRow {
    pub fn new(coordinate_type: impl Into<String>, lat: impl Into<String>, lon: impl Into<String>) -> Self {
        Self {
            coordinate_type: coordinate_type.into(),
            lat: lat.into(),
            lon: lon.into(),
        }
    }

    #[must_use]
    pub fn is_polygon(&self) -> bool {
        self.coordinate_type == "Polygon"
    }
}

/// Side lookups keyed by `record_id`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordDetails {
    /// Creators with `is_contributor = 0`, in join-row order.
    pub authors: Vec<String>,
    pub affiliations: Vec<String>,
    /// Creators with `is_contributor = 1`, in join-row order.
    pub contributors: Vec<String>,
    pub subjects: Vec<String>,
    pub publishers: Vec<String>,
    pub rights: Vec<String>,
    pub descriptions_en: Vec<String>,
    pub descriptions_fr: Vec<String>,
    pub tags_en: Vec<String>,
    pub tags_fr: Vec<String>,
    pub access: Vec<String>,
    pub geospatial: Vec<GeoRow>,
}

/// A record row that survived exclusion, with its resolved URL and lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryRecord {
    pub row: RecordRow,
    /// Canonical landing page URL.
    pub resolved_url: String,
    pub details: RecordDetails,
}

/// Rows for one page plus the total number of rows matching the filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowPage {
    pub rows: Vec<RecordRow>,
    pub total: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifier::resolve_local_url;

    #[test]
    fn test_identifier_input_skips_empty_fields() {
        let row = RecordRow {
            local_identifier: "1234".to_string(),
            ..RecordRow::default()
        };
        let input = row.identifier_input();
        assert_eq!(input.item_url_pattern, None);
        assert_eq!(input.source_url, None);
        assert_eq!(resolve_local_url(&input), None);
    }

    #[test]
    fn test_identifier_input_uses_pattern() {
        let row = RecordRow {
            local_identifier: "oai:example.org:item_42".to_string(),
            item_url_pattern: "https://example.org/items/%id%".to_string(),
            ..RecordRow::default()
        };
        assert_eq!(
            resolve_local_url(&row.identifier_input()).as_deref(),
            Some("https://example.org/items/item:42")
        );
    }

    #[test]
    fn test_geo_row_polygon() {
        assert!(GeoRow::new("Polygon", "1", "2").is_polygon());
        assert!(!GeoRow::new("Point", "1", "2").is_polygon());
    }
}
