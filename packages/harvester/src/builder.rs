//! Record builder: raw backend records to canonical [`Metadata`].
//!
//! Each backend has its own mapping function; nothing downstream of this
//! module sees registry attribute names or repository column names.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Datelike;
use serde_json::Value;

use crate::error::Result;
use crate::identifier::{strip_uri_prefix, DOI_RESOLVER_PREFIX};
use crate::source::registry::types::{BoxItem, Coordinate, GeoLocationItem, IdentifierItem, PointItem};
use crate::source::repository::GeoRow;
use crate::source::{RawRecord, RegistryRecord, RepositoryRecord};
use crate::temporal::{normalize_or_zero, parse_utc};
use crate::text::{publication_year, split_rights_statement};
use crate::types::{
    Contributor, DateEntry, FundingReference, GeoBox, GeoLocation, GeoPoint, Identifier, Metadata,
    Relation, Rights,
};
use crate::xml::datacite::{descriptions, merged_subjects, synthesize_datacite};

/// Map one raw record into canonical metadata.
pub fn build_metadata(raw: RawRecord) -> Result<Metadata> {
    match raw {
        RawRecord::Registry(record) => Ok(from_registry(*record)),
        RawRecord::Repository(record) => from_repository(*record),
    }
}

/// Map a registry DOI resource.
#[must_use]
pub fn from_registry(record: RegistryRecord) -> Metadata {
    let attributes = record.attributes;
    let mut metadata = Metadata::new(record.id.clone());

    metadata.created_datetime = normalize_or_zero(attributes.created.as_deref());
    metadata.updated_datetime = normalize_or_zero(attributes.updated.as_deref());
    metadata.xml = attributes
        .xml
        .as_deref()
        .and_then(|encoded| decode_xml(&record.id, encoded));

    metadata.titles = attributes
        .titles
        .unwrap_or_default()
        .into_iter()
        .map(|t| t.title.unwrap_or_default())
        .collect();
    metadata.creators = attributes
        .creators
        .unwrap_or_default()
        .into_iter()
        .map(|c| c.name.unwrap_or_default())
        .collect();
    metadata.subjects = attributes
        .subjects
        .unwrap_or_default()
        .into_iter()
        .map(|s| s.subject.unwrap_or_default())
        .collect();
    metadata.descriptions = attributes
        .descriptions
        .unwrap_or_default()
        .into_iter()
        .map(|d| d.description.unwrap_or_default())
        .collect();

    metadata.publisher = attributes
        .publisher
        .as_ref()
        .and_then(|p| p.name())
        .unwrap_or_default()
        .to_string();
    metadata.publication_year = match attributes.publication_year {
        Some(Value::String(year)) => year,
        Some(Value::Number(year)) => year.to_string(),
        _ => String::new(),
    };

    metadata.dates = attributes
        .dates
        .unwrap_or_default()
        .into_iter()
        .filter_map(|d| {
            Some(DateEntry {
                date_type: d.date_type,
                date: d.date?,
            })
        })
        .collect();

    metadata.contributors = attributes
        .contributors
        .unwrap_or_default()
        .into_iter()
        .map(|c| Contributor {
            name: c.name.unwrap_or_default(),
            contributor_type: c.contributor_type,
            given_name: c.given_name,
            family_name: c.family_name,
            affiliations: c
                .affiliation
                .unwrap_or_default()
                .iter()
                .filter_map(|a| a.name().map(str::to_string))
                .collect(),
        })
        .collect();

    metadata.funding_references = attributes
        .funding_references
        .unwrap_or_default()
        .into_iter()
        .map(|f| FundingReference {
            funder_name: f.funder_name.unwrap_or_default(),
            funder_identifier: f.funder_identifier,
            funder_identifier_type: f.funder_identifier_type,
            award_number: f.award_number,
            award_title: f.award_title,
        })
        .collect();

    metadata.sizes = attributes.sizes.unwrap_or_default().into_iter().flatten().collect();
    metadata.formats = attributes.formats.unwrap_or_default().into_iter().flatten().collect();

    let geo = attributes.geo_locations.unwrap_or_default();
    metadata.geo_locations = registry_geo(&geo).unwrap_or_else(|bad| {
        tracing::warn!(doi = %record.id, value = %bad, "Unparseable coordinate, dropping geo locations");
        Vec::new()
    });

    if let Some(types) = attributes.types {
        metadata.resource_types = [types.resource_type_general, types.resource_type]
            .into_iter()
            .flatten()
            .collect();
    }

    metadata.identifiers = registry_identifiers(&record.id, attributes.identifiers.unwrap_or_default());
    metadata.language = attributes.language.unwrap_or_default();

    metadata.relations = attributes
        .related_identifiers
        .unwrap_or_default()
        .into_iter()
        .map(|r| Relation {
            relation_type: r.related_identifier_type.unwrap_or_default(),
            identifier: r.related_identifier.unwrap_or_default(),
        })
        .collect();

    metadata.rights = attributes
        .rights_list
        .unwrap_or_default()
        .into_iter()
        .map(|r| Rights {
            statement: r.rights,
            uri: r.rights_uri,
        })
        .collect();

    metadata.client = record
        .relationships
        .and_then(|r| r.client)
        .and_then(|c| c.data)
        .map(|d| d.id.to_uppercase())
        .unwrap_or_default();

    let flag = record.is_active.or(attributes.is_active).unwrap_or(true);
    metadata.active = metadata.has_xml() && flag;

    metadata
}

fn decode_xml(doi: &str, encoded: &str) -> Option<Vec<u8>> {
    match STANDARD.decode(encoded.trim()) {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            tracing::warn!(doi, error = %e, "Invalid base64 XML, treating record as having none");
            None
        }
    }
}

/// Stripped identifiers, with the record's own DOI first when it is missing.
fn registry_identifiers(doi: &str, items: Vec<IdentifierItem>) -> Vec<Identifier> {
    let mut identifiers: Vec<Identifier> = items
        .into_iter()
        .filter_map(|item| {
            let value = item.identifier.filter(|v| !v.is_empty())?;
            Some(Identifier::new(
                item.identifier_type.unwrap_or_default(),
                strip_uri_prefix(&value),
            ))
        })
        .collect();

    if !identifiers
        .iter()
        .any(|i| i.identifier.eq_ignore_ascii_case(doi))
    {
        identifiers.insert(0, Identifier::new("DOI", doi));
    }
    identifiers
}

/// Parse a present coordinate; `Err` carries the offending value.
fn coordinate(value: Option<&Coordinate>) -> std::result::Result<Option<f64>, String> {
    match value {
        None => Ok(None),
        Some(c) => c.value().map(Some).ok_or_else(|| format!("{c:?}")),
    }
}

fn registry_point(point: &PointItem) -> std::result::Result<Option<GeoPoint>, String> {
    let latitude = coordinate(point.point_latitude.as_ref())?;
    let longitude = coordinate(point.point_longitude.as_ref())?;
    Ok(latitude
        .zip(longitude)
        .map(|(latitude, longitude)| GeoPoint { latitude, longitude }))
}

fn registry_box(bounds: &BoxItem) -> std::result::Result<Option<GeoBox>, String> {
    let west = coordinate(bounds.west_bound_longitude.as_ref())?;
    let east = coordinate(bounds.east_bound_longitude.as_ref())?;
    let south = coordinate(bounds.south_bound_latitude.as_ref())?;
    let north = coordinate(bounds.north_bound_latitude.as_ref())?;
    Ok(match (west, east, south, north) {
        (Some(west), Some(east), Some(south), Some(north)) => Some(GeoBox {
            west,
            east,
            south,
            north,
        }),
        _ => None,
    })
}

/// Collect `polygonPoint` entries wherever they sit in the polygon value.
fn polygon_points(value: &Value, points: &mut Vec<GeoPoint>) -> std::result::Result<(), String> {
    match value {
        Value::Array(items) => {
            for item in items {
                polygon_points(item, points)?;
            }
        }
        Value::Object(map) => {
            if let Some(point) = map.get("polygonPoint") {
                let point: PointItem = serde_json::from_value(point.clone()).map_err(|e| e.to_string())?;
                if let Some(point) = registry_point(&point)? {
                    points.push(point);
                }
            } else if let Some(nested) = map.get("polygonPoints") {
                polygon_points(nested, points)?;
            }
        }
        _ => {}
    }
    Ok(())
}

fn registry_geo(items: &[GeoLocationItem]) -> std::result::Result<Vec<GeoLocation>, String> {
    let mut locations = Vec::with_capacity(items.len());
    for item in items {
        let mut polygon = Vec::new();
        if let Some(value) = &item.geo_location_polygon {
            polygon_points(value, &mut polygon)?;
        }
        let location = GeoLocation {
            geometry_type: None,
            place: item.geo_location_place.clone().filter(|p| !p.is_empty()),
            point: item.geo_location_point.as_ref().map(registry_point).transpose()?.flatten(),
            bounding_box: item.geo_location_box.as_ref().map(registry_box).transpose()?.flatten(),
            polygon,
        };
        if location != GeoLocation::default() {
            locations.push(location);
        }
    }
    Ok(locations)
}

/// Map an assembled repository record, synthesizing its XML.
pub fn from_repository(record: RepositoryRecord) -> Result<Metadata> {
    let xml = synthesize_datacite(&record)?;
    let row = &record.row;
    let details = &record.details;
    let mut metadata = Metadata::new(row.record_id.to_string());

    let pub_date = Some(row.pub_date.as_str()).filter(|d| !d.trim().is_empty());
    metadata.created_datetime = normalize_or_zero(pub_date);
    metadata.updated_datetime = metadata.created_datetime;

    metadata.titles = vec![row.title.clone()];
    metadata.creators = details.authors.clone();
    metadata.subjects = merged_subjects(&record);
    metadata.descriptions = descriptions(&record);
    metadata.publisher = details
        .publishers
        .first()
        .cloned()
        .unwrap_or_else(|| row.repository_name.clone());
    metadata.publication_year = match pub_date.map(parse_utc) {
        Some(Ok(parsed)) => parsed.year().to_string(),
        _ => publication_year(&row.pub_date),
    };
    if let Some(date) = pub_date {
        metadata.dates = vec![DateEntry {
            date_type: Some("Issued".to_string()),
            date: date.to_string(),
        }];
    }
    metadata.contributors = details.contributors.iter().map(Contributor::named).collect();
    metadata.resource_types = vec!["Dataset".to_string()];
    metadata.geo_locations = repository_geo(&details.geospatial).unwrap_or_else(|bad| {
        tracing::warn!(record_id = row.record_id, value = %bad, "Unparseable coordinate, dropping geo locations");
        Vec::new()
    });
    metadata.identifiers = vec![resolved_identifier(&record.resolved_url)];
    metadata.rights = details
        .rights
        .iter()
        .filter(|r| !r.is_empty())
        .map(|r| {
            let (statement, uri) = split_rights_statement(r);
            Rights {
                statement: Some(statement).filter(|s| !s.is_empty()),
                uri,
            }
        })
        .collect();
    metadata.client = row.homepage_url.clone();

    metadata.xml = Some(xml);
    metadata.active = metadata.has_xml();
    Ok(metadata)
}

/// The resolved URL as an identifier, typed `DOI` for resolver URLs.
fn resolved_identifier(url: &str) -> Identifier {
    if url.starts_with(DOI_RESOLVER_PREFIX) {
        Identifier::new("DOI", strip_uri_prefix(url))
    } else {
        Identifier::new("URL", url)
    }
}

fn parse_coordinate(raw: &str) -> std::result::Result<f64, String> {
    raw.trim().parse().map_err(|_| raw.to_string())
}

/// Point rows become one location each; polygon rows accumulate into one
/// polygon appended after them.
fn repository_geo(rows: &[GeoRow]) -> std::result::Result<Vec<GeoLocation>, String> {
    let mut locations = Vec::new();
    let mut polygon = Vec::new();

    for row in rows {
        let point = GeoPoint {
            latitude: parse_coordinate(&row.lat)?,
            longitude: parse_coordinate(&row.lon)?,
        };
        if row.is_polygon() {
            polygon.push(point);
        } else {
            locations.push(GeoLocation {
                geometry_type: Some(row.coordinate_type.clone()),
                point: Some(point),
                ..GeoLocation::default()
            });
        }
    }

    if !polygon.is_empty() {
        locations.push(GeoLocation {
            geometry_type: Some("Polygon".to_string()),
            polygon,
            ..GeoLocation::default()
        });
    }
    Ok(locations)
}
