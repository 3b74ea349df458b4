//! JSON:API shapes returned by the registry REST API.
//!
//! Every attribute is optional and `null`-tolerant: the registry omits or
//! nulls fields freely and a missing field must never fail a page.

use serde::Deserialize;
use serde_json::Value;

/// `GET /dois` response.
#[derive(Debug, Deserialize)]
pub(crate) struct ListResponse {
    /// Kept as raw values so one malformed record can be skipped on its own.
    #[serde(default)]
    pub data: Vec<Value>,
    #[serde(default)]
    pub meta: ListMeta,
    #[serde(default)]
    pub links: Links,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListMeta {
    pub total: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Links {
    pub next: Option<String>,
}

/// `GET /dois/{id}` response.
#[derive(Debug, Deserialize)]
pub(crate) struct SingleResponse {
    pub data: RegistryRecord,
}

/// `GET /clients` response; providers arrive in `included`.
#[derive(Debug, Deserialize)]
pub(crate) struct ClientsResponse {
    #[serde(default)]
    pub data: Vec<NamedResource>,
    #[serde(default)]
    pub included: Vec<NamedResource>,
    #[serde(default)]
    pub meta: ListMeta,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NamedResource {
    pub id: String,
    #[serde(default)]
    pub attributes: NamedAttributes,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct NamedAttributes {
    pub name: Option<String>,
}

/// A DOI resource as returned by the registry.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryRecord {
    pub id: String,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub attributes: DoiAttributes,
    #[serde(default)]
    pub relationships: Option<Relationships>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DoiAttributes {
    pub created: Option<String>,
    pub updated: Option<String>,
    /// Base64-encoded DataCite XML.
    pub xml: Option<String>,
    pub is_active: Option<bool>,
    pub titles: Option<Vec<TitleItem>>,
    pub creators: Option<Vec<CreatorItem>>,
    pub subjects: Option<Vec<SubjectItem>>,
    pub descriptions: Option<Vec<DescriptionItem>>,
    pub publisher: Option<PublisherField>,
    pub publication_year: Option<Value>,
    pub dates: Option<Vec<DateItem>>,
    pub contributors: Option<Vec<ContributorItem>>,
    pub funding_references: Option<Vec<FundingItem>>,
    pub sizes: Option<Vec<Option<String>>>,
    pub geo_locations: Option<Vec<GeoLocationItem>>,
    pub types: Option<TypesItem>,
    pub formats: Option<Vec<Option<String>>>,
    pub identifiers: Option<Vec<IdentifierItem>>,
    pub language: Option<String>,
    pub related_identifiers: Option<Vec<RelatedIdentifierItem>>,
    pub rights_list: Option<Vec<RightsItem>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TitleItem {
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CreatorItem {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SubjectItem {
    pub subject: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DescriptionItem {
    pub description: Option<String>,
}

/// Publisher is a plain string in kernel-4.4 and an object from 4.5 on.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PublisherField {
    Name(String),
    Object { name: Option<String> },
}

impl PublisherField {
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Name(name) => Some(name),
            Self::Object { name } => name.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DateItem {
    pub date: Option<String>,
    pub date_type: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContributorItem {
    pub name: Option<String>,
    pub contributor_type: Option<String>,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub affiliation: Option<Vec<AffiliationField>>,
}

/// Affiliations are strings in older payloads and objects in newer ones.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AffiliationField {
    Name(String),
    Object { name: Option<String> },
}

impl AffiliationField {
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Name(name) => Some(name),
            Self::Object { name } => name.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FundingItem {
    pub funder_name: Option<String>,
    pub funder_identifier: Option<String>,
    pub funder_identifier_type: Option<String>,
    pub award_number: Option<String>,
    pub award_title: Option<String>,
}

/// Coordinates come back as numbers or numeric strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Coordinate {
    Number(f64),
    Text(String),
}

impl Coordinate {
    #[must_use]
    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PointItem {
    pub point_latitude: Option<Coordinate>,
    pub point_longitude: Option<Coordinate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BoxItem {
    pub west_bound_longitude: Option<Coordinate>,
    pub east_bound_longitude: Option<Coordinate>,
    pub south_bound_latitude: Option<Coordinate>,
    pub north_bound_latitude: Option<Coordinate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeoLocationItem {
    pub geo_location_place: Option<String>,
    pub geo_location_point: Option<PointItem>,
    pub geo_location_box: Option<BoxItem>,
    /// Shape varies between payload versions; walked by hand.
    pub geo_location_polygon: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TypesItem {
    pub resource_type_general: Option<String>,
    pub resource_type: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IdentifierItem {
    pub identifier: Option<String>,
    pub identifier_type: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RelatedIdentifierItem {
    pub related_identifier: Option<String>,
    pub related_identifier_type: Option<String>,
    pub relation_type: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RightsItem {
    pub rights: Option<String>,
    pub rights_uri: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Relationships {
    pub client: Option<RelationshipLink>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RelationshipLink {
    pub data: Option<ResourceRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResourceRef {
    pub id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_tolerates_nulls() {
        let record: RegistryRecord = serde_json::from_value(json!({
            "id": "10.5072/abc",
            "attributes": {
                "titles": null,
                "creators": null,
                "xml": null,
                "publicationYear": 2019,
                "types": {"resourceTypeGeneral": "Dataset"}
            },
            "relationships": {"client": {"data": null}}
        }))
        .unwrap();

        assert!(record.attributes.titles.is_none());
        assert!(record.attributes.xml.is_none());
        assert_eq!(record.attributes.publication_year, Some(json!(2019)));
        assert!(record.relationships.unwrap().client.unwrap().data.is_none());
    }

    #[test]
    fn test_record_without_attributes() {
        let record: RegistryRecord = serde_json::from_value(json!({"id": "10.5072/x"})).unwrap();
        assert!(record.attributes.identifiers.is_none());
        assert!(record.is_active.is_none());
    }

    #[test]
    fn test_publisher_field_shapes() {
        let plain: PublisherField = serde_json::from_value(json!("Zenodo")).unwrap();
        assert_eq!(plain.name(), Some("Zenodo"));

        let object: PublisherField = serde_json::from_value(json!({"name": "Dryad"})).unwrap();
        assert_eq!(object.name(), Some("Dryad"));
    }

    #[test]
    fn test_coordinate_shapes() {
        let number: Coordinate = serde_json::from_value(json!(45.5)).unwrap();
        let text: Coordinate = serde_json::from_value(json!(" -73.6 ")).unwrap();
        let junk: Coordinate = serde_json::from_value(json!("north")).unwrap();
        assert_eq!(number.value(), Some(45.5));
        assert_eq!(text.value(), Some(-73.6));
        assert_eq!(junk.value(), None);
    }
}
