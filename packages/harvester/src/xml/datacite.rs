//! DataCite kernel-4 documents for repository records.
//!
//! Repository records carry no descriptive XML of their own, so one is built
//! from the joined row and its side lookups. Element order follows the
//! kernel-4 schema; `rightsList` and `descriptions` are left out when empty.

use crate::config::{
    DATACITE_NAMESPACE, DATACITE_SCHEMA_LOCATION, HOSTING_INSTITUTION, URL_PATTERN_PLACEHOLDER,
    XSI_NAMESPACE,
};
use crate::error::Result;
use crate::source::RepositoryRecord;
use crate::text::{merge_unique, publication_year, split_rights_statement};

use super::XmlBuilder;

/// Value of the `identifier` element.
///
/// The record's own source URL wins; failing that the item URL pattern is
/// filled with the raw local identifier, and failing that the resolved URL
/// is used.
#[must_use]
pub fn identifier_url(record: &RepositoryRecord) -> String {
    let row = &record.row;
    if !row.source_url.is_empty() {
        return row.source_url.clone();
    }
    if row.item_url_pattern.contains(URL_PATTERN_PLACEHOLDER) && !row.local_identifier.is_empty() {
        return row
            .item_url_pattern
            .replace(URL_PATTERN_PLACEHOLDER, &row.local_identifier);
    }
    record.resolved_url.clone()
}

/// Subjects merged with English and French tags.
#[must_use]
pub fn merged_subjects(record: &RepositoryRecord) -> Vec<String> {
    let details = &record.details;
    merge_unique([
        details.subjects.clone(),
        details.tags_en.clone(),
        details.tags_fr.clone(),
    ])
}

/// Rights statements followed by access levels, split into text and URI.
#[must_use]
pub fn rights_entries(record: &RepositoryRecord) -> Vec<(String, Option<String>)> {
    let details = &record.details;
    details
        .rights
        .iter()
        .chain(&details.access)
        .filter(|entry| !entry.is_empty())
        .map(|entry| split_rights_statement(entry))
        .collect()
}

/// English then French descriptions, empties removed.
#[must_use]
pub fn descriptions(record: &RepositoryRecord) -> Vec<String> {
    let details = &record.details;
    details
        .descriptions_en
        .iter()
        .chain(&details.descriptions_fr)
        .filter(|d| !d.is_empty())
        .cloned()
        .collect()
}

/// Build the DataCite document for a repository record.
///
/// Pure: no I/O, and identical input yields identical bytes.
pub fn synthesize_datacite(record: &RepositoryRecord) -> Result<Vec<u8>> {
    let row = &record.row;
    let details = &record.details;
    let mut xml = XmlBuilder::new();

    xml.start(
        "resource",
        &[
            ("xmlns", DATACITE_NAMESPACE),
            ("xmlns:xsi", XSI_NAMESPACE),
            ("xsi:schemaLocation", DATACITE_SCHEMA_LOCATION),
        ],
    )?;

    xml.text_element("identifier", &[("identifierType", "URL")], &identifier_url(record))?;

    xml.start("creators", &[])?;
    for author in &details.authors {
        xml.start("creator", &[])?;
        xml.text_element("creatorName", &[], author)?;
        for affiliation in &details.affiliations {
            xml.text_element("affiliation", &[], affiliation)?;
        }
        xml.end("creator")?;
    }
    xml.end("creators")?;

    xml.start("titles", &[])?;
    xml.text_element("title", &[], &row.title)?;
    xml.end("titles")?;

    xml.text_element("publisher", &[], &row.repository_name)?;
    xml.text_element("publicationyear", &[], &publication_year(&row.pub_date))?;

    xml.start("subjects", &[])?;
    for subject in merged_subjects(record) {
        xml.text_element("subject", &[], &subject)?;
    }
    xml.end("subjects")?;

    xml.start("contributors", &[])?;
    contributor(&mut xml, "HostingInstitution", HOSTING_INSTITUTION)?;
    for name in &details.contributors {
        contributor(&mut xml, "Other", name)?;
    }
    xml.end("contributors")?;

    xml.start("dates", &[])?;
    xml.text_element("date", &[("dateType", "Issued")], &row.pub_date)?;
    xml.end("dates")?;

    xml.text_element("resourceType", &[("resourceTypeGeneral", "Dataset")], "Dataset")?;

    xml.start("alternateIdentifiers", &[])?;
    xml.text_element(
        "alternateIdentifier",
        &[("alternateIdentifierType", "local")],
        &row.local_identifier,
    )?;
    xml.end("alternateIdentifiers")?;

    if !row.series.is_empty() {
        xml.start("relatedIdentifiers", &[])?;
        xml.text_element("relatedIdentifier", &[("relationType", "isPartOf")], &row.series)?;
        xml.end("relatedIdentifiers")?;
    }

    xml.optional_list("rightsList", &rights_entries(record), |xml, (text, uri)| match uri {
        Some(uri) => xml.text_element("rights", &[("rightsURI", uri.as_str())], text),
        None => xml.text_element("rights", &[], text),
    })?;

    xml.optional_list("descriptions", &descriptions(record), |xml, description| {
        xml.text_element("description", &[("descriptionType", "Abstract")], description)
    })?;

    xml.end("resource")?;
    Ok(xml.finish())
}

fn contributor(xml: &mut XmlBuilder, contributor_type: &str, name: &str) -> Result<()> {
    xml.start("contributor", &[("contributorType", contributor_type)])?;
    xml.text_element("contributorName", &[], name)?;
    xml.end("contributor")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::repository::{RecordDetails, RecordRow};
    use pretty_assertions::assert_eq;

    fn record() -> RepositoryRecord {
        RepositoryRecord {
            row: RecordRow {
                record_id: 7,
                title: "Lake sediment cores".to_string(),
                pub_date: "2019-05-03".to_string(),
                local_identifier: "4321".to_string(),
                repository_name: "Example Dataverse".to_string(),
                item_url_pattern: "https://data.example.org/item/%id%".to_string(),
                homepage_url: "https://data.example.org".to_string(),
                ..RecordRow::default()
            },
            resolved_url: "https://data.example.org/item/4321".to_string(),
            details: RecordDetails::default(),
        }
    }

    #[test]
    fn test_identifier_prefers_source_url() {
        let mut record = record();
        assert_eq!(identifier_url(&record), "https://data.example.org/item/4321");

        record.row.source_url = "https://landing.example.org/x".to_string();
        assert_eq!(identifier_url(&record), "https://landing.example.org/x");
    }

    #[test]
    fn test_identifier_falls_back_to_resolved_url() {
        let mut record = record();
        record.row.item_url_pattern = String::new();
        record.resolved_url = "https://doi.org/10.1/xyz".to_string();
        assert_eq!(identifier_url(&record), "https://doi.org/10.1/xyz");
    }

    #[test]
    fn test_rights_entries_split_and_skip_empty() {
        let mut record = record();
        record.details.rights = vec![
            "CC-BY http://creativecommons.org/licenses/by/4.0".to_string(),
            String::new(),
        ];
        record.details.access = vec!["Public".to_string()];

        assert_eq!(
            rights_entries(&record),
            vec![
                (
                    "CC-BY".to_string(),
                    Some("http://creativecommons.org/licenses/by/4.0".to_string())
                ),
                ("Public".to_string(), None),
            ]
        );
    }

    #[test]
    fn test_minimal_document_omits_optional_lists() {
        let out = String::from_utf8(synthesize_datacite(&record()).unwrap()).unwrap();
        assert!(out.starts_with("<resource xmlns=\"http://datacite.org/schema/kernel-4\""));
        assert!(!out.contains("<rightsList>"));
        assert!(!out.contains("<descriptions>"));
        assert!(!out.contains("<relatedIdentifiers>"));
        assert!(out.contains("<publicationyear>2019</publicationyear>"));
        assert!(out.contains(r#"<alternateIdentifier alternateIdentifierType="local">4321</alternateIdentifier>"#));
    }

    #[test]
    fn test_synthesis_is_deterministic() {
        let record = record();
        assert_eq!(
            synthesize_datacite(&record).unwrap(),
            synthesize_datacite(&record).unwrap()
        );
    }
}
