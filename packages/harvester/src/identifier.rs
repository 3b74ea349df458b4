//! Canonical URL resolution for repository records.
//!
//! Repository records carry a native identifier in whatever shape the
//! upstream repository exposed over OAI-PMH: full URLs, `oai:` composites,
//! DOIs, or opaque local keys. [`resolve_local_url`] turns that into one
//! landing-page URL by walking [`RESOLUTION_RULES`] in order and returning the
//! first hit.

use std::sync::LazyLock;

use regex::Regex;

use crate::config::URL_PATTERN_PLACEHOLDER;

/// Prefix of DOI resolver URLs, stripped before storing identifiers.
pub const DOI_RESOLVER_PREFIX: &str = "https://doi.org/";

/// `oai:<authority>:<local-id>`; the authority is greedy so the local id is
/// everything after the last colon.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static OAI_IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"oai:(.+):(.+)").expect("valid regex"));

/// `doi:10.x/...` or `DOI: 10.x/...`.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static DOI_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(doi|DOI):\s?\S+").expect("valid regex"));

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static DOI_SCHEME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(doi|DOI):\s?").expect("valid regex"));

/// URL-shaped substring with an http, https or ftp scheme.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static EMBEDDED_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(http|ftp|https)://([\w_-]+(?:(?:\.[\w_-]+)+))([\w.,@?^=%&:/~+#-]*[\w@?^=%&/~+#-])?",
    )
    .expect("valid regex")
});

/// The fields of a raw record that take part in URL resolution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IdentifierInput<'a> {
    /// Native identifier as harvested from the upstream repository.
    pub local_identifier: &'a str,

    /// Repository item URL template, usually containing `%id%`.
    pub item_url_pattern: Option<&'a str>,

    /// Explicit landing page recorded for the item, if any.
    pub source_url: Option<&'a str>,
}

impl<'a> IdentifierInput<'a> {
    pub fn new(local_identifier: &'a str) -> Self {
        Self {
            local_identifier,
            ..Self::default()
        }
    }

    pub fn with_pattern(mut self, pattern: &'a str) -> Self {
        self.item_url_pattern = Some(pattern);
        self
    }

    pub fn with_source_url(mut self, source_url: &'a str) -> Self {
        self.source_url = Some(source_url);
        self
    }

    fn pattern(&self) -> Option<&'a str> {
        self.item_url_pattern.filter(|p| !p.is_empty())
    }
}

/// A single resolution step: returns a URL when it applies.
pub type ResolutionRule = fn(&IdentifierInput<'_>) -> Option<String>;

/// Resolution steps in priority order.
pub const RESOLUTION_RULES: &[(&str, ResolutionRule)] = &[
    ("already_url", already_url),
    ("oai_pattern", oai_pattern),
    ("raw_pattern", raw_pattern),
    ("doi_token", doi_token),
    ("source_url", source_url),
    ("embedded_url", embedded_url),
];

/// Resolve the canonical URL for a record, or `None` when nothing matches.
///
/// # Examples
/// ```
/// use metaharvest_harvester::identifier::{resolve_local_url, IdentifierInput};
///
/// let input = IdentifierInput::new("doi: 10.1/xyz.");
/// assert_eq!(resolve_local_url(&input).as_deref(), Some("https://doi.org/10.1/xyz"));
/// ```
pub fn resolve_local_url(input: &IdentifierInput<'_>) -> Option<String> {
    RESOLUTION_RULES.iter().find_map(|(name, rule)| {
        let url = rule(input)?;
        tracing::trace!(rule = name, identifier = input.local_identifier, url = %url, "Resolved identifier");
        Some(url)
    })
}

/// Identifiers that already contain a URL scheme are used as-is.
pub fn already_url(input: &IdentifierInput<'_>) -> Option<String> {
    input
        .local_identifier
        .to_lowercase()
        .contains("http")
        .then(|| input.local_identifier.to_string())
}

/// `oai:` identifiers put their local part into the item URL pattern.
pub fn oai_pattern(input: &IdentifierInput<'_>) -> Option<String> {
    let pattern = input
        .pattern()
        .filter(|p| p.contains(URL_PATTERN_PLACEHOLDER))?;
    let local_id = oai_local_id(input.local_identifier)?;
    Some(pattern.replace(URL_PATTERN_PLACEHOLDER, &local_id))
}

/// Any other identifier is substituted into the item URL pattern verbatim.
pub fn raw_pattern(input: &IdentifierInput<'_>) -> Option<String> {
    let pattern = input.pattern()?;
    Some(pattern.replace(URL_PATTERN_PLACEHOLDER, input.local_identifier))
}

/// `doi:` tokens are rewritten to resolver URLs.
pub fn doi_token(input: &IdentifierInput<'_>) -> Option<String> {
    let token = DOI_TOKEN.find(input.local_identifier)?.as_str();
    let token = token.trim_end_matches('.');
    Some(DOI_SCHEME.replace(token, DOI_RESOLVER_PREFIX).into_owned())
}

/// Fall back to the record's explicit landing page.
pub fn source_url(input: &IdentifierInput<'_>) -> Option<String> {
    input
        .source_url
        .filter(|url| !url.is_empty())
        .map(str::to_string)
}

/// Last resort: any URL-shaped substring of the identifier.
pub fn embedded_url(input: &IdentifierInput<'_>) -> Option<String> {
    EMBEDDED_URL
        .find(input.local_identifier)
        .map(|m| m.as_str().to_string())
}

/// Extract the local part of an `oai:<authority>:<local-id>` identifier.
///
/// Underscores are turned back into colons; repositories escape namespaced
/// ids that way.
///
/// # Examples
/// ```
/// use metaharvest_harvester::identifier::oai_local_id;
///
/// assert_eq!(oai_local_id("oai:example.org:hdl_123").as_deref(), Some("hdl:123"));
/// assert_eq!(oai_local_id("12345"), None);
/// ```
pub fn oai_local_id(identifier: &str) -> Option<String> {
    OAI_IDENTIFIER
        .captures(identifier)
        .and_then(|caps| caps.get(2))
        .map(|m| m.as_str().replace('_', ":"))
}

/// Strip the DOI resolver prefix so identifiers are stored as bare DOIs.
///
/// # Examples
/// ```
/// use metaharvest_harvester::identifier::strip_uri_prefix;
///
/// assert_eq!(strip_uri_prefix("https://doi.org/10.5072/abc"), "10.5072/abc");
/// assert_eq!(strip_uri_prefix("http://example.org/x"), "http://example.org/x");
/// assert_eq!(strip_uri_prefix(""), "");
/// ```
#[must_use]
pub fn strip_uri_prefix(identifier: &str) -> String {
    identifier
        .strip_prefix(DOI_RESOLVER_PREFIX)
        .unwrap_or(identifier)
        .to_string()
}
