//! Small string helpers shared by the record builder and XML synthesizer.

/// Merge several term lists into one, dropping repeats and keeping the
/// first-seen order.
///
/// # Examples
/// ```
/// use metaharvest_harvester::text::merge_unique;
///
/// let merged = merge_unique([vec!["a".to_string(), "b".to_string()], vec!["b".to_string(), "c".to_string()]]);
/// assert_eq!(merged, ["a", "b", "c"]);
/// ```
pub fn merge_unique<I, L>(lists: I) -> Vec<String>
where
    I: IntoIterator<Item = L>,
    L: IntoIterator<Item = String>,
{
    let mut merged: Vec<String> = Vec::new();
    for term in lists.into_iter().flatten() {
        if !merged.contains(&term) {
            merged.push(term);
        }
    }
    merged
}

/// Split a rights statement into its text and an embedded licence URI.
///
/// Everything from the first `http` onward is the URI; what precedes it,
/// trimmed, is the statement text.
///
/// # Examples
/// ```
/// use metaharvest_harvester::text::split_rights_statement;
///
/// assert_eq!(
///     split_rights_statement("CC-BY http://creativecommons.org/licenses/by/4.0"),
///     ("CC-BY".to_string(), Some("http://creativecommons.org/licenses/by/4.0".to_string()))
/// );
/// assert_eq!(split_rights_statement("Public"), ("Public".to_string(), None));
/// ```
#[must_use]
pub fn split_rights_statement(statement: &str) -> (String, Option<String>) {
    match statement.find("http") {
        Some(idx) => (
            statement[..idx].trim().to_string(),
            Some(statement[idx..].trim().to_string()),
        ),
        None => (statement.to_string(), None),
    }
}

/// The first four characters of a publication date.
#[must_use]
pub fn publication_year(pub_date: &str) -> String {
    pub_date.chars().take(4).collect()
}
