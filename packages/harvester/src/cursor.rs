//! Pagination cursors.
//!
//! Each adapter has its own cursor type, so a registry token can never be
//! handed to the repository adapter or the other way round. Both render to
//! and parse from strings so the front end can embed them in resumption
//! tokens.

use std::fmt;
use std::str::FromStr;

use crate::error::HarvesterError;

/// Behaviour shared by adapter cursors.
pub trait PageCursor: Clone + fmt::Debug + fmt::Display + FromStr<Err = HarvesterError> {
    /// Cursor requesting the first page.
    fn start() -> Self;

    /// Cursor signalling that no pages remain.
    fn exhausted() -> Self;

    fn is_exhausted(&self) -> bool;
}

/// Registry cursor: an opaque token from the `links.next` URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RegistryCursor {
    /// Begin cursor navigation.
    Start,
    /// Token issued by the registry for the following page.
    Next(String),
    Exhausted,
}

impl RegistryCursor {
    /// Value sent as `page[cursor]`, or `None` once exhausted.
    #[must_use]
    pub fn as_query_value(&self) -> Option<&str> {
        match self {
            Self::Start => Some("1"),
            Self::Next(token) => Some(token),
            Self::Exhausted => None,
        }
    }
}

impl PageCursor for RegistryCursor {
    fn start() -> Self {
        Self::Start
    }

    fn exhausted() -> Self {
        Self::Exhausted
    }

    fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted)
    }
}

impl fmt::Display for RegistryCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => f.write_str("1"),
            Self::Next(token) => f.write_str(token),
            Self::Exhausted => f.write_str("0"),
        }
    }
}

impl FromStr for RegistryCursor {
    type Err = HarvesterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "1" => Ok(Self::Start),
            "0" => Ok(Self::Exhausted),
            token if token.chars().any(char::is_whitespace) => {
                Err(HarvesterError::InvalidCursor(s.to_string()))
            }
            token => Ok(Self::Next(token.to_string())),
        }
    }
}

/// Repository cursor: a row offset into the ordered result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepositoryCursor {
    Offset(u64),
    Exhausted,
}

impl RepositoryCursor {
    #[must_use]
    pub fn offset(&self) -> Option<u64> {
        match self {
            Self::Offset(offset) => Some(*offset),
            Self::Exhausted => None,
        }
    }
}

impl PageCursor for RepositoryCursor {
    fn start() -> Self {
        Self::Offset(0)
    }

    fn exhausted() -> Self {
        Self::Exhausted
    }

    fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted)
    }
}

impl fmt::Display for RepositoryCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Offset(offset) => write!(f, "{offset}"),
            Self::Exhausted => f.write_str("-1"),
        }
    }
}

impl FromStr for RepositoryCursor {
    type Err = HarvesterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" => Ok(Self::Offset(0)),
            "-1" => Ok(Self::Exhausted),
            offset => offset
                .parse()
                .map(Self::Offset)
                .map_err(|_| HarvesterError::InvalidCursor(s.to_string())),
        }
    }
}
