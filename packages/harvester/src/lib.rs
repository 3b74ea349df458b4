//! Metaharvest Harvester - normalize research metadata from heterogeneous backends.
//!
//! This crate pages through two kinds of backend, a DataCite-style registry
//! REST API and a relational research-data repository, and maps their records
//! into one canonical [`Metadata`] shape for an OAI-PMH front end.
//!
//! # Example
//!
//! ```
//! use metaharvest_harvester::identifier::strip_uri_prefix;
//! use metaharvest_harvester::text::merge_unique;
//!
//! assert_eq!(strip_uri_prefix("https://doi.org/10.5072/abc"), "10.5072/abc");
//! assert_eq!(
//!     merge_unique([vec!["a".to_string(), "b".to_string()], vec!["b".to_string(), "c".to_string()]]),
//!     ["a", "b", "c"]
//! );
//! ```
//!
//! # Architecture
//!
//! The harvester is organized into several modules:
//!
//! - [`config`]: Configuration constants and explicit configuration values
//! - [`types`]: Canonical metadata, filters and pages
//! - [`error`]: Error types and Result alias
//! - [`http`]: HTTP client for the registry API
//! - [`cursor`]: Typed pagination cursors per backend
//! - [`temporal`]: Timestamp normalization to naive UTC
//! - [`identifier`]: Canonical URL resolution rule chain
//! - [`text`]: Term merging and rights splitting
//! - [`xml`]: DataCite document synthesis
//! - [`source`]: Registry and repository adapters
//! - [`builder`]: Raw record to canonical metadata mapping
//! - [`harvester`]: Main harvester service
//! - [`cli`]: Command-line interface

pub mod builder;
pub mod cli;
pub mod config;
pub mod cursor;
pub mod error;
pub mod harvester;
pub mod http;
pub mod identifier;
pub mod source;
pub mod temporal;
pub mod text;
pub mod types;
pub mod xml;

// Re-export main service
pub use harvester::Harvester;

// Re-export commonly used items
pub use config::{HarvesterConfig, RegistryConfig, RepositoryConfig};
pub use cursor::{PageCursor, RegistryCursor, RepositoryCursor};
pub use error::{HarvesterError, Result};
pub use source::{RawRecord, RegistryAdapter, RepositoryAdapter, SourceAdapter};
pub use types::{Metadata, RecordFilter, RecordPage, SetInfo};
