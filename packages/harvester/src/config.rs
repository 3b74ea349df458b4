//! Configuration constants and explicit configuration values.
//!
//! Adapters receive their configuration through constructors; nothing here is
//! process-wide mutable state.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{HarvesterError, Result};

/// Default base URL for the DataCite REST API.
pub const DEFAULT_REGISTRY_API_URL: &str = "https://api.datacite.org";

/// Number of records requested per page from either backend.
pub const RESULT_SET_SIZE: usize = 50;

/// Page size used when listing registry clients and providers.
pub const SETS_PAGE_SIZE: usize = 1000;

/// HTTP timeout in seconds.
pub const HTTP_TIMEOUT_SECS: u64 = 30;

/// Default Postgres port.
pub const DEFAULT_DB_PORT: u16 = 5432;

/// DataCite kernel-4 namespace used for synthesized documents.
pub const DATACITE_NAMESPACE: &str = "http://datacite.org/schema/kernel-4";

/// XML Schema instance namespace.
pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Schema location declared on synthesized documents.
pub const DATACITE_SCHEMA_LOCATION: &str =
    "http://datacite.org/schema/kernel-4 http://schema.datacite.org/meta/kernel-4/metadata.xsd";

/// Hosting institution added as a contributor to every synthesized document.
pub const HOSTING_INSTITUTION: &str =
    "Federated Research Data Repository / dépôt fédéré de données de recherche";

/// Set that spans every repository instead of restricting to one.
pub const RESERVED_SET_SPEC: &str = "openaire_data";

/// Label of [`RESERVED_SET_SPEC`] in set listings.
pub const RESERVED_SET_NAME: &str = "OpenAIRE";

/// Placeholder substituted in repository item URL patterns.
pub const URL_PATTERN_PLACEHOLDER: &str = "%id%";

/// Connection settings for the metadata registry REST API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Base URL without trailing slash (e.g. `https://api.datacite.org`).
    pub api_url: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_REGISTRY_API_URL.to_string(),
            timeout_secs: HTTP_TIMEOUT_SECS,
        }
    }
}

impl RegistryConfig {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into().trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }
}

/// Connection settings for the repository database.
///
/// `Debug` is implemented by hand so the password never ends up in logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryConfig {
    pub host: String,
    #[serde(default = "default_db_port")]
    pub port: u16,
    pub dbname: String,
    pub user: String,
    #[serde(default)]
    pub password: String,
}

fn default_db_port() -> u16 {
    DEFAULT_DB_PORT
}

impl fmt::Debug for RepositoryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepositoryConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("dbname", &self.dbname)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl RepositoryConfig {
    /// Typed connection settings for the `postgres` client.
    #[must_use]
    pub fn pg_config(&self) -> postgres::Config {
        let mut config = postgres::Config::new();
        config
            .host(&self.host)
            .port(self.port)
            .dbname(&self.dbname)
            .user(&self.user)
            .password(&self.password);
        config
    }
}

/// Complete harvester configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarvesterConfig {
    /// Records per page, shared by both adapters.
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    #[serde(default)]
    pub registry: RegistryConfig,

    /// Repository database; absent when only the registry is harvested.
    #[serde(default)]
    pub repository: Option<RepositoryConfig>,
}

fn default_page_size() -> usize {
    RESULT_SET_SIZE
}

impl Default for HarvesterConfig {
    fn default() -> Self {
        Self {
            page_size: RESULT_SET_SIZE,
            registry: RegistryConfig::default(),
            repository: None,
        }
    }
}

impl HarvesterConfig {
    /// Load configuration from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Recognised variables: `REGISTRY_API_URL`, `RESULT_SET_SIZE`,
    /// `HTTP_TIMEOUT_SECS`, and `REPOSITORY_DB_{HOST,PORT,NAME,USER,PASSWORD}`.
    /// The repository section is only present when `REPOSITORY_DB_HOST` is set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("REGISTRY_API_URL") {
            config.registry.api_url = url.trim_end_matches('/').to_string();
        }
        if let Some(size) = lookup("RESULT_SET_SIZE") {
            config.page_size = size
                .parse()
                .map_err(|_| HarvesterError::Config(format!("RESULT_SET_SIZE '{size}' is not a number")))?;
        }
        if let Some(secs) = lookup("HTTP_TIMEOUT_SECS") {
            config.registry.timeout_secs = secs
                .parse()
                .map_err(|_| HarvesterError::Config(format!("HTTP_TIMEOUT_SECS '{secs}' is not a number")))?;
        }

        if let Some(host) = lookup("REPOSITORY_DB_HOST") {
            let port = match lookup("REPOSITORY_DB_PORT") {
                Some(port) => port.parse().map_err(|_| {
                    HarvesterError::Config(format!("REPOSITORY_DB_PORT '{port}' is not a port"))
                })?,
                None => DEFAULT_DB_PORT,
            };
            let dbname = lookup("REPOSITORY_DB_NAME")
                .ok_or_else(|| HarvesterError::Config("REPOSITORY_DB_NAME not set".into()))?;
            let user = lookup("REPOSITORY_DB_USER")
                .ok_or_else(|| HarvesterError::Config("REPOSITORY_DB_USER not set".into()))?;
            config.repository = Some(RepositoryConfig {
                host,
                port,
                dbname,
                user,
                password: lookup("REPOSITORY_DB_PASSWORD").unwrap_or_default(),
            });
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let mut config: Self = serde_yaml_ng::from_str(yaml)?;
        config.registry.api_url = config.registry.api_url.trim_end_matches('/').to_string();
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a YAML configuration file.
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    /// Check values that would make every request fail.
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(HarvesterError::Config("page size must be at least 1".into()));
        }
        if self.registry.api_url.trim().is_empty() {
            return Err(HarvesterError::Config("registry API URL is empty".into()));
        }
        Ok(())
    }
}
