//! Runtime configuration: metadata store endpoint, credentials, and the
//! source/schema scope every command is issued under.
//!
//! Settings come from an optional TOML file; `HASURA_GRAPHQL_ENDPOINT` and
//! `HASURA_GRAPHQL_ADMIN_SECRET` override the file when set.

use crate::error::{HasuraSyncError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

pub const ENDPOINT_ENV: &str = "HASURA_GRAPHQL_ENDPOINT";
pub const ADMIN_SECRET_ENV: &str = "HASURA_GRAPHQL_ADMIN_SECRET";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Base URL of the metadata store, without the /v1/metadata path.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Admin secret sent with every request, when required by the store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_secret: Option<String>,

    /// Name of the data source the commands target.
    #[serde(default = "default_source")]
    pub source: String,

    /// Database schema the tables live in.
    #[serde(default = "default_schema")]
    pub schema: String,

    /// Per-request timeout for batch submissions.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_endpoint() -> String {
    "http://localhost:8080".to_string()
}

fn default_source() -> String {
    "default".to_string()
}

fn default_schema() -> String {
    "public".to_string()
}

fn default_timeout_secs() -> u64 {
    600
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            admin_secret: None,
            source: default_source(),
            schema: default_schema(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl RuntimeConfig {
    /// Loads configuration from a TOML file when given, then applies
    /// environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let data = fs::read_to_string(path)?;
                toml::from_str(&data).map_err(|e| {
                    HasuraSyncError::Config(format!("{}: {}", path.display(), e))
                })?
            }
            None => Self::default(),
        };

        config.apply_env_overrides();
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) {
        if let Ok(endpoint) = env::var(ENDPOINT_ENV) {
            if !endpoint.is_empty() {
                self.endpoint = endpoint;
            }
        }
        if let Ok(secret) = env::var(ADMIN_SECRET_ENV) {
            if !secret.is_empty() {
                self.admin_secret = Some(secret);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = RuntimeConfig::default();
        assert_eq!(config.endpoint, "http://localhost:8080");
        assert_eq!(config.source, "default");
        assert_eq!(config.schema, "public");
        assert!(config.admin_secret.is_none());
    }

    #[test]
    fn test_load_from_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "endpoint = \"http://hasura.internal:8080\"\nschema = \"app\"\ntimeout_secs = 30"
        )
        .unwrap();

        let config = RuntimeConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.endpoint, "http://hasura.internal:8080");
        assert_eq!(config.schema, "app");
        assert_eq!(config.timeout_secs, 30);
        // unspecified keys fall back to defaults
        assert_eq!(config.source, "default");
    }

    #[test]
    fn test_load_missing_file_is_error() {
        assert!(RuntimeConfig::load(Some(Path::new("/nonexistent/sync.toml"))).is_err());
    }
}
