//! Transport to the remote metadata store.
//!
//! Commands travel in `bulk` envelopes to the store's `/v1/metadata`
//! endpoint. The transport is behind a trait so the runtime can be exercised
//! against a recording client in tests.

use crate::config::RuntimeConfig;
use crate::error::Result;
use crate::metadata::commands::MetadataCommand;
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

const METADATA_PATH: &str = "/v1/metadata";
const ADMIN_SECRET_HEADER: &str = "x-hasura-admin-secret";

/// Status and body of one bulk submission.
#[derive(Debug, Clone)]
pub struct BulkOutcome {
    pub status: u16,
    pub body: String,
}

impl BulkOutcome {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Submits command batches to a metadata store.
#[async_trait]
pub trait MetadataClient: Send + Sync {
    async fn submit_batch(&self, commands: &[MetadataCommand]) -> Result<BulkOutcome>;
}

#[async_trait]
impl<C: MetadataClient + ?Sized> MetadataClient for std::sync::Arc<C> {
    async fn submit_batch(&self, commands: &[MetadataCommand]) -> Result<BulkOutcome> {
        (**self).submit_batch(commands).await
    }
}

#[derive(Debug, Serialize)]
struct BulkEnvelope<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    args: &'a [MetadataCommand],
}

/// HTTP client for a live metadata store.
pub struct HasuraClient {
    http: reqwest::Client,
    endpoint: String,
    admin_secret: Option<String>,
}

impl HasuraClient {
    pub fn new(config: &RuntimeConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("hasura-sync/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            endpoint: format!("{}{}", config.endpoint.trim_end_matches('/'), METADATA_PATH),
            admin_secret: config.admin_secret.clone(),
        })
    }
}

#[async_trait]
impl MetadataClient for HasuraClient {
    async fn submit_batch(&self, commands: &[MetadataCommand]) -> Result<BulkOutcome> {
        let envelope = BulkEnvelope {
            kind: "bulk",
            args: commands,
        };

        let mut request = self.http.post(&self.endpoint).json(&envelope);
        if let Some(secret) = &self.admin_secret {
            request = request.header(ADMIN_SECRET_HEADER, secret);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(BulkOutcome { status, body })
    }
}

#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::sync::Mutex;

    /// Records every submitted batch and answers with a fixed status.
    pub struct MockMetadataClient {
        batches: Mutex<Vec<Vec<MetadataCommand>>>,
        status: u16,
    }

    impl MockMetadataClient {
        pub fn new() -> Self {
            Self::with_status(200)
        }

        pub fn with_status(status: u16) -> Self {
            Self {
                batches: Mutex::new(Vec::new()),
                status,
            }
        }

        pub fn batches(&self) -> Vec<Vec<MetadataCommand>> {
            self.batches.lock().unwrap().clone()
        }
    }

    impl Default for MockMetadataClient {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl MetadataClient for MockMetadataClient {
        async fn submit_batch(&self, commands: &[MetadataCommand]) -> Result<BulkOutcome> {
            self.batches.lock().unwrap().push(commands.to_vec());
            Ok(BulkOutcome {
                status: self.status,
                body: if self.status < 300 {
                    r#"[{"message":"success"}]"#.to_string()
                } else {
                    r#"{"error":"mock rejection"}"#.to_string()
                },
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::commands::{ClearMetadataArgs, MetadataCommand};
    use serde_json::json;

    #[test]
    fn test_bulk_envelope_wire_shape() {
        let commands = vec![MetadataCommand::ClearMetadata(ClearMetadataArgs::default())];
        let envelope = BulkEnvelope {
            kind: "bulk",
            args: &commands,
        };

        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({
                "type": "bulk",
                "args": [{"type": "clear_metadata", "args": {}}]
            })
        );
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let config = RuntimeConfig {
            endpoint: "http://localhost:8080/".to_string(),
            ..Default::default()
        };
        let client = HasuraClient::new(&config).unwrap();
        assert_eq!(client.endpoint, "http://localhost:8080/v1/metadata");
    }

    #[test]
    fn test_outcome_success_range() {
        let ok = BulkOutcome {
            status: 200,
            body: String::new(),
        };
        let rejected = BulkOutcome {
            status: 400,
            body: String::new(),
        };
        assert!(ok.is_success());
        assert!(!rejected.is_success());
    }
}
