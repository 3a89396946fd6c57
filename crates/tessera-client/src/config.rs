use std::env;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ClientError;
use crate::timeout::TimeoutDefaults;

/// Defaults for chunked and fanned-out bulk operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkDefaults {
    /// Documents per `insertMany` request.
    pub chunk_size: usize,
    /// Requests kept in flight by unordered bulk operations.
    pub concurrency: usize,
}

impl Default for BulkDefaults {
    fn default() -> Self {
        Self {
            chunk_size: 50,
            concurrency: 8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub endpoint: String,
    pub token: Option<String>,
    pub keyspace: String,
    pub request_timeout_ms: u64,
    pub general_method_timeout_ms: u64,
    pub chunk_size: usize,
    pub concurrency: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        let timeouts = TimeoutDefaults::default();
        let bulk = BulkDefaults::default();
        Self {
            endpoint: String::new(),
            token: None,
            keyspace: "default_keyspace".into(),
            request_timeout_ms: timeouts.request_timeout.as_millis() as u64,
            general_method_timeout_ms: timeouts.general_method_timeout.as_millis() as u64,
            chunk_size: bulk.chunk_size,
            concurrency: bulk.concurrency,
        }
    }
}

impl ClientConfig {
    /// Load from `TESSERA_*` environment variables.
    ///
    /// `TESSERA_ENDPOINT` is required; everything else falls back to
    /// [`ClientConfig::default`].
    pub fn from_env() -> Result<Self, ClientError> {
        let defaults = Self::default();
        let endpoint = env::var("TESSERA_ENDPOINT")
            .map_err(|_| ClientError::Config("TESSERA_ENDPOINT must be set".into()))?;

        let config = Self {
            endpoint,
            token: env::var("TESSERA_TOKEN").ok(),
            keyspace: env::var("TESSERA_KEYSPACE").unwrap_or(defaults.keyspace),
            request_timeout_ms: parse_var("TESSERA_REQUEST_TIMEOUT_MS")?
                .unwrap_or(defaults.request_timeout_ms),
            general_method_timeout_ms: parse_var("TESSERA_GENERAL_TIMEOUT_MS")?
                .unwrap_or(defaults.general_method_timeout_ms),
            chunk_size: parse_var("TESSERA_CHUNK_SIZE")?.unwrap_or(defaults.chunk_size),
            concurrency: parse_var("TESSERA_CONCURRENCY")?.unwrap_or(defaults.concurrency),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ClientError> {
        if self.keyspace.is_empty() {
            return Err(ClientError::Config("keyspace must not be empty".into()));
        }
        if self.chunk_size == 0 {
            return Err(ClientError::Config("chunk_size must be at least 1".into()));
        }
        if self.concurrency == 0 {
            return Err(ClientError::Config("concurrency must be at least 1".into()));
        }
        Ok(())
    }

    pub fn timeouts(&self) -> TimeoutDefaults {
        TimeoutDefaults {
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            general_method_timeout: Duration::from_millis(self.general_method_timeout_ms),
        }
    }

    pub fn bulk(&self) -> BulkDefaults {
        BulkDefaults {
            chunk_size: self.chunk_size,
            concurrency: self.concurrency,
        }
    }
}

fn parse_var<T: FromStr>(name: &str) -> Result<Option<T>, ClientError> {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| ClientError::Config(format!("{name} is not a valid value: {raw:?}"))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config: ClientConfig = serde_json::from_str(
            r#"{ "endpoint": "https://db.example.com", "keyspace": "app", "chunk_size": 20 }"#,
        )
        .unwrap();
        assert_eq!(config.keyspace, "app");
        assert_eq!(config.bulk().chunk_size, 20);
        assert_eq!(config.bulk().concurrency, 8);
        assert_eq!(config.timeouts(), TimeoutDefaults::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_chunk_size_is_invalid() {
        let config = ClientConfig {
            chunk_size: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ClientError::Config(_))));
    }
}
