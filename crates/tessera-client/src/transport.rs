use std::time::Duration;

use async_trait::async_trait;
use tessera_protocol::{Command, ResponseEnvelope};
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::executor::{CommandExecutor, CommandTarget};
use crate::timeout::TimeoutManager;

const DEFAULT_API_PATH: &str = "api/json/v1";

/// [`CommandExecutor`] that POSTs commands to a Data API endpoint.
///
/// The HTTP call itself is blocking (ureq) and runs on tokio's blocking
/// pool, so async callers can keep many commands in flight.
#[derive(Debug, Clone)]
pub struct HttpExecutor {
    endpoint: String,
    api_path: String,
    token: Option<String>,
}

impl HttpExecutor {
    pub fn new(endpoint: impl Into<String>, token: Option<String>) -> Self {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_path: DEFAULT_API_PATH.to_string(),
            token,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        if !(config.endpoint.starts_with("http://") || config.endpoint.starts_with("https://")) {
            return Err(ClientError::Config(format!(
                "endpoint must be an http(s) url, got {:?}",
                config.endpoint
            )));
        }
        Ok(Self::new(config.endpoint.clone(), config.token.clone()))
    }

    pub fn with_api_path(mut self, api_path: impl Into<String>) -> Self {
        self.api_path = api_path.into().trim_matches('/').to_string();
        self
    }

    pub fn url_for(&self, target: &CommandTarget) -> String {
        match &target.collection {
            Some(collection) => format!(
                "{}/{}/{}/{}",
                self.endpoint, self.api_path, target.keyspace, collection
            ),
            None => format!("{}/{}/{}", self.endpoint, self.api_path, target.keyspace),
        }
    }
}

#[async_trait]
impl CommandExecutor for HttpExecutor {
    async fn execute(
        &self,
        command: &Command,
        target: &CommandTarget,
        timeout: &TimeoutManager,
    ) -> Result<ResponseEnvelope, ClientError> {
        let granted = timeout.next_request_timeout()?;
        let url = self.url_for(target);
        let body = serde_json::to_vec(command)?;
        let token = self.token.clone();

        debug!(
            command = command.name(),
            keyspace = %target.keyspace,
            collection = ?target.collection,
            timeout_ms = granted.as_millis() as u64,
            "dispatching command"
        );

        let sent = tokio::task::spawn_blocking(move || {
            post_json(&url, token.as_deref(), granted, &body)
        })
        .await
        .map_err(|e| ClientError::Transport(format!("request task failed: {e}")))?;

        let (status, text) = match sent {
            Ok(r) => r,
            Err(ureq::Error::Timeout(_)) => return Err(timeout.timeout_error(granted)),
            Err(e) => return Err(ClientError::Transport(e.to_string())),
        };

        if !status.is_success() {
            warn!(command = command.name(), status = %status, "data api returned an http error");
            return Err(ClientError::Http { status, body: text });
        }

        let envelope: ResponseEnvelope = serde_json::from_str(&text)?;
        if envelope.has_errors() {
            debug!(
                command = command.name(),
                errors = envelope.errors.len(),
                "command reported errors"
            );
        }
        Ok(envelope)
    }
}

fn post_json(
    url: &str,
    token: Option<&str>,
    timeout: Duration,
    body: &[u8],
) -> Result<(http::StatusCode, String), ureq::Error> {
    let config = ureq::Agent::config_builder()
        .timeout_global(Some(timeout))
        .http_status_as_error(false)
        .build();
    let agent = ureq::Agent::new_with_config(config);

    let mut request = agent.post(url).header("Content-Type", "application/json");
    if let Some(token) = token {
        request = request.header("Token", token);
    }

    let mut response = request.send(body)?;
    let status = response.status();
    let text = response.body_mut().read_to_string()?;
    Ok((status, text))
}
