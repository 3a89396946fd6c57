use async_trait::async_trait;
use tessera_protocol::{Command, ResponseEnvelope};

use crate::error::ClientError;
use crate::timeout::TimeoutManager;

/// Where a command is sent: a keyspace, and optionally a collection in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTarget {
    pub keyspace: String,
    pub collection: Option<String>,
}

impl CommandTarget {
    pub fn keyspace(keyspace: impl Into<String>) -> Self {
        Self {
            keyspace: keyspace.into(),
            collection: None,
        }
    }

    pub fn collection(keyspace: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            keyspace: keyspace.into(),
            collection: Some(collection.into()),
        }
    }
}

/// Sends one command and returns the decoded response envelope.
///
/// Implementations must take the request timeout from `timeout` right
/// before dispatch. Transport failures, non-2XX statuses and timeouts are
/// returned as `Err`; application errors stay inside the envelope.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    async fn execute(
        &self,
        command: &Command,
        target: &CommandTarget,
        timeout: &TimeoutManager,
    ) -> Result<ResponseEnvelope, ClientError>;
}
