use std::fmt;
use std::sync::Arc;

use tessera_client::{
    BulkDefaults, ClientConfig, ClientError, CommandExecutor, CommandTarget, HttpExecutor,
    TimeoutDefaults,
};

use crate::collection::Collection;

/// Handle on one keyspace of a Data API database.
#[derive(Clone)]
pub struct Db {
    executor: Arc<dyn CommandExecutor>,
    keyspace: String,
    timeouts: TimeoutDefaults,
    bulk: BulkDefaults,
}

impl Db {
    pub fn new(executor: Arc<dyn CommandExecutor>, config: &ClientConfig) -> Self {
        Self {
            executor,
            keyspace: config.keyspace.clone(),
            timeouts: config.timeouts(),
            bulk: config.bulk(),
        }
    }

    /// Build a handle backed by the HTTP executor.
    pub fn connect(config: &ClientConfig) -> Result<Self, ClientError> {
        config.validate()?;
        let executor = HttpExecutor::from_config(config)?;
        Ok(Self::new(Arc::new(executor), config))
    }

    pub fn keyspace(&self) -> &str {
        &self.keyspace
    }

    pub fn collection(&self, name: &str) -> Collection {
        Collection::new(
            self.executor.clone(),
            CommandTarget::collection(self.keyspace.clone(), name),
            self.timeouts,
            self.bulk,
        )
    }
}

impl fmt::Debug for Db {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Db")
            .field("keyspace", &self.keyspace)
            .field("timeouts", &self.timeouts)
            .field("bulk", &self.bulk)
            .finish_non_exhaustive()
    }
}
