use tessera_client::TimeoutManager;
use tessera_protocol::{Command, Document, UpdateCommandOptions};
use tracing::{debug, warn};

use super::scheduler::{Completed, run_unordered};
use crate::collection::{Collection, replace_command};
use crate::error::{CumulativeError, DataApiError};
use crate::options::BulkWriteOptions;
use crate::results::BulkWriteResult;

/// One operation of a [`Collection::bulk_write`].
///
/// Each operation is sent as exactly one command. `UpdateMany` and
/// `DeleteMany` do not follow continuation tokens here.
#[derive(Debug, Clone, PartialEq)]
pub enum BulkWriteOperation {
    InsertOne {
        document: Document,
    },
    UpdateOne {
        filter: Document,
        update: Document,
        upsert: bool,
    },
    UpdateMany {
        filter: Document,
        update: Document,
        upsert: bool,
    },
    ReplaceOne {
        filter: Document,
        replacement: Document,
        upsert: bool,
    },
    DeleteOne {
        filter: Document,
    },
    DeleteMany {
        filter: Document,
    },
}

impl BulkWriteOperation {
    fn into_command(self) -> Command {
        match self {
            BulkWriteOperation::InsertOne { document } => Command::InsertOne { document },
            BulkWriteOperation::UpdateOne {
                filter,
                update,
                upsert,
            } => Command::UpdateOne {
                filter,
                update,
                sort: None,
                options: UpdateCommandOptions {
                    upsert: upsert.then_some(true),
                    page_state: None,
                },
            },
            BulkWriteOperation::UpdateMany {
                filter,
                update,
                upsert,
            } => Command::UpdateMany {
                filter,
                update,
                options: UpdateCommandOptions {
                    upsert: upsert.then_some(true),
                    page_state: None,
                },
            },
            BulkWriteOperation::ReplaceOne {
                filter,
                replacement,
                upsert,
            } => replace_command(filter, replacement, None, upsert),
            BulkWriteOperation::DeleteOne { filter } => Command::DeleteOne { filter, sort: None },
            BulkWriteOperation::DeleteMany { filter } => Command::DeleteMany {
                filter: Some(filter),
            },
        }
    }
}

impl Collection {
    /// Run a list of heterogeneous write operations.
    ///
    /// Ordered writes stop at the first failing operation. Unordered writes
    /// attempt every operation on up to `concurrency` concurrent requests.
    /// Upserted IDs are keyed by the position of the operation in `operations`.
    pub async fn bulk_write(
        &self,
        operations: Vec<BulkWriteOperation>,
        options: BulkWriteOptions,
    ) -> Result<BulkWriteResult, DataApiError> {
        if options.ordered && options.concurrency.is_some() {
            return Err(DataApiError::InvalidArgument(
                "concurrency cannot be set for ordered bulk writes".into(),
            ));
        }
        let concurrency = options.concurrency.unwrap_or(self.bulk.concurrency);
        if concurrency == 0 {
            return Err(DataApiError::InvalidArgument(
                "concurrency must be at least 1".into(),
            ));
        }
        if operations.is_empty() {
            return Ok(BulkWriteResult::default());
        }

        let commands: Vec<Command> = operations
            .into_iter()
            .map(BulkWriteOperation::into_command)
            .collect();
        let timeout = TimeoutManager::multipart(&self.timeouts, options.timeout);
        debug!(
            collection = self.name(),
            operations = commands.len(),
            ordered = options.ordered,
            "bulk_write"
        );

        if options.ordered {
            self.bulk_write_ordered(commands, &timeout).await
        } else {
            self.bulk_write_unordered(&commands, concurrency, &timeout)
                .await
        }
    }

    async fn bulk_write_ordered(
        &self,
        commands: Vec<Command>,
        timeout: &TimeoutManager,
    ) -> Result<BulkWriteResult, DataApiError> {
        let mut result = BulkWriteResult::default();

        for (index, command) in commands.into_iter().enumerate() {
            let response = self.send(&command, timeout).await?;
            if response.has_errors() {
                warn!(
                    collection = self.name(),
                    operation = index,
                    command = command.name(),
                    "ordered bulk_write stopped at failing operation"
                );
                result.record(index, response.clone());
                return Err(DataApiError::BulkWrite(CumulativeError::from_response(
                    command, response, result,
                )));
            }
            result.record(index, response);
        }
        Ok(result)
    }

    async fn bulk_write_unordered(
        &self,
        commands: &[Command],
        concurrency: usize,
        timeout: &TimeoutManager,
    ) -> Result<BulkWriteResult, DataApiError> {
        let this = self;
        let completed =
            run_unordered(commands, concurrency, move |command| this.send(command, timeout)).await?;

        let mut result = BulkWriteResult::default();
        let mut failures = Vec::new();
        for Completed {
            index,
            command,
            response,
        } in completed
        {
            if response.has_errors() {
                warn!(
                    collection = self.name(),
                    operation = index,
                    command = command.name(),
                    "bulk_write operation failed"
                );
                failures.push((command.clone(), response.clone()));
            }
            result.record(index, response);
        }

        if failures.is_empty() {
            Ok(result)
        } else {
            Err(DataApiError::BulkWrite(CumulativeError::from_responses(
                failures, result,
            )))
        }
    }
}
