use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tessera_client::{BulkDefaults, ClientError, CommandExecutor, CommandTarget, TimeoutDefaults, TimeoutManager};
use tessera_protocol::{
    Command, Document, FindOneAndOptions, FindOneCommandOptions, ResponseEnvelope, ReturnDocument,
    UpdateCommandOptions,
};

use crate::cursor::FindCursor;
use crate::error::{CumulativeError, DataApiError};
use crate::options::{
    DeleteOneOptions, FindOneAndDeleteOptions, FindOneAndModifyOptions, FindOneOptions, FindOptions,
    ReplaceOneOptions, UpdateOneOptions,
};
use crate::results::{DeleteResult, InsertOneResult, UpdateResult};

/// A document collection in a keyspace.
///
/// Cheap to clone; clones share the executor.
#[derive(Clone)]
pub struct Collection {
    pub(crate) executor: Arc<dyn CommandExecutor>,
    pub(crate) target: CommandTarget,
    pub(crate) timeouts: TimeoutDefaults,
    pub(crate) bulk: BulkDefaults,
}

impl Collection {
    pub fn new(
        executor: Arc<dyn CommandExecutor>,
        target: CommandTarget,
        timeouts: TimeoutDefaults,
        bulk: BulkDefaults,
    ) -> Self {
        Self {
            executor,
            target,
            timeouts,
            bulk,
        }
    }

    pub fn name(&self) -> &str {
        self.target.collection.as_deref().unwrap_or_default()
    }

    pub fn keyspace(&self) -> &str {
        &self.target.keyspace
    }

    pub(crate) async fn send(
        &self,
        command: &Command,
        timeout: &TimeoutManager,
    ) -> Result<ResponseEnvelope, ClientError> {
        self.executor.execute(command, &self.target, timeout).await
    }

    /// Send a one-request command; soft errors become [`DataApiError::Response`].
    async fn send_one(
        &self,
        command: Command,
        timeout: Option<Duration>,
    ) -> Result<ResponseEnvelope, DataApiError> {
        let timeout = TimeoutManager::single(&self.timeouts, timeout);
        let response = self.send(&command, &timeout).await?;
        if response.has_errors() {
            return Err(DataApiError::Response(CumulativeError::from_response(
                command, response, (),
            )));
        }
        Ok(response)
    }

    // ── Insert operations ───────────────────────────────────────

    pub async fn insert_one(
        &self,
        document: Document,
        timeout: Option<Duration>,
    ) -> Result<InsertOneResult, DataApiError> {
        let response = self
            .send_one(Command::InsertOne { document }, timeout)
            .await?;
        let inserted_id = response
            .inserted_ids()
            .first()
            .cloned()
            .ok_or_else(|| DataApiError::UnexpectedResponse("insertOne returned no insertedIds".into()))?;
        Ok(InsertOneResult { inserted_id })
    }

    // ── Update operations ───────────────────────────────────────

    pub async fn update_one(
        &self,
        filter: Document,
        update: Document,
        options: UpdateOneOptions,
    ) -> Result<UpdateResult, DataApiError> {
        let command = Command::UpdateOne {
            filter,
            update,
            sort: options.sort,
            options: UpdateCommandOptions {
                upsert: options.upsert.then_some(true),
                page_state: None,
            },
        };
        let response = self.send_one(command, options.timeout).await?;
        Ok(UpdateResult::from_response(&response))
    }

    /// Replace one document. Counts are read from the response status; the
    /// previous document itself is never transferred.
    pub async fn replace_one(
        &self,
        filter: Document,
        replacement: Document,
        options: ReplaceOneOptions,
    ) -> Result<UpdateResult, DataApiError> {
        let command = replace_command(filter, replacement, options.sort, options.upsert);
        let response = self.send_one(command, options.timeout).await?;
        Ok(UpdateResult::from_response(&response))
    }

    // ── Delete operations ───────────────────────────────────────

    pub async fn delete_one(
        &self,
        filter: Document,
        options: DeleteOneOptions,
    ) -> Result<DeleteResult, DataApiError> {
        let command = Command::DeleteOne {
            filter,
            sort: options.sort,
        };
        let response = self.send_one(command, options.timeout).await?;
        Ok(DeleteResult {
            deleted_count: response.deleted_count(),
        })
    }

    // ── Query operations ────────────────────────────────────────

    /// Lazily iterate over every document matching `filter`.
    ///
    /// No request is sent until the cursor is first advanced.
    pub fn find(&self, filter: Document, options: FindOptions) -> FindCursor<Document> {
        FindCursor::new(self, filter, options)
    }

    pub async fn find_one(
        &self,
        filter: Document,
        options: FindOneOptions,
    ) -> Result<Option<Document>, DataApiError> {
        let command = Command::FindOne {
            filter,
            sort: options.sort,
            projection: options.projection,
            options: FindOneCommandOptions {
                include_similarity: options.include_similarity.then_some(true),
            },
        };
        let mut response = self.send_one(command, options.timeout).await?;
        Ok(response.take_document())
    }

    pub async fn find_one_and_update(
        &self,
        filter: Document,
        update: Document,
        options: FindOneAndModifyOptions,
    ) -> Result<Option<Document>, DataApiError> {
        let command = Command::FindOneAndUpdate {
            filter,
            update,
            sort: options.sort,
            projection: options.projection,
            options: FindOneAndOptions {
                return_document: options.return_document,
                upsert: options.upsert.then_some(true),
            },
        };
        let mut response = self.send_one(command, options.timeout).await?;
        Ok(response.take_document())
    }

    pub async fn find_one_and_replace(
        &self,
        filter: Document,
        replacement: Document,
        options: FindOneAndModifyOptions,
    ) -> Result<Option<Document>, DataApiError> {
        let command = Command::FindOneAndReplace {
            filter,
            replacement,
            sort: options.sort,
            projection: options.projection,
            options: FindOneAndOptions {
                return_document: options.return_document,
                upsert: options.upsert.then_some(true),
            },
        };
        let mut response = self.send_one(command, options.timeout).await?;
        Ok(response.take_document())
    }

    pub async fn find_one_and_delete(
        &self,
        filter: Document,
        options: FindOneAndDeleteOptions,
    ) -> Result<Option<Document>, DataApiError> {
        let command = Command::FindOneAndDelete {
            filter,
            sort: options.sort,
            projection: options.projection,
        };
        let mut response = self.send_one(command, options.timeout).await?;
        Ok(response.take_document())
    }

    // ── Count ───────────────────────────────────────────────────

    /// Count matching documents, failing if there are more than `upper_bound`.
    ///
    /// The server also caps how far it will count; hitting that cap is
    /// reported with `hit_server_limit: true` and the server's limit.
    pub async fn count_documents(
        &self,
        filter: Document,
        upper_bound: u64,
        timeout: Option<Duration>,
    ) -> Result<u64, DataApiError> {
        let response = self
            .send_one(Command::CountDocuments { filter }, timeout)
            .await?;
        let count = response.count().ok_or_else(|| {
            DataApiError::UnexpectedResponse("countDocuments returned no count".into())
        })?;

        if response.more_data() {
            return Err(DataApiError::TooManyDocumentsToCount {
                limit: count,
                hit_server_limit: true,
            });
        }
        if count > upper_bound {
            return Err(DataApiError::TooManyDocumentsToCount {
                limit: upper_bound,
                hit_server_limit: false,
            });
        }
        Ok(count)
    }

    /// Server-side estimate based on collection metadata.
    pub async fn estimated_document_count(
        &self,
        timeout: Option<Duration>,
    ) -> Result<u64, DataApiError> {
        let response = self
            .send_one(Command::EstimatedDocumentCount {}, timeout)
            .await?;
        response.count().ok_or_else(|| {
            DataApiError::UnexpectedResponse("estimatedDocumentCount returned no count".into())
        })
    }
}

/// `replaceOne` goes over the wire as a `findOneAndReplace` that projects
/// nothing back.
pub(crate) fn replace_command(
    filter: Document,
    replacement: Document,
    sort: Option<Document>,
    upsert: bool,
) -> Command {
    let mut projection = Document::new();
    projection.insert("*".into(), json!(0));
    Command::FindOneAndReplace {
        filter,
        replacement,
        sort,
        projection: Some(projection),
        options: FindOneAndOptions {
            return_document: ReturnDocument::Before,
            upsert: upsert.then_some(true),
        },
    }
}

impl fmt::Debug for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("target", &self.target)
            .field("timeouts", &self.timeouts)
            .field("bulk", &self.bulk)
            .finish_non_exhaustive()
    }
}
