use serde_json::json;
use tessera_client::TimeoutManager;
use tessera_protocol::{Command, Document, InsertManyCommandOptions};
use tracing::{debug, warn};

use super::scheduler::{Completed, run_unordered};
use crate::collection::Collection;
use crate::error::{CumulativeError, DataApiError};
use crate::options::InsertManyOptions;
use crate::results::InsertManyResult;

impl Collection {
    /// Insert `documents` in chunks of `chunk_size`.
    ///
    /// Ordered inserts send chunks one after another and stop at the first
    /// chunk that reports an error. Unordered inserts send every chunk on up
    /// to `concurrency` concurrent requests and report all failing chunks
    /// together once everything has been attempted. Either way a soft
    /// failure carries the IDs inserted so far, including those the failing
    /// chunks managed to insert.
    pub async fn insert_many(
        &self,
        documents: Vec<Document>,
        options: InsertManyOptions,
    ) -> Result<InsertManyResult, DataApiError> {
        let chunk_size = options.chunk_size.unwrap_or(self.bulk.chunk_size);
        if chunk_size == 0 {
            return Err(DataApiError::InvalidArgument(
                "chunk_size must be at least 1".into(),
            ));
        }
        if options.ordered && options.concurrency.is_some() {
            return Err(DataApiError::InvalidArgument(
                "concurrency cannot be set for ordered inserts".into(),
            ));
        }
        let concurrency = options.concurrency.unwrap_or(self.bulk.concurrency);
        if concurrency == 0 {
            return Err(DataApiError::InvalidArgument(
                "concurrency must be at least 1".into(),
            ));
        }

        let documents = attach_vectors(documents, options.vectors)?;
        if documents.is_empty() {
            return Ok(InsertManyResult::default());
        }

        let total = documents.len();
        let commands = chunk(documents, chunk_size, options.ordered);
        let timeout = TimeoutManager::multipart(&self.timeouts, options.timeout);
        debug!(
            collection = self.name(),
            documents = total,
            chunks = commands.len(),
            ordered = options.ordered,
            "insert_many"
        );

        if options.ordered {
            self.insert_ordered(commands, &timeout).await
        } else {
            self.insert_unordered(&commands, concurrency, &timeout).await
        }
    }

    async fn insert_ordered(
        &self,
        commands: Vec<Command>,
        timeout: &TimeoutManager,
    ) -> Result<InsertManyResult, DataApiError> {
        let mut result = InsertManyResult::default();

        for (chunk, command) in commands.into_iter().enumerate() {
            let response = self.send(&command, timeout).await?;
            result.extend(&response);
            if response.has_errors() {
                warn!(
                    collection = self.name(),
                    chunk,
                    errors = response.errors.len(),
                    inserted = result.inserted_count,
                    "ordered insert_many stopped at failing chunk"
                );
                return Err(DataApiError::InsertMany(CumulativeError::from_response(
                    command, response, result,
                )));
            }
        }
        Ok(result)
    }

    async fn insert_unordered(
        &self,
        commands: &[Command],
        concurrency: usize,
        timeout: &TimeoutManager,
    ) -> Result<InsertManyResult, DataApiError> {
        let this = self;
        let completed =
            run_unordered(commands, concurrency, move |command| this.send(command, timeout)).await?;

        let mut result = InsertManyResult::default();
        let mut failures = Vec::new();
        for Completed {
            index,
            command,
            response,
        } in completed
        {
            result.extend(&response);
            if response.has_errors() {
                warn!(
                    collection = self.name(),
                    chunk = index,
                    errors = response.errors.len(),
                    "insert_many chunk failed"
                );
                failures.push((command.clone(), response));
            }
        }

        if failures.is_empty() {
            Ok(result)
        } else {
            Err(DataApiError::InsertMany(CumulativeError::from_responses(
                failures, result,
            )))
        }
    }
}

/// Set `$vector` on every document that has one.
fn attach_vectors(
    mut documents: Vec<Document>,
    vectors: Option<Vec<Option<Vec<f64>>>>,
) -> Result<Vec<Document>, DataApiError> {
    let Some(vectors) = vectors else {
        return Ok(documents);
    };
    if vectors.len() != documents.len() {
        return Err(DataApiError::InvalidArgument(format!(
            "got {} vectors for {} documents",
            vectors.len(),
            documents.len()
        )));
    }
    for (document, vector) in documents.iter_mut().zip(vectors) {
        if let Some(vector) = vector {
            document.insert("$vector".into(), json!(vector));
        }
    }
    Ok(documents)
}

fn chunk(documents: Vec<Document>, chunk_size: usize, ordered: bool) -> Vec<Command> {
    let mut documents = documents.into_iter();
    let mut commands = Vec::new();
    loop {
        let chunk: Vec<Document> = documents.by_ref().take(chunk_size).collect();
        if chunk.is_empty() {
            break;
        }
        commands.push(Command::InsertMany {
            documents: chunk,
            options: InsertManyCommandOptions { ordered },
        });
    }
    commands
}
