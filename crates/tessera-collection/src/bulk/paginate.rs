use tessera_client::TimeoutManager;
use tessera_protocol::{Command, Document, ResponseEnvelope, UpdateCommandOptions};
use tracing::{debug, warn};

use crate::collection::Collection;
use crate::error::{CumulativeError, DataApiError};
use crate::options::{DeleteManyOptions, UpdateManyOptions};
use crate::results::{DeleteResult, UpdateResult};

impl Collection {
    /// Update every document matching `filter`.
    ///
    /// The server works through matches a page at a time; the same command
    /// is re-sent with its continuation token until no more pages remain.
    /// Counts are summed across pages, including those of a failing page.
    pub async fn update_many(
        &self,
        filter: Document,
        update: Document,
        options: UpdateManyOptions,
    ) -> Result<UpdateResult, DataApiError> {
        let timeout = TimeoutManager::multipart(&self.timeouts, options.timeout);
        let mut result = UpdateResult::default();
        let mut page_state = None;

        loop {
            let command = Command::UpdateMany {
                filter: filter.clone(),
                update: update.clone(),
                options: UpdateCommandOptions {
                    upsert: options.upsert.then_some(true),
                    page_state: page_state.take(),
                },
            };
            let response = self.send(&command, &timeout).await?;
            result.merge(&response);

            if response.has_errors() {
                warn!(
                    collection = self.name(),
                    pages = timeout.requests_issued(),
                    matched = result.matched_count,
                    "update_many failed mid-pagination"
                );
                return Err(DataApiError::UpdateMany(CumulativeError::from_response(
                    command, response, result,
                )));
            }

            page_state = response.status_page_state().map(str::to_owned);
            if !has_more(&response) {
                break;
            }
        }

        debug!(
            collection = self.name(),
            pages = timeout.requests_issued(),
            matched = result.matched_count,
            modified = result.modified_count,
            "update_many"
        );
        Ok(result)
    }

    /// Delete every document matching `filter`.
    ///
    /// An empty filter is refused without contacting the server; use
    /// [`delete_all`](Collection::delete_all) to empty a collection.
    pub async fn delete_many(
        &self,
        filter: Document,
        options: DeleteManyOptions,
    ) -> Result<DeleteResult, DataApiError> {
        if filter.is_empty() {
            return Err(DataApiError::InvalidArgument(
                "delete_many needs a non-empty filter; use delete_all to remove every document"
                    .into(),
            ));
        }

        let timeout = TimeoutManager::multipart(&self.timeouts, options.timeout);
        let command = Command::DeleteMany {
            filter: Some(filter),
        };
        let mut result = DeleteResult::default();

        loop {
            let response = self.send(&command, &timeout).await?;
            result.merge(&response);

            if response.has_errors() {
                warn!(
                    collection = self.name(),
                    pages = timeout.requests_issued(),
                    deleted = result.deleted_count,
                    "delete_many failed mid-pagination"
                );
                return Err(DataApiError::DeleteMany(CumulativeError::from_response(
                    command, response, result,
                )));
            }
            if !has_more(&response) {
                break;
            }
        }

        debug!(
            collection = self.name(),
            pages = timeout.requests_issued(),
            deleted = result.deleted_count,
            "delete_many"
        );
        Ok(result)
    }

    /// Remove every document in one unfiltered request.
    ///
    /// The server does not count what it removed, so `deleted_count` is `-1`.
    pub async fn delete_all(&self, options: DeleteManyOptions) -> Result<DeleteResult, DataApiError> {
        let timeout = TimeoutManager::single(&self.timeouts, options.timeout);
        let command = Command::DeleteMany { filter: None };
        let response = self.send(&command, &timeout).await?;

        let mut result = DeleteResult::default();
        result.merge(&response);
        if response.has_errors() {
            return Err(DataApiError::DeleteMany(CumulativeError::from_response(
                command, response, result,
            )));
        }
        Ok(result)
    }
}

fn has_more(response: &ResponseEnvelope) -> bool {
    response.more_data() || response.status_page_state().is_some()
}
