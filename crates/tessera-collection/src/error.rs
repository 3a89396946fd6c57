use std::fmt;

use tessera_client::ClientError;
use tessera_protocol::{Command, ErrorDescriptor, ResponseEnvelope};

use crate::results::{BulkWriteResult, DeleteResult, InsertManyResult, UpdateResult};

const FALLBACK_MESSAGE: &str = "Something unexpected occurred";

/// The errors of one failed request, kept next to what was sent and received.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailedErrorDescriptor {
    pub error_descriptors: Vec<ErrorDescriptor>,
    pub command: Command,
    pub raw_response: ResponseEnvelope,
}

/// Soft errors from one or more responses of a single logical operation,
/// plus whatever the operation had achieved when it stopped.
///
/// `R` is the operation's result type; each operation kind uses its own
/// alias ([`InsertManyError`], [`UpdateManyError`], ...).
#[derive(Debug, Clone, PartialEq)]
pub struct CumulativeError<R> {
    message: String,
    error_descriptors: Vec<ErrorDescriptor>,
    detailed_error_descriptors: Vec<DetailedErrorDescriptor>,
    partial_result: R,
}

pub type DataApiResponseError = CumulativeError<()>;
pub type InsertManyError = CumulativeError<InsertManyResult>;
pub type UpdateManyError = CumulativeError<UpdateResult>;
pub type DeleteManyError = CumulativeError<DeleteResult>;
pub type BulkWriteError = CumulativeError<BulkWriteResult>;

impl<R> CumulativeError<R> {
    pub(crate) fn from_response(command: Command, response: ResponseEnvelope, partial_result: R) -> Self {
        Self::from_responses(vec![(command, response)], partial_result)
    }

    pub(crate) fn from_responses(
        failures: Vec<(Command, ResponseEnvelope)>,
        partial_result: R,
    ) -> Self {
        let mut error_descriptors = Vec::new();
        let mut detailed_error_descriptors = Vec::with_capacity(failures.len());

        for (command, raw_response) in failures {
            let descriptors = raw_response.errors.clone();
            error_descriptors.extend(descriptors.iter().cloned());
            detailed_error_descriptors.push(DetailedErrorDescriptor {
                error_descriptors: descriptors,
                command,
                raw_response,
            });
        }

        Self {
            message: summarize(&error_descriptors),
            error_descriptors,
            detailed_error_descriptors,
            partial_result,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Every error descriptor, across all failed responses.
    pub fn error_descriptors(&self) -> &[ErrorDescriptor] {
        &self.error_descriptors
    }

    /// One entry per failed response.
    pub fn detailed_error_descriptors(&self) -> &[DetailedErrorDescriptor] {
        &self.detailed_error_descriptors
    }

    pub fn partial_result(&self) -> &R {
        &self.partial_result
    }

    pub fn into_partial_result(self) -> R {
        self.partial_result
    }
}

fn summarize(descriptors: &[ErrorDescriptor]) -> String {
    let first = descriptors
        .first()
        .and_then(|d| d.message.as_deref())
        .unwrap_or(FALLBACK_MESSAGE);
    match descriptors.len() {
        0 | 1 => first.to_string(),
        n => format!("{first} (+ {} more errors)", n - 1),
    }
}

impl<R> fmt::Display for CumulativeError<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl<R: fmt::Debug> std::error::Error for CumulativeError<R> {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CursorError {
    #[error("cursor is already initialized; rewind or clone it to change its query")]
    AlreadyInitialized,
    #[error("cursor is closed")]
    Closed,
}

#[derive(Debug, thiserror::Error)]
pub enum DataApiError {
    /// Transport, HTTP or timeout failure. Never carries partial results.
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Response(DataApiResponseError),

    #[error(transparent)]
    InsertMany(InsertManyError),

    #[error(transparent)]
    UpdateMany(UpdateManyError),

    #[error(transparent)]
    DeleteMany(DeleteManyError),

    #[error(transparent)]
    BulkWrite(BulkWriteError),

    #[error("too many documents to count (limit {limit}, server limit hit: {hit_server_limit})")]
    TooManyDocumentsToCount { limit: u64, hit_server_limit: bool },

    #[error(transparent)]
    Cursor(#[from] CursorError),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}

impl DataApiError {
    /// True for failures that aborted the operation outright.
    pub fn is_hard(&self) -> bool {
        matches!(self, DataApiError::Client(_))
    }

    /// The flat descriptor list of a soft failure, empty otherwise.
    pub fn error_descriptors(&self) -> &[ErrorDescriptor] {
        match self {
            DataApiError::Response(e) => e.error_descriptors(),
            DataApiError::InsertMany(e) => e.error_descriptors(),
            DataApiError::UpdateMany(e) => e.error_descriptors(),
            DataApiError::DeleteMany(e) => e.error_descriptors(),
            DataApiError::BulkWrite(e) => e.error_descriptors(),
            _ => &[],
        }
    }
}
