use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use futures::Stream;
use serde_json::Value;
use tessera_client::TimeoutManager;
use tessera_protocol::{Command, Document, FindCommandOptions};
use tracing::{debug, trace};

use crate::collection::Collection;
use crate::error::{CumulativeError, CursorError, DataApiError};
use crate::options::FindOptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    /// Nothing fetched yet; the query can still be changed.
    Idle,
    /// At least one page fetched and more may follow.
    Started,
    /// The server has no more pages. Buffered documents can still be read.
    Exhausted,
    Closed,
}

/// Lazy iterator over the documents matched by a `find`.
///
/// Pages are fetched one at a time as the buffer runs dry. The query
/// (filter, sort, projection, limit, skip) can only be changed while the
/// cursor is [`Idle`](CursorState::Idle); [`rewind`](FindCursor::rewind) or
/// [`fresh_clone`](FindCursor::fresh_clone) to run it again.
///
/// The server only returns a stable snapshot for vector sorts. Documents
/// written while a cursor is being read may be skipped or seen twice.
pub struct FindCursor<T = Document> {
    collection: Collection,
    filter: Document,
    options: FindOptions,
    mapper: Arc<dyn Fn(Document) -> T + Send + Sync>,
    state: CursorState,
    buffer: VecDeque<Document>,
    page_state: Option<String>,
    consumed: usize,
    sort_vector: Option<Value>,
}

impl FindCursor<Document> {
    pub(crate) fn new(collection: &Collection, filter: Document, options: FindOptions) -> Self {
        Self {
            collection: collection.clone(),
            filter,
            options,
            mapper: Arc::new(|document| document),
            state: CursorState::Idle,
            buffer: VecDeque::new(),
            page_state: None,
            consumed: 0,
            sort_vector: None,
        }
    }
}

impl<T> FindCursor<T> {
    pub fn state(&self) -> CursorState {
        self.state
    }

    /// Documents fetched but not yet read.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Documents read so far.
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    pub fn options(&self) -> &FindOptions {
        &self.options
    }

    // ── Query setters (idle only) ───────────────────────────────

    pub fn filter(&mut self, filter: Document) -> Result<&mut Self, CursorError> {
        self.ensure_idle()?;
        self.filter = filter;
        Ok(self)
    }

    pub fn sort(&mut self, sort: Document) -> Result<&mut Self, CursorError> {
        self.ensure_idle()?;
        self.options.sort = Some(sort);
        Ok(self)
    }

    pub fn projection(&mut self, projection: Document) -> Result<&mut Self, CursorError> {
        self.ensure_idle()?;
        self.options.projection = Some(projection);
        Ok(self)
    }

    /// Zero removes the limit.
    pub fn limit(&mut self, limit: usize) -> Result<&mut Self, CursorError> {
        self.ensure_idle()?;
        self.options.limit = Some(limit);
        Ok(self)
    }

    pub fn skip(&mut self, skip: usize) -> Result<&mut Self, CursorError> {
        self.ensure_idle()?;
        self.options.skip = Some(skip);
        Ok(self)
    }

    pub fn include_similarity(&mut self, include: bool) -> Result<&mut Self, CursorError> {
        self.ensure_idle()?;
        self.options.include_similarity = include;
        Ok(self)
    }

    pub fn include_sort_vector(&mut self, include: bool) -> Result<&mut Self, CursorError> {
        self.ensure_idle()?;
        self.options.include_sort_vector = include;
        Ok(self)
    }

    /// Transform every document the cursor yields. Composes with an
    /// earlier `map`.
    pub fn map<U, F>(self, f: F) -> Result<FindCursor<U>, CursorError>
    where
        T: 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        self.ensure_idle()?;
        let inner = self.mapper;
        Ok(FindCursor {
            collection: self.collection,
            filter: self.filter,
            options: self.options,
            mapper: Arc::new(move |document| f(inner(document))),
            state: CursorState::Idle,
            buffer: VecDeque::new(),
            page_state: None,
            consumed: 0,
            sort_vector: None,
        })
    }

    // ── Consumption ─────────────────────────────────────────────

    /// Whether another document is available, fetching a page if needed.
    pub async fn has_next(&mut self) -> Result<bool, DataApiError> {
        self.fill_buffer(None).await
    }

    /// Each page fetched here runs under its own single-request budget.
    pub async fn next(&mut self) -> Result<Option<T>, DataApiError> {
        self.next_within(None).await
    }

    /// Like [`next`](FindCursor::next), but any page fetch draws on `budget`
    /// when one is given.
    pub(crate) async fn next_within(
        &mut self,
        budget: Option<&TimeoutManager>,
    ) -> Result<Option<T>, DataApiError> {
        if !self.fill_buffer(budget).await? {
            return Ok(None);
        }
        let Some(document) = self.buffer.pop_front() else {
            return Ok(None);
        };
        self.consumed += 1;
        Ok(Some((self.mapper)(document)))
    }

    /// Read every remaining document. All pages share one budget, bounded
    /// by the `timeout` option or the general method timeout.
    pub async fn to_vec(&mut self) -> Result<Vec<T>, DataApiError> {
        let budget = TimeoutManager::multipart(&self.collection.timeouts, self.options.timeout);
        let mut items = Vec::with_capacity(self.buffer.len());
        while let Some(item) = self.next_within(Some(&budget)).await? {
            items.push(item);
        }
        Ok(items)
    }

    /// Take up to `max` already-buffered documents without fetching.
    pub fn consume_buffer(&mut self, max: Option<usize>) -> Vec<T> {
        let mut take = max.unwrap_or(usize::MAX).min(self.buffer.len());
        if let Some(remaining) = self.remaining_limit() {
            take = take.min(remaining);
        }
        self.consumed += take;
        self.buffer
            .drain(..take)
            .map(|document| (self.mapper)(document))
            .collect()
    }

    /// The vector the server sorted by, when `include_sort_vector` is set.
    ///
    /// On an idle cursor this fetches the first page.
    pub async fn sort_vector(&mut self) -> Result<Option<Value>, DataApiError> {
        if self.state == CursorState::Idle && self.options.include_sort_vector {
            self.fetch_page(None).await?;
        }
        Ok(self.sort_vector.clone())
    }

    /// Stop iterating and drop anything buffered.
    pub fn close(&mut self) {
        self.state = CursorState::Closed;
        self.buffer.clear();
        self.page_state = None;
    }

    /// Back to idle with the same query and mapping.
    pub fn rewind(&mut self) {
        self.state = CursorState::Idle;
        self.buffer.clear();
        self.page_state = None;
        self.consumed = 0;
        self.sort_vector = None;
    }

    /// An idle copy of this cursor's query and mapping.
    pub fn fresh_clone(&self) -> Self {
        Self {
            collection: self.collection.clone(),
            filter: self.filter.clone(),
            options: self.options.clone(),
            mapper: self.mapper.clone(),
            state: CursorState::Idle,
            buffer: VecDeque::new(),
            page_state: None,
            consumed: 0,
            sort_vector: None,
        }
    }

    /// Consume the cursor as a stream. The stream ends after the first error.
    pub fn into_stream(self) -> impl Stream<Item = Result<T, DataApiError>> {
        futures::stream::unfold(Some(self), |cursor| async move {
            let mut cursor = cursor?;
            match cursor.next().await {
                Ok(Some(item)) => Some((Ok(item), Some(cursor))),
                Ok(None) => None,
                Err(err) => Some((Err(err), None)),
            }
        })
    }

    // ── Paging ──────────────────────────────────────────────────

    fn ensure_idle(&self) -> Result<(), CursorError> {
        match self.state {
            CursorState::Idle => Ok(()),
            CursorState::Closed => Err(CursorError::Closed),
            CursorState::Started | CursorState::Exhausted => Err(CursorError::AlreadyInitialized),
        }
    }

    fn remaining_limit(&self) -> Option<usize> {
        match self.options.limit {
            Some(limit) if limit > 0 => Some(limit.saturating_sub(self.consumed)),
            _ => None,
        }
    }

    /// Make sure a document is buffered. `false` means the cursor is done.
    async fn fill_buffer(
        &mut self,
        budget: Option<&TimeoutManager>,
    ) -> Result<bool, DataApiError> {
        loop {
            if self.remaining_limit() == Some(0) {
                if self.state != CursorState::Closed {
                    self.state = CursorState::Exhausted;
                }
                self.buffer.clear();
                self.page_state = None;
                return Ok(false);
            }
            if !self.buffer.is_empty() {
                return Ok(true);
            }
            match self.state {
                CursorState::Idle | CursorState::Started => self.fetch_page(budget).await?,
                CursorState::Exhausted | CursorState::Closed => return Ok(false),
            }
        }
    }

    /// Fetch the next page into the buffer, replacing whatever was there.
    /// Any failure closes the cursor. Without a shared `budget` the page
    /// gets a single-request one of its own.
    async fn fetch_page(&mut self, budget: Option<&TimeoutManager>) -> Result<(), DataApiError> {
        let command = self.page_command();
        let page_budget;
        let timeout = match budget {
            Some(budget) => budget,
            None => {
                page_budget =
                    TimeoutManager::single(&self.collection.timeouts, self.options.timeout);
                &page_budget
            }
        };
        self.state = CursorState::Started;

        let mut response = match self.collection.send(&command, timeout).await {
            Ok(response) => response,
            Err(err) => {
                self.close();
                return Err(err.into());
            }
        };
        if response.has_errors() {
            self.close();
            return Err(DataApiError::Response(CumulativeError::from_response(
                command, response, (),
            )));
        }

        if let Some(vector) = response.sort_vector() {
            self.sort_vector = Some(vector.clone());
        }
        self.page_state = response.data_page_state().map(str::to_owned);
        self.buffer = response.take_documents().into();
        if self.page_state.is_none() {
            self.state = CursorState::Exhausted;
        }

        trace!(
            collection = self.collection.name(),
            documents = self.buffer.len(),
            more = self.page_state.is_some(),
            "fetched page"
        );
        if self.state == CursorState::Exhausted {
            debug!(
                collection = self.collection.name(),
                consumed = self.consumed,
                "cursor exhausted"
            );
        }
        Ok(())
    }

    fn page_command(&self) -> Command {
        Command::Find {
            filter: self.filter.clone(),
            sort: self.options.sort.clone(),
            projection: self.options.projection.clone(),
            options: FindCommandOptions {
                limit: self.options.limit.filter(|limit| *limit > 0),
                skip: self.options.skip,
                page_state: self.page_state.clone(),
                include_similarity: self.options.include_similarity.then_some(true),
                include_sort_vector: self.options.include_sort_vector.then_some(true),
            },
        }
    }
}

impl<T> fmt::Debug for FindCursor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FindCursor")
            .field("collection", &self.collection.name())
            .field("filter", &self.filter)
            .field("options", &self.options)
            .field("state", &self.state)
            .field("buffered", &self.buffer.len())
            .field("consumed", &self.consumed)
            .finish_non_exhaustive()
    }
}
