use std::time::Duration;

use tessera_protocol::{Document, ReturnDocument};

#[derive(Debug, Clone, Default)]
pub struct InsertManyOptions {
    /// Stop at the first failing chunk instead of attempting every chunk.
    pub ordered: bool,
    /// Documents per request; the collection default when unset.
    pub chunk_size: Option<usize>,
    /// Requests in flight for unordered inserts. Not allowed with `ordered`.
    pub concurrency: Option<usize>,
    /// Per-document `$vector` values, one entry per document.
    pub vectors: Option<Vec<Option<Vec<f64>>>>,
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateOneOptions {
    pub upsert: bool,
    pub sort: Option<Document>,
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateManyOptions {
    pub upsert: bool,
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone, Default)]
pub struct ReplaceOneOptions {
    pub upsert: bool,
    pub sort: Option<Document>,
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone, Default)]
pub struct DeleteOneOptions {
    pub sort: Option<Document>,
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone, Default)]
pub struct DeleteManyOptions {
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone, Default)]
pub struct BulkWriteOptions {
    pub ordered: bool,
    pub concurrency: Option<usize>,
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    pub sort: Option<Document>,
    pub projection: Option<Document>,
    /// Zero means no limit.
    pub limit: Option<usize>,
    pub skip: Option<usize>,
    pub include_similarity: bool,
    pub include_sort_vector: bool,
    /// Timeout for each page fetch.
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone, Default)]
pub struct FindOneOptions {
    pub sort: Option<Document>,
    pub projection: Option<Document>,
    pub include_similarity: bool,
    pub timeout: Option<Duration>,
}

/// Options for `find_one_and_update` and `find_one_and_replace`.
#[derive(Debug, Clone, Default)]
pub struct FindOneAndModifyOptions {
    pub sort: Option<Document>,
    pub projection: Option<Document>,
    pub return_document: ReturnDocument,
    pub upsert: bool,
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone, Default)]
pub struct FindOneAndDeleteOptions {
    pub sort: Option<Document>,
    pub projection: Option<Document>,
    pub timeout: Option<Duration>,
}
