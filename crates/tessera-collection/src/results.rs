use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use tessera_protocol::ResponseEnvelope;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsertOneResult {
    pub inserted_id: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InsertManyResult {
    pub inserted_ids: Vec<Value>,
    pub inserted_count: usize,
}

impl InsertManyResult {
    pub(crate) fn extend(&mut self, response: &ResponseEnvelope) {
        self.inserted_ids.extend_from_slice(response.inserted_ids());
        self.inserted_count = self.inserted_ids.len();
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UpdateResult {
    pub matched_count: u64,
    pub modified_count: u64,
    pub upserted_count: u64,
    pub upserted_id: Option<Value>,
}

impl UpdateResult {
    pub(crate) fn from_response(response: &ResponseEnvelope) -> Self {
        let mut result = Self::default();
        result.merge(response);
        result
    }

    pub(crate) fn merge(&mut self, response: &ResponseEnvelope) {
        self.matched_count += response.matched_count();
        self.modified_count += response.modified_count();
        if let Some(id) = response.upserted_id() {
            self.upserted_id = Some(id.clone());
            self.upserted_count = 1;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeleteResult {
    /// `-1` when the server could not tell how many documents it removed.
    pub deleted_count: i64,
}

impl DeleteResult {
    pub(crate) fn merge(&mut self, response: &ResponseEnvelope) {
        self.deleted_count += response.deleted_count();
    }
}

/// Totals of a bulk write, folded from every per-operation response.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BulkWriteResult {
    pub inserted_count: u64,
    pub matched_count: u64,
    pub modified_count: u64,
    pub deleted_count: i64,
    pub upserted_count: u64,
    /// Upserted IDs keyed by the position of the operation that produced them.
    pub upserted_ids: BTreeMap<usize, Value>,
    /// Raw responses in operation order.
    pub raw_responses: Vec<ResponseEnvelope>,
}

impl BulkWriteResult {
    pub(crate) fn record(&mut self, index: usize, response: ResponseEnvelope) {
        self.inserted_count += response.inserted_ids().len() as u64;
        self.matched_count += response.matched_count();
        self.modified_count += response.modified_count();
        self.deleted_count += response.deleted_count();
        if let Some(id) = response.upserted_id() {
            self.upserted_ids.insert(index, id.clone());
            self.upserted_count += 1;
        }
        self.raw_responses.push(response);
    }
}
