use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Document;

/// A decoded Data API response.
///
/// Any combination of `status`, `data` and `errors` may be present. A 2XX
/// response with a non-empty `errors` list is a soft failure: the command
/// may still have done part of its work, which `status` then reports.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponseData>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ErrorDescriptor>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inserted_ids: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_count: Option<u64>,
    /// `-1` when the server cannot report how many documents went away.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upserted_id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub more_data: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_vector: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<Document>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documents: Option<Vec<Document>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_state: Option<String>,
}

/// One soft error reported by the server.
///
/// Fields other than `errorCode` and `message` land in `attributes`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub attributes: Document,
}

impl ResponseEnvelope {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn inserted_ids(&self) -> &[Value] {
        self.status
            .as_ref()
            .and_then(|s| s.inserted_ids.as_deref())
            .unwrap_or(&[])
    }

    pub fn matched_count(&self) -> u64 {
        self.status.as_ref().and_then(|s| s.matched_count).unwrap_or(0)
    }

    pub fn modified_count(&self) -> u64 {
        self.status.as_ref().and_then(|s| s.modified_count).unwrap_or(0)
    }

    pub fn deleted_count(&self) -> i64 {
        self.status.as_ref().and_then(|s| s.deleted_count).unwrap_or(0)
    }

    pub fn upserted_id(&self) -> Option<&Value> {
        self.status.as_ref().and_then(|s| s.upserted_id.as_ref())
    }

    pub fn count(&self) -> Option<u64> {
        self.status.as_ref().and_then(|s| s.count)
    }

    pub fn more_data(&self) -> bool {
        self.status
            .as_ref()
            .and_then(|s| s.more_data)
            .unwrap_or(false)
    }

    /// Continuation token for paginated writes (`status.nextPageState`).
    pub fn status_page_state(&self) -> Option<&str> {
        self.status
            .as_ref()
            .and_then(|s| s.next_page_state.as_deref())
    }

    /// Continuation token for paginated reads (`data.nextPageState`).
    pub fn data_page_state(&self) -> Option<&str> {
        self.data.as_ref().and_then(|d| d.next_page_state.as_deref())
    }

    pub fn sort_vector(&self) -> Option<&Value> {
        self.status.as_ref().and_then(|s| s.sort_vector.as_ref())
    }

    /// Take the single document out of `data.document`.
    pub fn take_document(&mut self) -> Option<Document> {
        self.data.as_mut().and_then(|d| d.document.take())
    }

    /// Take the page of documents out of `data.documents`.
    pub fn take_documents(&mut self) -> Vec<Document> {
        self.data
            .as_mut()
            .and_then(|d| d.documents.take())
            .unwrap_or_default()
    }
}
