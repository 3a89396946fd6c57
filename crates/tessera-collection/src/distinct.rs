use std::collections::HashSet;
use std::time::Duration;

use serde_json::{Value, json};
use tessera_client::TimeoutManager;
use tessera_protocol::Document;
use tracing::debug;

use crate::collection::Collection;
use crate::error::DataApiError;
use crate::options::FindOptions;

impl Collection {
    /// Unique values found at the dot-separated `key` across every document
    /// matching `filter`, in first-seen order.
    ///
    /// Arrays along the path are fanned out unless the next segment is a
    /// numeric index, and an array at the end of the path contributes each
    /// of its elements. Objects compare by content regardless of key order;
    /// numbers compare by their JSON text, so `1` and `1.0` are different.
    ///
    /// Every page of the scan draws on one budget of `timeout`, or the
    /// general method timeout when `None`.
    pub async fn distinct(
        &self,
        key: &str,
        filter: Document,
        timeout: Option<Duration>,
    ) -> Result<Vec<Value>, DataApiError> {
        let path = DistinctPath::parse(key)?;
        let budget = TimeoutManager::multipart(&self.timeouts, timeout);
        let options = FindOptions {
            projection: path.projection(),
            ..FindOptions::default()
        };

        let mut cursor = self.find(filter, options);
        let mut values = DistinctValues::default();
        let mut scanned = 0usize;
        while let Some(document) = cursor.next_within(Some(&budget)).await? {
            scanned += 1;
            path.extract(&Value::Object(document), &mut |value| values.insert(value));
        }

        debug!(
            collection = self.name(),
            key,
            scanned,
            pages = budget.requests_issued(),
            distinct = values.len(),
            "distinct"
        );
        Ok(values.into_vec())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Segment {
    name: String,
    /// Set when the segment could address an array element.
    index: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DistinctPath {
    segments: Vec<Segment>,
}

impl DistinctPath {
    pub(crate) fn parse(key: &str) -> Result<Self, DataApiError> {
        let segments = key
            .split('.')
            .map(|name| {
                if name.is_empty() {
                    return Err(DataApiError::InvalidArgument(format!(
                        "path '{key}' has an empty segment"
                    )));
                }
                // Indexes past usize::MAX saturate; no array is that long.
                let index = if name.bytes().all(|b| b.is_ascii_digit()) {
                    Some(name.parse().unwrap_or(usize::MAX))
                } else {
                    None
                };
                Ok(Segment {
                    name: name.to_string(),
                    index,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { segments })
    }

    /// The leading segments before any numeric one, joined back together.
    fn projection_root(&self) -> Option<String> {
        let root: Vec<&str> = self
            .segments
            .iter()
            .take_while(|s| s.index.is_none())
            .map(|s| s.name.as_str())
            .collect();
        (!root.is_empty()).then(|| root.join("."))
    }

    /// Projection that fetches only what the path can reach.
    pub(crate) fn projection(&self) -> Option<Document> {
        let root = self.projection_root()?;
        let mut projection = Document::new();
        projection.insert("_id".into(), json!(0));
        projection.insert(root, json!(1));
        Some(projection)
    }

    pub(crate) fn extract(&self, document: &Value, emit: &mut impl FnMut(&Value)) {
        walk(document, &self.segments, emit);
    }
}

fn walk(value: &Value, segments: &[Segment], emit: &mut impl FnMut(&Value)) {
    let Some((segment, rest)) = segments.split_first() else {
        match value {
            Value::Array(items) => items.iter().for_each(|item| emit(item)),
            leaf => emit(leaf),
        }
        return;
    };

    match value {
        Value::Array(items) => match segment.index {
            Some(index) => {
                if let Some(item) = items.get(index) {
                    walk(item, rest, &mut *emit);
                }
            }
            None => {
                for item in items {
                    walk(item, segments, &mut *emit);
                }
            }
        },
        Value::Object(fields) => {
            if let Some(child) = fields.get(&segment.name) {
                walk(child, rest, &mut *emit);
            }
        }
        _ => {}
    }
}

/// First-seen ordered set of JSON values.
#[derive(Debug, Default)]
pub(crate) struct DistinctValues {
    seen: HashSet<String>,
    values: Vec<Value>,
}

impl DistinctValues {
    pub(crate) fn insert(&mut self, value: &Value) {
        if self.seen.insert(stable_key(value)) {
            self.values.push(value.clone());
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.values.len()
    }

    pub(crate) fn into_vec(self) -> Vec<Value> {
        self.values
    }
}

/// JSON text with object keys sorted at every level.
fn stable_key(value: &Value) -> String {
    let mut out = String::new();
    write_stable(value, &mut out);
    out
}

fn write_stable(value: &Value, out: &mut String) {
    match value {
        Value::Object(fields) => {
            let mut entries: Vec<_> = fields.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (key, value)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_stable(value, out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_stable(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}
