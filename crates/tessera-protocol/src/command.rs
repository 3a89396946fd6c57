use serde::Serialize;

use crate::Document;

/// A single Data API command.
///
/// Serializes to the wire shape `{ "<commandName>": { ...body } }`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Command {
    InsertOne {
        document: Document,
    },
    InsertMany {
        documents: Vec<Document>,
        options: InsertManyCommandOptions,
    },
    UpdateOne {
        filter: Document,
        update: Document,
        #[serde(skip_serializing_if = "Option::is_none")]
        sort: Option<Document>,
        options: UpdateCommandOptions,
    },
    UpdateMany {
        filter: Document,
        update: Document,
        options: UpdateCommandOptions,
    },
    DeleteOne {
        filter: Document,
        #[serde(skip_serializing_if = "Option::is_none")]
        sort: Option<Document>,
    },
    DeleteMany {
        #[serde(skip_serializing_if = "Option::is_none")]
        filter: Option<Document>,
    },
    Find {
        filter: Document,
        #[serde(skip_serializing_if = "Option::is_none")]
        sort: Option<Document>,
        #[serde(skip_serializing_if = "Option::is_none")]
        projection: Option<Document>,
        options: FindCommandOptions,
    },
    FindOne {
        filter: Document,
        #[serde(skip_serializing_if = "Option::is_none")]
        sort: Option<Document>,
        #[serde(skip_serializing_if = "Option::is_none")]
        projection: Option<Document>,
        options: FindOneCommandOptions,
    },
    FindOneAndUpdate {
        filter: Document,
        update: Document,
        #[serde(skip_serializing_if = "Option::is_none")]
        sort: Option<Document>,
        #[serde(skip_serializing_if = "Option::is_none")]
        projection: Option<Document>,
        options: FindOneAndOptions,
    },
    FindOneAndReplace {
        filter: Document,
        replacement: Document,
        #[serde(skip_serializing_if = "Option::is_none")]
        sort: Option<Document>,
        #[serde(skip_serializing_if = "Option::is_none")]
        projection: Option<Document>,
        options: FindOneAndOptions,
    },
    FindOneAndDelete {
        filter: Document,
        #[serde(skip_serializing_if = "Option::is_none")]
        sort: Option<Document>,
        #[serde(skip_serializing_if = "Option::is_none")]
        projection: Option<Document>,
    },
    CountDocuments {
        filter: Document,
    },
    EstimatedDocumentCount {},
}

impl Command {
    /// The wire name of the command, e.g. `insertMany`.
    pub fn name(&self) -> &'static str {
        match self {
            Command::InsertOne { .. } => "insertOne",
            Command::InsertMany { .. } => "insertMany",
            Command::UpdateOne { .. } => "updateOne",
            Command::UpdateMany { .. } => "updateMany",
            Command::DeleteOne { .. } => "deleteOne",
            Command::DeleteMany { .. } => "deleteMany",
            Command::Find { .. } => "find",
            Command::FindOne { .. } => "findOne",
            Command::FindOneAndUpdate { .. } => "findOneAndUpdate",
            Command::FindOneAndReplace { .. } => "findOneAndReplace",
            Command::FindOneAndDelete { .. } => "findOneAndDelete",
            Command::CountDocuments { .. } => "countDocuments",
            Command::EstimatedDocumentCount {} => "estimatedDocumentCount",
        }
    }

    /// The continuation token carried by a paginated command, if any.
    pub fn page_state(&self) -> Option<&str> {
        match self {
            Command::UpdateMany { options, .. } => options.page_state.as_deref(),
            Command::Find { options, .. } => options.page_state.as_deref(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertManyCommandOptions {
    pub ordered: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCommandOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upsert: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_state: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FindCommandOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_similarity: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_sort_vector: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FindOneCommandOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_similarity: Option<bool>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ReturnDocument {
    #[default]
    Before,
    After,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FindOneAndOptions {
    pub return_document: ReturnDocument,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upsert: Option<bool>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn doc(value: serde_json::Value) -> Document {
        match value {
            serde_json::Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn insert_many_wire_shape() {
        let cmd = Command::InsertMany {
            documents: vec![doc(json!({ "_id": 1 }))],
            options: InsertManyCommandOptions { ordered: true },
        };
        assert_eq!(
            serde_json::to_value(&cmd).unwrap(),
            json!({ "insertMany": { "documents": [{ "_id": 1 }], "options": { "ordered": true } } })
        );
    }

    #[test]
    fn find_skips_unset_fields() {
        let cmd = Command::Find {
            filter: doc(json!({ "status": "active" })),
            sort: None,
            projection: None,
            options: FindCommandOptions {
                page_state: Some("abc".into()),
                ..Default::default()
            },
        };
        assert_eq!(
            serde_json::to_value(&cmd).unwrap(),
            json!({ "find": { "filter": { "status": "active" }, "options": { "pageState": "abc" } } })
        );
        assert_eq!(cmd.page_state(), Some("abc"));
    }

    #[test]
    fn delete_all_has_empty_body() {
        let cmd = Command::DeleteMany { filter: None };
        assert_eq!(serde_json::to_value(&cmd).unwrap(), json!({ "deleteMany": {} }));
    }

    #[test]
    fn estimated_count_has_empty_body() {
        let cmd = Command::EstimatedDocumentCount {};
        assert_eq!(
            serde_json::to_value(&cmd).unwrap(),
            json!({ "estimatedDocumentCount": {} })
        );
        assert_eq!(cmd.name(), "estimatedDocumentCount");
    }

    #[test]
    fn find_one_and_replace_return_document() {
        let cmd = Command::FindOneAndReplace {
            filter: Document::new(),
            replacement: doc(json!({ "a": 1 })),
            sort: None,
            projection: Some(doc(json!({ "*": 0 }))),
            options: FindOneAndOptions {
                return_document: ReturnDocument::Before,
                upsert: Some(true),
            },
        };
        let value = serde_json::to_value(&cmd).unwrap();
        assert_eq!(
            value["findOneAndReplace"]["options"],
            json!({ "returnDocument": "before", "upsert": true })
        );
        assert_eq!(value["findOneAndReplace"]["projection"], json!({ "*": 0 }));
    }
}
