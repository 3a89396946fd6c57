mod bulk;
mod collection;
mod cursor;
mod db;
mod distinct;
mod error;
mod options;
mod results;

pub use bulk::BulkWriteOperation;
pub use collection::Collection;
pub use cursor::{CursorState, FindCursor};
pub use db::Db;
pub use error::{
    BulkWriteError, CumulativeError, CursorError, DataApiError, DataApiResponseError,
    DeleteManyError, DetailedErrorDescriptor, InsertManyError, UpdateManyError,
};
pub use options::{
    BulkWriteOptions, DeleteManyOptions, DeleteOneOptions, FindOneAndDeleteOptions,
    FindOneAndModifyOptions, FindOneOptions, FindOptions, InsertManyOptions, ReplaceOneOptions,
    UpdateManyOptions, UpdateOneOptions,
};
pub use results::{
    BulkWriteResult, DeleteResult, InsertManyResult, InsertOneResult, UpdateResult,
};
pub use tessera_protocol::{Document, ErrorDescriptor, ResponseEnvelope, ReturnDocument};

/// Convert a JSON value into a [`Document`].
///
/// Fails with [`DataApiError::InvalidArgument`] unless the value is an object.
pub fn document(value: serde_json::Value) -> Result<Document, DataApiError> {
    match value {
        serde_json::Value::Object(map) => Ok(map),
        other => Err(DataApiError::InvalidArgument(format!(
            "expected a JSON object, got {other}"
        ))),
    }
}
