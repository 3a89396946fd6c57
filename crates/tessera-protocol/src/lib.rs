mod command;
mod response;

pub use command::{
    Command, FindCommandOptions, FindOneAndOptions, FindOneCommandOptions, InsertManyCommandOptions,
    ReturnDocument, UpdateCommandOptions,
};
pub use response::{ErrorDescriptor, ResponseData, ResponseEnvelope, Status};

/// A JSON document as exchanged with the Data API.
pub type Document = serde_json::Map<String, serde_json::Value>;
