use std::{env, fs, process};

use tessera_client::ClientConfig;
use tessera_collection::{DataApiError, Db, Document, InsertManyOptions, document};

fn fail(message: impl std::fmt::Display) -> ! {
    tracing::error!("{message}");
    process::exit(1);
}

fn load_documents(path: &str) -> Vec<Document> {
    let data = fs::read_to_string(path).unwrap_or_else(|e| fail(format!("failed to read {path}: {e}")));
    let values: Vec<serde_json::Value> = serde_json::from_str(&data)
        .unwrap_or_else(|e| fail(format!("{path} is not a JSON array: {e}")));
    values
        .into_iter()
        .map(document)
        .collect::<Result<_, _>>()
        .unwrap_or_else(|e| fail(format!("{path}: {e}")))
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = ClientConfig::from_env().unwrap_or_else(|e| fail(e));
    let name = env::var("TESSERA_COLLECTION").unwrap_or_else(|_| fail("TESSERA_COLLECTION must be set"));
    let path = env::var("TESSERA_LOAD_FILE").unwrap_or_else(|_| fail("TESSERA_LOAD_FILE must be set"));
    let ordered = env::var("TESSERA_LOAD_ORDERED").is_ok_and(|v| v == "true" || v == "1");

    let documents = load_documents(&path);
    let db = Db::connect(&config).unwrap_or_else(|e| fail(e));
    let collection = db.collection(&name);

    tracing::info!(
        keyspace = db.keyspace(),
        collection = %name,
        documents = documents.len(),
        ordered,
        "loading {path}"
    );

    let options = InsertManyOptions {
        ordered,
        ..Default::default()
    };
    match collection.insert_many(documents, options).await {
        Ok(result) => tracing::info!(inserted = result.inserted_count, "load complete"),
        Err(DataApiError::InsertMany(err)) => {
            for detail in err.detailed_error_descriptors() {
                for descriptor in &detail.error_descriptors {
                    tracing::warn!(
                        code = descriptor.error_code.as_deref().unwrap_or("UNKNOWN"),
                        "{}",
                        descriptor.message.as_deref().unwrap_or_default()
                    );
                }
            }
            fail(format!(
                "load stopped after {} documents: {err}",
                err.partial_result().inserted_count
            ));
        }
        Err(e) => fail(e),
    }
}
