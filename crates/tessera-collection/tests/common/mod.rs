#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Value, json};
use tessera_client::{
    BulkDefaults, ClientError, CommandExecutor, CommandTarget, TimeoutDefaults, TimeoutManager,
};
use tessera_collection::{Collection, Document, ResponseEnvelope};
use tessera_protocol::Command;

pub const KEYSPACE: &str = "test_keyspace";
pub const COLLECTION: &str = "accounts";

type Handler = dyn Fn(usize, &Command) -> Result<ResponseEnvelope, ClientError> + Send + Sync;

/// Executor that answers from a closure and records every command it sees.
///
/// The handler gets the zero-based call number and the command. Each call
/// yields once before answering so concurrent workers interleave.
pub struct MockExecutor {
    handler: Box<Handler>,
    commands: Mutex<Vec<Command>>,
    issued: Mutex<Vec<u32>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl MockExecutor {
    pub fn new(
        handler: impl Fn(usize, &Command) -> Result<ResponseEnvelope, ClientError>
        + Send
        + Sync
        + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            handler: Box::new(handler),
            commands: Mutex::new(Vec::new()),
            issued: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        })
    }

    pub fn commands(&self) -> Vec<Command> {
        self.commands.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.commands.lock().unwrap().len()
    }

    /// The operation budget's request count as seen by each call. A budget
    /// shared across calls counts up; per-call budgets stay at 1.
    pub fn requests_issued(&self) -> Vec<u32> {
        self.issued.lock().unwrap().clone()
    }

    /// Most calls that were ever waiting on a response at once.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CommandExecutor for MockExecutor {
    async fn execute(
        &self,
        command: &Command,
        target: &CommandTarget,
        timeout: &TimeoutManager,
    ) -> Result<ResponseEnvelope, ClientError> {
        assert_eq!(target.keyspace, KEYSPACE);
        timeout.next_request_timeout()?;
        let call = {
            let mut commands = self.commands.lock().unwrap();
            self.issued.lock().unwrap().push(timeout.requests_issued());
            commands.push(command.clone());
            commands.len() - 1
        };
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        (self.handler)(call, command)
    }
}

pub fn collection(executor: Arc<MockExecutor>) -> Collection {
    Collection::new(
        executor,
        CommandTarget::collection(KEYSPACE, COLLECTION),
        TimeoutDefaults::default(),
        BulkDefaults::default(),
    )
}

pub fn doc(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        other => panic!("not an object: {other}"),
    }
}

pub fn ok(value: Value) -> Result<ResponseEnvelope, ClientError> {
    Ok(serde_json::from_value(value).unwrap())
}

pub fn soft_error(message: &str, status: Value) -> Result<ResponseEnvelope, ClientError> {
    ok(json!({
        "status": status,
        "errors": [{ "errorCode": "SERVER_ERROR", "message": message }]
    }))
}

/// The command's JSON body, i.e. the value under its name.
pub fn body(command: &Command) -> Value {
    serde_json::to_value(command).unwrap()[command.name()].clone()
}

/// Documents `{ "_id": 0 }` through `{ "_id": n - 1 }`.
pub fn numbered(n: usize) -> Vec<Document> {
    (0..n).map(|i| doc(json!({ "_id": i }))).collect()
}

/// IDs of the documents in an `insertMany` command.
pub fn chunk_ids(command: &Command) -> Vec<Value> {
    match command {
        Command::InsertMany { documents, .. } => {
            documents.iter().map(|d| d["_id"].clone()).collect()
        }
        other => panic!("expected insertMany, got {}", other.name()),
    }
}
