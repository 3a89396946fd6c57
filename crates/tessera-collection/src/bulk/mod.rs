//! Multi-request write operations: chunked inserts, paginated
//! updates/deletes and heterogeneous bulk writes.

mod insert;
mod paginate;
mod scheduler;
mod write;

pub use write::BulkWriteOperation;
