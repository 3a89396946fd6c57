mod config;
mod error;
mod executor;
mod timeout;
mod transport;

pub use config::{BulkDefaults, ClientConfig};
pub use error::{ClientError, TimeoutKind};
pub use executor::{CommandExecutor, CommandTarget};
pub use timeout::{TimeoutDefaults, TimeoutManager};
pub use transport::HttpExecutor;
