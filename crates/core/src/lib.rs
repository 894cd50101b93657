// Crawlq Core - Queue logic, domain model and ports
// NO infrastructure dependencies (storage backends live in adapter crates)

pub mod application;
pub mod domain;
pub mod error;
pub mod port;
pub mod storage;

pub use application::{Queue, QueueMetrics};
pub use domain::CrawlRequest;
pub use error::{QueueError, Result};
pub use storage::InMemoryStorage;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
