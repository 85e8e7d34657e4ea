pub mod cancel;
pub mod client;
pub mod config;
pub mod driver;
pub mod error;
pub mod logger;
pub mod memory;
pub mod pacing;
pub mod sink;

// Exporting types for convenience
pub use cancel::CancelToken;
pub use client::{KaggleClient, SearchClient};
pub use driver::{LogReporter, Outcome, Reporter, SearchRun};
pub use error::ScalperError;
pub use memory::{HistoryStore, Memory, ResourceKind, SearchRecord};
pub use pacing::Pacing;
pub use sink::RecordSink;
