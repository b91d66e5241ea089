//! Build log processing for vercelscope
//!
//! This crate owns the log tailing cycle for the deployment currently being
//! viewed: one bounded historical fetch, then (while the deployment is still
//! building) one cancellable live tail resumed from the latest timestamp seen.

mod cursor;
mod feed;
mod parser;
mod stream;

pub use cursor::resume_cursor;
pub use feed::LogFeed;
pub use parser::EventStreamParser;
pub use stream::{LogStreamController, StampedUpdate, StreamPhase, StreamUpdate};

// Re-export types used in our public API
pub use vercelscope_types::LogEvent;
