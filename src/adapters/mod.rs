//! Local reference adapters
//!
//! File-backed implementations of the collaborator traits, enough to run the
//! full transform locally and to anchor tests. Cloud implementations live in
//! consumer crates.

mod sink;
mod source;

pub use sink::FileSink;
pub use source::JsonFileSource;
