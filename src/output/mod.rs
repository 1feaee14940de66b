//! Output module
//!
//! Destinations for projected page values:
//! - `CollectSink` - in-memory `Vec`
//! - `WriterSink` - JSON Lines or pretty JSON to any writer (stdout in the CLI)
//! - `ChannelSink` - bounded tokio channel with back-pressure

mod sink;

pub use sink::{ChannelSink, CollectSink, OutputFormat, OutputSink, WriterSink};
