//! Output sinks
//!
//! Every projected page value is handed to a sink as soon as it is produced.

use crate::error::{Error, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::io::Write;
use tokio::sync::mpsc;

/// Output format for writer sinks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// One compact JSON document per line
    #[default]
    Json,
    /// Indented JSON, one document after another
    Pretty,
}

/// Receives projected values in emission order
#[async_trait]
pub trait OutputSink: Send {
    /// Accept one projected value
    async fn emit(&mut self, value: Value) -> Result<()>;

    /// Called once after the last value of a successful run
    async fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

// ============================================================================
// Collect Sink
// ============================================================================

/// Collects values in memory
#[derive(Debug, Default)]
pub struct CollectSink {
    values: Vec<Value>,
}

impl CollectSink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Values emitted so far
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Number of values emitted so far
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether nothing has been emitted
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Consume the sink, returning the values
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

#[async_trait]
impl OutputSink for CollectSink {
    async fn emit(&mut self, value: Value) -> Result<()> {
        self.values.push(value);
        Ok(())
    }
}

// ============================================================================
// Writer Sink
// ============================================================================

/// Serializes values to any `Write`, flushing after each one
#[derive(Debug)]
pub struct WriterSink<W> {
    writer: W,
    format: OutputFormat,
    emitted: usize,
}

impl<W: Write + Send> WriterSink<W> {
    /// Create a writer sink
    pub fn new(writer: W, format: OutputFormat) -> Self {
        Self {
            writer,
            format,
            emitted: 0,
        }
    }

    /// Number of values written
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    /// Consume the sink, returning the writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl WriterSink<std::io::Stdout> {
    /// Sink writing to standard output
    pub fn stdout(format: OutputFormat) -> Self {
        Self::new(std::io::stdout(), format)
    }
}

#[async_trait]
impl<W: Write + Send> OutputSink for WriterSink<W> {
    async fn emit(&mut self, value: Value) -> Result<()> {
        let text = match self.format {
            OutputFormat::Json => serde_json::to_string(&value)?,
            OutputFormat::Pretty => serde_json::to_string_pretty(&value)?,
        };
        writeln!(self.writer, "{text}")?;
        self.writer.flush()?;
        self.emitted += 1;
        Ok(())
    }

    async fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

// ============================================================================
// Channel Sink
// ============================================================================

/// Forwards values over a bounded channel
///
/// A full channel suspends the pagination loop, so a slow consumer throttles
/// page fetching instead of letting pages pile up in memory.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<Value>,
}

impl ChannelSink {
    /// Wrap an existing sender
    pub fn new(tx: mpsc::Sender<Value>) -> Self {
        Self { tx }
    }

    /// Create a sink and its receiving end
    pub fn bounded(capacity: usize) -> (Self, mpsc::Receiver<Value>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }
}

#[async_trait]
impl OutputSink for ChannelSink {
    async fn emit(&mut self, value: Value) -> Result<()> {
        self.tx
            .send(value)
            .await
            .map_err(|_| Error::output("output channel closed by receiver"))
    }
}
