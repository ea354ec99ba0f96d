//! Response sinks for streamed log lines

use async_trait::async_trait;
use axum::body::Body;
use bytes::Bytes;
use std::convert::Infallible;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("client closed the response stream")]
    Closed,

    #[error("failed to write response line: {0}")]
    Io(#[from] std::io::Error),
}

/// Destination for a streamed response body
#[async_trait]
pub trait ResponseSink: Send + Sync {
    /// Write one complete line and flush it to the client
    async fn write_line(&mut self, line: Bytes) -> Result<(), SinkError>;

    /// Resolves once the client has disconnected
    async fn closed(&self);
}

/// Sink feeding an axum response body through a bounded channel.
///
/// The transport drains the channel as it writes chunks, so with a small
/// capacity a successful `write_line` means the previous line has been
/// handed to the connection.
pub struct ChannelSink {
    tx: mpsc::Sender<Result<Bytes, Infallible>>,
}

impl ChannelSink {
    /// Create a sink and the response body it feeds
    pub fn new(capacity: usize) -> (Self, Body) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let body = Body::from_stream(ReceiverStream::new(rx));
        (Self { tx }, body)
    }
}

#[async_trait]
impl ResponseSink for ChannelSink {
    async fn write_line(&mut self, line: Bytes) -> Result<(), SinkError> {
        self.tx.send(Ok(line)).await.map_err(|_| SinkError::Closed)
    }

    async fn closed(&self) {
        self.tx.closed().await
    }
}
