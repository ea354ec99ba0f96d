//! SIEM Log Stream
//!
//! Streams workload log messages over HTTP as newline-delimited JSON.
//!
//! The crate owns the request/response protocol only: parsing a log query
//! from a GET query string or a JSON POST body, and forwarding the messages
//! produced by an embedder-supplied [`LogRequestor`] to the client as they
//! arrive. Log storage, authentication and server startup belong to the
//! embedding service.
//!
//! ```rust,no_run
//! use siem_log_stream::{router, LogHandler, LogMessage, LogQuery, LogRequestor, LogStream};
//! use tokio_util::sync::CancellationToken;
//!
//! struct Backlog;
//!
//! #[async_trait::async_trait]
//! impl LogRequestor for Backlog {
//!     fn filter(&self, _query: &LogQuery, _message: &LogMessage) -> bool {
//!         true
//!     }
//!
//!     async fn query(&self, _cancel: CancellationToken, query: LogQuery) -> anyhow::Result<LogStream> {
//!         let (tx, rx) = tokio::sync::mpsc::channel(16);
//!         tx.send(LogMessage { name: query.name, ..LogMessage::default() }).await?;
//!         Ok(rx)
//!     }
//! }
//!
//! # async fn serve() -> anyhow::Result<()> {
//! let app = router(LogHandler::new(Backlog));
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod dto;
pub mod error;
pub mod handler;
pub mod parser;
pub mod requestor;
pub mod sink;

pub use config::StreamConfig;
pub use dto::{LogMessage, LogQuery};
pub use error::{LogStreamError, ParseError};
pub use handler::{
    encode_line, router, stream_messages, LogHandler, StreamOutcome, NDJSON_CONTENT_TYPE,
    SERIALIZE_FAILURE_TEXT,
};
pub use parser::{parse_bool, parse_query_string, parse_request, Rejected};
pub use requestor::{LogRequestor, LogStream};
pub use sink::{ChannelSink, ResponseSink, SinkError};
