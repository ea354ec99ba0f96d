//! Log source abstraction consumed by the streaming handler
//!
//! The embedding server supplies an implementation backed by its own log
//! storage (container runtime, log aggregator, ...). The handler only ever
//! filters and forwards what the requestor produces.

use crate::dto::{LogMessage, LogQuery};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Stream of log messages for one query. Dropping every sender ends the stream.
pub type LogStream = mpsc::Receiver<LogMessage>;

/// Submits log queries to the underlying logging system
#[async_trait]
pub trait LogRequestor: Send + Sync + 'static {
    /// Server side filtering, `true` keeps the message
    fn filter(&self, query: &LogQuery, message: &LogMessage) -> bool;

    /// Start producing messages for `query`.
    ///
    /// Producers must stop and drop their sender once `cancel` fires; the
    /// handler cancels it when the client goes away or the stream ends.
    async fn query(&self, cancel: CancellationToken, query: LogQuery) -> Result<LogStream>;
}

#[async_trait]
impl<R: LogRequestor> LogRequestor for Arc<R> {
    fn filter(&self, query: &LogQuery, message: &LogMessage) -> bool {
        (**self).filter(query, message)
    }

    async fn query(&self, cancel: CancellationToken, query: LogQuery) -> Result<LogStream> {
        (**self).query(cancel, query).await
    }
}
