//! HTTP handler streaming log messages as newline-delimited JSON
//!
//! One request runs through: transport check, request parsing, the log
//! query, then a message loop that forwards filtered messages to the
//! client until the stream ends, the limit is reached, the client leaves
//! or a write fails.

use crate::config::StreamConfig;
use crate::dto::{LogMessage, LogQuery};
use crate::error::{LogStreamError, ParseError};
use crate::parser::parse_request;
use crate::requestor::{LogRequestor, LogStream};
use crate::sink::{ChannelSink, ResponseSink, SinkError};
use axum::{
    extract::{Request, State},
    http::{
        header::{CONTENT_TYPE, TRANSFER_ENCODING},
        HeaderValue, Method, StatusCode, Version,
    },
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use bytes::Bytes;
use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Content type of the streamed response
pub const NDJSON_CONTENT_TYPE: &str = "application/x-ndjson";

/// Text of the line written when a message cannot be delivered mid-stream
pub const SERIALIZE_FAILURE_TEXT: &str = "failed to serialize log message";

/// How a message loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOutcome {
    /// The log source closed its stream
    Completed,
    /// The client went away
    Disconnected,
    /// The requested number of messages was sent
    LimitReached,
    /// A message could not be written; a fallback line was attempted
    Faulted,
}

/// Serves log queries from a `LogRequestor`
pub struct LogHandler<R> {
    requestor: Arc<R>,
    config: Arc<StreamConfig>,
    shutdown: CancellationToken,
}

impl<R> Clone for LogHandler<R> {
    fn clone(&self) -> Self {
        Self {
            requestor: Arc::clone(&self.requestor),
            config: Arc::clone(&self.config),
            shutdown: self.shutdown.clone(),
        }
    }
}

impl<R: LogRequestor> LogHandler<R> {
    pub fn new(requestor: R) -> Self {
        Self::with_config(requestor, StreamConfig::default())
    }

    pub fn with_config(requestor: R, config: StreamConfig) -> Self {
        Self {
            requestor: Arc::new(requestor),
            config: Arc::new(config),
            shutdown: CancellationToken::new(),
        }
    }

    /// Tie every query to a server-wide token; cancelling it stops all streams
    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Handle one log request
    pub async fn handle(&self, request: Request) -> Response {
        match self.start_stream(request).await {
            Ok(response) => response,
            Err(err) => err.into_response(),
        }
    }

    async fn start_stream(&self, request: Request) -> Result<Response, LogStreamError> {
        let version = request.version();
        if version < Version::HTTP_11 {
            warn!(
                "LogHandler: {:?} response cannot be chunked, required for streaming response",
                version
            );
            return Err(LogStreamError::TransportUnsupported);
        }

        let query = self.parse(request).await.map_err(|err| {
            warn!("LogHandler: could not parse the log request: {}", err);
            LogStreamError::Parse(err)
        })?;

        // Cancelled when the guard drops: on query failure right here,
        // otherwise when the streaming task finishes.
        let cancel = self.shutdown.child_token();
        let guard = cancel.clone().drop_guard();

        let messages = self
            .requestor
            .query(cancel, query.clone())
            .await
            .map_err(|err| {
                error!("LogHandler: log query for '{}' failed: {:#}", query.name, err);
                LogStreamError::Query(err)
            })?;

        let (sink, body) = ChannelSink::new(self.config.channel_capacity);
        let requestor = Arc::clone(&self.requestor);
        tokio::spawn(async move {
            let _guard = guard;
            let outcome = stream_messages(&*requestor, &query, messages, sink).await;
            debug!("LogHandler: stream for '{}' ended: {:?}", query.name, outcome);
        });

        let mut response = (
            StatusCode::OK,
            [(CONTENT_TYPE, HeaderValue::from_static(NDJSON_CONTENT_TYPE))],
            body,
        )
            .into_response();
        // HTTP/2 streams frames natively and forbids the header
        if version == Version::HTTP_11 {
            response
                .headers_mut()
                .insert(TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        }

        Ok(response)
    }

    async fn parse(&self, request: Request) -> Result<LogQuery, ParseError> {
        let (parts, body) = request.into_parts();
        let body = if parts.method == Method::POST {
            axum::body::to_bytes(body, self.config.max_body_bytes)
                .await
                .map_err(|err| ParseError::UnreadableBody(err.to_string()))?
        } else {
            Bytes::new()
        };

        parse_request(&parts.method, parts.uri.query(), &body).map_err(|rejected| {
            debug!("LogHandler: rejected partial query: {}", rejected.query);
            rejected.into_error()
        })
    }
}

/// Mount the handler on its configured route, for every method
pub fn router<R: LogRequestor>(handler: LogHandler<R>) -> Router {
    let route = handler.config.route.clone();
    Router::new()
        .route(&route, any(serve_logs::<R>))
        .with_state(handler)
}

async fn serve_logs<R: LogRequestor>(
    State(handler): State<LogHandler<R>>,
    request: Request,
) -> Response {
    handler.handle(request).await
}

#[derive(Error, Debug)]
enum WriteError {
    #[error("failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),

    #[error(transparent)]
    Sink(#[from] SinkError),
}

/// Encode a message as one JSON line
pub fn encode_line(message: &LogMessage) -> serde_json::Result<Bytes> {
    let mut line = serde_json::to_vec(message)?;
    line.push(b'\n');
    Ok(Bytes::from(line))
}

async fn write_message<S: ResponseSink>(sink: &mut S, message: &LogMessage) -> Result<(), WriteError> {
    let line = encode_line(message)?;
    sink.write_line(line).await?;
    Ok(())
}

/// Forward messages from `messages` to `sink` until the stream ends.
///
/// Waits on either the client disconnecting or the next message, checking
/// the disconnect first. Filtered-out messages do not count towards the
/// query limit. The sink is dropped on return, which ends the response body.
pub async fn stream_messages<R, S>(
    requestor: &R,
    query: &LogQuery,
    mut messages: LogStream,
    mut sink: S,
) -> StreamOutcome
where
    R: LogRequestor,
    S: ResponseSink,
{
    let limit = query.max_messages();
    if let Some(limit) = limit {
        info!("LogHandler: watch for and stream `{}` log messages", limit);
    }

    let mut sent: u64 = 0;
    loop {
        let next = tokio::select! {
            biased;
            _ = sink.closed() => None,
            message = messages.recv() => Some(message),
        };

        let message = match next {
            None => {
                debug!("LogHandler: client stopped listening");
                return StreamOutcome::Disconnected;
            }
            Some(None) => {
                debug!("LogHandler: end of log stream");
                return StreamOutcome::Completed;
            }
            Some(Some(message)) => message,
        };

        if !requestor.filter(query, &message) {
            continue;
        }

        match write_message(&mut sink, &message).await {
            Ok(()) => {}
            Err(WriteError::Sink(SinkError::Closed)) => {
                debug!("LogHandler: client stopped listening");
                return StreamOutcome::Disconnected;
            }
            Err(err) => {
                // headers are already sent, so report the failure in the body
                error!("LogHandler: failed to serialize log message: '{}': {}", message, err);
                let fallback = LogMessage {
                    name: query.name.clone(),
                    instance: String::new(),
                    timestamp: Utc::now(),
                    text: SERIALIZE_FAILURE_TEXT.to_string(),
                };
                if let Err(err) = write_message(&mut sink, &fallback).await {
                    debug!("LogHandler: could not write failure notice: {}", err);
                }
                return StreamOutcome::Faulted;
            }
        }

        if let Some(limit) = limit {
            sent += 1;
            if sent >= limit {
                info!("LogHandler: reached message limit '{}'", limit);
                return StreamOutcome::LimitReached;
            }
        }
    }
}
