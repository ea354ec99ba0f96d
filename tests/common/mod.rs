use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use siem_log_stream::{LogMessage, LogQuery, LogRequestor, LogStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// In-memory requestor replaying a fixed backlog.
///
/// Follow queries keep the stream open after the backlog until cancelled.
/// Filtering keeps messages containing the query pattern (or not, when inverted).
#[derive(Clone, Default)]
pub struct ScriptedRequestor {
    backlog: Vec<LogMessage>,
    fail: bool,
    pub calls: Arc<AtomicUsize>,
    pub queries: Arc<Mutex<Vec<LogQuery>>>,
    pub tokens: Arc<Mutex<Vec<CancellationToken>>>,
}

impl ScriptedRequestor {
    pub fn with_backlog(texts: &[&str]) -> Self {
        let backlog = texts
            .iter()
            .enumerate()
            .map(|(i, text)| LogMessage {
                name: "foobar".to_string(),
                instance: format!("foobar-{}", i % 2),
                timestamp: Utc.with_ymd_and_hms(2019, 2, 16, 9, 10, i as u32).unwrap(),
                text: text.to_string(),
            })
            .collect();

        Self {
            backlog,
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_query(&self) -> Option<LogQuery> {
        self.queries.lock().unwrap().last().cloned()
    }

    pub fn last_token(&self) -> Option<CancellationToken> {
        self.tokens.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl LogRequestor for ScriptedRequestor {
    fn filter(&self, query: &LogQuery, message: &LogMessage) -> bool {
        match &query.pattern {
            Some(pattern) => message.text.contains(pattern.as_str()) != query.invert,
            None => true,
        }
    }

    async fn query(&self, cancel: CancellationToken, query: LogQuery) -> anyhow::Result<LogStream> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.clone());
        self.tokens.lock().unwrap().push(cancel.clone());

        if self.fail {
            anyhow::bail!("log backend unavailable");
        }

        let (tx, rx) = mpsc::channel(4);
        let backlog = self.backlog.clone();
        tokio::spawn(async move {
            for message in backlog {
                tokio::select! {
                    _ = cancel.cancelled() => return,
                    sent = tx.send(message) => if sent.is_err() { return },
                }
            }
            if query.follow {
                cancel.cancelled().await;
            }
        });

        Ok(rx)
    }
}
