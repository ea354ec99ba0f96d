//! Data transfer objects for the log streaming endpoint
//! Defines the log query accepted from clients and the log records streamed back

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Log query submitted by a client, either as GET parameters or a POST body
///
/// `pattern` keeps "absent" and "empty" apart: `None` disables filtering,
/// `Some("")` is a real (match-everything) pattern.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogQuery {
    /// Workload name, required by the log source
    pub name: String,
    /// Optional instance id narrowing the query to one running instance
    pub instance: String,
    /// Inclusive lower bound on message time
    pub since: Option<DateTime<Utc>>,
    /// Maximum number of messages to return, <= 0 means unlimited
    pub limit: i64,
    /// Keep the stream open and tail new messages
    pub follow: bool,
    /// Optional regular expression used to filter messages
    pub pattern: Option<String>,
    /// Keep messages that do not match `pattern` instead of those that do
    pub invert: bool,
}

impl LogQuery {
    /// Create a query for the given workload with every other field defaulted
    pub fn for_workload(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Whether a positive message limit was requested
    pub fn is_limited(&self) -> bool {
        self.limit > 0
    }

    /// The message limit, if one applies
    pub fn max_messages(&self) -> Option<u64> {
        u64::try_from(self.limit).ok().filter(|limit| *limit > 0)
    }
}

impl fmt::Display for LogQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let since = self
            .since
            .map(|since| since.to_rfc3339())
            .unwrap_or_else(|| "-".to_string());
        let pattern = match &self.pattern {
            Some(pattern) => format!("{:?}", pattern),
            None => "-".to_string(),
        };
        write!(
            f,
            "name={} instance={} since={} limit={} follow={} pattern={} invert={}",
            self.name, self.instance, since, self.limit, self.follow, pattern, self.invert
        )
    }
}

/// One log record produced by the log source for a workload instance
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogMessage {
    /// Workload name
    pub name: String,
    /// Instance the message originated from
    pub instance: String,
    /// When the message was recorded
    pub timestamp: DateTime<Utc>,
    /// Raw message content
    pub text: String,
}

impl fmt::Display for LogMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({}) {}",
            self.timestamp.to_rfc3339(),
            self.name,
            self.instance,
            self.text
        )
    }
}
