//! Log request parsing
//! Builds a `LogQuery` from GET query parameters or a JSON POST body

use crate::dto::LogQuery;
use crate::error::ParseError;
use axum::http::Method;
use chrono::{DateTime, Utc};
use thiserror::Error;
use url::form_urlencoded;

/// A failed parse, carrying whatever was populated before the failure
#[derive(Error, Debug)]
#[error("{error}")]
pub struct Rejected {
    pub query: LogQuery,
    #[source]
    pub error: ParseError,
}

impl Rejected {
    fn new(query: LogQuery, error: ParseError) -> Self {
        Self { query, error }
    }

    pub fn into_error(self) -> ParseError {
        self.error
    }
}

/// Parse a log request.
///
/// GET reads the query string, POST decodes the body as JSON. Any other
/// method yields a default query without error.
pub fn parse_request(
    method: &Method,
    raw_query: Option<&str>,
    body: &[u8],
) -> Result<LogQuery, Rejected> {
    if method == Method::GET {
        parse_query_string(raw_query.unwrap_or_default())
    } else if method == Method::POST {
        serde_json::from_slice(body)
            .map_err(|e| Rejected::new(LogQuery::default(), ParseError::InvalidBody(e)))
    } else {
        Ok(LogQuery::default())
    }
}

/// Parse a raw (still percent-encoded) query string into a `LogQuery`
pub fn parse_query_string(raw: &str) -> Result<LogQuery, Rejected> {
    let params = QueryParams::parse(raw);
    let mut query = LogQuery {
        name: params.value("name").to_string(),
        instance: params.value("instance").to_string(),
        ..LogQuery::default()
    };

    let limit = params.value("limit");
    if !limit.is_empty() {
        query.limit = match limit.parse() {
            Ok(limit) => limit,
            Err(source) => {
                let error = ParseError::InvalidLimit {
                    value: limit.to_string(),
                    source,
                };
                return Err(Rejected::new(query, error));
            }
        };
    }

    // unparsable flags fall back to false
    query.follow = parse_bool(params.value("follow")).unwrap_or(false);
    query.invert = parse_bool(params.value("invert")).unwrap_or(false);

    let since = params.value("since");
    if !since.is_empty() {
        query.since = match DateTime::parse_from_rfc3339(since) {
            Ok(since) => Some(since.with_timezone(&Utc)),
            Err(source) => {
                let error = ParseError::InvalidSince {
                    value: since.to_string(),
                    source,
                };
                return Err(Rejected::new(query, error));
            }
        };
    }

    // presence of the key matters here, an empty pattern is still a pattern
    query.pattern = params.last("pattern").map(str::to_string);

    Ok(query)
}

/// Permissive boolean parsing: 1, t, T, TRUE, true, True and their false counterparts
pub fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

/// Decoded query parameters in request order
struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    fn parse(raw: &str) -> Self {
        Self {
            pairs: form_urlencoded::parse(raw.as_bytes()).into_owned().collect(),
        }
    }

    /// Last value for `key`, if the key occurs at all
    fn last(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Last value for `key`, or the empty string when absent
    fn value(&self, key: &str) -> &str {
        self.last(key).unwrap_or_default()
    }
}
