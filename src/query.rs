//! The paged query carried inside the listing API URL.
//!
//! The API takes its whole query as one JSON document in the `json` URL
//! parameter: `{"filter": {...}, "options": {"limit": .., "skip": .., "count": ..}}`.
//! [`QueryDescriptor`] decodes that parameter once, lets the paginator adjust
//! the paging options, and re-encodes it. Every other part of the URL is kept
//! exactly as it appeared in the seed.

use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};
use url::Url;

use crate::error::QueryError;

/// Name of the URL parameter holding the JSON payload.
pub const PAYLOAD_PARAM: &str = "json";

/// Name of the URL parameter holding the access token.
pub const TOKEN_PARAM: &str = "token";

/// A decoded `{filter, options}` query embedded in a listing API URL.
///
/// Only the paging options (`limit`, `skip`, `count`) can be changed after
/// parsing. The filter is read-only.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryDescriptor {
    endpoint: Url,
    /// Raw `key=value` segments of the query string, in original order.
    segments: Vec<String>,
    payload_index: usize,
    payload: Map<String, Value>,
}

impl QueryDescriptor {
    /// Parse a listing API URL and decode its JSON payload.
    pub fn parse(input: &str) -> Result<Self, QueryError> {
        let endpoint = Url::parse(input)?;
        let segments: Vec<String> = endpoint
            .query()
            .unwrap_or_default()
            .split('&')
            .map(str::to_owned)
            .collect();

        let payload_index = segments
            .iter()
            .position(|segment| param_name(segment) == PAYLOAD_PARAM)
            .ok_or(QueryError::MissingPayload {
                param: PAYLOAD_PARAM,
            })?;
        let payload = decode_payload(param_value(&segments[payload_index]))?;

        Ok(Self {
            endpoint,
            segments,
            payload_index,
            payload,
        })
    }

    /// Re-encode the descriptor into a request URL.
    ///
    /// Only the payload segment is rebuilt; the other parameters are emitted
    /// verbatim and in their original position.
    pub fn render(&self) -> Url {
        let encoded = urlencoding::encode(&Value::Object(self.payload.clone()).to_string())
            .into_owned();
        let payload_segment = format!("{PAYLOAD_PARAM}={encoded}");

        let query = self
            .segments
            .iter()
            .enumerate()
            .map(|(index, segment)| {
                if index == self.payload_index {
                    payload_segment.as_str()
                } else {
                    segment.as_str()
                }
            })
            .collect::<Vec<_>>()
            .join("&");

        let mut url = self.endpoint.clone();
        url.set_query(Some(&query));
        url
    }

    /// The matching criteria. `None` if the seed carried no filter.
    pub fn filter(&self) -> Option<&Value> {
        self.payload.get("filter")
    }

    pub fn limit(&self) -> Option<u64> {
        self.option("limit").and_then(Value::as_u64)
    }

    pub fn skip(&self) -> Option<u64> {
        self.option("skip").and_then(Value::as_u64)
    }

    pub fn count(&self) -> Option<bool> {
        self.option("count").and_then(Value::as_bool)
    }

    /// The decoded access token parameter, if the URL has one.
    pub fn token(&self) -> Option<String> {
        self.segments
            .iter()
            .find(|segment| param_name(segment) == TOKEN_PARAM)
            .and_then(|segment| urlencoding::decode(param_value(segment)).ok())
            .map(|token| token.into_owned())
    }

    pub fn set_limit(&mut self, limit: u64) {
        self.set_option("limit", Value::from(limit));
    }

    pub fn set_skip(&mut self, skip: u64) {
        self.set_option("skip", Value::from(skip));
    }

    pub fn set_count(&mut self, count: bool) {
        self.set_option("count", Value::from(count));
    }

    fn option(&self, key: &str) -> Option<&Value> {
        self.payload.get("options")?.get(key)
    }

    /// Existing keys keep their position in the payload; new keys go last.
    fn set_option(&mut self, key: &str, value: Value) {
        let options = self
            .payload
            .entry("options")
            .or_insert_with(|| Value::Object(Map::new()));
        match options {
            Value::Object(map) => {
                map.insert(key.to_owned(), value);
            }
            other => {
                let mut map = Map::new();
                map.insert(key.to_owned(), value);
                *other = Value::Object(map);
            }
        }
    }
}

impl FromStr for QueryDescriptor {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for QueryDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}

fn param_name(segment: &str) -> &str {
    segment.split_once('=').map_or(segment, |(name, _)| name)
}

fn param_value(segment: &str) -> &str {
    segment.split_once('=').map_or("", |(_, value)| value)
}

/// Form-decode the payload parameter and parse it as a JSON object.
fn decode_payload(raw: &str) -> Result<Map<String, Value>, QueryError> {
    let spaced = raw.replace('+', " ");
    let text = urlencoding::decode(&spaced).map_err(QueryError::PayloadEncoding)?;
    match serde_json::from_str(&text).map_err(QueryError::PayloadJson)? {
        Value::Object(payload) => Ok(payload),
        _ => Err(QueryError::PayloadNotObject),
    }
}
