//! Raw event records as returned by the listing API.
//!
//! The service's documents are loosely typed, so every field of [`RawEvent`]
//! is optional. Pass-through fields (`title`, `hostcompany`) keep whatever
//! JSON value the service sent; structured fields are decoded leniently, so
//! a value of the wrong JSON type reads as `None` rather than rejecting the
//! record.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Response envelope: `{"docs": {"count": <total>, "docs": [...]}}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingResponse {
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub docs: ListingPage,
}

/// One page of results plus the server-reported total match count.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingPage {
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub count: u64,
    #[serde(default, deserialize_with = "events")]
    pub docs: Vec<RawEvent>,
}

/// Convention details nested under `convention`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Convention {
    #[serde(default)]
    pub hostcompany: Option<Value>,
}

/// One event document.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawEvent {
    #[serde(default)]
    pub title: Option<Value>,
    /// Absolute start instant; format owned by the service.
    #[serde(rename = "startDate", default)]
    pub start_date: Option<Value>,
    #[serde(rename = "endDate", default)]
    pub end_date: Option<Value>,
    /// Category entries; only objects carrying `catName` are meaningful.
    #[serde(default, deserialize_with = "lenient")]
    pub categories: Option<Vec<Value>>,
    #[serde(default, deserialize_with = "lenient")]
    pub convention: Option<Convention>,
    /// Associated venues, first one is the primary venue.
    #[serde(rename = "convention_facilities", default, deserialize_with = "lenient")]
    pub facilities: Option<Vec<Value>>,
    #[serde(default, deserialize_with = "lenient")]
    pub url: Option<String>,
}

impl RawEvent {
    /// Decode an event from an arbitrary JSON value. Non-objects yield an
    /// empty event.
    pub fn from_value(value: Value) -> Self {
        serde_json::from_value(value).unwrap_or_default()
    }

    /// `hostcompany` of the nested convention, if any.
    pub fn host_company(&self) -> Option<&Value> {
        self.convention.as_ref()?.hostcompany.as_ref()
    }
}

/// Decode a field as `T`, treating a type mismatch as absent.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

fn lenient_or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    Ok(lenient(deserializer)?.unwrap_or_default())
}

/// Decode each document on its own; a malformed one becomes an empty event.
fn events<'de, D>(deserializer: D) -> Result<Vec<RawEvent>, D::Error>
where
    D: Deserializer<'de>,
{
    let values: Vec<Value> = lenient_or_default(deserializer)?;
    Ok(values.into_iter().map(RawEvent::from_value).collect())
}
