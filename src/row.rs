//! Flat output rows and the local timestamp type they carry.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Serialize, Serializer};

/// `2026-03-01 13:00:00-07:00`. The colon in the offset keeps spreadsheet
/// importers from reading the offset as part of the time.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%:z";

/// Column names, in output order.
pub const HEADER: [&str; 7] = [
    "title",
    "start_local",
    "end_local",
    "categories",
    "host_company",
    "primary_venue",
    "event_url",
];

/// An instant expressed in a named local timezone.
///
/// Ordering and equality follow the underlying instant.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct CivilTimestamp(pub DateTime<Tz>);

impl CivilTimestamp {
    pub fn from_utc(instant: DateTime<Utc>, tz: Tz) -> Self {
        Self(tz.from_utc_datetime(&instant.naive_utc()))
    }
}

impl fmt::Display for CivilTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(TIMESTAMP_FORMAT))
    }
}

impl Serialize for CivilTimestamp {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

/// One normalized event, ready for CSV output. `None` fields serialize as
/// empty cells.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputRow {
    pub title: Option<String>,
    pub start_local: Option<CivilTimestamp>,
    pub end_local: Option<CivilTimestamp>,
    pub categories: String,
    pub host_company: Option<String>,
    pub primary_venue: String,
    pub event_url: String,
}

impl OutputRow {
    /// Compare by start time, rows without a start last.
    pub fn cmp_by_start(&self, other: &Self) -> Ordering {
        match (&self.start_local, &other.start_local) {
            (Some(a), Some(b)) => a.cmp(b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}
