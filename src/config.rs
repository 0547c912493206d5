//! Runtime configuration.
//!
//! No argument is required: every setting has a default matching the
//! published convention calendar, and each can be overridden by a flag or by
//! the matching `CONVENTION_EXPORT_*` environment variable (a `.env` file is
//! read by the binary).

use std::num::NonZeroU32;
use std::path::PathBuf;
use std::time::Duration;

use chrono_tz::Tz;
use clap::Parser;

use crate::client::DEFAULT_TIMEOUT;
use crate::error::QueryError;
use crate::normalize::{DEFAULT_ORIGIN, DEFAULT_TIMEZONE, Normalizer};
use crate::paginator::DEFAULT_PAGE_SIZE;
use crate::query::QueryDescriptor;

/// Default output file.
pub const DEFAULT_OUTPUT: &str = "data/conventions.csv";

/// Listing API query for upcoming conventions, as published by the site.
pub const SEED_QUERY_URL: &str = concat!(
    "https://www.visitsaltlake.com/includes/rest_v2/plugins_events_events/find/?json=",
    "%7B%22filter%22%3A%7B%22active%22%3Atrue%2C%22calendarid%22%3A%22conventions%22%2C%22%24",
    "and%22%3A%5B%7B%22categories.catId%22%3A%7B%22%24in%22%3A%5B%22conventions_2%22%2C%22con",
    "ventions_14%22%2C%22conventions_20%22%2C%22conventions_151%22%2C%22conventions_155%22%2C",
    "%22conventions_6%22%2C%22conventions_5%22%2C%22conventions_19%22%2C%22conventions_8%22%2",
    "C%22conventions_13%22%2C%22conventions_3%22%2C%22conventions_9%22%2C%22conventions_11%22",
    "%2C%22conventions_4%22%2C%22conventions_7%22%2C%22conventions_40%22%2C%22conventions_153",
    "%22%2C%22conventions_21%22%2C%22conventions_1%22%5D%7D%7D%5D%2C%22dates%22%3A%7B%22%24el",
    "emMatch%22%3A%7B%22eventDate%22%3A%7B%22%24gte%22%3A%7B%22%24date%22%3A%222025-09-18T06%",
    "3A00%3A00.000Z%22%7D%2C%22%24lte%22%3A%7B%22%24date%22%3A%222027-09-18T06%3A00%3A00.000Z",
    "%22%7D%7D%7D%7D%7D%2C%22options%22%3A%7B%22limit%22%3A25%2C%22count%22%3Atrue%2C%22castD",
    "ocs%22%3Afalse%2C%22fields%22%3A%7B%22_id%22%3A1%2C%22location%22%3A1%2C%22startDate%22%",
    "3A1%2C%22endDate%22%3A1%2C%22recurrence%22%3A1%2C%22categories%22%3A1%2C%22recurType%22%",
    "3A1%2C%22latitude%22%3A1%2C%22longitude%22%3A1%2C%22media_raw%22%3A1%2C%22recid%22%3A1%2",
    "C%22title%22%3A1%2C%22url%22%3A1%2C%22linkUrl%22%3A1%2C%22listing.title%22%3A1%2C%22list",
    "ing.url%22%3A1%2C%22udfs_object.3550%22%3A1%2C%22udfs_object.3638%22%3A1%2C%22convention",
    ".roomattend%22%3A1%2C%22convention.showattend%22%3A1%2C%22convention.hostcompany%22%3A1%",
    "2C%22convention.hosturl%22%3A1%2C%22convention.facilities_raw%22%3A1%2C%22convention_fac",
    "ilities_ids%22%3A1%2C%22convention_facilities.recid%22%3A1%2C%22convention_facilities.ti",
    "tle%22%3A1%2C%22convention_facilities.detail_type%22%3A1%2C%22convention_facilities.url%",
    "22%3A1%7D%2C%22hooks%22%3A%5B%22afterFind_convention_facilities%22%5D%2C%22sort%22%3A%7B",
    "%22startDate%22%3A1%2C%22title_sort%22%3A1%7D%7D%7D",
    "&token=9feaa8bf1573601ea1b096a94f2397a4",
);

/// Export settings.
#[derive(Debug, Clone, Parser)]
#[command(name = "convention-export")]
#[command(about = "Export the convention calendar to a CSV file")]
pub struct Config {
    /// Listing API URL carrying the JSON query in its `json` parameter
    #[arg(long, env = "CONVENTION_EXPORT_API_URL", default_value = SEED_QUERY_URL, hide_default_value = true)]
    pub api_url: String,

    /// Output CSV path
    #[arg(short, long, env = "CONVENTION_EXPORT_OUTPUT", default_value = DEFAULT_OUTPUT)]
    pub output: PathBuf,

    /// Records requested per page
    #[arg(long, env = "CONVENTION_EXPORT_PAGE_SIZE", default_value_t = DEFAULT_PAGE_SIZE)]
    pub page_size: NonZeroU32,

    /// Per-request timeout in seconds
    #[arg(long, env = "CONVENTION_EXPORT_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT.as_secs())]
    pub timeout_secs: u64,

    /// Site origin prefixed to relative event URLs
    #[arg(long, env = "CONVENTION_EXPORT_ORIGIN", default_value = DEFAULT_ORIGIN)]
    pub origin: String,

    /// IANA timezone for local start/end times
    #[arg(long, env = "CONVENTION_EXPORT_TIMEZONE", default_value = "America/Denver", value_parser = parse_timezone)]
    pub timezone: Tz,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: SEED_QUERY_URL.to_string(),
            output: PathBuf::from(DEFAULT_OUTPUT),
            page_size: DEFAULT_PAGE_SIZE,
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            origin: DEFAULT_ORIGIN.to_string(),
            timezone: DEFAULT_TIMEZONE,
        }
    }
}

impl Config {
    /// Parse the configured API URL into a query descriptor.
    pub fn query(&self) -> Result<QueryDescriptor, QueryError> {
        QueryDescriptor::parse(&self.api_url)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn normalizer(&self) -> Normalizer {
        Normalizer::new(self.origin.clone(), self.timezone)
    }
}

fn parse_timezone(name: &str) -> Result<Tz, String> {
    name.parse::<Tz>()
        .map_err(|_| format!("unknown timezone `{name}`"))
}
