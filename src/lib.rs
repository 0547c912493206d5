//! Convention calendar export.
//!
//! Pulls every event matching a fixed listing query from the site's REST API,
//! page by page, flattens each record into a row with local start/end times,
//! and writes the rows as CSV sorted by start time.
//!
//! # Example
//!
//! ```no_run
//! use convention_export::{Config, ListingClient};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let client = ListingClient::new(config.timeout())?;
//!     let rows = convention_export::run(&client, &config, std::io::stdout()).await?;
//!     eprintln!("{rows} rows");
//!     Ok(())
//! }
//! ```

use std::fs;
use std::io::Write;

mod client;
mod config;
mod error;
mod event;
mod normalize;
mod paginator;
mod query;
mod row;

pub use client::{DEFAULT_TIMEOUT, ListingClient, Transport};
pub use config::{Config, DEFAULT_OUTPUT, SEED_QUERY_URL};
pub use error::{Error, FetchError, QueryError, Result};
pub use event::{Convention, ListingPage, ListingResponse, RawEvent};
pub use normalize::{
    DEFAULT_ORIGIN, DEFAULT_TIMEZONE, Normalizer, join_categories, normalize, parse_instant,
    primary_venue,
};
pub use paginator::{DEFAULT_PAGE_SIZE, fetch_all};
pub use query::{PAYLOAD_PARAM, QueryDescriptor, TOKEN_PARAM};
pub use row::{CivilTimestamp, HEADER, OutputRow, TIMESTAMP_FORMAT};

/// Fetch, normalize, and write the export to `writer`.
///
/// Nothing is written unless the whole fetch succeeds. Returns the number of
/// data rows written.
pub async fn run<T: Transport, W: Write>(transport: &T, config: &Config, writer: W) -> Result<usize> {
    let query = config.query()?;
    let events = fetch_all(transport, query, config.page_size).await?;
    let rows = config.normalizer().normalize(events);
    write_rows_csv(&rows, writer)?;
    Ok(rows.len())
}

/// Run the export into memory, then write it to `config.output`, creating
/// parent directories as needed. A failed fetch leaves any existing file
/// untouched.
pub async fn export<T: Transport>(transport: &T, config: &Config) -> Result<usize> {
    let mut buffer = Vec::new();
    let rows = run(transport, config, &mut buffer).await?;

    if let Some(parent) = config.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(&config.output, buffer)?;
    tracing::info!(path = %config.output.display(), rows, "Wrote export");
    Ok(rows)
}

/// Write rows as CSV with a header line.
fn write_rows_csv<W: Write>(rows: &[OutputRow], writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    if rows.is_empty() {
        // Header is normally derived from the first serialized row
        csv_writer.write_record(HEADER)?;
    }
    for row in rows {
        csv_writer.serialize(row)?;
    }

    csv_writer.flush()?;
    Ok(())
}
