//! Offset pagination over the listing API.
//!
//! Pages are requested strictly one after another. The loop ends when the
//! server-reported total has been collected or a page comes back empty.

use std::num::NonZeroU32;

use crate::client::Transport;
use crate::error::FetchError;
use crate::event::RawEvent;
use crate::query::QueryDescriptor;

/// Page size used when none is configured.
pub const DEFAULT_PAGE_SIZE: NonZeroU32 = match NonZeroU32::new(200) {
    Some(size) => size,
    None => unreachable!(),
};

/// Fetch every record matching `query`'s filter, in server order.
///
/// Forces `limit = page_size` and `count = true`. The first request carries
/// no `skip`; each following request skips what has been collected so far.
/// Any failed request aborts the whole fetch.
pub async fn fetch_all<T: Transport>(
    transport: &T,
    mut query: QueryDescriptor,
    page_size: NonZeroU32,
) -> Result<Vec<RawEvent>, FetchError> {
    query.set_limit(u64::from(page_size.get()));
    query.set_count(true);

    let first = transport.fetch_page(&query.render()).await?.docs;
    let total = first.count;
    let mut records = first.docs;
    let mut requests = 1_u64;
    tracing::debug!(total, batch = records.len(), "Fetched first listing page");

    while !records.is_empty() && (records.len() as u64) < total {
        let skip = records.len() as u64;
        query.set_skip(skip);

        let page = transport.fetch_page(&query.render()).await?.docs;
        requests += 1;
        tracing::debug!(skip, total, batch = page.docs.len(), "Fetched listing page");

        if page.docs.is_empty() {
            tracing::warn!(
                fetched = records.len(),
                total,
                "Listing page came back empty before reaching the reported total"
            );
            break;
        }
        records.extend(page.docs);
    }

    tracing::info!(records = records.len(), total, requests, "Listing fetch complete");
    Ok(records)
}
