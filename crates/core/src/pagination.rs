//! Aggregation of paginated remote collections.

use serde::{Deserialize, Serialize};
use std::future::Future;
use tracing::debug;

/// One bounded page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub offset: u64,
    pub limit: u64,
}

impl PageRequest {
    pub fn new(limit: u64, offset: u64) -> Self {
        Self { offset, limit }
    }
}

/// Fetch every page and concatenate the results in the order received.
///
/// Pages are requested one after another starting at offset 0. A page shorter
/// than `chunk_size` (including an empty one) ends the sequence. The first
/// failing page aborts the whole aggregation and nothing gathered so far is
/// returned.
pub async fn collect_all<T, E, F, Fut>(chunk_size: u64, mut fetch: F) -> Result<Vec<T>, E>
where
    F: FnMut(PageRequest) -> Fut,
    Fut: Future<Output = Result<Vec<T>, E>>,
{
    let chunk_size = chunk_size.max(1);
    let mut items = Vec::new();
    let mut offset = 0;
    let mut pages = 0u32;

    loop {
        let page = fetch(PageRequest::new(chunk_size, offset)).await?;
        pages += 1;

        let received = page.len() as u64;
        items.extend(page);

        if received < chunk_size {
            break;
        }
        offset += chunk_size;
    }

    debug!(pages, total = items.len(), chunk_size, "Aggregated paginated collection");
    Ok(items)
}
