//! Result-set pagination over an open query.
//!
//! The protocol is caller-driven: after `execute`, fetch metadata. Zero
//! columns means the statement produced no row set, so the affected-row
//! count is fetched instead and no pages may be requested. Otherwise pages
//! are requested one at a time until an empty page arrives, at which point
//! the query is finished and no further pages may be requested.
//!
//! [`fetch_page`] packages one step of that protocol as the plain data a
//! renderer needs; it owns the auto-finish on exhaustion.

use crate::models::{PageMetadata, Row};
use crate::rpc::{RpcError, Transport};
use crate::session::Session;

/// One step of the pagination protocol.
#[derive(Debug, Clone, PartialEq)]
pub enum PageStep {
    /// A non-empty page; another page may be requested.
    Rows {
        metadata: PageMetadata,
        rows: Vec<Row>,
    },
    /// An empty page arrived. The query has been finished; no further
    /// pages may be requested.
    Exhausted { metadata: PageMetadata },
    /// The statement produced no row set; `count` rows were affected.
    Affected { count: i64 },
}

impl PageStep {
    /// Whether a renderer should keep its next-page affordance enabled.
    pub fn has_next_page(&self) -> bool {
        matches!(self, PageStep::Rows { .. })
    }
}

/// Advance the open query by one display page.
///
/// Metadata is re-fetched on every step; the proxy keeps it constant while
/// the cursor is open.
pub async fn fetch_page<T: Transport>(session: &mut Session<T>) -> Result<PageStep, RpcError> {
    let metadata = session.query_metadata().await?;
    if !metadata.is_row_set() {
        let count = session.query_result_count().await?;
        return Ok(PageStep::Affected { count });
    }

    let rows = session.query_next_page().await?;
    if rows.is_empty() {
        session.finish_query().await?;
        return Ok(PageStep::Exhausted { metadata });
    }
    Ok(PageStep::Rows { metadata, rows })
}
