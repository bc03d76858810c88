//! The seam between the repair core and a cluster driver.

use tickler_types::{ColumnRecord, KeyValue};

use crate::error::SessionError;
use crate::query::QueryTemplate;

/// One page of an enumeration read.
#[derive(Debug, Clone)]
pub struct Page<C> {
    /// Rows in result order; each row holds one cell per selected column.
    pub rows: Vec<Vec<Option<KeyValue>>>,
    /// Cursor for the following page, or `None` when this was the last one.
    pub next: Option<C>,
}

/// Abstracts the cluster driver so the repair core can be tested without a
/// live cluster.
///
/// A session is shared by every stage of a run and is used strictly
/// sequentially: at most one request is in flight at any time.
#[async_trait::async_trait]
pub trait ClusterSession: Send + Sync {
    /// Opaque paging position handed back by [`fetch_page`](Self::fetch_page).
    type Cursor: Send + Sync;

    /// Read the column records of `keyspace.table` from the live schema.
    ///
    /// Names are passed already normalized (case-sensitive). An absent table
    /// yields an empty list.
    async fn describe_columns(
        &self,
        keyspace: &str,
        table: &str,
    ) -> Result<Vec<ColumnRecord>, SessionError>;

    /// Fetch one page of `query`, starting at `cursor` (or at the beginning).
    ///
    /// The query's consistency level and page size apply.
    async fn fetch_page(
        &self,
        query: &QueryTemplate,
        cursor: Option<Self::Cursor>,
    ) -> Result<Page<Self::Cursor>, SessionError>;

    /// Execute `query` once with `values` bound positionally, discarding the
    /// result.
    async fn execute(&self, query: &QueryTemplate, values: &[KeyValue]) -> Result<(), SessionError>;
}
