//! Paginated enumeration of every partition key in a table.
//!
//! [`PartitionEnumerator`] hides page boundaries: callers pull one
//! [`PartitionKeyTuple`] at a time and the next page is fetched only when the
//! current one is used up. The sequence is single-pass; a new enumerator
//! re-reads the table from the start and may observe a different snapshot.

use std::mem;
use std::vec;

use tickler_types::{ColumnKey, KeyValue, PartitionKeyTuple};
use tracing::debug;

use crate::error::RepairError;
use crate::query::{QueryTemplate, RepairQueries};
use crate::session::ClusterSession;

enum Position<C> {
    /// No page fetched yet.
    Start,
    /// More pages remain after the buffered one.
    More(C),
    /// Last page fetched, or enumeration aborted.
    Done,
}

/// Lazy, finite, single-pass sequence of partition keys.
pub struct PartitionEnumerator<'a, S: ClusterSession> {
    session: &'a S,
    query: &'a QueryTemplate,
    columns: &'a [ColumnKey],
    buffered: vec::IntoIter<Vec<Option<KeyValue>>>,
    position: Position<S::Cursor>,
    pages_fetched: u64,
}

impl<'a, S: ClusterSession> PartitionEnumerator<'a, S> {
    /// Prepare to enumerate using the run's enumeration template.
    pub fn new(session: &'a S, queries: &'a RepairQueries) -> Self {
        Self {
            session,
            query: &queries.enumerate,
            columns: &queries.columns,
            buffered: Vec::new().into_iter(),
            position: Position::Start,
            pages_fetched: 0,
        }
    }

    /// Number of pages fetched so far.
    pub fn pages_fetched(&self) -> u64 {
        self.pages_fetched
    }

    /// Return the next partition key, or `None` once the table is exhausted.
    ///
    /// A failed page fetch or an undecodable row ends the sequence: the
    /// error is returned once and every later call yields `None`.
    pub async fn next_tuple(&mut self) -> Result<Option<PartitionKeyTuple>, RepairError> {
        loop {
            if let Some(row) = self.buffered.next() {
                return match decode_row(self.columns, row) {
                    Ok(tuple) => Ok(Some(tuple)),
                    Err(e) => {
                        self.abort();
                        Err(e)
                    }
                };
            }

            let cursor = match mem::replace(&mut self.position, Position::Done) {
                Position::Start => None,
                Position::More(cursor) => Some(cursor),
                Position::Done => return Ok(None),
            };

            let page_number = self.pages_fetched + 1;
            let page = self
                .session
                .fetch_page(self.query, cursor)
                .await
                .map_err(|source| RepairError::QueryExecution {
                    page: page_number,
                    source,
                })?;
            self.pages_fetched = page_number;

            debug!(
                page = page_number,
                rows = page.rows.len(),
                last = page.next.is_none(),
                "fetched partition key page"
            );

            if let Some(cursor) = page.next {
                self.position = Position::More(cursor);
            }
            self.buffered = page.rows.into_iter();
        }
    }

    fn abort(&mut self) {
        self.buffered = Vec::new().into_iter();
        self.position = Position::Done;
    }
}

/// Turn one enumeration row into a tuple, checking it against the declared
/// partition key.
pub fn decode_row(
    columns: &[ColumnKey],
    row: Vec<Option<KeyValue>>,
) -> Result<PartitionKeyTuple, RepairError> {
    if row.len() != columns.len() {
        let column = columns
            .get(row.len())
            .map(|c| c.name.clone())
            .unwrap_or_else(|| "<row>".to_string());
        return Err(RepairError::Decode {
            column,
            reason: format!("expected {} cells, got {}", columns.len(), row.len()),
        });
    }

    let mut entries = Vec::with_capacity(columns.len());
    for (column, cell) in columns.iter().zip(row) {
        let value = cell.ok_or_else(|| RepairError::Decode {
            column: column.name.clone(),
            reason: "null partition key value".to_string(),
        })?;

        if value.column_type() != column.column_type {
            return Err(RepairError::Decode {
                column: column.name.clone(),
                reason: format!(
                    "declared {}, received {}",
                    column.column_type,
                    value.column_type()
                ),
            });
        }

        entries.push((column.name.clone(), value));
    }

    Ok(PartitionKeyTuple::new(entries))
}
