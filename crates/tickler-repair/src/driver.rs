//! Per-partition repair reads.
//!
//! The driver binds one partition key into the repair template and executes
//! it at the template's consistency (normally `ALL`). The result is thrown
//! away: the count is computed server-side and the only effect that matters
//! is the replica reconciliation the read forces. After a successful read the
//! driver waits on the [`Throttle`] before handing control back.

use tickler_types::PartitionKeyTuple;
use tokio::time::{Duration, Instant};
use tracing::debug;

use crate::error::RepairError;
use crate::query::QueryTemplate;
use crate::session::ClusterSession;
use crate::throttle::Throttle;

/// Timing of one repair read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepairOutcome {
    /// When the read was issued.
    pub started_at: Instant,
    /// How long the read took, excluding the throttle pause.
    pub elapsed: Duration,
}

/// Executes repair reads one partition at a time.
pub struct RepairDriver<'a, S: ClusterSession> {
    session: &'a S,
    query: &'a QueryTemplate,
    throttle: &'a Throttle,
}

impl<'a, S: ClusterSession> RepairDriver<'a, S> {
    /// Create a driver for the run's repair template.
    pub fn new(session: &'a S, query: &'a QueryTemplate, throttle: &'a Throttle) -> Self {
        Self {
            session,
            query,
            throttle,
        }
    }

    /// The throttle applied between partitions.
    pub fn throttle(&self) -> &Throttle {
        self.throttle
    }

    /// Repair a single partition.
    ///
    /// 1. Bind every key column, in key order.
    /// 2. Execute the read and discard its result.
    /// 3. Pause for the throttle delay.
    ///
    /// A failed read returns [`RepairError::RepairFailed`] immediately,
    /// without pausing.
    #[tracing::instrument(skip(self, partition_key), fields(partition = %partition_key))]
    pub async fn repair(
        &self,
        partition_key: &PartitionKeyTuple,
    ) -> Result<RepairOutcome, RepairError> {
        debug_assert_eq!(
            partition_key.len(),
            self.query.bind_markers.len(),
            "partition key does not match the repair template"
        );

        let values = partition_key.values();
        let started_at = Instant::now();

        self.session
            .execute(self.query, &values)
            .await
            .map_err(|source| RepairError::RepairFailed {
                partition_key: partition_key.clone(),
                source,
            })?;

        let elapsed = started_at.elapsed();
        debug!(elapsed_ms = elapsed.as_millis() as u64, "partition read at {}", self.query.consistency);

        self.throttle.pause().await;

        Ok(RepairOutcome {
            started_at,
            elapsed,
        })
    }
}
