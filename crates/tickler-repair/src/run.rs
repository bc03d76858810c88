//! A complete repair run over one table.
//!
//! ```text
//! Start → SchemaLoaded → QueriesBuilt → Streaming → Completed
//!   └──────────┴──────────────┴─────────────┴──────→ Failed
//! ```
//!
//! Enumeration and repair are interleaved on a single task: the next
//! partition key is pulled only after the previous repair read and its
//! throttle pause have finished. There is no resume state; a failed run
//! starts over from the first partition.

use std::fmt;

use serde::Deserialize;
use tickler_types::PartitionKeyTuple;
use tokio::time::Duration;
use tracing::{error, info, warn};

use crate::driver::RepairDriver;
use crate::enumerator::PartitionEnumerator;
use crate::error::RepairError;
use crate::progress::ProgressReporter;
use crate::query::{QueryOptions, build_queries};
use crate::schema::{describe_partition_key, normalize_identifier};
use crate::session::ClusterSession;
use crate::throttle::Throttle;

/// What to do when a single partition's repair read fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop the run at the first failure.
    #[default]
    Abort,
    /// Record the partition, keep going, and report it at the end.
    Continue,
}

/// Settings for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RepairOptions {
    /// Pause after each partition.
    pub delay: Duration,
    /// Consistency levels and page size.
    pub queries: QueryOptions,
    /// Failure handling.
    pub on_failure: FailurePolicy,
}

/// Lifecycle of a run, as reported in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    /// Created; nothing sent to the cluster yet.
    Start,
    /// Partition key read from the schema.
    SchemaLoaded,
    /// Enumeration and repair templates built.
    QueriesBuilt,
    /// Enumerating and repairing partitions.
    Streaming,
    /// Enumeration exhausted and the summary reported.
    Completed,
    /// Stopped on an unrecoverable error.
    Failed,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "start",
            Self::SchemaLoaded => "schema_loaded",
            Self::QueriesBuilt => "queries_built",
            Self::Streaming => "streaming",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Counters owned by the repair loop.
#[derive(Debug, Default)]
struct RunState {
    /// Partitions processed; only ever incremented.
    row_count: u64,
    /// Partitions skipped under [`FailurePolicy::Continue`].
    failed: Vec<PartitionKeyTuple>,
}

/// Result of a run that reached the end of the table.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Keyspace, as given.
    pub keyspace: String,
    /// Table, as given.
    pub table: String,
    /// Partitions processed.
    pub row_count: u64,
    /// Partitions whose repair read failed (continue policy only).
    pub failed: Vec<PartitionKeyTuple>,
}

impl RunSummary {
    /// Whether every enumerated partition was repaired.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Forces read repair across every partition of one table.
pub struct RepairRun<'a, S: ClusterSession> {
    session: &'a S,
    keyspace: String,
    table: String,
    options: RepairOptions,
    phase: RunPhase,
}

impl<'a, S: ClusterSession> RepairRun<'a, S> {
    /// Prepare a run. Nothing touches the cluster until [`execute`](Self::execute).
    pub fn new(
        session: &'a S,
        keyspace: impl Into<String>,
        table: impl Into<String>,
        options: RepairOptions,
    ) -> Self {
        Self {
            session,
            keyspace: keyspace.into(),
            table: table.into(),
            options,
            phase: RunPhase::Start,
        }
    }

    /// Run to completion, reporting progress to `reporter`.
    ///
    /// Consumes the run: a failed run is not resumable and must be started
    /// again from scratch.
    pub async fn execute<R: ProgressReporter>(
        mut self,
        reporter: &mut R,
    ) -> Result<RunSummary, RepairError> {
        match self.drive(reporter).await {
            Ok(summary) => {
                self.transition(RunPhase::Completed);
                info!(
                    keyspace = %self.keyspace,
                    table = %self.table,
                    rows = summary.row_count,
                    failed = summary.failed.len(),
                    "repair run complete"
                );
                Ok(summary)
            }
            Err(e) => {
                let failed_in = self.phase;
                self.transition(RunPhase::Failed);
                error!(phase = %failed_in, error = %e, "repair run failed");
                Err(e)
            }
        }
    }

    async fn drive<R: ProgressReporter>(
        &mut self,
        reporter: &mut R,
    ) -> Result<RunSummary, RepairError> {
        let session = self.session;
        let keyspace = normalize_identifier(&self.keyspace);
        let table = normalize_identifier(&self.table);

        let columns = describe_partition_key(session, &self.keyspace, &self.table).await?;
        self.transition(RunPhase::SchemaLoaded);

        let queries = build_queries(&columns, &keyspace, &table, &self.options.queries)?;
        info!(
            enumerate = %queries.enumerate.cql,
            enumerate_consistency = %queries.enumerate.consistency,
            repair = %queries.repair.cql,
            repair_consistency = %queries.repair.consistency,
            "queries built"
        );
        self.transition(RunPhase::QueriesBuilt);

        let throttle = Throttle::new(self.options.delay);
        let driver = RepairDriver::new(session, &queries.repair, &throttle);
        let mut partitions = PartitionEnumerator::new(session, &queries);
        let mut state = RunState::default();
        self.transition(RunPhase::Streaming);

        while let Some(partition_key) = partitions.next_tuple().await? {
            match driver.repair(&partition_key).await {
                Ok(_) => {}
                Err(e) if self.options.on_failure == FailurePolicy::Continue => {
                    warn!(partition = %partition_key, error = %e, "skipping partition");
                    reporter.on_partition_failed(&partition_key, &e);
                    state.failed.push(partition_key);
                    driver.throttle().pause().await;
                }
                Err(e) => return Err(e),
            }

            state.row_count += 1;
            reporter.on_tuple_processed(state.row_count);
        }

        info!(pages = partitions.pages_fetched(), "enumeration exhausted");
        reporter.on_completion(&self.table, state.row_count);
        if !state.failed.is_empty() {
            reporter.on_failures(&state.failed);
        }

        Ok(RunSummary {
            keyspace: self.keyspace.clone(),
            table: self.table.clone(),
            row_count: state.row_count,
            failed: state.failed,
        })
    }

    fn transition(&mut self, next: RunPhase) {
        info!(from = %self.phase, to = %next, "repair run phase");
        self.phase = next;
    }
}
