//! Forced read repair for a replicated CQL table.
//!
//! This crate provides:
//!
//! - [`describe_partition_key`] — reads a table's partition key from the live schema.
//! - [`build_queries`] — synthesizes the enumeration and repair templates.
//! - [`PartitionEnumerator`] — pages through every partition key at a relaxed level.
//! - [`RepairDriver`] — reads one partition at `ALL`, which makes the
//!   coordinator reconcile every replica, then waits on the [`Throttle`].
//! - [`ProgressReporter`] — observes progress; [`ConsoleReporter`] prints it.
//! - [`RepairRun`] — ties the stages together for one table.
//!
//! The cluster itself is reached through the [`ClusterSession`] trait.

#![warn(missing_docs)]

pub mod driver;
pub mod enumerator;
pub mod error;
pub mod progress;
pub mod query;
pub mod run;
pub mod schema;
pub mod session;
pub mod throttle;

pub use driver::{RepairDriver, RepairOutcome};
pub use enumerator::PartitionEnumerator;
pub use error::{RepairError, SessionError};
pub use progress::{ConsoleReporter, DEFAULT_REPORT_INTERVAL, ProgressReporter};
pub use query::{DEFAULT_PAGE_SIZE, QueryOptions, QueryTemplate, RepairQueries, build_queries};
pub use run::{FailurePolicy, RepairOptions, RepairRun, RunPhase, RunSummary};
pub use schema::{describe_partition_key, normalize_identifier};
pub use session::{ClusterSession, Page};
pub use throttle::Throttle;
