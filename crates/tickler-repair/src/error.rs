//! Error types for repair runs.

use tickler_types::{Consistency, PartitionKeyTuple};

/// Errors reported by a [`ClusterSession`](crate::ClusterSession).
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Could not establish a session with the contact point.
    #[error("connection error: {0}")]
    Connect(String),

    /// Too few replicas were alive to satisfy the requested consistency.
    #[error("not enough replicas for {consistency}: required {required}, alive {alive}")]
    Unavailable {
        /// The consistency level of the failed request.
        consistency: Consistency,
        /// Replicas that had to answer.
        required: usize,
        /// Replicas that were alive.
        alive: usize,
    },

    /// The coordinator did not hear back from enough replicas in time.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// The request was rejected or failed on the server.
    #[error("query error: {0}")]
    Query(String),

    /// A result could not be converted into tickler's value model.
    #[error("decode error: {0}")]
    Decode(String),
}

/// Errors that terminate (or, under the continue policy, skip) repair work.
#[derive(Debug, thiserror::Error)]
pub enum RepairError {
    /// The contact point could not be reached.
    #[error("cannot connect to {contact_point}: {source}")]
    Connection {
        /// Address the session was opened against.
        contact_point: String,
        /// Underlying session failure.
        source: SessionError,
    },

    /// The keyspace or table is absent from the cluster schema.
    #[error("table {keyspace}.{table} not found")]
    SchemaNotFound {
        /// Requested keyspace.
        keyspace: String,
        /// Requested table.
        table: String,
    },

    /// Reading the schema tables failed.
    #[error("failed to read schema of {keyspace}.{table}: {source}")]
    Schema {
        /// Requested keyspace.
        keyspace: String,
        /// Requested table.
        table: String,
        /// Underlying session failure.
        source: SessionError,
    },

    /// A partition key column has a type tickler cannot bind.
    #[error("partition key column {column} has unsupported type {type_name}")]
    UnsupportedColumnType {
        /// Column name.
        column: String,
        /// Type as reported by the schema.
        type_name: String,
    },

    /// Fetching a page of partition keys failed.
    #[error("partition enumeration failed on page {page}: {source}")]
    QueryExecution {
        /// One-based page number.
        page: u64,
        /// Underlying session failure.
        source: SessionError,
    },

    /// An enumerated row did not match the declared partition key.
    #[error("cannot decode partition key column {column}: {reason}")]
    Decode {
        /// Column being decoded.
        column: String,
        /// What was wrong with it.
        reason: String,
    },

    /// The repair read for one partition failed.
    #[error("repair of partition {partition_key} failed: {source}")]
    RepairFailed {
        /// The partition whose read failed.
        partition_key: PartitionKeyTuple,
        /// Underlying session failure.
        source: SessionError,
    },

    /// The run finished but some partitions were skipped.
    #[error("{count} partition(s) could not be repaired")]
    PartitionsFailed {
        /// Number of skipped partitions.
        count: usize,
    },
}
