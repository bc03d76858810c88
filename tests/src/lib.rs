//! Shared test harness for tickler integration tests.
//!
//! Provides [`SimulatedCluster`]: a single table replicated on three
//! in-memory replicas behind the [`ClusterSession`] seam. Reads are served
//! the way a coordinator would serve them:
//!
//! - A request fails with `Unavailable` when fewer replicas are up than its
//!   consistency level requires.
//! - A partition read merges the contacted replicas' versions, newest write
//!   wins, and writes the winner back to every contacted replica. At `ALL`
//!   that is every replica, which is what a forced read repair relies on.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use tickler_repair::{ClusterSession, Page, QueryTemplate, SessionError};
use tickler_types::*;
use tokio::time::Instant;
use tracing::debug;

/// Replication factor of the simulated keyspace.
pub const REPLICAS: usize = 3;

// =========================================================================
// Stored data
// =========================================================================

/// One replica's copy of a partition.
#[derive(Debug, Clone, PartialEq)]
pub struct Version {
    /// Partition key values, in key order.
    pub key: Vec<KeyValue>,
    /// The partition's single regular column.
    pub value: String,
    /// Write timestamp; the newest version wins on reconciliation.
    pub written_at: u64,
}

/// Partitions keyed by their encoded key, so iteration order is stable.
type Partitions = BTreeMap<Vec<u8>, Version>;

/// Encode a key the way the simulated storage orders it: each component as a
/// length-prefixed wire value.
pub fn encode_key(values: &[KeyValue]) -> Vec<u8> {
    let mut out = Vec::new();
    for value in values {
        let bytes = value.encode();
        out.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
        out.extend_from_slice(&bytes);
    }
    out
}

/// A repair read as seen by the cluster.
#[derive(Debug, Clone)]
pub struct ExecutionRecord {
    pub cql: String,
    pub consistency: Consistency,
    pub values: Vec<KeyValue>,
    pub at: Instant,
}

/// An enumeration page request as seen by the cluster.
#[derive(Debug, Clone)]
pub struct PageRecord {
    pub cql: String,
    pub consistency: Consistency,
    pub page_size: Option<i32>,
}

#[derive(Default)]
struct State {
    replicas: Vec<Partitions>,
    down: BTreeSet<usize>,
    clock: u64,
    /// Replica to take down right before the n-th (one-based) repair read.
    scheduled_outages: HashMap<usize, usize>,
    executions: Vec<ExecutionRecord>,
    pages: Vec<PageRecord>,
}

impl State {
    fn alive(&self) -> Vec<usize> {
        (0..self.replicas.len())
            .filter(|r| !self.down.contains(r))
            .collect()
    }

    /// The replicas a request at `consistency` contacts.
    fn contact(&self, consistency: Consistency) -> Result<Vec<usize>, SessionError> {
        let alive = self.alive();
        let required = consistency.required_replicas(self.replicas.len());
        if alive.len() < required {
            return Err(SessionError::Unavailable {
                consistency,
                required,
                alive: alive.len(),
            });
        }
        Ok(alive.into_iter().take(required).collect())
    }
}

// =========================================================================
// Simulated cluster
// =========================================================================

/// A three-replica table `keyspace.table` with the given partition key and
/// one regular `value text` column.
pub struct SimulatedCluster {
    keyspace: String,
    table: String,
    schema: Vec<ColumnRecord>,
    state: Mutex<State>,
}

impl SimulatedCluster {
    /// Create a table whose partition key columns are `(name, cql type)` in
    /// key order.
    pub fn new(keyspace: &str, table: &str, key: &[(&str, &str)]) -> Self {
        let mut schema: Vec<ColumnRecord> = key
            .iter()
            .enumerate()
            .map(|(position, (name, type_name))| ColumnRecord {
                name: name.to_string(),
                kind: ColumnKind::PartitionKey,
                position: position as i32,
                type_name: type_name.to_string(),
            })
            .collect();
        schema.push(ColumnRecord {
            name: "value".to_string(),
            kind: ColumnKind::Regular,
            position: -1,
            type_name: "text".to_string(),
        });
        // system_schema.columns is ordered by name, not by key position.
        schema.sort_by(|a, b| a.name.cmp(&b.name));

        Self {
            keyspace: keyspace.to_string(),
            table: table.to_string(),
            schema,
            state: Mutex::new(State {
                replicas: vec![Partitions::new(); REPLICAS],
                ..State::default()
            }),
        }
    }

    /// A table keyed by a single `id int` column.
    pub fn int_keyed(keyspace: &str, table: &str) -> Self {
        Self::new(keyspace, table, &[("id", "int")])
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("simulated cluster state poisoned")
    }

    /// Write a partition to every replica that is up.
    pub fn write(&self, key: Vec<KeyValue>, value: &str) {
        let replicas: Vec<usize> = self.state().alive();
        self.write_to(&replicas, key, value);
    }

    /// Write a partition to the listed replicas only.
    pub fn write_to(&self, replicas: &[usize], key: Vec<KeyValue>, value: &str) {
        let mut state = self.state();
        state.clock += 1;
        let version = Version {
            key: key.clone(),
            value: value.to_string(),
            written_at: state.clock,
        };
        let encoded = encode_key(&key);
        for &replica in replicas {
            state.replicas[replica].insert(encoded.clone(), version.clone());
        }
    }

    /// Mark a replica as down.
    pub fn take_down(&self, replica: usize) {
        self.state().down.insert(replica);
    }

    /// Mark a replica as up again.
    pub fn bring_up(&self, replica: usize) {
        self.state().down.remove(&replica);
    }

    /// Take `replica` down right before the `n`-th repair read (one-based).
    pub fn take_down_before_execution(&self, n: usize, replica: usize) {
        self.state().scheduled_outages.insert(n, replica);
    }

    /// The partitions stored on one replica, in storage order.
    pub fn replica_contents(&self, replica: usize) -> Vec<(Vec<KeyValue>, String)> {
        self.state().replicas[replica]
            .values()
            .map(|v| (v.key.clone(), v.value.clone()))
            .collect()
    }

    /// Whether every replica holds identical data.
    pub fn is_consistent(&self) -> bool {
        let state = self.state();
        state.replicas.windows(2).all(|pair| pair[0] == pair[1])
    }

    /// All repair reads received so far.
    pub fn executions(&self) -> Vec<ExecutionRecord> {
        self.state().executions.clone()
    }

    /// All enumeration pages served so far.
    pub fn pages(&self) -> Vec<PageRecord> {
        self.state().pages.clone()
    }
}

#[async_trait]
impl ClusterSession for SimulatedCluster {
    /// Encoded key of the last partition on the previous page.
    type Cursor = Vec<u8>;

    async fn describe_columns(
        &self,
        keyspace: &str,
        table: &str,
    ) -> Result<Vec<ColumnRecord>, SessionError> {
        if keyspace == self.keyspace && table == self.table {
            Ok(self.schema.clone())
        } else {
            Ok(Vec::new())
        }
    }

    async fn fetch_page(
        &self,
        query: &QueryTemplate,
        cursor: Option<Vec<u8>>,
    ) -> Result<Page<Vec<u8>>, SessionError> {
        let mut state = self.state();
        state.pages.push(PageRecord {
            cql: query.cql.clone(),
            consistency: query.consistency,
            page_size: query.page_size,
        });
        let contacted = state.contact(query.consistency)?;

        let mut merged: BTreeMap<&Vec<u8>, &Version> = BTreeMap::new();
        for &replica in &contacted {
            for (encoded, version) in &state.replicas[replica] {
                merged.entry(encoded).or_insert(version);
            }
        }

        let size = query.page_size.unwrap_or(i32::MAX).max(1) as usize;
        let mut remaining = merged
            .into_iter()
            .filter(|(encoded, _)| cursor.as_ref().is_none_or(|after| *encoded > after))
            .peekable();

        let mut rows: Vec<Vec<Option<KeyValue>>> = Vec::new();
        let mut last = None;
        while rows.len() < size {
            let Some((encoded, version)) = remaining.next() else {
                break;
            };
            rows.push(version.key.iter().cloned().map(Some).collect());
            last = Some(encoded.clone());
        }
        let next = if remaining.peek().is_some() { last } else { None };

        debug!(rows = rows.len(), more = next.is_some(), "served page");
        Ok(Page { rows, next })
    }

    async fn execute(&self, query: &QueryTemplate, values: &[KeyValue]) -> Result<(), SessionError> {
        let mut state = self.state();
        state.executions.push(ExecutionRecord {
            cql: query.cql.clone(),
            consistency: query.consistency,
            values: values.to_vec(),
            at: Instant::now(),
        });
        let n = state.executions.len();
        if let Some(replica) = state.scheduled_outages.remove(&n) {
            state.down.insert(replica);
        }

        let contacted = state.contact(query.consistency)?;
        let encoded = encode_key(values);

        let newest = contacted
            .iter()
            .filter_map(|&replica| state.replicas[replica].get(&encoded))
            .max_by_key(|version| version.written_at)
            .cloned();

        if let Some(newest) = newest {
            for &replica in &contacted {
                let stale = state.replicas[replica]
                    .get(&encoded)
                    .is_none_or(|v| v.written_at < newest.written_at);
                if stale {
                    debug!(replica, "read repair write-back");
                    state.replicas[replica].insert(encoded.clone(), newest.clone());
                }
            }
        }
        Ok(())
    }
}
