//! Shared types for tickler.
//!
//! This crate defines the data model used across the tickler workspace:
//! schema types ([`ColumnKey`], [`ColumnRecord`], [`ColumnKind`]),
//! partition key values ([`ColumnType`], [`KeyValue`], [`PartitionKeyTuple`]),
//! and request settings ([`Consistency`]).

#![warn(missing_docs)]

mod error;
mod value;

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

pub use error::TypeError;
pub use value::{ColumnType, KeyValue};

// ---------------------------------------------------------------------------
// Schema types
// ---------------------------------------------------------------------------

/// A partition key column: its name and declared type.
///
/// The introspector produces these in partition key order; every later
/// stage relies on that order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnKey {
    /// Column name as stored in the schema (case preserved).
    pub name: String,
    /// Declared CQL type.
    pub column_type: ColumnType,
}

impl ColumnKey {
    /// Create a column key.
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }
}

/// The role a column plays in its table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    /// Part of the partition key.
    PartitionKey,
    /// Part of the clustering key.
    Clustering,
    /// An ordinary column.
    Regular,
    /// A static column (one value per partition).
    Static,
}

impl FromStr for ColumnKind {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "partition_key" => Ok(Self::PartitionKey),
            "clustering" => Ok(Self::Clustering),
            "regular" => Ok(Self::Regular),
            "static" => Ok(Self::Static),
            other => Err(TypeError::UnknownColumnKind(other.to_string())),
        }
    }
}

/// One column as described by the cluster's schema tables.
///
/// This is the raw form handed over by a session; the type name has not been
/// resolved yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRecord {
    /// Column name.
    pub name: String,
    /// Column role.
    pub kind: ColumnKind,
    /// Position within its kind (e.g. index in a composite partition key).
    pub position: i32,
    /// CQL type name as reported by the schema (e.g. `"int"`, `"text"`).
    pub type_name: String,
}

// ---------------------------------------------------------------------------
// Partition keys
// ---------------------------------------------------------------------------

/// The concrete partition key values of one partition, in column order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PartitionKeyTuple {
    entries: Vec<(String, KeyValue)>,
}

impl PartitionKeyTuple {
    /// Build a tuple from `(column, value)` pairs already in partition key order.
    pub fn new(entries: Vec<(String, KeyValue)>) -> Self {
        Self { entries }
    }

    /// Number of columns in the tuple.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the tuple has no columns.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(column, value)` pairs in partition key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &KeyValue)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Values in partition key order, ready for positional binding.
    pub fn values(&self) -> Vec<KeyValue> {
        self.entries.iter().map(|(_, value)| value.clone()).collect()
    }

    /// Look up the value of a column by name.
    pub fn get(&self, column: &str) -> Option<&KeyValue> {
        self.entries
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }
}

impl fmt::Display for PartitionKeyTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, (name, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        write!(f, ")")
    }
}

// ---------------------------------------------------------------------------
// Consistency
// ---------------------------------------------------------------------------

/// How many replicas must answer a request before it succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Consistency {
    /// A single replica.
    One,
    /// A single replica in the coordinator's datacenter.
    LocalOne,
    /// A majority of all replicas.
    Quorum,
    /// A majority of replicas in the coordinator's datacenter.
    LocalQuorum,
    /// A majority of replicas in every datacenter.
    EachQuorum,
    /// Every replica. Reads at this level reconcile divergent replicas.
    All,
}

impl Consistency {
    /// Return the CQL name of this level (e.g. `"LOCAL_QUORUM"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::One => "ONE",
            Self::LocalOne => "LOCAL_ONE",
            Self::Quorum => "QUORUM",
            Self::LocalQuorum => "LOCAL_QUORUM",
            Self::EachQuorum => "EACH_QUORUM",
            Self::All => "ALL",
        }
    }

    /// Number of replicas that must answer out of `replicas`.
    ///
    /// Treats the cluster as a single datacenter, so local and global
    /// variants coincide.
    pub fn required_replicas(&self, replicas: usize) -> usize {
        match self {
            Self::One | Self::LocalOne => 1.min(replicas),
            Self::Quorum | Self::LocalQuorum | Self::EachQuorum => replicas / 2 + 1,
            Self::All => replicas,
        }
    }
}

impl fmt::Display for Consistency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Consistency {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "one" => Ok(Self::One),
            "local_one" => Ok(Self::LocalOne),
            "quorum" => Ok(Self::Quorum),
            "local_quorum" => Ok(Self::LocalQuorum),
            "each_quorum" => Ok(Self::EachQuorum),
            "all" => Ok(Self::All),
            _ => Err(TypeError::UnknownConsistency(s.to_string())),
        }
    }
}
