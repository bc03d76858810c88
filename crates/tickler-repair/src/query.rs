//! Query synthesis from the partition key.
//!
//! Two templates are built once per run:
//!
//! - the **enumeration** query, `SELECT c1, c2 FROM ks.t;`, read at a relaxed
//!   level to discover every partition;
//! - the **repair** query, `SELECT COUNT(1) FROM ks.t WHERE c1 = :c1 AND c2 = :c2;`,
//!   read at `ALL` so the coordinator reconciles every replica.
//!
//! Both list the columns in the same order, which is also the order values
//! are bound in.

use std::borrow::Cow;

use tickler_types::{ColumnKey, Consistency};

use crate::error::RepairError;

/// Page size of the enumeration read.
pub const DEFAULT_PAGE_SIZE: i32 = 1000;

/// CQL keywords that cannot be used as bare identifiers.
const RESERVED_KEYWORDS: &[&str] = &[
    "add", "allow", "alter", "and", "apply", "asc", "authorize", "batch", "begin", "by",
    "columnfamily", "create", "delete", "desc", "describe", "drop", "entries", "execute", "from",
    "full", "grant", "if", "in", "index", "infinity", "insert", "into", "is", "keyspace", "limit",
    "modify", "nan", "norecursive", "not", "null", "of", "on", "or", "order", "primary", "rename",
    "replace", "revoke", "schema", "select", "set", "table", "to", "token", "truncate",
    "unlogged", "update", "use", "using", "view", "where", "with",
];

/// Tunables for the synthesized queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    /// Level of the enumeration read.
    pub enumerate_consistency: Consistency,
    /// Level of each repair read.
    pub repair_consistency: Consistency,
    /// Rows per enumeration page.
    pub page_size: i32,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            enumerate_consistency: Consistency::LocalQuorum,
            repair_consistency: Consistency::All,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// A parameterized statement together with how it must be executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTemplate {
    /// CQL text.
    pub cql: String,
    /// Consistency level for every execution.
    pub consistency: Consistency,
    /// Named bind markers, in bind order.
    pub bind_markers: Vec<String>,
    /// Page size, for paged reads.
    pub page_size: Option<i32>,
}

/// The pair of templates that drive a run, plus the key they were built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairQueries {
    /// Partition key columns, in key order.
    pub columns: Vec<ColumnKey>,
    /// Reads every partition key.
    pub enumerate: QueryTemplate,
    /// Reads one partition at full consistency.
    pub repair: QueryTemplate,
}

/// Build the enumeration and repair templates for `keyspace.table`.
///
/// `keyspace` and `table` are the normalized (case-sensitive) names; they are
/// quoted in the output when CQL requires it.
pub fn build_queries(
    columns: &[ColumnKey],
    keyspace: &str,
    table: &str,
    options: &QueryOptions,
) -> Result<RepairQueries, RepairError> {
    if columns.is_empty() {
        return Err(RepairError::SchemaNotFound {
            keyspace: keyspace.to_string(),
            table: table.to_string(),
        });
    }

    let target = format!("{}.{}", quote_identifier(keyspace), quote_identifier(table));
    let names: Vec<Cow<'_, str>> = columns.iter().map(|c| quote_identifier(&c.name)).collect();

    let enumerate = QueryTemplate {
        cql: format!("SELECT {} FROM {target};", names.join(", ")),
        consistency: options.enumerate_consistency,
        bind_markers: Vec::new(),
        page_size: Some(options.page_size),
    };

    let predicate = names
        .iter()
        .map(|name| format!("{name} = :{name}"))
        .collect::<Vec<_>>()
        .join(" AND ");

    let repair = QueryTemplate {
        cql: format!("SELECT COUNT(1) FROM {target} WHERE {predicate};"),
        consistency: options.repair_consistency,
        bind_markers: columns.iter().map(|c| c.name.clone()).collect(),
        page_size: None,
    };

    Ok(RepairQueries {
        columns: columns.to_vec(),
        enumerate,
        repair,
    })
}

/// Render `name` as a CQL identifier, double-quoting it unless it is a plain
/// lowercase identifier that is not a reserved keyword.
pub fn quote_identifier(name: &str) -> Cow<'_, str> {
    let mut chars = name.chars();
    let plain = chars.next().is_some_and(|c| c.is_ascii_lowercase())
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        && !RESERVED_KEYWORDS.contains(&name);

    if plain {
        Cow::Borrowed(name)
    } else {
        Cow::Owned(format!("\"{}\"", name.replace('"', "\"\"")))
    }
}
