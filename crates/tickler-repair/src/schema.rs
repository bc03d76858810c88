//! Partition key discovery from the live cluster schema.

use tickler_types::{ColumnKey, ColumnKind, ColumnRecord, ColumnType};
use tracing::debug;

use crate::error::RepairError;
use crate::session::ClusterSession;

/// Look up the ordered partition key of `keyspace.table`.
///
/// Names follow CQL case rules (see [`normalize_identifier`]). The schema is
/// read on every call; nothing is cached.
pub async fn describe_partition_key<S: ClusterSession>(
    session: &S,
    keyspace: &str,
    table: &str,
) -> Result<Vec<ColumnKey>, RepairError> {
    let keyspace = normalize_identifier(keyspace);
    let table = normalize_identifier(table);

    let records = session
        .describe_columns(&keyspace, &table)
        .await
        .map_err(|source| RepairError::Schema {
            keyspace: keyspace.clone(),
            table: table.clone(),
            source,
        })?;

    debug!(%keyspace, %table, columns = records.len(), "read table schema");
    partition_key_columns(&keyspace, &table, records)
}

/// Select the partition key columns from a table's column records, ordered by
/// position, and resolve their types.
pub fn partition_key_columns(
    keyspace: &str,
    table: &str,
    records: Vec<ColumnRecord>,
) -> Result<Vec<ColumnKey>, RepairError> {
    let mut keys: Vec<ColumnRecord> = records
        .into_iter()
        .filter(|r| r.kind == ColumnKind::PartitionKey)
        .collect();

    // A table always has a partition key, so no key means no table.
    if keys.is_empty() {
        return Err(RepairError::SchemaNotFound {
            keyspace: keyspace.to_string(),
            table: table.to_string(),
        });
    }

    keys.sort_by_key(|r| r.position);

    keys.into_iter()
        .map(|record| {
            let column_type = record.type_name.parse::<ColumnType>().map_err(|_| {
                RepairError::UnsupportedColumnType {
                    column: record.name.clone(),
                    type_name: record.type_name.clone(),
                }
            })?;
            Ok(ColumnKey::new(record.name, column_type))
        })
        .collect()
}

/// Apply CQL identifier rules: a double-quoted name is taken verbatim (with
/// `""` unescaped), anything else is folded to lowercase.
pub fn normalize_identifier(name: &str) -> String {
    match name
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
    {
        Some(inner) => inner.replace("\"\"", "\""),
        None => name.to_lowercase(),
    }
}
