//! [`ClusterSession`] backed by the scylla driver.

use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use scylla::prepared_statement::PreparedStatement;
use scylla::query::Query;
use scylla::statement::{PagingState, PagingStateResponse};
use scylla::{Session, SessionBuilder};
use tickler_repair::{ClusterSession, Page, QueryTemplate, SessionError};
use tickler_types::{ColumnKind, ColumnRecord, Consistency, KeyValue};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::convert::{from_cql_value, session_error, to_cql_value, to_driver_consistency};

/// Native protocol port.
pub const DEFAULT_PORT: u16 = 9042;

const DESCRIBE_COLUMNS: &str = "SELECT column_name, kind, position, type \
     FROM system_schema.columns WHERE keyspace_name = ? AND table_name = ?";

/// `system_schema` is node-local, so one replica answers the schema read.
pub(crate) const SCHEMA_CONSISTENCY: Consistency = Consistency::One;

/// The schema read, pinned to [`SCHEMA_CONSISTENCY`].
pub(crate) fn describe_columns_query() -> Query {
    let mut query = Query::new(DESCRIBE_COLUMNS);
    query.set_consistency(to_driver_consistency(SCHEMA_CONSISTENCY));
    query
}

/// Username and password for `PasswordAuthenticator` clusters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Login role.
    pub username: String,
    /// Password for `username`.
    pub password: String,
}

/// How to reach the cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectOptions {
    /// Host name or address of one node; the driver discovers the rest.
    pub contact_point: String,
    /// Native protocol port of the contact point.
    pub port: u16,
    /// Sent when the cluster requires authentication.
    pub credentials: Option<Credentials>,
    /// Upper bound on establishing each connection.
    pub connect_timeout: Duration,
}

impl ConnectOptions {
    /// Defaults for `contact_point`: port 9042, no credentials, 5 s timeout.
    pub fn new(contact_point: impl Into<String>) -> Self {
        Self {
            contact_point: contact_point.into(),
            port: DEFAULT_PORT,
            credentials: None,
            connect_timeout: Duration::from_secs(5),
        }
    }

    /// `host:port`, bracketing bare IPv6 addresses.
    pub fn known_node(&self) -> String {
        if self.contact_point.contains(':') && !self.contact_point.starts_with('[') {
            format!("[{}]:{}", self.contact_point, self.port)
        } else {
            format!("{}:{}", self.contact_point, self.port)
        }
    }
}

/// A live driver session plus a cache of prepared statements.
pub struct ScyllaSession {
    session: Session,
    contact_point: String,
    /// Prepared statements keyed by CQL text.
    prepared: RwLock<HashMap<String, PreparedStatement>>,
}

impl ScyllaSession {
    /// Open a session against the contact point.
    pub async fn connect(options: &ConnectOptions) -> Result<Self, SessionError> {
        let node = options.known_node();
        info!(contact_point = %node, "connecting");

        let mut builder = SessionBuilder::new()
            .known_node(&node)
            .connection_timeout(options.connect_timeout);
        if let Some(credentials) = &options.credentials {
            builder = builder.user(&credentials.username, &credentials.password);
        }

        let session = builder
            .build()
            .await
            .map_err(|e| SessionError::Connect(e.to_string()))?;
        debug!(contact_point = %node, "session established");

        Ok(Self {
            session,
            contact_point: node,
            prepared: RwLock::new(HashMap::new()),
        })
    }

    /// Prepare `query` once and reuse it for every later call.
    async fn prepared(&self, query: &QueryTemplate) -> Result<PreparedStatement, SessionError> {
        if let Some(statement) = self.prepared.read().await.get(&query.cql) {
            return Ok(statement.clone());
        }

        let mut unprepared = Query::new(query.cql.clone());
        if let Some(page_size) = query.page_size {
            unprepared = unprepared.with_page_size(page_size);
        }
        let mut statement = self
            .session
            .prepare(unprepared)
            .await
            .map_err(|e| session_error(e, query.consistency))?;
        statement.set_consistency(to_driver_consistency(query.consistency));
        debug!(cql = %query.cql, consistency = %query.consistency, "prepared statement");

        self.prepared
            .write()
            .await
            .insert(query.cql.clone(), statement.clone());
        Ok(statement)
    }
}

impl Drop for ScyllaSession {
    fn drop(&mut self) {
        debug!(contact_point = %self.contact_point, "closing session");
    }
}

#[async_trait::async_trait]
impl ClusterSession for ScyllaSession {
    type Cursor = PagingState;

    async fn describe_columns(
        &self,
        keyspace: &str,
        table: &str,
    ) -> Result<Vec<ColumnRecord>, SessionError> {
        let result = self
            .session
            .query_unpaged(
                describe_columns_query(),
                (keyspace.to_string(), table.to_string()),
            )
            .await
            .map_err(|e| session_error(e, SCHEMA_CONSISTENCY))?;

        let rows = result
            .rows_typed::<(String, String, i32, String)>()
            .map_err(|e| SessionError::Decode(e.to_string()))?;

        let mut records = Vec::new();
        for row in rows {
            let (name, kind, position, type_name) =
                row.map_err(|e| SessionError::Decode(e.to_string()))?;
            let kind =
                ColumnKind::from_str(&kind).map_err(|e| SessionError::Decode(e.to_string()))?;
            records.push(ColumnRecord {
                name,
                kind,
                position,
                type_name,
            });
        }
        Ok(records)
    }

    async fn fetch_page(
        &self,
        query: &QueryTemplate,
        cursor: Option<PagingState>,
    ) -> Result<Page<PagingState>, SessionError> {
        let statement = self.prepared(query).await?;
        let (result, paging) = self
            .session
            .execute_single_page(&statement, (), cursor.unwrap_or_else(PagingState::start))
            .await
            .map_err(|e| session_error(e, query.consistency))?;

        let rows = result
            .rows_or_empty()
            .into_iter()
            .map(|row| {
                row.columns
                    .into_iter()
                    .map(|cell| cell.map(from_cql_value).transpose())
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;

        let next = match paging {
            PagingStateResponse::HasMorePages { state } => Some(state),
            PagingStateResponse::NoMorePages => None,
        };
        Ok(Page { rows, next })
    }

    async fn execute(&self, query: &QueryTemplate, values: &[KeyValue]) -> Result<(), SessionError> {
        let statement = self.prepared(query).await?;
        let bound: Vec<_> = values.iter().map(to_cql_value).collect();
        self.session
            .execute_unpaged(&statement, &bound[..])
            .await
            .map_err(|e| session_error(e, query.consistency))?;
        Ok(())
    }
}
