//! Scylla driver adapter.
//!
//! [`ScyllaSession`] implements [`tickler_repair::ClusterSession`] on top of
//! the `scylla` driver:
//!
//! - Schema introspection reads `system_schema.columns`.
//! - Statements are prepared once per CQL text, with the template's
//!   consistency and page size applied.
//! - Enumeration pages are fetched one at a time with the driver's paging
//!   state as the cursor.

#![warn(missing_docs)]

mod convert;
mod session;

pub use convert::{from_cql_value, session_error, to_cql_value, to_driver_consistency};
pub use session::{ConnectOptions, Credentials, DEFAULT_PORT, ScyllaSession};
