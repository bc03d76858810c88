//! Conversions between the driver's types and tickler's.

use bytes::Bytes;
use scylla::statement::Consistency as DriverConsistency;
use scylla::transport::errors::{DbError, QueryError};
use scylla_cql::frame::response::result::CqlValue;
use scylla_cql::frame::value::{
    CqlDate, CqlDecimal, CqlTime, CqlTimestamp, CqlTimeuuid, CqlVarint,
};
use tickler_repair::SessionError;
use tickler_types::{Consistency, KeyValue};
use uuid::Uuid;

/// Map a consistency level onto the driver's.
pub fn to_driver_consistency(consistency: Consistency) -> DriverConsistency {
    match consistency {
        Consistency::One => DriverConsistency::One,
        Consistency::LocalOne => DriverConsistency::LocalOne,
        Consistency::Quorum => DriverConsistency::Quorum,
        Consistency::LocalQuorum => DriverConsistency::LocalQuorum,
        Consistency::EachQuorum => DriverConsistency::EachQuorum,
        Consistency::All => DriverConsistency::All,
    }
}

/// Convert a bound key value into the driver's value model.
pub fn to_cql_value(value: &KeyValue) -> CqlValue {
    match value {
        KeyValue::Ascii(s) => CqlValue::Ascii(s.clone()),
        KeyValue::Text(s) => CqlValue::Text(s.clone()),
        KeyValue::Boolean(b) => CqlValue::Boolean(*b),
        KeyValue::TinyInt(n) => CqlValue::TinyInt(*n),
        KeyValue::SmallInt(n) => CqlValue::SmallInt(*n),
        KeyValue::Int(n) => CqlValue::Int(*n),
        KeyValue::BigInt(n) => CqlValue::BigInt(*n),
        KeyValue::Float(f) => CqlValue::Float(*f),
        KeyValue::Double(f) => CqlValue::Double(*f),
        KeyValue::Timestamp(ms) => CqlValue::Timestamp(CqlTimestamp(*ms)),
        KeyValue::Date(days) => CqlValue::Date(CqlDate(*days)),
        KeyValue::Time(nanos) => CqlValue::Time(CqlTime(*nanos)),
        KeyValue::Uuid(u) => CqlValue::Uuid(*u),
        KeyValue::TimeUuid(u) => CqlValue::Timeuuid(CqlTimeuuid::from(*u)),
        KeyValue::Inet(addr) => CqlValue::Inet(*addr),
        KeyValue::Blob(b) => CqlValue::Blob(b.to_vec()),
        KeyValue::Varint(b) => CqlValue::Varint(CqlVarint::from_signed_bytes_be(b.to_vec())),
        KeyValue::Decimal { scale, unscaled } => CqlValue::Decimal(
            CqlDecimal::from_signed_be_bytes_slice_and_exponent(unscaled, *scale),
        ),
    }
}

/// Convert a cell returned by the driver into a key value.
///
/// Only the scalar types that can appear in a partition key are accepted;
/// anything else is a decode error.
pub fn from_cql_value(value: CqlValue) -> Result<KeyValue, SessionError> {
    let converted = match value {
        CqlValue::Ascii(s) => KeyValue::Ascii(s),
        CqlValue::Text(s) => KeyValue::Text(s),
        CqlValue::Boolean(b) => KeyValue::Boolean(b),
        CqlValue::TinyInt(n) => KeyValue::TinyInt(n),
        CqlValue::SmallInt(n) => KeyValue::SmallInt(n),
        CqlValue::Int(n) => KeyValue::Int(n),
        CqlValue::BigInt(n) => KeyValue::BigInt(n),
        CqlValue::Float(f) => KeyValue::Float(f),
        CqlValue::Double(f) => KeyValue::Double(f),
        CqlValue::Timestamp(ts) => KeyValue::Timestamp(ts.0),
        CqlValue::Date(d) => KeyValue::Date(d.0),
        CqlValue::Time(t) => KeyValue::Time(t.0),
        CqlValue::Uuid(u) => KeyValue::Uuid(u),
        CqlValue::Timeuuid(t) => KeyValue::TimeUuid(Uuid::from_bytes(*t.as_bytes())),
        CqlValue::Inet(addr) => KeyValue::Inet(addr),
        CqlValue::Blob(b) => KeyValue::Blob(Bytes::from(b)),
        CqlValue::Varint(v) => {
            KeyValue::Varint(Bytes::copy_from_slice(v.as_signed_bytes_be_slice()))
        }
        CqlValue::Decimal(d) => {
            let (unscaled, scale) = d.as_signed_be_bytes_slice_and_exponent();
            KeyValue::Decimal {
                scale,
                unscaled: Bytes::copy_from_slice(unscaled),
            }
        }
        other => {
            return Err(SessionError::Decode(format!(
                "unsupported partition key value {other:?}"
            )));
        }
    };
    Ok(converted)
}

/// Classify a driver error.
///
/// `consistency` is the level the failed request ran at; it is reported in
/// [`SessionError::Unavailable`].
pub fn session_error(error: QueryError, consistency: Consistency) -> SessionError {
    match error {
        QueryError::DbError(DbError::Unavailable { required, alive, .. }, _) => {
            SessionError::Unavailable {
                consistency,
                required: required.max(0) as usize,
                alive: alive.max(0) as usize,
            }
        }
        QueryError::DbError(
            DbError::ReadTimeout { .. } | DbError::WriteTimeout { .. },
            message,
        ) => SessionError::Timeout(message),
        QueryError::RequestTimeout(message) => SessionError::Timeout(message),
        other => SessionError::Query(other.to_string()),
    }
}
