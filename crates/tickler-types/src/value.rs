//! Partition key column types and their values.
//!
//! [`ColumnType`] is resolved once from the schema; [`KeyValue`] is the
//! tagged value carried for each column of each partition. Every variant
//! knows how to encode itself as a CQL native-protocol cell body, so binding
//! a value never needs a per-row type lookup.

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use bytes::{BufMut, Bytes, BytesMut};
use uuid::Uuid;

use crate::error::TypeError;

/// CQL types that may appear in a partition key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    /// `ascii`: US-ASCII string.
    Ascii,
    /// `text` (alias `varchar`): UTF-8 string.
    Text,
    /// `boolean`.
    Boolean,
    /// `tinyint`: 8-bit signed integer.
    TinyInt,
    /// `smallint`: 16-bit signed integer.
    SmallInt,
    /// `int`: 32-bit signed integer.
    Int,
    /// `bigint`: 64-bit signed integer.
    BigInt,
    /// `float`: 32-bit IEEE 754.
    Float,
    /// `double`: 64-bit IEEE 754.
    Double,
    /// `timestamp`: milliseconds since the Unix epoch.
    Timestamp,
    /// `date`: days since the epoch, offset by 2^31.
    Date,
    /// `time`: nanoseconds since midnight.
    Time,
    /// `uuid`: any UUID.
    Uuid,
    /// `timeuuid`: version 1 UUID.
    TimeUuid,
    /// `inet`: IPv4 or IPv6 address.
    Inet,
    /// `blob`: opaque bytes.
    Blob,
    /// `varint`: arbitrary-precision integer.
    Varint,
    /// `decimal`: arbitrary-precision decimal.
    Decimal,
}

impl ColumnType {
    /// CQL name of the type.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ascii => "ascii",
            Self::Text => "text",
            Self::Boolean => "boolean",
            Self::TinyInt => "tinyint",
            Self::SmallInt => "smallint",
            Self::Int => "int",
            Self::BigInt => "bigint",
            Self::Float => "float",
            Self::Double => "double",
            Self::Timestamp => "timestamp",
            Self::Date => "date",
            Self::Time => "time",
            Self::Uuid => "uuid",
            Self::TimeUuid => "timeuuid",
            Self::Inet => "inet",
            Self::Blob => "blob",
            Self::Varint => "varint",
            Self::Decimal => "decimal",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ColumnType {
    type Err = TypeError;

    /// Parse a type name as found in `system_schema.columns`.
    ///
    /// Collections, tuples, UDTs, counters and durations are rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ty = match s.trim().to_ascii_lowercase().as_str() {
            "ascii" => Self::Ascii,
            "text" | "varchar" => Self::Text,
            "boolean" => Self::Boolean,
            "tinyint" => Self::TinyInt,
            "smallint" => Self::SmallInt,
            "int" => Self::Int,
            "bigint" => Self::BigInt,
            "float" => Self::Float,
            "double" => Self::Double,
            "timestamp" => Self::Timestamp,
            "date" => Self::Date,
            "time" => Self::Time,
            "uuid" => Self::Uuid,
            "timeuuid" => Self::TimeUuid,
            "inet" => Self::Inet,
            "blob" => Self::Blob,
            "varint" => Self::Varint,
            "decimal" => Self::Decimal,
            _ => return Err(TypeError::UnsupportedType(s.to_string())),
        };
        Ok(ty)
    }
}

/// A single partition key value.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyValue {
    /// An `ascii` value.
    Ascii(String),
    /// A `text` value.
    Text(String),
    /// A `boolean` value.
    Boolean(bool),
    /// A `tinyint` value.
    TinyInt(i8),
    /// A `smallint` value.
    SmallInt(i16),
    /// An `int` value.
    Int(i32),
    /// A `bigint` value.
    BigInt(i64),
    /// A `float` value.
    Float(f32),
    /// A `double` value.
    Double(f64),
    /// Milliseconds since the Unix epoch.
    Timestamp(i64),
    /// Days since the Unix epoch, offset by 2^31.
    Date(u32),
    /// Nanoseconds since midnight.
    Time(i64),
    /// A `uuid` value.
    Uuid(Uuid),
    /// A `timeuuid` value.
    TimeUuid(Uuid),
    /// An `inet` address.
    Inet(IpAddr),
    /// Raw `blob` bytes.
    Blob(Bytes),
    /// Two's-complement big-endian integer.
    Varint(Bytes),
    /// `unscaled * 10^-scale`, with `unscaled` as a varint.
    Decimal {
        /// Decimal exponent, negated.
        scale: i32,
        /// Unscaled value as a varint.
        unscaled: Bytes,
    },
}

impl KeyValue {
    /// The column type this value belongs to.
    pub fn column_type(&self) -> ColumnType {
        match self {
            Self::Ascii(_) => ColumnType::Ascii,
            Self::Text(_) => ColumnType::Text,
            Self::Boolean(_) => ColumnType::Boolean,
            Self::TinyInt(_) => ColumnType::TinyInt,
            Self::SmallInt(_) => ColumnType::SmallInt,
            Self::Int(_) => ColumnType::Int,
            Self::BigInt(_) => ColumnType::BigInt,
            Self::Float(_) => ColumnType::Float,
            Self::Double(_) => ColumnType::Double,
            Self::Timestamp(_) => ColumnType::Timestamp,
            Self::Date(_) => ColumnType::Date,
            Self::Time(_) => ColumnType::Time,
            Self::Uuid(_) => ColumnType::Uuid,
            Self::TimeUuid(_) => ColumnType::TimeUuid,
            Self::Inet(_) => ColumnType::Inet,
            Self::Blob(_) => ColumnType::Blob,
            Self::Varint(_) => ColumnType::Varint,
            Self::Decimal { .. } => ColumnType::Decimal,
        }
    }

    /// Encode the value as a CQL native-protocol cell body (without the
    /// length prefix).
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::new();
        match self {
            Self::Ascii(s) | Self::Text(s) => buf.put_slice(s.as_bytes()),
            Self::Boolean(b) => buf.put_u8(u8::from(*b)),
            Self::TinyInt(v) => buf.put_i8(*v),
            Self::SmallInt(v) => buf.put_i16(*v),
            Self::Int(v) => buf.put_i32(*v),
            Self::BigInt(v) | Self::Timestamp(v) | Self::Time(v) => buf.put_i64(*v),
            Self::Float(v) => buf.put_f32(*v),
            Self::Double(v) => buf.put_f64(*v),
            Self::Date(v) => buf.put_u32(*v),
            Self::Uuid(u) | Self::TimeUuid(u) => buf.put_slice(u.as_bytes()),
            Self::Inet(IpAddr::V4(addr)) => buf.put_slice(&addr.octets()),
            Self::Inet(IpAddr::V6(addr)) => buf.put_slice(&addr.octets()),
            Self::Blob(b) | Self::Varint(b) => buf.put_slice(b),
            Self::Decimal { scale, unscaled } => {
                buf.put_i32(*scale);
                buf.put_slice(unscaled);
            }
        }
        buf.freeze()
    }
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ascii(s) | Self::Text(s) => write!(f, "'{}'", s.replace('\'', "''")),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::TinyInt(v) => write!(f, "{v}"),
            Self::SmallInt(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::BigInt(v) | Self::Timestamp(v) | Self::Time(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
            Self::Date(v) => write!(f, "{v}"),
            Self::Uuid(u) | Self::TimeUuid(u) => write!(f, "{u}"),
            Self::Inet(addr) => write!(f, "'{addr}'"),
            Self::Blob(b) | Self::Varint(b) => write_hex(f, b),
            Self::Decimal { scale, unscaled } => {
                write!(f, "decimal(")?;
                write_hex(f, unscaled)?;
                write!(f, "e-{scale})")
            }
        }
    }
}

fn write_hex(f: &mut fmt::Formatter<'_>, bytes: &[u8]) -> fmt::Result {
    write!(f, "0x")?;
    for byte in bytes {
        write!(f, "{byte:02x}")?;
    }
    Ok(())
}
