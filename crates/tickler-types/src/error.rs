//! Error types for parsing schema and configuration values.

/// Errors raised when a textual type, kind, or level cannot be interpreted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TypeError {
    /// The CQL type cannot be used as a partition key by this tool.
    #[error("unsupported column type: {0}")]
    UnsupportedType(String),

    /// The schema reported a column kind we do not know.
    #[error("unknown column kind: {0}")]
    UnknownColumnKind(String),

    /// The consistency level name is not recognised.
    #[error("unknown consistency level: {0}")]
    UnknownConsistency(String),
}
