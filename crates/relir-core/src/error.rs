use crate::model::IndexKind;
use std::fmt;
use std::time::Duration;

/// Machine-readable error codes for scripted experiment runners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    InvalidIdentifier,
    InvalidParameters,
    TableNotFound,
    UnknownIndexType,
    AmbiguousFusionTables,
    DimensionMismatch,
    EmptyQuery,
    RetrievalTimeout,
    SparseIndexMissing,
    EmbeddingProviderFailed,
    StoreFailure,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1001",
            Self::InvalidIdentifier => "E1002",
            Self::InvalidParameters => "E1003",
            Self::TableNotFound => "E2001",
            Self::UnknownIndexType => "E2002",
            Self::AmbiguousFusionTables => "E2003",
            Self::DimensionMismatch => "E3001",
            Self::EmptyQuery => "E3002",
            Self::RetrievalTimeout => "E5001",
            Self::SparseIndexMissing => "E6001",
            Self::EmbeddingProviderFailed => "E6002",
            Self::StoreFailure => "E6003",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::InvalidIdentifier => "Invalid table identifier",
            Self::InvalidParameters => "Invalid fusion parameters",
            Self::TableNotFound => "Table not found",
            Self::UnknownIndexType => "Unknown index type",
            Self::AmbiguousFusionTables => "Ambiguous fusion tables",
            Self::DimensionMismatch => "Embedding dimension mismatch",
            Self::EmptyQuery => "Empty query",
            Self::RetrievalTimeout => "Retrieval timed out",
            Self::SparseIndexMissing => "Sparse index missing",
            Self::EmbeddingProviderFailed => "Embedding provider failed",
            Self::StoreFailure => "Index store failure",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in .relir/config.toml and retry."),
            Self::InvalidIdentifier => {
                Some("Table names must match [A-Za-z_][A-Za-z0-9_]* and be at most 63 characters.")
            }
            Self::InvalidParameters => {
                Some("Use top_n > 0, k > 0 and non-negative finite weights.")
            }
            Self::TableNotFound => Some("Create the table with `rir init-table` first."),
            Self::UnknownIndexType => {
                Some("Sparse tables need a 'contents' column; dense tables need an 'embedding' column.")
            }
            Self::AmbiguousFusionTables => {
                Some("Pass exactly one sparse table and one dense table to hybrid search.")
            }
            Self::DimensionMismatch => {
                Some("Embed queries with the same model and dimension used to build the table.")
            }
            Self::EmptyQuery => Some("Provide at least one word character in the query."),
            Self::RetrievalTimeout => Some("Raise store.query_timeout_ms or lower top_n."),
            Self::SparseIndexMissing => Some("Run `rir index <table>` to rebuild the sparse index."),
            Self::EmbeddingProviderFailed => {
                Some("Check that the embedding service is reachable and the model is pulled.")
            }
            Self::StoreFailure => None,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Errors surfaced by retrieval, ingestion and index-store operations.
///
/// Every variant is a distinct, catchable condition. None of them is
/// swallowed on the way to the caller.
#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    /// The table has neither a `contents` nor an `embedding` column.
    #[error(
        "unknown index type for table '{table}': expected a 'contents' or 'embedding' column"
    )]
    UnknownIndexType { table: String },

    /// Both fusion tables resolve to the same kind.
    #[error(
        "tables '{first}' and '{second}' both resolve to {kind} indexes; hybrid search needs one sparse and one dense table"
    )]
    AmbiguousFusionTables {
        first: String,
        second: String,
        kind: IndexKind,
    },

    /// Vector dimensionality differs from the stored column.
    #[error("dimension mismatch for table '{table}': expected {expected}, got {actual}")]
    DimensionMismatch {
        table: String,
        expected: usize,
        actual: usize,
    },

    /// The sparse query normalizes to zero terms.
    #[error("query contains no searchable terms")]
    EmptyQuery,

    /// A read exceeded its deadline and was interrupted.
    #[error("retrieval from table '{table}' exceeded its {timeout:?} deadline")]
    RetrievalTimeout { table: String, timeout: Duration },

    /// A config file exists but is not valid TOML for the config schema.
    #[error("failed to parse config {path}: {message}")]
    ConfigParse { path: String, message: String },

    /// A table name failed identifier validation.
    #[error("invalid table identifier '{0}'")]
    InvalidIdentifier(String),

    /// Fusion parameters out of range.
    #[error("invalid fusion parameters: {0}")]
    InvalidParameters(String),

    /// The table does not exist in the store.
    #[error("table '{0}' does not exist")]
    TableNotFound(String),

    /// A sparse table exists but its full-text index does not.
    #[error("sparse index for table '{0}' is missing")]
    SparseIndexMissing(String),

    /// The embedding provider could not produce a vector.
    #[error("embedding provider failed: {0}")]
    Embedding(String),

    /// Any other failure reported by the underlying engine.
    #[error("index store error: {0}")]
    Store(#[from] rusqlite::Error),
}

impl RetrievalError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::UnknownIndexType { .. } => ErrorCode::UnknownIndexType,
            Self::AmbiguousFusionTables { .. } => ErrorCode::AmbiguousFusionTables,
            Self::DimensionMismatch { .. } => ErrorCode::DimensionMismatch,
            Self::EmptyQuery => ErrorCode::EmptyQuery,
            Self::RetrievalTimeout { .. } => ErrorCode::RetrievalTimeout,
            Self::ConfigParse { .. } => ErrorCode::ConfigParseError,
            Self::InvalidIdentifier(_) => ErrorCode::InvalidIdentifier,
            Self::InvalidParameters(_) => ErrorCode::InvalidParameters,
            Self::TableNotFound(_) => ErrorCode::TableNotFound,
            Self::SparseIndexMissing(_) => ErrorCode::SparseIndexMissing,
            Self::Embedding(_) => ErrorCode::EmbeddingProviderFailed,
            Self::Store(_) => ErrorCode::StoreFailure,
        }
    }

    /// Optional remediation hint for operators.
    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }
}

pub type Result<T, E = RetrievalError> = std::result::Result<T, E>;
