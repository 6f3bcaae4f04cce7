//! Error types for all Tabula operations.

use thiserror::Error;

use crate::types::Domain;

/// Top-level error type for Tabula operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Predicate(#[from] PredicateError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Encoding(#[from] EncodingError),
}

/// Errors raised by the ordered index and its range views.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IndexError {
    #[error("first/last key requested on an empty index")]
    Empty,

    #[error("inconsistent range: lower bound exceeds upper bound")]
    InconsistentRange,

    #[error("requested range reaches outside the parent view")]
    KeyOutOfRange,
}

/// Errors raised while compiling or evaluating a selection condition.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PredicateError {
    #[error("ill-formed predicate: {0}")]
    IllFormed(String),
}

/// Errors raised by schema construction and schema-checked operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("attribute not found: {0}")]
    UnknownAttribute(String),

    #[error("duplicate attribute name: {0}")]
    DuplicateAttribute(String),

    #[error("primary key must name at least one attribute")]
    EmptyKey,

    #[error("unknown domain name: {0}")]
    UnknownDomain(String),

    #[error("domain mismatch at column {column}: expected {expected:?}, got {actual:?}")]
    DomainMismatch {
        column: usize,
        expected: Domain,
        actual: Domain,
    },

    #[error("expected {expected} values, got {actual}")]
    ArityMismatch { expected: usize, actual: usize },

    #[error("tables are not union-compatible")]
    IncompatibleSchemas,
}

/// Errors raised by the record codec.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncodingError {
    #[error("record truncated: needed {needed} bytes at offset {offset}, got {remaining}")]
    TruncatedRecord {
        offset: usize,
        needed: usize,
        remaining: usize,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
