//! Error types for schema resolution and row decoding.
//!
//! [`SchemaError`] covers everything that can go wrong before the first
//! data row is read; [`DecodeError`] covers the read itself and wraps
//! schema failures so callers can propagate a single type.

use std::num::{ParseFloatError, ParseIntError};
use std::path::PathBuf;

use thiserror::Error;

use crate::coerce::Kind;

/// Result alias for schema resolution.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Result alias for decode operations.
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Error returned by a cell pre-processing hook.
pub type HookError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised while resolving a record type into a flat schema.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The decode target is not a record shape.
    #[error("invalid decode target: {0}")]
    InvalidTarget(String),

    /// Two fields of the flattened schema share a column name.
    #[error("field={0} is declared more than once")]
    DuplicateField(String),

    /// A field annotation carries an empty column name.
    #[error("field at position {0} has an empty column name")]
    EmptyName(usize),

    /// A field's declared type cannot be decoded from text.
    #[error("unsupported type={kind} for field={field}")]
    UnsupportedType {
        /// Column name of the offending field.
        field: String,
        /// The type as it was declared.
        kind: String,
    },

    /// An embedded record contains itself.
    #[error("embedded record {0} embeds itself")]
    EmbeddingCycle(&'static str),
}

/// Why a single cell could not be converted.
#[derive(Debug, Error)]
pub enum CoerceCause {
    #[error(transparent)]
    Int(#[from] ParseIntError),

    #[error(transparent)]
    Float(#[from] ParseFloatError),

    #[error("invalid boolean literal '{0}'")]
    Bool(String),

    #[error("failed to parse time string format={0}")]
    Time(String),
}

/// Errors raised while reading rows into records.
///
/// Everything except [`DecodeError::Schema`] and [`DecodeError::Open`] can
/// occur after some rows were already emitted; those rows stay in the
/// caller's output collection.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// A data row is shorter than the highest bound column requires.
    #[error("row {row}: expected at least {required} cells, found {actual}")]
    RowShape {
        row: usize,
        required: usize,
        actual: usize,
    },

    /// A cell could not be converted to its field's kind.
    #[error("row {row}: cannot decode field={field} as {kind}: {cause}")]
    Coercion {
        row: usize,
        field: String,
        kind: Kind,
        #[source]
        cause: CoerceCause,
    },

    /// A field slot refused the value produced for its declared kind.
    #[error("unsupported type={kind} for field={field}")]
    UnsupportedType { field: String, kind: Kind },

    /// The cell pre-processing hook failed.
    #[error("row {row}: column parser failed: {source}")]
    Hook {
        row: usize,
        #[source]
        source: HookError,
    },

    /// The row source failed to tokenize a record.
    #[error("csv Reader error: {0}")]
    Source(#[from] csv::Error),

    #[error("failed to open file={}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Lets infallible in-memory row sources feed [`crate::decode`].
impl From<std::convert::Infallible> for DecodeError {
    fn from(never: std::convert::Infallible) -> Self {
        match never {}
    }
}
