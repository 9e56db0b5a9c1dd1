use tracing::{debug, trace};

use crate::schema::Schema;

/// A header position bound to a schema field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// Position of the column in the header (and every data row).
    pub source_index: usize,
    pub name: String,
    /// Index into [`Schema::fields`].
    pub field: usize,
}

/// Match header names against the schema, exactly and case-sensitively.
///
/// Columns come out in schema field order; a name repeated in the header
/// yields one column per occurrence, in header order, all targeting the
/// same field.
pub fn bind<R, S: AsRef<str>>(header: &[S], schema: &Schema<R>) -> Vec<Column> {
    let mut cols = Vec::new();

    for (field_idx, field) in schema.fields().iter().enumerate() {
        let before = cols.len();
        for (col_idx, col_name) in header.iter().enumerate() {
            if col_name.as_ref() != field.name() {
                continue;
            }
            cols.push(Column {
                source_index: col_idx,
                name: field.name().to_string(),
                field: field_idx,
            });
        }
        if cols.len() == before {
            debug!(field = field.name(), "no header column for field");
        }
    }

    for (col_idx, col_name) in header.iter().enumerate() {
        if !cols.iter().any(|c| c.source_index == col_idx) {
            trace!(column = col_name.as_ref(), index = col_idx, "ignoring header column");
        }
    }

    cols
}

/// Minimum number of cells a data row needs for `cols`.
pub fn required_width(cols: &[Column]) -> usize {
    cols.iter().map(|c| c.source_index + 1).max().unwrap_or(0)
}
