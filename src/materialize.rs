//! Filling the working record from data rows.
//!
//! [`decode`] is the read loop: bind the header, then for every data row
//! fill the schema's working record and append a copy of it to the
//! caller's output. The working record is never reset between rows, so a
//! field left untouched by a row (empty cell, unbound field) keeps the value
//! of the previous row.

use std::borrow::Cow;

use tracing::{debug, trace};

use crate::bind::{bind, required_width, Column};
use crate::coerce::coerce;
use crate::error::{DecodeError, DecodeResult, HookError};
use crate::schema::Schema;

/// Cell pre-processing hook.
pub type ColumnParser = dyn Fn(&str) -> Result<String, HookError> + Send + Sync;

/// Read-loop settings supplied by the orchestrating caller.
#[derive(Default, Clone, Copy)]
pub struct DecodeOptions<'h> {
    /// Applied to every data cell before coercion.
    pub hook: Option<&'h ColumnParser>,
    /// Also apply `hook` to header cells before name matching.
    pub hook_header: bool,
    /// Stop after this many records.
    pub limit: Option<usize>,
}

/// Applies bound columns of one row to the working record.
pub struct Materializer<'h, R> {
    schema: Schema<R>,
    columns: Vec<Column>,
    required: usize,
    hook: Option<&'h ColumnParser>,
}

impl<'h, R: Clone> Materializer<'h, R> {
    pub fn new(schema: Schema<R>, columns: Vec<Column>, hook: Option<&'h ColumnParser>) -> Self {
        let required = required_width(&columns);
        Self {
            schema,
            columns,
            required,
            hook,
        }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Fill the working record from `row`. `row_index` is used for errors.
    pub fn materialize<S: AsRef<str>>(&mut self, row_index: usize, row: &[S]) -> DecodeResult<()> {
        if row.len() < self.required {
            return Err(DecodeError::RowShape {
                row: row_index,
                required: self.required,
                actual: row.len(),
            });
        }

        let hook = self.hook;
        let (fields, working) = self.schema.split_mut();
        for col in &self.columns {
            let raw = row[col.source_index].as_ref();
            let cell: Cow<'_, str> = match hook {
                Some(parse) => Cow::Owned(parse(raw).map_err(|source| DecodeError::Hook {
                    row: row_index,
                    source,
                })?),
                None => Cow::Borrowed(raw),
            };

            let field = &fields[col.field];
            let value = coerce(&cell, field.kind()).map_err(|cause| DecodeError::Coercion {
                row: row_index,
                field: field.name().to_string(),
                kind: field.kind().clone(),
                cause,
            })?;
            let Some(value) = value else {
                continue;
            };

            field
                .target(working)
                .store(value)
                .map_err(|_| DecodeError::UnsupportedType {
                    field: field.name().to_string(),
                    kind: field.kind().clone(),
                })?;
        }

        Ok(())
    }

    /// A value copy of the working record.
    pub fn snapshot(&self) -> R {
        self.schema.working().clone()
    }
}

/// Decode `rows` under `header` into `out`.
///
/// Returns the number of records appended. On error, records appended
/// before the failing row stay in `out`. A header that binds no column
/// decodes nothing and leaves `rows` unread.
pub fn decode<R, S, I, E>(
    schema: Schema<R>,
    header: &[S],
    rows: I,
    options: &DecodeOptions<'_>,
    out: &mut Vec<R>,
) -> DecodeResult<usize>
where
    R: Clone,
    S: AsRef<str>,
    I: IntoIterator<Item = Result<Vec<String>, E>>,
    E: Into<DecodeError>,
{
    let columns = match (options.hook, options.hook_header) {
        (Some(parse), true) => {
            let parsed = header
                .iter()
                .map(|cell| parse(cell.as_ref()))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|source| DecodeError::Hook { row: 0, source })?;
            bind(&parsed, &schema)
        }
        _ => bind(header, &schema),
    };

    if columns.is_empty() {
        debug!(fields = schema.len(), "header binds no fields; nothing to decode");
        return Ok(0);
    }
    debug!(bound = columns.len(), fields = schema.len(), "header bound");

    let mut materializer = Materializer::new(schema, columns, options.hook);
    let mut emitted = 0usize;
    let mut rows = rows.into_iter();

    loop {
        if options.limit.is_some_and(|limit| emitted >= limit) {
            debug!(limit = emitted, "row limit reached");
            break;
        }
        let Some(row) = rows.next() else {
            break;
        };
        let row = row.map_err(Into::<DecodeError>::into)?;
        let row_index = emitted + 1;

        materializer.materialize(row_index, &row)?;
        out.push(materializer.snapshot());
        emitted += 1;
        trace!(row = row_index, "row materialized");
    }

    debug!(rows = emitted, "decode finished");
    Ok(emitted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csv_record;
    use chrono::{DateTime, TimeZone, Utc};
    use std::convert::Infallible;

    csv_record! {
        #[derive(Debug, Clone, Default, PartialEq)]
        struct Member {
            #[csv("ID")]
            id: u64,
            #[csv("Name")]
            name: String,
            #[csv("Joined")]
            joined: DateTime<Utc>,
        }
    }

    csv_record! {
        #[derive(Debug, Clone, Default, PartialEq)]
        struct Nullable {
            #[csv("Score")]
            score: Option<i32>,
            #[csv("Label")]
            label: String,
        }
    }

    fn rows(data: &[&[&str]]) -> Vec<Result<Vec<String>, Infallible>> {
        data.iter()
            .map(|r| Ok(r.iter().map(|c| c.to_string()).collect()))
            .collect()
    }

    fn run<R: crate::Record>(
        header: &[&str],
        data: &[&[&str]],
        options: &DecodeOptions<'_>,
    ) -> (Vec<R>, DecodeResult<usize>) {
        let mut out = Vec::new();
        let res = decode(Schema::<R>::resolve().unwrap(), header, rows(data), options, &mut out);
        (out, res)
    }

    #[test]
    fn test_header_order_independent_with_fallback_time() {
        let (out, res) = run::<Member>(
            &["Name", "ID", "Joined"],
            &[&["Ada", "1", "02.01.2006 03:04:05"]],
            &DecodeOptions::default(),
        );
        assert_eq!(res.unwrap(), 1);
        assert_eq!(
            out,
            vec![Member {
                id: 1,
                name: "Ada".into(),
                joined: Utc.with_ymd_and_hms(2006, 1, 2, 3, 4, 5).unwrap(),
            }]
        );
    }

    #[test]
    fn test_unmatched_columns_stay_zero() {
        let (out, res) = run::<Member>(
            &["ID", "Extra"],
            &[&["1", "x"], &["2", "y"]],
            &DecodeOptions::default(),
        );
        assert_eq!(res.unwrap(), 2);
        assert_eq!(out[0].id, 1);
        assert_eq!(out[1].id, 2);
        assert!(out.iter().all(|m| m.name.is_empty()));
        assert!(out.iter().all(|m| m.joined == DateTime::<Utc>::default()));
    }

    #[test]
    fn test_no_bound_columns_yields_nothing() {
        let (out, res) = run::<Member>(&["A", "B"], &[&["1", "2"]], &DecodeOptions::default());
        assert_eq!(res.unwrap(), 0);
        assert!(out.is_empty());
    }

    #[test]
    fn test_all_empty_row_still_emits() {
        let (out, res) = run::<Member>(&["ID", "Name", "Joined"], &[&["", "", ""]], &DecodeOptions::default());
        assert_eq!(res.unwrap(), 1);
        assert_eq!(out, vec![Member::default()]);
    }

    #[test]
    fn test_empty_cell_carries_previous_value() {
        let (out, _) = run::<Member>(
            &["ID", "Name"],
            &[&["1", "Ada"], &["2", ""]],
            &DecodeOptions::default(),
        );
        assert_eq!(out[1].id, 2);
        assert_eq!(out[1].name, "Ada");
        // the first snapshot is unaffected by later rows
        assert_eq!(out[0].id, 1);
    }

    #[test]
    fn test_optional_empty_stays_absent() {
        let (out, res) = run::<Nullable>(
            &["Score", "Label"],
            &[&["", "a"], &["-3", "b"]],
            &DecodeOptions::default(),
        );
        assert_eq!(res.unwrap(), 2);
        assert_eq!(out[0].score, None);
        assert_eq!(out[1].score, Some(-3));
    }

    #[test]
    fn test_short_row_stops_read_keeping_earlier_rows() {
        let (out, res) = run::<Member>(
            &["ID", "Name"],
            &[&["1", "Ada"], &["2"], &["3", "Cy"]],
            &DecodeOptions::default(),
        );
        assert!(matches!(
            res,
            Err(DecodeError::RowShape { row: 2, required: 2, actual: 1 })
        ));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].name, "Ada");
    }

    #[test]
    fn test_coercion_failure_names_field() {
        let (out, res) = run::<Member>(&["ID"], &[&["7"], &["seven"]], &DecodeOptions::default());
        match res {
            Err(DecodeError::Coercion { row, field, .. }) => {
                assert_eq!(row, 2);
                assert_eq!(field, "ID");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_duplicate_header_last_wins() {
        let (out, _) = run::<Member>(&["Name", "Name"], &[&["first", "second"]], &DecodeOptions::default());
        assert_eq!(out[0].name, "second");
    }

    #[test]
    fn test_limit_caps_rows() {
        let options = DecodeOptions {
            limit: Some(2),
            ..Default::default()
        };
        let (out, res) = run::<Member>(&["ID"], &[&["1"], &["2"], &["3"]], &options);
        assert_eq!(res.unwrap(), 2);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_hook_applies_to_cells_and_header() {
        let trim = |v: &str| -> Result<String, HookError> { Ok(v.trim().to_string()) };
        let options = DecodeOptions {
            hook: Some(&trim),
            hook_header: true,
            limit: None,
        };
        let (out, res) = run::<Member>(&[" ID ", "Name "], &[&[" 5", " Bo "]], &options);
        assert_eq!(res.unwrap(), 1);
        assert_eq!(out[0].id, 5);
        assert_eq!(out[0].name, "Bo");
    }

    #[test]
    fn test_hook_failure_aborts() {
        let reject = |v: &str| -> Result<String, HookError> {
            if v == "bad" {
                Err("bad cell".into())
            } else {
                Ok(v.to_string())
            }
        };
        let options = DecodeOptions {
            hook: Some(&reject),
            ..Default::default()
        };
        let (out, res) = run::<Member>(&["Name"], &[&["ok"], &["bad"]], &options);
        assert!(matches!(res, Err(DecodeError::Hook { row: 2, .. })));
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_header_hook_failure_is_row_zero() {
        let reject_header = |v: &str| -> Result<String, HookError> {
            if v == "Name" {
                Err("bad header".into())
            } else {
                Ok(v.to_string())
            }
        };
        let options = DecodeOptions {
            hook: Some(&reject_header),
            hook_header: true,
            limit: None,
        };
        let (out, res) = run::<Member>(&["ID", "Name"], &[&["1", "Ada"]], &options);
        match res {
            Err(DecodeError::Hook { row: 0, source }) => {
                assert_eq!(source.to_string(), "bad header")
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(out.is_empty());
    }

    #[test]
    fn test_source_error_surfaces() {
        let source: Vec<Result<Vec<String>, DecodeError>> = vec![
            Ok(vec!["1".into()]),
            Err(DecodeError::RowShape {
                row: 9,
                required: 1,
                actual: 0,
            }),
        ];
        let mut out = Vec::new();
        let res = decode(
            Schema::<Member>::resolve().unwrap(),
            &["ID"],
            source,
            &DecodeOptions::default(),
            &mut out,
        );
        assert!(res.is_err());
        assert_eq!(out.len(), 1);
    }
}
