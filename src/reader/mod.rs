//! CSV file/stream front end: tokenizes with the `csv` crate, treats the
//! first record as the header and feeds the rest to [`decode`].

pub mod hooks;

use std::fs::File;
use std::io;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use tracing::{debug, instrument};

use crate::config::ReaderConfig;
use crate::error::{DecodeError, DecodeResult, HookError};
use crate::materialize::{decode, ColumnParser, DecodeOptions};
use crate::schema::{DynamicRecord, Record, RecordLayout, Schema};

pub struct Reader<Rd: io::Read> {
    csv: csv::Reader<Rd>,
    column_parser: Option<Box<ColumnParser>>,
    apply_to_header: bool,
    trim_leading_space: bool,
    limit: Option<usize>,
}

impl Reader<File> {
    pub fn from_path<P: AsRef<Path>>(path: P, delimiter: u8) -> DecodeResult<Self> {
        let config = ReaderConfig {
            delimiter,
            ..ReaderConfig::default()
        };
        Self::from_path_with_config(path, &config)
    }

    pub fn from_path_with_config<P: AsRef<Path>>(
        path: P,
        config: &ReaderConfig,
    ) -> DecodeResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| DecodeError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::with_config(file, config))
    }
}

impl<Rd: io::Read> Reader<Rd> {
    pub fn from_reader(rd: Rd, delimiter: u8) -> Self {
        let config = ReaderConfig {
            delimiter,
            ..ReaderConfig::default()
        };
        Self::with_config(rd, &config)
    }

    /// Build a reader from `config`. The config's layout is not consulted
    /// here; pass it to [`Reader::read_dynamic`].
    pub fn with_config(rd: Rd, config: &ReaderConfig) -> Self {
        let csv = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(config.delimiter)
            .from_reader(rd);

        let reader = Self {
            csv,
            column_parser: None,
            apply_to_header: false,
            trim_leading_space: config.trim_leading_space,
            limit: config.limit,
        };
        if config.clean_cells {
            reader.with_column_parser(hooks::clean, true)
        } else {
            reader
        }
    }

    /// Run every data cell (and, if `apply_to_header`, every header cell)
    /// through `parser` before use.
    pub fn with_column_parser<F>(mut self, parser: F, apply_to_header: bool) -> Self
    where
        F: Fn(&str) -> Result<String, HookError> + Send + Sync + 'static,
    {
        self.column_parser = Some(Box::new(parser));
        self.apply_to_header = apply_to_header;
        self
    }

    /// Materialize at most `limit` records per read.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn read<R: Record>(&mut self) -> DecodeResult<Vec<R>> {
        let mut out = Vec::new();
        self.read_into(&mut out)?;
        Ok(out)
    }

    /// Append decoded records to `out`. Records decoded before an error
    /// remain in `out`.
    pub fn read_into<R: Record>(&mut self, out: &mut Vec<R>) -> DecodeResult<usize> {
        let schema = Schema::<R>::resolve()?;
        self.decode_with(schema, out)
    }

    pub fn read_dynamic(&mut self, layout: &RecordLayout) -> DecodeResult<Vec<DynamicRecord>> {
        let schema = layout.resolve()?;
        let mut out = Vec::new();
        self.decode_with(schema, &mut out)?;
        Ok(out)
    }

    fn decode_with<R: Clone>(&mut self, schema: Schema<R>, out: &mut Vec<R>) -> DecodeResult<usize> {
        let trim = self.trim_leading_space;
        let mut records = self.csv.records();
        let header = match records.next() {
            Some(record) => to_cells(record?, trim),
            None => {
                debug!("input has no header row");
                return Ok(0);
            }
        };

        let options = DecodeOptions {
            hook: self.column_parser.as_deref(),
            hook_header: self.apply_to_header,
            limit: self.limit,
        };
        let rows = records.map(|record| record.map(|r| to_cells(r, trim)));
        decode(schema, &header, rows, &options, out)
    }
}

fn to_cells(record: StringRecord, trim_leading_space: bool) -> Vec<String> {
    if trim_leading_space {
        record.iter().map(|cell| cell.trim_start().to_string()).collect()
    } else {
        record.iter().map(str::to_string).collect()
    }
}

/// Open `path`, decode every record into `R`, and close the file.
#[instrument(level = "debug", skip(path), fields(path = %path.as_ref().display()))]
pub fn read_file<R: Record, P: AsRef<Path>>(path: P, delimiter: u8) -> DecodeResult<Vec<R>> {
    let mut reader = Reader::from_path(&path, delimiter)?;
    let out = reader.read()?;
    debug!(rows = out.len(), "read file");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coerce::Value;
    use crate::csv_record;
    use anyhow::Result;
    use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
    use std::io::Write;
    use tempfile::NamedTempFile;
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    fn init_test_logging() {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("info,csvbind=debug")),
            )
            .with_test_writer()
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }

    csv_record! {
        #[derive(Debug, Clone, Default, PartialEq)]
        pub struct ContactInfo {
            #[csv("Phone")]
            pub phone: String,
            #[csv("Email")]
            pub email: Option<String>,
        }
    }

    csv_record! {
        #[derive(Debug, Clone, Default, PartialEq)]
        pub struct Person {
            #[csv("ID")]
            pub id: u32,
            #[csv("FirstName")]
            pub first_name: String,
            #[csv("Age")]
            pub age: u8,
            #[csv("BirthDate")]
            pub birth_date: NaiveDateTime,
            #[csv("Added")]
            pub added: Option<DateTime<Utc>>,
            #[csv(embedded)]
            pub contacts: ContactInfo,
            pub note: String,
        }
    }

    const PEOPLE: &str = "\
ID;FirstName;Age;BirthDate;Added;Phone;Email;Unused
1;Ada;36;10.12.1815 00:00:00;2020-01-05T10:00:00Z;555-0101;ada@example.com;x
2;Bob;41;1983-04-02;;555-0102;;y
3;Cy; 27;02.03.1997 12:30:00;2021/07/08 09:15;555-0103;cy@example.com;z
";

    #[test]
    fn test_read_person_file() -> Result<()> {
        init_test_logging();
        let mut tmp = NamedTempFile::new()?;
        tmp.write_all(PEOPLE.as_bytes())?;

        let people: Vec<Person> = read_file(tmp.path(), b';')?;
        assert_eq!(people.len(), 3);

        let ada = &people[0];
        assert_eq!(ada.id, 1);
        assert_eq!(ada.first_name, "Ada");
        assert_eq!(
            ada.birth_date,
            Utc.with_ymd_and_hms(1815, 12, 10, 0, 0, 0).unwrap().naive_utc()
        );
        assert_eq!(
            ada.added,
            Some(Utc.with_ymd_and_hms(2020, 1, 5, 10, 0, 0).unwrap())
        );
        assert_eq!(ada.contacts.email.as_deref(), Some("ada@example.com"));
        assert!(ada.note.is_empty());

        // empty cells carry over from the previous row
        let bob = &people[1];
        assert_eq!(bob.added, ada.added);
        assert_eq!(bob.contacts.email, ada.contacts.email);
        assert_eq!(bob.contacts.phone, "555-0102");

        // leading space trimmed; ambiguous date read day-first
        let cy = &people[2];
        assert_eq!(cy.age, 27);
        assert_eq!(
            cy.birth_date,
            Utc.with_ymd_and_hms(1997, 3, 2, 12, 30, 0).unwrap().naive_utc()
        );
        Ok(())
    }

    #[test]
    fn test_missing_file() {
        let err = read_file::<Person, _>("/definitely/not/here.csv", b',').unwrap_err();
        assert!(matches!(err, DecodeError::Open { .. }));
    }

    #[test]
    fn test_limit_and_partial_results() -> Result<()> {
        let data = "ID,Age\n1,10\n2,20\n3,300\n4,40\n";

        let mut limited = Reader::from_reader(data.as_bytes(), b',').limit(2);
        let people: Vec<Person> = limited.read()?;
        assert_eq!(people.iter().map(|p| p.id).collect::<Vec<_>>(), vec![1, 2]);

        let mut reader = Reader::from_reader(data.as_bytes(), b',');
        let mut out: Vec<Person> = Vec::new();
        let err = reader.read_into(&mut out).unwrap_err();
        assert!(matches!(err, DecodeError::Coercion { row: 3, ref field, .. } if field == "Age"));
        assert_eq!(out.len(), 2);
        Ok(())
    }

    #[test]
    fn test_short_row_is_row_shape_error() {
        let data = "ID,FirstName\n1,Ada\n2\n";
        let mut reader = Reader::from_reader(data.as_bytes(), b',');
        let mut out: Vec<Person> = Vec::new();
        let err = reader.read_into(&mut out).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::RowShape {
                row: 2,
                required: 2,
                actual: 1
            }
        ));
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_empty_input_and_unmatched_header() -> Result<()> {
        let mut empty = Reader::from_reader("".as_bytes(), b',');
        assert!(empty.read::<Person>()?.is_empty());

        let mut unmatched = Reader::from_reader("A,B\n1,2\n".as_bytes(), b',');
        assert!(unmatched.read::<Person>()?.is_empty());
        Ok(())
    }

    #[test]
    fn test_column_parser_on_header_and_cells() -> Result<()> {
        let data = "\"ID\",\"FirstName\"\n\"\"\"7\"\"\",\"\"\"Ada\"\"\"\n";
        let config = ReaderConfig {
            trim_leading_space: false,
            ..ReaderConfig::default()
        };
        let mut reader =
            Reader::with_config(data.as_bytes(), &config).with_column_parser(hooks::clean, true);
        let people: Vec<Person> = reader.read()?;
        assert_eq!(people[0].id, 7);
        assert_eq!(people[0].first_name, "Ada");
        Ok(())
    }

    #[test]
    fn test_dynamic_layout() -> Result<()> {
        let layout = RecordLayout::from_yaml(
            "columns:\n  - name: ID\n    type: u64\n  - embedded:\n      - name: Phone\n        type: option<string>\n",
        )?;
        let data = "Phone;ID\n;1\n555;2\n";
        let mut reader = Reader::from_reader(data.as_bytes(), b';');
        let rows = reader.read_dynamic(&layout)?;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("ID"), Some(&Value::U64(1)));
        assert_eq!(rows[0].get("Phone"), Some(&Value::Null));
        assert_eq!(rows[1].get("Phone"), Some(&Value::Str("555".into())));
        assert_eq!(
            serde_json::to_string(&rows[1])?,
            r#"{"ID":2,"Phone":"555"}"#
        );
        Ok(())
    }

    #[test]
    fn test_only_leading_space_trimmed() -> Result<()> {
        let data = " FirstName, ID\n Ada ,  4\n";
        let people: Vec<Person> = Reader::from_reader(data.as_bytes(), b',').read()?;
        assert_eq!(people[0].first_name, "Ada ");
        assert_eq!(people[0].id, 4);

        let config = ReaderConfig {
            trim_leading_space: false,
            ..ReaderConfig::default()
        };
        let data = "FirstName,ID\n Ada ,4\n";
        let people: Vec<Person> = Reader::with_config(data.as_bytes(), &config).read()?;
        assert_eq!(people[0].first_name, " Ada ");
        Ok(())
    }

    #[test]
    fn test_csv_tokenizer_error_surfaces() {
        let data: &[u8] = b"ID\n1\n\xff\xfe\n";
        let mut reader = Reader::from_reader(data, b',');
        let mut out: Vec<Person> = Vec::new();
        let err = reader.read_into(&mut out).unwrap_err();
        assert!(matches!(err, DecodeError::Source(_)));
        assert_eq!(out.len(), 1);
    }
}
