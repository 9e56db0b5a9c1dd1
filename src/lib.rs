//! Decode delimited-text rows into typed records.
//!
//! A record declares which of its fields bind to which header column
//! (see [`csv_record!`]). Decoding resolves the record's [`Schema`],
//! binds the header row against it, and fills one working record per data
//! row, appending a copy of it to the output.
//!
//! ```
//! csvbind::csv_record! {
//!     #[derive(Debug, Clone, Default, PartialEq)]
//!     pub struct Member {
//!         #[csv("ID")]
//!         pub id: u64,
//!         #[csv("Name")]
//!         pub name: String,
//!     }
//! }
//!
//! let data = "Name,ID\nAda,1\n";
//! let members: Vec<Member> = csvbind::Reader::from_reader(data.as_bytes(), b',')
//!     .read()
//!     .unwrap();
//! assert_eq!(members, vec![Member { id: 1, name: "Ada".into() }]);
//! ```

pub mod bind;
pub mod coerce;
pub mod config;
pub mod error;
pub mod materialize;
pub mod reader;
pub mod schema;

pub use bind::{bind, Column};
pub use coerce::{coerce, Kind, Value};
pub use config::ReaderConfig;
pub use error::{CoerceCause, DecodeError, DecodeResult, HookError, SchemaError, SchemaResult};
pub use materialize::{decode, ColumnParser, DecodeOptions, Materializer};
pub use reader::{hooks, read_file, Reader};
pub use schema::{
    resolve, DynamicRecord, FieldDescriptor, FieldValue, LayoutEntry, Record, RecordLayout,
    Schema, SchemaBuilder, Slot,
};
