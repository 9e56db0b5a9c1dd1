//! Record shapes supplied as data instead of as a Rust type.
//!
//! A [`RecordLayout`] lists column names and type names; resolving it
//! yields a `Schema<DynamicRecord>` that decodes exactly like a typed
//! record.

use std::sync::Arc;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::coerce::{Kind, Value};
use crate::error::{SchemaError, SchemaResult};
use crate::schema::{accessor, Schema, SchemaBuilder, Slot};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RecordLayout {
    pub columns: Vec<LayoutEntry>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum LayoutEntry {
    Column {
        name: String,
        #[serde(rename = "type")]
        ty: String,
    },
    /// Columns flattened into the parent at this position.
    Embedded { embedded: Vec<LayoutEntry> },
}

impl LayoutEntry {
    pub fn column(name: &str, ty: &str) -> Self {
        LayoutEntry::Column {
            name: name.to_string(),
            ty: ty.to_string(),
        }
    }
}

impl RecordLayout {
    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }

    pub fn resolve(&self) -> SchemaResult<Schema<DynamicRecord>> {
        let mut flat = Vec::new();
        flatten(&self.columns, &mut flat)?;

        let mut builder = SchemaBuilder::<DynamicRecord>::new();
        for (idx, (name, kind)) in flat.iter().enumerate() {
            builder.push(
                name,
                kind.clone(),
                accessor(move |r: &mut DynamicRecord| &mut r.values[idx] as &mut dyn Slot),
            );
        }

        let working = DynamicRecord {
            names: flat.iter().map(|(name, _)| name.clone()).collect(),
            values: flat.iter().map(|(_, kind)| Value::zero(kind)).collect(),
        };
        builder.finish(working)
    }
}

fn flatten(entries: &[LayoutEntry], out: &mut Vec<(String, Kind)>) -> SchemaResult<()> {
    if entries.is_empty() {
        return Err(SchemaError::InvalidTarget(
            "layout declares no columns".into(),
        ));
    }
    for entry in entries {
        match entry {
            LayoutEntry::Column { name, ty } => {
                let kind = ty.parse().map_err(|_| SchemaError::UnsupportedType {
                    field: name.clone(),
                    kind: ty.clone(),
                })?;
                out.push((name.clone(), kind));
            }
            LayoutEntry::Embedded { embedded } => flatten(embedded, out)?,
        }
    }
    Ok(())
}

/// A decoded row of a [`RecordLayout`]; serializes as a name → value map.
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicRecord {
    names: Arc<[String]>,
    values: Vec<Value>,
}

impl DynamicRecord {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|idx| &self.values[idx])
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.names.iter().map(String::as_str).zip(self.values.iter())
    }
}

impl Serialize for DynamicRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
