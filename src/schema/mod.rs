//! Record schemas: which fields of a record are decodable, under which
//! column name, with which [`Kind`], and how to reach them in a live record.
//!
//! A [`Schema`] owns the working record its field accessors point into.
//! Every decode call resolves its own schema, so concurrent reads of the
//! same record type never share a working buffer.

pub mod layout;
mod macros;
pub mod slot;

use std::any::{type_name, TypeId};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::coerce::Kind;
use crate::error::{SchemaError, SchemaResult};

pub use layout::{DynamicRecord, LayoutEntry, RecordLayout};
pub use slot::{FieldValue, Slot};

/// Reaches one field inside a record.
pub type Accessor<R> = Arc<dyn Fn(&mut R) -> &mut (dyn Slot) + Send + Sync>;

/// Wrap a closure as an [`Accessor`].
pub fn accessor<R, F>(f: F) -> Accessor<R>
where
    F: Fn(&mut R) -> &mut (dyn Slot) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// A record type whose annotated fields can be decoded from CSV rows.
///
/// Usually implemented through [`csv_record!`](crate::csv_record).
pub trait Record: Default + Clone + 'static {
    /// Register the annotated fields, in declaration order.
    fn describe(schema: &mut SchemaBuilder<Self>);
}

/// One decodable field of a record.
pub struct FieldDescriptor<R> {
    name: String,
    kind: Kind,
    access: Accessor<R>,
}

impl<R> FieldDescriptor<R> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    /// The field's storage inside `record`.
    pub fn target<'a>(&self, record: &'a mut R) -> &'a mut dyn Slot {
        (self.access)(record)
    }
}

impl<R> Clone for FieldDescriptor<R> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            kind: self.kind.clone(),
            access: Arc::clone(&self.access),
        }
    }
}

impl<R> fmt::Debug for FieldDescriptor<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish()
    }
}

/// The flattened, ordered field list of one record type plus the working
/// record the fields point into.
pub struct Schema<R> {
    fields: Vec<FieldDescriptor<R>>,
    working: R,
}

impl<R: Record> Schema<R> {
    /// Resolve `R` against a freshly defaulted working record.
    pub fn resolve() -> SchemaResult<Self> {
        let mut builder = SchemaBuilder::<R>::new();
        builder.stack.push(TypeId::of::<R>());
        R::describe(&mut builder);
        let schema = builder.finish(R::default())?;
        debug!(
            record = type_name::<R>(),
            fields = schema.len(),
            "resolved schema"
        );
        Ok(schema)
    }
}

impl<R> Schema<R> {
    pub fn fields(&self) -> &[FieldDescriptor<R>] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name())
    }

    /// The working record in its current state.
    pub fn working(&self) -> &R {
        &self.working
    }

    pub(crate) fn split_mut(&mut self) -> (&[FieldDescriptor<R>], &mut R) {
        (&self.fields, &mut self.working)
    }
}

impl<R> fmt::Debug for Schema<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}

/// Resolve the schema of `R`.
pub fn resolve<R: Record>() -> SchemaResult<Schema<R>> {
    Schema::resolve()
}

/// Collects field descriptors while a record describes itself.
pub struct SchemaBuilder<R> {
    fields: Vec<FieldDescriptor<R>>,
    /// Record types currently being described, outermost first.
    stack: Vec<TypeId>,
    error: Option<SchemaError>,
}

impl<R: 'static> Default for SchemaBuilder<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: 'static> SchemaBuilder<R> {
    pub fn new() -> Self {
        Self {
            fields: Vec::new(),
            stack: Vec::new(),
            error: None,
        }
    }

    /// Bind column `name` to the field `access` reaches.
    pub fn field<V, F>(&mut self, name: &str, access: F) -> &mut Self
    where
        V: FieldValue,
        F: Fn(&mut R) -> &mut V + Send + Sync + 'static,
    {
        self.push(
            name,
            V::kind(),
            accessor(move |r: &mut R| access(r) as &mut dyn Slot),
        )
    }

    /// Splice the annotated fields of sub-record `S` in at this position.
    pub fn embedded<S, F>(&mut self, access: F) -> &mut Self
    where
        S: Record,
        F: Fn(&mut R) -> &mut S + Send + Sync + 'static,
    {
        if self.error.is_some() {
            return self;
        }
        if self.stack.contains(&TypeId::of::<S>()) {
            self.error = Some(SchemaError::EmbeddingCycle(type_name::<S>()));
            return self;
        }

        let mut inner = SchemaBuilder::<S>::new();
        inner.stack = self.stack.clone();
        inner.stack.push(TypeId::of::<S>());
        S::describe(&mut inner);
        if let Some(err) = inner.error {
            self.error = Some(err);
            return self;
        }

        let access = Arc::new(access);
        for field in inner.fields {
            let outer = Arc::clone(&access);
            let nested = field.access;
            self.fields.push(FieldDescriptor {
                name: field.name,
                kind: field.kind,
                access: accessor(move |r: &mut R| nested(outer(r))),
            });
        }
        self
    }

    /// Register a field with an explicit kind and accessor.
    pub fn push(&mut self, name: &str, kind: Kind, access: Accessor<R>) -> &mut Self {
        self.fields.push(FieldDescriptor {
            name: name.to_string(),
            kind,
            access,
        });
        self
    }

    /// Validate the collected fields and pair them with `working`.
    pub fn finish(self, working: R) -> SchemaResult<Schema<R>> {
        if let Some(err) = self.error {
            return Err(err);
        }

        let mut seen = HashSet::with_capacity(self.fields.len());
        for (idx, field) in self.fields.iter().enumerate() {
            if field.name.is_empty() {
                return Err(SchemaError::EmptyName(idx));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(SchemaError::DuplicateField(field.name.clone()));
            }
        }

        Ok(Schema {
            fields: self.fields,
            working,
        })
    }
}
