//! Compiled record schemas.
//!
//! A record type is compiled once into a [`Schema`]: one [`FieldModel`] per declared field, in
//! declaration order, each tagged with its [`Role`]. Compilation ([`builder::schema_of`]) runs
//! the classifier over every field, validates the result ([`validate::check`]) and caches the
//! schema for the lifetime of the process.
//!
//! ```text
//! record type ──declare()──▶ [FieldDecl] ──classify──▶ [FieldModel] ──check──▶ Arc<Schema>
//!                                                                                │
//!                                           cached by (TypeId, SchemaKind) ◀─────┘
//! ```
//!
//! The same record type may be compiled as a data array ([`schema_of`]) and as a dataset
//! ([`dataset_schema_of`]); the two differ only in how many data fields they accept.
use std::sync::Arc;

use compact_str::CompactString;
use smallvec::SmallVec;

use crate::{dtype::DataType, record::Value};

pub mod annotation;
pub mod builder;
pub mod error;
pub mod validate;

pub use annotation::{Annotation, FieldMeta};
pub use builder::{
    build_dataset_schema, build_schema, dataset_schema_of, is_data_array_record,
    is_dataset_record, schema_of,
};
pub use error::SchemaError;

pub type Dims = SmallVec<[CompactString; 4]>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Role {
    /// The raw values of the array.
    Data,
    /// A named axis.
    Coordinate,
    /// Opaque scalar metadata.
    Attribute,
    /// The display name of the array.
    Name,
}

/// What a schema assembles into.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize,
)]
pub enum SchemaKind {
    /// Exactly one data field.
    #[default]
    DataArray,
    /// One or more data fields, each a data variable.
    Dataset,
}

/// Dimensions and element type of an array field.
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct ArraySpec {
    pub dims: Dims,
    pub dtype: Option<DataType>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct FieldModel {
    pub name: CompactString,
    pub role: Role,
    /// Set for data and coordinate fields.
    pub array: Option<ArraySpec>,
    #[serde(skip)]
    pub default: Option<Value>,
    pub doc: Option<String>,
    /// Record type the array spec was taken from.
    pub origin: Option<&'static str>,
    /// Compiled schema of that record type.
    #[serde(skip)]
    pub nested: Option<Arc<Schema>>,
}

impl FieldModel {
    pub fn dims(&self) -> &[CompactString] {
        match &self.array {
            Some(spec) => spec.dims.as_slice(),
            None => &[],
        }
    }

    pub fn dtype(&self) -> Option<DataType> {
        self.array.as_ref().and_then(|spec| spec.dtype)
    }

    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }
}

#[derive(Debug, PartialEq, serde::Serialize)]
pub struct Schema {
    pub type_name: &'static str,
    pub kind: SchemaKind,
    fields: Vec<FieldModel>,
    #[serde(skip)]
    data_index: usize,
}

impl Schema {
    pub(crate) fn new(
        type_name: &'static str,
        kind: SchemaKind,
        fields: Vec<FieldModel>,
        data_index: usize,
    ) -> Self {
        Self {
            type_name,
            kind,
            fields,
            data_index,
        }
    }

    /// All field models, in declaration order.
    pub fn fields(&self) -> &[FieldModel] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldModel> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// The data field; the first one for dataset schemas.
    pub fn data(&self) -> &FieldModel {
        &self.fields[self.data_index]
    }

    pub fn data_vars(&self) -> impl Iterator<Item = &FieldModel> {
        self.of_role(Role::Data)
    }

    pub fn coordinates(&self) -> impl Iterator<Item = &FieldModel> {
        self.of_role(Role::Coordinate)
    }

    pub fn attributes(&self) -> impl Iterator<Item = &FieldModel> {
        self.of_role(Role::Attribute)
    }

    pub fn name_field(&self) -> Option<&FieldModel> {
        self.of_role(Role::Name).next()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn of_role(&self, role: Role) -> impl Iterator<Item = &FieldModel> {
        self.fields.iter().filter(move |f| f.role == role)
    }
}
