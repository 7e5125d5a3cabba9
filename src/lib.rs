//! Declare labeled n-dimensional arrays as plain record types.
//!
//! A record type lists its fields with type [`Annotation`]s; the field named `data` holds the
//! values, array-typed fields become coordinates, everything else becomes an attribute and the
//! field named `name` sets the display name. Record types are compiled once into a [`Schema`]
//! and instances are assembled into a [`DataArray`], or into a [`Dataset`] when several fields
//! are marked as data variables.
pub mod array;
pub mod attributes;
pub mod consts;
pub mod dataarray;
pub mod dataset;
pub mod dtype;
pub mod record;
pub mod schema;

pub use array::{NdArray, Order};
pub use attributes::AttributeValue;
pub use dataarray::{
    Alloc, AssembleOptions, AssemblyError, Coordinate, DataArray, Fill, Labeled, LabeledArray,
    Sizes, as_data_array, as_data_array_with,
};
pub use dataset::{Dataset, LabeledDataset, as_dataset, as_dataset_with};
pub use dtype::DataType;
pub use record::{FieldDecl, Fields, Record, RecordError, Value};
pub use schema::{
    Annotation, FieldMeta, Role, Schema, SchemaError, SchemaKind, dataset_schema_of,
    is_data_array_record, is_dataset_record, schema_of,
};
