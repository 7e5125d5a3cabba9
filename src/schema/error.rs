use compact_str::CompactString;
use thiserror::Error;

use crate::schema::Dims;

/// Model invariant errors, raised when a record type is compiled.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    /// A data or coordinate field came out of classification without an array spec.
    #[error("field {field:?} was not assigned a usable role")]
    Unclassified { field: CompactString },

    #[error("{declared} fields declared but {classified} classified")]
    FieldCount { declared: usize, classified: usize },

    #[error("expected exactly one data field, found {count}: {fields:?}")]
    DataFieldCount {
        count: usize,
        fields: Vec<CompactString>,
    },

    #[error("a dataset record needs at least one data field")]
    NoDataVariables,

    #[error("expected at most one name field, found {count}: {fields:?}")]
    NameFieldCount {
        count: usize,
        fields: Vec<CompactString>,
    },

    #[error("field {field:?} is declared more than once")]
    DuplicateField { field: CompactString },

    #[error(
        "coordinate {field:?} spans dimensions {excess:?} that are not data dimensions {data:?}"
    )]
    CoordinateDims {
        field: CompactString,
        excess: Dims,
        data: Dims,
    },

    #[error("record type {type_name} nests itself")]
    RecursiveRecord { type_name: &'static str },

    #[error("field {field:?} nests an invalid record type: {source}")]
    Nested {
        field: CompactString,
        source: Box<SchemaError>,
    },
}
