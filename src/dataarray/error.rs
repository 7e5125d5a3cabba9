use compact_str::CompactString;
use thiserror::Error;

use crate::{
    array::ArrayError,
    dataarray::Shape,
    record::RecordError,
    schema::{Dims, SchemaError},
};

/// Errors raised while turning a record instance into a labeled array.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AssemblyError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Record(#[from] RecordError),

    #[error("field {field:?}: {source}")]
    Array {
        field: CompactString,
        #[source]
        source: ArrayError,
    },

    #[error("field {field:?} has no value and no default")]
    MissingValue { field: CompactString },

    #[error("data field {field:?} declares dimensions {dims:?} but its value has shape {shape:?}")]
    DataShape {
        field: CompactString,
        dims: Dims,
        shape: Shape,
    },

    #[error("dimension names {dims:?} do not match an array of shape {shape:?}")]
    DimsMismatch { dims: Dims, shape: Shape },

    #[error("reference has no size for dimension {dim:?}")]
    MissingReferenceDim { dim: CompactString },

    #[error(
        "coordinate {field:?} over {dims:?} expects shape {expected:?} but its value has shape {actual:?}"
    )]
    CoordinateShape {
        field: CompactString,
        dims: Dims,
        expected: Shape,
        actual: Shape,
    },

    #[error("array has no dimension {dim:?}")]
    UnknownDimension { dim: CompactString },

    #[error("dimension {dim:?} is given more than once")]
    DuplicateDimension { dim: CompactString },

    #[error("name field {field:?} must hold a scalar")]
    InvalidName { field: CompactString },

    #[error("field {field:?}: {source}")]
    Nested {
        field: CompactString,
        #[source]
        source: Box<AssemblyError>,
    },

    #[error("dimension {dim:?} has size {existing} but field {field:?} gives it size {found}")]
    SizeConflict {
        field: CompactString,
        dim: CompactString,
        existing: usize,
        found: usize,
    },
}
