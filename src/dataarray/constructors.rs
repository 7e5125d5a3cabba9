//! Constructors generic over the record type.
//!
//! ```rust,ignore
//! let da = zeros::<Image>(&Alloc::new(&[2, 3]), Fields::new().with("mask", array![0, 0]))?;
//! ```
//!
//! Every constructor builds a record instance from keyword values first (missing fields take
//! their declared defaults, array values are cast to the declared dtype) and then assembles it.
//! The allocating forms fill the data field themselves; passing it explicitly is an error.
use smallvec::SmallVec;
use tracing::trace;

use crate::{
    array::{ArrayError, NdArray, Order},
    attributes::AttributeValue,
    consts::DEFAULT_DTYPE,
    dataarray::{
        AssemblyError, DataArray, LabeledArray, Shape,
        assemble::{AssembleOptions, assemble},
    },
    dtype::DataType,
    record::{Fields, Record, RecordError, Value},
    schema::{FieldModel, Role, Schema, schema_of},
};

/// Shape, dtype and memory order of a freshly allocated data buffer.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Alloc {
    pub shape: Shape,
    /// Falls back to the data field's declared dtype, then to `f64`.
    pub dtype: Option<DataType>,
    pub order: Order,
}

impl Alloc {
    pub fn new(shape: &[usize]) -> Self {
        Self {
            shape: SmallVec::from_slice(shape),
            ..Self::default()
        }
    }

    pub fn dtype(mut self, dtype: DataType) -> Self {
        self.dtype = Some(dtype);
        self
    }

    pub fn order(mut self, order: Order) -> Self {
        self.order = order;
        self
    }
}

/// Build an `R` from `fields` and assemble it into a [`DataArray`].
pub fn new<R: Record>(fields: Fields) -> Result<DataArray, AssemblyError> {
    new_with::<R, DataArray>(fields, &AssembleOptions::default())
}

pub fn new_with<R: Record, A: LabeledArray>(
    fields: Fields,
    options: &AssembleOptions,
) -> Result<A, AssemblyError> {
    let schema = schema_of::<R>()?;
    let record: R = instantiate(&schema, fields)?;
    assemble(&schema, |name| record.field(name), options)
}

/// How a freshly allocated data buffer is filled.
#[derive(Debug, Clone, PartialEq)]
pub enum Fill {
    /// The dtype's default value. Same contents as [`Fill::Zeros`].
    Empty,
    Zeros,
    Ones,
    /// Without any dtype the buffer takes the fill value's own type.
    Full(AttributeValue),
}

impl Fill {
    fn buffer(&self, alloc: &Alloc, dtype: Option<DataType>) -> Result<NdArray, ArrayError> {
        match self {
            Fill::Empty | Fill::Zeros => {
                NdArray::zeros(&alloc.shape, dtype.unwrap_or(DEFAULT_DTYPE), alloc.order)
            }
            Fill::Ones => NdArray::ones(&alloc.shape, dtype.unwrap_or(DEFAULT_DTYPE), alloc.order),
            Fill::Full(value) => NdArray::full(&alloc.shape, value, dtype, alloc.order),
        }
    }
}

/// Default-initialised data buffer. Same contents as [`zeros`].
pub fn empty<R: Record>(alloc: &Alloc, fields: Fields) -> Result<DataArray, AssemblyError> {
    allocate_with::<R, DataArray>(alloc, Fill::Empty, fields, &AssembleOptions::default())
}

pub fn zeros<R: Record>(alloc: &Alloc, fields: Fields) -> Result<DataArray, AssemblyError> {
    allocate_with::<R, DataArray>(alloc, Fill::Zeros, fields, &AssembleOptions::default())
}

pub fn ones<R: Record>(alloc: &Alloc, fields: Fields) -> Result<DataArray, AssemblyError> {
    allocate_with::<R, DataArray>(alloc, Fill::Ones, fields, &AssembleOptions::default())
}

/// Without any dtype the buffer takes the fill value's own type.
pub fn full<R: Record>(
    alloc: &Alloc,
    fill_value: impl Into<AttributeValue>,
    fields: Fields,
) -> Result<DataArray, AssemblyError> {
    let fill = Fill::Full(fill_value.into());
    allocate_with::<R, DataArray>(alloc, fill, fields, &AssembleOptions::default())
}

/// Allocate the data buffer of `R`, fill it and assemble into any [`LabeledArray`] container.
pub fn allocate_with<R: Record, A: LabeledArray>(
    alloc: &Alloc,
    fill: Fill,
    mut fields: Fields,
    options: &AssembleOptions,
) -> Result<A, AssemblyError> {
    let schema = schema_of::<R>()?;
    let data = schema.data();
    if fields.contains(&data.name) {
        return Err(RecordError::Conflict {
            field: data.name.clone(),
        }
        .into());
    }

    let values = fill
        .buffer(alloc, alloc.dtype.or(data.dtype()))
        .map_err(|source| AssemblyError::Array {
            field: data.name.clone(),
            source,
        })?;
    trace!(
        record = schema.type_name,
        shape = ?alloc.shape,
        dtype = %values.data_type(),
        order = ?alloc.order,
        "allocated data buffer"
    );
    fields.insert(data.name.clone(), values);
    new_with::<R, A>(fields, options)
}

/// Complete `fields` with defaults, coerce array values and build the instance in one step.
pub(crate) fn instantiate<R: Record>(
    schema: &Schema,
    mut fields: Fields,
) -> Result<R, AssemblyError> {
    if let Some(unknown) = fields.names().find(|name| schema.field(name).is_none()) {
        return Err(RecordError::UnknownField {
            field: unknown.into(),
        }
        .into());
    }

    let mut complete = Fields::new();
    for field in schema.fields() {
        let value = match fields.remove(&field.name) {
            Some(value) => value,
            None => field
                .default
                .clone()
                .ok_or_else(|| RecordError::MissingField {
                    field: field.name.clone(),
                })?,
        };
        complete.insert(field.name.clone(), coerce(field, value)?);
    }
    Ok(R::from_fields(complete)?)
}

fn coerce(field: &FieldModel, value: Value) -> Result<Value, AssemblyError> {
    match (field.role, field.dtype(), value) {
        (Role::Data | Role::Coordinate, Some(dtype), Value::Array(values)) => values
            .astype(dtype)
            .map(Value::Array)
            .map_err(|source| AssemblyError::Array {
                field: field.name.clone(),
                source,
            }),
        (_, _, value) => Ok(value),
    }
}
