//! Array assembly.
//!
//! Assembly reads every field of a record instance through its compiled [`Schema`] and builds a
//! labeled array in one pass:
//! 1. the data value becomes the base array, cast to the declared dtype and, given a reference,
//!    broadcast to the reference sizes
//! 2. each coordinate is attached in declaration order, either as given (its shape equals the
//!    base array's sizes along the coordinate dims) or broadcast from a scalar
//! 3. attributes are attached verbatim
//! 4. the name, if declared and not null, is set last
//!
//! Fields declared with [`Annotation::array_of`](crate::schema::Annotation::array_of) are
//! assembled through the nested record's own schema first. Their value is either a
//! [`Value::Record`] holding the nested fields, or the nested data value alone with every other
//! nested field taken from its default. A nested coordinate keeps the nested attributes and is
//! renamed after the nested array's name when it has one.
//!
//! Any failure aborts the whole assembly; the partially built container is dropped.
use compact_str::{CompactString, ToCompactString};
use tracing::trace;

use crate::{
    array::{ArrayError, NdArray, Order},
    attributes::AttributeValue,
    dataarray::{AssemblyError, Coordinate, DataArray, Labeled, LabeledArray, Shape, Sizes},
    dtype::DataType,
    record::{Fields, Record, Value},
    schema::{Dims, FieldModel, Schema, schema_of},
};

#[derive(Debug, Clone, Default)]
pub struct AssembleOptions {
    /// Dimension sizes the data values are broadcast to.
    pub reference: Option<Sizes>,
}

impl AssembleOptions {
    pub fn with_reference(mut self, reference: Sizes) -> Self {
        self.reference = Some(reference);
        self
    }
}

/// Assemble `record` into a [`DataArray`].
pub fn as_data_array<R: Record>(record: &R) -> Result<DataArray, AssemblyError> {
    as_data_array_with(record, &AssembleOptions::default())
}

/// Assemble `record` into any [`LabeledArray`] container.
pub fn as_data_array_with<R: Record, A: LabeledArray>(
    record: &R,
    options: &AssembleOptions,
) -> Result<A, AssemblyError> {
    let schema = schema_of::<R>()?;
    assemble(&schema, |name| record.field(name), options)
}

/// Assemble from a schema and a field reader. Fields the reader doesn't return fall back to
/// their declared default.
pub fn assemble<A, F>(schema: &Schema, read: F, options: &AssembleOptions) -> Result<A, AssemblyError>
where
    A: LabeledArray,
    F: Fn(&str) -> Option<Value>,
{
    let data = schema.data();
    let value = read_field(data, &read)?;
    let mut array = match &data.nested {
        Some(nested) => {
            let inner = nested_array(data, nested, value, options.reference.clone())?;
            replay::<A>(inner)?
        }
        None => A::construct(data_values(data, value, options)?, to_dims(data))?,
    };

    let coordinates = attach_coordinates(&mut array, schema, &read)?;
    attach_attributes(&mut array, schema, &read)?;

    if let Some(field) = schema.name_field() {
        let name = read_field(field, &read)?
            .as_scalar()
            .ok_or_else(|| AssemblyError::InvalidName {
                field: field.name.clone(),
            })?;
        if name != AttributeValue::Null {
            array.set_name(name);
        }
    }

    trace!(record = schema.type_name, coordinates, "assembled data array");
    Ok(array)
}

/// Attach every coordinate of `schema` to `target`, returning how many were attached.
pub(crate) fn attach_coordinates<L, F>(
    target: &mut L,
    schema: &Schema,
    read: &F,
) -> Result<usize, AssemblyError>
where
    L: Labeled,
    F: Fn(&str) -> Option<Value>,
{
    let mut attached = 0;
    for field in schema.coordinates() {
        let dims = to_dims(field);
        let expected = target.sizes_along(&dims)?;
        let value = read_field(field, read)?;
        let (name, coord) = match &field.nested {
            Some(nested) => {
                let reference = dims.iter().cloned().zip(expected.iter().copied()).collect();
                let DataArray {
                    values, attrs, name, ..
                } = nested_array(field, nested, value, Some(reference))?;
                let name = name.map_or_else(|| field.name.clone(), |n| n.to_compact_string());
                (name, Coordinate::new(dims, values).with_attrs(attrs))
            }
            None => {
                let values = coordinate_values(field, value, &expected)?;
                (field.name.clone(), Coordinate::new(dims, values))
            }
        };
        target.attach_coordinate(&name, coord)?;
        attached += 1;
    }
    Ok(attached)
}

pub(crate) fn attach_attributes<L, F>(
    target: &mut L,
    schema: &Schema,
    read: &F,
) -> Result<(), AssemblyError>
where
    L: Labeled,
    F: Fn(&str) -> Option<Value>,
{
    for field in schema.attributes() {
        target.attach_attribute(&field.name, read_field(field, read)?);
    }
    Ok(())
}

pub(crate) fn read_field<F>(field: &FieldModel, read: &F) -> Result<Value, AssemblyError>
where
    F: Fn(&str) -> Option<Value>,
{
    read(&field.name)
        .or_else(|| field.default.clone())
        .ok_or_else(|| AssemblyError::MissingValue {
            field: field.name.clone(),
        })
}

pub(crate) fn to_dims(field: &FieldModel) -> Dims {
    field.dims().iter().cloned().collect()
}

fn array_error(field: &FieldModel) -> impl Fn(ArrayError) -> AssemblyError + '_ {
    move |source| AssemblyError::Array {
        field: field.name.clone(),
        source,
    }
}

fn cast(values: NdArray, dtype: Option<DataType>) -> Result<NdArray, ArrayError> {
    match dtype {
        Some(dtype) => values.astype(dtype),
        None => Ok(values),
    }
}

/// Assemble the value of a field declared with a nested record type.
pub(crate) fn nested_array(
    field: &FieldModel,
    nested: &Schema,
    value: Value,
    reference: Option<Sizes>,
) -> Result<DataArray, AssemblyError> {
    let fields = match value {
        Value::Record(fields) => fields,
        value => Fields::new().with(nested.data().name.clone(), value),
    };
    let options = AssembleOptions { reference };
    assemble(nested, |name| fields.get(name).cloned(), &options).map_err(|source| {
        AssemblyError::Nested {
            field: field.name.clone(),
            source: Box::new(source),
        }
    })
}

/// Move a nested data array into the caller's container type.
fn replay<A: LabeledArray>(inner: DataArray) -> Result<A, AssemblyError> {
    let DataArray {
        values,
        dims,
        coords,
        attrs,
        name,
    } = inner;
    let mut array = A::construct(values, dims)?;
    for (coord_name, coord) in coords {
        array.attach_coordinate(&coord_name, coord)?;
    }
    for (attr_name, value) in attrs {
        array.attach_attribute(&attr_name, value);
    }
    if let Some(name) = name {
        array.set_name(name);
    }
    Ok(array)
}

pub(crate) fn data_values(
    field: &FieldModel,
    value: Value,
    options: &AssembleOptions,
) -> Result<NdArray, AssemblyError> {
    let values = value.into_array().map_err(array_error(field))?;
    let mut values = cast(values, field.dtype()).map_err(array_error(field))?;

    if let Some(reference) = &options.reference {
        let target = if values.is_scalar() && !field.dims().is_empty() {
            Some(reference_shape(field.dims(), reference)?)
        } else if values.ndim() == field.dims().len() {
            // dims the reference does not size keep their own length
            let shape: Shape = field
                .dims()
                .iter()
                .zip(values.shape())
                .map(|(dim, &len)| reference.get(dim).unwrap_or(len))
                .collect();
            Some(shape).filter(|shape| shape.as_slice() != values.shape())
        } else {
            None
        };
        if let Some(shape) = target {
            values = values.broadcast_to(&shape).map_err(array_error(field))?;
        }
    }

    if values.ndim() != field.dims().len() {
        return Err(AssemblyError::DataShape {
            field: field.name.clone(),
            dims: to_dims(field),
            shape: values.shape().into(),
        });
    }
    Ok(values)
}

fn reference_shape(dims: &[CompactString], reference: &Sizes) -> Result<Shape, AssemblyError> {
    dims.iter()
        .map(|dim| {
            reference
                .get(dim)
                .ok_or_else(|| AssemblyError::MissingReferenceDim { dim: dim.clone() })
        })
        .collect()
}

fn coordinate_values(
    field: &FieldModel,
    value: Value,
    expected: &[usize],
) -> Result<NdArray, AssemblyError> {
    match value {
        Value::Scalar(scalar) => {
            NdArray::full(expected, &scalar, field.dtype(), Order::C).map_err(array_error(field))
        }
        Value::Array(values) if values.shape() == expected => {
            cast(values, field.dtype()).map_err(array_error(field))
        }
        Value::Array(values) if values.is_scalar() => cast(values, field.dtype())
            .and_then(|values| values.broadcast_to(expected))
            .map_err(array_error(field)),
        Value::Array(values) => Err(AssemblyError::CoordinateShape {
            field: field.name.clone(),
            dims: to_dims(field),
            expected: expected.into(),
            actual: values.shape().into(),
        }),
        Value::Record(_) => Err(array_error(field)(ArrayError::NestedRecord)),
    }
}
