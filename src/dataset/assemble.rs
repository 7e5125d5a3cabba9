//! Dataset assembly.
//!
//! Each data variable is assembled on its own: cast to its declared dtype, broadcast to the
//! reference when one is given, or built through its nested record type. Variables are added in
//! declaration order and must agree on shared dimension sizes. Coordinates and attributes are
//! then attached exactly as for a data array. Datasets carry no name; a declared name field is
//! not read.
use tracing::trace;

use crate::{
    dataarray::{
        AssemblyError, DataArray,
        assemble::{
            AssembleOptions, attach_attributes, attach_coordinates, data_values, nested_array,
            read_field, to_dims,
        },
        constructors::instantiate,
    },
    dataset::{Dataset, LabeledDataset},
    record::{Fields, Record, Value},
    schema::{Schema, dataset_schema_of},
};

/// Assemble `record` into a [`Dataset`].
pub fn as_dataset<R: Record>(record: &R) -> Result<Dataset, AssemblyError> {
    as_dataset_with(record, &AssembleOptions::default())
}

/// Assemble `record` into any [`LabeledDataset`] container.
pub fn as_dataset_with<R: Record, D: LabeledDataset>(
    record: &R,
    options: &AssembleOptions,
) -> Result<D, AssemblyError> {
    let schema = dataset_schema_of::<R>()?;
    assemble(&schema, |name| record.field(name), options)
}

/// Build an `R` from `fields` and assemble it into a [`Dataset`].
pub fn new<R: Record>(fields: Fields) -> Result<Dataset, AssemblyError> {
    new_with::<R, Dataset>(fields, &AssembleOptions::default())
}

pub fn new_with<R: Record, D: LabeledDataset>(
    fields: Fields,
    options: &AssembleOptions,
) -> Result<D, AssemblyError> {
    let schema = dataset_schema_of::<R>()?;
    let record: R = instantiate(&schema, fields)?;
    assemble(&schema, |name| record.field(name), options)
}

/// Assemble from a schema and a field reader. Fields the reader doesn't return fall back to
/// their declared default.
pub fn assemble<D, F>(schema: &Schema, read: F, options: &AssembleOptions) -> Result<D, AssemblyError>
where
    D: LabeledDataset,
    F: Fn(&str) -> Option<Value>,
{
    let mut dataset = D::construct()?;

    let mut variables = 0;
    for field in schema.data_vars() {
        let value = read_field(field, &read)?;
        let var = match &field.nested {
            Some(nested) => nested_array(field, nested, value, options.reference.clone())?,
            None => DataArray::new(data_values(field, value, options)?, to_dims(field))?,
        };
        dataset.attach_data_var(&field.name, var)?;
        variables += 1;
    }

    let coordinates = attach_coordinates(&mut dataset, schema, &read)?;
    attach_attributes(&mut dataset, schema, &read)?;

    trace!(record = schema.type_name, variables, coordinates, "assembled dataset");
    Ok(dataset)
}
