//! Record-level invariants.
//!
//! [`check`] runs once per record type, after every field has been classified:
//! - every declared field produced a model, and data/coordinate models carry an array spec
//! - exactly one data field, or at least one for a dataset
//! - field names are unique and there is at most one name field
//! - every coordinate's dims are a subset of the data dims (order may differ); for a dataset,
//!   of the dims of all data fields together
use compact_str::CompactString;

use crate::schema::{Dims, FieldModel, Role, SchemaError, SchemaKind};

/// Validate the models of one record type, returning the index of the (first) data field.
pub fn check(kind: SchemaKind, declared: usize, fields: &[FieldModel]) -> Result<usize, SchemaError> {
    if fields.len() != declared {
        return Err(SchemaError::FieldCount {
            declared,
            classified: fields.len(),
        });
    }

    for field in fields {
        let needs_array = matches!(field.role, Role::Data | Role::Coordinate);
        if needs_array != field.array.is_some() {
            return Err(SchemaError::Unclassified {
                field: field.name.clone(),
            });
        }
    }

    let data_fields = names_of(fields, Role::Data);
    match kind {
        SchemaKind::DataArray if data_fields.len() != 1 => {
            return Err(SchemaError::DataFieldCount {
                count: data_fields.len(),
                fields: data_fields,
            });
        }
        SchemaKind::Dataset if data_fields.is_empty() => return Err(SchemaError::NoDataVariables),
        _ => {}
    }

    for (i, field) in fields.iter().enumerate() {
        if fields[..i].iter().any(|f| f.name == field.name) {
            return Err(SchemaError::DuplicateField {
                field: field.name.clone(),
            });
        }
    }

    let name_fields = names_of(fields, Role::Name);
    if name_fields.len() > 1 {
        return Err(SchemaError::NameFieldCount {
            count: name_fields.len(),
            fields: name_fields,
        });
    }

    let data_index = fields
        .iter()
        .position(|f| f.role == Role::Data)
        .ok_or(SchemaError::NoDataVariables)?;
    let mut data_dims = Dims::new();
    for dim in fields.iter().filter(|f| f.role == Role::Data).flat_map(|f| f.dims()) {
        if !data_dims.contains(dim) {
            data_dims.push(dim.clone());
        }
    }

    for coord in fields.iter().filter(|f| f.role == Role::Coordinate) {
        let excess: Dims = coord
            .dims()
            .iter()
            .filter(|dim| !data_dims.contains(dim))
            .cloned()
            .collect();
        if !excess.is_empty() {
            return Err(SchemaError::CoordinateDims {
                field: coord.name.clone(),
                excess,
                data: data_dims,
            });
        }
    }

    Ok(data_index)
}

fn names_of(fields: &[FieldModel], role: Role) -> Vec<CompactString> {
    fields
        .iter()
        .filter(|f| f.role == role)
        .map(|f| f.name.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{dtype::DataType, schema::ArraySpec};

    fn array_field(name: &str, role: Role, dims: &[&str]) -> FieldModel {
        FieldModel {
            name: name.into(),
            role,
            array: Some(ArraySpec {
                dims: dims.iter().map(|d| (*d).into()).collect(),
                dtype: Some(DataType::F64),
            }),
            default: None,
            doc: None,
            origin: None,
            nested: None,
        }
    }

    fn scalar_field(name: &str, role: Role) -> FieldModel {
        FieldModel {
            name: name.into(),
            role,
            array: None,
            default: None,
            doc: None,
            origin: None,
            nested: None,
        }
    }

    #[test]
    fn accepts_valid_model() {
        let fields = vec![
            array_field("x", Role::Coordinate, &["x"]),
            array_field("data", Role::Data, &["x", "y"]),
            array_field("yx", Role::Coordinate, &["y", "x"]),
            scalar_field("units", Role::Attribute),
            scalar_field("name", Role::Name),
        ];
        assert_eq!(check(SchemaKind::DataArray, 5, &fields).unwrap(), 1);
    }

    #[test]
    fn rejects_missing_data() {
        let fields = vec![array_field("x", Role::Coordinate, &["x"])];
        let err = check(SchemaKind::DataArray, 1, &fields).unwrap_err();
        assert_eq!(err, SchemaError::DataFieldCount {
            count: 0,
            fields: vec![]
        });
    }

    #[test]
    fn rejects_two_data_fields() {
        let fields = vec![
            array_field("data", Role::Data, &["x"]),
            array_field("data", Role::Data, &["x"]),
        ];
        let err = check(SchemaKind::DataArray, 2, &fields).unwrap_err();
        match err {
            SchemaError::DataFieldCount { count, fields } => {
                assert_eq!(count, 2);
                assert_eq!(fields, vec!["data", "data"]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn rejects_coordinate_outside_data_dims() {
        let fields = vec![
            array_field("data", Role::Data, &["x", "y"]),
            array_field("z", Role::Coordinate, &["x", "z"]),
        ];
        let err = check(SchemaKind::DataArray, 2, &fields).unwrap_err();
        match err {
            SchemaError::CoordinateDims { field, excess, .. } => {
                assert_eq!(field, "z");
                assert_eq!(excess.as_slice(), &["z"]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn dataset_accepts_several_data_fields() {
        let fields = vec![
            array_field("red", Role::Data, &["x", "y"]),
            array_field("alpha", Role::Data, &["x", "z"]),
            array_field("z", Role::Coordinate, &["z"]),
            scalar_field("units", Role::Attribute),
        ];
        assert_eq!(check(SchemaKind::Dataset, 4, &fields).unwrap(), 0);
        assert!(matches!(
            check(SchemaKind::DataArray, 4, &fields),
            Err(SchemaError::DataFieldCount { count: 2, .. })
        ));
    }

    #[test]
    fn dataset_needs_a_data_field() {
        let fields = vec![array_field("x", Role::Coordinate, &["x"])];
        assert_eq!(
            check(SchemaKind::Dataset, 1, &fields).unwrap_err(),
            SchemaError::NoDataVariables
        );
    }

    #[test]
    fn rejects_duplicate_names() {
        let fields = vec![
            array_field("data", Role::Data, &["x"]),
            scalar_field("units", Role::Attribute),
            scalar_field("units", Role::Attribute),
        ];
        assert_eq!(
            check(SchemaKind::DataArray, 3, &fields).unwrap_err(),
            SchemaError::DuplicateField {
                field: "units".into()
            }
        );
    }

    #[test]
    fn rejects_coordinate_without_spec() {
        let fields = vec![
            array_field("data", Role::Data, &["x"]),
            scalar_field("x", Role::Coordinate),
        ];
        assert_eq!(
            check(SchemaKind::DataArray, 2, &fields).unwrap_err(),
            SchemaError::Unclassified { field: "x".into() }
        );
    }

    #[test]
    fn rejects_dropped_fields() {
        let fields = vec![array_field("data", Role::Data, &["x"])];
        assert_eq!(
            check(SchemaKind::DataArray, 2, &fields).unwrap_err(),
            SchemaError::FieldCount {
                declared: 2,
                classified: 1
            }
        );
    }
}
