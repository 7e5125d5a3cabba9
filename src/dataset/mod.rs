//! Datasets: several data variables sharing one set of dimensions, coordinates and attributes.
//!
//! A dataset record marks each data variable with
//! [`Annotation::data_var`](crate::schema::Annotation::data_var) (a field named `data` counts as
//! one too) and is compiled with [`dataset_schema_of`](crate::schema::dataset_schema_of). Every
//! data variable must agree with the others on the size of each dimension it shares with them.
use compact_str::CompactString;

use crate::{
    dataarray::{
        AssemblyError, Coordinate, DataArray, Labeled, Shape, Sizes, check_dims, upsert,
    },
    record::Value,
};

pub mod assemble;

pub use assemble::{as_dataset, as_dataset_with, new, new_with};

/// Container the dataset assembler populates.
pub trait LabeledDataset: Labeled + Sized {
    /// A dataset with no variables.
    fn construct() -> Result<Self, AssemblyError>;

    fn attach_data_var(&mut self, name: &str, var: DataArray) -> Result<(), AssemblyError>;
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    data_vars: Vec<(CompactString, DataArray)>,
    coords: Vec<(CompactString, Coordinate)>,
    attrs: Vec<(CompactString, Value)>,
    sizes: Vec<(CompactString, usize)>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn data_var(&self, name: &str) -> Option<&DataArray> {
        self.data_vars.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Data variables in attachment order.
    pub fn data_vars(&self) -> impl Iterator<Item = (&str, &DataArray)> {
        self.data_vars.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Dimension sizes, in order of first appearance.
    pub fn sizes(&self) -> Sizes {
        self.sizes.iter().cloned().collect()
    }

    pub fn coord(&self, name: &str) -> Option<&Coordinate> {
        self.coords.iter().find(|(n, _)| n == name).map(|(_, c)| c)
    }

    pub fn coords(&self) -> impl Iterator<Item = (&str, &Coordinate)> {
        self.coords.iter().map(|(n, c)| (n.as_str(), c))
    }

    pub fn attr(&self, name: &str) -> Option<&Value> {
        self.attrs.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn attrs(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.attrs.iter().map(|(n, v)| (n.as_str(), v))
    }

    fn size_of(&self, dim: &str) -> Option<usize> {
        self.sizes.iter().find(|(d, _)| d == dim).map(|(_, n)| *n)
    }
}

impl LabeledDataset for Dataset {
    fn construct() -> Result<Self, AssemblyError> {
        Ok(Dataset::new())
    }

    fn attach_data_var(&mut self, name: &str, var: DataArray) -> Result<(), AssemblyError> {
        let sizes = var.sizes();
        for (dim, found) in sizes.iter() {
            match self.size_of(dim) {
                Some(existing) if existing != found => {
                    return Err(AssemblyError::SizeConflict {
                        field: name.into(),
                        dim: dim.into(),
                        existing,
                        found,
                    });
                }
                Some(_) => {}
                None => self.sizes.push((dim.into(), found)),
            }
        }
        upsert(&mut self.data_vars, name, var);
        Ok(())
    }
}

impl Labeled for Dataset {
    fn sizes_along(&self, dims: &[CompactString]) -> Result<Shape, AssemblyError> {
        dims.iter()
            .map(|dim| {
                self.size_of(dim)
                    .ok_or_else(|| AssemblyError::UnknownDimension { dim: dim.clone() })
            })
            .collect()
    }

    fn attach_coordinate(&mut self, name: &str, coord: Coordinate) -> Result<(), AssemblyError> {
        check_dims(&coord.dims, coord.shape())?;
        let expected = self.sizes_along(&coord.dims)?;
        if expected.as_slice() != coord.shape() {
            return Err(AssemblyError::CoordinateShape {
                field: name.into(),
                dims: coord.dims,
                expected,
                actual: coord.values.shape().into(),
            });
        }
        upsert(&mut self.coords, name, coord);
        Ok(())
    }

    fn attach_attribute(&mut self, name: &str, value: Value) {
        upsert(&mut self.attrs, name, value);
    }
}

#[cfg(test)]
mod tests {
    use ndarray::{Array1, Array2, array};

    use super::*;
    use crate::schema::Dims;

    fn dims(names: &[&str]) -> Dims {
        names.iter().map(|n| (*n).into()).collect()
    }

    fn var(shape: (usize, usize)) -> DataArray {
        DataArray::new(Array2::<f64>::zeros(shape).into(), dims(&["x", "y"])).unwrap()
    }

    #[test]
    fn variables_share_dimension_sizes() {
        let mut ds = Dataset::new();
        ds.attach_data_var("red", var((2, 3))).unwrap();
        let t = DataArray::new(Array1::<f64>::zeros(4).into(), dims(&["t"])).unwrap();
        ds.attach_data_var("t", t).unwrap();
        let expected: Sizes = [("x", 2), ("y", 3), ("t", 4)].into_iter().collect();
        assert_eq!(ds.sizes(), expected);

        let err = ds.attach_data_var("green", var((2, 5))).unwrap_err();
        assert_eq!(err, AssemblyError::SizeConflict {
            field: "green".into(),
            dim: "y".into(),
            existing: 3,
            found: 5,
        });
        assert!(ds.data_var("green").is_none());
        assert_eq!(ds.data_vars().count(), 2);
    }

    #[test]
    fn coordinates_follow_dataset_sizes() {
        let mut ds = Dataset::new();
        ds.attach_data_var("red", var((2, 3))).unwrap();
        ds.attach_coordinate("y", Coordinate::new(dims(&["y"]), array![0i64, 1, 2].into()))
            .unwrap();
        assert_eq!(ds.coord("y").unwrap().shape(), &[3]);

        let err = ds
            .attach_coordinate("x", Coordinate::new(dims(&["x"]), array![0i64].into()))
            .unwrap_err();
        assert!(matches!(err, AssemblyError::CoordinateShape { .. }));

        let err = ds
            .attach_coordinate("z", Coordinate::new(dims(&["z"]), array![0i64].into()))
            .unwrap_err();
        assert_eq!(err, AssemblyError::UnknownDimension { dim: "z".into() });
    }
}
