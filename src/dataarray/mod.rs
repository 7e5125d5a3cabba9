//! Labeled arrays and their assembly from record instances.
//!
//! ```text
//!                  ┌──────────────────────── DataArray ───────────────────────┐
//! record ──read──▶ │ values: NdArray   dims: [x, y]                           │
//!                  │ coords: { mask: Coordinate([x], NdArray) , ... }         │
//!                  │ attrs:  { scale: 2.0, ... }     name: "t"                │
//!                  └──────────────────────────────────────────────────────────┘
//! ```
//!
//! [`LabeledArray`] is the interface the assembler builds against. [`DataArray`] is the
//! container shipped with this crate; callers with their own labeled-array type implement the
//! trait and pass it to [`as_data_array_with`].
use compact_str::CompactString;
use smallvec::SmallVec;

use crate::{array::NdArray, attributes::AttributeValue, record::Value, schema::Dims};

pub mod assemble;
pub mod constructors;
pub mod error;

pub use assemble::{AssembleOptions, as_data_array, as_data_array_with};
pub use constructors::{Alloc, Fill, allocate_with, empty, full, new, new_with, ones, zeros};
pub use error::AssemblyError;

pub type Shape = SmallVec<[usize; 4]>;

/// Size of each named dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sizes(Vec<(CompactString, usize)>);

impl Sizes {
    pub fn get(&self, dim: &str) -> Option<usize> {
        self.0.iter().find(|(d, _)| d == dim).map(|(_, n)| *n)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.0.iter().map(|(d, n)| (d.as_str(), *n))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<CompactString>> FromIterator<(K, usize)> for Sizes {
    fn from_iter<I: IntoIterator<Item = (K, usize)>>(iter: I) -> Self {
        Sizes(iter.into_iter().map(|(d, n)| (d.into(), n)).collect())
    }
}

/// A coordinate array, the dimensions it spans and its own attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Coordinate {
    pub dims: Dims,
    pub values: NdArray,
    /// Set when the coordinate was assembled from a nested record.
    pub attrs: Vec<(CompactString, Value)>,
}

impl Coordinate {
    pub fn new(dims: Dims, values: NdArray) -> Self {
        Self {
            dims,
            values,
            attrs: Vec::new(),
        }
    }

    pub fn with_attrs(mut self, attrs: Vec<(CompactString, Value)>) -> Self {
        self.attrs = attrs;
        self
    }

    pub fn shape(&self) -> &[usize] {
        self.values.shape()
    }

    pub fn attr(&self, name: &str) -> Option<&Value> {
        self.attrs.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}

/// Coordinate and attribute slots shared by labeled arrays and datasets.
///
/// Implementations own the values they are given; the assembler never reads them back except
/// through [`Labeled::sizes_along`].
pub trait Labeled {
    /// Sizes of `dims`, in the given order.
    fn sizes_along(&self, dims: &[CompactString]) -> Result<Shape, AssemblyError>;

    fn attach_coordinate(&mut self, name: &str, coord: Coordinate) -> Result<(), AssemblyError>;

    fn attach_attribute(&mut self, name: &str, value: Value);
}

/// Container the array assembler populates.
pub trait LabeledArray: Labeled + Sized {
    /// Build the base array from the data values and their dimension names.
    fn construct(values: NdArray, dims: Dims) -> Result<Self, AssemblyError>;

    fn set_name(&mut self, name: AttributeValue);
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataArray {
    values: NdArray,
    dims: Dims,
    coords: Vec<(CompactString, Coordinate)>,
    attrs: Vec<(CompactString, Value)>,
    name: Option<AttributeValue>,
}

impl DataArray {
    /// A bare array with named dimensions; one name per axis, no repeats.
    pub fn new(values: NdArray, dims: Dims) -> Result<Self, AssemblyError> {
        check_dims(&dims, values.shape())?;
        Ok(Self {
            values,
            dims,
            coords: Vec::new(),
            attrs: Vec::new(),
            name: None,
        })
    }

    pub fn values(&self) -> &NdArray {
        &self.values
    }

    pub fn into_values(self) -> NdArray {
        self.values
    }

    pub fn dims(&self) -> &[CompactString] {
        &self.dims
    }

    pub fn shape(&self) -> &[usize] {
        self.values.shape()
    }

    pub fn sizes(&self) -> Sizes {
        self.dims
            .iter()
            .cloned()
            .zip(self.shape().iter().copied())
            .collect()
    }

    pub fn coord(&self, name: &str) -> Option<&Coordinate> {
        self.coords.iter().find(|(n, _)| n == name).map(|(_, c)| c)
    }

    /// Coordinates in attachment order.
    pub fn coords(&self) -> impl Iterator<Item = (&str, &Coordinate)> {
        self.coords.iter().map(|(n, c)| (n.as_str(), c))
    }

    pub fn attr(&self, name: &str) -> Option<&Value> {
        self.attrs.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn attrs(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.attrs.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn name(&self) -> Option<&AttributeValue> {
        self.name.as_ref()
    }
}

impl LabeledArray for DataArray {
    fn construct(values: NdArray, dims: Dims) -> Result<Self, AssemblyError> {
        DataArray::new(values, dims)
    }

    fn set_name(&mut self, name: AttributeValue) {
        self.name = Some(name);
    }
}

impl Labeled for DataArray {
    fn sizes_along(&self, dims: &[CompactString]) -> Result<Shape, AssemblyError> {
        dims.iter()
            .map(|dim| {
                self.dims
                    .iter()
                    .position(|d| d == dim)
                    .map(|axis| self.shape()[axis])
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

/// Replace the entry called `name`, or append it.
pub(crate) fn upsert<T>(entries: &mut Vec<(CompactString, T)>, name: &str, value: T) {
    match entries.iter_mut().find(|(n, _)| n == name) {
        Some((_, existing)) => *existing = value,
        None => entries.push((name.into(), value)),
    }
}

pub(crate) fn check_dims(dims: &Dims, shape: &[usize]) -> Result<(), AssemblyError> {
    if dims.len() != shape.len() {
        return Err(AssemblyError::DimsMismatch {
            dims: dims.clone(),
            shape: shape.into(),
        });
    }
    for (i, dim) in dims.iter().enumerate() {
        if dims[..i].contains(dim) {
            return Err(AssemblyError::DuplicateDimension { dim: dim.clone() });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use ndarray::{Array2, array};

    use super::*;

    fn dims(names: &[&str]) -> Dims {
        names.iter().map(|n| (*n).into()).collect()
    }

    fn grid() -> DataArray {
        DataArray::new(Array2::<f64>::zeros((3, 4)).into(), dims(&["x", "y"])).unwrap()
    }

    #[test]
    fn new_checks_dimension_names() {
        let values = NdArray::from(array![1.0, 2.0]);
        let err = DataArray::new(values.clone(), dims(&["x", "y"])).unwrap_err();
        assert!(matches!(err, AssemblyError::DimsMismatch { .. }));

        let values = NdArray::from(Array2::<i64>::zeros((2, 2)));
        let err = DataArray::new(values, dims(&["x", "x"])).unwrap_err();
        assert_eq!(err, AssemblyError::DuplicateDimension { dim: "x".into() });
    }

    #[test]
    fn sizes_follow_requested_order() {
        let da = grid();
        assert_eq!(da.sizes_along(&dims(&["y", "x"])).unwrap().as_slice(), &[4, 3]);
        assert_eq!(da.sizes().get("y"), Some(4));
        assert!(matches!(
            da.sizes_along(&dims(&["z"])),
            Err(AssemblyError::UnknownDimension { .. })
        ));
    }

    #[test]
    fn attach_coordinate_checks_sizes() {
        let mut da = grid();
        let ok = Coordinate::new(dims(&["y"]), array![0i64, 1, 2, 3].into());
        da.attach_coordinate("y", ok).unwrap();
        assert_eq!(da.coord("y").unwrap().shape(), &[4]);

        let bad = Coordinate::new(dims(&["x"]), array![0i64, 1].into());
        let err = da.attach_coordinate("x", bad).unwrap_err();
        match err {
            AssemblyError::CoordinateShape {
                field,
                expected,
                actual,
                ..
            } => {
                assert_eq!(field, "x");
                assert_eq!(expected.as_slice(), &[3]);
                assert_eq!(actual.as_slice(), &[2]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(da.coord("x").is_none());
    }

    #[test]
    fn reattaching_replaces() {
        let mut da = grid();
        da.attach_attribute("units", Value::from("m"));
        da.attach_attribute("units", Value::from("km"));
        assert_eq!(da.attrs().count(), 1);
        assert_eq!(da.attr("units"), Some(&Value::from("km")));

        da.set_name(AttributeValue::from("t"));
        assert_eq!(da.name(), Some(&AttributeValue::from("t")));
    }
}
