//! Record types.
//!
//! A record type is a plain Rust type that declares its fields through [`Record::declare`]:
//! one field holds the raw values (`data`), the others declare coordinates, attributes and the
//! display name through their [`Annotation`]s. The record type is compiled once into a
//! [`crate::schema::Schema`] and every instance is then assembled into a labeled array.
//!
//! ```rust,ignore
//! struct Image {
//!     data: NdArray,
//!     mask: Value,
//!     scale: f64,
//!     name: String,
//! }
//!
//! impl Record for Image {
//!     fn declare() -> Vec<FieldDecl> {
//!         vec![
//!             FieldDecl::new("data", Annotation::array(["x", "y"], DataType::F64)),
//!             FieldDecl::new("mask", Annotation::array(["x"], DataType::I64)),
//!             FieldDecl::new("scale", Annotation::of::<f64>()).with_default(1.0),
//!             FieldDecl::new("name", Annotation::of::<String>()),
//!         ]
//!     }
//!     // ...
//! }
//! ```
use compact_str::CompactString;
use thiserror::Error;

use crate::{
    array::{ArrayDataType, ArrayError, NdArray},
    attributes::AttributeValue,
    schema::annotation::Annotation,
};

/// Runtime value of a record field.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Array(NdArray),
    Scalar(AttributeValue),
    /// Field values of a nested record instance, for fields declared with
    /// [`Annotation::array_of`].
    Record(Fields),
}

impl Value {
    /// Snapshot every declared field of `record`.
    pub fn from_record<R: Record>(record: &R) -> Self {
        Value::Record(
            R::declare()
                .into_iter()
                .filter_map(|decl| record.field(&decl.name).map(|value| (decl.name, value)))
                .collect(),
        )
    }

    /// `true` for scalars and 0-dimensional arrays.
    pub fn is_scalar(&self) -> bool {
        match self {
            Value::Array(nd) => nd.is_scalar(),
            Value::Scalar(_) => true,
            Value::Record(_) => false,
        }
    }

    /// The value as an array; scalars become 0-dimensional arrays.
    pub fn into_array(self) -> Result<NdArray, ArrayError> {
        match self {
            Value::Array(nd) => Ok(nd),
            Value::Scalar(s) => NdArray::from_scalar(&s),
            Value::Record(_) => Err(ArrayError::NestedRecord),
        }
    }

    /// The value as a scalar, if it is one.
    pub fn as_scalar(&self) -> Option<AttributeValue> {
        match self {
            Value::Array(nd) => nd.scalar(),
            Value::Scalar(s) => Some(s.clone()),
            Value::Record(_) => None,
        }
    }

    fn kind(&self) -> String {
        match self {
            Value::Array(nd) => format!("{} array of shape {:?}", nd.data_type(), nd.shape()),
            Value::Scalar(AttributeValue::Null) => "null".to_string(),
            Value::Scalar(AttributeValue::String(_)) => "string".to_string(),
            Value::Scalar(AttributeValue::Integer(_)) => "integer".to_string(),
            Value::Scalar(AttributeValue::Float(_)) => "float".to_string(),
            Value::Scalar(AttributeValue::Boolean(_)) => "boolean".to_string(),
            Value::Record(fields) => format!("record with {} fields", fields.len()),
        }
    }
}

impl From<Fields> for Value {
    fn from(value: Fields) -> Self {
        Value::Record(value)
    }
}

impl From<NdArray> for Value {
    fn from(value: NdArray) -> Self {
        Value::Array(value)
    }
}

impl From<AttributeValue> for Value {
    fn from(value: AttributeValue) -> Self {
        Value::Scalar(value)
    }
}

impl<T: ArrayDataType, D: ndarray::Dimension> From<ndarray::Array<T, D>> for Value {
    fn from(value: ndarray::Array<T, D>) -> Self {
        Value::Array(value.into())
    }
}

macro_rules! impl_value_from_scalar {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::Scalar(value.into())
                }
            }
        )*
    };
}

impl_value_from_scalar!(&str, String, i32, i64, f64, bool);

/// A value did not have the shape or type a record field expects.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("expected {expected}, found {found}")]
pub struct ValueTypeError {
    pub expected: &'static str,
    pub found: String,
}

impl ValueTypeError {
    fn new(expected: &'static str, value: &Value) -> Self {
        Self {
            expected,
            found: value.kind(),
        }
    }
}

impl TryFrom<Value> for NdArray {
    type Error = ValueTypeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Array(nd) => Ok(nd),
            Value::Scalar(ref s) => {
                NdArray::from_scalar(s).map_err(|_| ValueTypeError::new("array", &value))
            }
            Value::Record(_) => Err(ValueTypeError::new("array", &value)),
        }
    }
}

impl TryFrom<Value> for AttributeValue {
    type Error = ValueTypeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        value
            .as_scalar()
            .ok_or_else(|| ValueTypeError::new("scalar", &value))
    }
}

impl TryFrom<Value> for f64 {
    type Error = ValueTypeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        value
            .as_scalar()
            .and_then(|s| s.as_f64())
            .ok_or_else(|| ValueTypeError::new("float", &value))
    }
}

impl TryFrom<Value> for i64 {
    type Error = ValueTypeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        value
            .as_scalar()
            .and_then(|s| s.as_i64())
            .ok_or_else(|| ValueTypeError::new("integer", &value))
    }
}

impl TryFrom<Value> for bool {
    type Error = ValueTypeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        value
            .as_scalar()
            .and_then(|s| s.as_bool())
            .ok_or_else(|| ValueTypeError::new("boolean", &value))
    }
}

impl TryFrom<Value> for String {
    type Error = ValueTypeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value.as_scalar() {
            Some(AttributeValue::String(s)) => Ok(s),
            _ => Err(ValueTypeError::new("string", &value)),
        }
    }
}

impl TryFrom<Value> for Fields {
    type Error = ValueTypeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Record(fields) => Ok(fields),
            other => Err(ValueTypeError::new("record", &other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecordError {
    #[error("missing value for required field {field:?}")]
    MissingField { field: CompactString },

    #[error("record has no field named {field:?}")]
    UnknownField { field: CompactString },

    #[error("field {field:?} is filled by the constructor and cannot be passed explicitly")]
    Conflict { field: CompactString },

    #[error("field {field:?}: {source}")]
    Value {
        field: CompactString,
        #[source]
        source: ValueTypeError,
    },
}

/// One declared field: name, type annotation and optional default.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub name: CompactString,
    pub annotation: Annotation,
    pub default: Option<Value>,
}

impl FieldDecl {
    pub fn new(name: impl Into<CompactString>, annotation: Annotation) -> Self {
        Self {
            name: name.into(),
            annotation,
            default: None,
        }
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }
}

/// Named field values, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields {
    entries: Vec<(CompactString, Value)>,
}

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Fields::insert`].
    pub fn with(mut self, name: impl Into<CompactString>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Insert or replace a value, returning the replaced one.
    pub fn insert(
        &mut self,
        name: impl Into<CompactString>,
        value: impl Into<Value>,
    ) -> Option<Value> {
        let name = name.into();
        let value = value.into();
        if let Some(idx) = self.entries.iter().position(|(n, _)| *n == name) {
            return Some(std::mem::replace(&mut self.entries[idx].1, value));
        }
        self.entries.push((name, value));
        None
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let idx = self.entries.iter().position(|(n, _)| n == name)?;
        Some(self.entries.remove(idx).1)
    }

    /// Remove a required field and convert it into the record's field type.
    pub fn take<T>(&mut self, name: &str) -> Result<T, RecordError>
    where
        T: TryFrom<Value, Error = ValueTypeError>,
    {
        let value = self
            .remove(name)
            .ok_or_else(|| RecordError::MissingField { field: name.into() })?;
        T::try_from(value).map_err(|source| RecordError::Value {
            field: name.into(),
            source,
        })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<CompactString>, V: Into<Value>> FromIterator<(K, V)> for Fields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fields = Fields::new();
        for (name, value) in iter {
            fields.insert(name, value);
        }
        fields
    }
}

impl IntoIterator for Fields {
    type Item = (CompactString, Value);
    type IntoIter = std::vec::IntoIter<(CompactString, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// A record type whose instances assemble into a labeled array.
pub trait Record: Sized + 'static {
    /// Declared fields, in declaration order.
    fn declare() -> Vec<FieldDecl>;

    /// Current value of a declared field.
    ///
    /// Returning `None` falls back to the field's declared default.
    fn field(&self, name: &str) -> Option<Value>;

    /// Build an instance from a complete set of field values.
    ///
    /// Every declared field is present; defaults are already applied and array values are
    /// already coerced to their declared dtype.
    fn from_fields(fields: Fields) -> Result<Self, RecordError>;
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    #[test]
    fn insert_replaces_in_place() {
        let mut fields = Fields::new().with("a", 1).with("b", 2.0);
        let old = fields.insert("a", "x");
        assert_eq!(old, Some(Value::from(1)));
        assert_eq!(fields.names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(fields.get("a"), Some(&Value::from("x")));
    }

    #[test]
    fn take_converts_and_removes() {
        let mut fields = Fields::new()
            .with("scale", 2.0)
            .with("data", array![1.0, 2.0]);
        let scale: f64 = fields.take("scale").unwrap();
        assert_eq!(scale, 2.0);
        let data: NdArray = fields.take("data").unwrap();
        assert_eq!(data.shape(), &[2]);
        assert!(fields.is_empty());
    }

    #[test]
    fn take_reports_field_and_kind() {
        let mut fields = Fields::new().with("label", 3);
        let err = fields.take::<String>("label").unwrap_err();
        match err {
            RecordError::Value { field, source } => {
                assert_eq!(field, "label");
                assert_eq!(source.expected, "string");
                assert_eq!(source.found, "integer");
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(matches!(
            fields.take::<f64>("scale"),
            Err(RecordError::MissingField { .. })
        ));
    }

    #[test]
    fn integers_are_accepted_as_floats() {
        assert_eq!(f64::try_from(Value::from(3)).unwrap(), 3.0);
    }

    #[test]
    fn zero_dimensional_array_is_a_scalar() {
        let nd = NdArray::from_scalar(&AttributeValue::Boolean(true)).unwrap();
        let value = Value::from(nd);
        assert!(value.is_scalar());
        assert!(bool::try_from(value).unwrap());
    }

    #[test]
    fn nested_record_is_not_an_array() {
        let value = Value::from(Fields::new().with("data", 1));
        assert!(!value.is_scalar());
        assert_eq!(value.as_scalar(), None);
        assert!(matches!(value.clone().into_array(), Err(ArrayError::NestedRecord)));
        let err = NdArray::try_from(value).unwrap_err();
        assert_eq!(err.found, "record with 1 fields");
    }

    #[test]
    fn scalar_becomes_zero_dimensional_array() {
        let nd = NdArray::try_from(Value::from(1.5)).unwrap();
        assert!(nd.is_scalar());
        assert!(NdArray::try_from(Value::Scalar(AttributeValue::Null)).is_err());
    }
}
