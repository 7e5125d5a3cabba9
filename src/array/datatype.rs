//! Array element types.
//!
//! [`ArrayDataType`] ties a native Rust element type to its logical [`DataType`] and to the
//! matching [`NdArray`] variant. It also defines how an opaque [`AttributeValue`] scalar is
//! converted into an element, which is what scalar broadcasting and fill-value allocation rely on.
//!
//! ## Scalar conversion
//! - integers from floats truncate toward zero; out-of-range and non-finite floats fail
//! - integers from integers are range checked
//! - the same rules apply element-wise in [`NdArray::astype`]
//! - booleans convert to and from `0`/`1`
//! - strings are parsed; `Utf8` accepts any non-null scalar through its display form
//! - `Null` never converts
use ndarray::ArrayD;
use num_traits::NumCast;

use crate::{
    array::{NdArray, error::ArrayError},
    attributes::AttributeValue,
    dtype::DataType,
};

pub trait ArrayDataType: Clone + Default + std::fmt::Debug + 'static {
    /// The logical datatype for this element type.
    const TYPE: DataType;

    /// Convert an opaque scalar into an element.
    fn from_scalar(value: &AttributeValue) -> Result<Self, ArrayError>;

    /// Convert an element back into an opaque scalar.
    fn to_scalar(&self) -> AttributeValue;

    /// Wrap a typed array into its [`NdArray`] variant.
    fn into_nd(array: ArrayD<Self>) -> NdArray;

    /// Borrow the typed array if `array` holds this element type.
    fn view(array: &NdArray) -> Option<&ArrayD<Self>>;
}

fn invalid_cast(value: &AttributeValue, dtype: DataType) -> ArrayError {
    ArrayError::InvalidCast {
        value: value.to_string(),
        dtype,
    }
}

fn parse_scalar<T: std::str::FromStr>(
    s: &str,
    value: &AttributeValue,
    dtype: DataType,
) -> Result<T, ArrayError> {
    s.trim().parse().map_err(|_| invalid_cast(value, dtype))
}

macro_rules! impl_array_datatype_integer {
    ($ty:ty, $dtype:ident) => {
        impl ArrayDataType for $ty {
            const TYPE: DataType = DataType::$dtype;

            fn from_scalar(value: &AttributeValue) -> Result<Self, ArrayError> {
                match value {
                    AttributeValue::Integer(v) => {
                        <$ty>::try_from(*v).map_err(|_| invalid_cast(value, Self::TYPE))
                    }
                    AttributeValue::Float(v) => {
                        <$ty as NumCast>::from(*v).ok_or_else(|| invalid_cast(value, Self::TYPE))
                    }
                    AttributeValue::Boolean(v) => Ok(<$ty as From<bool>>::from(*v)),
                    AttributeValue::String(s) => parse_scalar(s, value, Self::TYPE),
                    AttributeValue::Null => Err(ArrayError::NullValue),
                }
            }

            fn to_scalar(&self) -> AttributeValue {
                match i64::try_from(*self) {
                    Ok(v) => AttributeValue::Integer(v),
                    Err(_) => AttributeValue::Float(*self as f64),
                }
            }

            fn into_nd(array: ArrayD<Self>) -> NdArray {
                NdArray::$dtype(array)
            }

            fn view(array: &NdArray) -> Option<&ArrayD<Self>> {
                match array {
                    NdArray::$dtype(a) => Some(a),
                    _ => None,
                }
            }
        }
    };
}

macro_rules! impl_array_datatype_float {
    ($ty:ty, $dtype:ident) => {
        impl ArrayDataType for $ty {
            const TYPE: DataType = DataType::$dtype;

            fn from_scalar(value: &AttributeValue) -> Result<Self, ArrayError> {
                match value {
                    AttributeValue::Integer(v) => Ok(*v as $ty),
                    AttributeValue::Float(v) => Ok(*v as $ty),
                    AttributeValue::Boolean(v) => Ok(if *v { 1.0 } else { 0.0 }),
                    AttributeValue::String(s) => parse_scalar(s, value, Self::TYPE),
                    AttributeValue::Null => Err(ArrayError::NullValue),
                }
            }

            fn to_scalar(&self) -> AttributeValue {
                AttributeValue::Float(<f64 as From<$ty>>::from(*self))
            }

            fn into_nd(array: ArrayD<Self>) -> NdArray {
                NdArray::$dtype(array)
            }

            fn view(array: &NdArray) -> Option<&ArrayD<Self>> {
                match array {
                    NdArray::$dtype(a) => Some(a),
                    _ => None,
                }
            }
        }
    };
}

impl ArrayDataType for bool {
    const TYPE: DataType = DataType::Bool;

    fn from_scalar(value: &AttributeValue) -> Result<Self, ArrayError> {
        match value {
            AttributeValue::Boolean(v) => Ok(*v),
            AttributeValue::Integer(v) => Ok(*v != 0),
            AttributeValue::Float(v) => Ok(*v != 0.0),
            AttributeValue::String(s) => parse_scalar(s, value, Self::TYPE),
            AttributeValue::Null => Err(ArrayError::NullValue),
        }
    }

    fn to_scalar(&self) -> AttributeValue {
        AttributeValue::Boolean(*self)
    }

    fn into_nd(array: ArrayD<Self>) -> NdArray {
        NdArray::Bool(array)
    }

    fn view(array: &NdArray) -> Option<&ArrayD<Self>> {
        match array {
            NdArray::Bool(a) => Some(a),
            _ => None,
        }
    }
}

impl ArrayDataType for String {
    const TYPE: DataType = DataType::Utf8;

    fn from_scalar(value: &AttributeValue) -> Result<Self, ArrayError> {
        match value {
            AttributeValue::Null => Err(ArrayError::NullValue),
            other => Ok(other.to_string()),
        }
    }

    fn to_scalar(&self) -> AttributeValue {
        AttributeValue::String(self.clone())
    }

    fn into_nd(array: ArrayD<Self>) -> NdArray {
        NdArray::Utf8(array)
    }

    fn view(array: &NdArray) -> Option<&ArrayD<Self>> {
        match array {
            NdArray::Utf8(a) => Some(a),
            _ => None,
        }
    }
}

impl_array_datatype_integer!(i8, I8);
impl_array_datatype_integer!(i16, I16);
impl_array_datatype_integer!(i32, I32);
impl_array_datatype_integer!(i64, I64);
impl_array_datatype_integer!(u8, U8);
impl_array_datatype_integer!(u16, U16);
impl_array_datatype_integer!(u32, U32);
impl_array_datatype_integer!(u64, U64);
impl_array_datatype_float!(f32, F32);
impl_array_datatype_float!(f64, F64);
