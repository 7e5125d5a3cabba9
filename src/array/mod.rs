//! Dynamically typed n-dimensional arrays.
//!
//! [`NdArray`] wraps an `ndarray::ArrayD` for every supported [`DataType`]. It is the raw value
//! buffer of data and coordinate fields: the assembler coerces it to a declared dtype with
//! [`NdArray::astype`], expands scalars with [`NdArray::broadcast_to`] and allocates fresh buffers
//! with [`NdArray::full`] / [`NdArray::zeros`] / [`NdArray::ones`].
//!
//! ## Typing model
//! The element type is a runtime property ([`NdArray::data_type`]); typed access goes through
//! [`ArrayDataType`]:
//! ```rust,ignore
//! use labeled_records::array::NdArray;
//!
//! let nd = NdArray::from(ndarray::array![[1.0, 2.0], [3.0, 4.0]]);
//! let typed = nd.as_array::<f64>().unwrap();
//! assert_eq!(typed[[1, 0]], 3.0);
//! ```
//!
//! ## Memory order
//! [`Order`] only affects the strides of a freshly allocated buffer. The logical shape and the
//! element order seen through indexing are identical for `Order::C` and `Order::F`.
use std::str::FromStr;

use ndarray::{ArrayD, Dimension, IxDyn, ShapeBuilder};
use num_traits::{NumCast, ToPrimitive, Zero};

use crate::{array::util::num_elements, attributes::AttributeValue, dtype::DataType};

pub mod datatype;
pub mod error;
pub mod util;

pub use datatype::ArrayDataType;
pub use error::ArrayError;

/// Memory layout of an allocated buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum Order {
    /// Row-major.
    #[default]
    C,
    /// Column-major.
    F,
}

impl FromStr for Order {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "C" | "c" => Ok(Order::C),
            "F" | "f" => Ok(Order::F),
            other => Err(format!("unknown memory order: {other:?}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NdArray {
    I8(ArrayD<i8>),
    I16(ArrayD<i16>),
    I32(ArrayD<i32>),
    I64(ArrayD<i64>),
    U8(ArrayD<u8>),
    U16(ArrayD<u16>),
    U32(ArrayD<u32>),
    U64(ArrayD<u64>),
    F32(ArrayD<f32>),
    F64(ArrayD<f64>),
    Bool(ArrayD<bool>),
    Utf8(ArrayD<String>),
}

macro_rules! with_array {
    ($value:expr, $a:ident => $body:expr) => {
        match $value {
            NdArray::I8($a) => $body,
            NdArray::I16($a) => $body,
            NdArray::I32($a) => $body,
            NdArray::I64($a) => $body,
            NdArray::U8($a) => $body,
            NdArray::U16($a) => $body,
            NdArray::U32($a) => $body,
            NdArray::U64($a) => $body,
            NdArray::F32($a) => $body,
            NdArray::F64($a) => $body,
            NdArray::Bool($a) => $body,
            NdArray::Utf8($a) => $body,
        }
    };
}

macro_rules! map_array {
    ($value:expr, $a:ident => $body:expr) => {
        match $value {
            NdArray::I8($a) => NdArray::I8($body),
            NdArray::I16($a) => NdArray::I16($body),
            NdArray::I32($a) => NdArray::I32($body),
            NdArray::I64($a) => NdArray::I64($body),
            NdArray::U8($a) => NdArray::U8($body),
            NdArray::U16($a) => NdArray::U16($body),
            NdArray::U32($a) => NdArray::U32($body),
            NdArray::U64($a) => NdArray::U64($body),
            NdArray::F32($a) => NdArray::F32($body),
            NdArray::F64($a) => NdArray::F64($body),
            NdArray::Bool($a) => NdArray::Bool($body),
            NdArray::Utf8($a) => NdArray::Utf8($body),
        }
    };
}

macro_rules! with_dtype {
    ($dtype:expr, $t:ident => $body:expr) => {
        match $dtype {
            DataType::I8 => {
                type $t = i8;
                $body
            }
            DataType::I16 => {
                type $t = i16;
                $body
            }
            DataType::I32 => {
                type $t = i32;
                $body
            }
            DataType::I64 => {
                type $t = i64;
                $body
            }
            DataType::U8 => {
                type $t = u8;
                $body
            }
            DataType::U16 => {
                type $t = u16;
                $body
            }
            DataType::U32 => {
                type $t = u32;
                $body
            }
            DataType::U64 => {
                type $t = u64;
                $body
            }
            DataType::F32 => {
                type $t = f32;
                $body
            }
            DataType::F64 => {
                type $t = f64;
                $body
            }
            DataType::Bool => {
                type $t = bool;
                $body
            }
            DataType::Utf8 => {
                type $t = String;
                $body
            }
        }
    };
}

impl NdArray {
    /// A 0-dimensional array holding `value` in its natural dtype
    /// (`Integer` -> `i64`, `Float` -> `f64`, `Boolean` -> `bool`, `String` -> `utf8`).
    pub fn from_scalar(value: &AttributeValue) -> Result<Self, ArrayError> {
        let dtype = natural_dtype(value)?;
        Self::full(&[], value, Some(dtype), Order::C)
    }

    /// Allocate an array of `shape` with every element set to `fill_value`.
    ///
    /// Without an explicit `dtype` the fill value's natural dtype is used.
    pub fn full(
        shape: &[usize],
        fill_value: &AttributeValue,
        dtype: Option<DataType>,
        order: Order,
    ) -> Result<Self, ArrayError> {
        let dtype = match dtype {
            Some(dtype) => dtype,
            None => natural_dtype(fill_value)?,
        };
        with_dtype!(dtype, T => {
            let elem = T::from_scalar(fill_value)?;
            Ok(T::into_nd(filled(shape, order, elem)?))
        })
    }

    /// Allocate an array of `shape` filled with the dtype's default (zero, `false`, `""`).
    pub fn zeros(shape: &[usize], dtype: DataType, order: Order) -> Result<Self, ArrayError> {
        with_dtype!(dtype, T => Ok(T::into_nd(filled(shape, order, T::default())?)))
    }

    pub fn ones(shape: &[usize], dtype: DataType, order: Order) -> Result<Self, ArrayError> {
        Self::full(shape, &AttributeValue::Integer(1), Some(dtype), order)
    }

    pub fn data_type(&self) -> DataType {
        with_array!(self, a => element_type(a))
    }

    pub fn shape(&self) -> &[usize] {
        with_array!(self, a => a.shape())
    }

    pub fn strides(&self) -> &[isize] {
        with_array!(self, a => a.strides())
    }

    pub fn ndim(&self) -> usize {
        self.shape().len()
    }

    pub fn len(&self) -> usize {
        with_array!(self, a => a.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `true` for 0-dimensional arrays.
    pub fn is_scalar(&self) -> bool {
        self.ndim() == 0
    }

    /// The single element of a 0-dimensional array.
    pub fn scalar(&self) -> Option<AttributeValue> {
        if !self.is_scalar() {
            return None;
        }
        with_array!(self, a => a.first().map(ArrayDataType::to_scalar))
    }

    /// Borrow the typed array if the element type is `T`.
    pub fn as_array<T: ArrayDataType>(&self) -> Option<&ArrayD<T>> {
        T::view(self)
    }

    /// Elements in logical (row-major) order as opaque scalars.
    pub fn to_scalars(&self) -> Vec<AttributeValue> {
        with_array!(self, a => a.iter().map(ArrayDataType::to_scalar).collect())
    }

    /// Broadcast to `shape` following numpy rules, returning an owned array.
    pub fn broadcast_to(&self, shape: &[usize]) -> Result<Self, ArrayError> {
        let err = || ArrayError::Broadcast {
            from: self.shape().into(),
            to: shape.into(),
        };
        num_elements(shape)?;
        Ok(map_array!(self, a => a.broadcast(IxDyn(shape)).ok_or_else(err)?.to_owned()))
    }

    /// Convert to `dtype`. Returns `self` untouched when the dtype already matches.
    pub fn astype(self, dtype: DataType) -> Result<Self, ArrayError> {
        if self.data_type() == dtype {
            return Ok(self);
        }
        Ok(match dtype {
            DataType::I8 => NdArray::I8(self.to_numeric()?),
            DataType::I16 => NdArray::I16(self.to_numeric()?),
            DataType::I32 => NdArray::I32(self.to_numeric()?),
            DataType::I64 => NdArray::I64(self.to_numeric()?),
            DataType::U8 => NdArray::U8(self.to_numeric()?),
            DataType::U16 => NdArray::U16(self.to_numeric()?),
            DataType::U32 => NdArray::U32(self.to_numeric()?),
            DataType::U64 => NdArray::U64(self.to_numeric()?),
            DataType::F32 => NdArray::F32(self.to_numeric()?),
            DataType::F64 => NdArray::F64(self.to_numeric()?),
            DataType::Bool => NdArray::Bool(self.to_bool()?),
            DataType::Utf8 => NdArray::Utf8(self.to_utf8()),
        })
    }

    fn to_numeric<T>(&self) -> Result<ArrayD<T>, ArrayError>
    where
        T: ArrayDataType + NumCast,
    {
        match self {
            NdArray::I8(a) => cast_elements(a),
            NdArray::I16(a) => cast_elements(a),
            NdArray::I32(a) => cast_elements(a),
            NdArray::I64(a) => cast_elements(a),
            NdArray::U8(a) => cast_elements(a),
            NdArray::U16(a) => cast_elements(a),
            NdArray::U32(a) => cast_elements(a),
            NdArray::U64(a) => cast_elements(a),
            NdArray::F32(a) => cast_elements(a),
            NdArray::F64(a) => cast_elements(a),
            NdArray::Bool(a) => cast_elements(&a.mapv(<u8 as From<bool>>::from)),
            NdArray::Utf8(a) => parse_elements(a),
        }
    }

    fn to_bool(&self) -> Result<ArrayD<bool>, ArrayError> {
        Ok(match self {
            NdArray::I8(a) => a.mapv(|v| !v.is_zero()),
            NdArray::I16(a) => a.mapv(|v| !v.is_zero()),
            NdArray::I32(a) => a.mapv(|v| !v.is_zero()),
            NdArray::I64(a) => a.mapv(|v| !v.is_zero()),
            NdArray::U8(a) => a.mapv(|v| !v.is_zero()),
            NdArray::U16(a) => a.mapv(|v| !v.is_zero()),
            NdArray::U32(a) => a.mapv(|v| !v.is_zero()),
            NdArray::U64(a) => a.mapv(|v| !v.is_zero()),
            NdArray::F32(a) => a.mapv(|v| !v.is_zero()),
            NdArray::F64(a) => a.mapv(|v| !v.is_zero()),
            NdArray::Bool(a) => a.clone(),
            NdArray::Utf8(a) => parse_elements(a)?,
        })
    }

    fn to_utf8(&self) -> ArrayD<String> {
        match self {
            NdArray::Utf8(a) => a.clone(),
            other => with_array!(other, a => a.map(|v| v.to_string())),
        }
    }
}

impl<T: ArrayDataType, D: Dimension> From<ndarray::Array<T, D>> for NdArray {
    fn from(array: ndarray::Array<T, D>) -> Self {
        T::into_nd(array.into_dyn())
    }
}

fn element_type<T: ArrayDataType>(_: &ArrayD<T>) -> DataType {
    T::TYPE
}

fn natural_dtype(value: &AttributeValue) -> Result<DataType, ArrayError> {
    match value {
        AttributeValue::Null => Err(ArrayError::NullValue),
        AttributeValue::String(_) => Ok(DataType::Utf8),
        AttributeValue::Integer(_) => Ok(DataType::I64),
        AttributeValue::Float(_) => Ok(DataType::F64),
        AttributeValue::Boolean(_) => Ok(DataType::Bool),
    }
}

fn filled<T: Clone>(shape: &[usize], order: Order, elem: T) -> Result<ArrayD<T>, ArrayError> {
    num_elements(shape)?;
    let dim = IxDyn(shape);
    Ok(match order {
        Order::C => ArrayD::from_elem(dim, elem),
        Order::F => ArrayD::from_elem(dim.f(), elem),
    })
}

/// Element-wise numeric cast; integers are range checked and floats truncate toward zero.
fn cast_elements<S, T>(source: &ArrayD<S>) -> Result<ArrayD<T>, ArrayError>
where
    S: Copy + ToPrimitive + std::fmt::Display,
    T: ArrayDataType + NumCast,
{
    let mut failed = None;
    let cast = source.map(|&v| match <T as NumCast>::from(v) {
        Some(elem) => elem,
        None => {
            failed.get_or_insert_with(|| v.to_string());
            T::default()
        }
    });
    match failed {
        Some(value) => Err(ArrayError::InvalidCast {
            value,
            dtype: T::TYPE,
        }),
        None => Ok(cast),
    }
}

fn parse_elements<T: ArrayDataType>(strings: &ArrayD<String>) -> Result<ArrayD<T>, ArrayError> {
    let values = strings
        .iter()
        .map(|s| T::from_scalar(&AttributeValue::String(s.clone())))
        .collect::<Result<Vec<T>, _>>()?;
    Ok(ArrayD::from_shape_vec(strings.raw_dim(), values)?)
}
