use smallvec::SmallVec;
use thiserror::Error;

use crate::dtype::DataType;

/// Errors returned by [`crate::array::NdArray`] construction, coercion and broadcasting.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ArrayError {
    /// `product(shape)` overflowed `usize` (or exceeds `isize::MAX`).
    #[error("shape element count overflow")]
    ShapeOverflow,
    /// A null scalar has no array element representation.
    #[error("null cannot be converted to an array element")]
    NullValue,
    /// A value could not be represented in the requested element type.
    #[error("cannot convert {value:?} to {dtype}")]
    InvalidCast { value: String, dtype: DataType },
    /// The source shape cannot be broadcast to the target shape.
    #[error("cannot broadcast shape {from:?} to {to:?}")]
    Broadcast {
        from: SmallVec<[usize; 4]>,
        to: SmallVec<[usize; 4]>,
    },
    /// A nested record value was given where an array is expected.
    #[error("a nested record has no array representation")]
    NestedRecord,
    #[error(transparent)]
    Shape(#[from] ndarray::ShapeError),
}
