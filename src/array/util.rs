use crate::array::error::ArrayError;

/// Element count implied by `shape`, rejecting counts `ndarray` cannot allocate.
pub fn num_elements(shape: &[usize]) -> Result<usize, ArrayError> {
    shape
        .iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(d))
        .filter(|&n| n <= isize::MAX as usize)
        .ok_or(ArrayError::ShapeOverflow)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_shape_has_one_element() {
        assert_eq!(num_elements(&[]).unwrap(), 1);
        assert_eq!(num_elements(&[3, 0, 2]).unwrap(), 0);
    }

    #[test]
    fn rejects_overflow() {
        assert!(matches!(
            num_elements(&[usize::MAX, 2]),
            Err(ArrayError::ShapeOverflow)
        ));
    }
}
