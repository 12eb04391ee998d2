//! The three-dimensional extent shared by every buffer a [`Layer`][crate::layer::Layer] owns.
//!
//! [`Shape`] is a value object: once built its `length` is fixed and never
//! recomputed, mirroring `leaf`'s `Blob` shape handling but collapsed to the
//! fixed (rows, cols, depth) triple this engine actually needs.

use crate::error::PetalError;

/// Three positive dimensions plus their derived element count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shape {
    rows: usize,
    cols: usize,
    depth: usize,
    length: usize,
}

impl Shape {
    /// Build a `Shape`, deriving `length = rows * cols * depth`.
    ///
    /// Fails with [`PetalError::ShapeZero`] if any dimension is zero, or
    /// [`PetalError::ShapeTooBig`] if the product overflows `usize`.
    pub fn new(rows: usize, cols: usize, depth: usize) -> Result<Shape, PetalError> {
        if rows == 0 || cols == 0 || depth == 0 {
            return Err(PetalError::ShapeZero);
        }
        let length = rows
            .checked_mul(cols)
            .and_then(|rc| rc.checked_mul(depth))
            .ok_or(PetalError::ShapeTooBig)?;
        Ok(Shape { rows, cols, depth, length })
    }

    /// A flat, one-row, one-channel shape of the given length. Convenient
    /// for dense layers, whose inputs/outputs are plain vectors.
    pub fn flat(length: usize) -> Result<Shape, PetalError> {
        Shape::new(1, length, 1)
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Depth (channel count).
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// `rows * cols * depth`.
    pub fn length(&self) -> usize {
        self.length
    }

    /// Returns an error unless `self` and `other` have the same length.
    pub fn require_eq_length(&self, other: &Shape) -> Result<(), PetalError> {
        if self.length != other.length {
            return Err(PetalError::ShapesNotEqual);
        }
        Ok(())
    }
}

#[cfg(test)]
mod shape_spec {
    use super::*;

    #[test]
    fn derives_length() {
        let s = Shape::new(2, 3, 4).unwrap();
        assert_eq!(s.length(), 24);
    }

    #[test]
    fn rejects_zero_dimension() {
        assert_eq!(Shape::new(0, 3, 4).unwrap_err(), PetalError::ShapeZero);
    }

    #[test]
    fn rejects_overflow() {
        assert_eq!(
            Shape::new(usize::MAX, 2, 2).unwrap_err(),
            PetalError::ShapeTooBig
        );
    }

    #[test]
    fn flat_is_single_row_and_channel() {
        let s = Shape::flat(10).unwrap();
        assert_eq!((s.rows(), s.cols(), s.depth(), s.length()), (1, 10, 1, 10));
    }

    #[test]
    fn length_mismatch_is_reported() {
        let a = Shape::flat(4).unwrap();
        let b = Shape::flat(5).unwrap();
        assert_eq!(a.require_eq_length(&b).unwrap_err(), PetalError::ShapesNotEqual);
    }
}
