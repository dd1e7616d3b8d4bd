//! # Intensity arrays
//!
//! Grayscale sample grids consumed by the disparity algorithms, plus the stereo pair that binds a
//! left and right array of identical shape.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use image::GrayImage;

use crate::error::*;

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

/// A row-major grid of integer intensity samples.
///
/// Samples are stored as `i32` so that differences between two arrays can never overflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntensityArray {
    width: usize,
    height: usize,
    data: Vec<i32>
}

/// A left/right pair of intensity arrays with identical dimensions.
#[derive(Debug, Clone)]
pub struct StereoPair {
    pub left: IntensityArray,
    pub right: IntensityArray
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl IntensityArray {
    /// Build an array by evaluating `f(x, y)` at every sample.
    pub fn from_fn<F>(width: usize, height: usize, mut f: F) -> Self
    where
        F: FnMut(usize, usize) -> i32
    {
        let mut data = Vec::with_capacity(width * height);

        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }

        Self { width, height, data }
    }

    /// Build an array from row-major samples.
    pub fn from_vec(width: usize, height: usize, data: Vec<i32>) -> Result<Self> {
        if data.len() != width * height {
            return Err(Error::InvalidParameter(format!(
                "intensity data holds {} samples but a {}x{} array needs {}",
                data.len(), width, height, width * height
            )));
        }

        Ok(Self { width, height, data })
    }

    /// Copy the samples of an 8-bit grayscale image.
    pub fn from_luma(img: &GrayImage) -> Self {
        Self {
            width: img.width() as usize,
            height: img.height() as usize,
            data: img.pixels().map(|p| p[0] as i32).collect()
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Dimensions as `(width, height)`.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn get(&self, x: usize, y: usize) -> i32 {
        self.data[y * self.width + x]
    }

    /// The samples of row `y` from column `x` onwards, `len` long.
    pub(crate) fn row_span(&self, x: usize, y: usize, len: usize) -> &[i32] {
        let start = y * self.width + x;
        &self.data[start..start + len]
    }
}

impl StereoPair {
    /// Pair two arrays, failing if their dimensions differ.
    pub fn new(left: IntensityArray, right: IntensityArray) -> Result<Self> {
        if left.dimensions() != right.dimensions() {
            return Err(Error::ShapeMismatch {
                what: "right intensity array",
                expected: left.dimensions(),
                found: right.dimensions()
            });
        }

        Ok(Self { left, right })
    }

    pub fn width(&self) -> usize {
        self.left.width()
    }

    pub fn height(&self) -> usize {
        self.left.height()
    }
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_fn_is_row_major() {
        let arr = IntensityArray::from_fn(4, 3, |x, y| (10 * y + x) as i32);

        assert_eq!(arr.dimensions(), (4, 3));
        assert_eq!(arr.get(3, 0), 3);
        assert_eq!(arr.get(0, 2), 20);
        assert_eq!(arr.row_span(1, 1, 3), &[11, 12, 13]);
    }

    #[test]
    fn from_luma_copies_samples() {
        let img = GrayImage::from_fn(3, 2, |x, y| image::Luma([(x + 3 * y) as u8 * 40]));
        let arr = IntensityArray::from_luma(&img);

        assert_eq!(arr.dimensions(), (3, 2));
        assert_eq!(arr.get(2, 1), 200);
    }

    #[test]
    fn from_vec_checks_length() {
        assert!(IntensityArray::from_vec(2, 2, vec![0; 4]).is_ok());
        assert!(matches!(
            IntensityArray::from_vec(2, 2, vec![0; 5]),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn pair_rejects_mismatched_shapes() {
        let left = IntensityArray::from_fn(5, 5, |_, _| 0);
        let right = IntensityArray::from_fn(5, 4, |_, _| 0);

        match StereoPair::new(left, right) {
            Err(Error::ShapeMismatch { expected, found, .. }) => {
                assert_eq!(expected, (5, 5));
                assert_eq!(found, (5, 4));
            }
            other => panic!("expected shape mismatch, got {:?}", other)
        }
    }
}
