//! # General disparity objects
//!
//! This module provides the disparity matrix and the trait implemented by disparity algorithms.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use image::GrayImage;

use crate::error::*;
use crate::intensity::StereoPair;

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

/// A row-major grid of integer disparities.
///
/// Each cell is the horizontal pixel offset at which the left window best matched the right
/// image, so values are never negative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisparityMatrix {
    width: usize,
    height: usize,
    data: Vec<u32>
}

// -----------------------------------------------------------------------------------------------
// TRAITS
// -----------------------------------------------------------------------------------------------

pub trait DisparityAlgorithm {
    /// Compute the disparity matrix of the given stereo pair.
    fn compute(&self, pair: &StereoPair) -> Result<DisparityMatrix>;
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl DisparityMatrix {
    /// Create a zero-filled matrix.
    pub fn new(width: usize, height: usize) -> Self {
        DisparityMatrix {
            width,
            height,
            data: vec![0; width * height]
        }
    }

    /// Build a matrix from row-major values.
    pub fn from_vec(width: usize, height: usize, data: Vec<u32>) -> Result<Self> {
        if data.len() != width * height {
            return Err(Error::InvalidParameter(format!(
                "disparity data holds {} values but a {}x{} matrix needs {}",
                data.len(), width, height, width * height
            )));
        }

        Ok(DisparityMatrix { width, height, data })
    }

    /// Build a matrix from row-major values already known to fit `width * height`.
    pub(crate) fn from_parts(width: usize, height: usize, data: Vec<u32>) -> Self {
        debug_assert_eq!(data.len(), width * height);
        DisparityMatrix { width, height, data }
    }

    /// Build a matrix from a list of equally long rows.
    pub fn from_rows(rows: Vec<Vec<u32>>) -> Result<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, |r| r.len());

        if rows.iter().any(|r| r.len() != width) {
            return Err(Error::InvalidParameter(
                "disparity rows have differing lengths".into()
            ));
        }

        Ok(DisparityMatrix {
            width,
            height,
            data: rows.into_iter().flatten().collect()
        })
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

    /// True if the matrix holds no cells, which happens when the matching window did not fit
    /// inside the source images.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, x: usize, y: usize) -> u32 {
        self.data[y * self.width + x]
    }

    pub fn put(&mut self, x: usize, y: usize, val: u32) {
        self.data[y * self.width + x] = val;
    }

    /// Row-major view of every cell.
    pub fn as_slice(&self) -> &[u32] {
        &self.data
    }

    pub fn min_disp(&self) -> Option<u32> {
        self.data.iter().copied().min()
    }

    pub fn max_disp(&self) -> Option<u32> {
        self.data.iter().copied().max()
    }

    /// Converts the matrix into a Luma8 image, saturating values above 255.
    pub fn to_luma(&self) -> GrayImage {
        GrayImage::from_fn(self.width as u32, self.height as u32, |x, y| {
            let val = self.get(x as usize, y as usize).min(255);
            image::Luma([val as u8])
        })
    }

    /// Converts the matrix to a normalised GrayImage.
    ///
    /// Normalises by the maximum disparity in the matrix. If the matrix is empty or entirely zero
    /// the function is equivalent to `.to_luma()`.
    pub fn to_luma_normalised(&self) -> GrayImage {
        let mult = match self.max_disp() {
            Some(d) if d > 0 => 255.0 / d as f32,
            _ => 1.0
        };

        GrayImage::from_fn(self.width as u32, self.height as u32, |x, y| {
            let mut val = self.get(x as usize, y as usize) as f32 * mult;

            if val > 255.0 {
                val = 255.0;
            }

            image::Luma([val as u8])
        })
    }
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------
