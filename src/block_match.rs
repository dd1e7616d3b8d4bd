//! # Block matching disparity computation
//!
//! This module provides an exhaustive single-scanline block matcher. Each left-image window is
//! compared against right-image windows at the same row, scanning leftwards from the same column
//! up to `search_range` pixels, using the sum of absolute differences (SAD) as the matching cost.
//!
//! Windows are anchored at their top-left corner, so the output matrix is `window_size` smaller
//! than the input in both dimensions.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::disparity::{DisparityAlgorithm, DisparityMatrix};
use crate::error::*;
use crate::intensity::{IntensityArray, StereoPair};

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

pub struct BlockMatcher {
    params: Params
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct Params {
    /// Side length of the square matching window.
    pub window_size: usize,

    /// Maximum number of pixels to search leftwards from the window's own column.
    pub search_range: usize
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            window_size: 11,
            search_range: 44
        }
    }
}

impl BlockMatcher {
    /// Create a new instance of the algorithm with the given parameters.
    pub fn new(params: Params) -> Result<Self> {
        if params.window_size == 0 {
            return Err(Error::InvalidParameter(
                "block matching window size must be at least 1".into()
            ));
        }

        Ok(Self { params })
    }

    /// Compute one output row of disparities.
    fn match_row(&self, pair: &StereoPair, row: usize, out_width: usize) -> Vec<u32> {
        (0..out_width)
            .map(|col1| self.match_window(pair, row, col1))
            .collect()
    }

    /// Find the disparity of the window anchored at (`col1`, `row`).
    ///
    /// Candidates are scanned from `col1` leftwards, and a candidate only replaces the current
    /// best if its cost is strictly lower, so the smallest offset wins ties.
    fn match_window(&self, pair: &StereoPair, row: usize, col1: usize) -> u32 {
        let init = col1.saturating_sub(self.params.search_range);

        let mut min_cost = u64::MAX;
        let mut min_index = 0;

        for (index, col2) in (init..=col1).rev().enumerate() {
            let cost = sad(
                &pair.left,
                &pair.right,
                row,
                col1,
                col2,
                self.params.window_size
            );

            if cost < min_cost {
                min_cost = cost;
                min_index = index;
            }
        }

        min_index as u32
    }
}

impl DisparityAlgorithm for BlockMatcher {
    /// Compute the disparity matrix for the given pair.
    fn compute(&self, pair: &StereoPair) -> Result<DisparityMatrix> {
        let ws = self.params.window_size;
        let out_width = pair.width().saturating_sub(ws);
        let out_height = pair.height().saturating_sub(ws);

        info!(
            "Computing disparity for {}x{} pair (window {}, search range {})",
            pair.width(), pair.height(), ws, self.params.search_range
        );

        // A window that doesn't fit leaves nothing to match, the result is empty
        if out_width == 0 || out_height == 0 {
            info!("Matching window does not fit inside the images, disparity matrix is empty");
            return DisparityMatrix::from_vec(out_width, out_height, Vec::new());
        }

        let start = Instant::now();

        let compute_row = |row: usize| {
            if row % 10 == 0 {
                debug!("Computing disparity row {}", row);
            }
            self.match_row(pair, row, out_width)
        };

        // Rows only read the pair, so they can be computed in any order and gathered
        #[cfg(feature = "parallel")]
        let rows: Vec<Vec<u32>> = (0..out_height).into_par_iter().map(compute_row).collect();

        #[cfg(not(feature = "parallel"))]
        let rows: Vec<Vec<u32>> = (0..out_height).map(compute_row).collect();

        let disp = DisparityMatrix::from_rows(rows)?;

        info!(
            "Disparity calculations complete in {:.3}s",
            start.elapsed().as_secs_f64()
        );

        Ok(disp)
    }
}

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Sum of absolute differences between the `size`x`size` window of `left` anchored at
/// (`col1`, `row`) and the window of `right` anchored at (`col2`, `row`).
pub fn sad(
    left: &IntensityArray,
    right: &IntensityArray,
    row: usize,
    col1: usize,
    col2: usize,
    size: usize
) -> u64 {
    let mut acc = 0u64;

    for y in row..row + size {
        let l = left.row_span(col1, y, size);
        let r = right.row_span(col2, y, size);

        acc += l
            .iter()
            .zip(r)
            .map(|(a, b)| (a - b).unsigned_abs() as u64)
            .sum::<u64>();
    }

    acc
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------
