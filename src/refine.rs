//! # Disparity refinement
//!
//! Spatial denoising of a raw disparity matrix. A single pass visits every cell and runs three
//! rules on it in order:
//!
//! 1. **Mean**: if the cell differs from the mean of its `(2 * mean_radius + 1)` square
//!    neighbourhood by more than `mean_threshold`, it is replaced by that mean (truncated).
//! 2. **Mode**: inside the mode band (see [`ModeGate`]), a cell above `mode_min_value` is replaced
//!    by the most frequent value of its `(2 * mode_radius + 1)` square neighbourhood. Ties go to
//!    the smallest value.
//! 3. **Clip**: a cell above `clip_above` is set to `clip_value`.
//!
//! Neighbourhoods are always read from the pass's input matrix, never from cells already
//! rewritten in the same pass. Only the cell's own value carries from one rule to the next.
//!
//! Neighbourhoods are truncated at the matrix border: off-grid cells are skipped rather than
//! clamped or wrapped, so border cells average over fewer samples.
//!
//! A single pass is not idempotent. Corrections propagate spatially over repeated passes, which
//! is what [`Refiner::refine_passes`] is for.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use std::collections::BTreeMap;
use std::ops::Range;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::disparity::DisparityMatrix;
use crate::error::*;

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

pub struct Refiner {
    params: Params
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct Params {
    /// Number of passes applied by [`Refiner::run`].
    pub passes: usize,

    pub mean_radius: usize,
    pub mean_threshold: f64,

    pub mode_radius: usize,
    pub mode_min_value: u32,
    pub mode_gate: ModeGate,

    pub clip_above: u32,
    pub clip_value: u32
}

/// Which matrix dimension bounds the column band where mode smoothing applies.
///
/// Mode smoothing only runs on columns `x` with `mode_radius < x < bound - mode_radius`.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ModeGate {
    /// Bound the column index by the matrix *height*. This reproduces the reference depth maps,
    /// but on wide matrices it leaves the right-hand columns unsmoothed.
    Height,

    /// Bound the column index by the matrix width.
    Width
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            passes: 5,
            mean_radius: 7,
            mean_threshold: 5.0,
            mode_radius: 12,
            mode_min_value: 25,
            mode_gate: ModeGate::Height,
            clip_above: 30,
            clip_value: 25
        }
    }
}

impl Default for ModeGate {
    fn default() -> Self {
        ModeGate::Height
    }
}

impl Refiner {
    pub fn new(params: Params) -> Result<Self> {
        if params.clip_value > params.clip_above {
            return Err(Error::InvalidParameter(format!(
                "clip value {} is above the clip threshold {}",
                params.clip_value, params.clip_above
            )));
        }

        if params.mean_threshold.is_nan() || params.mean_threshold < 0.0 {
            return Err(Error::InvalidParameter(format!(
                "mean threshold must be non-negative, got {}",
                params.mean_threshold
            )));
        }

        Ok(Self { params })
    }

    /// Apply the configured number of passes.
    pub fn run(&self, disp: &DisparityMatrix) -> DisparityMatrix {
        self.refine_passes(disp, self.params.passes)
    }

    /// Apply `passes` refinement passes, each reading the complete output of the previous one.
    pub fn refine_passes(&self, disp: &DisparityMatrix, passes: usize) -> DisparityMatrix {
        let start = Instant::now();

        let refined = (0..passes).fold(disp.clone(), |acc, pass| {
            let next = self.refine(&acc);
            debug!("Refinement pass {} of {} complete", pass + 1, passes);
            next
        });

        info!(
            "Refined {}x{} disparity matrix with {} passes in {:.3}s",
            disp.width(), disp.height(), passes, start.elapsed().as_secs_f64()
        );

        refined
    }

    /// Apply a single refinement pass, returning a new matrix of the same shape.
    pub fn refine(&self, disp: &DisparityMatrix) -> DisparityMatrix {
        let refine_row = |y: usize| -> Vec<u32> {
            (0..disp.width())
                .map(|x| self.refine_cell(disp, x, y))
                .collect()
        };

        #[cfg(feature = "parallel")]
        let rows: Vec<Vec<u32>> = (0..disp.height()).into_par_iter().map(refine_row).collect();

        #[cfg(not(feature = "parallel"))]
        let rows: Vec<Vec<u32>> = (0..disp.height()).map(refine_row).collect();

        DisparityMatrix::from_parts(disp.width(), disp.height(), rows.concat())
    }

    /// Run the mean, mode and clip rules on one cell of `src`.
    fn refine_cell(&self, src: &DisparityMatrix, x: usize, y: usize) -> u32 {
        let p = &self.params;
        let mut val = src.get(x, y);

        // ---- MEAN ----
        let mean = window_mean(src, x, y, p.mean_radius);
        if (val as f64 - mean).abs() > p.mean_threshold {
            val = mean as u32;
        }

        // ---- MODE ----
        if self.in_mode_band(src, x) && val > p.mode_min_value {
            val = window_mode(src, x, y, p.mode_radius);
        }

        // ---- CLIP ----
        if val > p.clip_above {
            val = p.clip_value;
        }

        val
    }

    fn in_mode_band(&self, src: &DisparityMatrix, x: usize) -> bool {
        let margin = self.params.mode_radius;
        let bound = match self.params.mode_gate {
            ModeGate::Height => src.height(),
            ModeGate::Width => src.width()
        };

        x > margin && x + margin < bound
    }
}

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Indices within `radius` of `center`, truncated to `0..len`.
fn window(center: usize, radius: usize, len: usize) -> Range<usize> {
    center.saturating_sub(radius)..center.saturating_add(radius).saturating_add(1).min(len)
}

/// Mean of the in-grid cells of the square neighbourhood around (`x`, `y`).
fn window_mean(src: &DisparityMatrix, x: usize, y: usize, radius: usize) -> f64 {
    let xs = window(x, radius, src.width());
    let ys = window(y, radius, src.height());

    let count = xs.len() * ys.len();
    let mut sum = 0u64;

    for j in ys {
        for i in xs.clone() {
            sum += src.get(i, j) as u64;
        }
    }

    sum as f64 / count as f64
}

/// Most frequent value of the in-grid cells of the square neighbourhood around (`x`, `y`).
fn window_mode(src: &DisparityMatrix, x: usize, y: usize, radius: usize) -> u32 {
    let xs = window(x, radius, src.width());
    let ys = window(y, radius, src.height());

    let mut counts: BTreeMap<u32, usize> = BTreeMap::new();

    for j in ys {
        for i in xs.clone() {
            *counts.entry(src.get(i, j)).or_insert(0) += 1;
        }
    }

    // Ascending iteration with a strict comparison keeps the smallest of equally common values
    let mut mode = src.get(x, y);
    let mut best = 0;
    for (val, count) in counts {
        if count > best {
            best = count;
            mode = val;
        }
    }

    mode
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(width: usize, height: usize, val: u32) -> DisparityMatrix {
        DisparityMatrix::from_vec(width, height, vec![val; width * height]).unwrap()
    }

    fn refiner(mode_gate: ModeGate) -> Refiner {
        Refiner::new(Params { mode_gate, ..Params::default() }).unwrap()
    }

    #[test]
    fn outlier_moves_towards_local_mean() {
        let mut disp = filled(10, 10, 5);
        disp.put(5, 5, 200);

        let out = refiner(ModeGate::Height).refine(&disp);

        assert_eq!(out.dimensions(), (10, 10));
        assert!(out.get(5, 5) < 200);
        assert!(out.get(5, 5) <= 10);

        // Neighbours read the unrefined outlier but stay within the mean threshold
        assert_eq!(out.get(0, 0), 5);
        assert_eq!(out.get(9, 9), 5);
    }

    #[test]
    fn large_values_are_clipped() {
        let disp = filled(30, 30, 40);

        let out = refiner(ModeGate::Height).refine(&disp);

        assert!(out.as_slice().iter().all(|&d| d == 25));
    }

    #[test]
    fn no_cell_exceeds_clip_threshold_after_pass() {
        let data = (0..24 * 18).map(|i| ((i * 37) % 90) as u32).collect();
        let disp = DisparityMatrix::from_vec(24, 18, data).unwrap();

        let out = refiner(ModeGate::Width).refine(&disp);

        assert_eq!(out.dimensions(), disp.dimensions());
        assert!(out.as_slice().iter().all(|&d| d <= 30));
    }

    #[test]
    fn mode_replaces_high_values_inside_band() {
        let mut disp = filled(30, 30, 28);
        disp.put(15, 15, 29);

        let out = refiner(ModeGate::Height).refine(&disp);

        assert_eq!(out.get(15, 15), 28);
    }

    #[test]
    fn mode_gate_selects_bounding_dimension() {
        // 40 wide, 20 high: column 20 is outside the height band but inside the width band
        let mut disp = filled(40, 20, 28);
        disp.put(20, 10, 29);

        let legacy = refiner(ModeGate::Height).refine(&disp);
        let corrected = refiner(ModeGate::Width).refine(&disp);

        assert_eq!(legacy.get(20, 10), 29);
        assert_eq!(corrected.get(20, 10), 28);
    }

    #[test]
    fn mode_ties_resolve_to_smallest_value() {
        let data = (0..4 * 4).map(|i| if i % 2 == 0 { 40 } else { 27 }).collect();
        let disp = DisparityMatrix::from_vec(4, 4, data).unwrap();

        assert_eq!(window_mode(&disp, 1, 1, 5), 27);
    }

    #[test]
    fn border_windows_are_truncated() {
        assert_eq!(window(0, 7, 10), 0..8);
        assert_eq!(window(9, 7, 10), 2..10);
        assert_eq!(window(5, 1, 10), 4..7);
        assert_eq!(window(3, usize::MAX, 10), 0..10);

        let mut disp = filled(3, 3, 0);
        disp.put(0, 0, 9);
        assert!((window_mean(&disp, 0, 0, 1) - 9.0 / 4.0).abs() < 1e-9);
    }

    #[test]
    fn zero_passes_returns_input() {
        let mut disp = filled(6, 6, 3);
        disp.put(2, 2, 90);

        let out = refiner(ModeGate::Height).refine_passes(&disp, 0);

        assert_eq!(out, disp);
    }

    #[test]
    fn passes_are_deterministic_and_shape_preserving() {
        let data = (0..32 * 20).map(|i| ((i * 7919) % 60) as u32).collect();
        let disp = DisparityMatrix::from_vec(32, 20, data).unwrap();
        let alg = refiner(ModeGate::Height);

        let a = alg.run(&disp);
        let b = alg.run(&disp);

        assert_eq!(a, b);
        assert_eq!(a.dimensions(), disp.dimensions());
    }

    #[test]
    fn empty_matrix_stays_empty() {
        let disp = DisparityMatrix::new(0, 0);

        let out = refiner(ModeGate::Width).run(&disp);

        assert!(out.is_empty());
    }

    #[test]
    fn invalid_clip_is_rejected() {
        let params = Params { clip_above: 20, clip_value: 25, ..Params::default() };

        assert!(Refiner::new(params).is_err());
    }
}
