//! # Image source
//!
//! Thin adapter over the `image` crate that decodes stereo images and turns them into the grids the
//! disparity pipeline consumes: grayscale intensity arrays for matching and RGB colour grids for
//! the point cloud.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, Luma, Rgb, RgbImage};
use imageproc::map::map_colors;
use tracing::info;

use crate::error::*;
use crate::intensity::IntensityArray;

// -----------------------------------------------------------------------------------------------
// CONSTANTS
// -----------------------------------------------------------------------------------------------

/// Filter used for every resize.
const RESIZE_FILTER: FilterType = FilterType::CatmullRom;

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

/// A decoded image. Every transformation returns a new source, the decoded pixels are never
/// modified in place.
#[derive(Clone)]
pub struct ImageSource {
    path: Option<PathBuf>,
    image: DynamicImage
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl ImageSource {
    /// Decode the image at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let image = image::open(path)?;

        Ok(Self {
            path: Some(path.to_path_buf()),
            image
        })
    }

    /// Wrap an already decoded image.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { path: None, image }
    }

    /// Dimensions as `(width, height)`.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.image.width(), self.image.height())
    }

    /// Log size and colour information about the image.
    pub fn log_info(&self) {
        let (width, height) = self.dimensions();
        info!(
            "Image {}: size {}x{}, colour {:?}",
            self.path.as_ref().map_or_else(|| "<memory>".into(), |p| p.display().to_string()),
            width,
            height,
            self.image.color()
        );
    }

    /// Resize to exactly `width` x `height`, ignoring the aspect ratio.
    pub fn resize(&self, width: u32, height: u32) -> ImageSource {
        let image = if (width, height) == self.dimensions() {
            self.image.clone()
        }
        else if width == 0 || height == 0 {
            DynamicImage::new_rgb8(width, height)
        }
        else {
            self.image.resize_exact(width, height, RESIZE_FILTER)
        };

        ImageSource {
            path: self.path.clone(),
            image
        }
    }

    /// Convert to a grayscale intensity array using ITU-R 601-2 luma weights.
    pub fn to_intensity(&self) -> IntensityArray {
        let gray = map_colors(&self.image.to_rgb8(), |Rgb([r, g, b])| Luma([luma_601(r, g, b)]));
        IntensityArray::from_luma(&gray)
    }

    /// Colour grid resized to exactly `width` x `height`, for sampling alongside a disparity
    /// matrix of those dimensions.
    pub fn color_grid(&self, width: u32, height: u32) -> RgbImage {
        self.resize(width, height).image.to_rgb8()
    }
}

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// `L = 0.299 R + 0.587 G + 0.114 B` in 16-bit fixed point, truncated.
fn luma_601(r: u8, g: u8, b: u8) -> u8 {
    ((r as u32 * 19595 + g as u32 * 38470 + b as u32 * 7471 + 0x8000) >> 16) as u8
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------
