//! # Stereo point clouds
//!
//! This crate estimates disparity from a stereo image pair by block matching, refines the
//! disparity with spatial filters and projects it into a coloured point cloud.

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

pub mod block_match;
pub mod config;
mod disparity;
mod error;
pub mod image_source;
mod intensity;
pub mod logger;
pub mod pipeline;
pub mod point_cloud;
pub mod refine;
pub mod visualize;

// -----------------------------------------------------------------------------------------------
// EXPORTS
// -----------------------------------------------------------------------------------------------

pub use error::{Error, Result};

pub mod prelude {
    pub use crate::block_match::BlockMatcher;
    pub use crate::config::PipelineConfig;
    pub use crate::disparity::{DisparityAlgorithm, DisparityMatrix};
    pub use crate::error::{Error, Result};
    pub use crate::image_source::ImageSource;
    pub use crate::intensity::{IntensityArray, StereoPair};
    pub use crate::pipeline::{Pipeline, PipelineOutput};
    pub use crate::point_cloud::{PointCloud, PointRecord};
    pub use crate::refine::{ModeGate, Refiner};
}
