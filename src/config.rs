//! # Pipeline configuration
//!
//! Every tunable of the stereo pipeline, loadable from a TOML file. Missing tables and keys fall
//! back to the defaults below, so a config file only needs to name what it changes:
//!
//! ```toml
//! [resize]
//! width = 357
//! height = 250
//!
//! [matching]
//! window_size = 11
//! search_range = 44
//!
//! [refine]
//! passes = 5
//! mode_gate = "height"
//!
//! [cloud]
//! depth_scale = 6
//!
//! [output]
//! point_cloud = "data/output/point_cloud_250.txt"
//! depth_map = "data/output/250.png"
//! ```

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::block_match;
use crate::error::*;
use crate::point_cloud;
use crate::refine;

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    pub resize: ResizeConfig,
    pub matching: block_match::Params,
    pub refine: refine::Params,
    pub cloud: point_cloud::Params,
    pub output: OutputConfig
}

/// Size both input images are resized to before matching.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct ResizeConfig {
    pub width: u32,
    pub height: u32
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct OutputConfig {
    /// Point cloud file, written as PLY for a `.ply` extension and CSV otherwise.
    pub point_cloud: PathBuf,

    /// Optional false-colour depth map image.
    pub depth_map: Option<PathBuf>,

    /// Optional disparity distribution plot, only written with the `statistics` feature.
    pub statistics: Option<PathBuf>
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl Default for ResizeConfig {
    fn default() -> Self {
        Self {
            width: 357,
            height: 250
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            point_cloud: PathBuf::from("point_cloud.txt"),
            depth_map: None,
            statistics: None
        }
    }
}

impl PipelineConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load a configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------
