//! # Stereo to point cloud pipeline
//!
//! Runs every stage in order: pre-processing of both images, block matching, refinement, point
//! cloud synthesis and output. Each stage consumes the previous stage's result and returns a new
//! value. The pipeline keeps no state between runs.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use std::path::Path;
use std::time::Instant;

use tracing::{info, info_span};

use crate::block_match::BlockMatcher;
use crate::config::PipelineConfig;
use crate::disparity::{DisparityAlgorithm, DisparityMatrix};
use crate::error::*;
use crate::image_source::ImageSource;
use crate::intensity::StereoPair;
use crate::point_cloud::PointCloud;
use crate::refine::Refiner;
use crate::visualize;

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

pub struct Pipeline {
    config: PipelineConfig,
    matcher: BlockMatcher,
    refiner: Refiner
}

/// Everything a pipeline run produces.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Disparity straight out of the block matcher.
    pub raw: DisparityMatrix,

    /// Disparity after all refinement passes.
    pub refined: DisparityMatrix,

    pub cloud: PointCloud
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl Pipeline {
    /// Build the pipeline's stages, validating their parameters.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let matcher = BlockMatcher::new(config.matching)?;
        let refiner = Refiner::new(config.refine)?;

        Ok(Self {
            config,
            matcher,
            refiner
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Load the stereo pair from disk, run every stage and write the configured outputs.
    ///
    /// The left image also provides the colour of the point cloud.
    pub fn run<P, Q>(&self, left_path: P, right_path: Q) -> Result<PipelineOutput>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>
    {
        let _span = info_span!("pipeline").entered();
        let start = Instant::now();

        let left = ImageSource::open(left_path)?;
        let right = ImageSource::open(right_path)?;

        let output = self.process(&left, &right)?;
        self.write_outputs(&output)?;

        info!("Pipeline complete in {:.3}s", start.elapsed().as_secs_f64());

        Ok(output)
    }

    /// Run every stage on already decoded images without touching the file system.
    pub fn process(&self, left: &ImageSource, right: &ImageSource) -> Result<PipelineOutput> {
        let pair = self.pre_process(left, right)?;

        let raw = self.matcher.compute(&pair)?;
        let refined = self.refiner.run(&raw);

        let color = left.color_grid(refined.width() as u32, refined.height() as u32);
        let cloud = PointCloud::from_disparity(&refined, &color, &self.config.cloud)?;

        info!(
            "Synthesised {} points from {}x{} disparity matrix",
            cloud.len(), refined.width(), refined.height()
        );

        Ok(PipelineOutput { raw, refined, cloud })
    }

    /// Resize both images to the configured size and convert them to intensity arrays.
    pub fn pre_process(&self, left: &ImageSource, right: &ImageSource) -> Result<StereoPair> {
        let size = self.config.resize;

        let left = left.resize(size.width, size.height);
        let right = right.resize(size.width, size.height);

        left.log_info();
        right.log_info();

        StereoPair::new(left.to_intensity(), right.to_intensity())
    }

    /// Write the point cloud and any optional artefacts named in the output config.
    pub fn write_outputs(&self, output: &PipelineOutput) -> Result<()> {
        let out = &self.config.output;

        output.cloud.save(&out.point_cloud)?;

        if let Some(path) = &out.depth_map {
            visualize::save_depth_map(&output.refined, path)?;
        }

        #[cfg(feature = "statistics")]
        {
            if let Some(path) = &out.statistics {
                visualize::plot_disparity_histogram(&output.raw, &output.refined, path)?;
            }
        }

        #[cfg(not(feature = "statistics"))]
        {
            if out.statistics.is_some() {
                tracing::warn!("Statistics output requested but the `statistics` feature is off");
            }
        }

        Ok(())
    }
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResizeConfig;
    use image::{DynamicImage, Rgb, RgbImage};

    fn constant(width: u32, height: u32, val: u8) -> ImageSource {
        let img = RgbImage::from_pixel(width, height, Rgb([val, val, val]));
        ImageSource::from_dynamic(DynamicImage::ImageRgb8(img))
    }

    fn config(width: u32, height: u32, window_size: usize) -> PipelineConfig {
        let mut cfg = PipelineConfig::default();
        cfg.resize = ResizeConfig { width, height };
        cfg.matching.window_size = window_size;
        cfg.matching.search_range = 5;
        cfg
    }

    #[test]
    fn constant_pair_gives_flat_cloud() {
        let pipeline = Pipeline::new(config(20, 20, 3)).unwrap();

        let out = pipeline
            .process(&constant(20, 20, 100), &constant(20, 20, 100))
            .unwrap();

        assert_eq!(out.raw.dimensions(), (17, 17));
        assert_eq!(out.refined.dimensions(), (17, 17));
        assert_eq!(out.cloud.len(), 17 * 17);
        assert!(out.cloud.iter().all(|p| p.z == 0));
        assert!(out.cloud.iter().all(|p| (99..=100).contains(&p.r)));
    }

    #[test]
    fn degenerate_window_gives_empty_cloud() {
        let pipeline = Pipeline::new(config(10, 10, 10)).unwrap();

        let out = pipeline
            .process(&constant(10, 10, 50), &constant(10, 10, 60))
            .unwrap();

        assert!(out.raw.is_empty());
        assert!(out.cloud.is_empty());
    }

    #[test]
    fn invalid_stage_parameters_are_rejected() {
        assert!(Pipeline::new(config(10, 10, 0)).is_err());
    }
}
