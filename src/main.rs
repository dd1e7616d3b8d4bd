//! stereo-cloud CLI: turn a stereo image pair into a coloured point cloud.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use stereo_cloud::logger;
use stereo_cloud::prelude::*;
use tracing::{error, info};

type CliResult<T> = std::result::Result<T, Box<dyn std::error::Error>>;

#[derive(Parser, Debug)]
#[command(name = "stereo-cloud")]
#[command(about = "Estimate disparity from a stereo pair and export a coloured point cloud")]
#[command(version)]
struct Cli {
    /// Path to the left image. Also provides the point cloud colours.
    #[arg(long)]
    left: PathBuf,

    /// Path to the right image.
    #[arg(long)]
    right: PathBuf,

    /// TOML configuration file. Command line options override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Point cloud output path (`.ply` for PLY, CSV otherwise).
    #[arg(long)]
    out: Option<PathBuf>,

    /// Write a false-colour depth map image to this path.
    #[arg(long)]
    depth_map: Option<PathBuf>,

    /// Write a disparity distribution plot to this path (`statistics` feature).
    #[arg(long)]
    statistics: Option<PathBuf>,

    /// Width both images are resized to before matching.
    #[arg(long)]
    width: Option<u32>,

    /// Height both images are resized to before matching.
    #[arg(long)]
    height: Option<u32>,

    /// Side length of the square matching window.
    #[arg(long)]
    window_size: Option<usize>,

    /// Maximum leftward search distance in pixels.
    #[arg(long)]
    search_range: Option<usize>,

    /// Number of refinement passes.
    #[arg(long)]
    passes: Option<usize>,

    /// Multiplier from disparity to point depth.
    #[arg(long)]
    depth_scale: Option<u32>,

    /// Dimension bounding the mode smoothing column band.
    #[arg(long, value_enum)]
    mode_gate: Option<CliModeGate>
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliModeGate {
    Height,
    Width
}

impl From<CliModeGate> for ModeGate {
    fn from(gate: CliModeGate) -> Self {
        match gate {
            CliModeGate::Height => ModeGate::Height,
            CliModeGate::Width => ModeGate::Width
        }
    }
}

impl Cli {
    /// Load the config file, if any, and apply command line overrides.
    fn build_config(&self) -> CliResult<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_file(path)?,
            None => PipelineConfig::default()
        };

        if let Some(out) = &self.out {
            config.output.point_cloud = out.clone();
        }
        if let Some(path) = &self.depth_map {
            config.output.depth_map = Some(path.clone());
        }
        if let Some(path) = &self.statistics {
            config.output.statistics = Some(path.clone());
        }
        if let Some(width) = self.width {
            config.resize.width = width;
        }
        if let Some(height) = self.height {
            config.resize.height = height;
        }
        if let Some(window_size) = self.window_size {
            config.matching.window_size = window_size;
        }
        if let Some(search_range) = self.search_range {
            config.matching.search_range = search_range;
        }
        if let Some(passes) = self.passes {
            config.refine.passes = passes;
        }
        if let Some(depth_scale) = self.depth_scale {
            config.cloud.depth_scale = depth_scale;
        }
        if let Some(gate) = self.mode_gate {
            config.refine.mode_gate = gate.into();
        }

        Ok(config)
    }
}

fn main() -> CliResult<()> {
    logger::init();

    let cli = Cli::parse();
    let config = cli.build_config()?;

    info!(
        "Resize {}x{}, window {}, search range {}, {} refinement passes",
        config.resize.width,
        config.resize.height,
        config.matching.window_size,
        config.matching.search_range,
        config.refine.passes
    );

    let pipeline = Pipeline::new(config)?;

    match pipeline.run(&cli.left, &cli.right) {
        Ok(output) => {
            info!(
                "Wrote {} points to {}",
                output.cloud.len(),
                pipeline.config().output.point_cloud.display()
            );
            Ok(())
        }
        Err(e) => {
            error!("Pipeline failed: {}", e);
            Err(e.into())
        }
    }
}
