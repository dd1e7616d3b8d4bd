//! # Pipeline from images
//!
//! Writes a synthetic stereo pair to disk and runs the full pipeline over it.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use std::fs;
use std::path::Path;

use image::{Rgb, RgbImage};
use stereo_cloud::config::ResizeConfig;
use stereo_cloud::prelude::*;

// -----------------------------------------------------------------------------------------------
// CONSTANTS
// -----------------------------------------------------------------------------------------------

const WIDTH: u32 = 60;
const HEIGHT: u32 = 40;
const SHIFT: u32 = 4;

// -----------------------------------------------------------------------------------------------
// HELPERS
// -----------------------------------------------------------------------------------------------

fn texture(x: u32, y: u32) -> Rgb<u8> {
    let v = ((13 * x * x + 7 * y + 3 * x * y) % 251) as u8;
    Rgb([v, v, v])
}

/// Write a left/right pair where the right view is the left view shifted by `SHIFT` pixels.
fn write_pair(dir: &Path) -> (std::path::PathBuf, std::path::PathBuf) {
    let left = RgbImage::from_fn(WIDTH, HEIGHT, texture);
    let right = RgbImage::from_fn(WIDTH, HEIGHT, |x, y| texture(x + SHIFT, y));

    let left_path = dir.join("left.png");
    let right_path = dir.join("right.png");
    left.save(&left_path).unwrap();
    right.save(&right_path).unwrap();

    (left_path, right_path)
}

fn config(dir: &Path, cloud_name: &str) -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.resize = ResizeConfig { width: WIDTH, height: HEIGHT };
    config.matching.window_size = 5;
    config.matching.search_range = 8;
    config.refine.passes = 2;
    config.output.point_cloud = dir.join("out").join(cloud_name);
    config.output.depth_map = Some(dir.join("out").join("depth.png"));
    config
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------

#[test]
fn csv_cloud_from_image_pair() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let (left, right) = write_pair(dir.path());
    let config = config(dir.path(), "cloud.txt");
    let cloud_path = config.output.point_cloud.clone();

    let output = Pipeline::new(config)?.run(&left, &right)?;

    let (w, h) = output.refined.dimensions();
    assert_eq!((w, h), (55, 35));
    assert_eq!(output.raw.dimensions(), (w, h));

    // Away from the left border the matcher recovers the shift exactly
    assert_eq!(output.raw.get(30, 10), SHIFT);

    let text = fs::read_to_string(&cloud_path)?;
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines.len(), 1 + w * h);
    assert_eq!(lines[0], "x,y,z,r,g,b");
    assert!(lines[1].starts_with("0,0,"));
    assert!(lines[2].starts_with("0,1,"));
    assert!(lines[w * h].starts_with("54,34,"));

    assert!(dir.path().join("out").join("depth.png").exists());

    Ok(())
}

#[test]
fn refined_cloud_respects_clip_threshold() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let (left, right) = write_pair(dir.path());
    let config = config(dir.path(), "cloud.ply");
    let scale = config.cloud.depth_scale;
    let cloud_path = config.output.point_cloud.clone();

    let output = Pipeline::new(config)?.run(&left, &right)?;

    assert!(output.refined.as_slice().iter().all(|&d| d <= 30));
    assert!(output.cloud.iter().all(|p| p.z <= 30 * scale));

    let text = fs::read_to_string(&cloud_path)?;
    assert!(text.starts_with("ply\n"));
    assert!(text.contains(&format!("element vertex {}\n", output.cloud.len())));

    Ok(())
}

#[test]
fn repeated_runs_are_identical() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let (left, right) = write_pair(dir.path());
    let pipeline = Pipeline::new(config(dir.path(), "cloud.txt"))?;

    let a = pipeline.run(&left, &right)?;
    let b = pipeline.run(&left, &right)?;

    assert_eq!(a.raw, b.raw);
    assert_eq!(a.refined, b.refined);
    assert_eq!(a.cloud, b.cloud);

    Ok(())
}

#[test]
fn missing_image_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::new(config(dir.path(), "cloud.txt")).unwrap();

    let result = pipeline.run(dir.path().join("nope.png"), dir.path().join("nope.png"));

    assert!(matches!(result, Err(Error::Image(_))));
    assert!(!dir.path().join("out").join("cloud.txt").exists());
}
