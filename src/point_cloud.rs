//! # Point cloud synthesis
//!
//! Projects a refined disparity matrix and an aligned colour grid into coloured 3D points, and
//! writes them out as CSV or ASCII PLY.
//!
//! Points are emitted column by column: every row of column 0, then every row of column 1, and so
//! on. Consumers of the CSV output rely on this order.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use image::RgbImage;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::disparity::DisparityMatrix;
use crate::error::*;

// -----------------------------------------------------------------------------------------------
// CONSTANTS
// -----------------------------------------------------------------------------------------------

pub const CSV_HEADER: &str = "x,y,z,r,g,b";

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct Params {
    /// Multiplier from disparity to the emitted depth value.
    pub depth_scale: u32
}

/// A single coloured point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointRecord {
    pub x: u32,
    pub y: u32,
    pub z: u32,
    pub r: u8,
    pub g: u8,
    pub b: u8
}

/// An ordered sequence of points.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointCloud {
    points: Vec<PointRecord>
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self { depth_scale: 6 }
    }
}

impl PointCloud {
    /// Build a cloud from a disparity matrix and a colour grid of the same dimensions.
    pub fn from_disparity(
        disp: &DisparityMatrix,
        color: &RgbImage,
        params: &Params
    ) -> Result<Self> {
        let color_dims = (color.width() as usize, color.height() as usize);
        if color_dims != disp.dimensions() {
            return Err(Error::ShapeMismatch {
                what: "point cloud colour grid",
                expected: disp.dimensions(),
                found: color_dims
            });
        }

        let mut points = Vec::with_capacity(disp.width() * disp.height());

        for x in 0..disp.width() {
            for y in 0..disp.height() {
                let d = disp.get(x, y);
                let z = d.checked_mul(params.depth_scale).ok_or_else(|| {
                    Error::InvalidParameter(format!(
                        "depth scale {} overflows the depth of disparity {}",
                        params.depth_scale, d
                    ))
                })?;

                let rgb = color.get_pixel(x as u32, y as u32);
                points.push(PointRecord {
                    x: x as u32,
                    y: y as u32,
                    z,
                    r: rgb[0],
                    g: rgb[1],
                    b: rgb[2]
                });
            }
        }

        Ok(Self { points })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[PointRecord] {
        &self.points
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PointRecord> {
        self.points.iter()
    }

    /// Write the cloud as CSV with an `x,y,z,r,g,b` header and no index column.
    pub fn write_csv<W: Write>(&self, mut writer: W) -> Result<()> {
        writeln!(writer, "{}", CSV_HEADER)?;

        for p in &self.points {
            writeln!(writer, "{},{},{},{},{},{}", p.x, p.y, p.z, p.r, p.g, p.b)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Write the cloud as an ASCII PLY file.
    pub fn write_ply<W: Write>(&self, mut writer: W) -> Result<()> {
        writeln!(writer, "ply")?;
        writeln!(writer, "format ascii 1.0")?;
        writeln!(writer, "element vertex {}", self.points.len())?;
        writeln!(writer, "property int x")?;
        writeln!(writer, "property int y")?;
        writeln!(writer, "property int z")?;
        writeln!(writer, "property uchar red")?;
        writeln!(writer, "property uchar green")?;
        writeln!(writer, "property uchar blue")?;
        writeln!(writer, "end_header")?;

        for p in &self.points {
            writeln!(writer, "{} {} {} {} {} {}", p.x, p.y, p.z, p.r, p.g, p.b)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Save the cloud to `path`, as PLY if the extension is `ply` and as CSV otherwise.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let writer = BufWriter::new(File::create(path)?);

        let is_ply = path
            .extension()
            .map_or(false, |ext| ext.eq_ignore_ascii_case("ply"));

        if is_ply {
            self.write_ply(writer)?;
        }
        else {
            self.write_csv(writer)?;
        }

        info!("Wrote {} points to {}", self.points.len(), path.display());

        Ok(())
    }
}

impl<'a> IntoIterator for &'a PointCloud {
    type Item = &'a PointRecord;
    type IntoIter = std::slice::Iter<'a, PointRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------
