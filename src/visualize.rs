//! # Depth map visualisation
//!
//! Renders disparity matrices as false-colour images. With the `statistics` feature a plot of the
//! disparity distribution can also be produced.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use std::path::Path;

use image::{Luma, Rgb, RgbImage};
use imageproc::map::map_colors;
use tracing::info;

use crate::disparity::DisparityMatrix;
use crate::error::*;

#[cfg(feature = "statistics")]
use plotters::prelude::*;

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Render the matrix as a false-colour image, from blue (far) through green to red (near).
///
/// Values are normalised by the matrix maximum before colouring.
pub fn depth_map_image(disp: &DisparityMatrix) -> RgbImage {
    map_colors(&disp.to_luma_normalised(), |Luma([v])| jet(v))
}

/// Render the matrix and save it to `path`. The format follows the file extension.
pub fn save_depth_map<P: AsRef<Path>>(disp: &DisparityMatrix, path: P) -> Result<()> {
    let path = path.as_ref();

    if disp.is_empty() {
        info!("Disparity matrix is empty, skipping depth map {}", path.display());
        return Ok(());
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    depth_map_image(disp).save(path)?;

    info!("Saved depth map to {}", path.display());

    Ok(())
}

/// Piecewise linear "jet" colour map.
fn jet(v: u8) -> Rgb<u8> {
    let t = v as f32 / 255.0;

    let channel = |offset: f32| {
        let c = 1.5 - (4.0 * t - offset).abs();
        (c.max(0.0).min(1.0) * 255.0) as u8
    };

    Rgb([channel(3.0), channel(2.0), channel(1.0)])
}

/// Plot the number of cells at each disparity value of `raw` and `refined` to a PNG at `path`.
#[cfg(feature = "statistics")]
pub fn plot_disparity_histogram<P: AsRef<Path>>(
    raw: &DisparityMatrix,
    refined: &DisparityMatrix,
    path: P
) -> Result<()> {
    let raw_counts = counts(raw);
    let refined_counts = counts(refined);

    let max_disp = raw_counts.len().max(refined_counts.len()).max(1);
    let max_count = raw_counts
        .iter()
        .chain(refined_counts.iter())
        .copied()
        .max()
        .unwrap_or(0)
        .max(1);

    let area = BitMapBackend::new(path.as_ref(), (800, 600)).into_drawing_area();
    area.fill(&WHITE).map_err(plot_err)?;

    let mut chart = ChartBuilder::on(&area)
        .caption("Disparity distribution", ("sans-serif", 20).into_font())
        .margin(5)
        .x_label_area_size(30)
        .y_label_area_size(50)
        .build_ranged(0..max_disp, 0..max_count)
        .map_err(plot_err)?;

    chart.configure_mesh().draw().map_err(plot_err)?;

    chart
        .draw_series(LineSeries::new(raw_counts.into_iter().enumerate(), &RED))
        .map_err(plot_err)?
        .label("Raw")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &RED));

    chart
        .draw_series(LineSeries::new(refined_counts.into_iter().enumerate(), &BLUE))
        .map_err(plot_err)?
        .label("Refined")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &BLUE));

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()
        .map_err(plot_err)?;

    info!("Saved disparity statistics to {}", path.as_ref().display());

    Ok(())
}

/// Number of cells holding each disparity value, indexed by value.
#[cfg(feature = "statistics")]
fn counts(disp: &DisparityMatrix) -> Vec<usize> {
    let mut counts = vec![0; disp.max_disp().map_or(0, |d| d as usize + 1)];

    for &d in disp.as_slice() {
        counts[d as usize] += 1;
    }

    counts
}

#[cfg(feature = "statistics")]
fn plot_err<E: std::fmt::Debug>(e: E) -> Error {
    Error::Plot(format!("{:?}", e))
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use image::GenericImageView;

    #[test]
    fn jet_runs_blue_to_red() {
        let low = jet(0);
        let high = jet(255);

        assert!(low[2] > low[0]);
        assert!(high[0] > high[2]);
    }

    #[cfg(feature = "statistics")]
    #[test]
    fn counts_are_indexed_by_disparity() {
        let disp = DisparityMatrix::from_vec(3, 2, vec![0, 2, 2, 5, 2, 0]).unwrap();

        assert_eq!(counts(&disp), vec![2, 0, 3, 0, 0, 1]);
        assert!(counts(&DisparityMatrix::new(0, 0)).is_empty());
    }

    #[test]
    fn depth_map_keeps_matrix_shape() {
        let disp = DisparityMatrix::from_vec(4, 3, (0..12).collect()).unwrap();

        assert_eq!(depth_map_image(&disp).dimensions(), (4, 3));
    }

    #[test]
    fn empty_matrix_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("depth.png");

        save_depth_map(&DisparityMatrix::new(0, 0), &path).unwrap();

        assert!(!path.exists());
    }

    #[test]
    fn depth_map_is_saved_as_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("depth.png");
        let disp = DisparityMatrix::from_vec(5, 5, (0..25).collect()).unwrap();

        save_depth_map(&disp, &path).unwrap();

        let img = image::open(&path).unwrap();
        assert_eq!((img.width(), img.height()), (5, 5));
    }
}
