use std::error::Error;
use std::path::Path;

use plotters::prelude::*;

use pcd_analysis::histogram::ZHistogram;

/// Renders the z distribution as a horizontal profile: point counts in
/// thousands on the x axis, height on the y axis. Peaks show up as spikes
/// sticking out to the right.
pub fn render_z_distribution(histogram: &ZHistogram, path: &Path) -> Result<(), Box<dyn Error>> {
    let root = SVGBackend::new(path, (1800, 900)).into_drawing_area();
    root.fill(&WHITE)?;

    let max_thousands = (histogram.max_count() as f64 / 1000.0).max(1e-3);
    let z_top = histogram.z_min + histogram.bins.len() as f64 * histogram.bin_width;

    let mut chart = ChartBuilder::on(&root)
        .caption(
            "Point Distribution along Z-axis (Peaks indicate potential floor/ceiling slabs)",
            ("sans-serif", 32),
        )
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(90)
        .build_cartesian_2d(0.0..max_thousands * 1.05, histogram.z_min..z_top)?;

    chart
        .configure_mesh()
        .x_desc("Number of points (×10³)")
        .y_desc("Height/z-coordinate (m)")
        .draw()?;

    chart.draw_series(LineSeries::new(
        histogram
            .bins
            .iter()
            .map(|b| (b.count as f64 / 1000.0, b.lower_edge)),
        &BLUE,
    ))?;

    root.present()?;
    Ok(())
}
