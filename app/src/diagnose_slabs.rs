use std::error::Error;
use std::ffi::OsStr;
use std::path::PathBuf;

use glob::glob;

use pcd_analysis::histogram::{HistogramError, ZHistogram};
use pcd_analysis::slabs::{detect_slabs, SlabDetection};
use pcd_core::pointcloud::point::PointCloud;
use pcd_parser::parsers::e57::E57ParserProvider;
use pcd_parser::parsers::xyz::XyzParserProvider;
use pcd_parser::parsers::{get_extension, Extension, Parser, ParserProvider as _};
use pcd_plotter::chart::render_z_distribution;

use crate::config::Config;

pub struct SlabOptions {
    pub bin_width: f64,
    pub threshold_fraction: f64,
    pub every_nth: usize,
    pub plot_output: PathBuf,
}

pub fn run(config: &Config, options: &SlabOptions) -> Result<(), Box<dyn Error>> {
    if !options.threshold_fraction.is_finite() || options.threshold_fraction < 0.0 {
        return Err(format!(
            "threshold fraction must be finite and non-negative, got {}",
            options.threshold_fraction
        )
        .into());
    }

    log::info!("bfs_thickness: {} m", config.bfs_thickness);
    log::info!("tfs_thickness: {} m", config.tfs_thickness);

    let filenames = expand_globs(config.xyz_files()?)?;
    log::info!("input files: {:?}", filenames);
    if filenames.is_empty() {
        return Err("no input files matched the configured xyz_filenames".into());
    }

    println!("Loading point cloud...");
    log::info!("start parsing...");
    let start_local = std::time::Instant::now();
    let parser = build_parser(filenames, options.every_nth)?;
    let cloud = parser.parse()?;
    log::info!("finish parsing in {:?}", start_local.elapsed());

    if cloud.is_empty() {
        return Err(HistogramError::Empty.into());
    }

    print!("{}", stats_report(&cloud));

    println!("\n=== Z-coordinate Distribution (Histogram) ===");
    let histogram = ZHistogram::from_points(&cloud.points, options.bin_width)?;

    render_z_distribution(&histogram, &options.plot_output)?;
    println!("Saved histogram to: {}", options.plot_output.display());

    let detection = detect_slabs(&histogram, options.threshold_fraction);
    print!("{}", slab_report(&detection));

    Ok(())
}

fn build_parser(filenames: Vec<PathBuf>, every_nth: usize) -> Result<Box<dyn Parser>, Box<dyn Error>> {
    let parser = match check_and_get_extension(&filenames)? {
        Extension::Xyz | Extension::Txt | Extension::Csv => XyzParserProvider {
            filenames,
            every_nth,
        }
        .get_parser(),
        Extension::E57 => E57ParserProvider { filenames }.get_parser(),
    };
    Ok(parser)
}

fn check_and_get_extension(paths: &[PathBuf]) -> Result<Extension, Box<dyn Error>> {
    let mut extensions = vec![];
    for path in paths.iter() {
        let extension = path.extension().and_then(OsStr::to_str);
        match extension {
            Some(ext) => extensions.push(ext),
            None => return Err("File extension is not found".to_string().into()),
        }
    }
    extensions.sort();
    extensions.dedup();

    if extensions.len() > 1 {
        return Err("Multiple extensions are not supported".to_string().into());
    }

    Ok(get_extension(extensions[0])?)
}

fn expand_globs(input_patterns: &[String]) -> Result<Vec<PathBuf>, Box<dyn Error>> {
    let mut paths = Vec::new();
    for pattern in input_patterns {
        if pattern.contains('*') || pattern.contains('?') || pattern.contains('[') {
            for entry in glob(pattern)? {
                paths.push(entry?);
            }
        } else {
            paths.push(PathBuf::from(pattern));
        }
    }
    Ok(paths)
}

fn stats_report(cloud: &PointCloud) -> String {
    let volume = &cloud.metadata.bounding_volume;
    let range = volume.range();

    let mut out = String::new();
    out.push_str("\n=== Point Cloud Statistics ===\n");
    out.push_str(&format!(
        "Total points: {}\n",
        format_thousands(cloud.len())
    ));
    for (axis, i) in [("X", 0), ("Y", 1), ("Z", 2)] {
        out.push_str(&format!(
            "{} range: {:.3} to {:.3} ({:.3} m)\n",
            axis, volume.min[i], volume.max[i], range[i]
        ));
    }
    out
}

fn slab_report(detection: &SlabDetection) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "\nPeak detection threshold: {:.1}k points\n",
        detection.threshold / 1000.0
    ));
    out.push_str(&format!(
        "Maximum points at any Z-level: {:.1}k points\n",
        detection.max_count as f64 / 1000.0
    ));
    out.push_str("\n=== Potential slab Z-coordinates (above threshold) ===\n");
    for band in &detection.bands {
        out.push_str(&format!(
            "Z = {:.3} m: {:.1}k points\n",
            band.lower_edge,
            band.count as f64 / 1000.0
        ));
    }
    out
}

fn format_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pcd_analysis::histogram::ZBin;
    use pcd_core::pointcloud::point::Point;
    use std::fs;

    #[test]
    fn thousands_are_separated_with_commas() {
        assert_eq!(format_thousands(0), "0");
        assert_eq!(format_thousands(999), "999");
        assert_eq!(format_thousands(1_000), "1,000");
        assert_eq!(format_thousands(1_234_567), "1,234,567");
    }

    #[test]
    fn stats_report_lists_every_axis() {
        let cloud = PointCloud::new(vec![
            Point::new(-1.0, 0.0, 2.0),
            Point::new(2.0, 4.5, 2.5),
            Point::new(0.0, -0.5, 8.0),
        ]);

        let report = stats_report(&cloud);
        assert!(report.contains("=== Point Cloud Statistics ==="));
        assert!(report.contains("Total points: 3"));
        assert!(report.contains("X range: -1.000 to 2.000 (3.000 m)"));
        assert!(report.contains("Y range: -0.500 to 4.500 (5.000 m)"));
        assert!(report.contains("Z range: 2.000 to 8.000 (6.000 m)"));
    }

    #[test]
    fn slab_report_prints_bands_in_kilopoints() {
        let detection = SlabDetection {
            max_count: 10_000,
            threshold: 6_000.0,
            bands: vec![
                ZBin {
                    lower_edge: 0.0,
                    count: 10_000,
                },
                ZBin {
                    lower_edge: 2.85,
                    count: 8_200,
                },
            ],
        };

        let report = slab_report(&detection);
        assert!(report.contains("Peak detection threshold: 6.0k points"));
        assert!(report.contains("Maximum points at any Z-level: 10.0k points"));
        assert!(report.contains("Z = 0.000 m: 10.0k points"));
        assert!(report.contains("Z = 2.850 m: 8.2k points"));
    }

    #[test]
    fn runs_the_whole_pipeline_on_a_small_cloud() {
        let dir = tempfile::tempdir().unwrap();
        let points_path = dir.path().join("slab.xyz");
        let mut content = String::new();
        for i in 0..50 {
            content.push_str(&format!("{}.0 0.0 1.0\n", i));
        }
        content.push_str("0.0 0.0 0.0\n");
        content.push_str("0.0 0.0 3.0\n");
        fs::write(&points_path, content).unwrap();

        let config = Config {
            path: PathBuf::new(),
            e57_files: vec![],
            xyz_filenames: vec![points_path.to_string_lossy().into_owned()],
            bfs_thickness: 0.3,
            tfs_thickness: 0.25,
        };
        let options = SlabOptions {
            bin_width: 0.15,
            threshold_fraction: 0.6,
            every_nth: 1,
            plot_output: dir.path().join("z_distribution.svg"),
        };

        run(&config, &options).unwrap();
        assert!(options.plot_output.exists());
    }

    #[test]
    fn dispatches_on_the_file_extension() {
        let xyz = check_and_get_extension(&[PathBuf::from("a.xyz"), PathBuf::from("b.xyz")]);
        assert_eq!(xyz.unwrap(), Extension::Xyz);

        let e57 = check_and_get_extension(&[PathBuf::from("scan.e57")]);
        assert_eq!(e57.unwrap(), Extension::E57);

        let mixed = check_and_get_extension(&[PathBuf::from("a.xyz"), PathBuf::from("b.e57")]);
        assert!(mixed.is_err());

        let unsupported = check_and_get_extension(&[PathBuf::from("points.las")]);
        assert!(unsupported.is_err());
    }

    #[test]
    fn rejects_a_bad_threshold_fraction() {
        let config = Config {
            path: PathBuf::new(),
            e57_files: vec![],
            xyz_filenames: vec!["points.xyz".to_string()],
            bfs_thickness: 0.3,
            tfs_thickness: 0.25,
        };
        for fraction in [-0.1, f64::NAN, f64::INFINITY] {
            let options = SlabOptions {
                bin_width: 0.15,
                threshold_fraction: fraction,
                every_nth: 1,
                plot_output: PathBuf::from("unused.svg"),
            };
            assert!(run(&config, &options).is_err());
        }
    }

    #[test]
    fn expands_glob_patterns_and_keeps_plain_paths() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.xyz"), "0 0 0\n").unwrap();
        fs::write(dir.path().join("b.xyz"), "0 0 1\n").unwrap();

        let pattern = dir.path().join("*.xyz").to_string_lossy().into_owned();
        let expanded = expand_globs(&[pattern]).unwrap();
        assert_eq!(expanded.len(), 2);

        let plain = expand_globs(&["missing.xyz".to_string()]).unwrap();
        assert_eq!(plain, vec![PathBuf::from("missing.xyz")]);
    }
}
