use std::error::Error;
use std::path::{Path, PathBuf};

use itertools::Itertools as _;

use pcd_parser::parsers::e57::{read_structure, E57Structure};

use crate::config::Config;

pub fn run(config: &Config, file: Option<&Path>) -> Result<(), Box<dyn Error>> {
    let path = match file {
        Some(file) => file.to_path_buf(),
        None => PathBuf::from(config.first_e57_file()?),
    };

    println!("Checking file: {}", path.display());

    let start = std::time::Instant::now();
    let structure = read_structure(&path)?;
    log::info!("finish reading archive structure in {:?}", start.elapsed());

    print!("{}", build_report(&structure));
    Ok(())
}

fn build_report(structure: &E57Structure) -> String {
    let mut out = String::new();
    out.push_str("\n=== E57 Data Structure ===\n");

    if structure.scans.len() > 1 {
        out.push_str(&format!("Number of scans: {}\n", structure.scans.len()));
        for (i, scan) in structure.scans.iter().enumerate() {
            match &scan.name {
                Some(name) => {
                    out.push_str(&format!("Scan {} ({}): {} points\n", i, name, scan.records))
                }
                None => out.push_str(&format!("Scan {}: {} points\n", i, scan.records)),
            }
        }
    }

    match &structure.position {
        Some(position) => {
            out.push_str(&format!(
                "Points shape: {}\n",
                shape(position.count, position.components)
            ));
            out.push_str(&format!("Points dtype: {}\n", position.element_type));
        }
        None => out.push_str("Points: NOT AVAILABLE\n"),
    }

    match &structure.color {
        Some(color) => {
            out.push_str(&format!(
                "\nColor shape: {}\n",
                shape(color.count, color.components)
            ));
            out.push_str(&format!("Color dtype: {}\n", color.element_type));
        }
        None => out.push_str("\nColor: NOT AVAILABLE\n"),
    }

    match &structure.intensity {
        Some(intensity) => {
            out.push_str(&format!(
                "\nIntensity shape: {}\n",
                shape(intensity.count, intensity.components)
            ));
            out.push_str(&format!("Intensity dtype: {}\n", intensity.element_type));
        }
        None => out.push_str("\nIntensity: NOT AVAILABLE\n"),
    }

    out.push_str("\n=== Available attributes ===\n");
    out.push_str(&format!(
        "[{}]\n",
        structure
            .attributes
            .iter()
            .map(|name| format!("'{}'", name))
            .join(", ")
    ));

    out
}

// Shapes print the way numpy does, so a scalar field over n records
// is "(n,)" and a 3-component field is "(n, 3)".
fn shape(count: u64, components: usize) -> String {
    if components == 1 {
        format!("({},)", count)
    } else {
        format!("({}, {})", count, components)
    }
}
