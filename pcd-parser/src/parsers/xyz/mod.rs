use std::error::Error;
use std::fs::File;
use std::io::{BufRead as _, BufReader};
use std::path::{Path, PathBuf};

use csv::ReaderBuilder;

use pcd_core::pointcloud::point::{Color, Point, PointCloud};

use super::{ParseError, Parser, ParserProvider};

pub struct XyzParserProvider {
    pub filenames: Vec<PathBuf>,
    pub every_nth: usize,
}

impl ParserProvider for XyzParserProvider {
    fn get_parser(&self) -> Box<dyn Parser> {
        Box::new(XyzParser {
            filenames: self.filenames.clone(),
            every_nth: self.every_nth,
        })
    }
}

pub struct XyzParser {
    pub filenames: Vec<PathBuf>,
    pub every_nth: usize,
}

impl Parser for XyzParser {
    fn parse(&self) -> Result<PointCloud, Box<dyn Error>> {
        let mut points = Vec::new();
        for filename in &self.filenames {
            let start = std::time::Instant::now();
            let loaded = read_xyz_file(filename, self.every_nth)?;
            log::debug!(
                "read {} points from {} in {:?}",
                loaded.len(),
                filename.display(),
                start.elapsed()
            );
            points.extend(loaded);
        }
        Ok(PointCloud::new(points))
    }
}

fn read_xyz_file(path: &Path, every_nth: usize) -> Result<Vec<Point>, ParseError> {
    let delimiter = sniff_delimiter(path)?;
    let file = File::open(path).map_err(|source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .delimiter(delimiter)
        .flexible(true)
        .comment(Some(b'#'))
        .from_reader(BufReader::new(file));

    let step = every_nth.max(1);
    let mut points = Vec::new();
    let mut index = 0_usize;
    for record in reader.records() {
        let record = record.map_err(|e| ParseError::MalformedRecord {
            path: path.to_path_buf(),
            line: e.position().map(|p| p.line()).unwrap_or(0),
            message: e.to_string(),
        })?;

        // Repeated spaces produce empty fields, so filter them out before
        // deciding whether the record holds any data at all.
        let fields: Vec<&str> = record.iter().map(str::trim).filter(|f| !f.is_empty()).collect();
        if fields.is_empty() {
            continue;
        }

        let keep = index % step == 0;
        index += 1;
        if !keep {
            continue;
        }

        let line = record.position().map(|p| p.line()).unwrap_or(0);
        points.push(parse_fields(path, line, &fields)?);
    }
    Ok(points)
}

fn sniff_delimiter(path: &Path) -> Result<u8, ParseError> {
    let file = File::open(path).map_err(|source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = BufReader::new(file);
    for line in reader.lines() {
        let line = line.map_err(|source| ParseError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line.contains(',') {
            return Ok(b',');
        }
        if line.contains('\t') {
            return Ok(b'\t');
        }
        return Ok(b' ');
    }
    Ok(b' ')
}

// Column conventions: "x y z", "x y z i", "x y z r g b" and "x y z i r g b".
fn parse_fields(path: &Path, line: u64, fields: &[&str]) -> Result<Point, ParseError> {
    if fields.len() < 3 {
        return Err(ParseError::MalformedRecord {
            path: path.to_path_buf(),
            line,
            message: format!("expected at least 3 columns, found {}", fields.len()),
        });
    }

    let x = parse_coordinate(path, line, "x", fields[0])?;
    let y = parse_coordinate(path, line, "y", fields[1])?;
    let z = parse_coordinate(path, line, "z", fields[2])?;

    // Records without color columns default to white.
    let mut color = Color {
        r: 65535,
        g: 65535,
        b: 65535,
    };
    let mut intensity = None;
    match fields.len() {
        3 => {}
        4 | 5 => {
            intensity = Some(parse_channel(path, line, "intensity", fields[3])?);
        }
        6 => {
            color = Color {
                r: parse_channel(path, line, "r", fields[3])?,
                g: parse_channel(path, line, "g", fields[4])?,
                b: parse_channel(path, line, "b", fields[5])?,
            };
        }
        _ => {
            intensity = Some(parse_channel(path, line, "intensity", fields[3])?);
            color = Color {
                r: parse_channel(path, line, "r", fields[4])?,
                g: parse_channel(path, line, "g", fields[5])?,
                b: parse_channel(path, line, "b", fields[6])?,
            };
        }
    }

    Ok(Point {
        x,
        y,
        z,
        color,
        intensity,
    })
}

fn parse_coordinate(path: &Path, line: u64, name: &str, value: &str) -> Result<f64, ParseError> {
    value.parse().map_err(|_| ParseError::MalformedRecord {
        path: path.to_path_buf(),
        line,
        message: format!("Failed to parse '{}' from {:?}", name, value),
    })
}

// Some exports write color and intensity channels as floats ("255.000000").
fn parse_channel(path: &Path, line: u64, name: &str, value: &str) -> Result<u16, ParseError> {
    let channel: f64 = value.parse().map_err(|_| ParseError::MalformedRecord {
        path: path.to_path_buf(),
        line,
        message: format!("Failed to parse '{}' from {:?}", name, value),
    })?;
    Ok(channel.round().clamp(0.0, 65535.0) as u16)
}
