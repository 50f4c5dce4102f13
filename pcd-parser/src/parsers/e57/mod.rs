use std::error::Error;
use std::path::{Path, PathBuf};

use e57::{CartesianCoordinate, E57Reader, PointCloud as E57PointCloud, RecordDataType, RecordName};

use pcd_core::pointcloud::point::{Color, Point, PointCloud};

use super::{ParseError, Parser, ParserProvider};

pub struct E57ParserProvider {
    pub filenames: Vec<PathBuf>,
}

impl ParserProvider for E57ParserProvider {
    fn get_parser(&self) -> Box<dyn Parser> {
        Box::new(E57Parser {
            filenames: self.filenames.clone(),
        })
    }
}

pub struct E57Parser {
    pub filenames: Vec<PathBuf>,
}

impl Parser for E57Parser {
    fn parse(&self) -> Result<PointCloud, Box<dyn Error>> {
        let mut points = Vec::new();
        for filename in &self.filenames {
            let start = std::time::Instant::now();
            let loaded = read_e57_points(filename)?;
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

fn read_e57_points(path: &Path) -> Result<Vec<Point>, ParseError> {
    let scan_error = |source| ParseError::ScanArchive {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = E57Reader::from_file(path).map_err(scan_error)?;
    let mut points = Vec::new();
    for pointcloud in reader.pointclouds() {
        let mut iter = reader.pointcloud_simple(&pointcloud).map_err(scan_error)?;
        for p in &mut iter {
            let p = p.map_err(scan_error)?;
            if let CartesianCoordinate::Valid { x, y, z } = p.cartesian {
                let mut point = Point::new(x, y, z);
                if let Some(color) = p.color {
                    // Simple reader colors are normalized to the unit range.
                    point.color = Color {
                        r: (color.red * 65535.0).round() as u16,
                        g: (color.green * 65535.0).round() as u16,
                        b: (color.blue * 65535.0).round() as u16,
                    };
                }
                point.intensity = p.intensity.map(|i| (i * 65535.0).round() as u16);
                points.push(point);
            }
        }
    }
    Ok(points)
}

/// Per-field summary of an E57 archive: how many records carry the field,
/// how many components it has and the element type of the first prototype
/// that declares it.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldInfo {
    pub count: u64,
    pub components: usize,
    pub element_type: String,
}

#[derive(Debug, Clone)]
pub struct ScanInfo {
    pub name: Option<String>,
    pub records: u64,
}

#[derive(Debug, Clone)]
pub struct E57Structure {
    pub scans: Vec<ScanInfo>,
    pub position: Option<FieldInfo>,
    pub color: Option<FieldInfo>,
    pub intensity: Option<FieldInfo>,
    pub attributes: Vec<String>,
}

impl E57Structure {
    pub fn total_points(&self) -> u64 {
        self.scans.iter().map(|s| s.records).sum()
    }
}

/// Reads the XML section of an E57 archive and summarizes the prototype of
/// every scan without decoding any point records.
pub fn read_structure(path: &Path) -> Result<E57Structure, ParseError> {
    let reader = E57Reader::from_file(path).map_err(|source| ParseError::ScanArchive {
        path: path.to_path_buf(),
        source,
    })?;

    let mut structure = E57Structure {
        scans: Vec::new(),
        position: None,
        color: None,
        intensity: None,
        attributes: Vec::new(),
    };

    for pointcloud in reader.pointclouds() {
        for record in &pointcloud.prototype {
            let attribute = format!("{:?}", record.name);
            if !structure.attributes.contains(&attribute) {
                structure.attributes.push(attribute);
            }
        }

        accumulate_field(&mut structure.position, &pointcloud, is_position);
        accumulate_field(&mut structure.color, &pointcloud, is_color);
        accumulate_field(&mut structure.intensity, &pointcloud, is_intensity);

        structure.scans.push(ScanInfo {
            name: pointcloud.name.clone(),
            records: pointcloud.records,
        });
    }

    Ok(structure)
}

fn is_position(name: &RecordName) -> bool {
    matches!(
        name,
        RecordName::CartesianX | RecordName::CartesianY | RecordName::CartesianZ
    )
}

fn is_color(name: &RecordName) -> bool {
    matches!(
        name,
        RecordName::ColorRed | RecordName::ColorGreen | RecordName::ColorBlue
    )
}

fn is_intensity(name: &RecordName) -> bool {
    matches!(name, RecordName::Intensity)
}

fn accumulate_field<F>(field: &mut Option<FieldInfo>, pointcloud: &E57PointCloud, matches_name: F)
where
    F: Fn(&RecordName) -> bool,
{
    let records: Vec<_> = pointcloud
        .prototype
        .iter()
        .filter(|r| matches_name(&r.name))
        .collect();
    if records.is_empty() {
        return;
    }
    let entry = field.get_or_insert_with(|| FieldInfo {
        count: 0,
        components: records.len(),
        element_type: element_type_name(&records[0].data_type).to_string(),
    });
    entry.count += pointcloud.records;
}

fn element_type_name(data_type: &RecordDataType) -> &'static str {
    match data_type {
        RecordDataType::Single { .. } => "float32",
        RecordDataType::Double { .. } => "float64",
        RecordDataType::ScaledInteger { .. } => "scaled integer",
        RecordDataType::Integer { .. } => "integer",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use e57::{E57Writer, Record, RecordValue};

    fn write_xyz_archive(path: &Path, points: &[(f64, f64, f64)]) {
        let mut writer =
            E57Writer::from_file(path, "4cc8ff21-0b42-4eb4-8525-1aa85da2b1c1").unwrap();
        let prototype = vec![
            Record::CARTESIAN_X_F64,
            Record::CARTESIAN_Y_F64,
            Record::CARTESIAN_Z_F64,
        ];
        let mut pc_writer = writer
            .add_pointcloud("2c47fbce-9ded-4e39-b1ab-9810fc55a6cd", prototype)
            .unwrap();
        for (x, y, z) in points {
            pc_writer
                .add_point(vec![
                    RecordValue::Double(*x),
                    RecordValue::Double(*y),
                    RecordValue::Double(*z),
                ])
                .unwrap();
        }
        pc_writer.finalize().unwrap();
        writer.finalize().unwrap();
    }

    #[test]
    fn reads_points_back_from_archive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.e57");
        write_xyz_archive(&path, &[(1.0, 2.0, 3.0), (-4.0, 0.5, 9.25)]);

        let provider = E57ParserProvider {
            filenames: vec![path],
        };
        let cloud = provider.get_parser().parse().unwrap();
        assert_eq!(cloud.len(), 2);
        assert_eq!(cloud.points[0], Point::new(1.0, 2.0, 3.0));
        assert_eq!(cloud.points[1], Point::new(-4.0, 0.5, 9.25));
    }

    #[test]
    fn structure_reports_missing_color_and_intensity() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.e57");
        write_xyz_archive(&path, &[(0.0, 0.0, 0.0), (1.0, 1.0, 1.0), (2.0, 2.0, 2.0)]);

        let structure = read_structure(&path).unwrap();
        assert_eq!(structure.scans.len(), 1);
        assert_eq!(structure.total_points(), 3);
        assert_eq!(
            structure.position,
            Some(FieldInfo {
                count: 3,
                components: 3,
                element_type: "float64".to_string(),
            })
        );
        assert_eq!(structure.color, None);
        assert_eq!(structure.intensity, None);
        assert_eq!(structure.attributes, ["CartesianX", "CartesianY", "CartesianZ"]);
    }

    #[test]
    fn missing_archive_is_an_error() {
        let provider = E57ParserProvider {
            filenames: vec![PathBuf::from("does-not-exist.e57")],
        };
        assert!(provider.get_parser().parse().is_err());
    }
}
