#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Color {
    pub r: u16,
    pub g: u16,
    pub b: u16,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub color: Color,
    pub intensity: Option<u16>,
}

impl Point {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Point {
            x,
            y,
            z,
            color: Color::default(),
            intensity: None,
        }
    }
}

// Axis order is [x, y, z] throughout.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundingVolume {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl BoundingVolume {
    pub fn range(&self) -> [f64; 3] {
        [
            self.max[0] - self.min[0],
            self.max[1] - self.min[1],
            self.max[2] - self.min[2],
        ]
    }
}

#[derive(Debug, Clone, Default)]
pub struct Metadata {
    pub point_count: usize,
    pub bounding_volume: BoundingVolume,
}

#[derive(Debug, Clone)]
pub struct PointCloud {
    pub points: Vec<Point>,
    pub metadata: Metadata,
}

impl PointCloud {
    /// Builds a point cloud and its axis-aligned bounding volume in one pass.
    /// Point order is kept exactly as given.
    pub fn new(points: Vec<Point>) -> Self {
        let mut bounding_volume = BoundingVolume {
            min: [f64::MAX, f64::MAX, f64::MAX],
            max: [f64::MIN, f64::MIN, f64::MIN],
        };

        for point in &points {
            bounding_volume.min[0] = bounding_volume.min[0].min(point.x);
            bounding_volume.min[1] = bounding_volume.min[1].min(point.y);
            bounding_volume.min[2] = bounding_volume.min[2].min(point.z);
            bounding_volume.max[0] = bounding_volume.max[0].max(point.x);
            bounding_volume.max[1] = bounding_volume.max[1].max(point.y);
            bounding_volume.max[2] = bounding_volume.max[2].max(point.z);
        }

        let metadata = Metadata {
            point_count: points.len(),
            bounding_volume,
        };

        PointCloud { points, metadata }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
