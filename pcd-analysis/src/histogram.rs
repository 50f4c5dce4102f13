use pcd_core::pointcloud::point::Point;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum HistogramError {
    #[error("no points to analyze")]
    Empty,

    #[error("degenerate z range: all points lie at z = {0}")]
    DegenerateRange(f64),

    #[error("bin width must be positive and finite, got {0}")]
    InvalidBinWidth(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ZBin {
    pub lower_edge: f64,
    pub count: u64,
}

/// Distribution of points along the z axis, in bins of a fixed width
/// starting at the lowest point.
#[derive(Debug, Clone)]
pub struct ZHistogram {
    pub bin_width: f64,
    pub z_min: f64,
    pub z_max: f64,
    pub bins: Vec<ZBin>,
}

impl ZHistogram {
    pub fn from_points(points: &[Point], bin_width: f64) -> Result<Self, HistogramError> {
        if !bin_width.is_finite() || bin_width <= 0.0 {
            return Err(HistogramError::InvalidBinWidth(bin_width));
        }
        if points.is_empty() {
            return Err(HistogramError::Empty);
        }

        let mut z_min = f64::MAX;
        let mut z_max = f64::MIN;
        for point in points {
            z_min = z_min.min(point.z);
            z_max = z_max.max(point.z);
        }
        if z_min == z_max {
            return Err(HistogramError::DegenerateRange(z_min));
        }

        let n_bins = ((z_max - z_min) / bin_width) as usize + 1;

        // Both edges of every bin are exclusive. A point sitting exactly on
        // an edge is counted nowhere, so the point at z_min never shows up.
        let mut bins = Vec::with_capacity(n_bins);
        for i in 0..n_bins {
            let lower_edge = z_min + i as f64 * bin_width;
            let upper_edge = lower_edge + bin_width;
            let count = points
                .iter()
                .filter(|p| lower_edge < p.z && p.z < upper_edge)
                .count() as u64;
            bins.push(ZBin { lower_edge, count });
        }

        Ok(ZHistogram {
            bin_width,
            z_min,
            z_max,
            bins,
        })
    }

    pub fn max_count(&self) -> u64 {
        self.bins.iter().map(|b| b.count).max().unwrap_or(0)
    }
}
