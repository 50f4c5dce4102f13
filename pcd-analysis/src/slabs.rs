use crate::histogram::{ZBin, ZHistogram};

/// Result of scanning a z histogram for heavily populated levels.
#[derive(Debug, Clone)]
pub struct SlabDetection {
    pub max_count: u64,
    pub threshold: f64,
    pub bands: Vec<ZBin>,
}

/// Collects the bins whose population strictly exceeds `fraction` of the
/// fullest bin. Bands come back in ascending z order.
pub fn detect_slabs(histogram: &ZHistogram, fraction: f64) -> SlabDetection {
    let max_count = histogram.max_count();
    let threshold = fraction * max_count as f64;
    let bands = histogram
        .bins
        .iter()
        .filter(|b| b.count as f64 > threshold)
        .cloned()
        .collect();

    SlabDetection {
        max_count,
        threshold,
        bands,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn histogram_with_counts(counts: &[u64]) -> ZHistogram {
        let bin_width = 0.15;
        let bins = counts
            .iter()
            .enumerate()
            .map(|(i, &count)| ZBin {
                lower_edge: i as f64 * bin_width,
                count,
            })
            .collect();
        ZHistogram {
            bin_width,
            z_min: 0.0,
            z_max: counts.len() as f64 * bin_width,
            bins,
        }
    }

    #[test]
    fn reports_bins_strictly_above_the_threshold() {
        let histogram = histogram_with_counts(&[10, 7, 6, 0, 8]);
        let detection = detect_slabs(&histogram, 0.6);

        assert_eq!(detection.max_count, 10);
        assert_eq!(detection.threshold, 6.0);
        // The bin holding exactly 6 points does not make the cut.
        let counts: Vec<u64> = detection.bands.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![10, 7, 8]);
    }

    #[test]
    fn bands_are_ascending_in_z() {
        let histogram = histogram_with_counts(&[8, 2, 10, 1, 9]);
        let detection = detect_slabs(&histogram, 0.6);

        let edges: Vec<f64> = detection.bands.iter().map(|b| b.lower_edge).collect();
        let mut sorted = edges.clone();
        sorted.sort_by(f64::total_cmp);
        assert_eq!(edges, sorted);
    }

    #[test]
    fn raising_the_fraction_never_adds_bands() {
        let histogram = histogram_with_counts(&[10, 9, 8, 7, 6, 5, 4]);
        let low = detect_slabs(&histogram, 0.5);
        let high = detect_slabs(&histogram, 0.8);

        assert!(high.bands.len() <= low.bands.len());
        for band in &high.bands {
            assert!(low.bands.contains(band));
        }
    }

    #[test]
    fn empty_levels_yield_no_bands() {
        let histogram = histogram_with_counts(&[0, 0, 0]);
        let detection = detect_slabs(&histogram, 0.6);

        assert_eq!(detection.max_count, 0);
        assert!(detection.bands.is_empty());
    }
}
