// src/containment.rs - Assign marker regions to the organoid that contains them

use crate::image_utils::Calibration;
use crate::regions::Region;

/// Running totals for one marker channel inside one organoid
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChannelTotals {
    /// Sum of calibrated areas of contained regions
    pub area: f64,
    /// Σ mean intensity × calibrated area over contained regions
    pub weighted_intensity: f64,
    /// Indices of the contained regions in the slice that was scanned
    pub contained: Vec<usize>,
}

impl ChannelTotals {
    /// Area-weighted mean intensity, 0 when nothing was contained
    pub fn mean_intensity(&self) -> f64 {
        if self.area > 0.0 {
            self.weighted_intensity / self.area
        } else {
            0.0
        }
    }
}

/// Everything one organoid collected from both marker channels
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContainmentTotals {
    pub marker_a: ChannelTotals,
    pub marker_b: ChannelTotals,
}

/// Accumulate the secondary regions whose bounding-box centroid lies inside `primary`.
///
/// Partial overlap without the centroid inside does not count.
pub fn accumulate_contained(primary: &Region, secondaries: &[Region], calibration: &Calibration) -> ChannelTotals {
    let mut totals = ChannelTotals::default();
    for (idx, secondary) in secondaries.iter().enumerate() {
        let (cx, cy) = secondary.centroid();
        if !primary.contains(cx, cy) {
            continue;
        }
        let area = secondary.physical_area(calibration);
        totals.area += area;
        totals.weighted_intensity += secondary.mean_intensity * area;
        totals.contained.push(idx);
    }
    totals
}

/// Match one organoid against both marker region sets.
///
/// Organoids are matched independently, so a marker region inside two
/// overlapping organoids counts for both.
pub fn match_organoid(
    organoid: &Region,
    marker_a: &[Region],
    marker_b: &[Region],
    calibration: &Calibration,
) -> ContainmentTotals {
    ContainmentTotals {
        marker_a: accumulate_contained(organoid, marker_a, calibration),
        marker_b: accumulate_contained(organoid, marker_b, calibration),
    }
}
