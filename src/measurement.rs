use serde::Serialize;

use crate::containment::ContainmentTotals;
use crate::image_utils::Calibration;
use crate::labels::organoid_label;
use crate::regions::Region;

/// One row of the results table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrganoidRecord {
    pub label: String,
    /// Calibrated bounding-box centroid
    pub x: f64,
    pub y: f64,
    /// Integer pixel centroid the label is anchored to
    pub pixel_centroid: (i32, i32),
    pub area: f64,
    pub marker_a_area: f64,
    pub marker_b_area: f64,
    /// Raw-intensity mean of contained marker-B regions, weighted by area
    pub marker_b_mean: f64,
    /// Raw-intensity mean of contained marker-A regions, weighted by area
    pub marker_a_mean: f64,
}

/// Convert one organoid and its containment totals into calibrated measurements
pub fn aggregate(
    ordinal: usize,
    organoid: &Region,
    totals: &ContainmentTotals,
    calibration: &Calibration,
) -> OrganoidRecord {
    let (cx, cy) = organoid.centroid();
    OrganoidRecord {
        label: organoid_label(ordinal),
        x: cx as f64 * calibration.pixel_width,
        y: cy as f64 * calibration.pixel_height,
        pixel_centroid: (cx, cy),
        area: organoid.physical_area(calibration),
        marker_a_area: totals.marker_a.area,
        marker_b_area: totals.marker_b.area,
        marker_b_mean: totals.marker_b.mean_intensity(),
        marker_a_mean: totals.marker_a.mean_intensity(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChannelRole;
    use crate::containment::ChannelTotals;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn calibrates_centroid_and_area() {
        let cal = Calibration::new(0.5, 2.0);
        let organoid = Region::rectangle(ChannelRole::Organoid, 10, 20, 11, 30, 0.0);
        let record = aggregate(3, &organoid, &ContainmentTotals::default(), &cal);

        assert_eq!(record.label, "D");
        assert_eq!(record.pixel_centroid, (15, 35));
        assert_approx_eq!(record.x, 7.5);
        assert_approx_eq!(record.y, 70.0);
        assert_approx_eq!(record.area, 330.0);
        assert_eq!(record.marker_b_mean, 0.0);
    }

    #[test]
    fn means_come_from_weighted_sums() {
        let cal = Calibration::uncalibrated();
        let organoid = Region::rectangle(ChannelRole::Organoid, 0, 0, 60, 60, 0.0);
        let totals = ContainmentTotals {
            marker_a: ChannelTotals { area: 0.0, weighted_intensity: 0.0, contained: vec![] },
            marker_b: ChannelTotals { area: 300.0, weighted_intensity: 12000.0, contained: vec![0] },
        };
        let record = aggregate(0, &organoid, &totals, &cal);
        assert_approx_eq!(record.marker_b_area, 300.0);
        assert_approx_eq!(record.marker_b_mean, 40.0);
        assert_eq!(record.marker_a_area, 0.0);
        assert_eq!(record.marker_a_mean, 0.0);
    }
}
