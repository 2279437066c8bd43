use crate::image_utils::Calibration;
use crate::regions::Region;

/// Keep regions whose calibrated area reaches `min_area`, in their original order
pub fn filter_by_area(regions: Vec<Region>, calibration: &Calibration, min_area: f64) -> Vec<Region> {
    let before = regions.len();
    let kept: Vec<Region> = regions
        .into_iter()
        .filter(|r| r.physical_area(calibration) >= min_area)
        .collect();

    log::debug!(
        "Area filter >= {} {}²: kept {} of {} regions",
        min_area,
        calibration.unit.as_str(),
        kept.len(),
        before
    );
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChannelRole;

    fn squares(sides: &[u32]) -> Vec<Region> {
        sides
            .iter()
            .enumerate()
            .map(|(i, &s)| Region::rectangle(ChannelRole::Organoid, i as u32 * 200, 0, s, s, 0.0))
            .collect()
    }

    #[test]
    fn threshold_is_in_calibrated_units() {
        // 10x10 pixels at 5x5 units per pixel = 2500 units²
        let cal = Calibration::new(5.0, 5.0);
        let kept = filter_by_area(squares(&[10, 9]), &cal, 2500.0);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].pixel_area, 100);
    }

    #[test]
    fn raising_minimum_never_keeps_more() {
        let cal = Calibration::new(0.5, 2.0);
        let regions = squares(&[1, 3, 5, 8, 13, 21, 34, 55]);
        let mut previous = usize::MAX;
        for min_area in [0.0, 1.0, 9.0, 10.0, 100.0, 500.0, 1156.0, 5000.0] {
            let count = filter_by_area(regions.clone(), &cal, min_area).len();
            assert!(count <= previous);
            previous = count;
        }
    }

    #[test]
    fn filter_keeps_order_and_does_not_modify() {
        let cal = Calibration::uncalibrated();
        let regions = squares(&[4, 1, 6, 2, 5]);
        let kept = filter_by_area(regions.clone(), &cal, 16.0);
        assert_eq!(kept, vec![regions[0].clone(), regions[2].clone(), regions[4].clone()]);
    }
}
